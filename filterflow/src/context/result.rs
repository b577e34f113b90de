//! Result stage contexts.

use super::FilterContext;
use crate::core::ActionResultRef;
use std::ops::Deref;

/// What result filters see before the result is dispatched.
#[derive(Debug)]
pub struct ResultExecutingContext {
    base: FilterContext,
    /// The result that will be dispatched. Filters may replace it.
    pub result: Option<ActionResultRef>,
    /// Setting this short-circuits the rest of the result stage.
    pub cancel: bool,
}

impl ResultExecutingContext {
    /// Creates a new executing context.
    #[must_use]
    pub fn new(base: FilterContext, result: Option<ActionResultRef>) -> Self {
        Self {
            base,
            result,
            cancel: false,
        }
    }
}

impl Deref for ResultExecutingContext {
    type Target = FilterContext;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

/// What result filters see after the result was dispatched.
#[derive(Debug)]
pub struct ResultExecutedContext {
    base: FilterContext,
    /// The result that was (or would have been) dispatched.
    pub result: Option<ActionResultRef>,
    /// True when a filter canceled instead of proceeding.
    pub canceled: bool,
    /// A failure raised inside the continuation.
    pub exception: Option<anyhow::Error>,
    /// Set by a filter that dealt with `exception`.
    pub exception_handled: bool,
}

impl ResultExecutedContext {
    /// Creates a context for a dispatch that finished normally.
    #[must_use]
    pub fn completed(base: FilterContext, result: Option<ActionResultRef>) -> Self {
        Self {
            base,
            result,
            canceled: false,
            exception: None,
            exception_handled: false,
        }
    }

    /// Creates a context for a canceled dispatch.
    #[must_use]
    pub fn canceled(base: FilterContext, result: Option<ActionResultRef>) -> Self {
        Self {
            canceled: true,
            ..Self::completed(base, result)
        }
    }

    /// Creates a context for a dispatch that failed.
    #[must_use]
    pub fn failed(
        base: FilterContext,
        result: Option<ActionResultRef>,
        exception: anyhow::Error,
    ) -> Self {
        Self {
            exception: Some(exception),
            ..Self::completed(base, result)
        }
    }
}

impl Deref for ResultExecutedContext {
    type Target = FilterContext;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}
