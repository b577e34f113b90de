//! Action stage contexts.

use super::FilterContext;
use crate::core::{ActionResultRef, Parameters};
use std::ops::Deref;

/// What action filters see before the action runs.
#[derive(Debug)]
pub struct ActionExecutingContext {
    base: FilterContext,
    /// The bound parameters. Edits are visible to the action.
    pub parameters: Parameters,
    /// Setting a result short-circuits the rest of the action stage.
    pub result: Option<ActionResultRef>,
}

impl ActionExecutingContext {
    /// Creates a new executing context.
    #[must_use]
    pub fn new(base: FilterContext, parameters: Parameters) -> Self {
        Self {
            base,
            parameters,
            result: None,
        }
    }
}

impl Deref for ActionExecutingContext {
    type Target = FilterContext;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

/// What action filters see after everything inside them finished.
#[derive(Debug)]
pub struct ActionExecutedContext {
    base: FilterContext,
    /// True when a filter short-circuited instead of proceeding.
    pub canceled: bool,
    /// A failure raised inside the continuation.
    pub exception: Option<anyhow::Error>,
    /// Set by a filter that dealt with `exception`.
    pub exception_handled: bool,
    /// The result produced so far.
    pub result: Option<ActionResultRef>,
}

impl ActionExecutedContext {
    /// Creates a context for a continuation that finished normally.
    #[must_use]
    pub fn completed(base: FilterContext, result: Option<ActionResultRef>) -> Self {
        Self {
            base,
            canceled: false,
            exception: None,
            exception_handled: false,
            result,
        }
    }

    /// Creates a context for a short-circuited stage.
    #[must_use]
    pub fn canceled(base: FilterContext, result: Option<ActionResultRef>) -> Self {
        Self {
            canceled: true,
            ..Self::completed(base, result)
        }
    }

    /// Creates a context for a continuation that failed.
    #[must_use]
    pub fn failed(base: FilterContext, exception: anyhow::Error) -> Self {
        Self {
            exception: Some(exception),
            ..Self::completed(base, None)
        }
    }
}

impl Deref for ActionExecutedContext {
    type Target = FilterContext;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}
