//! Authorization stage context.

use super::FilterContext;
use crate::core::ActionResultRef;
use std::ops::Deref;

/// What authorization filters read and write.
///
/// Setting `result` short-circuits the whole invocation: the result is
/// dispatched and nothing else runs.
#[derive(Debug)]
pub struct AuthorizationContext {
    base: FilterContext,
    /// The short-circuit result.
    pub result: Option<ActionResultRef>,
}

impl AuthorizationContext {
    /// Creates a new authorization context.
    #[must_use]
    pub fn new(base: FilterContext) -> Self {
        Self { base, result: None }
    }

    /// Returns true once a filter has supplied a result.
    #[must_use]
    pub fn is_short_circuited(&self) -> bool {
        self.result.is_some()
    }
}

impl Deref for AuthorizationContext {
    type Target = FilterContext;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}
