//! Exception stage context.

use super::FilterContext;
use crate::core::ActionResultRef;
use std::ops::Deref;

/// The failure an exception filter observes, and how it was dealt with.
///
/// A filter handles the failure by setting `exception_handled`, by clearing
/// `exception`, or by supplying `result`. Filters further out see the
/// handled state and skip themselves.
#[derive(Debug)]
pub struct ExceptionContext {
    base: FilterContext,
    /// The captured failure, moved from where it was raised.
    pub exception: Option<anyhow::Error>,
    /// Set by a filter that dealt with the failure.
    pub exception_handled: bool,
    /// The result to dispatch instead of the failed pipeline's result.
    pub result: Option<ActionResultRef>,
}

impl ExceptionContext {
    /// Creates a context for a freshly captured failure.
    #[must_use]
    pub fn new(base: FilterContext, exception: anyhow::Error) -> Self {
        Self {
            base,
            exception: Some(exception),
            exception_handled: false,
            result: None,
        }
    }

    /// Returns true while the failure still needs a filter to handle it.
    #[must_use]
    pub fn is_unhandled(&self) -> bool {
        self.exception.is_some() && !self.exception_handled && self.result.is_none()
    }

    /// Marks the failure as handled with the given result.
    pub fn handle_with(&mut self, result: ActionResultRef) {
        self.result = Some(result);
        self.exception_handled = true;
    }
}

impl Deref for ExceptionContext {
    type Target = FilterContext;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}
