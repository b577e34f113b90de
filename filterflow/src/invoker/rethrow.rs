//! Re-raising captured failures.

use crate::context::{ActionExecutedContext, ExceptionContext, ResultExecutedContext};
use crate::errors::InvokeError;

/// A context a failure was captured into.
pub(crate) trait CapturedFailure {
    fn exception_handled(&self) -> bool;

    fn take_exception(&mut self) -> Option<anyhow::Error>;
}

impl CapturedFailure for ExceptionContext {
    fn exception_handled(&self) -> bool {
        self.exception_handled
    }

    fn take_exception(&mut self) -> Option<anyhow::Error> {
        self.exception.take()
    }
}

impl CapturedFailure for ActionExecutedContext {
    fn exception_handled(&self) -> bool {
        self.exception_handled
    }

    fn take_exception(&mut self) -> Option<anyhow::Error> {
        self.exception.take()
    }
}

impl CapturedFailure for ResultExecutedContext {
    fn exception_handled(&self) -> bool {
        self.exception_handled
    }

    fn take_exception(&mut self) -> Option<anyhow::Error> {
        self.exception.take()
    }
}

/// Re-raises the captured failure unless it was handled.
///
/// The original error value is moved out, so the caller sees the same
/// concrete type, message and backtrace that were captured.
pub(crate) fn rethrow<C: CapturedFailure>(context: Option<&mut C>) -> Result<(), InvokeError> {
    let Some(context) = context else {
        return Ok(());
    };
    if context.exception_handled() {
        return Ok(());
    }
    match context.take_exception() {
        Some(error) => Err(InvokeError::Unhandled(error)),
        None => Ok(()),
    }
}
