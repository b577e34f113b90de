//! Pipeline states, scopes and run frames.

use crate::errors::InvokeError;
use crate::filters::{
    ActionFilter, AsyncActionFilter, AsyncAuthorizationFilter, AsyncExceptionFilter,
    AsyncResultFilter, AuthorizationFilter, ExceptionFilter, ResultFilter, StageFilter,
};
use futures::future::BoxFuture;
use std::sync::Arc;

/// Who started the current run, and so who may finish or rethrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scope {
    /// The top-level invocation.
    Invoker,
    /// A run nested inside an exception filter.
    Exception,
    /// A run nested inside an action filter's continuation.
    Action,
    /// A run nested inside a result filter's continuation.
    Result,
}

/// One position in the pipeline. States that act on a filter carry it.
pub(crate) enum State {
    InvokeBegin,

    AuthorizationBegin,
    AuthorizationNext,
    AuthorizationAsyncBegin(StageFilter<dyn AsyncAuthorizationFilter>),
    AuthorizationAsyncEnd(Arc<str>),
    AuthorizationSync(StageFilter<dyn AuthorizationFilter>),
    AuthorizationShortCircuit(Arc<str>),
    AuthorizationEnd,

    ExceptionBegin,
    ExceptionNext,
    ExceptionAsyncBegin(StageFilter<dyn AsyncExceptionFilter>),
    ExceptionAsyncResume(StageFilter<dyn AsyncExceptionFilter>),
    ExceptionAsyncEnd(Arc<str>),
    ExceptionSyncBegin(StageFilter<dyn ExceptionFilter>),
    ExceptionSyncEnd(StageFilter<dyn ExceptionFilter>),
    ExceptionInside,
    ExceptionHandled,
    ExceptionEnd,

    ActionBegin,
    ActionNext,
    ActionAsyncBegin(StageFilter<dyn AsyncActionFilter>),
    ActionAsyncEnd(Arc<str>),
    ActionSyncBegin(StageFilter<dyn ActionFilter>),
    ActionSyncEnd(StageFilter<dyn ActionFilter>),
    ActionInside,
    ActionEnd,

    ResultBegin,
    ResultNext,
    ResultAsyncBegin(StageFilter<dyn AsyncResultFilter>),
    ResultAsyncEnd(Arc<str>),
    ResultSyncBegin(StageFilter<dyn ResultFilter>),
    ResultSyncEnd(StageFilter<dyn ResultFilter>),
    ResultInside,
    ResultEnd,

    InvokeEnd,
}

impl State {
    pub(crate) const fn name(&self) -> &'static str {
        match self {
            Self::InvokeBegin => "InvokeBegin",
            Self::AuthorizationBegin => "AuthorizationBegin",
            Self::AuthorizationNext => "AuthorizationNext",
            Self::AuthorizationAsyncBegin(_) => "AuthorizationAsyncBegin",
            Self::AuthorizationAsyncEnd(_) => "AuthorizationAsyncEnd",
            Self::AuthorizationSync(_) => "AuthorizationSync",
            Self::AuthorizationShortCircuit(_) => "AuthorizationShortCircuit",
            Self::AuthorizationEnd => "AuthorizationEnd",
            Self::ExceptionBegin => "ExceptionBegin",
            Self::ExceptionNext => "ExceptionNext",
            Self::ExceptionAsyncBegin(_) => "ExceptionAsyncBegin",
            Self::ExceptionAsyncResume(_) => "ExceptionAsyncResume",
            Self::ExceptionAsyncEnd(_) => "ExceptionAsyncEnd",
            Self::ExceptionSyncBegin(_) => "ExceptionSyncBegin",
            Self::ExceptionSyncEnd(_) => "ExceptionSyncEnd",
            Self::ExceptionInside => "ExceptionInside",
            Self::ExceptionHandled => "ExceptionHandled",
            Self::ExceptionEnd => "ExceptionEnd",
            Self::ActionBegin => "ActionBegin",
            Self::ActionNext => "ActionNext",
            Self::ActionAsyncBegin(_) => "ActionAsyncBegin",
            Self::ActionAsyncEnd(_) => "ActionAsyncEnd",
            Self::ActionSyncBegin(_) => "ActionSyncBegin",
            Self::ActionSyncEnd(_) => "ActionSyncEnd",
            Self::ActionInside => "ActionInside",
            Self::ActionEnd => "ActionEnd",
            Self::ResultBegin => "ResultBegin",
            Self::ResultNext => "ResultNext",
            Self::ResultAsyncBegin(_) => "ResultAsyncBegin",
            Self::ResultAsyncEnd(_) => "ResultAsyncEnd",
            Self::ResultSyncBegin(_) => "ResultSyncBegin",
            Self::ResultSyncEnd(_) => "ResultSyncEnd",
            Self::ResultInside => "ResultInside",
            Self::ResultEnd => "ResultEnd",
            Self::InvokeEnd => "InvokeEnd",
        }
    }
}

/// The mutable state of one (possibly nested) run.
pub(crate) struct Frame {
    pub(crate) state: State,
    pub(crate) scope: Scope,
    pub(crate) completed: bool,
}

impl Frame {
    pub(crate) fn new(state: State, scope: Scope) -> Self {
        Self {
            state,
            scope,
            completed: false,
        }
    }

    /// Moves the current state out, leaving a placeholder.
    pub(crate) fn take_state(&mut self) -> State {
        std::mem::replace(&mut self.state, State::InvokeEnd)
    }
}

/// What one transition call asks of the driver.
pub(crate) enum Step<'a> {
    /// Await this, then call the transition function again.
    Await(BoxFuture<'a, Result<(), InvokeError>>),
    /// Check `completed`; call again if it is still false.
    Done,
}
