//! Filter capability traits.
//!
//! A filter is one object that may take part in several stages. Each stage
//! comes in a synchronous and an asynchronous form; the pipeline asks the
//! filter which forms it implements through the `as_*` queries on
//! [`Filter`], so an implementation opts in with `Some(self)`:
//!
//! ```rust,ignore
//! impl Filter for AuditFilter {
//!     fn as_action_filter(self: Arc<Self>) -> Option<Arc<dyn ActionFilter>> {
//!         Some(self)
//!     }
//! }
//! ```

use crate::context::{
    ActionExecutedContext, ActionExecutingContext, AuthorizationContext, ExceptionContext,
    ResultExecutedContext, ResultExecutingContext,
};
use crate::invoker::{ActionNext, ResultNext};
use async_trait::async_trait;
use std::sync::Arc;

/// A unit of cross-cutting behavior attached to one or more stages.
///
/// Every capability query defaults to `None`. When a filter implements both
/// the synchronous and the asynchronous form of a stage, the asynchronous
/// one is used.
pub trait Filter: Send + Sync + 'static {
    /// Name used in logs, events and error messages.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Synchronous authorization capability.
    fn as_authorization_filter(self: Arc<Self>) -> Option<Arc<dyn AuthorizationFilter>> {
        None
    }

    /// Asynchronous authorization capability.
    fn as_async_authorization_filter(self: Arc<Self>) -> Option<Arc<dyn AsyncAuthorizationFilter>> {
        None
    }

    /// Synchronous exception capability.
    fn as_exception_filter(self: Arc<Self>) -> Option<Arc<dyn ExceptionFilter>> {
        None
    }

    /// Asynchronous exception capability.
    fn as_async_exception_filter(self: Arc<Self>) -> Option<Arc<dyn AsyncExceptionFilter>> {
        None
    }

    /// Synchronous action capability.
    fn as_action_filter(self: Arc<Self>) -> Option<Arc<dyn ActionFilter>> {
        None
    }

    /// Asynchronous action capability.
    fn as_async_action_filter(self: Arc<Self>) -> Option<Arc<dyn AsyncActionFilter>> {
        None
    }

    /// Synchronous result capability.
    fn as_result_filter(self: Arc<Self>) -> Option<Arc<dyn ResultFilter>> {
        None
    }

    /// Asynchronous result capability.
    fn as_async_result_filter(self: Arc<Self>) -> Option<Arc<dyn AsyncResultFilter>> {
        None
    }
}

/// Decides whether the request may proceed.
pub trait AuthorizationFilter: Send + Sync {
    /// Sets `ctx.result` to reject the request.
    fn on_authorization(&self, ctx: &mut AuthorizationContext) -> anyhow::Result<()>;
}

/// Asynchronous form of [`AuthorizationFilter`].
#[async_trait]
pub trait AsyncAuthorizationFilter: Send + Sync {
    /// Sets `ctx.result` to reject the request.
    async fn on_authorization_async(&self, ctx: &mut AuthorizationContext) -> anyhow::Result<()>;
}

/// Observes failures raised by everything it wraps.
///
/// Only called while the failure is unhandled.
pub trait ExceptionFilter: Send + Sync {
    /// Handles the failure, or leaves it for filters further out.
    fn on_exception(&self, ctx: &mut ExceptionContext) -> anyhow::Result<()>;
}

/// Asynchronous form of [`ExceptionFilter`].
#[async_trait]
pub trait AsyncExceptionFilter: Send + Sync {
    /// Handles the failure, or leaves it for filters further out.
    async fn on_exception_async(&self, ctx: &mut ExceptionContext) -> anyhow::Result<()>;
}

/// Runs around the action.
///
/// Returning from [`on_action_executing`](Self::on_action_executing) without
/// a result proceeds; setting `ctx.result` short-circuits and skips later
/// filters and the action.
pub trait ActionFilter: Send + Sync {
    /// Called before the rest of the action stage.
    fn on_action_executing(&self, _ctx: &mut ActionExecutingContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called after the rest of the action stage, including on failure.
    fn on_action_executed(&self, _ctx: &mut ActionExecutedContext) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Asynchronous form of [`ActionFilter`], in continuation style.
///
/// Not calling [`ActionNext::run`] short-circuits. Setting a result and then
/// calling it is a contract violation that fails the whole invocation.
#[async_trait]
pub trait AsyncActionFilter: Send + Sync {
    /// Wraps the rest of the action stage.
    async fn on_action_execution(&self, next: ActionNext<'_>) -> anyhow::Result<()>;
}

/// Runs around result dispatch.
///
/// Setting `ctx.cancel` in
/// [`on_result_executing`](Self::on_result_executing) short-circuits.
pub trait ResultFilter: Send + Sync {
    /// Called before the rest of the result stage.
    fn on_result_executing(&self, _ctx: &mut ResultExecutingContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called after the rest of the result stage, including on failure.
    fn on_result_executed(&self, _ctx: &mut ResultExecutedContext) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Asynchronous form of [`ResultFilter`], in continuation style.
///
/// Not calling [`ResultNext::run`] short-circuits. Setting `cancel` and then
/// calling it is a contract violation that fails the whole invocation.
#[async_trait]
pub trait AsyncResultFilter: Send + Sync {
    /// Wraps the rest of the result stage.
    async fn on_result_execution(&self, next: ResultNext<'_>) -> anyhow::Result<()>;
}
