//! # Filterflow
//!
//! A staged filter pipeline for invoking controller actions.
//!
//! Every request resolved to an action runs through four fixed stages of
//! filters:
//!
//! - **Authorization**: may short-circuit with a result before anything else
//! - **Exception**: sees failures from the action stage and may handle them
//! - **Action**: wraps the action; may replace its result or skip it
//! - **Result**: wraps the execution of the result
//!
//! Each filter may be synchronous or asynchronous; asynchronous action and
//! result filters receive a continuation they call at most once.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use filterflow::prelude::*;
//!
//! let controller = StaticController::new("Home")
//!     .with_action(SyncAction::new("Index", |_, _| Ok("hello".into())))
//!     .with_filter(FilterRegistration::new(RequireLogin));
//!
//! let invoker = ActionInvoker::new(Arc::new(controller));
//! let handled = invoker.invoke(Arc::new(RequestContext::new()), "Index").await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod context;
pub mod core;
pub mod errors;
pub mod events;
pub mod filters;
pub mod invoker;
pub mod observability;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::InvokerConfig;
    pub use crate::context::{
        ActionExecutedContext, ActionExecutingContext, AuthorizationContext, ExceptionContext,
        FilterContext, RequestContext, ResultExecutedContext, ResultExecutingContext, RouteData,
    };
    pub use crate::core::{
        ActionDescriptor, ActionResult, ActionResultRef, AsyncAction, ContentResult,
        ControllerDescriptor, EmptyResult, JsonResult, ReturnValue, Stage, StaticController,
        StatusCodeResult, SyncAction,
    };
    pub use crate::errors::{
        ArgumentError, InvalidFilterUsageError, InvokeError, RequestValidationError,
    };
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::filters::{
        ActionFilter, AsyncActionFilter, AsyncAuthorizationFilter, AsyncExceptionFilter,
        AsyncResultFilter, AuthorizationFilter, ExceptionFilter, Filter, FilterRegistration,
        FilterScope, GlobalFilterCollection, ResultFilter,
    };
    pub use crate::invoker::{ActionInvoker, ActionNext, ResultNext};
    pub use std::sync::Arc;
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn library_compiles() {
        let controller = StaticController::new("Home");
        let invoker = ActionInvoker::new(Arc::new(controller));
        assert_eq!(invoker.controller().controller_name(), "Home");
    }
}
