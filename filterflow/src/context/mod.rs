//! Context management for action invocation.
//!
//! This module provides:
//! - The request context shared by every stage
//! - A thread-safe item bag filters use to pass data along
//! - The per-stage contexts filters read and write

mod action;
mod authorization;
#[cfg(test)]
mod context_tests;
mod exception;
mod filter;
mod items;
mod request;
mod result;

pub use action::{ActionExecutedContext, ActionExecutingContext};
pub use authorization::AuthorizationContext;
pub use exception::ExceptionContext;
pub use filter::FilterContext;
pub use items::RequestItems;
pub use request::{RequestContext, RequestInput, Response, RouteData};
pub use result::{ResultExecutedContext, ResultExecutingContext};
