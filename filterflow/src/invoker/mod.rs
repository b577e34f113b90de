//! Action invocation.
//!
//! [`ActionInvoker`] resolves an action on a controller, collects its
//! filters and drives them through four fixed stages:
//!
//! 1. **Authorization** filters run in order; the first one that sets a
//!    result ends the invocation and only that result is executed.
//! 2. **Exception** filters wrap everything after them. They run in reverse
//!    on the way out, and only while a failure is still unhandled.
//! 3. **Action** filters wrap the action. Synchronous ones see the
//!    executing and executed sides; asynchronous ones get an
//!    [`ActionNext`] continuation.
//! 4. **Result** filters wrap the execution of the result, through
//!    [`ResultNext`] for asynchronous ones.
//!
//! Filters in a stage never run in parallel, and the whole run is a single
//! `Send` future.

mod binder;
mod continuation;
mod entry;
mod executor;
mod pipeline;
mod rethrow;
mod state;
mod validation;


pub use binder::{DefaultParameterBinder, ParameterBinder};
pub use continuation::{ActionNext, ResultNext};
pub use entry::ActionInvoker;
pub use executor::{DefaultResultExecutor, ResultExecutor};
pub use validation::{DangerousInputValidator, RequestValidator};

#[cfg(test)]
pub use binder::MockParameterBinder;
#[cfg(test)]
pub use validation::MockRequestValidator;
