//! Testing utilities for filter pipelines.
//!
//! This module provides:
//! - A journal and recording filters, actions and result executor
//! - An invoker fixture wired to them
//! - Assertions on journals, events, errors and responses

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{
    assert_event_types, assert_invalid_filter_usage, assert_journal, assert_response_body,
    assert_response_status, assert_unhandled,
};
pub use fixtures::InvokerFixture;
pub use mocks::{
    CompositeFilter, ExceptionResponse, Journal, RecordingAction, RecordingActionFilter,
    RecordingAuthorizationFilter, RecordingExceptionFilter, RecordingResultExecutor,
    RecordingResultFilter,
};
