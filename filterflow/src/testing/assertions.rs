//! Assertions for invocation outcomes.

use crate::context::RequestContext;
use crate::core::Stage;
use crate::errors::InvokeError;
use crate::events::CollectingEventSink;

use super::mocks::Journal;

/// Asserts the journal holds exactly these entries, in order.
pub fn assert_journal(journal: &Journal, expected: &[&str]) {
    let actual = journal.entries();
    assert_eq!(
        actual, expected,
        "Journal mismatch.\n  actual:   {actual:?}\n  expected: {expected:?}"
    );
}

/// Asserts the sink collected exactly these event types, in order.
pub fn assert_event_types(sink: &CollectingEventSink, expected: &[&str]) {
    let actual = sink.event_types();
    assert_eq!(actual, expected, "Expected events {expected:?}, got {actual:?}");
}

/// Asserts an invocation failed with an unhandled error carrying `message`.
pub fn assert_unhandled(error: &InvokeError, message: &str) {
    assert!(
        error.is_unhandled(),
        "Expected an unhandled error, got {} ({error})",
        error.kind()
    );
    assert_eq!(error.to_string(), message);
}

/// Asserts an invocation failed with a filter usage violation.
pub fn assert_invalid_filter_usage(error: &InvokeError, filter: &str, stage: Stage) {
    let InvokeError::InvalidFilterUsage(violation) = error else {
        panic!("Expected an invalid filter usage error, got {} ({error})", error.kind());
    };
    assert_eq!(violation.filter, filter);
    assert_eq!(violation.stage, stage);
}

/// Asserts the response body written so far.
pub fn assert_response_body(request: &RequestContext, expected: &str) {
    let response = request.response_snapshot();
    assert_eq!(
        response.body, expected,
        "Expected body {expected:?}, got {:?}",
        response.body
    );
}

/// Asserts the response status code.
pub fn assert_response_status(request: &RequestContext, expected: u16) {
    let status = request.response_snapshot().status;
    assert_eq!(status, expected, "Expected status {expected}, got {status}");
}
