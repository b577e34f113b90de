//! Event sinks for pipeline events.

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, warn};

/// One recorded event: its type and payload.
pub type RecordedEvent = (String, Option<Value>);

/// Receives pipeline events.
///
/// Called inline from the pipeline, between filters. Implementations must not
/// block or fail; a sink that forwards elsewhere should hand the event off
/// and return.
pub trait EventSink: Send + Sync {
    /// Records an event.
    ///
    /// `event_type` is one of the names listed in [`crate::events`]; the
    /// payload is a JSON object carrying at least `request_id` and `action`.
    fn try_emit(&self, event_type: &str, data: Option<Value>);
}

/// Discards every event. Used when no sink is installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn try_emit(&self, _event_type: &str, _data: Option<Value>) {}
}

/// Logs each event through `tracing`, lifting the invocation fields out of
/// the payload.
///
/// `invocation.failed` is logged at warn; everything else at debug.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingEventSink;

impl LoggingEventSink {
    /// Creates a logging sink.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn field<'a>(data: Option<&'a Value>, key: &str) -> Option<&'a str> {
    data?.get(key)?.as_str()
}

impl EventSink for LoggingEventSink {
    fn try_emit(&self, event_type: &str, data: Option<Value>) {
        let data = data.as_ref();
        let request_id = field(data, "request_id");
        let action = field(data, "action");
        let stage = field(data, "stage");
        let filter = field(data, "filter");

        if event_type == "invocation.failed" {
            warn!(
                event = event_type,
                request_id,
                action,
                kind = field(data, "kind"),
                error = field(data, "error"),
                "Pipeline event"
            );
        } else {
            debug!(
                event = event_type,
                request_id,
                action,
                stage,
                filter,
                "Pipeline event"
            );
        }
    }
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: RwLock<Vec<RecordedEvent>>,
}

impl CollectingEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.read().clone()
    }

    /// Returns the collected event types, in order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.events.read().iter().map(|(t, _)| t.clone()).collect()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Returns events whose type starts with `type_prefix`.
    #[must_use]
    pub fn events_of_type(&self, type_prefix: &str) -> Vec<RecordedEvent> {
        self.events
            .read()
            .iter()
            .filter(|(t, _)| t.starts_with(type_prefix))
            .cloned()
            .collect()
    }
}

impl EventSink for CollectingEventSink {
    fn try_emit(&self, event_type: &str, data: Option<Value>) {
        self.events.write().push((event_type.to_string(), data));
    }
}
