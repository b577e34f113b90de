//! Pipeline event emission.
//!
//! The invoker reports what happened to each request through an
//! [`EventSink`]: `invocation.started`, `filter.short_circuited`,
//! `exception.captured`, `exception.handled`, `result.executed`,
//! `invocation.completed` and `invocation.failed`. Every payload carries the
//! `request_id` and the `action` name.

mod sink;

pub use sink::{
    CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, RecordedEvent,
};

use parking_lot::RwLock;
use std::sync::Arc;

// Process-wide default sink for invokers built without one.
static GLOBAL_EVENT_SINK: RwLock<Option<Arc<dyn EventSink>>> = RwLock::new(None);

/// Sets the process-wide event sink.
pub fn set_event_sink(sink: Arc<dyn EventSink>) {
    *GLOBAL_EVENT_SINK.write() = Some(sink);
}

/// Clears the process-wide event sink.
pub fn clear_event_sink() {
    *GLOBAL_EVENT_SINK.write() = None;
}

/// Gets the process-wide event sink.
///
/// Returns a `NoOpEventSink` if no sink is set.
pub fn get_event_sink() -> Arc<dyn EventSink> {
    GLOBAL_EVENT_SINK
        .read()
        .clone()
        .unwrap_or_else(|| Arc::new(NoOpEventSink))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_sink_round_trip() {
        let sink = Arc::new(CollectingEventSink::new());
        set_event_sink(Arc::clone(&sink) as Arc<dyn EventSink>);

        get_event_sink().try_emit("invocation.started", None);
        clear_event_sink();
        get_event_sink().try_emit("invocation.completed", None);

        assert_eq!(sink.event_types(), vec!["invocation.started".to_string()]);
    }
}
