//! Invoker configuration.

use serde::{Deserialize, Serialize};

/// Configuration for an [`ActionInvoker`](crate::invoker::ActionInvoker).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokerConfig {
    /// Run the request validator before the action stage.
    #[serde(default = "default_validate_request")]
    pub validate_request: bool,
    /// Log every state transition at trace level.
    #[serde(default)]
    pub trace_transitions: bool,
    /// Emit pipeline events to the configured sink.
    #[serde(default = "default_emit_events")]
    pub emit_events: bool,
}

fn default_validate_request() -> bool {
    true
}

fn default_emit_events() -> bool {
    true
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            validate_request: default_validate_request(),
            trace_transitions: false,
            emit_events: default_emit_events(),
        }
    }
}

impl InvokerConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables request validation.
    #[must_use]
    pub fn with_validate_request(mut self, enabled: bool) -> Self {
        self.validate_request = enabled;
        self
    }

    /// Enables or disables transition tracing.
    #[must_use]
    pub fn with_trace_transitions(mut self, enabled: bool) -> Self {
        self.trace_transitions = enabled;
        self
    }

    /// Enables or disables event emission.
    #[must_use]
    pub fn with_emit_events(mut self, enabled: bool) -> Self {
        self.emit_events = enabled;
        self
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = InvokerConfig::default();
        assert!(config.validate_request);
        assert!(!config.trace_transitions);
        assert!(config.emit_events);
    }

    #[test]
    fn test_builder() {
        let config = InvokerConfig::new()
            .with_validate_request(false)
            .with_trace_transitions(true)
            .with_emit_events(false);
        assert!(!config.validate_request);
        assert!(config.trace_transitions);
        assert!(!config.emit_events);
    }

    #[test]
    fn test_from_json_partial() {
        let config = InvokerConfig::from_json(r#"{"trace_transitions": true}"#).unwrap();
        assert_eq!(
            config,
            InvokerConfig::default().with_trace_transitions(true)
        );
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(InvokerConfig::from_json(r#"{"validate_request": "yes"}"#).is_err());
    }
}
