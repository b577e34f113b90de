//! Tracing subscriber setup.
//!
//! The invoker logs through `tracing`; this installs a subscriber for
//! binaries and tests that do not bring their own.
//!
//! ```rust,ignore
//! use filterflow::observability::{init_tracing, LoggingConfig};
//!
//! init_tracing(&LoggingConfig::new("filterflow=debug"))?;
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive (e.g. `"info"`, `"filterflow=trace"`).
    #[serde(default = "default_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

impl LoggingConfig {
    /// Creates a configuration with the given filter directive.
    #[must_use]
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            json: false,
        }
    }

    /// Switches JSON output on or off.
    #[must_use]
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

/// Failure to install the subscriber.
#[derive(Debug, Error)]
pub enum LoggingInitError {
    /// The filter directive did not parse.
    #[error("Invalid log filter '{directive}': {message}")]
    InvalidFilter {
        /// The rejected directive.
        directive: String,
        /// Parser message.
        message: String,
    },
    /// A global subscriber is already set.
    #[error("Failed to install subscriber: {0}")]
    Install(String),
}

/// Builds the env filter for a directive.
pub fn create_env_filter(directive: &str) -> Result<EnvFilter, LoggingInitError> {
    EnvFilter::try_new(directive).map_err(|e| LoggingInitError::InvalidFilter {
        directive: directive.to_string(),
        message: e.to_string(),
    })
}

/// Installs a global `tracing` subscriber.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), LoggingInitError> {
    let filter = create_env_filter(&config.level)?;

    let fmt_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_filter(filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_filter(filter)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .map_err(|e| LoggingInitError::Install(e.to_string()))
}
