//! Observability utilities.

mod logging;

pub use logging::{create_env_filter, init_tracing, LoggingConfig, LoggingInitError};
