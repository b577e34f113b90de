//! Error types for the filterflow framework.
//!
//! User code (filters, actions, results, validators) fails with
//! [`anyhow::Error`]. The engine reports through [`InvokeError`], which keeps
//! an unhandled user failure as the original value so callers can downcast it.

use crate::core::Stage;
use thiserror::Error;

/// The main error type for an action invocation.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// Required invocation input was missing. Raised before any filter runs.
    #[error("{0}")]
    InvalidArgument(#[from] ArgumentError),

    /// An asynchronous filter both short-circuited and called its continuation.
    #[error("{0}")]
    InvalidFilterUsage(#[from] InvalidFilterUsageError),

    /// A failure no exception filter handled, exactly as it was raised.
    #[error(transparent)]
    Unhandled(anyhow::Error),

    /// The pipeline reached a state its invariants rule out.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl InvokeError {
    /// Classifies a failure that surfaced from user code.
    ///
    /// A filter that propagates an engine error with `?` hands it back boxed
    /// inside an [`anyhow::Error`]; that error is recovered as-is. Anything
    /// else is an unhandled user failure.
    #[must_use]
    pub fn from_filter(error: anyhow::Error) -> Self {
        match error.downcast::<Self>() {
            Ok(engine) => engine,
            Err(other) => Self::Unhandled(other),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true for an unhandled user failure.
    #[must_use]
    pub fn is_unhandled(&self) -> bool {
        matches!(self, Self::Unhandled(_))
    }

    /// Returns true for a filter contract violation.
    #[must_use]
    pub fn is_invalid_filter_usage(&self) -> bool {
        matches!(self, Self::InvalidFilterUsage(_))
    }

    /// Borrows the unhandled failure as a concrete error type.
    #[must_use]
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
    {
        match self {
            Self::Unhandled(error) => error.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Converts into the unhandled failure, if that is what this is.
    pub fn into_unhandled(self) -> Result<anyhow::Error, Self> {
        match self {
            Self::Unhandled(error) => Ok(error),
            other => Err(other),
        }
    }

    /// Short machine-readable kind, used in events.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::InvalidFilterUsage(_) => "invalid_filter_usage",
            Self::Unhandled(_) => "unhandled",
            Self::Internal(_) => "internal",
        }
    }
}

/// Error raised when a required invocation argument is missing or empty.
#[derive(Debug, Clone, Error)]
#[error("{message} (Parameter '{parameter}')")]
pub struct ArgumentError {
    /// The offending parameter.
    pub parameter: String,
    /// The error message.
    pub message: String,
}

impl ArgumentError {
    /// Creates a new argument error.
    #[must_use]
    pub fn new(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Creates the error for a parameter that was absent or empty.
    #[must_use]
    pub fn null_or_empty(parameter: impl Into<String>) -> Self {
        Self::new(parameter, "Value cannot be null or empty.")
    }
}

/// Error raised when an asynchronous filter short-circuits and also calls
/// its continuation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", self.message())]
pub struct InvalidFilterUsageError {
    /// Name of the offending filter.
    pub filter: String,
    /// The stage the filter was running in.
    pub stage: Stage,
}

impl InvalidFilterUsageError {
    /// Creates a new invalid usage error.
    #[must_use]
    pub fn new(filter: impl Into<String>, stage: Stage) -> Self {
        Self {
            filter: filter.into(),
            stage,
        }
    }

    fn message(&self) -> String {
        match self.stage {
            Stage::Result => format!(
                "Asynchronous result filter '{}' set cancel to true on the \
                 result executing context and then called its continuation. \
                 A filter that cancels must not call next.",
                self.filter
            ),
            stage => format!(
                "Asynchronous {stage} filter '{}' set a result on the executing \
                 context and then called its continuation. A filter that \
                 provides a result must not call next.",
                self.filter
            ),
        }
    }
}

/// Error raised when request input contains potentially dangerous content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("A potentially dangerous {collection} value was detected from the client ({key}=\"{excerpt}\").")]
pub struct RequestValidationError {
    /// Which input collection held the value (`query` or `form`).
    pub collection: String,
    /// The input key.
    pub key: String,
    /// A short excerpt of the rejected value.
    pub excerpt: String,
}

impl RequestValidationError {
    const EXCERPT_CHARS: usize = 16;

    /// Creates a new validation error, truncating the value to an excerpt.
    #[must_use]
    pub fn new(collection: impl Into<String>, key: impl Into<String>, value: &str) -> Self {
        let mut excerpt: String = value.chars().take(Self::EXCERPT_CHARS).collect();
        if value.chars().count() > Self::EXCERPT_CHARS {
            excerpt.push_str("...");
        }
        Self {
            collection: collection.into(),
            key: key.into(),
            excerpt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("boom: {0}")]
    struct Boom(u32);

    #[test]
    fn test_from_filter_keeps_user_failure() {
        let err = InvokeError::from_filter(anyhow::Error::new(Boom(3)));
        assert!(err.is_unhandled());
        assert_eq!(err.to_string(), "boom: 3");
        assert_eq!(err.downcast_ref::<Boom>().map(|b| b.0), Some(3));
    }

    #[test]
    fn test_from_filter_recovers_engine_error() {
        let usage = InvalidFilterUsageError::new("Audit", Stage::Action);
        let boxed = anyhow::Error::new(InvokeError::from(usage.clone()));

        match InvokeError::from_filter(boxed) {
            InvokeError::InvalidFilterUsage(inner) => assert_eq!(inner, usage),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_into_unhandled() {
        let err = InvokeError::Unhandled(anyhow::anyhow!("failed"));
        assert_eq!(err.into_unhandled().unwrap().to_string(), "failed");

        let err = InvokeError::internal("bad state");
        assert!(err.into_unhandled().is_err());
    }

    #[test]
    fn test_argument_error_message() {
        let err = InvokeError::from(ArgumentError::null_or_empty("action_name"));
        assert_eq!(
            err.to_string(),
            "Value cannot be null or empty. (Parameter 'action_name')"
        );
        assert_eq!(err.kind(), "invalid_argument");
    }

    #[test]
    fn test_invalid_usage_message_names_filter() {
        let action = InvalidFilterUsageError::new("Cache", Stage::Action);
        assert!(action.to_string().contains("action filter 'Cache'"));
        assert!(action.to_string().contains("set a result"));

        let result = InvalidFilterUsageError::new("Compress", Stage::Result);
        assert!(result.to_string().contains("'Compress'"));
        assert!(result.to_string().contains("cancel"));
    }

    #[test]
    fn test_validation_error_excerpt() {
        let err = RequestValidationError::new("form", "comment", "<script>alert('x')</script>");
        assert_eq!(err.excerpt, "<script>alert('x...");
        assert!(err.to_string().contains("form value"));
        assert!(err.to_string().contains("comment="));
    }
}
