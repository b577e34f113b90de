//! Request input validation.

use crate::context::RequestContext;
use crate::errors::RequestValidationError;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Checks client input before any action filter runs.
///
/// Called at most once per invocation, and never for child actions.
#[cfg_attr(test, mockall::automock)]
pub trait RequestValidator: Send + Sync {
    /// Rejects the request by returning an error.
    fn validate(&self, request: &RequestContext) -> anyhow::Result<()>;
}

/// `<` followed by a letter, `!`, `/` or `?` opens markup; `&#` starts a
/// character reference.
const DANGEROUS_INPUT: &str = r"<[A-Za-z!/?]|&#";

fn dangerous_input() -> Result<&'static Regex, &'static regex::Error> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(DANGEROUS_INPUT)).as_ref()
}

/// Rejects query and form values that look like markup.
#[derive(Debug, Clone, Copy, Default)]
pub struct DangerousInputValidator;

impl DangerousInputValidator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Returns true if the value would be rejected.
    #[must_use]
    pub fn is_dangerous(value: &str) -> bool {
        dangerous_input().is_ok_and(|pattern| pattern.is_match(value))
    }

    fn check(
        pattern: &Regex,
        collection: &str,
        values: &HashMap<String, String>,
    ) -> Result<(), RequestValidationError> {
        // Sorted so the reported key does not depend on hash order.
        let mut keys: Vec<&String> = values.keys().collect();
        keys.sort();
        for key in keys {
            let value = &values[key];
            if pattern.is_match(value) {
                return Err(RequestValidationError::new(collection, key.as_str(), value));
            }
        }
        Ok(())
    }
}

impl RequestValidator for DangerousInputValidator {
    fn validate(&self, request: &RequestContext) -> anyhow::Result<()> {
        let pattern = dangerous_input().map_err(Clone::clone)?;
        let input = request.input();
        Self::check(pattern, "query", &input.query)?;
        Self::check(pattern, "form", &input.form)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_compiles() {
        assert!(dangerous_input().is_ok());
    }

    #[test]
    fn test_dangerous_patterns() {
        assert!(DangerousInputValidator::is_dangerous("<script>"));
        assert!(DangerousInputValidator::is_dangerous("a</b"));
        assert!(DangerousInputValidator::is_dangerous("<!-- x -->"));
        assert!(DangerousInputValidator::is_dangerous("<?xml"));
        assert!(DangerousInputValidator::is_dangerous("&#60;"));
    }

    #[test]
    fn test_safe_values() {
        assert!(!DangerousInputValidator::is_dangerous("1 < 2"));
        assert!(!DangerousInputValidator::is_dangerous("fish & chips"));
        assert!(!DangerousInputValidator::is_dangerous("plain text"));
    }

    #[test]
    fn test_validate_accepts_clean_request() {
        let request = RequestContext::new()
            .with_query("page", "2")
            .with_form("comment", "looks good");
        assert!(DangerousInputValidator::new().validate(&request).is_ok());
    }

    #[test]
    fn test_validate_rejects_form_markup() {
        let request = RequestContext::new().with_form("comment", "<img src=x>");

        let err = DangerousInputValidator::new().validate(&request).unwrap_err();
        let err = err.downcast::<RequestValidationError>().unwrap();
        assert_eq!(err.collection, "form");
        assert_eq!(err.key, "comment");
    }

    #[test]
    fn test_validate_checks_query_first() {
        let request = RequestContext::new()
            .with_query("q", "&#x3C;")
            .with_form("body", "<b>");

        let err = DangerousInputValidator::new().validate(&request).unwrap_err();
        let err = err.downcast_ref::<RequestValidationError>().unwrap();
        assert_eq!(err.collection, "query");
    }
}
