//! Action results and return-value wrapping.

use crate::context::RequestContext;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

/// The outcome of an action, executed against the request once the
/// pipeline has settled on it.
#[async_trait]
pub trait ActionResult: Send + Sync + Debug {
    /// Short name of the result type, used in logs and events.
    fn kind(&self) -> &str;

    /// Renders the result into the request's response.
    async fn execute_result(&self, request: &RequestContext) -> anyhow::Result<()>;
}

/// Shared handle to a result. Contexts hand the same result around by
/// reference, so it is reference counted rather than owned.
pub type ActionResultRef = Arc<dyn ActionResult>;

/// A result that renders nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyResult;

impl EmptyResult {
    /// Returns a shared empty result.
    #[must_use]
    pub fn shared() -> ActionResultRef {
        Arc::new(Self)
    }
}

#[async_trait]
impl ActionResult for EmptyResult {
    fn kind(&self) -> &str {
        "empty"
    }

    async fn execute_result(&self, _request: &RequestContext) -> anyhow::Result<()> {
        Ok(())
    }
}

/// A result that writes text content.
#[derive(Debug, Clone)]
pub struct ContentResult {
    /// The body to write.
    pub content: String,
    /// Optional content type; defaults to `text/plain`.
    pub content_type: Option<String>,
}

impl ContentResult {
    /// Creates a plain-text content result.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            content_type: None,
        }
    }

    /// Sets the content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Wraps the result in a shared handle.
    #[must_use]
    pub fn shared(self) -> ActionResultRef {
        Arc::new(self)
    }
}

#[async_trait]
impl ActionResult for ContentResult {
    fn kind(&self) -> &str {
        "content"
    }

    async fn execute_result(&self, request: &RequestContext) -> anyhow::Result<()> {
        let mut response = request.response();
        response.content_type = Some(
            self.content_type
                .clone()
                .unwrap_or_else(|| "text/plain".to_string()),
        );
        response.body.push_str(&self.content);
        Ok(())
    }
}

/// A result that serializes a JSON value.
#[derive(Debug, Clone)]
pub struct JsonResult {
    /// The value to serialize.
    pub value: serde_json::Value,
}

impl JsonResult {
    /// Creates a JSON result.
    #[must_use]
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }
}

#[async_trait]
impl ActionResult for JsonResult {
    fn kind(&self) -> &str {
        "json"
    }

    async fn execute_result(&self, request: &RequestContext) -> anyhow::Result<()> {
        let body = serde_json::to_string(&self.value)?;
        let mut response = request.response();
        response.content_type = Some("application/json".to_string());
        response.body.push_str(&body);
        Ok(())
    }
}

/// A result that only sets the status code.
#[derive(Debug, Clone)]
pub struct StatusCodeResult {
    /// The status code.
    pub status: u16,
    /// Optional status description.
    pub description: Option<String>,
}

impl StatusCodeResult {
    /// Creates a status code result.
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            description: None,
        }
    }

    /// Creates a `401 Unauthorized` result.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(401).with_description("Unauthorized")
    }

    /// Sets the status description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[async_trait]
impl ActionResult for StatusCodeResult {
    fn kind(&self) -> &str {
        "status_code"
    }

    async fn execute_result(&self, request: &RequestContext) -> anyhow::Result<()> {
        let mut response = request.response();
        response.status = self.status;
        response.status_description = self.description.clone();
        Ok(())
    }
}

/// What an action method hands back before it is wrapped into a result.
#[derive(Debug, Clone)]
pub enum ReturnValue {
    /// The action returned nothing.
    Unit,
    /// The action returned a plain value.
    Value(serde_json::Value),
    /// The action returned a ready-made result.
    Result(ActionResultRef),
}

impl From<serde_json::Value> for ReturnValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Value(value)
    }
}

impl From<ActionResultRef> for ReturnValue {
    fn from(result: ActionResultRef) -> Self {
        Self::Result(result)
    }
}

impl From<&str> for ReturnValue {
    fn from(text: &str) -> Self {
        Self::Value(serde_json::Value::String(text.to_string()))
    }
}

impl From<String> for ReturnValue {
    fn from(text: String) -> Self {
        Self::Value(serde_json::Value::String(text))
    }
}

impl From<()> for ReturnValue {
    fn from((): ()) -> Self {
        Self::Unit
    }
}

/// Wraps an action's return value into the result that will be executed.
///
/// Nothing (or JSON null) becomes an [`EmptyResult`], a string becomes a
/// [`ContentResult`] with the raw text, and any other value becomes a
/// [`ContentResult`] holding its JSON text.
#[must_use]
pub fn create_action_result(value: ReturnValue) -> ActionResultRef {
    match value {
        ReturnValue::Unit | ReturnValue::Value(serde_json::Value::Null) => EmptyResult::shared(),
        ReturnValue::Result(result) => result,
        ReturnValue::Value(serde_json::Value::String(text)) => ContentResult::new(text).shared(),
        ReturnValue::Value(other) => ContentResult::new(other.to_string()).shared(),
    }
}
