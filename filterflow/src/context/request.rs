//! The request context every stage reads.

use super::RequestItems;
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Values produced by routing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteData {
    /// Route values, such as `controller`, `action` or `id`.
    #[serde(default)]
    pub values: HashMap<String, String>,
    /// Set when the route was bound directly to an action, so no action
    /// name needs to be supplied.
    #[serde(default)]
    pub direct_route_action: Option<String>,
}

impl RouteData {
    /// Creates empty route data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a route value.
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Marks the route as a direct match for an action.
    #[must_use]
    pub fn with_direct_route(mut self, action_name: impl Into<String>) -> Self {
        self.direct_route_action = Some(action_name.into());
        self
    }

    /// Returns true if the route was bound directly to an action.
    #[must_use]
    pub fn has_direct_route_match(&self) -> bool {
        self.direct_route_action.is_some()
    }

    /// Gets a route value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// Unvalidated client input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestInput {
    /// Query string values.
    #[serde(default)]
    pub query: HashMap<String, String>,
    /// Form values.
    #[serde(default)]
    pub form: HashMap<String, String>,
}

/// The response buffer results render into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Status code.
    pub status: u16,
    /// Optional status description.
    pub status_description: Option<String>,
    /// Content type of the body.
    pub content_type: Option<String>,
    /// Response body.
    pub body: String,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: 200,
            status_description: None,
            content_type: None,
            body: String::new(),
        }
    }
}

/// Everything the pipeline knows about the request being handled.
///
/// Shared read-only between stages; the response buffer and the item bag
/// are the only interior-mutable parts.
#[derive(Debug, Default)]
pub struct RequestContext {
    request_id: Uuid,
    route: RouteData,
    input: RequestInput,
    is_child_action: bool,
    /// Per-request items shared by filters.
    pub items: RequestItems,
    response: Mutex<Response>,
}

impl RequestContext {
    /// Creates a new request context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            ..Self::default()
        }
    }

    /// Sets the request ID.
    #[must_use]
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }

    /// Sets the route data.
    #[must_use]
    pub fn with_route(mut self, route: RouteData) -> Self {
        self.route = route;
        self
    }

    /// Adds a query string value.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.input.query.insert(key.into(), value.into());
        self
    }

    /// Adds a form value.
    #[must_use]
    pub fn with_form(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.input.form.insert(key.into(), value.into());
        self
    }

    /// Marks the request as a child action rendered from within another
    /// request. Child actions skip request validation.
    #[must_use]
    pub fn as_child_action(mut self) -> Self {
        self.is_child_action = true;
        self
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Returns the route data.
    #[must_use]
    pub fn route(&self) -> &RouteData {
        &self.route
    }

    /// Returns the client input.
    #[must_use]
    pub fn input(&self) -> &RequestInput {
        &self.input
    }

    /// Returns true for a child action.
    #[must_use]
    pub fn is_child_action(&self) -> bool {
        self.is_child_action
    }

    /// Locks the response buffer.
    ///
    /// The guard must not be held across an await point.
    pub fn response(&self) -> MutexGuard<'_, Response> {
        self.response.lock()
    }

    /// Returns a copy of the response buffer.
    #[must_use]
    pub fn response_snapshot(&self) -> Response {
        self.response.lock().clone()
    }
}
