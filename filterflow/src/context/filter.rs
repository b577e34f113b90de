//! The part every stage context shares.

use super::RequestContext;
use crate::core::ActionDescriptor;
use std::fmt;
use std::sync::Arc;

/// The request and the resolved action, shared by every stage context of
/// one invocation. Stage contexts deref to it.
#[derive(Clone)]
pub struct FilterContext {
    request: Arc<RequestContext>,
    action: Arc<dyn ActionDescriptor>,
}

impl FilterContext {
    /// Creates a new filter context.
    #[must_use]
    pub fn new(request: Arc<RequestContext>, action: Arc<dyn ActionDescriptor>) -> Self {
        Self { request, action }
    }

    /// Returns the request.
    #[must_use]
    pub fn request(&self) -> &RequestContext {
        &self.request
    }

    /// Returns a shared handle to the request.
    #[must_use]
    pub fn shared_request(&self) -> Arc<RequestContext> {
        Arc::clone(&self.request)
    }

    /// Returns the action being invoked.
    #[must_use]
    pub fn action(&self) -> &dyn ActionDescriptor {
        self.action.as_ref()
    }

    /// Returns the name of the action being invoked.
    #[must_use]
    pub fn action_name(&self) -> &str {
        self.action.action_name()
    }
}

impl fmt::Debug for FilterContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterContext")
            .field("request_id", &self.request.request_id())
            .field("action", &self.action.action_name())
            .finish()
    }
}
