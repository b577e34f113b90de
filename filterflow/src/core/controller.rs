//! Controller descriptors and action resolution.

use super::action::ActionDescriptor;
use crate::context::RequestContext;
use crate::filters::FilterRegistration;
use std::fmt::Debug;
use std::sync::Arc;

/// A controller: the owner of a set of actions and of controller-level filters.
pub trait ControllerDescriptor: Send + Sync + Debug {
    /// The controller's name.
    fn controller_name(&self) -> &str;

    /// Resolves an action by name. `None` means the request is not handled.
    fn find_action(
        &self,
        request: &RequestContext,
        action_name: &str,
    ) -> Option<Arc<dyn ActionDescriptor>>;

    /// Filters declared on the controller.
    fn filters(&self) -> Vec<FilterRegistration> {
        Vec::new()
    }

    /// Whether request input is validated before action filters run.
    fn validate_request(&self) -> bool {
        true
    }
}

/// A controller with a fixed list of actions, matched case-insensitively.
#[derive(Debug, Clone)]
pub struct StaticController {
    name: String,
    actions: Vec<Arc<dyn ActionDescriptor>>,
    filters: Vec<FilterRegistration>,
    validate_request: bool,
}

impl StaticController {
    /// Creates a new controller with no actions.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: Vec::new(),
            filters: Vec::new(),
            validate_request: true,
        }
    }

    /// Adds an action.
    #[must_use]
    pub fn with_action(mut self, action: impl ActionDescriptor + 'static) -> Self {
        self.actions.push(Arc::new(action));
        self
    }

    /// Adds an already shared action.
    #[must_use]
    pub fn with_shared_action(mut self, action: Arc<dyn ActionDescriptor>) -> Self {
        self.actions.push(action);
        self
    }

    /// Attaches a controller-level filter.
    #[must_use]
    pub fn with_filter(mut self, registration: FilterRegistration) -> Self {
        self.filters.push(registration);
        self
    }

    /// Enables or disables request validation for every action.
    #[must_use]
    pub fn with_request_validation(mut self, enabled: bool) -> Self {
        self.validate_request = enabled;
        self
    }

    /// Returns the number of actions.
    #[must_use]
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }
}

impl ControllerDescriptor for StaticController {
    fn controller_name(&self) -> &str {
        &self.name
    }

    fn find_action(
        &self,
        _request: &RequestContext,
        action_name: &str,
    ) -> Option<Arc<dyn ActionDescriptor>> {
        self.actions
            .iter()
            .find(|action| action.action_name().eq_ignore_ascii_case(action_name))
            .cloned()
    }

    fn filters(&self) -> Vec<FilterRegistration> {
        self.filters.clone()
    }

    fn validate_request(&self) -> bool {
        self.validate_request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ReturnValue, SyncAction};

    fn controller() -> StaticController {
        StaticController::new("Home")
            .with_action(SyncAction::new("Index", |_, _| Ok(ReturnValue::Unit)))
            .with_action(SyncAction::new("About", |_, _| Ok(ReturnValue::Unit)))
    }

    #[test]
    fn test_find_action_ignores_case() {
        let controller = controller();
        let request = RequestContext::new();

        let found = controller.find_action(&request, "index").unwrap();
        assert_eq!(found.action_name(), "Index");
        assert!(controller.find_action(&request, "ABOUT").is_some());
    }

    #[test]
    fn test_find_action_missing() {
        let controller = controller();
        assert!(controller
            .find_action(&RequestContext::new(), "Contact")
            .is_none());
        assert_eq!(controller.action_count(), 2);
    }

    #[test]
    fn test_request_validation_flag() {
        assert!(controller().validate_request());
        assert!(!controller()
            .with_request_validation(false)
            .validate_request());
    }
}
