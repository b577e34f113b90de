//! Filter registrations and providers.

use super::{Filter, FilterInfo};
use crate::core::{ActionDescriptor, ControllerDescriptor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Where a filter was registered. Breaks ties between equal orders:
/// earlier scopes run first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterScope {
    /// Runs before everything else with the same order.
    First = 0,
    /// Registered for every controller.
    Global = 10,
    /// Registered on the controller.
    Controller = 20,
    /// Registered on the action.
    Action = 30,
    /// Runs after everything else with the same order.
    Last = 100,
}

/// A filter together with its position in the merged chain.
#[derive(Clone)]
pub struct FilterRegistration {
    /// The filter.
    pub filter: Arc<dyn Filter>,
    /// Explicit order; lower runs first.
    pub order: i32,
    /// Registration scope.
    pub scope: FilterScope,
}

impl FilterRegistration {
    /// Order used when none is given.
    pub const DEFAULT_ORDER: i32 = -1;

    /// Creates a registration with the default order.
    #[must_use]
    pub fn new(filter: impl Filter) -> Self {
        Self::shared(Arc::new(filter))
    }

    /// Creates a registration for an already shared filter.
    #[must_use]
    pub fn shared(filter: Arc<dyn Filter>) -> Self {
        Self {
            filter,
            order: Self::DEFAULT_ORDER,
            scope: FilterScope::Global,
        }
    }

    /// Sets the order.
    #[must_use]
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Sets the scope.
    #[must_use]
    pub fn with_scope(mut self, scope: FilterScope) -> Self {
        self.scope = scope;
        self
    }
}

impl fmt::Debug for FilterRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterRegistration")
            .field("filter", &self.filter.name())
            .field("order", &self.order)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Supplies filters for one action invocation.
pub trait FilterProvider: Send + Sync {
    /// Returns the registrations that apply to the action.
    fn filters(
        &self,
        controller: &dyn ControllerDescriptor,
        action: &dyn ActionDescriptor,
    ) -> Vec<FilterRegistration>;
}

/// Filters that apply to every action.
#[derive(Debug, Clone, Default)]
pub struct GlobalFilterCollection {
    registrations: Vec<FilterRegistration>,
}

impl GlobalFilterCollection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a registration. Its scope is kept, so `First` and `Last` work.
    pub fn add(&mut self, registration: FilterRegistration) {
        self.registrations.push(registration);
    }

    /// Returns the number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Returns true if the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

impl FilterProvider for GlobalFilterCollection {
    fn filters(
        &self,
        _controller: &dyn ControllerDescriptor,
        _action: &dyn ActionDescriptor,
    ) -> Vec<FilterRegistration> {
        self.registrations.clone()
    }
}

/// Filters declared on the controller.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerFilterProvider;

impl FilterProvider for ControllerFilterProvider {
    fn filters(
        &self,
        controller: &dyn ControllerDescriptor,
        _action: &dyn ActionDescriptor,
    ) -> Vec<FilterRegistration> {
        controller
            .filters()
            .into_iter()
            .map(|registration| registration.with_scope(FilterScope::Controller))
            .collect()
    }
}

/// Filters declared on the action.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionFilterProvider;

impl FilterProvider for ActionFilterProvider {
    fn filters(
        &self,
        _controller: &dyn ControllerDescriptor,
        action: &dyn ActionDescriptor,
    ) -> Vec<FilterRegistration> {
        action
            .filters()
            .into_iter()
            .map(|registration| registration.with_scope(FilterScope::Action))
            .collect()
    }
}

/// The ordered set of providers consulted for every invocation.
pub struct FilterProviders {
    providers: Vec<Arc<dyn FilterProvider>>,
}

impl FilterProviders {
    /// Creates an empty provider set.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Adds a provider.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn FilterProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Adds a provider that is consulted before the existing ones.
    #[must_use]
    pub fn with_leading_provider(mut self, provider: Arc<dyn FilterProvider>) -> Self {
        self.providers.insert(0, provider);
        self
    }

    /// Returns the number of providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns true if there are no providers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Collects, orders and classifies the filters for an action.
    ///
    /// Registrations are stably sorted by `(order, scope)`, so filters with
    /// equal keys keep their provider order.
    #[must_use]
    pub fn collect(
        &self,
        controller: &dyn ControllerDescriptor,
        action: &dyn ActionDescriptor,
    ) -> FilterInfo {
        let mut registrations: Vec<FilterRegistration> = self
            .providers
            .iter()
            .flat_map(|provider| provider.filters(controller, action))
            .collect();
        registrations.sort_by_key(|registration| (registration.order, registration.scope));

        FilterInfo::from_filters(registrations.into_iter().map(|registration| registration.filter))
    }
}

impl Default for FilterProviders {
    /// Controller and action providers, in that order.
    fn default() -> Self {
        Self::empty()
            .with_provider(Arc::new(ControllerFilterProvider))
            .with_provider(Arc::new(ActionFilterProvider))
    }
}

impl fmt::Debug for FilterProviders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterProviders")
            .field("providers", &self.providers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ActionExecutingContext;
    use crate::core::{ReturnValue, StaticController, SyncAction};
    use crate::filters::ActionFilter;

    struct Tagged(&'static str);

    impl Filter for Tagged {
        fn name(&self) -> &str {
            self.0
        }

        fn as_action_filter(self: Arc<Self>) -> Option<Arc<dyn ActionFilter>> {
            Some(self)
        }
    }

    impl ActionFilter for Tagged {
        fn on_action_executing(&self, _ctx: &mut ActionExecutingContext) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn names(info: &FilterInfo) -> Vec<String> {
        info.action.iter().map(|f| f.name().to_string()).collect()
    }

    #[test]
    fn test_scope_ordering() {
        assert!(FilterScope::First < FilterScope::Global);
        assert!(FilterScope::Controller < FilterScope::Action);
        assert!(FilterScope::Action < FilterScope::Last);
    }

    #[test]
    fn test_collect_orders_by_scope_then_provider() {
        let action = SyncAction::new("Index", |_, _| Ok(ReturnValue::Unit))
            .with_filter(FilterRegistration::new(Tagged("action")));
        let controller = StaticController::new("Home")
            .with_filter(FilterRegistration::new(Tagged("controller")));

        let mut globals = GlobalFilterCollection::new();
        globals.add(FilterRegistration::new(Tagged("global")));
        globals.add(FilterRegistration::new(Tagged("last")).with_scope(FilterScope::Last));
        globals.add(FilterRegistration::new(Tagged("first")).with_scope(FilterScope::First));

        let providers = FilterProviders::empty()
            .with_provider(Arc::new(globals))
            .with_provider(Arc::new(ActionFilterProvider))
            .with_provider(Arc::new(ControllerFilterProvider));

        let info = providers.collect(&controller, &action);
        assert_eq!(
            names(&info),
            vec!["first", "global", "controller", "action", "last"]
        );
    }

    #[test]
    fn test_explicit_order_wins_over_scope() {
        let action = SyncAction::new("Index", |_, _| Ok(ReturnValue::Unit))
            .with_filter(FilterRegistration::new(Tagged("early")).with_order(-10));
        let controller = StaticController::new("Home")
            .with_filter(FilterRegistration::new(Tagged("default")));

        let info = FilterProviders::default().collect(&controller, &action);
        assert_eq!(names(&info), vec!["early", "default"]);
    }

    #[test]
    fn test_equal_keys_keep_registration_order() {
        let mut globals = GlobalFilterCollection::new();
        globals.add(FilterRegistration::new(Tagged("one")));
        globals.add(FilterRegistration::new(Tagged("two")));
        globals.add(FilterRegistration::new(Tagged("three")));
        assert_eq!(globals.len(), 3);

        let providers = FilterProviders::empty().with_provider(Arc::new(globals));
        let action = SyncAction::new("Index", |_, _| Ok(ReturnValue::Unit));
        let info = providers.collect(&StaticController::new("Home"), &action);
        assert_eq!(names(&info), vec!["one", "two", "three"]);
    }
}
