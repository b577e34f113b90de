//! Filter classification and the merged filter chain.

use super::Filter;
use crate::core::Stage;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// The filters of one invocation, grouped by stage.
///
/// A filter with several capabilities appears in several groups. Order
/// within a group is precedence.
#[derive(Clone, Default)]
pub struct FilterInfo {
    /// Authorization filters.
    pub authorization: Vec<Arc<dyn Filter>>,
    /// Exception filters.
    pub exception: Vec<Arc<dyn Filter>>,
    /// Action filters.
    pub action: Vec<Arc<dyn Filter>>,
    /// Result filters.
    pub result: Vec<Arc<dyn Filter>>,
}

impl FilterInfo {
    /// Creates an empty filter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits an ordered list of filters into stage groups by capability.
    #[must_use]
    pub fn from_filters<I>(filters: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Filter>>,
    {
        let mut info = Self::new();
        for filter in filters {
            if Arc::clone(&filter).as_authorization_filter().is_some()
                || Arc::clone(&filter).as_async_authorization_filter().is_some()
            {
                info.authorization.push(Arc::clone(&filter));
            }
            if Arc::clone(&filter).as_exception_filter().is_some()
                || Arc::clone(&filter).as_async_exception_filter().is_some()
            {
                info.exception.push(Arc::clone(&filter));
            }
            if Arc::clone(&filter).as_action_filter().is_some()
                || Arc::clone(&filter).as_async_action_filter().is_some()
            {
                info.action.push(Arc::clone(&filter));
            }
            if Arc::clone(&filter).as_result_filter().is_some()
                || Arc::clone(&filter).as_async_result_filter().is_some()
            {
                info.result.push(filter);
            }
        }
        info
    }

    /// Returns the total number of group entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.authorization.len() + self.exception.len() + self.action.len() + self.result.len()
    }

    /// Returns true if no group has a filter.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for FilterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |filters: &[Arc<dyn Filter>]| {
            filters.iter().map(|filter| filter.name().to_string()).collect::<Vec<_>>()
        };
        f.debug_struct("FilterInfo")
            .field("authorization", &names(&self.authorization))
            .field("exception", &names(&self.exception))
            .field("action", &names(&self.action))
            .field("result", &names(&self.result))
            .finish()
    }
}

/// One filter in the chain, tagged with the stage group it came from.
#[derive(Clone)]
pub struct ChainEntry {
    /// The filter.
    pub filter: Arc<dyn Filter>,
    /// The filter's name, captured once.
    pub name: Arc<str>,
    /// The group this entry belongs to. A cursor for one stage only matches
    /// entries of that stage.
    pub stage: Stage,
}

/// The immutable, ordered filter chain for one action.
///
/// Authorization, exception, action and result groups are concatenated in
/// that order. A filter with several capabilities has one entry per group, at
/// its declared position within that group; an instance listed twice in the
/// same group keeps its first entry. The chain holds no per-request state, so
/// one chain can back any number of concurrent cursors.
#[derive(Clone, Default)]
pub struct FilterChain {
    entries: Vec<ChainEntry>,
}

impl FilterChain {
    /// Builds the chain from grouped filters.
    #[must_use]
    pub fn from_info(info: &FilterInfo) -> Self {
        let groups = [
            (Stage::Authorization, &info.authorization),
            (Stage::Exception, &info.exception),
            (Stage::Action, &info.action),
            (Stage::Result, &info.result),
        ];

        let mut entries = Vec::with_capacity(info.len());
        for (stage, filters) in groups {
            let mut seen = HashSet::new();
            entries.extend(
                filters
                    .iter()
                    .filter(|filter| seen.insert(Arc::as_ptr(filter).cast::<()>()))
                    .map(|filter| ChainEntry {
                        filter: Arc::clone(filter),
                        name: Arc::from(filter.name()),
                        stage,
                    }),
            );
        }
        Self { entries }
    }

    /// Returns the entry at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ChainEntry> {
        self.entries.get(index)
    }

    /// Returns the filter names in chain order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_ref()).collect()
    }

    /// Returns the names of one stage's entries, in the order they run.
    #[must_use]
    pub fn stage_names(&self, stage: Stage) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.stage == stage)
            .map(|entry| entry.name.as_ref())
            .collect()
    }

    /// Returns the number of filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the chain is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("filters", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ActionExecutingContext, AuthorizationContext, ResultExecutingContext};
    use crate::filters::{ActionFilter, AuthorizationFilter, ResultFilter};

    struct Named(&'static str);

    impl Filter for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn as_action_filter(self: Arc<Self>) -> Option<Arc<dyn ActionFilter>> {
            Some(self)
        }
    }

    impl ActionFilter for Named {
        fn on_action_executing(&self, _ctx: &mut ActionExecutingContext) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct Both;

    impl Filter for Both {
        fn name(&self) -> &str {
            "both"
        }

        fn as_authorization_filter(self: Arc<Self>) -> Option<Arc<dyn AuthorizationFilter>> {
            Some(self)
        }

        fn as_result_filter(self: Arc<Self>) -> Option<Arc<dyn ResultFilter>> {
            Some(self)
        }
    }

    impl AuthorizationFilter for Both {
        fn on_authorization(&self, _ctx: &mut AuthorizationContext) -> anyhow::Result<()> {
            Ok(())
        }
    }

    impl ResultFilter for Both {
        fn on_result_executing(&self, _ctx: &mut ResultExecutingContext) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct GuardedAction;

    impl Filter for GuardedAction {
        fn name(&self) -> &str {
            "guarded"
        }

        fn as_authorization_filter(self: Arc<Self>) -> Option<Arc<dyn AuthorizationFilter>> {
            Some(self)
        }

        fn as_action_filter(self: Arc<Self>) -> Option<Arc<dyn ActionFilter>> {
            Some(self)
        }
    }

    impl AuthorizationFilter for GuardedAction {
        fn on_authorization(&self, _ctx: &mut AuthorizationContext) -> anyhow::Result<()> {
            Ok(())
        }
    }

    impl ActionFilter for GuardedAction {}

    #[test]
    fn test_from_filters_groups_by_capability() {
        let both: Arc<dyn Filter> = Arc::new(Both);
        let a: Arc<dyn Filter> = Arc::new(Named("a"));
        let info = FilterInfo::from_filters(vec![a, both]);

        assert_eq!(info.authorization.len(), 1);
        assert!(info.exception.is_empty());
        assert_eq!(info.action.len(), 1);
        assert_eq!(info.result.len(), 1);
        assert_eq!(info.len(), 3);
    }

    #[test]
    fn test_chain_concatenates_in_stage_order() {
        let info = FilterInfo {
            authorization: vec![Arc::new(Both)],
            action: vec![Arc::new(Named("a")), Arc::new(Named("b"))],
            ..FilterInfo::default()
        };
        let chain = FilterChain::from_info(&info);
        assert_eq!(chain.names(), vec!["both", "a", "b"]);
    }

    #[test]
    fn test_shared_instance_has_one_entry_per_stage() {
        let both: Arc<dyn Filter> = Arc::new(Both);
        let info = FilterInfo::from_filters(vec![Arc::clone(&both)]);
        assert_eq!(info.len(), 2);

        let chain = FilterChain::from_info(&info);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.get(0).unwrap().stage, Stage::Authorization);
        assert_eq!(chain.get(1).unwrap().stage, Stage::Result);
        assert!(Arc::ptr_eq(&chain.get(0).unwrap().filter, &both));
        assert!(Arc::ptr_eq(&chain.get(1).unwrap().filter, &both));
    }

    #[test]
    fn test_repeated_instance_in_one_stage_kept_once() {
        let a: Arc<dyn Filter> = Arc::new(Named("a"));
        let b: Arc<dyn Filter> = Arc::new(Named("b"));
        let info = FilterInfo::from_filters(vec![Arc::clone(&a), b, a]);

        let chain = FilterChain::from_info(&info);
        assert_eq!(chain.stage_names(Stage::Action), vec!["a", "b"]);
    }

    #[test]
    fn test_multi_capability_filter_keeps_declared_action_order() {
        let x: Arc<dyn Filter> = Arc::new(Named("x"));
        let y: Arc<dyn Filter> = Arc::new(GuardedAction);
        let chain = FilterChain::from_info(&FilterInfo::from_filters(vec![x, y]));

        assert_eq!(chain.names(), vec!["guarded", "x", "guarded"]);
        assert_eq!(chain.stage_names(Stage::Authorization), vec!["guarded"]);
        assert_eq!(chain.stage_names(Stage::Action), vec!["x", "guarded"]);
    }

    #[test]
    fn test_empty_chain() {
        let chain = FilterChain::from_info(&FilterInfo::new());
        assert!(chain.is_empty());
        assert!(chain.get(0).is_none());
    }
}
