//! Stage-aware cursor over a filter chain.

use super::{
    ActionFilter, AsyncActionFilter, AsyncAuthorizationFilter, AsyncExceptionFilter,
    AsyncResultFilter, AuthorizationFilter, ExceptionFilter, Filter, FilterChain, ResultFilter,
};
use crate::core::Stage;
use std::fmt;
use std::sync::Arc;

/// A filter resolved to one capability, with the name it is logged under.
pub struct StageFilter<T: ?Sized> {
    /// The capability.
    pub filter: Arc<T>,
    /// The owning filter's name.
    pub name: Arc<str>,
}

impl<T: ?Sized> Clone for StageFilter<T> {
    fn clone(&self) -> Self {
        Self {
            filter: Arc::clone(&self.filter),
            name: Arc::clone(&self.name),
        }
    }
}

impl<T: ?Sized> fmt::Debug for StageFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StageFilter").field(&self.name).finish()
    }
}

/// What the cursor found for a stage.
#[derive(Debug)]
pub enum CursorItem<S: ?Sized, A: ?Sized> {
    /// The next filter implements the synchronous form.
    Sync(StageFilter<S>),
    /// The next filter implements the asynchronous form.
    Async(StageFilter<A>),
    /// No filter of the stage remains.
    Exhausted,
}

/// Maps a stage to its pair of capability traits.
pub trait FilterStage {
    /// The stage this marker stands for.
    const STAGE: Stage;
    /// The synchronous capability.
    type Sync: ?Sized + Send + Sync;
    /// The asynchronous capability.
    type Async: ?Sized + Send + Sync;

    /// Queries the synchronous capability.
    fn as_sync(filter: &Arc<dyn Filter>) -> Option<Arc<Self::Sync>>;

    /// Queries the asynchronous capability.
    fn as_async(filter: &Arc<dyn Filter>) -> Option<Arc<Self::Async>>;
}

/// Marker for the authorization stage.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationStage;

/// Marker for the exception stage.
#[derive(Debug, Clone, Copy)]
pub struct ExceptionStage;

/// Marker for the action stage.
#[derive(Debug, Clone, Copy)]
pub struct ActionStage;

/// Marker for the result stage.
#[derive(Debug, Clone, Copy)]
pub struct ResultStage;

impl FilterStage for AuthorizationStage {
    const STAGE: Stage = Stage::Authorization;
    type Sync = dyn AuthorizationFilter;
    type Async = dyn AsyncAuthorizationFilter;

    fn as_sync(filter: &Arc<dyn Filter>) -> Option<Arc<Self::Sync>> {
        Arc::clone(filter).as_authorization_filter()
    }

    fn as_async(filter: &Arc<dyn Filter>) -> Option<Arc<Self::Async>> {
        Arc::clone(filter).as_async_authorization_filter()
    }
}

impl FilterStage for ExceptionStage {
    const STAGE: Stage = Stage::Exception;
    type Sync = dyn ExceptionFilter;
    type Async = dyn AsyncExceptionFilter;

    fn as_sync(filter: &Arc<dyn Filter>) -> Option<Arc<Self::Sync>> {
        Arc::clone(filter).as_exception_filter()
    }

    fn as_async(filter: &Arc<dyn Filter>) -> Option<Arc<Self::Async>> {
        Arc::clone(filter).as_async_exception_filter()
    }
}

impl FilterStage for ActionStage {
    const STAGE: Stage = Stage::Action;
    type Sync = dyn ActionFilter;
    type Async = dyn AsyncActionFilter;

    fn as_sync(filter: &Arc<dyn Filter>) -> Option<Arc<Self::Sync>> {
        Arc::clone(filter).as_action_filter()
    }

    fn as_async(filter: &Arc<dyn Filter>) -> Option<Arc<Self::Async>> {
        Arc::clone(filter).as_async_action_filter()
    }
}

impl FilterStage for ResultStage {
    const STAGE: Stage = Stage::Result;
    type Sync = dyn ResultFilter;
    type Async = dyn AsyncResultFilter;

    fn as_sync(filter: &Arc<dyn Filter>) -> Option<Arc<Self::Sync>> {
        Arc::clone(filter).as_result_filter()
    }

    fn as_async(filter: &Arc<dyn Filter>) -> Option<Arc<Self::Async>> {
        Arc::clone(filter).as_async_result_filter()
    }
}

/// A reusable position in a filter chain.
///
/// One position is shared by every stage: each stage rewinds with
/// [`reset`](Self::reset) and walks the whole chain again, skipping
/// entries of other stages.
#[derive(Debug, Clone)]
pub struct FilterCursor {
    chain: Arc<FilterChain>,
    index: usize,
}

impl FilterCursor {
    /// Creates a cursor at the start of the chain.
    #[must_use]
    pub fn new(chain: Arc<FilterChain>) -> Self {
        Self { chain, index: 0 }
    }

    /// Rewinds to the start of the chain.
    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// Returns the current position.
    #[must_use]
    pub fn position(&self) -> usize {
        self.index
    }

    /// Advances to the next entry of stage `S`.
    ///
    /// The asynchronous form wins when a filter implements both.
    pub fn next<S: FilterStage>(&mut self) -> CursorItem<S::Sync, S::Async> {
        while let Some(entry) = self.chain.get(self.index).cloned() {
            self.index += 1;
            if entry.stage != S::STAGE {
                continue;
            }

            if let Some(filter) = S::as_async(&entry.filter) {
                return CursorItem::Async(StageFilter {
                    filter,
                    name: entry.name,
                });
            }
            if let Some(filter) = S::as_sync(&entry.filter) {
                return CursorItem::Sync(StageFilter {
                    filter,
                    name: entry.name,
                });
            }
        }
        CursorItem::Exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ActionExecutingContext, AuthorizationContext, ExceptionContext};
    use crate::filters::FilterInfo;
    use crate::invoker::ActionNext;
    use async_trait::async_trait;

    struct SyncAction(&'static str);

    impl Filter for SyncAction {
        fn name(&self) -> &str {
            self.0
        }

        fn as_action_filter(self: Arc<Self>) -> Option<Arc<dyn ActionFilter>> {
            Some(self)
        }
    }

    impl ActionFilter for SyncAction {
        fn on_action_executing(&self, _ctx: &mut ActionExecutingContext) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct DualAction;

    impl Filter for DualAction {
        fn name(&self) -> &str {
            "dual"
        }

        fn as_action_filter(self: Arc<Self>) -> Option<Arc<dyn ActionFilter>> {
            Some(self)
        }

        fn as_async_action_filter(self: Arc<Self>) -> Option<Arc<dyn AsyncActionFilter>> {
            Some(self)
        }
    }

    impl ActionFilter for DualAction {}

    #[async_trait]
    impl AsyncActionFilter for DualAction {
        async fn on_action_execution(&self, next: ActionNext<'_>) -> anyhow::Result<()> {
            next.run().await?;
            Ok(())
        }
    }

    struct Guard;

    impl Filter for Guard {
        fn name(&self) -> &str {
            "guard"
        }

        fn as_authorization_filter(self: Arc<Self>) -> Option<Arc<dyn AuthorizationFilter>> {
            Some(self)
        }

        fn as_exception_filter(self: Arc<Self>) -> Option<Arc<dyn ExceptionFilter>> {
            Some(self)
        }
    }

    impl AuthorizationFilter for Guard {
        fn on_authorization(&self, _ctx: &mut AuthorizationContext) -> anyhow::Result<()> {
            Ok(())
        }
    }

    impl ExceptionFilter for Guard {
        fn on_exception(&self, _ctx: &mut ExceptionContext) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn cursor(filters: Vec<Arc<dyn Filter>>) -> FilterCursor {
        let chain = FilterChain::from_info(&FilterInfo::from_filters(filters));
        FilterCursor::new(Arc::new(chain))
    }

    fn item_name<S: ?Sized, A: ?Sized>(item: &CursorItem<S, A>) -> Option<(&str, bool)> {
        match item {
            CursorItem::Sync(filter) => Some((filter.name.as_ref(), false)),
            CursorItem::Async(filter) => Some((filter.name.as_ref(), true)),
            CursorItem::Exhausted => None,
        }
    }

    #[test]
    fn test_next_skips_other_stages() {
        let mut cursor = cursor(vec![
            Arc::new(Guard),
            Arc::new(SyncAction("a")),
            Arc::new(SyncAction("b")),
        ]);

        assert_eq!(item_name(&cursor.next::<ActionStage>()), Some(("a", false)));
        assert_eq!(item_name(&cursor.next::<ActionStage>()), Some(("b", false)));
        assert_eq!(item_name(&cursor.next::<ActionStage>()), None);
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn test_async_form_wins() {
        let mut cursor = cursor(vec![Arc::new(DualAction)]);
        assert_eq!(item_name(&cursor.next::<ActionStage>()), Some(("dual", true)));
    }

    #[test]
    fn test_reset_rewinds_for_each_stage() {
        let mut cursor = cursor(vec![Arc::new(Guard), Arc::new(SyncAction("a"))]);

        assert_eq!(
            item_name(&cursor.next::<AuthorizationStage>()),
            Some(("guard", false))
        );
        assert_eq!(item_name(&cursor.next::<AuthorizationStage>()), None);

        cursor.reset();
        assert_eq!(item_name(&cursor.next::<ExceptionStage>()), Some(("guard", false)));
        assert_eq!(item_name(&cursor.next::<ExceptionStage>()), None);

        cursor.reset();
        assert_eq!(item_name(&cursor.next::<ResultStage>()), None);
    }

    #[test]
    fn test_stage_markers() {
        assert_eq!(AuthorizationStage::STAGE, Stage::Authorization);
        assert_eq!(ResultStage::STAGE, Stage::Result);
    }
}
