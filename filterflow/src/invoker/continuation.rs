//! Continuations handed to asynchronous action and result filters.

use super::pipeline::FilterPipeline;
use crate::context::{
    ActionExecutedContext, ActionExecutingContext, ResultExecutedContext, ResultExecutingContext,
};
use crate::core::Stage;
use crate::errors::{InvalidFilterUsageError, InvokeError};
use std::sync::Arc;

/// The rest of the action stage, as seen by an [`AsyncActionFilter`].
///
/// A filter either sets a result on [`context`](Self::context) and returns,
/// or calls [`run`](Self::run) exactly once. Doing both is a contract
/// violation that fails the invocation.
///
/// [`AsyncActionFilter`]: crate::filters::AsyncActionFilter
pub struct ActionNext<'a> {
    pipeline: &'a mut FilterPipeline,
    filter: Arc<str>,
}

impl<'a> ActionNext<'a> {
    pub(crate) fn new(pipeline: &'a mut FilterPipeline, filter: Arc<str>) -> Self {
        Self { pipeline, filter }
    }

    /// The executing context. Setting its `result` short-circuits the stage.
    pub fn context(&mut self) -> &mut ActionExecutingContext {
        self.pipeline.action_executing_context()
    }

    /// Name of the filter this continuation belongs to.
    #[must_use]
    pub fn filter_name(&self) -> &str {
        &self.filter
    }

    /// Runs the remaining action filters and the action.
    ///
    /// Failures inside are captured on the returned context rather than
    /// returned as errors, so the filter can inspect or handle them.
    ///
    /// # Errors
    ///
    /// Returns [`InvokeError::InvalidFilterUsage`] if a result was already
    /// set on the executing context, and propagates failures that cannot
    /// be handled by filters.
    pub async fn run(self) -> Result<&'a mut ActionExecutedContext, InvokeError> {
        let Self { pipeline, filter } = self;
        if pipeline.action_executing_context().result.is_some() {
            let violation = InvalidFilterUsageError::new(&*filter, Stage::Action);
            pipeline.record_violation(violation.clone());
            return Err(violation.into());
        }

        pipeline.invoke_next_action_filter().await?;
        pipeline
            .action_executed_context()
            .ok_or_else(|| InvokeError::internal("action continuation produced no context"))
    }
}

/// The rest of the result stage, as seen by an [`AsyncResultFilter`].
///
/// Setting `cancel` on [`context`](Self::context) and then calling
/// [`run`](Self::run) is a contract violation.
///
/// [`AsyncResultFilter`]: crate::filters::AsyncResultFilter
pub struct ResultNext<'a> {
    pipeline: &'a mut FilterPipeline,
    filter: Arc<str>,
}

impl<'a> ResultNext<'a> {
    pub(crate) fn new(pipeline: &'a mut FilterPipeline, filter: Arc<str>) -> Self {
        Self { pipeline, filter }
    }

    /// The executing context. Setting `cancel` skips the result.
    pub fn context(&mut self) -> &mut ResultExecutingContext {
        self.pipeline.result_executing_context()
    }

    /// Name of the filter this continuation belongs to.
    #[must_use]
    pub fn filter_name(&self) -> &str {
        &self.filter
    }

    /// Runs the remaining result filters and executes the result.
    ///
    /// # Errors
    ///
    /// Returns [`InvokeError::InvalidFilterUsage`] if `cancel` was set, and
    /// propagates failures that cannot be handled by filters.
    pub async fn run(self) -> Result<&'a mut ResultExecutedContext, InvokeError> {
        let Self { pipeline, filter } = self;
        if pipeline.result_executing_context().cancel {
            let violation = InvalidFilterUsageError::new(&*filter, Stage::Result);
            pipeline.record_violation(violation.clone());
            return Err(violation.into());
        }

        pipeline.invoke_next_result_filter().await?;
        pipeline
            .result_executed_context()
            .ok_or_else(|| InvokeError::internal("result continuation produced no context"))
    }
}
