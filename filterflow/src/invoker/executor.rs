//! Result execution.

use crate::context::RequestContext;
use crate::core::ActionResultRef;
use async_trait::async_trait;

/// Dispatches the final result of an invocation.
///
/// Called exactly once per handled request, always with a result.
#[async_trait]
pub trait ResultExecutor: Send + Sync {
    /// Executes the result against the request.
    async fn execute(&self, request: &RequestContext, result: &ActionResultRef)
        -> anyhow::Result<()>;
}

/// Lets the result render itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResultExecutor;

#[async_trait]
impl ResultExecutor for DefaultResultExecutor {
    async fn execute(
        &self,
        request: &RequestContext,
        result: &ActionResultRef,
    ) -> anyhow::Result<()> {
        result.execute_result(request).await
    }
}
