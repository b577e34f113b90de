//! Recording filters, actions and executors for testing.
//!
//! Every recorder writes into a shared [`Journal`], so a test can assert the
//! exact interleaving of filters, action and result.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::context::{
    ActionExecutedContext, ActionExecutingContext, AuthorizationContext, ExceptionContext,
    RequestContext, ResultExecutedContext, ResultExecutingContext,
};
use crate::core::{ActionDescriptor, ActionInvocation, ActionResultRef, Parameters, ReturnValue};
use crate::filters::{
    ActionFilter, AsyncActionFilter, AsyncAuthorizationFilter, AsyncExceptionFilter,
    AsyncResultFilter, AuthorizationFilter, ExceptionFilter, Filter, FilterRegistration,
    ResultFilter,
};
use crate::invoker::{ActionNext, ResultExecutor, ResultNext};

/// An ordered, shared log of what ran.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    /// Returns a copy of all entries.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Removes all entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// Records `"{name}.authorization"` and optionally denies the request.
#[derive(Debug)]
pub struct RecordingAuthorizationFilter {
    name: String,
    journal: Journal,
    deny_with: Option<ActionResultRef>,
    asynchronous: bool,
}

impl RecordingAuthorizationFilter {
    /// Creates a synchronous filter that lets the request through.
    #[must_use]
    pub fn new(name: impl Into<String>, journal: &Journal) -> Self {
        Self {
            name: name.into(),
            journal: journal.clone(),
            deny_with: None,
            asynchronous: false,
        }
    }

    /// Short-circuits with the given result.
    #[must_use]
    pub fn denying(mut self, result: ActionResultRef) -> Self {
        self.deny_with = Some(result);
        self
    }

    /// Exposes the asynchronous capability instead of the synchronous one.
    #[must_use]
    pub fn asynchronous(mut self) -> Self {
        self.asynchronous = true;
        self
    }

    fn authorize(&self, ctx: &mut AuthorizationContext) {
        self.journal.record(format!("{}.authorization", self.name));
        if let Some(result) = &self.deny_with {
            ctx.result = Some(Arc::clone(result));
        }
    }
}

impl Filter for RecordingAuthorizationFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_authorization_filter(self: Arc<Self>) -> Option<Arc<dyn AuthorizationFilter>> {
        if self.asynchronous {
            None
        } else {
            Some(self)
        }
    }

    fn as_async_authorization_filter(
        self: Arc<Self>,
    ) -> Option<Arc<dyn AsyncAuthorizationFilter>> {
        if self.asynchronous {
            Some(self)
        } else {
            None
        }
    }
}

impl AuthorizationFilter for RecordingAuthorizationFilter {
    fn on_authorization(&self, ctx: &mut AuthorizationContext) -> anyhow::Result<()> {
        self.authorize(ctx);
        Ok(())
    }
}

#[async_trait]
impl AsyncAuthorizationFilter for RecordingAuthorizationFilter {
    async fn on_authorization_async(&self, ctx: &mut AuthorizationContext) -> anyhow::Result<()> {
        tokio::task::yield_now().await;
        self.authorize(ctx);
        Ok(())
    }
}

/// What a [`RecordingExceptionFilter`] does with the failure it sees.
#[derive(Debug, Clone)]
pub enum ExceptionResponse {
    /// Leaves the failure unhandled.
    Observe,
    /// Sets `exception_handled` without a result.
    MarkHandled,
    /// Handles the failure with a result.
    HandleWith(ActionResultRef),
    /// Raises a new failure with this message.
    FailWith(String),
}

/// Records `"{name}.exception: {message}"` for every failure it sees.
#[derive(Debug)]
pub struct RecordingExceptionFilter {
    name: String,
    journal: Journal,
    response: ExceptionResponse,
    asynchronous: bool,
}

impl RecordingExceptionFilter {
    /// Creates a synchronous filter that only observes.
    #[must_use]
    pub fn new(name: impl Into<String>, journal: &Journal) -> Self {
        Self {
            name: name.into(),
            journal: journal.clone(),
            response: ExceptionResponse::Observe,
            asynchronous: false,
        }
    }

    /// Sets how the filter responds.
    #[must_use]
    pub fn responding(mut self, response: ExceptionResponse) -> Self {
        self.response = response;
        self
    }

    /// Exposes the asynchronous capability instead of the synchronous one.
    #[must_use]
    pub fn asynchronous(mut self) -> Self {
        self.asynchronous = true;
        self
    }

    fn handle(&self, ctx: &mut ExceptionContext) -> anyhow::Result<()> {
        let message = ctx
            .exception
            .as_ref()
            .map_or_else(String::new, ToString::to_string);
        self.journal
            .record(format!("{}.exception: {message}", self.name));
        match &self.response {
            ExceptionResponse::Observe => {}
            ExceptionResponse::MarkHandled => ctx.exception_handled = true,
            ExceptionResponse::HandleWith(result) => ctx.handle_with(Arc::clone(result)),
            ExceptionResponse::FailWith(message) => anyhow::bail!("{message}"),
        }
        Ok(())
    }
}

impl Filter for RecordingExceptionFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_exception_filter(self: Arc<Self>) -> Option<Arc<dyn ExceptionFilter>> {
        if self.asynchronous {
            None
        } else {
            Some(self)
        }
    }

    fn as_async_exception_filter(self: Arc<Self>) -> Option<Arc<dyn AsyncExceptionFilter>> {
        if self.asynchronous {
            Some(self)
        } else {
            None
        }
    }
}

impl ExceptionFilter for RecordingExceptionFilter {
    fn on_exception(&self, ctx: &mut ExceptionContext) -> anyhow::Result<()> {
        self.handle(ctx)
    }
}

#[async_trait]
impl AsyncExceptionFilter for RecordingExceptionFilter {
    async fn on_exception_async(&self, ctx: &mut ExceptionContext) -> anyhow::Result<()> {
        tokio::task::yield_now().await;
        self.handle(ctx)
    }
}

/// Records `"{name}.executing"` and `"{name}.executed"` around the action.
///
/// The asynchronous form records `"{name}.executed"` only if it called its
/// continuation.
#[derive(Debug)]
pub struct RecordingActionFilter {
    name: String,
    journal: Journal,
    short_circuit: Option<ActionResultRef>,
    handle_exceptions: bool,
    asynchronous: bool,
}

impl RecordingActionFilter {
    /// Creates a synchronous pass-through filter.
    #[must_use]
    pub fn new(name: impl Into<String>, journal: &Journal) -> Self {
        Self {
            name: name.into(),
            journal: journal.clone(),
            short_circuit: None,
            handle_exceptions: false,
            asynchronous: false,
        }
    }

    /// Sets a result before the action runs, skipping it.
    #[must_use]
    pub fn short_circuiting(mut self, result: ActionResultRef) -> Self {
        self.short_circuit = Some(result);
        self
    }

    /// Marks any failure from inside as handled.
    #[must_use]
    pub fn handling_exceptions(mut self) -> Self {
        self.handle_exceptions = true;
        self
    }

    /// Exposes the asynchronous capability instead of the synchronous one.
    #[must_use]
    pub fn asynchronous(mut self) -> Self {
        self.asynchronous = true;
        self
    }

    fn executed(&self, ctx: &mut ActionExecutedContext) {
        let suffix = if ctx.canceled {
            " (canceled)"
        } else if ctx.exception.is_some() {
            " (failed)"
        } else {
            ""
        };
        self.journal
            .record(format!("{}.executed{suffix}", self.name));
        if self.handle_exceptions && ctx.exception.is_some() {
            ctx.exception_handled = true;
        }
    }
}

impl Filter for RecordingActionFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_action_filter(self: Arc<Self>) -> Option<Arc<dyn ActionFilter>> {
        if self.asynchronous {
            None
        } else {
            Some(self)
        }
    }

    fn as_async_action_filter(self: Arc<Self>) -> Option<Arc<dyn AsyncActionFilter>> {
        if self.asynchronous {
            Some(self)
        } else {
            None
        }
    }
}

impl ActionFilter for RecordingActionFilter {
    fn on_action_executing(&self, ctx: &mut ActionExecutingContext) -> anyhow::Result<()> {
        self.journal.record(format!("{}.executing", self.name));
        if let Some(result) = &self.short_circuit {
            ctx.result = Some(Arc::clone(result));
        }
        Ok(())
    }

    fn on_action_executed(&self, ctx: &mut ActionExecutedContext) -> anyhow::Result<()> {
        self.executed(ctx);
        Ok(())
    }
}

#[async_trait]
impl AsyncActionFilter for RecordingActionFilter {
    async fn on_action_execution(&self, mut next: ActionNext<'_>) -> anyhow::Result<()> {
        self.journal.record(format!("{}.executing", self.name));
        if let Some(result) = &self.short_circuit {
            next.context().result = Some(Arc::clone(result));
            return Ok(());
        }
        let executed = next.run().await?;
        self.executed(executed);
        Ok(())
    }
}

/// Records `"{name}.result_executing"` and `"{name}.result_executed"`
/// around the result.
#[derive(Debug)]
pub struct RecordingResultFilter {
    name: String,
    journal: Journal,
    replace_with: Option<ActionResultRef>,
    cancel: bool,
    asynchronous: bool,
}

impl RecordingResultFilter {
    /// Creates a synchronous pass-through filter.
    #[must_use]
    pub fn new(name: impl Into<String>, journal: &Journal) -> Self {
        Self {
            name: name.into(),
            journal: journal.clone(),
            replace_with: None,
            cancel: false,
            asynchronous: false,
        }
    }

    /// Replaces the result before it executes.
    #[must_use]
    pub fn replacing(mut self, result: ActionResultRef) -> Self {
        self.replace_with = Some(result);
        self
    }

    /// Cancels result execution.
    #[must_use]
    pub fn canceling(mut self) -> Self {
        self.cancel = true;
        self
    }

    /// Exposes the asynchronous capability instead of the synchronous one.
    #[must_use]
    pub fn asynchronous(mut self) -> Self {
        self.asynchronous = true;
        self
    }

    fn executing(&self, ctx: &mut ResultExecutingContext) {
        self.journal
            .record(format!("{}.result_executing", self.name));
        if let Some(result) = &self.replace_with {
            ctx.result = Some(Arc::clone(result));
        }
        ctx.cancel = self.cancel;
    }

    fn executed(&self, ctx: &ResultExecutedContext) {
        let suffix = if ctx.canceled { " (canceled)" } else { "" };
        self.journal
            .record(format!("{}.result_executed{suffix}", self.name));
    }
}

impl Filter for RecordingResultFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_result_filter(self: Arc<Self>) -> Option<Arc<dyn ResultFilter>> {
        if self.asynchronous {
            None
        } else {
            Some(self)
        }
    }

    fn as_async_result_filter(self: Arc<Self>) -> Option<Arc<dyn AsyncResultFilter>> {
        if self.asynchronous {
            Some(self)
        } else {
            None
        }
    }
}

impl ResultFilter for RecordingResultFilter {
    fn on_result_executing(&self, ctx: &mut ResultExecutingContext) -> anyhow::Result<()> {
        self.executing(ctx);
        Ok(())
    }

    fn on_result_executed(&self, ctx: &mut ResultExecutedContext) -> anyhow::Result<()> {
        self.executed(ctx);
        Ok(())
    }
}

#[async_trait]
impl AsyncResultFilter for RecordingResultFilter {
    async fn on_result_execution(&self, mut next: ResultNext<'_>) -> anyhow::Result<()> {
        self.executing(next.context());
        if self.cancel {
            return Ok(());
        }
        let executed = next.run().await?;
        self.executed(executed);
        Ok(())
    }
}

/// One filter instance with several capabilities, each delegated to a
/// recorder.
///
/// The chain sees a single instance, so this exercises filters that take
/// part in more than one stage.
#[derive(Debug)]
pub struct CompositeFilter {
    name: String,
    authorization: Option<Arc<RecordingAuthorizationFilter>>,
    exception: Option<Arc<RecordingExceptionFilter>>,
    action: Option<Arc<RecordingActionFilter>>,
    result: Option<Arc<RecordingResultFilter>>,
}

impl CompositeFilter {
    /// Creates a filter with no capabilities.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            authorization: None,
            exception: None,
            action: None,
            result: None,
        }
    }

    /// Adds the authorization capability.
    #[must_use]
    pub fn with_authorization(mut self, filter: RecordingAuthorizationFilter) -> Self {
        self.authorization = Some(Arc::new(filter));
        self
    }

    /// Adds the exception capability.
    #[must_use]
    pub fn with_exception(mut self, filter: RecordingExceptionFilter) -> Self {
        self.exception = Some(Arc::new(filter));
        self
    }

    /// Adds the action capability.
    #[must_use]
    pub fn with_action(mut self, filter: RecordingActionFilter) -> Self {
        self.action = Some(Arc::new(filter));
        self
    }

    /// Adds the result capability.
    #[must_use]
    pub fn with_result(mut self, filter: RecordingResultFilter) -> Self {
        self.result = Some(Arc::new(filter));
        self
    }
}

impl Filter for CompositeFilter {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_authorization_filter(self: Arc<Self>) -> Option<Arc<dyn AuthorizationFilter>> {
        self.authorization.clone()?.as_authorization_filter()
    }

    fn as_async_authorization_filter(
        self: Arc<Self>,
    ) -> Option<Arc<dyn AsyncAuthorizationFilter>> {
        self.authorization.clone()?.as_async_authorization_filter()
    }

    fn as_exception_filter(self: Arc<Self>) -> Option<Arc<dyn ExceptionFilter>> {
        self.exception.clone()?.as_exception_filter()
    }

    fn as_async_exception_filter(self: Arc<Self>) -> Option<Arc<dyn AsyncExceptionFilter>> {
        self.exception.clone()?.as_async_exception_filter()
    }

    fn as_action_filter(self: Arc<Self>) -> Option<Arc<dyn ActionFilter>> {
        self.action.clone()?.as_action_filter()
    }

    fn as_async_action_filter(self: Arc<Self>) -> Option<Arc<dyn AsyncActionFilter>> {
        self.action.clone()?.as_async_action_filter()
    }

    fn as_result_filter(self: Arc<Self>) -> Option<Arc<dyn ResultFilter>> {
        self.result.clone()?.as_result_filter()
    }

    fn as_async_result_filter(self: Arc<Self>) -> Option<Arc<dyn AsyncResultFilter>> {
        self.result.clone()?.as_async_result_filter()
    }
}

/// An action that records `"{name}.action"` and returns a fixed value or
/// fails with a message.
#[derive(Debug)]
pub struct RecordingAction {
    name: String,
    journal: Journal,
    outcome: Result<ReturnValue, String>,
    asynchronous: bool,
    filters: Vec<FilterRegistration>,
    parameters: Vec<String>,
    seen_parameters: Arc<Mutex<Vec<Parameters>>>,
}

impl RecordingAction {
    /// Creates a synchronous action returning nothing.
    #[must_use]
    pub fn new(name: impl Into<String>, journal: &Journal) -> Self {
        Self {
            name: name.into(),
            journal: journal.clone(),
            outcome: Ok(ReturnValue::Unit),
            asynchronous: false,
            filters: Vec::new(),
            parameters: Vec::new(),
            seen_parameters: Arc::default(),
        }
    }

    /// Returns this value.
    #[must_use]
    pub fn returning(mut self, value: impl Into<ReturnValue>) -> Self {
        self.outcome = Ok(value.into());
        self
    }

    /// Fails with this message.
    #[must_use]
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.outcome = Err(message.into());
        self
    }

    /// Completes through a pending future.
    #[must_use]
    pub fn asynchronous(mut self) -> Self {
        self.asynchronous = true;
        self
    }

    /// Declares a parameter.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>) -> Self {
        self.parameters.push(name.into());
        self
    }

    /// Adds an action-level filter.
    #[must_use]
    pub fn with_filter(mut self, registration: FilterRegistration) -> Self {
        self.filters.push(registration);
        self
    }

    /// Returns a handle to the parameters of every call.
    #[must_use]
    pub fn seen_parameters(&self) -> Arc<Mutex<Vec<Parameters>>> {
        Arc::clone(&self.seen_parameters)
    }

    fn outcome(&self) -> anyhow::Result<ReturnValue> {
        self.outcome.clone().map_err(anyhow::Error::msg)
    }
}

impl ActionDescriptor for RecordingAction {
    fn action_name(&self) -> &str {
        &self.name
    }

    fn parameter_names(&self) -> &[String] {
        &self.parameters
    }

    fn filters(&self) -> Vec<FilterRegistration> {
        self.filters.clone()
    }

    fn invoke(&self, _request: &Arc<RequestContext>, parameters: &Parameters) -> ActionInvocation {
        self.journal.record(format!("{}.action", self.name));
        self.seen_parameters.lock().push(parameters.clone());
        let outcome = self.outcome();
        if self.asynchronous {
            ActionInvocation::Pending(Box::pin(async move {
                tokio::task::yield_now().await;
                outcome
            }))
        } else {
            ActionInvocation::Completed(outcome)
        }
    }
}

/// A result executor that records `"result: {kind}"` and then lets the
/// result render itself.
#[derive(Debug, Default)]
pub struct RecordingResultExecutor {
    journal: Journal,
    executed: Mutex<Vec<ActionResultRef>>,
    fail_with: Option<String>,
}

impl RecordingResultExecutor {
    /// Creates an executor writing to the journal.
    #[must_use]
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            executed: Mutex::new(Vec::new()),
            fail_with: None,
        }
    }

    /// Fails every execution with this message, after recording it.
    #[must_use]
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }

    /// Returns every result that was executed.
    #[must_use]
    pub fn executed(&self) -> Vec<ActionResultRef> {
        self.executed.lock().clone()
    }

    /// Returns the number of executions.
    #[must_use]
    pub fn execution_count(&self) -> usize {
        self.executed.lock().len()
    }
}

#[async_trait]
impl ResultExecutor for RecordingResultExecutor {
    async fn execute(
        &self,
        request: &RequestContext,
        result: &ActionResultRef,
    ) -> anyhow::Result<()> {
        self.journal.record(format!("result: {}", result.kind()));
        self.executed.lock().push(Arc::clone(result));
        if let Some(message) = &self.fail_with {
            anyhow::bail!("{message}");
        }
        result.execute_result(request).await
    }
}
