//! An invoker wired to recorders, for driving whole invocations in tests.

use std::sync::Arc;

use crate::config::InvokerConfig;
use crate::context::RequestContext;
use crate::core::{ActionDescriptor, StaticController};
use crate::errors::InvokeError;
use crate::events::CollectingEventSink;
use crate::filters::{Filter, FilterRegistration, GlobalFilterCollection};
use crate::invoker::{ActionInvoker, RequestValidator};

use super::mocks::{Journal, RecordingResultExecutor};

/// Collects global filters and actions, then invokes one of them with a
/// [`RecordingResultExecutor`] and a [`CollectingEventSink`].
///
/// ```rust,ignore
/// let fixture = InvokerFixture::new();
/// let journal = fixture.journal();
/// let fixture = fixture
///     .with_filter(RecordingActionFilter::new("audit", &journal))
///     .with_action(RecordingAction::new("Index", &journal));
///
/// fixture.invoke("Index").await?;
/// assert_journal(&journal, &["audit.executing", "Index.action", ...]);
/// ```
pub struct InvokerFixture {
    journal: Journal,
    controller: StaticController,
    globals: GlobalFilterCollection,
    executor: Arc<RecordingResultExecutor>,
    events: Arc<CollectingEventSink>,
    validator: Option<Arc<dyn RequestValidator>>,
    config: InvokerConfig,
}

impl Default for InvokerFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl InvokerFixture {
    /// Creates a fixture with a `Home` controller and no actions.
    #[must_use]
    pub fn new() -> Self {
        let journal = Journal::new();
        Self {
            executor: Arc::new(RecordingResultExecutor::new(&journal)),
            journal,
            controller: StaticController::new("Home"),
            globals: GlobalFilterCollection::new(),
            events: Arc::new(CollectingEventSink::new()),
            validator: None,
            config: InvokerConfig::default(),
        }
    }

    /// The journal shared by the fixture's recorders.
    #[must_use]
    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    /// The events collected so far.
    #[must_use]
    pub fn events(&self) -> Arc<CollectingEventSink> {
        Arc::clone(&self.events)
    }

    /// The result executor.
    #[must_use]
    pub fn executor(&self) -> Arc<RecordingResultExecutor> {
        Arc::clone(&self.executor)
    }

    /// Adds a global filter with default order.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Filter) -> Self {
        self.globals.add(FilterRegistration::new(filter));
        self
    }

    /// Adds a global registration.
    #[must_use]
    pub fn with_registration(mut self, registration: FilterRegistration) -> Self {
        self.globals.add(registration);
        self
    }

    /// Adds an action to the controller.
    #[must_use]
    pub fn with_action(mut self, action: impl ActionDescriptor + 'static) -> Self {
        self.controller = self.controller.with_action(action);
        self
    }

    /// Replaces the controller. Actions added earlier are dropped.
    #[must_use]
    pub fn with_controller(mut self, controller: StaticController) -> Self {
        self.controller = controller;
        self
    }

    /// Replaces the result executor.
    #[must_use]
    pub fn with_executor(mut self, executor: RecordingResultExecutor) -> Self {
        self.executor = Arc::new(executor);
        self
    }

    /// Replaces the request validator.
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn RequestValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Sets the invoker configuration.
    #[must_use]
    pub fn with_config(mut self, config: InvokerConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the invoker.
    #[must_use]
    pub fn invoker(&self) -> ActionInvoker {
        let invoker = ActionInvoker::new(Arc::new(self.controller.clone()))
            .with_global_filters(Arc::new(self.globals.clone()))
            .with_result_executor(Arc::clone(&self.executor) as _)
            .with_event_sink(Arc::clone(&self.events) as _)
            .with_config(self.config.clone());
        match &self.validator {
            Some(validator) => invoker.with_validator(Arc::clone(validator)),
            None => invoker,
        }
    }

    /// Invokes an action with an empty request.
    pub async fn invoke(&self, action_name: &str) -> Result<bool, InvokeError> {
        self.invoke_request(RequestContext::new(), action_name)
            .await
            .map(|(handled, _)| handled)
    }

    /// Invokes an action and hands back the request for inspection.
    pub async fn invoke_request(
        &self,
        request: RequestContext,
        action_name: &str,
    ) -> Result<(bool, Arc<RequestContext>), InvokeError> {
        let request = Arc::new(request);
        let handled = self
            .invoker()
            .invoke(Arc::clone(&request), action_name)
            .await?;
        Ok((handled, request))
    }
}
