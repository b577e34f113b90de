//! The public entry point: resolve an action and run it through its filters.

use super::binder::{DefaultParameterBinder, ParameterBinder};
use super::executor::{DefaultResultExecutor, ResultExecutor};
use super::pipeline::FilterPipeline;
use super::validation::{DangerousInputValidator, RequestValidator};
use crate::config::InvokerConfig;
use crate::context::{FilterContext, RequestContext};
use crate::core::ControllerDescriptor;
use crate::errors::{ArgumentError, InvokeError};
use crate::events::{get_event_sink, EventSink};
use crate::filters::{FilterChain, FilterProvider, FilterProviders};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info_span, warn, Instrument};

/// Invokes actions of one controller.
///
/// ```rust,ignore
/// let invoker = ActionInvoker::new(Arc::new(controller))
///     .with_global_filters(Arc::new(globals));
///
/// let handled = invoker.invoke(Arc::new(request), "Index").await?;
/// ```
pub struct ActionInvoker {
    controller: Arc<dyn ControllerDescriptor>,
    providers: FilterProviders,
    binder: Arc<dyn ParameterBinder>,
    validator: Arc<dyn RequestValidator>,
    result_executor: Arc<dyn ResultExecutor>,
    events: Option<Arc<dyn EventSink>>,
    config: InvokerConfig,
}

impl ActionInvoker {
    /// Creates an invoker with the default collaborators.
    #[must_use]
    pub fn new(controller: Arc<dyn ControllerDescriptor>) -> Self {
        Self {
            controller,
            providers: FilterProviders::default(),
            binder: Arc::new(DefaultParameterBinder),
            validator: Arc::new(DangerousInputValidator::new()),
            result_executor: Arc::new(DefaultResultExecutor),
            events: None,
            config: InvokerConfig::default(),
        }
    }

    /// Adds filters that apply to every action, ahead of controller and
    /// action filters with the same order and scope.
    #[must_use]
    pub fn with_global_filters(mut self, globals: Arc<dyn FilterProvider>) -> Self {
        self.providers = self.providers.with_leading_provider(globals);
        self
    }

    /// Replaces the filter providers.
    #[must_use]
    pub fn with_filter_providers(mut self, providers: FilterProviders) -> Self {
        self.providers = providers;
        self
    }

    /// Replaces the parameter binder.
    #[must_use]
    pub fn with_binder(mut self, binder: Arc<dyn ParameterBinder>) -> Self {
        self.binder = binder;
        self
    }

    /// Replaces the request validator.
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn RequestValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Replaces the result executor.
    #[must_use]
    pub fn with_result_executor(mut self, executor: Arc<dyn ResultExecutor>) -> Self {
        self.result_executor = executor;
        self
    }

    /// Sends pipeline events to this sink instead of the process-wide one.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = Some(sink);
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn with_config(mut self, config: InvokerConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &InvokerConfig {
        &self.config
    }

    /// Returns the controller.
    #[must_use]
    pub fn controller(&self) -> &Arc<dyn ControllerDescriptor> {
        &self.controller
    }

    /// Runs the named action through its filter pipeline.
    ///
    /// An empty `action_name` is allowed when the route was bound directly
    /// to an action. Returns `Ok(false)` if the controller has no such
    /// action; nothing runs in that case.
    ///
    /// # Errors
    ///
    /// - [`InvokeError::InvalidArgument`] for a missing action name.
    /// - [`InvokeError::Unhandled`] for a failure no exception filter handled.
    /// - [`InvokeError::InvalidFilterUsage`] if a filter both short-circuited
    ///   and called its continuation.
    pub async fn invoke(
        &self,
        request: Arc<RequestContext>,
        action_name: &str,
    ) -> Result<bool, InvokeError> {
        let action_name = if action_name.is_empty() {
            request
                .route()
                .direct_route_action
                .as_deref()
                .ok_or_else(|| ArgumentError::null_or_empty("action_name"))?
        } else {
            action_name
        };

        let Some(action) = self.controller.find_action(&request, action_name) else {
            debug!(
                request_id = %request.request_id(),
                controller = self.controller.controller_name(),
                action = action_name,
                "No matching action"
            );
            return Ok(false);
        };

        let info = self.providers.collect(self.controller.as_ref(), action.as_ref());
        let chain = Arc::new(FilterChain::from_info(&info));
        let parameters = self
            .binder
            .bind(&request, action.as_ref())
            .map_err(InvokeError::from_filter)?;

        let validator = (self.config.validate_request && self.controller.validate_request())
            .then(|| Arc::clone(&self.validator));
        let events = self
            .config
            .emit_events
            .then(|| self.events.clone().unwrap_or_else(get_event_sink));

        let span = info_span!(
            "invoke_action",
            request_id = %request.request_id(),
            controller = self.controller.controller_name(),
            action = action.action_name(),
            filters = chain.len(),
        );

        let mut pipeline = FilterPipeline::new(
            FilterContext::new(Arc::clone(&request), Arc::clone(&action)),
            parameters,
            chain,
            Arc::clone(&self.result_executor),
        )
        .with_validator(validator)
        .with_events(events.clone())
        .with_trace_transitions(self.config.trace_transitions);

        let payload = serde_json::json!({
            "request_id": request.request_id(),
            "controller": self.controller.controller_name(),
            "action": action.action_name(),
        });
        if let Some(sink) = &events {
            sink.try_emit("invocation.started", Some(payload.clone()));
        }

        let outcome = pipeline.invoke().instrument(span).await;

        match &outcome {
            Ok(()) => {
                debug!(
                    request_id = %request.request_id(),
                    action = action.action_name(),
                    result = pipeline.final_result().map(|result| result.kind()),
                    "Action invoked"
                );
                if let Some(sink) = &events {
                    sink.try_emit("invocation.completed", Some(payload));
                }
            }
            Err(error) => {
                warn!(
                    request_id = %request.request_id(),
                    action = action.action_name(),
                    kind = error.kind(),
                    error = %error,
                    "Action invocation failed"
                );
                if let Some(sink) = &events {
                    let mut payload = payload;
                    if let Some(fields) = payload.as_object_mut() {
                        fields.insert("kind".to_string(), serde_json::json!(error.kind()));
                        fields.insert("error".to_string(), serde_json::json!(error.to_string()));
                    }
                    sink.try_emit("invocation.failed", Some(payload));
                }
            }
        }

        outcome.map(|()| true)
    }
}

impl fmt::Debug for ActionInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionInvoker")
            .field("controller", &self.controller.controller_name())
            .field("providers", &self.providers)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ReturnValue, StaticController, SyncAction};
    use crate::events::CollectingEventSink;
    use crate::invoker::MockParameterBinder;

    fn controller() -> Arc<dyn ControllerDescriptor> {
        Arc::new(
            StaticController::new("Home")
                .with_action(SyncAction::new("Index", |_, _| Ok(ReturnValue::from("home")))),
        )
    }

    #[test]
    fn test_binder_failure_is_unhandled() {
        let mut binder = MockParameterBinder::new();
        binder
            .expect_bind()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("cannot bind 'id'")));
        let events = Arc::new(CollectingEventSink::new());
        let invoker = ActionInvoker::new(controller())
            .with_binder(Arc::new(binder))
            .with_event_sink(Arc::clone(&events) as _);

        let err = tokio_test::block_on(invoker.invoke(Arc::new(RequestContext::new()), "Index"))
            .unwrap_err();

        assert!(err.is_unhandled());
        assert_eq!(err.to_string(), "cannot bind 'id'");
        assert!(events.is_empty());
    }

    #[test]
    fn test_unknown_action_binds_nothing() {
        let mut binder = MockParameterBinder::new();
        binder.expect_bind().times(0);
        let invoker = ActionInvoker::new(controller()).with_binder(Arc::new(binder));

        let handled =
            tokio_test::block_on(invoker.invoke(Arc::new(RequestContext::new()), "About"))
                .unwrap();

        assert!(!handled);
    }

    #[test]
    fn test_default_collaborators_render_response() {
        let events = Arc::new(CollectingEventSink::new());
        let invoker = ActionInvoker::new(controller()).with_event_sink(Arc::clone(&events) as _);
        let request = Arc::new(RequestContext::new());

        let handled =
            tokio_test::block_on(invoker.invoke(Arc::clone(&request), "INDEX")).unwrap();

        assert!(handled);
        assert_eq!(request.response_snapshot().body, "home");
        let completed = events.events_of_type("invocation.completed");
        assert_eq!(completed.len(), 1);
        assert_eq!(
            completed[0].1.as_ref().unwrap()["action"],
            serde_json::json!("Index")
        );
    }
}
