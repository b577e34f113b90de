//! The filter pipeline state machine.
//!
//! One [`FilterPipeline`] drives one request. [`FilterPipeline::next`] is the
//! single transition function: it advances the current [`Frame`] through as
//! many states as it can without waiting, and hands back a future whenever a
//! filter, the action or the result executor has to be awaited. Exception
//! filters and continuations run the rest of the pipeline as a nested run
//! with a fresh frame and a narrower [`Scope`]; the scope decides whether a
//! stage's `...End` state finishes the run, rethrows, or moves on.

use super::continuation::{ActionNext, ResultNext};
use super::executor::ResultExecutor;
use super::rethrow::rethrow;
use super::state::{Frame, Scope, State, Step};
use super::validation::RequestValidator;
use crate::context::{
    ActionExecutedContext, ActionExecutingContext, AuthorizationContext, ExceptionContext,
    FilterContext, ResultExecutedContext, ResultExecutingContext,
};
use crate::core::{
    create_action_result, ActionInvocation, ActionResultRef, EmptyResult, Parameters, Stage,
};
use crate::errors::{InvalidFilterUsageError, InvokeError};
use crate::events::EventSink;
use crate::filters::{
    ActionStage, AuthorizationStage, CursorItem, ExceptionStage, FilterChain, FilterCursor,
    ResultStage,
};
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::{debug, trace};

pub(crate) struct FilterPipeline {
    base: FilterContext,
    parameters: Parameters,
    cursor: FilterCursor,
    validator: Option<Arc<dyn RequestValidator>>,
    result_executor: Arc<dyn ResultExecutor>,
    events: Option<Arc<dyn EventSink>>,
    trace_transitions: bool,

    authorization: Option<AuthorizationContext>,
    exception: Option<ExceptionContext>,
    action_executing: Option<ActionExecutingContext>,
    action_executed: Option<ActionExecutedContext>,
    result_executing: Option<ResultExecutingContext>,
    result_executed: Option<ResultExecutedContext>,
    result: Option<ActionResultRef>,
    contract_violation: Option<InvalidFilterUsageError>,
}

impl FilterPipeline {
    pub(crate) fn new(
        base: FilterContext,
        parameters: Parameters,
        chain: Arc<FilterChain>,
        result_executor: Arc<dyn ResultExecutor>,
    ) -> Self {
        Self {
            base,
            parameters,
            cursor: FilterCursor::new(chain),
            validator: None,
            result_executor,
            events: None,
            trace_transitions: false,
            authorization: None,
            exception: None,
            action_executing: None,
            action_executed: None,
            result_executing: None,
            result_executed: None,
            result: None,
            contract_violation: None,
        }
    }

    pub(crate) fn with_validator(mut self, validator: Option<Arc<dyn RequestValidator>>) -> Self {
        self.validator = validator;
        self
    }

    pub(crate) fn with_events(mut self, events: Option<Arc<dyn EventSink>>) -> Self {
        self.events = events;
        self
    }

    pub(crate) fn with_trace_transitions(mut self, enabled: bool) -> Self {
        self.trace_transitions = enabled;
        self
    }

    /// The result that was, or is about to be, dispatched.
    pub(crate) fn final_result(&self) -> Option<&ActionResultRef> {
        self.result.as_ref()
    }

    /// Runs the whole pipeline for the request.
    pub(crate) async fn invoke(&mut self) -> Result<(), InvokeError> {
        self.run(State::InvokeBegin, Scope::Invoker).await?;
        match self.contract_violation.take() {
            Some(violation) => Err(violation.into()),
            None => Ok(()),
        }
    }

    /// Drives a fresh frame until its scope completes.
    fn run(&mut self, state: State, scope: Scope) -> BoxFuture<'_, Result<(), InvokeError>> {
        Box::pin(async move {
            let mut frame = Frame::new(state, scope);
            while !frame.completed {
                if let Step::Await(task) = self.next(&mut frame)? {
                    task.await?;
                }
            }
            Ok(())
        })
    }

    #[allow(clippy::too_many_lines)]
    fn next<'a>(&'a mut self, frame: &mut Frame) -> Result<Step<'a>, InvokeError> {
        loop {
            let state = frame.take_state();
            if self.trace_transitions {
                trace!(state = state.name(), scope = ?frame.scope, "pipeline transition");
            }

            frame.state = match state {
                State::InvokeBegin => State::AuthorizationBegin,

                State::AuthorizationBegin => {
                    self.cursor.reset();
                    State::AuthorizationNext
                }

                State::AuthorizationNext => match self.cursor.next::<AuthorizationStage>() {
                    CursorItem::Async(filter) => {
                        self.authorization_context();
                        State::AuthorizationAsyncBegin(filter)
                    }
                    CursorItem::Sync(filter) => {
                        self.authorization_context();
                        State::AuthorizationSync(filter)
                    }
                    CursorItem::Exhausted => State::AuthorizationEnd,
                },

                State::AuthorizationAsyncBegin(filter) => {
                    frame.state = State::AuthorizationAsyncEnd(Arc::clone(&filter.name));
                    return Ok(Step::Await(Box::pin(async move {
                        let outcome = filter
                            .filter
                            .on_authorization_async(self.authorization_context())
                            .await;
                        self.settle(outcome)
                    })));
                }

                State::AuthorizationAsyncEnd(name) => {
                    if self.authorization_short_circuited() {
                        State::AuthorizationShortCircuit(name)
                    } else {
                        State::AuthorizationNext
                    }
                }

                State::AuthorizationSync(filter) => {
                    filter
                        .filter
                        .on_authorization(self.authorization_context())
                        .map_err(InvokeError::from_filter)?;
                    if self.authorization_short_circuited() {
                        State::AuthorizationShortCircuit(filter.name)
                    } else {
                        State::AuthorizationNext
                    }
                }

                State::AuthorizationShortCircuit(name) => {
                    // The authorization result is the last thing that runs.
                    let result = self
                        .authorization
                        .as_ref()
                        .and_then(|ctx| ctx.result.clone())
                        .ok_or_else(|| {
                            InvokeError::internal("authorization short-circuit without a result")
                        })?;
                    self.note_short_circuit(Stage::Authorization, &name);
                    self.result = Some(Arc::clone(&result));
                    frame.state = State::InvokeEnd;
                    return Ok(Step::Await(self.execute_result(result)));
                }

                State::AuthorizationEnd => State::ExceptionBegin,

                State::ExceptionBegin => {
                    self.cursor.reset();
                    State::ExceptionNext
                }

                State::ExceptionNext => match self.cursor.next::<ExceptionStage>() {
                    CursorItem::Async(filter) => State::ExceptionAsyncBegin(filter),
                    CursorItem::Sync(filter) => State::ExceptionSyncBegin(filter),
                    // Every exception filter is on the stack; run what they wrap.
                    CursorItem::Exhausted if frame.scope == Scope::Exception => {
                        State::ExceptionInside
                    }
                    CursorItem::Exhausted => State::ActionBegin,
                },

                State::ExceptionAsyncBegin(filter) => {
                    frame.state = State::ExceptionAsyncResume(filter);
                    return Ok(Step::Await(self.invoke_next_exception_filter()));
                }

                State::ExceptionAsyncResume(filter) => {
                    if self.exception_unhandled() {
                        frame.state = State::ExceptionAsyncEnd(Arc::clone(&filter.name));
                        return Ok(Step::Await(Box::pin(async move {
                            let outcome = match self.exception.as_mut() {
                                Some(ctx) => filter.filter.on_exception_async(ctx).await,
                                None => Ok(()),
                            };
                            self.settle(outcome)
                        })));
                    }
                    State::ExceptionEnd
                }

                State::ExceptionAsyncEnd(name) => {
                    self.note_exception_outcome(&name);
                    State::ExceptionEnd
                }

                State::ExceptionSyncBegin(filter) => {
                    frame.state = State::ExceptionSyncEnd(filter);
                    return Ok(Step::Await(self.invoke_next_exception_filter()));
                }

                State::ExceptionSyncEnd(filter) => {
                    if let Some(ctx) = self.exception.as_mut().filter(|ctx| ctx.is_unhandled()) {
                        filter
                            .filter
                            .on_exception(ctx)
                            .map_err(InvokeError::from_filter)?;
                        self.note_exception_outcome(&filter.name);
                    }
                    State::ExceptionEnd
                }

                State::ExceptionInside => State::ActionBegin,

                State::ExceptionHandled => {
                    // Dispatched directly; result filters do not see it.
                    let result = self
                        .exception
                        .as_mut()
                        .map_or_else(EmptyResult::shared, |ctx| {
                            Arc::clone(ctx.result.get_or_insert_with(EmptyResult::shared))
                        });
                    self.result = Some(Arc::clone(&result));
                    frame.state = State::InvokeEnd;
                    return Ok(Step::Await(self.execute_result(result)));
                }

                State::ExceptionEnd => {
                    if frame.scope == Scope::Exception {
                        frame.completed = true;
                        return Ok(Step::Done);
                    }

                    match self.exception.as_mut() {
                        Some(ctx) if ctx.is_unhandled() => {
                            rethrow(Some(ctx))?;
                            return Err(InvokeError::internal(
                                "unhandled exception was not rethrown",
                            ));
                        }
                        Some(_) => State::ExceptionHandled,
                        None => State::ResultBegin,
                    }
                }

                State::ActionBegin => {
                    if let Some(validator) = &self.validator {
                        let request = self.base.request();
                        if !request.is_child_action() {
                            validator
                                .validate(request)
                                .map_err(InvokeError::from_filter)?;
                        }
                    }
                    self.cursor.reset();
                    State::ActionNext
                }

                State::ActionNext => match self.cursor.next::<ActionStage>() {
                    CursorItem::Async(filter) => {
                        self.action_executing_context();
                        State::ActionAsyncBegin(filter)
                    }
                    CursorItem::Sync(filter) => {
                        self.action_executing_context();
                        State::ActionSyncBegin(filter)
                    }
                    CursorItem::Exhausted => State::ActionInside,
                },

                State::ActionAsyncBegin(filter) => {
                    frame.state = State::ActionAsyncEnd(Arc::clone(&filter.name));
                    return Ok(Step::Await(Box::pin(async move {
                        let next = ActionNext::new(&mut *self, Arc::clone(&filter.name));
                        let outcome = filter.filter.on_action_execution(next).await;
                        self.settle(outcome)
                    })));
                }

                State::ActionAsyncEnd(name) => {
                    if self.action_executed.is_none() {
                        // The filter never called its continuation.
                        let result = self
                            .action_executing
                            .as_ref()
                            .and_then(|ctx| ctx.result.clone());
                        self.note_short_circuit(Stage::Action, &name);
                        self.action_executed =
                            Some(ActionExecutedContext::canceled(self.base.clone(), result));
                    }
                    State::ActionEnd
                }

                State::ActionSyncBegin(filter) => {
                    filter
                        .filter
                        .on_action_executing(self.action_executing_context())
                        .map_err(InvokeError::from_filter)?;

                    let short_circuit = self
                        .action_executing
                        .as_ref()
                        .and_then(|ctx| ctx.result.clone());
                    if let Some(result) = short_circuit {
                        self.note_short_circuit(Stage::Action, &filter.name);
                        self.action_executed = Some(ActionExecutedContext::canceled(
                            self.base.clone(),
                            Some(result),
                        ));
                        State::ActionEnd
                    } else {
                        frame.state = State::ActionSyncEnd(filter);
                        return Ok(Step::Await(self.invoke_next_action_filter()));
                    }
                }

                State::ActionSyncEnd(filter) => {
                    let ctx = self.action_executed.as_mut().ok_or_else(|| {
                        InvokeError::internal("action continuation finished without a context")
                    })?;
                    filter
                        .filter
                        .on_action_executed(ctx)
                        .map_err(InvokeError::from_filter)?;
                    State::ActionEnd
                }

                State::ActionInside => {
                    let parameters = self
                        .action_executing
                        .as_ref()
                        .map_or(&self.parameters, |ctx| &ctx.parameters);
                    let request = self.base.shared_request();
                    match self.base.action().invoke(&request, parameters) {
                        ActionInvocation::Completed(value) => {
                            let value = value.map_err(InvokeError::from_filter)?;
                            self.result = Some(create_action_result(value));
                            State::ActionEnd
                        }
                        ActionInvocation::Pending(pending) => {
                            frame.state = State::ActionEnd;
                            return Ok(Step::Await(Box::pin(async move {
                                let value = pending.await.map_err(InvokeError::from_filter)?;
                                self.result = Some(create_action_result(value));
                                Ok(())
                            })));
                        }
                    }
                }

                State::ActionEnd => {
                    if frame.scope == Scope::Action {
                        if self.action_executed.is_none() {
                            self.action_executed = Some(ActionExecutedContext::completed(
                                self.base.clone(),
                                self.result.clone(),
                            ));
                        }
                        frame.completed = true;
                        return Ok(Step::Done);
                    }

                    rethrow(self.action_executed.as_mut())?;
                    if let Some(executed) = &self.action_executed {
                        self.result = executed.result.clone();
                    }

                    if frame.scope == Scope::Exception {
                        // Let the exception filters unwind before the result runs.
                        frame.completed = true;
                        return Ok(Step::Done);
                    }
                    State::ResultBegin
                }

                State::ResultBegin => {
                    self.cursor.reset();
                    State::ResultNext
                }

                State::ResultNext => match self.cursor.next::<ResultStage>() {
                    CursorItem::Async(filter) => {
                        self.result_executing_context();
                        State::ResultAsyncBegin(filter)
                    }
                    CursorItem::Sync(filter) => {
                        self.result_executing_context();
                        State::ResultSyncBegin(filter)
                    }
                    CursorItem::Exhausted => State::ResultInside,
                },

                State::ResultAsyncBegin(filter) => {
                    frame.state = State::ResultAsyncEnd(Arc::clone(&filter.name));
                    return Ok(Step::Await(Box::pin(async move {
                        let next = ResultNext::new(&mut *self, Arc::clone(&filter.name));
                        let outcome = filter.filter.on_result_execution(next).await;
                        self.settle(outcome)
                    })));
                }

                State::ResultAsyncEnd(name) => {
                    let canceled = self.result_executing.as_ref().is_some_and(|ctx| ctx.cancel);
                    if self.result_executed.is_none() || canceled {
                        let result = self
                            .result_executing
                            .as_ref()
                            .and_then(|ctx| ctx.result.clone());
                        self.note_short_circuit(Stage::Result, &name);
                        self.result_executed =
                            Some(ResultExecutedContext::canceled(self.base.clone(), result));
                    }
                    State::ResultEnd
                }

                State::ResultSyncBegin(filter) => {
                    let ctx = self.result_executing_context();
                    filter
                        .filter
                        .on_result_executing(ctx)
                        .map_err(InvokeError::from_filter)?;

                    if ctx.cancel {
                        let result = ctx.result.clone();
                        self.note_short_circuit(Stage::Result, &filter.name);
                        self.result_executed =
                            Some(ResultExecutedContext::canceled(self.base.clone(), result));
                        State::ResultEnd
                    } else {
                        frame.state = State::ResultSyncEnd(filter);
                        return Ok(Step::Await(self.invoke_next_result_filter()));
                    }
                }

                State::ResultSyncEnd(filter) => {
                    let ctx = self.result_executed.as_mut().ok_or_else(|| {
                        InvokeError::internal("result continuation finished without a context")
                    })?;
                    filter
                        .filter
                        .on_result_executed(ctx)
                        .map_err(InvokeError::from_filter)?;
                    State::ResultEnd
                }

                State::ResultInside => {
                    // Result filters may have replaced the result.
                    if let Some(executing) = &self.result_executing {
                        self.result = executing.result.clone();
                    }
                    let result = Arc::clone(self.result.get_or_insert_with(EmptyResult::shared));
                    frame.state = State::ResultEnd;
                    return Ok(Step::Await(self.execute_result(result)));
                }

                State::ResultEnd => {
                    if frame.scope == Scope::Result {
                        if self.result_executed.is_none() {
                            self.result_executed = Some(ResultExecutedContext::completed(
                                self.base.clone(),
                                self.result.clone(),
                            ));
                        }
                        frame.completed = true;
                        return Ok(Step::Done);
                    }

                    rethrow(self.result_executed.as_mut())?;
                    State::InvokeEnd
                }

                State::InvokeEnd => {
                    frame.completed = true;
                    return Ok(Step::Done);
                }
            };
        }
    }

    /// Runs the filters inside an exception filter. An unhandled failure
    /// becomes the exception context the filter then observes.
    fn invoke_next_exception_filter(&mut self) -> BoxFuture<'_, Result<(), InvokeError>> {
        Box::pin(async move {
            match self.run(State::ExceptionNext, Scope::Exception).await {
                Err(InvokeError::Unhandled(error)) => {
                    debug!(
                        request_id = %self.base.request().request_id(),
                        error = %error,
                        "Exception captured for exception filters"
                    );
                    self.emit(
                        "exception.captured",
                        serde_json::json!({ "stage": Stage::Exception, "error": error.to_string() }),
                    );
                    self.exception = Some(ExceptionContext::new(self.base.clone(), error));
                    Ok(())
                }
                other => other,
            }
        })
    }

    /// Runs the rest of the action stage. An unhandled failure is recorded
    /// on the executed context so enclosing action filters observe it.
    pub(super) fn invoke_next_action_filter(&mut self) -> BoxFuture<'_, Result<(), InvokeError>> {
        Box::pin(async move {
            match self.run(State::ActionNext, Scope::Action).await {
                Err(InvokeError::Unhandled(error)) => {
                    debug!(
                        request_id = %self.base.request().request_id(),
                        error = %error,
                        "Exception captured for action filters"
                    );
                    self.emit(
                        "exception.captured",
                        serde_json::json!({ "stage": Stage::Action, "error": error.to_string() }),
                    );
                    self.action_executed =
                        Some(ActionExecutedContext::failed(self.base.clone(), error));
                    Ok(())
                }
                other => other,
            }
        })
    }

    /// Runs the rest of the result stage, recording an unhandled failure on
    /// the executed context.
    pub(super) fn invoke_next_result_filter(&mut self) -> BoxFuture<'_, Result<(), InvokeError>> {
        Box::pin(async move {
            match self.run(State::ResultNext, Scope::Result).await {
                Err(InvokeError::Unhandled(error)) => {
                    debug!(
                        request_id = %self.base.request().request_id(),
                        error = %error,
                        "Exception captured for result filters"
                    );
                    self.emit(
                        "exception.captured",
                        serde_json::json!({ "stage": Stage::Result, "error": error.to_string() }),
                    );
                    self.result_executed = Some(ResultExecutedContext::failed(
                        self.base.clone(),
                        self.result.clone(),
                        error,
                    ));
                    Ok(())
                }
                other => other,
            }
        })
    }

    fn execute_result(&self, result: ActionResultRef) -> BoxFuture<'static, Result<(), InvokeError>> {
        let executor = Arc::clone(&self.result_executor);
        let request = self.base.shared_request();
        let events = self.events.clone();
        Box::pin(async move {
            executor
                .execute(&request, &result)
                .await
                .map_err(InvokeError::from_filter)?;
            debug!(request_id = %request.request_id(), kind = result.kind(), "Result executed");
            if let Some(events) = events {
                events.try_emit(
                    "result.executed",
                    Some(serde_json::json!({
                        "request_id": request.request_id(),
                        "kind": result.kind(),
                    })),
                );
            }
            Ok(())
        })
    }

    /// Folds an async filter's outcome into the run. A recorded contract
    /// violation wins even if the filter swallowed the error.
    fn settle(&mut self, outcome: anyhow::Result<()>) -> Result<(), InvokeError> {
        if let Some(violation) = &self.contract_violation {
            return Err(violation.clone().into());
        }
        outcome.map_err(InvokeError::from_filter)
    }

    pub(super) fn record_violation(&mut self, violation: InvalidFilterUsageError) {
        debug!(
            request_id = %self.base.request().request_id(),
            filter = %violation.filter,
            stage = %violation.stage,
            "Filter short-circuited and called its continuation"
        );
        self.contract_violation.get_or_insert(violation);
    }

    fn authorization_context(&mut self) -> &mut AuthorizationContext {
        let base = &self.base;
        self.authorization
            .get_or_insert_with(|| AuthorizationContext::new(base.clone()))
    }

    fn authorization_short_circuited(&self) -> bool {
        self.authorization
            .as_ref()
            .is_some_and(AuthorizationContext::is_short_circuited)
    }

    fn exception_unhandled(&self) -> bool {
        self.exception
            .as_ref()
            .is_some_and(ExceptionContext::is_unhandled)
    }

    pub(super) fn action_executing_context(&mut self) -> &mut ActionExecutingContext {
        let base = &self.base;
        let parameters = &self.parameters;
        self.action_executing
            .get_or_insert_with(|| ActionExecutingContext::new(base.clone(), parameters.clone()))
    }

    pub(super) fn action_executed_context(&mut self) -> Option<&mut ActionExecutedContext> {
        self.action_executed.as_mut()
    }

    pub(super) fn result_executing_context(&mut self) -> &mut ResultExecutingContext {
        let base = &self.base;
        let result = &self.result;
        self.result_executing
            .get_or_insert_with(|| ResultExecutingContext::new(base.clone(), result.clone()))
    }

    pub(super) fn result_executed_context(&mut self) -> Option<&mut ResultExecutedContext> {
        self.result_executed.as_mut()
    }

    fn note_short_circuit(&self, stage: Stage, filter: &str) {
        debug!(
            request_id = %self.base.request().request_id(),
            stage = %stage,
            filter = %filter,
            "Filter short-circuited"
        );
        self.emit(
            "filter.short_circuited",
            serde_json::json!({ "stage": stage, "filter": filter }),
        );
    }

    fn note_exception_outcome(&self, filter: &str) {
        if self.exception_unhandled() {
            return;
        }
        debug!(
            request_id = %self.base.request().request_id(),
            filter = %filter,
            "Exception handled"
        );
        self.emit("exception.handled", serde_json::json!({ "filter": filter }));
    }

    fn emit(&self, event_type: &str, mut data: serde_json::Value) {
        let Some(events) = &self.events else {
            return;
        };
        if let Some(fields) = data.as_object_mut() {
            fields.insert(
                "request_id".to_string(),
                serde_json::json!(self.base.request().request_id()),
            );
            fields.insert(
                "action".to_string(),
                serde_json::json!(self.base.action_name()),
            );
        }
        events.try_emit(event_type, Some(data));
    }
}
