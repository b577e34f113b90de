//! Action descriptors and function-backed actions.

use super::result::ReturnValue;
use crate::context::RequestContext;
use crate::filters::FilterRegistration;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;

/// Bound action arguments, keyed by parameter name.
pub type Parameters = HashMap<String, serde_json::Value>;

/// How an action delivered its return value.
pub enum ActionInvocation {
    /// The action ran to completion on the calling thread.
    Completed(anyhow::Result<ReturnValue>),
    /// The action completes later; the pipeline awaits the future.
    Pending(BoxFuture<'static, anyhow::Result<ReturnValue>>),
}

impl Debug for ActionInvocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed(result) => f.debug_tuple("Completed").field(result).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// A resolved action the pipeline can invoke.
pub trait ActionDescriptor: Send + Sync + Debug {
    /// The action's name, as matched by the controller.
    fn action_name(&self) -> &str;

    /// Names of the parameters the binder should supply.
    fn parameter_names(&self) -> &[String] {
        &[]
    }

    /// Filters declared on the action itself.
    fn filters(&self) -> Vec<FilterRegistration> {
        Vec::new()
    }

    /// Invokes the action with the bound parameters.
    fn invoke(&self, request: &Arc<RequestContext>, parameters: &Parameters) -> ActionInvocation;
}

/// An action backed by a synchronous closure.
pub struct SyncAction<F>
where
    F: Fn(&RequestContext, &Parameters) -> anyhow::Result<ReturnValue> + Send + Sync,
{
    name: String,
    parameters: Vec<String>,
    filters: Vec<FilterRegistration>,
    func: F,
}

impl<F> SyncAction<F>
where
    F: Fn(&RequestContext, &Parameters) -> anyhow::Result<ReturnValue> + Send + Sync,
{
    /// Creates a new synchronous action.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            filters: Vec::new(),
            func,
        }
    }

    /// Declares a parameter to bind.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>) -> Self {
        self.parameters.push(name.into());
        self
    }

    /// Attaches an action-level filter.
    #[must_use]
    pub fn with_filter(mut self, registration: FilterRegistration) -> Self {
        self.filters.push(registration);
        self
    }
}

impl<F> Debug for SyncAction<F>
where
    F: Fn(&RequestContext, &Parameters) -> anyhow::Result<ReturnValue> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncAction")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

impl<F> ActionDescriptor for SyncAction<F>
where
    F: Fn(&RequestContext, &Parameters) -> anyhow::Result<ReturnValue> + Send + Sync,
{
    fn action_name(&self) -> &str {
        &self.name
    }

    fn parameter_names(&self) -> &[String] {
        &self.parameters
    }

    fn filters(&self) -> Vec<FilterRegistration> {
        self.filters.clone()
    }

    fn invoke(&self, request: &Arc<RequestContext>, parameters: &Parameters) -> ActionInvocation {
        ActionInvocation::Completed((self.func)(request, parameters))
    }
}

/// An action backed by an async closure.
pub struct AsyncAction<F, Fut>
where
    F: Fn(Arc<RequestContext>, Parameters) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<ReturnValue>> + Send + 'static,
{
    name: String,
    parameters: Vec<String>,
    filters: Vec<FilterRegistration>,
    func: F,
}

impl<F, Fut> AsyncAction<F, Fut>
where
    F: Fn(Arc<RequestContext>, Parameters) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<ReturnValue>> + Send + 'static,
{
    /// Creates a new async action.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            filters: Vec::new(),
            func,
        }
    }

    /// Declares a parameter to bind.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>) -> Self {
        self.parameters.push(name.into());
        self
    }

    /// Attaches an action-level filter.
    #[must_use]
    pub fn with_filter(mut self, registration: FilterRegistration) -> Self {
        self.filters.push(registration);
        self
    }
}

impl<F, Fut> Debug for AsyncAction<F, Fut>
where
    F: Fn(Arc<RequestContext>, Parameters) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<ReturnValue>> + Send + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncAction")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

impl<F, Fut> ActionDescriptor for AsyncAction<F, Fut>
where
    F: Fn(Arc<RequestContext>, Parameters) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<ReturnValue>> + Send + 'static,
{
    fn action_name(&self) -> &str {
        &self.name
    }

    fn parameter_names(&self) -> &[String] {
        &self.parameters
    }

    fn filters(&self) -> Vec<FilterRegistration> {
        self.filters.clone()
    }

    fn invoke(&self, request: &Arc<RequestContext>, parameters: &Parameters) -> ActionInvocation {
        ActionInvocation::Pending(Box::pin((self.func)(
            Arc::clone(request),
            parameters.clone(),
        )))
    }
}
