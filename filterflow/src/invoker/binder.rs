//! Parameter binding.

use crate::context::RequestContext;
use crate::core::{ActionDescriptor, Parameters};

/// Produces the arguments an action is invoked with.
#[cfg_attr(test, mockall::automock)]
pub trait ParameterBinder: Send + Sync {
    /// Binds every parameter the action declares.
    fn bind(
        &self,
        request: &RequestContext,
        action: &dyn ActionDescriptor,
    ) -> anyhow::Result<Parameters>;
}

/// Looks each parameter up in route values, then the query string, then
/// form values. A parameter found nowhere is bound to null.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultParameterBinder;

impl ParameterBinder for DefaultParameterBinder {
    fn bind(
        &self,
        request: &RequestContext,
        action: &dyn ActionDescriptor,
    ) -> anyhow::Result<Parameters> {
        let input = request.input();
        let parameters = action
            .parameter_names()
            .iter()
            .map(|name| {
                let value = request
                    .route()
                    .get(name)
                    .or_else(|| input.query.get(name).map(String::as_str))
                    .or_else(|| input.form.get(name).map(String::as_str))
                    .map_or(serde_json::Value::Null, |value| {
                        serde_json::Value::String(value.to_string())
                    });
                (name.clone(), value)
            })
            .collect();
        Ok(parameters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RouteData;
    use crate::core::{ReturnValue, SyncAction};

    #[test]
    fn test_bind_precedence() {
        let action = SyncAction::new("Show", |_, _| Ok(ReturnValue::Unit))
            .with_parameter("id")
            .with_parameter("page")
            .with_parameter("title")
            .with_parameter("missing");

        let request = RequestContext::new()
            .with_route(RouteData::new().with_value("id", "route"))
            .with_query("id", "query")
            .with_query("page", "3")
            .with_form("page", "form")
            .with_form("title", "hello");

        let params = DefaultParameterBinder.bind(&request, &action).unwrap();
        assert_eq!(params["id"], serde_json::json!("route"));
        assert_eq!(params["page"], serde_json::json!("3"));
        assert_eq!(params["title"], serde_json::json!("hello"));
        assert_eq!(params["missing"], serde_json::Value::Null);
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn test_bind_no_parameters() {
        let action = SyncAction::new("Index", |_, _| Ok(ReturnValue::Unit));
        let params = DefaultParameterBinder
            .bind(&RequestContext::new(), &action)
            .unwrap();
        assert!(params.is_empty());
    }
}
