//! Comprehensive tests for context module.

#[cfg(test)]
mod tests {
    use crate::context::{
        ActionExecutedContext, ActionExecutingContext, AuthorizationContext, ExceptionContext,
        FilterContext, RequestContext, RequestItems, ResultExecutedContext,
        ResultExecutingContext, RouteData,
    };
    use crate::core::{EmptyResult, Parameters, ReturnValue, SyncAction};
    use std::sync::Arc;

    fn base() -> FilterContext {
        let request = Arc::new(
            RequestContext::new()
                .with_route(RouteData::new().with_value("id", "5"))
                .with_query("q", "rust"),
        );
        let action = Arc::new(SyncAction::new("Index", |_, _| Ok(ReturnValue::Unit)));
        FilterContext::new(request, action)
    }

    #[test]
    fn test_request_context_defaults() {
        let request = RequestContext::new();
        assert!(!request.request_id().is_nil());
        assert!(!request.is_child_action());
        assert!(!request.route().has_direct_route_match());
        assert_eq!(request.response().status, 200);
    }

    #[test]
    fn test_request_context_builder() {
        let request = RequestContext::new()
            .with_route(RouteData::new().with_direct_route("Show"))
            .with_form("name", "ferris")
            .as_child_action();

        assert!(request.is_child_action());
        assert!(request.route().has_direct_route_match());
        assert_eq!(request.input().form.get("name").map(String::as_str), Some("ferris"));
    }

    #[test]
    fn test_request_id_override() {
        let id = uuid::Uuid::new_v4();
        let request = RequestContext::new().with_request_id(id);
        assert_eq!(request.request_id(), id);
    }

    #[test]
    fn test_response_snapshot() {
        let request = RequestContext::new();
        request.response().body.push_str("partial");

        let snapshot = request.response_snapshot();
        assert_eq!(snapshot.body, "partial");
    }

    #[test]
    fn test_request_items() {
        let items = RequestItems::new();
        assert!(items.is_empty());

        assert!(items.insert("user", serde_json::json!("ferris")).is_none());
        let previous = items.insert("user", serde_json::json!("crab"));
        assert_eq!(previous, Some(serde_json::json!("ferris")));

        assert!(items.contains_key("user"));
        assert_eq!(items.len(), 1);
        assert_eq!(items.remove("user"), Some(serde_json::json!("crab")));
        assert!(items.to_dict().is_empty());
    }

    #[test]
    fn test_stage_contexts_deref_to_base() {
        let ctx = AuthorizationContext::new(base());
        assert_eq!(ctx.action_name(), "Index");
        assert_eq!(ctx.request().route().get("id"), Some("5"));
        assert!(!ctx.is_short_circuited());
    }

    #[test]
    fn test_exception_context_handling_states() {
        let mut ctx = ExceptionContext::new(base(), anyhow::anyhow!("boom"));
        assert!(ctx.is_unhandled());

        ctx.exception_handled = true;
        assert!(!ctx.is_unhandled());

        let mut ctx = ExceptionContext::new(base(), anyhow::anyhow!("boom"));
        ctx.exception = None;
        assert!(!ctx.is_unhandled());

        let mut ctx = ExceptionContext::new(base(), anyhow::anyhow!("boom"));
        ctx.handle_with(EmptyResult::shared());
        assert!(!ctx.is_unhandled());
        assert!(ctx.exception_handled);
    }

    #[test]
    fn test_action_contexts() {
        let mut params = Parameters::new();
        params.insert("id".to_string(), serde_json::json!(5));
        let executing = ActionExecutingContext::new(base(), params);
        assert!(executing.result.is_none());
        assert_eq!(executing.parameters.len(), 1);

        let canceled = ActionExecutedContext::canceled(base(), Some(EmptyResult::shared()));
        assert!(canceled.canceled);
        assert!(canceled.exception.is_none());

        let failed = ActionExecutedContext::failed(base(), anyhow::anyhow!("nope"));
        assert!(!failed.canceled);
        assert!(failed.result.is_none());
        assert_eq!(failed.exception.as_ref().map(ToString::to_string).as_deref(), Some("nope"));
    }

    #[test]
    fn test_result_contexts() {
        let executing = ResultExecutingContext::new(base(), None);
        assert!(!executing.cancel);

        let executed = ResultExecutedContext::completed(base(), Some(EmptyResult::shared()));
        assert!(!executed.canceled);
        assert!(executed.result.is_some());

        let failed =
            ResultExecutedContext::failed(base(), None, anyhow::anyhow!("render failed"));
        assert!(failed.exception.is_some());
        assert!(!failed.exception_handled);
    }
}
