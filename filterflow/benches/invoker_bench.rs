//! Benchmarks for action invocation.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use filterflow::config::InvokerConfig;
use filterflow::context::{AuthorizationContext, RequestContext};
use filterflow::core::{ReturnValue, StaticController, SyncAction};
use filterflow::events::NoOpEventSink;
use filterflow::filters::{
    ActionFilter, AsyncActionFilter, AsyncResultFilter, AuthorizationFilter, Filter,
    FilterRegistration, GlobalFilterCollection, ResultFilter,
};
use filterflow::invoker::{ActionInvoker, ActionNext, ResultNext};
use std::sync::Arc;

/// Passes through every stage without touching the contexts.
struct PassThrough {
    asynchronous: bool,
}

impl Filter for PassThrough {
    fn name(&self) -> &str {
        "pass-through"
    }

    fn as_authorization_filter(self: Arc<Self>) -> Option<Arc<dyn AuthorizationFilter>> {
        Some(self)
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

impl AuthorizationFilter for PassThrough {
    fn on_authorization(&self, _ctx: &mut AuthorizationContext) -> anyhow::Result<()> {
        Ok(())
    }
}

impl ActionFilter for PassThrough {}

impl ResultFilter for PassThrough {}

#[async_trait::async_trait]
impl AsyncActionFilter for PassThrough {
    async fn on_action_execution(&self, next: ActionNext<'_>) -> anyhow::Result<()> {
        next.run().await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl AsyncResultFilter for PassThrough {
    async fn on_result_execution(&self, next: ResultNext<'_>) -> anyhow::Result<()> {
        next.run().await?;
        Ok(())
    }
}

fn invoker(filters: usize, asynchronous: bool) -> ActionInvoker {
    let mut globals = GlobalFilterCollection::new();
    for _ in 0..filters {
        globals.add(FilterRegistration::new(PassThrough { asynchronous }));
    }

    let controller = StaticController::new("Home")
        .with_action(SyncAction::new("Index", |_, _| Ok(ReturnValue::from("ok"))));

    ActionInvoker::new(Arc::new(controller))
        .with_global_filters(Arc::new(globals))
        .with_event_sink(Arc::new(NoOpEventSink))
        .with_config(InvokerConfig::new().with_validate_request(false))
}

fn invoke_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime");

    for (name, filters, asynchronous) in [
        ("invoke_no_filters", 0, false),
        ("invoke_sync_filters_x4", 4, false),
        ("invoke_async_filters_x4", 4, true),
    ] {
        let invoker = invoker(filters, asynchronous);
        c.bench_function(name, |b| {
            b.iter(|| {
                let request = Arc::new(RequestContext::new());
                let handled = runtime
                    .block_on(invoker.invoke(request, "Index"))
                    .expect("invocation");
                black_box(handled)
            });
        });
    }
}

criterion_group!(benches, invoke_benchmark);
criterion_main!(benches);
