//! Distributed tracing stage.
//!
//! Wraps each call in a span through the [`TraceCorrelator`] collaborator:
//! extract the parent span context from the inbound metadata, start a child
//! span tagged with component/kind/method, finish it on return, and mark it
//! errored (with the stable error code) when the call fails. On the client
//! side the child context is injected into the outbound metadata so the
//! remote end can continue the trace.

use crate::interceptor::{BoxFuture, Interceptor, Next};
use keryx_core::{CallContext, KeryxResult};
use keryx_telemetry::{Span as _, TraceCorrelator};
use std::sync::Arc;

/// Which side of the call the span represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpanSide {
    Server,
    Client,
}

impl SpanSide {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Client => "client",
        }
    }
}

/// Interceptor that spans each call through a [`TraceCorrelator`].
pub struct TracingInterceptor {
    correlator: Arc<dyn TraceCorrelator>,
    side: SpanSide,
}

impl TracingInterceptor {
    /// Creates the server-side tracing stage.
    #[must_use]
    pub fn server(correlator: Arc<dyn TraceCorrelator>) -> Self {
        Self {
            correlator,
            side: SpanSide::Server,
        }
    }

    /// Creates the client-side tracing stage.
    #[must_use]
    pub fn client(correlator: Arc<dyn TraceCorrelator>) -> Self {
        Self {
            correlator,
            side: SpanSide::Client,
        }
    }
}

impl<Req, Res> Interceptor<Req, Res> for TracingInterceptor
where
    Req: Send + 'static,
    Res: Send + 'static,
{
    fn name(&self) -> &'static str {
        "tracing"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut CallContext,
        req: Req,
        next: Next<'a, Req, Res>,
    ) -> BoxFuture<'a, KeryxResult<Res>> {
        Box::pin(async move {
            let parent = self.correlator.extract(ctx.metadata());
            let mut span = self
                .correlator
                .start_span(ctx.method_name(), parent.as_ref());
            span.set_tag("component", "keryx");
            span.set_tag("kind", self.side.as_str());
            span.set_tag("method", ctx.method_name());

            if self.side == SpanSide::Client {
                let span_ctx = span.context().clone();
                self.correlator.inject(&span_ctx, ctx.outbound_mut());
            }

            let result = next.run(ctx, req).await;

            if let Err(err) = &result {
                span.set_tag("code", err.code());
                span.set_error(&err.to_string());
            }
            span.finish();

            result
        })
    }
}
