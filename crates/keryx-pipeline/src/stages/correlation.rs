//! Trace-id assignment stage.
//!
//! Runs immediately inside recovery so every later stage and every log line
//! can be correlated. If the call already carries a trace id - set by the
//! transport adapter or present in the inbound metadata - it is kept;
//! otherwise a fresh one is synthesized.

use crate::interceptor::{BoxFuture, Interceptor, Next};
use keryx_core::{keys, CallContext, KeryxResult};
use uuid::Uuid;

/// Interceptor that guarantees the context carries a trace id.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorrelationInterceptor;

impl CorrelationInterceptor {
    /// Creates a new correlation interceptor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Synthesizes a new trace id.
///
/// UUID v7 in simple form: time-ordered, globally unique without
/// coordination.
pub(crate) fn new_trace_id() -> String {
    Uuid::now_v7().simple().to_string()
}

impl<Req, Res> Interceptor<Req, Res> for CorrelationInterceptor
where
    Req: Send + 'static,
    Res: Send + 'static,
{
    fn name(&self) -> &'static str {
        "correlation"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut CallContext,
        req: Req,
        next: Next<'a, Req, Res>,
    ) -> BoxFuture<'a, KeryxResult<Res>> {
        Box::pin(async move {
            if ctx.trace_id().is_none() {
                let trace_id = ctx
                    .metadata()
                    .get(keys::TRACE_ID)
                    .map_or_else(new_trace_id, ToString::to_string);
                ctx.set_trace_id(trace_id);
            }
            next.run(ctx, req).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interceptor::{handler_fn, Handler};
    use keryx_core::MetaMap;

    fn capture_terminal() -> impl Handler<u32, String> {
        handler_fn(|ctx: &mut CallContext, _req: u32| {
            let trace_id = ctx.trace_id().unwrap_or_default().to_string();
            Box::pin(async move { Ok(trace_id) }) as BoxFuture<'static, KeryxResult<String>>
        })
    }

    #[tokio::test]
    async fn test_synthesizes_when_absent() {
        let stage = CorrelationInterceptor::new();
        let terminal = capture_terminal();
        let mut ctx = CallContext::new("svc.Get");

        let next = Next::new(&stage, Next::terminal(&terminal));
        let seen = next.run(&mut ctx, 1).await.unwrap();

        assert!(!seen.is_empty());
        assert_eq!(ctx.trace_id(), Some(seen.as_str()));
    }

    #[tokio::test]
    async fn test_keeps_existing_trace_id() {
        let stage = CorrelationInterceptor::new();
        let terminal = capture_terminal();
        let mut ctx = CallContext::new("svc.Get");
        ctx.set_trace_id("preset");

        let next = Next::new(&stage, Next::terminal(&terminal));
        assert_eq!(next.run(&mut ctx, 1).await.unwrap(), "preset");
    }

    #[tokio::test]
    async fn test_prefers_inbound_metadata() {
        let stage = CorrelationInterceptor::new();
        let terminal = capture_terminal();

        let mut md = MetaMap::new();
        md.insert(keys::TRACE_ID, "wire-trace");
        let mut ctx = CallContext::with_metadata("svc.Get", md);

        let next = Next::new(&stage, Next::terminal(&terminal));
        assert_eq!(next.run(&mut ctx, 1).await.unwrap(), "wire-trace");
    }
}
