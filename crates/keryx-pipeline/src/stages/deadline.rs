//! Deadline enforcement stage.
//!
//! Computes the effective timeout as the minimum of the configured timeout
//! and the remaining time on any inbound deadline, records the derived
//! deadline on the context, and runs the continuation under it. Expiry
//! surfaces as [`KeryxError::DeadlineExceeded`], a distinguishable kind
//! callers can branch on.
//!
//! This is the only stage in the default pipeline where a call can be
//! asynchronously interrupted: on expiry the continuation future is
//! dropped, which also releases the timer on every exit path - success,
//! error, or a panic recovered above.

use crate::interceptor::{BoxFuture, Interceptor, Next};
use keryx_core::{CallContext, KeryxError, KeryxResult};
use std::time::{Duration, Instant};

/// Interceptor that bounds each call by an effective timeout.
#[derive(Debug, Clone, Copy)]
pub struct DeadlineInterceptor {
    timeout: Duration,
}

impl DeadlineInterceptor {
    /// Creates a deadline interceptor with the configured timeout.
    ///
    /// Builders pass `PipelineConfig::timeout()`, which already folds a
    /// zero/unset configuration into the documented 1000 ms default.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Returns the effective timeout for a context: the configured value,
    /// capped by whatever remains of an inbound deadline.
    fn effective_timeout(&self, ctx: &CallContext) -> Duration {
        match ctx.remaining() {
            Some(remaining) => self.timeout.min(remaining),
            None => self.timeout,
        }
    }
}

impl<Req, Res> Interceptor<Req, Res> for DeadlineInterceptor
where
    Req: Send + 'static,
    Res: Send + 'static,
{
    fn name(&self) -> &'static str {
        "deadline"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut CallContext,
        req: Req,
        next: Next<'a, Req, Res>,
    ) -> BoxFuture<'a, KeryxResult<Res>> {
        Box::pin(async move {
            let effective = self.effective_timeout(ctx);
            ctx.set_deadline(Instant::now() + effective);
            let method = ctx.method_name().to_string();

            match tokio::time::timeout(effective, next.run(ctx, req)).await {
                Ok(result) => result,
                Err(_elapsed) => Err(KeryxError::deadline_exceeded(format!(
                    "{method} exceeded {effective:?}"
                ))),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interceptor::{handler_fn, Handler};
    use keryx_core::ErrorKind;

    fn sleeping_terminal(sleep: Duration) -> impl Handler<u32, u32> {
        handler_fn(move |_ctx: &mut CallContext, req: u32| {
            Box::pin(async move {
                tokio::time::sleep(sleep).await;
                Ok(req)
            }) as BoxFuture<'static, KeryxResult<u32>>
        })
    }

    #[tokio::test]
    async fn test_fast_call_passes() {
        let stage = DeadlineInterceptor::new(Duration::from_millis(200));
        let terminal = sleeping_terminal(Duration::from_millis(5));
        let mut ctx = CallContext::new("svc.Fast");

        let next = Next::new(&stage, Next::terminal(&terminal));
        assert_eq!(next.run(&mut ctx, 1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_slow_call_times_out() {
        let stage = DeadlineInterceptor::new(Duration::from_millis(100));
        let terminal = sleeping_terminal(Duration::from_millis(500));
        let mut ctx = CallContext::new("svc.Slow");

        let start = Instant::now();
        let next = Next::new(&stage, Next::terminal(&terminal));
        let err = next.run(&mut ctx, 1).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::DeadlineExceeded);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_millis(400), "timer not honored: {elapsed:?}");
    }

    #[tokio::test]
    async fn test_inbound_deadline_caps_configured_timeout() {
        let stage = DeadlineInterceptor::new(Duration::from_secs(10));
        let mut ctx = CallContext::new("svc.Capped");
        ctx.set_deadline(Instant::now() + Duration::from_millis(50));

        let effective = stage.effective_timeout(&ctx);
        assert!(effective <= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_configured_timeout_caps_loose_inbound_deadline() {
        let stage = DeadlineInterceptor::new(Duration::from_millis(80));
        let mut ctx = CallContext::new("svc.Capped");
        ctx.set_deadline(Instant::now() + Duration::from_secs(30));

        assert_eq!(stage.effective_timeout(&ctx), Duration::from_millis(80));
    }

    #[tokio::test]
    async fn test_derived_deadline_recorded_on_context() {
        let stage = DeadlineInterceptor::new(Duration::from_millis(100));
        let terminal = handler_fn(|ctx: &mut CallContext, _req: u32| {
            let remaining = ctx.remaining();
            Box::pin(async move {
                let remaining = remaining.expect("derived deadline missing");
                assert!(remaining <= Duration::from_millis(100));
                Ok(1u32)
            }) as BoxFuture<'static, KeryxResult<u32>>
        });
        let mut ctx = CallContext::new("svc.Derived");

        let next = Next::new(&stage, Next::terminal(&terminal));
        next.run(&mut ctx, 1).await.unwrap();
    }
}
