//! Payload debug logging and slow-call detection.
//!
//! Two independent toggles share this stage: full request/response payload
//! logging, and a slow-call warning when elapsed time exceeds a configured
//! threshold. Slow-call detection fires even when payload logging is
//! disabled. Both are observational: the result passes through untouched,
//! and a failing log sink never becomes a call error.

use crate::interceptor::{BoxFuture, Interceptor, Next};
use keryx_core::{CallContext, KeryxResult};
use std::fmt;
use std::time::{Duration, Instant};

/// Interceptor for payload logging and slow-call warnings.
#[derive(Debug, Clone, Copy)]
pub struct DebugLogInterceptor {
    debug: bool,
    slow_time: Option<Duration>,
}

impl DebugLogInterceptor {
    /// Creates the stage from its two toggles.
    ///
    /// `slow_time` of `None` disables slow-call detection.
    #[must_use]
    pub fn new(debug: bool, slow_time: Option<Duration>) -> Self {
        Self { debug, slow_time }
    }
}

impl<Req, Res> Interceptor<Req, Res> for DebugLogInterceptor
where
    Req: fmt::Debug + Send + 'static,
    Res: fmt::Debug + Send + 'static,
{
    fn name(&self) -> &'static str {
        "debug_log"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut CallContext,
        req: Req,
        next: Next<'a, Req, Res>,
    ) -> BoxFuture<'a, KeryxResult<Res>> {
        Box::pin(async move {
            let start = Instant::now();
            let method = ctx.method_name().to_string();

            if self.debug {
                tracing::debug!(method = %method, request = ?req, "request payload");
            }

            let result = next.run(ctx, req).await;
            let elapsed = start.elapsed();

            if self.debug {
                match &result {
                    Ok(res) => tracing::debug!(
                        method = %method,
                        elapsed = ?elapsed,
                        response = ?res,
                        "response payload"
                    ),
                    Err(err) => tracing::debug!(
                        method = %method,
                        elapsed = ?elapsed,
                        error = %err,
                        "call failed"
                    ),
                }
            }

            if let Some(threshold) = self.slow_time {
                if elapsed > threshold {
                    tracing::warn!(
                        method = %method,
                        elapsed = ?elapsed,
                        threshold = ?threshold,
                        "slow call"
                    );
                }
            }

            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interceptor::{handler_fn, Handler};
    use keryx_core::KeryxError;

    fn ok_terminal() -> impl Handler<u32, u32> {
        handler_fn(|_ctx: &mut CallContext, req: u32| {
            Box::pin(async move { Ok(req) }) as BoxFuture<'static, KeryxResult<u32>>
        })
    }

    #[tokio::test]
    async fn test_result_passes_through_unchanged() {
        let stage = DebugLogInterceptor::new(true, Some(Duration::from_millis(1)));
        let terminal = ok_terminal();
        let mut ctx = CallContext::new("svc.Echo");

        let next = Next::new(&stage, Next::terminal(&terminal));
        assert_eq!(next.run(&mut ctx, 5).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_error_passes_through_unchanged() {
        let stage = DebugLogInterceptor::new(true, None);
        let terminal = handler_fn(|_ctx: &mut CallContext, _req: u32| {
            Box::pin(async move { Err::<u32, _>(KeryxError::downstream("backend sad")) })
                as BoxFuture<'static, KeryxResult<u32>>
        });
        let mut ctx = CallContext::new("svc.Fail");

        let next = Next::new(&stage, Next::terminal(&terminal));
        let err = next.run(&mut ctx, 5).await.unwrap_err();
        assert!(err.to_string().contains("backend sad"));
    }

    #[tokio::test]
    async fn test_slow_detection_without_debug() {
        // Slow-call detection is independent of payload logging; with debug
        // off and a threshold configured the call still completes normally.
        let stage = DebugLogInterceptor::new(false, Some(Duration::from_millis(1)));
        let terminal = handler_fn(|_ctx: &mut CallContext, req: u32| {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(req)
            }) as BoxFuture<'static, KeryxResult<u32>>
        });
        let mut ctx = CallContext::new("svc.Slowish");

        let next = Next::new(&stage, Next::terminal(&terminal));
        assert_eq!(next.run(&mut ctx, 5).await.unwrap(), 5);
    }
}
