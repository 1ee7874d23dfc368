//! Call metrics stage.
//!
//! Increments the call counter and records the duration histogram through
//! the [`MetricsRecorder`] collaborator, labeled by service name, method,
//! and status (the stable error code, or `OK`). Runs whenever metrics are
//! enabled, independent of the other optional stages.

use crate::interceptor::{BoxFuture, Interceptor, Next};
use keryx_core::{CallContext, KeryxResult};
use keryx_telemetry::{metric_names, MetricsRecorder};
use std::sync::Arc;
use std::time::Instant;

/// Status label for successful calls.
const STATUS_OK: &str = "OK";

/// Interceptor that records per-call metrics.
pub struct MetricsInterceptor {
    service_name: String,
    recorder: Arc<dyn MetricsRecorder>,
}

impl MetricsInterceptor {
    /// Creates a metrics stage labeled with the local service name.
    #[must_use]
    pub fn new(service_name: impl Into<String>, recorder: Arc<dyn MetricsRecorder>) -> Self {
        Self {
            service_name: service_name.into(),
            recorder,
        }
    }
}

impl<Req, Res> Interceptor<Req, Res> for MetricsInterceptor
where
    Req: Send + 'static,
    Res: Send + 'static,
{
    fn name(&self) -> &'static str {
        "metrics"
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

            let result = next.run(ctx, req).await;

            let status = result.as_ref().map_or_else(|e| e.code(), |_| STATUS_OK);
            self.recorder.increment_counter(
                metric_names::CALLS_TOTAL,
                &[
                    ("service", self.service_name.clone()),
                    ("method", method.clone()),
                    ("status", status.to_string()),
                ],
            );
            self.recorder.observe_histogram(
                metric_names::CALL_DURATION_SECONDS,
                start.elapsed().as_secs_f64(),
                &[
                    ("service", self.service_name.clone()),
                    ("method", method),
                ],
            );

            result
        })
    }
}
