//! HTTP round-trip capability and its proxy nodes.
//!
//! The [`HttpTransport`] trait is the shared contract between an
//! externally supplied HTTP client transport and the nodes that decorate
//! it. The wire implementation is out of scope; anything that can
//! round-trip an `http::Request<Bytes>` fits.

use crate::chain::{BoxFuture, SlowCallHook};
use bytes::Bytes;
use keryx_core::KeryxResult;
use keryx_telemetry::{metric_names, MetricsRecorder, Span as _, TraceCorrelator};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The request type round-tripped through the capability.
pub type HttpRequest = http::Request<Bytes>;

/// The response type round-tripped through the capability.
pub type HttpResponse = http::Response<Bytes>;

/// Capability interface for HTTP round-trips.
pub trait HttpTransport: Send + Sync + 'static {
    /// Sends the request and returns the response.
    fn round_trip<'a>(&'a self, req: HttpRequest) -> BoxFuture<'a, KeryxResult<HttpResponse>>;
}

fn operation_label(req: &HttpRequest) -> String {
    format!("{} {}", req.method(), req.uri().path())
}

/// Node that times each round-trip and fires the slow-call hook when the
/// elapsed time exceeds the threshold.
pub struct TimingHttpTransport {
    threshold: Duration,
    hook: SlowCallHook,
    next: Arc<dyn HttpTransport>,
}

impl TimingHttpTransport {
    /// Creates a timing node in front of `next`.
    #[must_use]
    pub fn new(threshold: Duration, hook: SlowCallHook, next: Arc<dyn HttpTransport>) -> Self {
        Self {
            threshold,
            hook,
            next,
        }
    }
}

impl HttpTransport for TimingHttpTransport {
    fn round_trip<'a>(&'a self, req: HttpRequest) -> BoxFuture<'a, KeryxResult<HttpResponse>> {
        Box::pin(async move {
            let label = operation_label(&req);
            let start = Instant::now();
            let result = self.next.round_trip(req).await;
            let elapsed = start.elapsed();
            if elapsed > self.threshold {
                (self.hook)(&label, elapsed);
            }
            result
        })
    }
}

/// Node that spans each round-trip and injects the span context into the
/// outgoing request headers.
pub struct TracingHttpTransport {
    correlator: Arc<dyn TraceCorrelator>,
    next: Arc<dyn HttpTransport>,
}

impl TracingHttpTransport {
    /// Creates a tracing node in front of `next`.
    #[must_use]
    pub fn new(correlator: Arc<dyn TraceCorrelator>, next: Arc<dyn HttpTransport>) -> Self {
        Self { correlator, next }
    }
}

impl HttpTransport for TracingHttpTransport {
    fn round_trip<'a>(&'a self, mut req: HttpRequest) -> BoxFuture<'a, KeryxResult<HttpResponse>> {
        Box::pin(async move {
            let label = operation_label(&req);
            let mut span = self.correlator.start_span(&label, None);
            span.set_tag("component", "http-client");

            if let Ok(trace_id) = http::HeaderValue::from_str(&span.context().trace_id) {
                req.headers_mut().insert("trace-id", trace_id);
            }
            if let Ok(span_id) = http::HeaderValue::from_str(&span.context().span_id) {
                req.headers_mut().insert("span-id", span_id);
            }

            let result = self.next.round_trip(req).await;
            match &result {
                Ok(res) => span.set_tag("status", res.status().as_str()),
                Err(err) => span.set_error(&err.to_string()),
            }
            span.finish();
            result
        })
    }
}

/// Node that records a duration histogram per round-trip.
pub struct MetricsHttpTransport {
    recorder: Arc<dyn MetricsRecorder>,
    next: Arc<dyn HttpTransport>,
}

impl MetricsHttpTransport {
    /// Creates a metrics node in front of `next`.
    #[must_use]
    pub fn new(recorder: Arc<dyn MetricsRecorder>, next: Arc<dyn HttpTransport>) -> Self {
        Self { recorder, next }
    }
}

impl HttpTransport for MetricsHttpTransport {
    fn round_trip<'a>(&'a self, req: HttpRequest) -> BoxFuture<'a, KeryxResult<HttpResponse>> {
        Box::pin(async move {
            let label = operation_label(&req);
            let start = Instant::now();
            let result = self.next.round_trip(req).await;
            self.recorder.observe_histogram(
                metric_names::PROXY_DURATION_SECONDS,
                start.elapsed().as_secs_f64(),
                &[("capability", "http".to_string()), ("operation", label)],
            );
            result
        })
    }
}

/// Node that substitutes canned responses for stubbed paths and delegates
/// everything else.
pub struct StubHttpTransport {
    stubs: HashMap<String, (http::StatusCode, Bytes)>,
    next: Arc<dyn HttpTransport>,
}

impl StubHttpTransport {
    /// Creates a stub node with no stubbed paths.
    #[must_use]
    pub fn new(next: Arc<dyn HttpTransport>) -> Self {
        Self {
            stubs: HashMap::new(),
            next,
        }
    }

    /// Registers a canned response for a path.
    #[must_use]
    pub fn with_stub(
        mut self,
        path: impl Into<String>,
        status: http::StatusCode,
        body: impl Into<Bytes>,
    ) -> Self {
        self.stubs.insert(path.into(), (status, body.into()));
        self
    }
}

impl HttpTransport for StubHttpTransport {
    fn round_trip<'a>(&'a self, req: HttpRequest) -> BoxFuture<'a, KeryxResult<HttpResponse>> {
        Box::pin(async move {
            if let Some((status, body)) = self.stubs.get(req.uri().path()) {
                let response = http::Response::builder()
                    .status(*status)
                    .body(body.clone())
                    .map_err(keryx_core::KeryxError::downstream_from)?;
                return Ok(response);
            }
            self.next.round_trip(req).await
        })
    }
}
