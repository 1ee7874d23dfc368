//! Cache-like capability and its proxy nodes.
//!
//! [`CacheConn`] is the shared contract for a command-oriented cache
//! connection: `command(cmd, args)` plus `close`. The wire protocol is
//! out of scope.

use crate::chain::{BoxFuture, SlowCallHook};
use keryx_core::KeryxResult;
use keryx_telemetry::{metric_names, MetricsRecorder, Span as _, TraceCorrelator};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A cache command argument or reply.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    /// Absent value.
    Nil,
    /// An integer reply.
    Int(i64),
    /// A text value.
    Str(String),
    /// A binary value.
    Bytes(Vec<u8>),
    /// A multi-value reply.
    Array(Vec<CacheValue>),
}

/// Capability interface for a cache connection.
pub trait CacheConn: Send + Sync + 'static {
    /// Runs one command with its arguments and returns the reply.
    fn command<'a>(
        &'a self,
        cmd: &'a str,
        args: &'a [CacheValue],
    ) -> BoxFuture<'a, KeryxResult<CacheValue>>;

    /// Closes the connection.
    fn close<'a>(&'a self) -> BoxFuture<'a, KeryxResult<()>>;
}

/// Node that times commands and fires the slow-call hook.
pub struct TimingCacheConn {
    threshold: Duration,
    hook: SlowCallHook,
    next: Arc<dyn CacheConn>,
}

impl TimingCacheConn {
    /// Creates a timing node in front of `next`.
    #[must_use]
    pub fn new(threshold: Duration, hook: SlowCallHook, next: Arc<dyn CacheConn>) -> Self {
        Self {
            threshold,
            hook,
            next,
        }
    }
}

impl CacheConn for TimingCacheConn {
    fn command<'a>(
        &'a self,
        cmd: &'a str,
        args: &'a [CacheValue],
    ) -> BoxFuture<'a, KeryxResult<CacheValue>> {
        Box::pin(async move {
            let start = Instant::now();
            let result = self.next.command(cmd, args).await;
            let elapsed = start.elapsed();
            if elapsed > self.threshold {
                (self.hook)(cmd, elapsed);
            }
            result
        })
    }

    fn close<'a>(&'a self) -> BoxFuture<'a, KeryxResult<()>> {
        self.next.close()
    }
}

/// Node that spans commands through a [`TraceCorrelator`].
pub struct TracingCacheConn {
    correlator: Arc<dyn TraceCorrelator>,
    next: Arc<dyn CacheConn>,
}

impl TracingCacheConn {
    /// Creates a tracing node in front of `next`.
    #[must_use]
    pub fn new(correlator: Arc<dyn TraceCorrelator>, next: Arc<dyn CacheConn>) -> Self {
        Self { correlator, next }
    }
}

impl CacheConn for TracingCacheConn {
    fn command<'a>(
        &'a self,
        cmd: &'a str,
        args: &'a [CacheValue],
    ) -> BoxFuture<'a, KeryxResult<CacheValue>> {
        Box::pin(async move {
            let mut span = self.correlator.start_span("cache.command", None);
            span.set_tag("component", "cache");
            span.set_tag("command", cmd);

            let result = self.next.command(cmd, args).await;
            if let Err(err) = &result {
                span.set_error(&err.to_string());
            }
            span.finish();
            result
        })
    }

    fn close<'a>(&'a self) -> BoxFuture<'a, KeryxResult<()>> {
        self.next.close()
    }
}

/// Node that records a duration histogram per command.
pub struct MetricsCacheConn {
    recorder: Arc<dyn MetricsRecorder>,
    next: Arc<dyn CacheConn>,
}

impl MetricsCacheConn {
    /// Creates a metrics node in front of `next`.
    #[must_use]
    pub fn new(recorder: Arc<dyn MetricsRecorder>, next: Arc<dyn CacheConn>) -> Self {
        Self { recorder, next }
    }
}

impl CacheConn for MetricsCacheConn {
    fn command<'a>(
        &'a self,
        cmd: &'a str,
        args: &'a [CacheValue],
    ) -> BoxFuture<'a, KeryxResult<CacheValue>> {
        Box::pin(async move {
            let start = Instant::now();
            let result = self.next.command(cmd, args).await;
            self.recorder.observe_histogram(
                metric_names::PROXY_DURATION_SECONDS,
                start.elapsed().as_secs_f64(),
                &[
                    ("capability", "cache".to_string()),
                    ("operation", cmd.to_ascii_uppercase()),
                ],
            );
            result
        })
    }

    fn close<'a>(&'a self) -> BoxFuture<'a, KeryxResult<()>> {
        self.next.close()
    }
}
