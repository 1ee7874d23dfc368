//! Trace correlation contract and implementations.
//!
//! The tracing stage and tracing proxy nodes talk to a [`TraceCorrelator`]:
//! extract a parent span context from a metadata carrier, start a child
//! span, inject the child context back into an outbound carrier, and finish
//! the span when the call returns. The exporter backend behind the
//! correlator is out of scope; [`LogCorrelator`] correlates through
//! structured logs and [`TestCorrelator`] captures spans for assertions.

use keryx_core::{keys, MetaMap};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Carrier key for the active span id.
const SPAN_ID_KEY: &str = "span-id";

/// The propagated identity of one traced operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanContext {
    /// Trace id shared by every span of one distributed call tree.
    pub trace_id: String,
    /// Id of this span within the trace.
    pub span_id: String,
}

/// One traced operation with a start/finish time and tags.
pub trait Span: Send {
    /// Returns this span's propagated context.
    fn context(&self) -> &SpanContext;

    /// Attaches a key/value tag.
    fn set_tag(&mut self, key: &str, value: &str);

    /// Attaches structured log fields to the span.
    fn log_kv(&mut self, fields: &[(&str, &str)]);

    /// Marks the span as errored.
    fn set_error(&mut self, message: &str);

    /// Finishes the span. Finishing twice is a no-op.
    fn finish(&mut self);
}

/// Starts spans and moves span contexts through metadata carriers.
pub trait TraceCorrelator: Send + Sync + 'static {
    /// Starts a span named `name`, as a child of `parent` when given.
    fn start_span(&self, name: &str, parent: Option<&SpanContext>) -> Box<dyn Span>;

    /// Reads a span context from a carrier, if one is present.
    fn extract(&self, carrier: &MetaMap) -> Option<SpanContext>;

    /// Writes a span context into a carrier.
    fn inject(&self, context: &SpanContext, carrier: &mut MetaMap);
}

fn new_trace_id() -> String {
    Uuid::now_v7().simple().to_string()
}

fn new_span_id() -> String {
    Uuid::now_v7().simple().to_string()[..16].to_string()
}

/// A correlator that emits finished spans as structured log events.
///
/// Useful as the default when no exporter is wired in: every span still
/// produces a correlatable `trace_id`/`span_id` pair in the logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogCorrelator;

impl LogCorrelator {
    /// Creates a new log-backed correlator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TraceCorrelator for LogCorrelator {
    fn start_span(&self, name: &str, parent: Option<&SpanContext>) -> Box<dyn Span> {
        let trace_id = parent.map_or_else(new_trace_id, |p| p.trace_id.clone());
        Box::new(LogSpan {
            name: name.to_string(),
            context: SpanContext {
                trace_id,
                span_id: new_span_id(),
            },
            tags: Vec::new(),
            error: None,
            started: Instant::now(),
            finished: false,
        })
    }

    fn extract(&self, carrier: &MetaMap) -> Option<SpanContext> {
        let trace_id = carrier.get(keys::TRACE_ID)?;
        let span_id = carrier.get(SPAN_ID_KEY).unwrap_or_default();
        Some(SpanContext {
            trace_id: trace_id.to_string(),
            span_id: span_id.to_string(),
        })
    }

    fn inject(&self, context: &SpanContext, carrier: &mut MetaMap) {
        carrier.insert(keys::TRACE_ID, context.trace_id.clone());
        carrier.insert(SPAN_ID_KEY, context.span_id.clone());
    }
}

struct LogSpan {
    name: String,
    context: SpanContext,
    tags: Vec<(String, String)>,
    error: Option<String>,
    started: Instant,
    finished: bool,
}

impl Span for LogSpan {
    fn context(&self) -> &SpanContext {
        &self.context
    }

    fn set_tag(&mut self, key: &str, value: &str) {
        self.tags.push((key.to_string(), value.to_string()));
    }

    fn log_kv(&mut self, fields: &[(&str, &str)]) {
        for (key, value) in fields {
            self.tags.push(((*key).to_string(), (*value).to_string()));
        }
    }

    fn set_error(&mut self, message: &str) {
        self.error = Some(message.to_string());
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;

        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        match &self.error {
            Some(error) => tracing::warn!(
                span = %self.name,
                trace_id = %self.context.trace_id,
                span_id = %self.context.span_id,
                elapsed_ms,
                error = %error,
                tags = ?self.tags,
                "span finished with error"
            ),
            None => tracing::debug!(
                span = %self.name,
                trace_id = %self.context.trace_id,
                span_id = %self.context.span_id,
                elapsed_ms,
                tags = ?self.tags,
                "span finished"
            ),
        }
    }
}

impl Drop for LogSpan {
    fn drop(&mut self) {
        self.finish();
    }
}

/// A finished span captured by [`TestCorrelator`].
#[derive(Debug, Clone)]
pub struct FinishedSpan {
    /// The span name.
    pub name: String,
    /// The span's context.
    pub context: SpanContext,
    /// Tags attached before finishing.
    pub tags: Vec<(String, String)>,
    /// The error message, when the span was marked errored.
    pub error: Option<String>,
    /// Whether the span was started with a parent context.
    pub has_parent: bool,
}

/// A correlator that records spans in memory for assertions.
#[derive(Debug, Default)]
pub struct TestCorrelator {
    started: Mutex<usize>,
    finished: Arc<Mutex<Vec<FinishedSpan>>>,
}

impl TestCorrelator {
    /// Creates an empty test correlator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many spans were started.
    #[must_use]
    pub fn started_count(&self) -> usize {
        *self.started.lock()
    }

    /// Returns the spans finished so far.
    #[must_use]
    pub fn finished_spans(&self) -> Vec<FinishedSpan> {
        self.finished.lock().clone()
    }
}

impl TraceCorrelator for TestCorrelator {
    fn start_span(&self, name: &str, parent: Option<&SpanContext>) -> Box<dyn Span> {
        *self.started.lock() += 1;
        let trace_id = parent.map_or_else(new_trace_id, |p| p.trace_id.clone());
        Box::new(TestSpan {
            record: FinishedSpan {
                name: name.to_string(),
                context: SpanContext {
                    trace_id,
                    span_id: new_span_id(),
                },
                tags: Vec::new(),
                error: None,
                has_parent: parent.is_some(),
            },
            sink: Arc::clone(&self.finished),
            finished: false,
        })
    }

    fn extract(&self, carrier: &MetaMap) -> Option<SpanContext> {
        LogCorrelator.extract(carrier)
    }

    fn inject(&self, context: &SpanContext, carrier: &mut MetaMap) {
        LogCorrelator.inject(context, carrier);
    }
}

struct TestSpan {
    record: FinishedSpan,
    sink: Arc<Mutex<Vec<FinishedSpan>>>,
    finished: bool,
}

impl Span for TestSpan {
    fn context(&self) -> &SpanContext {
        &self.record.context
    }

    fn set_tag(&mut self, key: &str, value: &str) {
        self.record.tags.push((key.to_string(), value.to_string()));
    }

    fn log_kv(&mut self, fields: &[(&str, &str)]) {
        for (key, value) in fields {
            self.record
                .tags
                .push(((*key).to_string(), (*value).to_string()));
        }
    }

    fn set_error(&mut self, message: &str) {
        self.record.error = Some(message.to_string());
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.sink.lock().push(self.record.clone());
    }
}

impl Drop for TestSpan {
    fn drop(&mut self) {
        self.finish();
    }
}
