//! # Keryx Telemetry
//!
//! Observability collaborators for the Keryx toolkit.
//!
//! Pipelines and proxy chains do not talk to a metrics registry or a trace
//! exporter directly; they go through two narrow contracts defined here:
//!
//! - [`MetricsRecorder`] - counter/histogram/gauge recording with fixed
//!   label sets, backed by the `metrics` facade in production
//!   ([`FacadeRecorder`]) or by an in-memory capture for tests
//!   ([`TestRecorder`])
//! - [`TraceCorrelator`] - span lifecycle plus carrier extract/inject,
//!   backed by structured logging ([`LogCorrelator`]) or an in-memory
//!   capture ([`TestCorrelator`])
//!
//! The crate also owns process-level bootstrap: [`init_logging`] and
//! [`init_metrics`] wire up `tracing-subscriber` and the Prometheus
//! exporter from configuration.

#![doc(html_root_url = "https://docs.rs/keryx-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod correlate;
mod error;
mod logging;
mod metrics;
mod recorder;

pub use correlate::{
    FinishedSpan, LogCorrelator, Span, SpanContext, TestCorrelator, TraceCorrelator,
};
pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, LogConfig};
pub use self::metrics::{init_metrics, metric_names, render_metrics, MetricsConfig};
pub use recorder::{FacadeRecorder, MetricsRecorder, TestRecorder};
