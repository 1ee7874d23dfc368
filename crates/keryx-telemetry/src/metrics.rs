//! Prometheus metrics bootstrap for Keryx.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `keryx_calls_total` | Counter | `service`, `method`, `status` | Total unary calls |
//! | `keryx_call_duration_seconds` | Histogram | `service`, `method` | Call latency |
//! | `keryx_proxy_duration_seconds` | Histogram | `capability`, `operation` | Proxied operation latency |
//! | `keryx_pool_busy_workers` | Gauge | `pool` | Busy workers in a task pool |
//!
//! Label sets are fixed at registration; recording sites go through the
//! [`MetricsRecorder`](crate::MetricsRecorder) contract.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Standard metric names.
pub mod metric_names {
    /// Counter of unary calls, labeled `service`, `method`, `status`.
    pub const CALLS_TOTAL: &str = "keryx_calls_total";

    /// Histogram of unary-call latency in seconds, labeled `service`,
    /// `method`.
    pub const CALL_DURATION_SECONDS: &str = "keryx_call_duration_seconds";

    /// Histogram of proxied-operation latency in seconds, labeled
    /// `capability`, `operation`.
    pub const PROXY_DURATION_SECONDS: &str = "keryx_proxy_duration_seconds";

    /// Gauge of busy workers, labeled `pool`.
    pub const POOL_BUSY_WORKERS: &str = "keryx_pool_busy_workers";
}

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Address to expose metrics on (e.g., "0.0.0.0:9090").
    pub addr: String,

    /// Histogram buckets for call duration.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            addr: "0.0.0.0:9090".to_string(),
            // Default buckets: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        }
    }
}

/// Initializes the metrics subsystem.
///
/// Installs the Prometheus exporter as the global recorder and registers
/// descriptions for the standard metrics.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidAddress` for an unparseable listen
/// address, `TelemetryError::AlreadyInitialized` on a duplicate call, and
/// `TelemetryError::MetricsInit` when the exporter install fails.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    if METRICS_HANDLE.get().is_some() {
        return Err(TelemetryError::AlreadyInitialized("metrics"));
    }

    let addr: SocketAddr = config
        .addr
        .parse()
        .map_err(|e| TelemetryError::InvalidAddress(format!("{}: {e}", config.addr)))?;

    let handle = PrometheusBuilder::new()
        .with_http_listener(addr)
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);

    register_metric_descriptions();

    Ok(())
}

/// Renders metrics in Prometheus format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

/// Registers descriptions for all standard metrics.
fn register_metric_descriptions() {
    describe_counter!(
        metric_names::CALLS_TOTAL,
        "Total number of unary calls processed"
    );

    describe_histogram!(
        metric_names::CALL_DURATION_SECONDS,
        "Unary call duration in seconds"
    );

    describe_histogram!(
        metric_names::PROXY_DURATION_SECONDS,
        "Proxied operation duration in seconds"
    );

    describe_gauge!(
        metric_names::POOL_BUSY_WORKERS,
        "Number of busy workers in a task pool"
    );
}
