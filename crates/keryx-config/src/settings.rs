//! Configuration structs and defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default call timeout in milliseconds, applied when the configured value
/// is zero or absent.
pub(crate) const DEFAULT_TIMEOUT_MS: u64 = 1_000;

/// Default connect timeout in milliseconds.
pub(crate) const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 2_000;

/// Default keepalive time in seconds (2 hours).
pub(crate) const DEFAULT_KEEPALIVE_TIME_SECS: u64 = 2 * 60 * 60;

/// Default keepalive timeout in seconds.
pub(crate) const DEFAULT_KEEPALIVE_TIMEOUT_SECS: u64 = 20;

/// The per-side pipeline configuration.
///
/// One copy per side: the server pipeline reads the `[server]` table, the
/// client pipeline the `[client]` table. Every field has a documented
/// default so a missing table means "instrumentation off, standard
/// timeouts".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Log request/response payloads.
    pub debug: bool,

    /// Record call count and duration metrics.
    pub metrics: bool,

    /// Trace calls through the configured correlator.
    pub tracer: bool,

    /// Run structural validation on inbound requests (server only).
    pub validate: bool,

    /// Warn on calls slower than [`slow_time_ms`](Self::slow_time_ms).
    pub check_slow: bool,

    /// Slow-call threshold in milliseconds.
    pub slow_time_ms: u64,

    /// Call timeout in milliseconds. Zero falls back to the 1000 ms
    /// default.
    pub timeout_ms: u64,

    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// Keepalive probe interval in seconds.
    pub keepalive_time_secs: u64,

    /// Keepalive probe timeout in seconds.
    pub keepalive_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            debug: false,
            metrics: false,
            tracer: false,
            validate: false,
            check_slow: false,
            slow_time_ms: 0,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            keepalive_time_secs: DEFAULT_KEEPALIVE_TIME_SECS,
            keepalive_timeout_secs: DEFAULT_KEEPALIVE_TIMEOUT_SECS,
        }
    }
}

impl PipelineConfig {
    /// Returns the effective call timeout, falling back to the default
    /// when configured as zero.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        if self.timeout_ms == 0 {
            Duration::from_millis(DEFAULT_TIMEOUT_MS)
        } else {
            Duration::from_millis(self.timeout_ms)
        }
    }

    /// Returns the slow-call threshold, or `None` when slow-call checking
    /// is disabled (flag off or threshold zero).
    #[must_use]
    pub fn slow_time(&self) -> Option<Duration> {
        (self.check_slow && self.slow_time_ms > 0)
            .then(|| Duration::from_millis(self.slow_time_ms))
    }

    /// Returns the connect timeout.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        if self.connect_timeout_ms == 0 {
            Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS)
        } else {
            Duration::from_millis(self.connect_timeout_ms)
        }
    }

    /// Returns the keepalive probe interval.
    #[must_use]
    pub fn keepalive_time(&self) -> Duration {
        Duration::from_secs(self.keepalive_time_secs)
    }

    /// Returns the keepalive probe timeout.
    #[must_use]
    pub fn keepalive_timeout(&self) -> Duration {
        Duration::from_secs(self.keepalive_timeout_secs)
    }
}

/// Top-level Keryx configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeryxConfig {
    /// The local service name, used for metadata fallbacks and metric
    /// labels.
    pub service_name: String,

    /// Inbound (server) pipeline configuration.
    pub server: PipelineConfig,

    /// Outbound (client) pipeline configuration.
    pub client: PipelineConfig,
}
