//! Telemetry error types.

use thiserror::Error;

/// Result type alias using [`TelemetryError`].
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Errors raised while initializing telemetry subsystems.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Logging initialization failed.
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Metrics initialization failed.
    #[error("failed to initialize metrics: {0}")]
    MetricsInit(String),

    /// An address could not be parsed.
    #[error("invalid listen address: {0}")]
    InvalidAddress(String),

    /// A subsystem was initialized twice.
    #[error("{0} already initialized")]
    AlreadyInitialized(&'static str),
}
