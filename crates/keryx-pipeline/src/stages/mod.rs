//! Canonical pipeline stages.
//!
//! Configuration gates which optional stages a builder includes, but the
//! relative order is fixed:
//!
//! 1. [`recovery`] - panic containment (always, outermost)
//! 2. [`correlation`] - trace-id assignment
//! 3. [`metadata`] - extract (server) / inject (client)
//! 4. [`deadline`] - effective-timeout enforcement
//! 5. [`debug_log`] - payload logging and slow-call detection (optional)
//! 6. [`validation`] - structural request validation (server, optional)
//! 7. [`tracing`] - span per call (optional)
//! 8. [`metrics`] - call count and duration (optional)

pub mod correlation;
pub mod deadline;
pub mod debug_log;
pub mod metadata;
pub mod metrics;
pub mod recovery;
pub mod tracing;
pub mod validation;

pub use correlation::CorrelationInterceptor;
pub use deadline::DeadlineInterceptor;
pub use debug_log::DebugLogInterceptor;
pub use metadata::{MetadataExtractInterceptor, MetadataInjectInterceptor};
pub use self::metrics::MetricsInterceptor;
pub use self::tracing::TracingInterceptor;
pub use recovery::RecoveryInterceptor;
pub use validation::ValidationInterceptor;
