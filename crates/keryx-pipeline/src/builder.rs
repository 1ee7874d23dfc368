//! Pipeline builders.
//!
//! Builders read a [`PipelineConfig`] and assemble the enabled stages in
//! the canonical order of [`crate::stages`], whatever order the flags were
//! set in. Building is idempotent and side-effect-free: it only closes
//! over configuration values and collaborator handles.
//!
//! Server pipelines always carry recovery, correlation, metadata
//! extraction, and deadline enforcement; client pipelines always carry
//! recovery, correlation, metadata injection, and deadline enforcement.
//! Everything else is gated by its configuration flag.

use crate::interceptor::Handler;
use crate::pipeline::{BoxedInterceptor, Pipeline};
use crate::stages::{
    CorrelationInterceptor, DeadlineInterceptor, DebugLogInterceptor, MetadataExtractInterceptor,
    MetadataInjectInterceptor, MetricsInterceptor, RecoveryInterceptor, TracingInterceptor,
    ValidationInterceptor,
};
use keryx_config::PipelineConfig;
use keryx_core::{AcceptAll, Validator};
use keryx_telemetry::{FacadeRecorder, LogCorrelator, MetricsRecorder, TraceCorrelator};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Builder for inbound (server) pipelines.
///
/// # Example
///
/// ```ignore
/// let pipeline = ServerPipelineBuilder::new("pay-core", config.server)
///     .with_validator(Arc::new(RequiredFields::new(["merchant_id"])))
///     .with_recorder(recorder)
///     .build(Arc::new(handler));
/// ```
pub struct ServerPipelineBuilder<Req, Res> {
    service_name: String,
    config: PipelineConfig,
    recorder: Arc<dyn MetricsRecorder>,
    correlator: Arc<dyn TraceCorrelator>,
    validator: Arc<dyn Validator<Req>>,
    _marker: PhantomData<fn(Req) -> Res>,
}

impl<Req, Res> ServerPipelineBuilder<Req, Res>
where
    Req: fmt::Debug + Send + 'static,
    Res: fmt::Debug + Send + 'static,
{
    /// Creates a builder from the local service name and the server-side
    /// configuration.
    ///
    /// Collaborators default to the production recorder and the log-backed
    /// correlator; the validator defaults to accept-all until one is set.
    #[must_use]
    pub fn new(service_name: impl Into<String>, config: PipelineConfig) -> Self {
        Self {
            service_name: service_name.into(),
            config,
            recorder: Arc::new(FacadeRecorder::new()),
            correlator: Arc::new(LogCorrelator::new()),
            validator: Arc::new(AcceptAll),
            _marker: PhantomData,
        }
    }

    /// Replaces the metrics recorder.
    #[must_use]
    pub fn with_recorder(mut self, recorder: Arc<dyn MetricsRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    /// Replaces the trace correlator.
    #[must_use]
    pub fn with_correlator(mut self, correlator: Arc<dyn TraceCorrelator>) -> Self {
        self.correlator = correlator;
        self
    }

    /// Replaces the request validator used when validation is enabled.
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn Validator<Req>>) -> Self {
        self.validator = validator;
        self
    }

    /// Assembles the pipeline around a terminal handler.
    #[must_use]
    pub fn build(self, terminal: Arc<dyn Handler<Req, Res>>) -> Pipeline<Req, Res> {
        let mut stages: Vec<BoxedInterceptor<Req, Res>> = vec![
            Arc::new(RecoveryInterceptor::new()),
            Arc::new(CorrelationInterceptor::new()),
            Arc::new(MetadataExtractInterceptor::new()),
            Arc::new(DeadlineInterceptor::new(self.config.timeout())),
        ];

        if self.config.debug || self.config.slow_time().is_some() {
            stages.push(Arc::new(DebugLogInterceptor::new(
                self.config.debug,
                self.config.slow_time(),
            )));
        }
        if self.config.validate {
            stages.push(Arc::new(ValidationInterceptor::new(Arc::clone(
                &self.validator,
            ))));
        }
        if self.config.tracer {
            stages.push(Arc::new(TracingInterceptor::server(Arc::clone(
                &self.correlator,
            ))));
        }
        if self.config.metrics {
            stages.push(Arc::new(MetricsInterceptor::new(
                self.service_name.clone(),
                Arc::clone(&self.recorder),
            )));
        }

        Pipeline::new(stages, terminal)
    }
}

/// Builder for outbound (client) pipelines.
pub struct ClientPipelineBuilder<Req, Res> {
    service_name: String,
    config: PipelineConfig,
    recorder: Arc<dyn MetricsRecorder>,
    correlator: Arc<dyn TraceCorrelator>,
    _marker: PhantomData<fn(Req) -> Res>,
}

impl<Req, Res> ClientPipelineBuilder<Req, Res>
where
    Req: fmt::Debug + Send + 'static,
    Res: fmt::Debug + Send + 'static,
{
    /// Creates a builder from the local service name and the client-side
    /// configuration.
    #[must_use]
    pub fn new(service_name: impl Into<String>, config: PipelineConfig) -> Self {
        Self {
            service_name: service_name.into(),
            config,
            recorder: Arc::new(FacadeRecorder::new()),
            correlator: Arc::new(LogCorrelator::new()),
            _marker: PhantomData,
        }
    }

    /// Replaces the metrics recorder.
    #[must_use]
    pub fn with_recorder(mut self, recorder: Arc<dyn MetricsRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    /// Replaces the trace correlator.
    #[must_use]
    pub fn with_correlator(mut self, correlator: Arc<dyn TraceCorrelator>) -> Self {
        self.correlator = correlator;
        self
    }

    /// Assembles the pipeline around a terminal handler (typically the
    /// transport invoker).
    #[must_use]
    pub fn build(self, terminal: Arc<dyn Handler<Req, Res>>) -> Pipeline<Req, Res> {
        let mut stages: Vec<BoxedInterceptor<Req, Res>> = vec![
            Arc::new(RecoveryInterceptor::new()),
            Arc::new(CorrelationInterceptor::new()),
            Arc::new(MetadataInjectInterceptor::new(self.service_name.clone())),
            Arc::new(DeadlineInterceptor::new(self.config.timeout())),
        ];

        if self.config.debug || self.config.slow_time().is_some() {
            stages.push(Arc::new(DebugLogInterceptor::new(
                self.config.debug,
                self.config.slow_time(),
            )));
        }
        if self.config.tracer {
            stages.push(Arc::new(TracingInterceptor::client(Arc::clone(
                &self.correlator,
            ))));
        }
        if self.config.metrics {
            stages.push(Arc::new(MetricsInterceptor::new(
                self.service_name.clone(),
                Arc::clone(&self.recorder),
            )));
        }

        Pipeline::new(stages, terminal)
    }
}
