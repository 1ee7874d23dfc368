//! # Keryx
//!
//! **Microservice scaffolding core: composable call pipelines and proxy
//! chains**
//!
//! Keryx threads cross-cutting concerns - deadline control, metadata and
//! trace propagation, metrics capture, slow-call detection, panic
//! containment, and validation - around a single logical call, assembled
//! once from configuration and executed identically on every call.
//!
//! Two structurally related ideas make up the core:
//!
//! - the **unary-call pipeline** ([`pipeline`]): an ordered, immutable
//!   interceptor chain around a terminal handler, one per transport,
//!   built at startup and reused by every call
//! - the **proxy chain** ([`proxy`]): decorators over an externally
//!   supplied connection (HTTP transport, SQL handle, cache connection)
//!   that add one concern each without changing the connection's contract
//!
//! ## Quick Start
//!
//! ```
//! use keryx::config::PipelineConfig;
//! use keryx::core::{CallContext, KeryxResult};
//! use keryx::pipeline::{handler_fn, BoxFuture, ServerPipelineBuilder};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let config = PipelineConfig {
//!     metrics: true,
//!     ..Default::default()
//! };
//!
//! let pipeline = ServerPipelineBuilder::new("demo", config).build(Arc::new(handler_fn(
//!     |_ctx: &mut CallContext, name: String| {
//!         Box::pin(async move { Ok(format!("hello, {name}")) })
//!             as BoxFuture<'static, KeryxResult<String>>
//!     },
//! )));
//!
//! let mut ctx = CallContext::new("demo.Hello");
//! let greeting = pipeline.invoke(&mut ctx, "keryx".to_string()).await.unwrap();
//! assert_eq!(greeting, "hello, keryx");
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/keryx/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use keryx_core as core;

// Re-export the call pipeline
pub use keryx_pipeline as pipeline;

// Re-export proxy chains
pub use keryx_proxy as proxy;

// Re-export telemetry collaborators
pub use keryx_telemetry as telemetry;

// Re-export configuration
pub use keryx_config as config;

// Re-export the worker pool
pub use keryx_tasks as tasks;

/// Commonly used types, importable in one line.
pub mod prelude {
    pub use keryx_config::{KeryxConfig, PipelineConfig};
    pub use keryx_core::{keys, CallContext, ErrorKind, KeryxError, KeryxResult, MetaMap};
    pub use keryx_pipeline::{
        handler_fn, ClientPipelineBuilder, Handler, Interceptor, Next, Pipeline,
        ServerPipelineBuilder,
    };
    pub use keryx_proxy::{CacheConn, HttpTransport, ProxyChain, SqlConn};
    pub use keryx_telemetry::{MetricsRecorder, TraceCorrelator};
}
