//! # Keryx Pipeline
//!
//! The composable unary-call pipeline of the Keryx toolkit.
//!
//! A transport (RPC server, RPC client, HTTP middleware layer) constructs
//! one [`Pipeline`] at startup from a typed configuration and reuses it
//! for every call; per-call state lives only in the
//! [`CallContext`](keryx_core::CallContext) and in the continuation chain
//! created for that single invocation.
//!
//! ## Canonical stage order
//!
//! ```text
//! recovery → correlation → metadata → deadline → debug_log → validation → tracing → metrics → handler
//! ```
//!
//! Configuration gates which optional stages are present; it never changes
//! their relative order. Recovery is always outermost, so a panic anywhere
//! beneath it becomes a normal error instead of crashing the process.
//!
//! ## Example
//!
//! ```
//! use keryx_config::PipelineConfig;
//! use keryx_core::{CallContext, KeryxResult};
//! use keryx_pipeline::{handler_fn, BoxFuture, ServerPipelineBuilder};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let pipeline = ServerPipelineBuilder::new("demo", PipelineConfig::default()).build(
//!     Arc::new(handler_fn(|_ctx: &mut CallContext, req: u32| {
//!         Box::pin(async move { Ok(req * 2) }) as BoxFuture<'static, KeryxResult<u32>>
//!     })),
//! );
//!
//! let mut ctx = CallContext::new("demo.Double");
//! assert_eq!(pipeline.invoke(&mut ctx, 21).await.unwrap(), 42);
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/keryx-pipeline/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod builder;
mod interceptor;
mod pipeline;
pub mod stages;

pub use builder::{ClientPipelineBuilder, ServerPipelineBuilder};
pub use interceptor::{handler_fn, BoxFuture, FnInterceptor, Handler, HandlerFn, Interceptor, Next};
pub use pipeline::{BoxedInterceptor, Pipeline};
