//! Core interceptor trait and continuation types.
//!
//! This module defines the [`Interceptor`] trait that all pipeline stages
//! implement, and the [`Next`] continuation handed to each stage.
//!
//! # Design Philosophy
//!
//! An interceptor is a pure unit of cross-cutting behavior: given a call
//! context, a request, and the rest of the pipeline, it may inspect or
//! enrich the context, invoke the continuation zero or more times, inspect
//! the result, and return one. Anything an interceptor needs beyond that
//! (a timeout, a recorder handle) is captured at construction and read-only
//! afterwards, so one pipeline instance serves any number of concurrent
//! calls.
//!
//! # Example
//!
//! ```ignore
//! use keryx_pipeline::{BoxFuture, Interceptor, Next};
//! use keryx_core::{CallContext, KeryxResult};
//!
//! struct Timing;
//!
//! impl<Req: Send + 'static, Res: Send + 'static> Interceptor<Req, Res> for Timing {
//!     fn name(&self) -> &'static str {
//!         "timing"
//!     }
//!
//!     fn handle<'a>(
//!         &'a self,
//!         ctx: &'a mut CallContext,
//!         req: Req,
//!         next: Next<'a, Req, Res>,
//!     ) -> BoxFuture<'a, KeryxResult<Res>> {
//!         Box::pin(async move {
//!             let start = std::time::Instant::now();
//!             let result = next.run(ctx, req).await;
//!             tracing::debug!(elapsed = ?start.elapsed(), "call finished");
//!             result
//!         })
//!     }
//! }
//! ```

use keryx_core::{CallContext, KeryxResult};
use std::future::Future;
use std::pin::Pin;

/// A boxed future returning a call result.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The core interceptor trait.
///
/// # Invariants
///
/// - An interceptor receives its continuation by value; running it consumes
///   it, so each continuation executes at most once per call
/// - Not running the continuation short-circuits the remainder of the chain
/// - Interceptors must not hold mutable state shared across calls
pub trait Interceptor<Req, Res>: Send + Sync + 'static {
    /// Returns the unique name of this stage, used for logging and
    /// introspection.
    fn name(&self) -> &'static str;

    /// Processes the call through this stage.
    fn handle<'a>(
        &'a self,
        ctx: &'a mut CallContext,
        req: Req,
        next: Next<'a, Req, Res>,
    ) -> BoxFuture<'a, KeryxResult<Res>>;
}

/// The terminal handler at the end of a pipeline.
///
/// Transport adapters implement this over their native unary-handler
/// signature; tests implement it directly or through [`handler_fn`].
pub trait Handler<Req, Res>: Send + Sync + 'static {
    /// Handles the call.
    fn call<'a>(&'a self, ctx: &'a mut CallContext, req: Req) -> BoxFuture<'a, KeryxResult<Res>>;
}

/// Wraps a function as a [`Handler`].
///
/// The function receives the context synchronously and returns the response
/// future, mirroring how transport adapters capture what they need from the
/// context before going async.
pub fn handler_fn<F>(f: F) -> HandlerFn<F> {
    HandlerFn { f }
}

/// A function-based [`Handler`], created by [`handler_fn`].
pub struct HandlerFn<F> {
    f: F,
}

impl<Req, Res, F, Fut> Handler<Req, Res> for HandlerFn<F>
where
    Req: Send + 'static,
    Res: Send + 'static,
    F: Fn(&mut CallContext, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = KeryxResult<Res>> + Send + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut CallContext, req: Req) -> BoxFuture<'a, KeryxResult<Res>> {
        Box::pin((self.f)(ctx, req))
    }
}

/// The continuation handed to an interceptor: the remainder of the pipeline.
///
/// Running it consumes it, so it can execute at most once. An interceptor
/// that returns without running it short-circuits the chain.
pub struct Next<'a, Req, Res> {
    inner: NextInner<'a, Req, Res>,
}

enum NextInner<'a, Req, Res> {
    /// More interceptors to process.
    Chain {
        interceptor: &'a dyn Interceptor<Req, Res>,
        next: Box<Next<'a, Req, Res>>,
    },
    /// End of chain - invoke the terminal handler.
    Terminal(&'a dyn Handler<Req, Res>),
}

impl<'a, Req, Res> Next<'a, Req, Res>
where
    Req: Send + 'static,
    Res: Send + 'static,
{
    /// Creates a `Next` that will invoke the given interceptor.
    pub(crate) fn new(interceptor: &'a dyn Interceptor<Req, Res>, next: Next<'a, Req, Res>) -> Self {
        Self {
            inner: NextInner::Chain {
                interceptor,
                next: Box::new(next),
            },
        }
    }

    /// Creates a terminal `Next` that invokes the handler.
    pub(crate) fn terminal(handler: &'a dyn Handler<Req, Res>) -> Self {
        Self {
            inner: NextInner::Terminal(handler),
        }
    }

    /// Invokes the next interceptor or the terminal handler.
    ///
    /// Consumes `self` so the continuation runs at most once.
    pub async fn run(self, ctx: &mut CallContext, req: Req) -> KeryxResult<Res> {
        match self.inner {
            NextInner::Chain { interceptor, next } => interceptor.handle(ctx, req, *next).await,
            NextInner::Terminal(handler) => handler.call(ctx, req).await,
        }
    }
}

/// An interceptor created from a function.
///
/// Useful for small one-off stages and in tests.
///
/// # Example
///
/// ```ignore
/// let stage = FnInterceptor::new("audit", |ctx, req, next| {
///     Box::pin(async move {
///         tracing::info!(method = ctx.method_name(), "inbound");
///         next.run(ctx, req).await
///     })
/// });
/// ```
pub struct FnInterceptor<F> {
    name: &'static str,
    f: F,
}

impl<F> FnInterceptor<F> {
    /// Creates a new function-based interceptor.
    pub const fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }
}

impl<Req, Res, F> Interceptor<Req, Res> for FnInterceptor<F>
where
    Req: Send + 'static,
    Res: Send + 'static,
    F: for<'a> Fn(
            &'a mut CallContext,
            Req,
            Next<'a, Req, Res>,
        ) -> BoxFuture<'a, KeryxResult<Res>>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut CallContext,
        req: Req,
        next: Next<'a, Req, Res>,
    ) -> BoxFuture<'a, KeryxResult<Res>> {
        (self.f)(ctx, req, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_handler() -> impl Handler<u32, u32> {
        handler_fn(|_ctx: &mut CallContext, req: u32| {
            Box::pin(async move { Ok(req + 1) }) as BoxFuture<'static, KeryxResult<u32>>
        })
    }

    #[tokio::test]
    async fn test_terminal_next_runs_handler() {
        let handler = ok_handler();
        let mut ctx = CallContext::new("svc.Add");

        let next = Next::terminal(&handler);
        assert_eq!(next.run(&mut ctx, 41).await.unwrap(), 42);
    }

    fn tagging_stage<'a>(
        ctx: &'a mut CallContext,
        req: u32,
        next: Next<'a, u32, u32>,
    ) -> BoxFuture<'a, KeryxResult<u32>> {
        Box::pin(async move {
            ctx.set_attr("seen", 1_i64);
            next.run(ctx, req).await
        })
    }

    fn halting_stage<'a>(
        _ctx: &'a mut CallContext,
        _req: u32,
        _next: Next<'a, u32, u32>,
    ) -> BoxFuture<'a, KeryxResult<u32>> {
        Box::pin(async move { Err(keryx_core::KeryxError::invalid_argument("halted")) })
    }

    #[tokio::test]
    async fn test_fn_interceptor_wraps_handler() {
        let stage = FnInterceptor::new("tag", tagging_stage);

        let handler = ok_handler();
        let mut ctx = CallContext::new("svc.Add");

        let next = Next::new(&stage, Next::terminal(&handler));
        assert_eq!(next.run(&mut ctx, 1).await.unwrap(), 2);
        assert_eq!(ctx.attr_i64("seen"), Some(1));
    }

    #[tokio::test]
    async fn test_short_circuit_skips_handler() {
        let stage = FnInterceptor::new("halt", halting_stage);

        let handler = ok_handler();
        let mut ctx = CallContext::new("svc.Add");

        let next = Next::new(&stage, Next::terminal(&handler));
        let err = next.run(&mut ctx, 1).await.unwrap_err();
        assert_eq!(err.kind(), keryx_core::ErrorKind::InvalidArgument);
    }
}
