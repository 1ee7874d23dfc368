//! The unary-call pipeline.
//!
//! A [`Pipeline`] is an ordered, immutable list of interceptors plus the
//! terminal handler. It is built once, at startup, and reused for every
//! call; the per-call continuation chain is constructed fresh from the
//! immutable interceptor list on each [`invoke`](Pipeline::invoke), so a
//! single pipeline is safe for concurrent use and two calls never share
//! per-call state.

use crate::interceptor::{Handler, Interceptor, Next};
use keryx_core::{CallContext, KeryxResult};
use std::sync::Arc;

/// A type-erased interceptor that can be stored in a pipeline.
pub type BoxedInterceptor<Req, Res> = Arc<dyn Interceptor<Req, Res>>;

/// An ordered, immutable interceptor chain around a terminal handler.
///
/// # Example
///
/// ```ignore
/// let pipeline = ServerPipelineBuilder::new("pay-core", config)
///     .build(Arc::new(handler));
///
/// let mut ctx = CallContext::with_metadata("pay.Authorize", inbound_md);
/// let response = pipeline.invoke(&mut ctx, request).await?;
/// ```
pub struct Pipeline<Req, Res> {
    interceptors: Vec<BoxedInterceptor<Req, Res>>,
    terminal: Arc<dyn Handler<Req, Res>>,
}

impl<Req, Res> Pipeline<Req, Res>
where
    Req: Send + 'static,
    Res: Send + 'static,
{
    /// Creates a pipeline from an interceptor list and a terminal handler.
    ///
    /// The list is fixed from here on; builders are responsible for
    /// assembling it in the canonical stage order.
    #[must_use]
    pub fn new(
        interceptors: Vec<BoxedInterceptor<Req, Res>>,
        terminal: Arc<dyn Handler<Req, Res>>,
    ) -> Self {
        Self {
            interceptors,
            terminal,
        }
    }

    /// Invokes the call through every interceptor and the terminal handler.
    ///
    /// The continuation chain is nested back to front: the last interceptor
    /// wraps the terminal, the first wraps everything. Each interceptor
    /// therefore runs at most once per call, in declared order, and an
    /// interceptor that skips its continuation short-circuits the rest.
    pub async fn invoke(&self, ctx: &mut CallContext, req: Req) -> KeryxResult<Res> {
        let mut next = Next::terminal(self.terminal.as_ref());
        for interceptor in self.interceptors.iter().rev() {
            next = Next::new(interceptor.as_ref(), next);
        }
        next.run(ctx, req).await
    }

    /// Returns the names of all stages in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    /// Returns the number of interceptor stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.interceptors.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interceptor::{handler_fn, BoxFuture};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// An interceptor that records its name before and after delegating.
    struct OrderTrackingInterceptor {
        name: &'static str,
        order: Arc<Mutex<Vec<String>>>,
    }

    impl Interceptor<u32, u32> for OrderTrackingInterceptor {
        fn name(&self) -> &'static str {
            self.name
        }

        fn handle<'a>(
            &'a self,
            ctx: &'a mut CallContext,
            req: u32,
            next: Next<'a, u32, u32>,
        ) -> BoxFuture<'a, KeryxResult<u32>> {
            Box::pin(async move {
                self.order.lock().push(format!("{}:before", self.name));
                let result = next.run(ctx, req).await;
                self.order.lock().push(format!("{}:after", self.name));
                result
            })
        }
    }

    fn recording_stage(
        name: &'static str,
        order: Arc<Mutex<Vec<String>>>,
    ) -> OrderTrackingInterceptor {
        OrderTrackingInterceptor { name, order }
    }

    fn echo_terminal() -> Arc<dyn Handler<u32, u32>> {
        Arc::new(handler_fn(|_ctx: &mut CallContext, req: u32| {
            Box::pin(async move { Ok(req) }) as BoxFuture<'static, KeryxResult<u32>>
        }))
    }

    #[tokio::test]
    async fn test_stages_execute_in_declared_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new(
            vec![
                Arc::new(recording_stage("first", Arc::clone(&order))),
                Arc::new(recording_stage("second", Arc::clone(&order))),
            ],
            echo_terminal(),
        );

        let mut ctx = CallContext::new("svc.Echo");
        assert_eq!(pipeline.invoke(&mut ctx, 7).await.unwrap(), 7);

        let seen = order.lock();
        assert_eq!(
            *seen,
            vec!["first:before", "second:before", "second:after", "first:after"]
        );
    }

    #[tokio::test]
    async fn test_empty_pipeline_runs_terminal() {
        let pipeline = Pipeline::new(Vec::new(), echo_terminal());
        let mut ctx = CallContext::new("svc.Echo");
        assert_eq!(pipeline.invoke(&mut ctx, 3).await.unwrap(), 3);
        assert_eq!(pipeline.stage_count(), 0);
    }

    #[tokio::test]
    async fn test_pipeline_is_reusable_across_calls() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_inner = Arc::clone(&calls);

        let pipeline = Arc::new(Pipeline::new(
            Vec::new(),
            Arc::new(handler_fn(move |_ctx: &mut CallContext, req: u32| {
                calls_inner.fetch_add(1, Ordering::SeqCst);
                Box::pin(async move { Ok(req * 2) }) as BoxFuture<'static, KeryxResult<u32>>
            })),
        ));

        let mut handles = Vec::new();
        for i in 0..8_u32 {
            let pipeline = Arc::clone(&pipeline);
            handles.push(tokio::spawn(async move {
                let mut ctx = CallContext::new("svc.Double");
                pipeline.invoke(&mut ctx, i).await.unwrap()
            }));
        }

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.await.unwrap(), (i as u32) * 2);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 8);
    }

    #[tokio::test]
    async fn test_stage_names_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new(
            vec![
                Arc::new(recording_stage("outer", Arc::clone(&order))),
                Arc::new(recording_stage("inner", Arc::clone(&order))),
            ],
            echo_terminal(),
        );

        assert_eq!(pipeline.stage_names(), vec!["outer", "inner"]);
        assert_eq!(pipeline.stage_count(), 2);
    }
}
