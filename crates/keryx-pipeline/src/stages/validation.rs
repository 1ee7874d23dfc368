//! Request validation stage (server inbound only).
//!
//! Runs the configured structural validator against the request value. On
//! failure the stage returns [`KeryxError::InvalidArgument`] and does not
//! run its continuation, so an invalid request never reaches the terminal
//! handler.

use crate::interceptor::{BoxFuture, Interceptor, Next};
use keryx_core::{CallContext, KeryxError, KeryxResult, Validator};
use std::sync::Arc;

/// Interceptor that validates inbound requests before the handler.
pub struct ValidationInterceptor<Req> {
    validator: Arc<dyn Validator<Req>>,
}

impl<Req> ValidationInterceptor<Req> {
    /// Creates a validation stage around a validator.
    #[must_use]
    pub fn new(validator: Arc<dyn Validator<Req>>) -> Self {
        Self { validator }
    }
}

impl<Req, Res> Interceptor<Req, Res> for ValidationInterceptor<Req>
where
    Req: Send + 'static,
    Res: Send + 'static,
{
    fn name(&self) -> &'static str {
        "validation"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut CallContext,
        req: Req,
        next: Next<'a, Req, Res>,
    ) -> BoxFuture<'a, KeryxResult<Res>> {
        Box::pin(async move {
            match self.validator.validate(&req) {
                Ok(()) => next.run(ctx, req).await,
                Err(field_errors) => {
                    tracing::debug!(
                        method = ctx.method_name(),
                        fields = field_errors.len(),
                        "request rejected by validation"
                    );
                    Err(KeryxError::invalid_argument_with_fields(
                        format!("request validation failed for {}", ctx.method_name()),
                        field_errors,
                    ))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interceptor::{handler_fn, Handler};
    use keryx_core::{ErrorKind, FieldLookup, RequiredFields};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Transfer {
        merchant_id: String,
    }

    impl FieldLookup for Transfer {
        fn field(&self, name: &str) -> Option<&str> {
            (name == "merchant_id").then_some(self.merchant_id.as_str())
        }
    }

    fn counting_terminal(hits: Arc<AtomicUsize>) -> impl Handler<Transfer, u32> {
        handler_fn(move |_ctx: &mut CallContext, _req: Transfer| {
            hits.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { Ok(1u32) }) as BoxFuture<'static, KeryxResult<u32>>
        })
    }

    #[tokio::test]
    async fn test_valid_request_reaches_handler() {
        let hits = Arc::new(AtomicUsize::new(0));
        let stage: ValidationInterceptor<Transfer> =
            ValidationInterceptor::new(Arc::new(RequiredFields::new(["merchant_id"])));
        let terminal = counting_terminal(Arc::clone(&hits));
        let mut ctx = CallContext::new("pay.Transfer");

        let next = Next::new(&stage, Next::terminal(&terminal));
        let req = Transfer {
            merchant_id: "m-1".into(),
        };
        assert_eq!(next.run(&mut ctx, req).await.unwrap(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_request_short_circuits() {
        let hits = Arc::new(AtomicUsize::new(0));
        let stage: ValidationInterceptor<Transfer> =
            ValidationInterceptor::new(Arc::new(RequiredFields::new(["merchant_id"])));
        let terminal = counting_terminal(Arc::clone(&hits));
        let mut ctx = CallContext::new("pay.Transfer");

        let next = Next::new(&stage, Next::terminal(&terminal));
        let req = Transfer {
            merchant_id: String::new(),
        };
        let err = next.run(&mut ctx, req).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(hits.load(Ordering::SeqCst), 0, "handler must not run");
    }
}
