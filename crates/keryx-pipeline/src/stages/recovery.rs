//! Panic recovery stage.
//!
//! Always present and always outermost. A panic anywhere beneath it - any
//! inner stage or the terminal handler - is caught, logged with a bounded
//! stack capture, and converted into [`KeryxError::Unknown`] carrying the
//! panic value's string form. The calling task keeps running; a single
//! call's failure never takes the process down.
//!
//! This is the only place a non-error failure becomes an error. Everything
//! inside the pipeline should prefer explicit `Result` returns; recovery is
//! the last-resort safety net.

use crate::interceptor::{BoxFuture, Interceptor, Next};
use futures_util::FutureExt;
use keryx_core::{CallContext, KeryxError, KeryxResult};
use std::any::Any;
use std::panic::AssertUnwindSafe;

/// How many backtrace lines to keep when logging a recovered panic.
const BACKTRACE_LINES: usize = 12;

/// Interceptor that contains panics from inner stages and the terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecoveryInterceptor;

impl RecoveryInterceptor {
    /// Creates a new recovery interceptor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl<Req, Res> Interceptor<Req, Res> for RecoveryInterceptor
where
    Req: Send + 'static,
    Res: Send + 'static,
{
    fn name(&self) -> &'static str {
        "recovery"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut CallContext,
        req: Req,
        next: Next<'a, Req, Res>,
    ) -> BoxFuture<'a, KeryxResult<Res>> {
        Box::pin(async move {
            let method = ctx.method_name().to_string();
            match AssertUnwindSafe(next.run(ctx, req)).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    tracing::error!(
                        method = %method,
                        panic = %message,
                        stack = %bounded_backtrace(),
                        "recovered panic in call pipeline"
                    );
                    Err(KeryxError::unknown(message))
                }
            }
        })
    }
}

/// Renders a panic payload as a string.
///
/// `&str` and `String` payloads (the overwhelmingly common cases) are kept
/// verbatim; anything else is opaque to us.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

/// Captures a backtrace truncated to a handful of frames.
fn bounded_backtrace() -> String {
    let backtrace = std::backtrace::Backtrace::force_capture().to_string();
    let mut lines: Vec<&str> = backtrace.lines().take(BACKTRACE_LINES).collect();
    if backtrace.lines().count() > BACKTRACE_LINES {
        lines.push("...");
    }
    lines.join("\n")
}
