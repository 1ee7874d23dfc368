//! Metadata extraction and injection stages.
//!
//! The server side decodes transport-level metadata into call-context
//! attributes; the client side serializes the propagated attribute set into
//! outbound metadata, falling back to process-wide defaults (the local
//! service name) when a field is blank.

use crate::interceptor::{BoxFuture, Interceptor, Next};
use crate::stages::correlation::new_trace_id;
use keryx_core::{keys, CallContext, KeryxResult};

fn has_key(set: &[(&str, String)], key: &str) -> bool {
    set.iter().any(|(k, _)| *k == key)
}

/// Server-side stage: inbound metadata becomes context attributes.
///
/// Attributes already present on the context win; the wire never overrides
/// what an earlier stage or the transport adapter set explicitly.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataExtractInterceptor;

impl MetadataExtractInterceptor {
    /// Creates a new extraction interceptor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl<Req, Res> Interceptor<Req, Res> for MetadataExtractInterceptor
where
    Req: Send + 'static,
    Res: Send + 'static,
{
    fn name(&self) -> &'static str {
        "metadata_extract"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut CallContext,
        req: Req,
        next: Next<'a, Req, Res>,
    ) -> BoxFuture<'a, KeryxResult<Res>> {
        Box::pin(async move {
            let inbound = ctx.metadata().clone();
            inbound.extract_into(ctx);
            next.run(ctx, req).await
        })
    }
}

/// Client-side stage: context attributes become outbound metadata.
#[derive(Debug, Clone)]
pub struct MetadataInjectInterceptor {
    /// Local service name, the fallback for blank system ids.
    service_name: String,
}

impl MetadataInjectInterceptor {
    /// Creates an injection interceptor with the local service name.
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }
}

impl<Req, Res> Interceptor<Req, Res> for MetadataInjectInterceptor
where
    Req: Send + 'static,
    Res: Send + 'static,
{
    fn name(&self) -> &'static str {
        "metadata_inject"
    }

    fn handle<'a>(
        &'a self,
        ctx: &'a mut CallContext,
        req: Req,
        next: Next<'a, Req, Res>,
    ) -> BoxFuture<'a, KeryxResult<Res>> {
        Box::pin(async move {
            let mut propagated: Vec<(&'static str, String)> = Vec::new();
            for key in keys::PROPAGATED {
                if let Some(value) = ctx.attr_str(key) {
                    if !value.is_empty() {
                        propagated.push((key, value.to_string()));
                    }
                }
            }

            if !has_key(&propagated, keys::SRC_SYSTEM_ID) {
                propagated.push((keys::SRC_SYSTEM_ID, self.service_name.clone()));
            }
            if !has_key(&propagated, keys::DST_SYSTEM_ID) {
                propagated.push((keys::DST_SYSTEM_ID, self.service_name.clone()));
            }
            if !has_key(&propagated, keys::TRACE_ID) {
                let trace_id = match ctx.trace_id() {
                    Some(id) => id.to_string(),
                    None => {
                        let id = new_trace_id();
                        ctx.set_trace_id(id.clone());
                        id
                    }
                };
                propagated.push((keys::TRACE_ID, trace_id));
            }

            let outbound = ctx.outbound_mut();
            for (key, value) in propagated {
                outbound.insert(key, value);
            }
            outbound.insert(keys::PROTOCOL, keys::PROTOCOL_RPC);

            next.run(ctx, req).await
        })
    }
}
