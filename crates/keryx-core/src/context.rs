//! Per-call context types.
//!
//! The [`CallContext`] carries all per-call state through the interceptor
//! pipeline and into the terminal handler. It is created at the start of an
//! inbound or outbound call and discarded at its end; pipelines themselves
//! hold no per-call state.

use crate::meta::MetaMap;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// An attribute value stored in a [`CallContext`].
///
/// Attributes mirror transport metadata, which carries either strings or
/// 64-bit integers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// A string attribute.
    Str(String),
    /// A signed 64-bit integer attribute.
    I64(i64),
}

impl AttrValue {
    /// Returns the string form, if this is a string attribute.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::I64(_) => None,
        }
    }

    /// Returns the integer form, if this is an integer attribute.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::I64(v) => Some(*v),
            Self::Str(_) => None,
        }
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

/// Context that flows through the call pipeline.
///
/// Each invocation owns its own `CallContext`; two concurrent calls through
/// the same pipeline never share one. Stages enrich the context as the call
/// descends (trace id from the correlation stage, attributes from the
/// metadata stage, a derived deadline from the deadline stage).
///
/// Attribute keys are case-normalized (ASCII lowercase) on insert and
/// lookup, and lookups on missing keys return `None` rather than panicking.
///
/// # Example
///
/// ```
/// use keryx_core::CallContext;
///
/// let mut ctx = CallContext::new("user.Get");
/// ctx.set_attr("App-Id", "acq-001");
///
/// assert_eq!(ctx.attr_str("app-id"), Some("acq-001"));
/// assert_eq!(ctx.attr_str("absent"), None);
/// ```
#[derive(Debug, Clone)]
pub struct CallContext {
    /// Fully qualified method name for this call (e.g. `user.Get`).
    method_name: String,

    /// Trace correlation id, once assigned.
    trace_id: Option<String>,

    /// Absolute deadline for this call, if any.
    deadline: Option<Instant>,

    /// Case-normalized metadata attributes.
    attributes: HashMap<String, AttrValue>,

    /// Inbound transport metadata, as filled by the transport adapter.
    metadata: MetaMap,

    /// Outbound transport metadata, as filled by client-side stages.
    outbound: MetaMap,

    /// When the call started processing.
    started_at: Instant,
}

impl CallContext {
    /// Creates a new context for a call to `method_name`.
    #[must_use]
    pub fn new(method_name: impl Into<String>) -> Self {
        Self {
            method_name: method_name.into(),
            trace_id: None,
            deadline: None,
            attributes: HashMap::new(),
            metadata: MetaMap::new(),
            outbound: MetaMap::new(),
            started_at: Instant::now(),
        }
    }

    /// Creates a context carrying inbound transport metadata.
    ///
    /// Transport adapters use this on the server side so the metadata and
    /// tracing stages can read the wire-level carrier.
    #[must_use]
    pub fn with_metadata(method_name: impl Into<String>, metadata: MetaMap) -> Self {
        let mut ctx = Self::new(method_name);
        ctx.metadata = metadata;
        ctx
    }

    /// Returns the inbound transport metadata.
    #[must_use]
    pub fn metadata(&self) -> &MetaMap {
        &self.metadata
    }

    /// Returns the outbound transport metadata.
    ///
    /// Client transport adapters serialize this onto the wire after the
    /// pipeline returns.
    #[must_use]
    pub fn outbound(&self) -> &MetaMap {
        &self.outbound
    }

    /// Returns the outbound transport metadata for writing.
    ///
    /// This should only be used by client-side stages.
    pub fn outbound_mut(&mut self) -> &mut MetaMap {
        &mut self.outbound
    }

    /// Returns the method name for this call.
    #[must_use]
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    /// Returns the trace id, if one has been assigned.
    #[must_use]
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Sets the trace id.
    ///
    /// This should only be called by the correlation stage.
    pub fn set_trace_id(&mut self, trace_id: impl Into<String>) {
        self.trace_id = Some(trace_id.into());
    }

    /// Returns the absolute deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Sets the absolute deadline.
    ///
    /// This should only be called by the transport adapter (inbound
    /// deadline) or the deadline stage (derived deadline).
    pub fn set_deadline(&mut self, deadline: Instant) {
        self.deadline = Some(deadline);
    }

    /// Returns the remaining time until the deadline, saturating at zero.
    ///
    /// Returns `None` when no deadline is set.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|dl| dl.saturating_duration_since(Instant::now()))
    }

    /// Stores an attribute under a case-normalized key.
    pub fn set_attr(&mut self, key: &str, value: impl Into<AttrValue>) {
        self.attributes
            .insert(key.to_ascii_lowercase(), value.into());
    }

    /// Returns the attribute stored under `key`, if any.
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attributes.get(&key.to_ascii_lowercase())
    }

    /// Returns the string attribute stored under `key`, if any.
    #[must_use]
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attr(key).and_then(AttrValue::as_str)
    }

    /// Returns the integer attribute stored under `key`, if any.
    #[must_use]
    pub fn attr_i64(&self, key: &str) -> Option<i64> {
        self.attr(key).and_then(AttrValue::as_i64)
    }

    /// Checks whether an attribute exists under `key`.
    #[must_use]
    pub fn contains_attr(&self, key: &str) -> bool {
        self.attributes.contains_key(&key.to_ascii_lowercase())
    }

    /// Iterates over all attributes.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Derives a child context.
    ///
    /// The child starts with a copy of the parent's state and may add
    /// attributes without mutating the parent (copy-on-write at derive
    /// time). The deadline and trace id carry over.
    #[must_use]
    pub fn child(&self) -> Self {
        self.clone()
    }

    /// Returns when the call started processing.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the elapsed time since the call started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}
