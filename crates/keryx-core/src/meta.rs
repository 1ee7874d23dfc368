//! Metadata carrier types.
//!
//! [`MetaMap`] is the case-insensitive, string-keyed, multi-valued map that
//! mirrors transport-level metadata (HTTP headers, RPC metadata). Transport
//! adapters fill one from the wire on the way in; the client metadata stage
//! fills one on the way out.

use crate::context::CallContext;
use std::collections::HashMap;

/// Recognized metadata keys.
///
/// Keys are lowercase so the same constants work for HTTP headers and RPC
/// metadata alike.
pub mod keys {
    /// Originating application id.
    pub const APP_ID: &str = "app-id";
    /// Terminal number.
    pub const TERM_NO: &str = "term-no";
    /// Merchant id.
    pub const MERCHANT_ID: &str = "merchant-id";
    /// Product code.
    pub const PRODUCT_CODE: &str = "product-code";
    /// Transaction code.
    pub const TRANSACTION_CODE: &str = "transaction-code";
    /// Transaction sequence number.
    pub const TRANSACTION_SEQ: &str = "transaction-seq";
    /// Calling system id.
    pub const SRC_SYSTEM_ID: &str = "src-system-id";
    /// Destination system id.
    pub const DST_SYSTEM_ID: &str = "dst-system-id";
    /// Trace correlation id.
    pub const TRACE_ID: &str = "trace-id";
    /// Transport protocol kind, [`PROTOCOL_RPC`] or [`PROTOCOL_HTTP`].
    pub const PROTOCOL: &str = "protocol";
    /// Logical service name.
    pub const SERVICE_NAME: &str = "service-name";
    /// Response status code.
    pub const STATUS_CODE: &str = "status-code";

    /// Protocol value for RPC transports.
    pub const PROTOCOL_RPC: &str = "rpc";
    /// Protocol value for HTTP transports.
    pub const PROTOCOL_HTTP: &str = "http";

    /// The keys the client metadata stage propagates into outbound metadata.
    pub const PROPAGATED: &[&str] = &[
        APP_ID,
        TERM_NO,
        MERCHANT_ID,
        PRODUCT_CODE,
        TRANSACTION_CODE,
        TRANSACTION_SEQ,
        SRC_SYSTEM_ID,
        DST_SYSTEM_ID,
        TRACE_ID,
    ];
}

/// A case-insensitive, multi-valued metadata map.
///
/// # Example
///
/// ```
/// use keryx_core::{keys, MetaMap};
///
/// let mut md = MetaMap::new();
/// md.insert(keys::APP_ID, "acq-001");
/// md.append("Accept", "text/plain");
/// md.append("accept", "application/json");
///
/// assert_eq!(md.get(keys::APP_ID), Some("acq-001"));
/// assert_eq!(md.get_all("ACCEPT").len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaMap {
    entries: HashMap<String, Vec<String>>,
}

impl MetaMap {
    /// Creates an empty metadata map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the values under `key` with a single value.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.entries
            .insert(key.to_ascii_lowercase(), vec![value.into()]);
    }

    /// Appends a value under `key`, keeping existing values.
    pub fn append(&mut self, key: &str, value: impl Into<String>) {
        self.entries
            .entry(key.to_ascii_lowercase())
            .or_default()
            .push(value.into());
    }

    /// Returns the first value under `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&key.to_ascii_lowercase())
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    /// Returns all values under `key`. Missing keys yield an empty slice.
    #[must_use]
    pub fn get_all(&self, key: &str) -> &[String] {
        self.entries
            .get(&key.to_ascii_lowercase())
            .map_or(&[], Vec::as_slice)
    }

    /// Checks whether `key` is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(&key.to_ascii_lowercase())
    }

    /// Merges `other` into `self`, keeping existing keys.
    ///
    /// Keys already present in `self` win; this mirrors how inbound
    /// transport metadata is merged without clobbering values an earlier
    /// stage already set.
    pub fn merge(&mut self, other: &MetaMap) {
        for (k, v) in &other.entries {
            self.entries.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }

    /// Returns the number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks whether the map has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(key, values)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Copies each key's first value into `ctx` as a string attribute,
    /// skipping keys the context already carries.
    pub fn extract_into(&self, ctx: &mut CallContext) {
        for (key, values) in &self.entries {
            if ctx.contains_attr(key) {
                continue;
            }
            if let Some(first) = values.first() {
                ctx.set_attr(key, first.as_str());
            }
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MetaMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut md = Self::new();
        for (k, v) in iter {
            md.append(&k.into(), v);
        }
        md
    }
}
