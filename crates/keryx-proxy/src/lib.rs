//! # Keryx Proxy
//!
//! Proxy/decorator chains for instrumenting externally supplied client
//! connections without changing their public contract.
//!
//! The assembly algorithm is expressed once, generically, in
//! [`ProxyChain`]; the capability interfaces it decorates are:
//!
//! - [`HttpTransport`] - HTTP round-trips
//! - [`SqlConn`] - SQL-like connections (`exec`, `query`, `query_row`,
//!   `prepare`, `begin`/`begin_tx`, `close`)
//! - [`CacheConn`] - command-oriented cache connections (`command`,
//!   `close`)
//!
//! Each node performs exactly one concern (timing/slow-call detection, a
//! trace span, metrics, stub substitution) and forwards every capability
//! method to its next delegate, never swallowing the underlying error.

#![doc(html_root_url = "https://docs.rs/keryx-proxy/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod cache;
mod chain;
mod http;
mod sql;

pub use cache::{CacheConn, CacheValue, MetricsCacheConn, TimingCacheConn, TracingCacheConn};
pub use chain::{log_slow_call_hook, BoxFuture, NodeFactory, ProxyChain, SlowCallHook};
pub use self::http::{
    HttpRequest, HttpResponse, HttpTransport, MetricsHttpTransport, StubHttpTransport,
    TimingHttpTransport, TracingHttpTransport,
};
pub use sql::{
    ExecResult, MetricsSqlConn, SqlConn, SqlRow, SqlValue, StatementId, TimingSqlConn,
    TracingSqlConn, TxId, TxOptions,
};
