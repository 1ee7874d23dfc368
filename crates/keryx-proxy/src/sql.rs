//! SQL-like capability and its proxy nodes.
//!
//! [`SqlConn`] is the shared contract between an externally supplied
//! database handle and its decorators: `exec`, `query`, `query_row`,
//! `prepare`, `begin`/`begin_tx`, `close`. SQL framing and the pool
//! beneath the terminal connection are out of scope; the value types here
//! are the minimum the decorators need to pass through.
//!
//! Statement-shaped operations (`exec`, `query`, `query_row`, `prepare`)
//! get timed and traced; lifecycle operations (`begin`, `begin_tx`,
//! `close`) forward untouched. `close` reaches the terminal exactly once
//! per call and a double close must not panic.

use crate::chain::{BoxFuture, SlowCallHook};
use keryx_core::KeryxResult;
use keryx_telemetry::{metric_names, MetricsRecorder, Span as _, TraceCorrelator};
use std::sync::Arc;
use std::time::Instant;

/// A parameter or column value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL NULL.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    I64(i64),
    /// A double-precision float.
    F64(f64),
    /// A text value.
    Str(String),
    /// A binary value.
    Bytes(Vec<u8>),
}

/// One result row: column names aligned with values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlRow {
    /// Column names, in select order.
    pub columns: Vec<String>,
    /// Column values, aligned with [`columns`](Self::columns).
    pub values: Vec<SqlValue>,
}

/// Outcome of an `exec`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecResult {
    /// Rows affected by the statement.
    pub rows_affected: u64,
    /// Last insert id, when the driver reports one.
    pub last_insert_id: Option<i64>,
}

/// Handle to a prepared statement on the terminal connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatementId(pub u64);

/// Handle to an open transaction on the terminal connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxId(pub u64);

/// Options for [`SqlConn::begin_tx`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TxOptions {
    /// Open the transaction read-only.
    pub read_only: bool,
}

/// Capability interface for a SQL-like connection.
pub trait SqlConn: Send + Sync + 'static {
    /// Executes a statement, returning the affected-row count.
    fn exec<'a>(
        &'a self,
        query: &'a str,
        params: &'a [SqlValue],
    ) -> BoxFuture<'a, KeryxResult<ExecResult>>;

    /// Runs a query, returning all rows.
    fn query<'a>(
        &'a self,
        query: &'a str,
        params: &'a [SqlValue],
    ) -> BoxFuture<'a, KeryxResult<Vec<SqlRow>>>;

    /// Runs a query, returning the first row if any.
    fn query_row<'a>(
        &'a self,
        query: &'a str,
        params: &'a [SqlValue],
    ) -> BoxFuture<'a, KeryxResult<Option<SqlRow>>>;

    /// Prepares a statement.
    fn prepare<'a>(&'a self, query: &'a str) -> BoxFuture<'a, KeryxResult<StatementId>>;

    /// Begins a transaction with default options.
    fn begin<'a>(&'a self) -> BoxFuture<'a, KeryxResult<TxId>>;

    /// Begins a transaction with explicit options.
    fn begin_tx<'a>(&'a self, opts: TxOptions) -> BoxFuture<'a, KeryxResult<TxId>>;

    /// Closes the connection.
    fn close<'a>(&'a self) -> BoxFuture<'a, KeryxResult<()>>;
}

/// Node that times statement operations and fires the slow-call hook.
pub struct TimingSqlConn {
    threshold: std::time::Duration,
    hook: SlowCallHook,
    next: Arc<dyn SqlConn>,
}

impl TimingSqlConn {
    /// Creates a timing node in front of `next`.
    #[must_use]
    pub fn new(
        threshold: std::time::Duration,
        hook: SlowCallHook,
        next: Arc<dyn SqlConn>,
    ) -> Self {
        Self {
            threshold,
            hook,
            next,
        }
    }

    fn after(&self, query: &str, start: Instant) {
        let elapsed = start.elapsed();
        if elapsed > self.threshold {
            (self.hook)(query, elapsed);
        }
    }
}

impl SqlConn for TimingSqlConn {
    fn exec<'a>(
        &'a self,
        query: &'a str,
        params: &'a [SqlValue],
    ) -> BoxFuture<'a, KeryxResult<ExecResult>> {
        Box::pin(async move {
            let start = Instant::now();
            let result = self.next.exec(query, params).await;
            self.after(query, start);
            result
        })
    }

    fn query<'a>(
        &'a self,
        query: &'a str,
        params: &'a [SqlValue],
    ) -> BoxFuture<'a, KeryxResult<Vec<SqlRow>>> {
        Box::pin(async move {
            let start = Instant::now();
            let result = self.next.query(query, params).await;
            self.after(query, start);
            result
        })
    }

    fn query_row<'a>(
        &'a self,
        query: &'a str,
        params: &'a [SqlValue],
    ) -> BoxFuture<'a, KeryxResult<Option<SqlRow>>> {
        Box::pin(async move {
            let start = Instant::now();
            let result = self.next.query_row(query, params).await;
            self.after(query, start);
            result
        })
    }

    fn prepare<'a>(&'a self, query: &'a str) -> BoxFuture<'a, KeryxResult<StatementId>> {
        Box::pin(async move {
            let start = Instant::now();
            let result = self.next.prepare(query).await;
            self.after(query, start);
            result
        })
    }

    fn begin<'a>(&'a self) -> BoxFuture<'a, KeryxResult<TxId>> {
        self.next.begin()
    }

    fn begin_tx<'a>(&'a self, opts: TxOptions) -> BoxFuture<'a, KeryxResult<TxId>> {
        self.next.begin_tx(opts)
    }

    fn close<'a>(&'a self) -> BoxFuture<'a, KeryxResult<()>> {
        self.next.close()
    }
}

/// Node that spans statement operations through a [`TraceCorrelator`].
pub struct TracingSqlConn {
    correlator: Arc<dyn TraceCorrelator>,
    next: Arc<dyn SqlConn>,
}

impl TracingSqlConn {
    /// Creates a tracing node in front of `next`.
    #[must_use]
    pub fn new(correlator: Arc<dyn TraceCorrelator>, next: Arc<dyn SqlConn>) -> Self {
        Self { correlator, next }
    }

    async fn traced<'a, T>(
        &'a self,
        operation: &'static str,
        query: &'a str,
        fut: BoxFuture<'a, KeryxResult<T>>,
    ) -> KeryxResult<T> {
        let mut span = self.correlator.start_span(operation, None);
        span.set_tag("component", "sql");
        span.set_tag("statement", query);

        let result = fut.await;
        if let Err(err) = &result {
            span.set_error(&err.to_string());
        }
        span.finish();
        result
    }
}

impl SqlConn for TracingSqlConn {
    fn exec<'a>(
        &'a self,
        query: &'a str,
        params: &'a [SqlValue],
    ) -> BoxFuture<'a, KeryxResult<ExecResult>> {
        Box::pin(self.traced("sql.exec", query, self.next.exec(query, params)))
    }

    fn query<'a>(
        &'a self,
        query: &'a str,
        params: &'a [SqlValue],
    ) -> BoxFuture<'a, KeryxResult<Vec<SqlRow>>> {
        Box::pin(self.traced("sql.query", query, self.next.query(query, params)))
    }

    fn query_row<'a>(
        &'a self,
        query: &'a str,
        params: &'a [SqlValue],
    ) -> BoxFuture<'a, KeryxResult<Option<SqlRow>>> {
        Box::pin(self.traced("sql.query_row", query, self.next.query_row(query, params)))
    }

    fn prepare<'a>(&'a self, query: &'a str) -> BoxFuture<'a, KeryxResult<StatementId>> {
        Box::pin(self.traced("sql.prepare", query, self.next.prepare(query)))
    }

    fn begin<'a>(&'a self) -> BoxFuture<'a, KeryxResult<TxId>> {
        self.next.begin()
    }

    fn begin_tx<'a>(&'a self, opts: TxOptions) -> BoxFuture<'a, KeryxResult<TxId>> {
        self.next.begin_tx(opts)
    }

    fn close<'a>(&'a self) -> BoxFuture<'a, KeryxResult<()>> {
        self.next.close()
    }
}

/// Node that records a duration histogram per statement operation.
pub struct MetricsSqlConn {
    recorder: Arc<dyn MetricsRecorder>,
    next: Arc<dyn SqlConn>,
}

impl MetricsSqlConn {
    /// Creates a metrics node in front of `next`.
    #[must_use]
    pub fn new(recorder: Arc<dyn MetricsRecorder>, next: Arc<dyn SqlConn>) -> Self {
        Self { recorder, next }
    }

    async fn measured<'a, T>(
        &'a self,
        operation: &'static str,
        fut: BoxFuture<'a, KeryxResult<T>>,
    ) -> KeryxResult<T> {
        let start = Instant::now();
        let result = fut.await;
        self.recorder.observe_histogram(
            metric_names::PROXY_DURATION_SECONDS,
            start.elapsed().as_secs_f64(),
            &[
                ("capability", "sql".to_string()),
                ("operation", operation.to_string()),
            ],
        );
        result
    }
}

impl SqlConn for MetricsSqlConn {
    fn exec<'a>(
        &'a self,
        query: &'a str,
        params: &'a [SqlValue],
    ) -> BoxFuture<'a, KeryxResult<ExecResult>> {
        Box::pin(self.measured("exec", self.next.exec(query, params)))
    }

    fn query<'a>(
        &'a self,
        query: &'a str,
        params: &'a [SqlValue],
    ) -> BoxFuture<'a, KeryxResult<Vec<SqlRow>>> {
        Box::pin(self.measured("query", self.next.query(query, params)))
    }

    fn query_row<'a>(
        &'a self,
        query: &'a str,
        params: &'a [SqlValue],
    ) -> BoxFuture<'a, KeryxResult<Option<SqlRow>>> {
        Box::pin(self.measured("query_row", self.next.query_row(query, params)))
    }

    fn prepare<'a>(&'a self, query: &'a str) -> BoxFuture<'a, KeryxResult<StatementId>> {
        Box::pin(self.measured("prepare", self.next.prepare(query)))
    }

    fn begin<'a>(&'a self) -> BoxFuture<'a, KeryxResult<TxId>> {
        self.next.begin()
    }

    fn begin_tx<'a>(&'a self, opts: TxOptions) -> BoxFuture<'a, KeryxResult<TxId>> {
        self.next.begin_tx(opts)
    }

    fn close<'a>(&'a self) -> BoxFuture<'a, KeryxResult<()>> {
        self.next.close()
    }
}
