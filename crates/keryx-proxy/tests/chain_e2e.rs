//! End-to-end proxy chain tests.
//!
//! These assemble chains the way a datastore client would at startup:
//! node factories layered over a terminal connection, then every call
//! going through the assembled entry point.

use keryx_core::KeryxResult;
use keryx_proxy::{
    BoxFuture, CacheConn, CacheValue, ProxyChain, SlowCallHook, SqlConn, SqlRow, SqlValue,
    TimingCacheConn, TimingSqlConn, TracingCacheConn,
};
use keryx_telemetry::TestCorrelator;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A cache terminal that records the sequence of events it sees.
struct RecordingCache {
    events: Arc<Mutex<Vec<String>>>,
    closes: AtomicU64,
}

impl RecordingCache {
    fn new(events: Arc<Mutex<Vec<String>>>) -> Arc<Self> {
        Arc::new(Self {
            events,
            closes: AtomicU64::new(0),
        })
    }
}

impl CacheConn for RecordingCache {
    fn command<'a>(
        &'a self,
        cmd: &'a str,
        _args: &'a [CacheValue],
    ) -> BoxFuture<'a, KeryxResult<CacheValue>> {
        Box::pin(async move {
            self.events.lock().push(format!("terminal:{cmd}"));
            Ok(CacheValue::Str("ok".to_string()))
        })
    }

    fn close<'a>(&'a self) -> BoxFuture<'a, KeryxResult<()>> {
        Box::pin(async move {
            self.closes.fetch_add(1, Ordering::SeqCst);
            self.events.lock().push("terminal:close".to_string());
            Ok(())
        })
    }
}

/// A decorator node that records before/after markers around each command.
struct SequencedCache {
    label: &'static str,
    events: Arc<Mutex<Vec<String>>>,
    next: Arc<dyn CacheConn>,
}

impl CacheConn for SequencedCache {
    fn command<'a>(
        &'a self,
        cmd: &'a str,
        args: &'a [CacheValue],
    ) -> BoxFuture<'a, KeryxResult<CacheValue>> {
        Box::pin(async move {
            self.events.lock().push(format!("{}:before", self.label));
            let result = self.next.command(cmd, args).await;
            self.events.lock().push(format!("{}:after", self.label));
            result
        })
    }

    fn close<'a>(&'a self) -> BoxFuture<'a, KeryxResult<()>> {
        Box::pin(async move {
            self.events.lock().push(format!("{}:close", self.label));
            self.next.close().await
        })
    }
}

#[tokio::test]
async fn test_zero_node_chain_is_identity() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let terminal: Arc<dyn CacheConn> = RecordingCache::new(events);

    let assembled = ProxyChain::new().assemble(Arc::clone(&terminal));
    assert!(Arc::ptr_eq(&terminal, &assembled));
}

#[tokio::test]
async fn test_onion_ordering() {
    let events: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let terminal: Arc<dyn CacheConn> = RecordingCache::new(Arc::clone(&events));

    let events_a = Arc::clone(&events);
    let events_b = Arc::clone(&events);
    let assembled = ProxyChain::new()
        .layer(move |next| {
            Arc::new(SequencedCache {
                label: "A",
                events: events_a,
                next,
            }) as Arc<dyn CacheConn>
        })
        .layer(move |next| {
            Arc::new(SequencedCache {
                label: "B",
                events: events_b,
                next,
            }) as Arc<dyn CacheConn>
        })
        .assemble(terminal);

    assembled.command("get", &[]).await.unwrap();

    let seen = events.lock();
    assert_eq!(
        *seen,
        vec![
            "A:before",
            "B:before",
            "terminal:get",
            "B:after",
            "A:after",
        ]
    );
}

#[tokio::test]
async fn test_close_propagates_to_terminal_exactly_once() {
    let events: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let terminal = RecordingCache::new(Arc::clone(&events));

    let events_a = Arc::clone(&events);
    let events_b = Arc::clone(&events);
    let assembled = ProxyChain::new()
        .layer(move |next| {
            Arc::new(SequencedCache {
                label: "A",
                events: events_a,
                next,
            }) as Arc<dyn CacheConn>
        })
        .layer(move |next| {
            Arc::new(SequencedCache {
                label: "B",
                events: events_b,
                next,
            }) as Arc<dyn CacheConn>
        })
        .assemble(Arc::clone(&terminal) as Arc<dyn CacheConn>);

    assembled.close().await.unwrap();
    assert_eq!(terminal.closes.load(Ordering::SeqCst), 1);
    assert_eq!(
        *events.lock(),
        vec!["A:close", "B:close", "terminal:close"]
    );

    // Double close traverses again without panicking.
    assembled.close().await.unwrap();
    assert_eq!(terminal.closes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_slow_call_hook_fires_exactly_once_with_elapsed() {
    struct SleepyCache;

    impl CacheConn for SleepyCache {
        fn command<'a>(
            &'a self,
            _cmd: &'a str,
            _args: &'a [CacheValue],
        ) -> BoxFuture<'a, KeryxResult<CacheValue>> {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(CacheValue::Nil)
            })
        }

        fn close<'a>(&'a self) -> BoxFuture<'a, KeryxResult<()>> {
            Box::pin(async move { Ok(()) })
        }
    }

    let fired: Arc<Mutex<Vec<(String, Duration)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&fired);
    let hook: SlowCallHook =
        Arc::new(move |op: &str, elapsed| sink.lock().push((op.to_string(), elapsed)));

    let assembled = ProxyChain::new()
        .layer(move |next| {
            Arc::new(TimingCacheConn::new(Duration::from_millis(10), hook, next))
                as Arc<dyn CacheConn>
        })
        .assemble(Arc::new(SleepyCache) as Arc<dyn CacheConn>);

    assembled.command("hgetall", &[]).await.unwrap();

    let seen = fired.lock();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, "hgetall");
    assert!(seen[0].1 >= Duration::from_millis(20));
}

#[tokio::test]
async fn test_mixed_instrumentation_chain() {
    let events: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let terminal: Arc<dyn CacheConn> = RecordingCache::new(Arc::clone(&events));
    let correlator = Arc::new(TestCorrelator::new());

    let hook: SlowCallHook = Arc::new(|_, _| {});
    let correlator_layer = Arc::clone(&correlator);
    let assembled = ProxyChain::new()
        .layer(move |next| {
            Arc::new(TimingCacheConn::new(Duration::from_secs(1), hook, next))
                as Arc<dyn CacheConn>
        })
        .layer(move |next| {
            Arc::new(TracingCacheConn::new(correlator_layer as _, next)) as Arc<dyn CacheConn>
        })
        .assemble(terminal);

    assembled
        .command("set", &[CacheValue::Str("k".into()), CacheValue::Int(1)])
        .await
        .unwrap();

    assert_eq!(correlator.started_count(), 1);
    assert_eq!(correlator.finished_spans().len(), 1);
    assert_eq!(*events.lock(), vec!["terminal:set"]);
}

/// A SQL terminal for exercising the same generic assembly over a second
/// capability interface.
struct StaticSql;

impl SqlConn for StaticSql {
    fn exec<'a>(
        &'a self,
        _query: &'a str,
        _params: &'a [SqlValue],
    ) -> BoxFuture<'a, KeryxResult<keryx_proxy::ExecResult>> {
        Box::pin(async move { Ok(keryx_proxy::ExecResult::default()) })
    }

    fn query<'a>(
        &'a self,
        _query: &'a str,
        _params: &'a [SqlValue],
    ) -> BoxFuture<'a, KeryxResult<Vec<SqlRow>>> {
        Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(vec![SqlRow::default()])
        })
    }

    fn query_row<'a>(
        &'a self,
        _query: &'a str,
        _params: &'a [SqlValue],
    ) -> BoxFuture<'a, KeryxResult<Option<SqlRow>>> {
        Box::pin(async move { Ok(None) })
    }

    fn prepare<'a>(
        &'a self,
        _query: &'a str,
    ) -> BoxFuture<'a, KeryxResult<keryx_proxy::StatementId>> {
        Box::pin(async move { Ok(keryx_proxy::StatementId(1)) })
    }

    fn begin<'a>(&'a self) -> BoxFuture<'a, KeryxResult<keryx_proxy::TxId>> {
        Box::pin(async move { Ok(keryx_proxy::TxId(1)) })
    }

    fn begin_tx<'a>(
        &'a self,
        _opts: keryx_proxy::TxOptions,
    ) -> BoxFuture<'a, KeryxResult<keryx_proxy::TxId>> {
        Box::pin(async move { Ok(keryx_proxy::TxId(1)) })
    }

    fn close<'a>(&'a self) -> BoxFuture<'a, KeryxResult<()>> {
        Box::pin(async move { Ok(()) })
    }
}

#[tokio::test]
async fn test_same_assembly_over_sql_capability() {
    let fired: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&fired);
    let hook: SlowCallHook = Arc::new(move |op: &str, _| sink.lock().push(op.to_string()));

    let conn = ProxyChain::new()
        .layer(move |next| {
            Arc::new(TimingSqlConn::new(Duration::from_millis(10), hook, next))
                as Arc<dyn SqlConn>
        })
        .assemble(Arc::new(StaticSql) as Arc<dyn SqlConn>);

    conn.exec("delete from t", &[]).await.unwrap();
    conn.query("select * from t", &[]).await.unwrap();

    assert_eq!(*fired.lock(), vec!["select * from t".to_string()]);
}
