//! # Keryx Tasks
//!
//! A small bounded worker pool for running fire-and-forget jobs off the
//! call path.
//!
//! N long-lived workers each own a job channel they register into a shared
//! idle queue; a dispatcher task receives jobs from a shared intake channel
//! and hands each to a free worker. Shutdown drains: cancellation makes
//! the dispatcher stop every worker through its own channel before the
//! pool itself closes, and [`TaskPool::stop`] joins all tasks.
//!
//! # Example
//!
//! ```
//! use keryx_tasks::{TaskPool, TaskPoolConfig};
//!
//! # #[tokio::main(flavor = "multi_thread", worker_threads = 2)]
//! # async fn main() {
//! let pool = TaskPool::new(TaskPoolConfig::default());
//! pool.submit(async {
//!     // off-path work
//! })
//! .await
//! .unwrap();
//! pool.stop().await;
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/keryx-tasks/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use keryx_telemetry::{metric_names, MetricsRecorder};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Default number of workers.
const DEFAULT_WORKERS: usize = 5;

/// Upper bound on the configured worker count.
const MAX_WORKERS: usize = 500;

/// A fire-and-forget job.
pub type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

enum WorkerMsg {
    Run(Job),
    Stop,
}

/// Errors raised when submitting jobs.
#[derive(Debug, Error)]
pub enum TaskPoolError {
    /// The pool has been stopped and accepts no further jobs.
    #[error("task pool is closed")]
    PoolClosed,
}

/// Worker pool configuration.
#[derive(Debug, Clone)]
pub struct TaskPoolConfig {
    /// Pool name, used as the metrics label.
    pub name: String,

    /// Number of workers. Values outside `1..500` fall back to the
    /// default of 5.
    pub workers: usize,
}

impl Default for TaskPoolConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            workers: DEFAULT_WORKERS,
        }
    }
}

impl TaskPoolConfig {
    fn effective_workers(&self) -> usize {
        if self.workers > 0 && self.workers < MAX_WORKERS {
            self.workers
        } else {
            DEFAULT_WORKERS
        }
    }
}

/// A bounded pool of long-lived workers.
pub struct TaskPool {
    intake: mpsc::Sender<Job>,
    cancel: watch::Sender<bool>,
    dispatcher: JoinHandle<()>,
    workers: Vec<JoinHandle<()>>,
    busy: Arc<AtomicUsize>,
    worker_count: usize,
}

impl TaskPool {
    /// Starts a pool without metrics.
    #[must_use]
    pub fn new(config: TaskPoolConfig) -> Self {
        Self::start(config, None)
    }

    /// Starts a pool reporting its busy-worker gauge through `recorder`.
    #[must_use]
    pub fn with_recorder(config: TaskPoolConfig, recorder: Arc<dyn MetricsRecorder>) -> Self {
        Self::start(config, Some(recorder))
    }

    fn start(config: TaskPoolConfig, recorder: Option<Arc<dyn MetricsRecorder>>) -> Self {
        let worker_count = config.effective_workers();
        let pool_name = config.name.clone();
        let busy = Arc::new(AtomicUsize::new(0));

        let (intake_tx, mut intake_rx) = mpsc::channel::<Job>(worker_count);
        let (idle_tx, mut idle_rx) = mpsc::channel::<mpsc::Sender<WorkerMsg>>(worker_count);
        let (cancel_tx, _) = watch::channel(false);

        let mut workers = Vec::with_capacity(worker_count);
        for index in 0..worker_count {
            let idle_tx = idle_tx.clone();
            let busy = Arc::clone(&busy);
            let recorder = recorder.clone();
            let pool_name = pool_name.clone();

            workers.push(tokio::spawn(async move {
                let (job_tx, mut job_rx) = mpsc::channel::<WorkerMsg>(1);
                tracing::debug!(worker = index, "worker started");

                loop {
                    if idle_tx.send(job_tx.clone()).await.is_err() {
                        break;
                    }
                    match job_rx.recv().await {
                        Some(WorkerMsg::Run(job)) => {
                            let now_busy = busy.fetch_add(1, Ordering::SeqCst) + 1;
                            if let Some(recorder) = &recorder {
                                recorder.set_gauge(
                                    metric_names::POOL_BUSY_WORKERS,
                                    now_busy as f64,
                                    &[("pool", pool_name.clone())],
                                );
                            }

                            job.await;

                            let now_busy = busy.fetch_sub(1, Ordering::SeqCst) - 1;
                            if let Some(recorder) = &recorder {
                                recorder.set_gauge(
                                    metric_names::POOL_BUSY_WORKERS,
                                    now_busy as f64,
                                    &[("pool", pool_name.clone())],
                                );
                            }
                        }
                        Some(WorkerMsg::Stop) | None => break,
                    }
                }

                tracing::debug!(worker = index, "worker stopped");
            }));
        }

        let mut cancel_rx = cancel_tx.subscribe();
        let dispatcher = tokio::spawn(async move {
            loop {
                tokio::select! {
                    job = intake_rx.recv() => {
                        let Some(job) = job else { break };
                        // Hand the job to the next free worker.
                        let Some(worker_tx) = idle_rx.recv().await else { break };
                        if worker_tx.send(WorkerMsg::Run(job)).await.is_err() {
                            tracing::warn!("worker gone, job dropped");
                        }
                    }
                    _ = cancel_rx.changed() => {
                        // Drain: stop every worker through its own channel,
                        // then let the idle queue close behind them.
                        for _ in 0..worker_count {
                            let Some(worker_tx) = idle_rx.recv().await else { break };
                            let _ = worker_tx.send(WorkerMsg::Stop).await;
                        }
                        break;
                    }
                }
            }
            tracing::debug!("dispatcher stopped");
        });

        Self {
            intake: intake_tx,
            cancel: cancel_tx,
            dispatcher,
            workers,
            busy,
            worker_count,
        }
    }

    /// Submits a job for execution on a free worker.
    ///
    /// Backpressure: awaits while the intake channel is full.
    pub async fn submit<F>(&self, job: F) -> Result<(), TaskPoolError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.intake
            .send(Box::pin(job))
            .await
            .map_err(|_| TaskPoolError::PoolClosed)
    }

    /// Returns the number of workers currently running a job.
    #[must_use]
    pub fn busy(&self) -> usize {
        self.busy.load(Ordering::SeqCst)
    }

    /// Returns the pool size.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.worker_count
    }

    /// Stops the pool: cancels the dispatcher, drains the workers, and
    /// joins every task.
    pub async fn stop(self) {
        let _ = self.cancel.send(true);
        let _ = self.dispatcher.await;
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_worker_count_bounds() {
        let mut config = TaskPoolConfig::default();
        assert_eq!(config.effective_workers(), 5);

        config.workers = 0;
        assert_eq!(config.effective_workers(), 5);

        config.workers = 12;
        assert_eq!(config.effective_workers(), 12);

        config.workers = 500;
        assert_eq!(config.effective_workers(), 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_jobs_run() {
        let pool = TaskPool::new(TaskPoolConfig {
            name: "t".to_string(),
            workers: 2,
        });
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..10 {
            let hits = Arc::clone(&hits);
            pool.submit(async move {
                hits.fetch_add(1, Ordering::SeqCst);
            })
            .await
            .unwrap();
        }

        tokio::time::timeout(Duration::from_secs(2), async {
            while hits.load(Ordering::SeqCst) < 10 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("jobs did not finish");

        pool.stop().await;
        assert_eq!(hits.load(Ordering::SeqCst), 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stop_then_submit_fails() {
        let pool = TaskPool::new(TaskPoolConfig {
            name: "t".to_string(),
            workers: 2,
        });

        let intake = pool.intake.clone();
        pool.stop().await;

        let result = intake.send(Box::pin(async {})).await;
        assert!(result.is_err(), "intake must be closed after stop");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded_by_pool_size() {
        let pool = TaskPool::new(TaskPoolConfig {
            name: "t".to_string(),
            workers: 2,
        });
        let peak = Arc::new(AtomicUsize::new(0));
        let running = Arc::new(AtomicUsize::new(0));

        for _ in 0..8 {
            let peak = Arc::clone(&peak);
            let running = Arc::clone(&running);
            pool.submit(async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                running.fetch_sub(1, Ordering::SeqCst);
            })
            .await
            .unwrap();
        }

        tokio::time::sleep(Duration::from_millis(300)).await;
        pool.stop().await;

        assert!(peak.load(Ordering::SeqCst) <= 2, "more jobs ran than workers");
    }
}
