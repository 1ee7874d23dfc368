//! Metrics recorder contract and implementations.
//!
//! Interceptors and proxy nodes record metrics through the
//! [`MetricsRecorder`] trait rather than a concrete registry. Label sets
//! are fixed per metric at registration time (see
//! [`metric_names`](crate::metric_names)); recorders must be safe for
//! concurrent use, since every in-flight call shares one instance.

use parking_lot::Mutex;
use std::collections::HashMap;

/// Label pairs attached to a single observation.
pub type Labels = [(&'static str, String)];

/// Records counters, histograms, and gauges.
pub trait MetricsRecorder: Send + Sync + 'static {
    /// Increments a counter by one.
    fn increment_counter(&self, name: &'static str, labels: &Labels);

    /// Records one observation into a histogram.
    fn observe_histogram(&self, name: &'static str, value: f64, labels: &Labels);

    /// Sets a gauge to an absolute value.
    fn set_gauge(&self, name: &'static str, value: f64, labels: &Labels);
}

/// The production recorder, forwarding to the `metrics` facade.
///
/// Pair with [`init_metrics`](crate::init_metrics) to export through
/// Prometheus; without an installed exporter the facade drops observations,
/// so recording never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FacadeRecorder;

impl FacadeRecorder {
    /// Creates a new facade recorder.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn to_labels(labels: &Labels) -> Vec<metrics::Label> {
        labels
            .iter()
            .map(|(k, v)| metrics::Label::new(*k, v.clone()))
            .collect()
    }
}

impl MetricsRecorder for FacadeRecorder {
    fn increment_counter(&self, name: &'static str, labels: &Labels) {
        metrics::counter!(name, Self::to_labels(labels)).increment(1);
    }

    fn observe_histogram(&self, name: &'static str, value: f64, labels: &Labels) {
        metrics::histogram!(name, Self::to_labels(labels)).record(value);
    }

    fn set_gauge(&self, name: &'static str, value: f64, labels: &Labels) {
        metrics::gauge!(name, Self::to_labels(labels)).set(value);
    }
}

/// A key identifying one labeled series in a [`TestRecorder`].
type SeriesKey = (&'static str, Vec<(&'static str, String)>);

/// An in-memory recorder for assertions in tests.
///
/// # Example
///
/// ```
/// use keryx_telemetry::{MetricsRecorder, TestRecorder};
///
/// let recorder = TestRecorder::new();
/// recorder.increment_counter("calls", &[("method", "Get".to_string())]);
///
/// assert_eq!(recorder.counter("calls", &[("method", "Get".to_string())]), 1);
/// ```
#[derive(Debug, Default)]
pub struct TestRecorder {
    counters: Mutex<HashMap<SeriesKey, u64>>,
    histograms: Mutex<HashMap<SeriesKey, Vec<f64>>>,
    gauges: Mutex<HashMap<SeriesKey, f64>>,
}

impl TestRecorder {
    /// Creates an empty test recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a counter's current value, or zero when never incremented.
    #[must_use]
    pub fn counter(&self, name: &'static str, labels: &Labels) -> u64 {
        self.counters
            .lock()
            .get(&(name, labels.to_vec()))
            .copied()
            .unwrap_or(0)
    }

    /// Returns the observations recorded into a histogram series.
    #[must_use]
    pub fn histogram(&self, name: &'static str, labels: &Labels) -> Vec<f64> {
        self.histograms
            .lock()
            .get(&(name, labels.to_vec()))
            .cloned()
            .unwrap_or_default()
    }

    /// Returns a gauge's last set value, if any.
    #[must_use]
    pub fn gauge(&self, name: &'static str, labels: &Labels) -> Option<f64> {
        self.gauges.lock().get(&(name, labels.to_vec())).copied()
    }

    /// Returns the total number of counter increments across all series of
    /// `name`.
    #[must_use]
    pub fn counter_total(&self, name: &'static str) -> u64 {
        self.counters
            .lock()
            .iter()
            .filter(|((n, _), _)| *n == name)
            .map(|(_, v)| *v)
            .sum()
    }
}

impl MetricsRecorder for TestRecorder {
    fn increment_counter(&self, name: &'static str, labels: &Labels) {
        *self
            .counters
            .lock()
            .entry((name, labels.to_vec()))
            .or_insert(0) += 1;
    }

    fn observe_histogram(&self, name: &'static str, value: f64, labels: &Labels) {
        self.histograms
            .lock()
            .entry((name, labels.to_vec()))
            .or_default()
            .push(value);
    }

    fn set_gauge(&self, name: &'static str, value: f64, labels: &Labels) {
        self.gauges.lock().insert((name, labels.to_vec()), value);
    }
}
