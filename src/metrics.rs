//! Process-wide counters and latency histograms.
//!
//! Histograms keep a bounded reservoir (1024 samples, oldest dropped);
//! percentiles are computed on snapshot. The registry is handed around
//! by `Arc`, with one mutex and O(1) critical sections.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;
use std::time::Instant;

use serde::Serialize;

const RESERVOIR_CAPACITY: usize = 1024;

#[derive(Debug, Default)]
struct Inner {
    counters: BTreeMap<String, u64>,
    histograms: BTreeMap<String, VecDeque<f64>>,
}

#[derive(Debug)]
pub struct Metrics {
    inner: Mutex<Inner>,
    started: Instant,
}

/// Percentile summary of one histogram.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HistogramStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_seconds: u64,
    pub counters: BTreeMap<String, u64>,
    pub histograms: BTreeMap<String, HistogramStats>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            started: Instant::now(),
        }
    }

    pub fn increment(&self, name: &str) {
        self.increment_by(name, 1);
    }

    pub fn increment_by(&self, name: &str, value: u64) {
        let mut inner = self.inner.lock().expect("metrics mutex poisoned");
        *inner.counters.entry(name.to_string()).or_insert(0) += value;
    }

    pub fn record_duration_ms(&self, name: &str, duration_ms: f64) {
        let mut inner = self.inner.lock().expect("metrics mutex poisoned");
        let samples = inner.histograms.entry(name.to_string()).or_default();
        samples.push_back(duration_ms);
        while samples.len() > RESERVOIR_CAPACITY {
            samples.pop_front();
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let inner = self.inner.lock().expect("metrics mutex poisoned");
        let histograms = inner
            .histograms
            .iter()
            .filter(|(_, samples)| !samples.is_empty())
            .map(|(name, samples)| (name.clone(), summarize(samples)))
            .collect();
        MetricsSnapshot {
            uptime_seconds: self.started.elapsed().as_secs(),
            counters: inner.counters.clone(),
            histograms,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn summarize(samples: &VecDeque<f64>) -> HistogramStats {
    let mut sorted: Vec<f64> = samples.iter().copied().collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let count = sorted.len();
    let sum: f64 = sorted.iter().sum();
    let p = |q: f64| -> f64 {
        let idx = ((count as f64) * q) as usize;
        sorted[idx.min(count - 1)]
    };
    HistogramStats {
        count,
        min: sorted[0],
        max: sorted[count - 1],
        avg: sum / count as f64,
        p50: sorted[count / 2],
        p95: p(0.95),
        p99: p(0.99),
    }
}
