//! Request metrics collection and exposition.
//!
//! Two sinks are fed from the request pipeline:
//! - [`RequestMetrics`]: in-process counters and a bounded latency history,
//!   served as JSON by `GET /metrics`.
//! - The `metrics` facade, scraped through the optional Prometheus exporter.
//!
//! # Metrics
//! - `showcase_requests_total` (counter): requests by method, status, route
//! - `showcase_request_duration_seconds` (histogram): latency distribution
//! - `showcase_rate_limited_total` (counter): rejected requests by reason

use std::collections::{BTreeMap, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use dashmap::DashMap;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use serde::Serialize;

/// Samples required before the 95th percentile is reported.
const P95_MIN_SAMPLES: usize = 20;

/// Process-wide request counters and recent latency samples.
///
/// Writers never block each other on the counters; only the latency history
/// sits behind a mutex, and it is never held across an await point.
#[derive(Debug)]
pub struct RequestMetrics {
    total: AtomicU64,
    by_path: DashMap<String, u64>,
    latencies: Mutex<VecDeque<f64>>,
    capacity: usize,
}

/// Point-in-time view of [`RequestMetrics`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub requests_by_path: BTreeMap<String, u64>,
    #[serde(rename = "latency_ms")]
    pub latency: LatencyStats,
}

/// Summary statistics over the latency history, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LatencyStats {
    pub avg: f64,
    pub p50: f64,
    pub p95: f64,
    pub max: f64,
    pub count: usize,
}

impl RequestMetrics {
    /// Create a recorder keeping at most `capacity` latency samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            total: AtomicU64::new(0),
            by_path: DashMap::new(),
            latencies: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Record one completed request.
    pub fn record(&self, path: &str, elapsed_ms: f64) {
        self.total.fetch_add(1, Ordering::Relaxed);
        *self.by_path.entry(path.to_string()).or_insert(0) += 1;

        let mut latencies = self.latencies.lock().unwrap_or_else(PoisonError::into_inner);
        if latencies.len() >= self.capacity {
            latencies.pop_front();
        }
        latencies.push_back(elapsed_ms);
    }

    /// Total number of recorded requests.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let samples: Vec<f64> = {
            let latencies = self.latencies.lock().unwrap_or_else(PoisonError::into_inner);
            latencies.iter().copied().collect()
        };

        MetricsSnapshot {
            requests_total: self.total(),
            requests_by_path: self
                .by_path
                .iter()
                .map(|entry| (entry.key().clone(), *entry.value()))
                .collect(),
            latency: LatencyStats::from_samples(samples),
        }
    }
}

impl Default for RequestMetrics {
    fn default() -> Self {
        Self::new(500)
    }
}

impl LatencyStats {
    /// Compute statistics over unordered samples. Values are rounded to 2 decimals.
    pub fn from_samples(mut samples: Vec<f64>) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        samples.sort_by(f64::total_cmp);

        let n = samples.len();
        let avg = samples.iter().sum::<f64>() / n as f64;
        let p50 = if n % 2 == 1 {
            samples[n / 2]
        } else {
            (samples[n / 2 - 1] + samples[n / 2]) / 2.0
        };
        let p95 = if n >= P95_MIN_SAMPLES {
            exclusive_quantile(&samples, 19, 20)
        } else {
            0.0
        };

        Self {
            avg: round2(avg),
            p50: round2(p50),
            p95: round2(p95),
            max: round2(samples[n - 1]),
            count: n,
        }
    }
}

/// The `i`-th of `parts - 1` cut points using the exclusive method
/// (interpolating over positions `1..=n` of the sorted data).
///
/// Requires `sorted.len() >= parts`.
fn exclusive_quantile(sorted: &[f64], i: usize, parts: usize) -> f64 {
    let m = sorted.len() + 1;
    let j = (i * m / parts).clamp(1, sorted.len() - 1);
    let delta = (i * m - j * parts) as f64;
    (sorted[j - 1] * (parts as f64 - delta) + sorted[j] * delta) / parts as f64
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Install the Prometheus exporter with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Prometheus exporter listening");
    Ok(())
}

/// Mirror a completed request into the metrics facade.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    let route = route.to_string();
    metrics::counter!(
        "showcase_requests_total",
        "method" => method.clone(),
        "status" => status.clone(),
        "route" => route.clone()
    )
    .increment(1);
    metrics::histogram!(
        "showcase_request_duration_seconds",
        "method" => method,
        "status" => status,
        "route" => route
    )
    .record(start.elapsed().as_secs_f64());
}

/// Count a request rejected before reaching a handler.
pub fn record_rate_limited(reason: &'static str) {
    metrics::counter!("showcase_rate_limited_total", "reason" => reason).increment(1);
}
