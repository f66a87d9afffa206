use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::Serialize;

// ─── Configuration ───────────────────────────────────────────────

/// How many of the most recent durations we keep per endpoint for
/// percentile estimation. Older samples are evicted FIFO.
pub const RECENT_WINDOW: usize = 100;

/// Overall error rate at or above which the service reports degraded.
const DEGRADED_ERROR_RATE: f64 = 0.05;

// ─── Public types ────────────────────────────────────────────────

/// Thread-safe metrics engine.
/// The tracking middleware calls `record()`, the read endpoints call
/// `query()` / `health()`.
pub struct MetricsStore {
    inner: Mutex<BTreeMap<EndpointKey, EndpointStats>>,
    start_time: DateTime<Utc>,
}

/// One aggregation bucket: an HTTP method plus the route it hit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct EndpointKey {
    pub method: String,
    pub endpoint: String,
}

impl EndpointKey {
    fn new(method: &str, endpoint: &str) -> Self {
        Self {
            method: method.to_owned(),
            endpoint: endpoint.to_owned(),
        }
    }

    /// The combined form consumed by dashboard clients, e.g. `"GET:/health"`.
    pub fn label(&self) -> String {
        format!("{}:{}", self.method, self.endpoint)
    }
}

/// Derived per-endpoint view shipped to the JSON metrics endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointSummary {
    pub total_requests: u64,
    pub total_errors: u64,
    pub error_rate: f64,
    pub avg_response_time_ms: f64,
    pub p95_response_time_ms: f64,
    pub last_access: Option<String>,
}

/// Service-wide aggregate view for the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub uptime_seconds: i64,
    pub uptime_human: String,
    pub total_requests: u64,
    pub total_errors: u64,
    pub overall_error_rate: f64,
    pub endpoints_count: usize,
    pub service_status: ServiceStatus,
}

/// Tri-state verdict recomputed from the counters on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Unknown,
    Healthy,
    Degraded,
}

// ─── Internal state ──────────────────────────────────────────────

/// Counters for one endpoint. Created lazily on the first request,
/// never removed afterwards.
#[derive(Debug)]
struct EndpointStats {
    count: u64,
    /// Full-history sum of elapsed seconds. The mean comes from this,
    /// not from the bounded window below.
    total_time: f64,
    errors: u64,
    last_access: Option<DateTime<Utc>>,
    /// Most recent durations only, used for the p95 estimate.
    recent: VecDeque<f64>,
}

impl EndpointStats {
    fn new() -> Self {
        Self {
            count: 0,
            total_time: 0.0,
            errors: 0,
            last_access: None,
            recent: VecDeque::with_capacity(RECENT_WINDOW + 1),
        }
    }

    fn summarize(&self) -> EndpointSummary {
        let error_rate = if self.count > 0 {
            self.errors as f64 / self.count as f64
        } else {
            0.0
        };
        let avg_ms = if self.count > 0 {
            round2(self.total_time / self.count as f64 * 1000.0)
        } else {
            0.0
        };

        EndpointSummary {
            total_requests: self.count,
            total_errors: self.errors,
            error_rate,
            avg_response_time_ms: avg_ms,
            p95_response_time_ms: self.p95_ms(),
            last_access: self.last_access.map(|t| t.to_rfc3339()),
        }
    }

    /// Windowed p95: sort the recent durations and index at
    /// `floor(0.95 × len)`. A point-in-time estimate, no interpolation.
    fn p95_ms(&self) -> f64 {
        if self.recent.is_empty() {
            return 0.0;
        }
        let mut sorted: Vec<f64> = self.recent.iter().copied().collect();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let idx = (sorted.len() as f64 * 0.95) as usize;
        round2(sorted[idx] * 1000.0)
    }
}

/// Raw counters handed to the Prometheus renderer, which needs the
/// unrounded seconds rather than the millisecond view.
pub(crate) struct RawEntry {
    pub key: EndpointKey,
    pub count: u64,
    pub errors: u64,
    pub total_time: f64,
}

// ─── MetricsStore impl ───────────────────────────────────────────

impl MetricsStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BTreeMap::new()),
            start_time: Utc::now(),
        }
    }

    /// Record one completed request. Called exactly once per request
    /// by the tracking middleware; never fails.
    pub fn record(&self, method: &str, endpoint: &str, status_code: u16, elapsed_seconds: f64) {
        let mut map = self.inner.lock();
        let stats = map
            .entry(EndpointKey::new(method, endpoint))
            .or_insert_with(EndpointStats::new);

        stats.count += 1;
        stats.total_time += elapsed_seconds;
        stats.last_access = Some(Utc::now());
        stats.recent.push_back(elapsed_seconds);
        if stats.recent.len() > RECENT_WINDOW {
            stats.recent.pop_front();
        }
        if status_code >= 400 {
            stats.errors += 1;
        }
    }

    /// Derived views, optionally filtered by the combined
    /// `"METHOD:endpoint"` label. An unknown label yields an empty list.
    /// The lock is held for the whole iteration so the result is one
    /// consistent snapshot across keys.
    pub fn query(&self, endpoint: Option<&str>) -> Vec<(EndpointKey, EndpointSummary)> {
        let map = self.inner.lock();
        map.iter()
            .filter(|(key, _)| endpoint.map_or(true, |want| key.label() == want))
            .map(|(key, stats)| (key.clone(), stats.summarize()))
            .collect()
    }

    /// Service-wide aggregate across every endpoint.
    pub fn health(&self) -> HealthReport {
        let map = self.inner.lock();
        let total_requests: u64 = map.values().map(|s| s.count).sum();
        let total_errors: u64 = map.values().map(|s| s.errors).sum();
        let overall_error_rate = if total_requests > 0 {
            total_errors as f64 / total_requests as f64
        } else {
            0.0
        };

        let service_status = if total_requests == 0 {
            ServiceStatus::Unknown
        } else if overall_error_rate < DEGRADED_ERROR_RATE {
            ServiceStatus::Healthy
        } else {
            ServiceStatus::Degraded
        };

        let uptime = Utc::now() - self.start_time;

        HealthReport {
            uptime_seconds: uptime.num_seconds(),
            uptime_human: human_uptime(uptime),
            total_requests,
            total_errors,
            overall_error_rate,
            endpoints_count: map.len(),
            service_status,
        }
    }

    pub(crate) fn raw_snapshot(&self) -> Vec<RawEntry> {
        let map = self.inner.lock();
        map.iter()
            .map(|(key, stats)| RawEntry {
                key: key.clone(),
                count: stats.count,
                errors: stats.errors,
                total_time: stats.total_time,
            })
            .collect()
    }
}

impl Default for MetricsStore {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Helpers ─────────────────────────────────────────────────────

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn human_uptime(d: Duration) -> String {
    let secs = d.num_seconds().max(0);
    let days = secs / 86_400;
    let (h, m, s) = (secs % 86_400 / 3600, secs % 3600 / 60, secs % 60);
    if days > 0 {
        format!("{days} days, {h}:{m:02}:{s:02}")
    } else {
        format!("{h}:{m:02}:{s:02}")
    }
}

// ─── Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn single(store: &MetricsStore, label: &str) -> EndpointSummary {
        let mut views = store.query(Some(label));
        assert_eq!(views.len(), 1, "expected exactly one entry for {label}");
        views.remove(0).1
    }

    #[test]
    fn errors_partitioned_by_status_code() {
        let store = MetricsStore::new();
        for status in [200, 201, 301, 399, 400, 404, 500, 503] {
            store.record("GET", "/api/v1/metrics", status, 0.01);
        }

        let view = single(&store, "GET:/api/v1/metrics");
        assert_eq!(view.total_requests, 8);
        assert_eq!(view.total_errors, 4);
        assert!(view.total_errors <= view.total_requests);
        assert!((view.error_rate - 0.5).abs() < 1e-12);
    }

    #[test]
    fn mean_uses_full_history() {
        let store = MetricsStore::new();
        store.record("POST", "/api/v1/analysis/descriptive", 200, 0.010);
        store.record("POST", "/api/v1/analysis/descriptive", 200, 0.020);
        store.record("POST", "/api/v1/analysis/descriptive", 200, 0.033);

        let view = single(&store, "POST:/api/v1/analysis/descriptive");
        // (0.010 + 0.020 + 0.033) / 3 * 1000 = 21.0
        assert_eq!(view.avg_response_time_ms, 21.0);
    }

    #[test]
    fn p95_reads_only_the_recent_window() {
        let store = MetricsStore::new();
        // 150 distinct ascending durations; only the last 100 (0.051..0.150)
        // may influence the percentile.
        for i in 1..=150u32 {
            store.record("GET", "/api/v1/reports/generate", 200, i as f64 / 1000.0);
        }

        let view = single(&store, "GET:/api/v1/reports/generate");
        // Window holds 0.051..=0.150 sorted; index floor(100 * 0.95) = 95
        // lands on 0.146 seconds.
        assert_eq!(view.p95_response_time_ms, 146.0);
        // The mean still covers all 150 samples: sum 1..=150 / 150 = 75.5 ms.
        assert_eq!(view.avg_response_time_ms, 75.5);
    }

    #[test]
    fn p95_empty_and_single_sample() {
        let store = MetricsStore::new();
        assert!(store.query(Some("GET:/nowhere")).is_empty());

        store.record("GET", "/api/v1/metrics", 200, 0.2);
        let view = single(&store, "GET:/api/v1/metrics");
        // One sample: index floor(1 * 0.95) = 0.
        assert_eq!(view.p95_response_time_ms, 200.0);
    }

    #[test]
    fn health_is_unknown_until_first_request() {
        let store = MetricsStore::new();
        let health = store.health();
        assert_eq!(health.service_status, ServiceStatus::Unknown);
        assert_eq!(health.total_requests, 0);
        assert_eq!(health.overall_error_rate, 0.0);
        assert_eq!(health.endpoints_count, 0);
    }

    #[test]
    fn health_boundary_is_strict() {
        // Exactly 5% errors: 1 failure in 20 → degraded.
        let store = MetricsStore::new();
        store.record("GET", "/health", 500, 0.01);
        for _ in 0..19 {
            store.record("GET", "/health", 200, 0.01);
        }
        assert_eq!(store.health().service_status, ServiceStatus::Degraded);

        // 1 failure in 21 is below the threshold → healthy.
        let store = MetricsStore::new();
        store.record("GET", "/health", 500, 0.01);
        for _ in 0..20 {
            store.record("GET", "/health", 200, 0.01);
        }
        assert_eq!(store.health().service_status, ServiceStatus::Healthy);
    }

    #[test]
    fn first_request_failing_degrades_immediately() {
        let store = MetricsStore::new();
        store.record("POST", "/api/v1/ml/train", 500, 0.5);
        let health = store.health();
        assert_eq!(health.service_status, ServiceStatus::Degraded);
        assert_eq!(health.overall_error_rate, 1.0);
    }

    #[test]
    fn health_aggregates_across_endpoints() {
        let store = MetricsStore::new();
        store.record("GET", "/health", 200, 0.001);
        store.record("GET", "/api/v1/metrics", 200, 0.002);
        store.record("POST", "/api/v1/ml/train", 404, 0.003);

        let health = store.health();
        assert_eq!(health.total_requests, 3);
        assert_eq!(health.total_errors, 1);
        assert_eq!(health.endpoints_count, 3);
    }

    #[test]
    fn unknown_filter_is_empty_not_an_error() {
        let store = MetricsStore::new();
        store.record("GET", "/health", 200, 0.01);
        assert!(store.query(Some("GET:/never-recorded")).is_empty());
        assert_eq!(store.query(None).len(), 1);
    }

    #[test]
    fn concurrent_writers_lose_no_updates() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 250;

        let store = Arc::new(MetricsStore::new());
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || {
                    for _ in 0..PER_THREAD {
                        // 0.5 is exactly representable, so the sum must be exact.
                        store.record("GET", "/api/v1/metrics", 200, 0.5);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let view = single(&store, "GET:/api/v1/metrics");
        assert_eq!(view.total_requests, (THREADS * PER_THREAD) as u64);
        assert_eq!(view.avg_response_time_ms, 500.0);

        let raw = store.raw_snapshot();
        assert_eq!(raw.len(), 1);
        assert_eq!(raw[0].total_time, THREADS as f64 * PER_THREAD as f64 * 0.5);
    }

    #[test]
    fn last_access_is_set_on_record() {
        let store = MetricsStore::new();
        store.record("GET", "/health", 200, 0.01);
        let view = single(&store, "GET:/health");
        let stamp = view.last_access.expect("last_access set after a record");
        assert!(DateTime::parse_from_rfc3339(&stamp).is_ok());
    }
}
