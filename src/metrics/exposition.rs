//! Read-side renderers over the store: the JSON summary consumed by
//! dashboards and the Prometheus text feed consumed by scrapers.
//! Neither mutates the store.

use std::collections::BTreeMap;
use std::fmt::{self, Write};

use super::store::{EndpointSummary, MetricsStore};

/// Per-endpoint derived views keyed `"METHOD:endpoint"`. The key format
/// is an external contract with dashboard clients.
pub fn summary(
    store: &MetricsStore,
    endpoint: Option<&str>,
) -> BTreeMap<String, EndpointSummary> {
    store
        .query(endpoint)
        .into_iter()
        .map(|(key, view)| (key.label(), view))
        .collect()
}

/// Prometheus text exposition: a `service_uptime_seconds` block, then one
/// requests/errors/duration block per endpoint. HELP/TYPE comments are
/// emitted per endpoint, not deduplicated per metric name.
///
/// Writing into a `String` cannot fail in practice; the `Result` exists
/// so the scrape handler has a degraded path that never reaches scrapers
/// as a hard error.
pub fn render_prometheus(store: &MetricsStore) -> Result<String, fmt::Error> {
    let mut out = String::new();

    let health = store.health();
    writeln!(out, "# HELP service_uptime_seconds Service uptime in seconds")?;
    writeln!(out, "# TYPE service_uptime_seconds counter")?;
    writeln!(out, "service_uptime_seconds {}", health.uptime_seconds)?;

    for entry in store.raw_snapshot() {
        let labels = format!(
            "method=\"{}\",endpoint=\"{}\"",
            entry.key.method, entry.key.endpoint
        );

        writeln!(out, "# HELP http_requests_total Total number of HTTP requests")?;
        writeln!(out, "# TYPE http_requests_total counter")?;
        writeln!(out, "http_requests_total{{{labels}}} {}", entry.count)?;

        writeln!(out, "# HELP http_errors_total Total number of HTTP errors")?;
        writeln!(out, "# TYPE http_errors_total counter")?;
        writeln!(out, "http_errors_total{{{labels}}} {}", entry.errors)?;

        let avg_seconds = if entry.count > 0 {
            entry.total_time / entry.count as f64
        } else {
            0.0
        };
        writeln!(out, "# HELP http_request_duration_seconds Average request duration")?;
        writeln!(out, "# TYPE http_request_duration_seconds gauge")?;
        writeln!(out, "http_request_duration_seconds{{{labels}}} {avg_seconds}")?;
    }

    Ok(out)
}
