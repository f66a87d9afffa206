use axum::{
    extract::{Query, State},
    http::header,
    response::sse::{Event, KeepAlive, Sse},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;

use super::exposition;
use super::store::{EndpointSummary, HealthReport};
use crate::AppState;

// ─── GET /api/v1/metrics ─────────────────────────────────────────
/// JSON summary of every endpoint, or a single one when the
/// `endpoint=METHOD:path` filter is present. An unknown filter yields
/// an empty object.

#[derive(Debug, Deserialize)]
pub struct MetricsQuery {
    pub endpoint: Option<String>,
}

pub async fn get_metrics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MetricsQuery>,
) -> Json<BTreeMap<String, EndpointSummary>> {
    Json(exposition::summary(&state.metrics, query.endpoint.as_deref()))
}

// ─── GET /api/v1/metrics/health ──────────────────────────────────

pub async fn get_health_metrics(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    Json(state.metrics.health())
}

// ─── GET /metrics ────────────────────────────────────────────────
/// Prometheus scrape endpoint. A rendering fault degrades to a
/// plain-text fallback — scrapers always get a 200 with text/plain.

pub async fn prometheus_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = match exposition::render_prometheus(&state.metrics) {
        Ok(text) => text,
        Err(err) => {
            tracing::error!(error = %err, "failed to render metrics exposition");
            "# Error generating metrics\n".to_owned()
        }
    };

    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body)
}

// ─── GET /api/v1/metrics/stream ──────────────────────────────────
/// Server-Sent Events feed: pushes the health view plus the full
/// endpoint summary as JSON every 2 seconds.

pub async fn metrics_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let interval = tokio::time::interval(Duration::from_secs(2));

    let stream = IntervalStream::new(interval).map(move |_| {
        let payload = serde_json::json!({
            "health": state.metrics.health(),
            "endpoints": exposition::summary(&state.metrics, None),
        });
        Ok(Event::default().data(payload.to_string()))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
