use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;

use crate::AppState;

/// Times every request and records its outcome in the metrics store.
///
/// Runs after `next.run()` on every path — handler errors surface here
/// as plain responses with a status code, so failed requests are
/// counted the same way successful ones are. Dynamic routes are
/// bucketed under their route template (e.g. `/api/v1/metrics`), not
/// the concrete URI, so one endpoint maps to one aggregation key.
pub async fn track_requests(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());

    let start = Instant::now();
    let response = next.run(req).await;
    let elapsed = start.elapsed().as_secs_f64();

    let status = response.status().as_u16();
    state
        .metrics
        .record(method.as_str(), &endpoint, status, elapsed);

    tracing::info!(
        method = %method,
        endpoint = %endpoint,
        status,
        elapsed_ms = elapsed * 1000.0,
        "request completed"
    );

    response
}
