use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::Config;
use crate::handlers;
use crate::metrics::http as metrics_http;
use crate::middleware::tracking;
use crate::AppState;

/// Builds the full Axum `Router` with all routes and middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/health", get(handlers::system::health_check))
        // ── Data processing ─────────────────────────────────────
        .route("/api/v1/data/upload", post(handlers::data::upload_data))
        .route("/api/v1/data/clean", post(handlers::data::clean_data))
        // ── Statistical analysis ────────────────────────────────
        .route(
            "/api/v1/analysis/descriptive",
            post(handlers::analysis::descriptive_analysis),
        )
        .route(
            "/api/v1/analysis/correlation",
            post(handlers::analysis::correlation_analysis),
        )
        // ── Visualization ───────────────────────────────────────
        .route(
            "/api/v1/visualization/chart",
            post(handlers::visualization::generate_chart),
        )
        .route(
            "/api/v1/visualization/dashboard",
            post(handlers::visualization::create_dashboard),
        )
        // ── Machine learning ────────────────────────────────────
        .route("/api/v1/ml/train", post(handlers::ml::train_model))
        .route("/api/v1/ml/predict", post(handlers::ml::make_prediction))
        // ── Validation ──────────────────────────────────────────
        .route(
            "/api/v1/validation/quality",
            post(handlers::validation::check_data_quality),
        )
        .route(
            "/api/v1/validation/schema",
            post(handlers::validation::validate_schema),
        )
        // ── Reports ─────────────────────────────────────────────
        .route(
            "/api/v1/reports/generate",
            post(handlers::reports::generate_report),
        )
        .route(
            "/api/v1/reports/export",
            post(handlers::reports::export_report),
        )
        // ── Metrics & monitoring ────────────────────────────────
        .route("/api/v1/metrics", get(metrics_http::get_metrics))
        .route(
            "/api/v1/metrics/health",
            get(metrics_http::get_health_metrics),
        )
        .route("/api/v1/metrics/stream", get(metrics_http::metrics_stream))
        .route("/metrics", get(metrics_http::prometheus_metrics))
        // ── JSON fallback for unknown routes ────────────────────
        .fallback(handlers::not_found)
        // ── Provide shared state to all routes above ────────────
        .with_state(state.clone())
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(axum_mw::from_fn_with_state(state, tracking::track_requests))
        .layer(body_limit)
        .layer(cors)
}

/// Permissive CORS unless an explicit origin list is configured.
fn cors_layer(config: &Config) -> CorsLayer {
    match &config.cors_origins {
        None => CorsLayer::permissive(),
        Some(origins) => {
            let parsed: Vec<HeaderValue> =
                origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(parsed))
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}
