pub mod analysis;
pub mod data;
pub mod ml;
pub mod reports;
pub mod system;
pub mod validation;
pub mod visualization;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

// ─── Unified error type ──────────────────────────────────────────

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    PayloadTooLarge(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error":       message,
            "status_code": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}

// ─── Fallback for unknown routes ─────────────────────────────────

pub async fn not_found() -> Response {
    let body = serde_json::json!({
        "error":       "Endpoint not found",
        "message":     "The requested resource was not found on this server",
        "status_code": 404,
    });
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

// ─── Shared helpers ──────────────────────────────────────────────

pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub(crate) fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

pub(crate) fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}
