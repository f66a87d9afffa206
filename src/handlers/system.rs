use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::AppState;

pub const SERVICE_NAME: &str = "Data Analytics Microservice";

/// Feature subsystems reported by the detailed health view.
const SUBSYSTEMS: &[&str] = &[
    "data_processor",
    "statistical_analyzer",
    "visualization_service",
    "ml_predictor",
    "data_validator",
    "report_generator",
];

#[derive(Debug, Deserialize)]
pub struct HealthQuery {
    #[serde(default)]
    pub detailed: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: String,
    pub service: &'static str,
    pub version: String,
    pub environment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<BTreeMap<&'static str, &'static str>>,
}

// ─── GET /health ─────────────────────────────────────────────────
/// Liveness probe. `?detailed=true` adds a per-subsystem breakdown.

pub async fn health_check(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HealthQuery>,
) -> Json<HealthStatus> {
    let services = query
        .detailed
        .then(|| SUBSYSTEMS.iter().map(|s| (*s, "healthy")).collect());

    Json(HealthStatus {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339(),
        service: SERVICE_NAME,
        version: state.config.version.clone(),
        environment: state.config.environment.clone(),
        services,
    })
}
