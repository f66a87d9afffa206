use axum::Json;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{round2, AppError};

pub const SUPPORTED_CHART_TYPES: &[&str] = &[
    "line", "bar", "scatter", "histogram", "box", "violin", "heatmap", "pie", "area", "bubble",
    "sunburst",
];

const DEFAULT_WIDTH: u32 = 800;
const DEFAULT_HEIGHT: u32 = 600;

// ─── Request / response types ────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChartRequest {
    #[serde(default = "default_chart_type")]
    pub chart_type: String,
    #[serde(default)]
    pub config: ChartConfig,
}

fn default_chart_type() -> String {
    "bar".into()
}

#[derive(Debug, Deserialize)]
pub struct ChartConfig {
    pub title: Option<String>,
    #[serde(default = "default_points")]
    pub points: usize,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            title: None,
            points: default_points(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

fn default_points() -> usize {
    12
}
fn default_width() -> u32 {
    DEFAULT_WIDTH
}
fn default_height() -> u32 {
    DEFAULT_HEIGHT
}

#[derive(Debug, Serialize)]
pub struct ChartResponse {
    pub status: &'static str,
    pub chart_id: String,
    pub chart_type: String,
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub chart_data: Value,
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct DashboardRequest {
    #[serde(default = "default_dashboard_title")]
    pub title: String,
    #[serde(default = "default_dashboard_charts")]
    pub charts: Vec<String>,
}

fn default_dashboard_title() -> String {
    "Analytics Dashboard".into()
}

fn default_dashboard_charts() -> Vec<String> {
    vec!["line".into(), "bar".into(), "pie".into()]
}

#[derive(Debug, Serialize)]
pub struct DashboardPanel {
    pub panel_id: String,
    pub chart_type: String,
    pub row: usize,
    pub col: usize,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub status: &'static str,
    pub dashboard_id: String,
    pub title: String,
    pub panels: Vec<DashboardPanel>,
    pub layout: DashboardLayout,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DashboardLayout {
    pub rows: usize,
    pub cols: usize,
}

// ─── POST /api/v1/visualization/chart ────────────────────────────

pub async fn generate_chart(
    Json(req): Json<ChartRequest>,
) -> Result<Json<ChartResponse>, AppError> {
    validate_chart_type(&req.chart_type)?;

    let title = req
        .config
        .title
        .unwrap_or_else(|| format!("{} chart", req.chart_type));

    Ok(Json(ChartResponse {
        status: "success",
        chart_id: format!("cht_{}", &uuid::Uuid::new_v4().to_string()[..8]),
        chart_data: synthesize_chart_data(&req.chart_type, req.config.points),
        chart_type: req.chart_type,
        title,
        width: req.config.width,
        height: req.config.height,
        message: "Chart generated successfully",
    }))
}

// ─── POST /api/v1/visualization/dashboard ────────────────────────
/// Lays the requested charts out on a two-column grid.

pub async fn create_dashboard(
    Json(req): Json<DashboardRequest>,
) -> Result<Json<DashboardResponse>, AppError> {
    if req.charts.is_empty() {
        return Err(AppError::BadRequest("No charts requested".into()));
    }
    for chart_type in &req.charts {
        validate_chart_type(chart_type)?;
    }

    const COLS: usize = 2;
    let panels: Vec<DashboardPanel> = req
        .charts
        .iter()
        .enumerate()
        .map(|(i, chart_type)| DashboardPanel {
            panel_id: format!("pnl_{}", &uuid::Uuid::new_v4().to_string()[..8]),
            chart_type: chart_type.clone(),
            row: i / COLS,
            col: i % COLS,
        })
        .collect();

    Ok(Json(DashboardResponse {
        status: "success",
        dashboard_id: format!("dsh_{}", &uuid::Uuid::new_v4().to_string()[..8]),
        title: req.title,
        layout: DashboardLayout {
            rows: panels.len().div_ceil(COLS),
            cols: COLS,
        },
        panels,
        message: "Dashboard created successfully",
    }))
}

// ─── Helpers ─────────────────────────────────────────────────────

fn validate_chart_type(chart_type: &str) -> Result<(), AppError> {
    if SUPPORTED_CHART_TYPES.contains(&chart_type) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "Unsupported chart type '{chart_type}'. Supported types: {SUPPORTED_CHART_TYPES:?}"
        )))
    }
}

fn synthesize_chart_data(chart_type: &str, points: usize) -> Value {
    let mut rng = rand::thread_rng();
    let points = points.clamp(1, 500);

    match chart_type {
        "scatter" | "bubble" => {
            let samples: Vec<Value> = (0..points)
                .map(|_| {
                    let mut p = json!({
                        "x": round2(rng.gen_range(0.0..100.0)),
                        "y": round2(rng.gen_range(0.0..100.0)),
                    });
                    if chart_type == "bubble" {
                        p["size"] = json!(round2(rng.gen_range(1.0..30.0)));
                    }
                    p
                })
                .collect();
            json!({ "points": samples })
        }
        _ => {
            let labels: Vec<String> = (1..=points).map(|i| format!("P{i}")).collect();
            let values: Vec<f64> = (0..points)
                .map(|_| round2(rng.gen_range(0.0..100.0)))
                .collect();
            json!({ "labels": labels, "values": values })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_supported_type_passes_validation() {
        for t in SUPPORTED_CHART_TYPES {
            assert!(validate_chart_type(t).is_ok());
        }
        assert!(validate_chart_type("gantt").is_err());
    }

    #[test]
    fn scatter_data_has_coordinates_and_bar_data_has_labels() {
        let scatter = synthesize_chart_data("scatter", 5);
        assert_eq!(scatter["points"].as_array().unwrap().len(), 5);
        assert!(scatter["points"][0].get("x").is_some());

        let bar = synthesize_chart_data("bar", 4);
        assert_eq!(bar["labels"].as_array().unwrap().len(), 4);
        assert_eq!(bar["values"].as_array().unwrap().len(), 4);
    }
}
