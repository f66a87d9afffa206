use axum::Json;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{round2, round3, AppError};

const CORRELATION_METHODS: &[&str] = &["pearson", "spearman", "kendall"];

// ─── Request / response types ────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DescriptiveRequest {
    #[serde(default = "default_columns")]
    pub columns: Vec<String>,
}

fn default_columns() -> Vec<String> {
    vec!["column1".into(), "column2".into(), "column3".into()]
}

#[derive(Debug, Serialize)]
pub struct ColumnStats {
    pub count: u32,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub q1: f64,
    pub q3: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

#[derive(Debug, Serialize)]
pub struct DescriptiveResponse {
    pub status: &'static str,
    pub descriptive_statistics: BTreeMap<String, ColumnStats>,
    pub summary: AnalysisSummary,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct AnalysisSummary {
    pub total_columns_analyzed: usize,
    pub analysis_type: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct CorrelationRequest {
    #[serde(default = "default_columns")]
    pub columns: Vec<String>,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default = "default_threshold")]
    pub significance_threshold: f64,
}

fn default_method() -> String {
    "pearson".into()
}

fn default_threshold() -> f64 {
    0.5
}

#[derive(Debug, Serialize)]
pub struct CorrelatedPair {
    pub column_1: String,
    pub column_2: String,
    pub correlation: f64,
    pub strength: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CorrelationResponse {
    pub status: &'static str,
    pub method: String,
    pub correlation_matrix: BTreeMap<String, BTreeMap<String, f64>>,
    pub significant_correlations: Vec<CorrelatedPair>,
    pub summary: CorrelationSummary,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CorrelationSummary {
    pub total_columns: usize,
    pub significant_pairs: usize,
    pub significance_threshold: f64,
}

// ─── POST /api/v1/analysis/descriptive ───────────────────────────
/// Synthesizes per-column descriptive statistics for the requested
/// columns.

pub async fn descriptive_analysis(
    Json(req): Json<DescriptiveRequest>,
) -> Result<Json<DescriptiveResponse>, AppError> {
    if req.columns.is_empty() {
        return Err(AppError::BadRequest("No columns provided".into()));
    }

    let mut rng = rand::thread_rng();
    let mut stats = BTreeMap::new();
    for column in &req.columns {
        stats.insert(
            column.clone(),
            ColumnStats {
                count: rng.gen_range(900..1000),
                mean: round2(rng.gen_range(35.0..65.0)),
                std: round2(rng.gen_range(5.0..20.0)),
                min: round2(rng.gen_range(0.0..20.0)),
                max: round2(rng.gen_range(80.0..100.0)),
                median: round2(rng.gen_range(40.0..60.0)),
                q1: round2(rng.gen_range(30.0..45.0)),
                q3: round2(rng.gen_range(55.0..70.0)),
                skewness: round3(rng.gen_range(-1.0..1.0)),
                kurtosis: round3(rng.gen_range(-2.0..2.0)),
            },
        );
    }

    Ok(Json(DescriptiveResponse {
        status: "success",
        summary: AnalysisSummary {
            total_columns_analyzed: req.columns.len(),
            analysis_type: "descriptive",
        },
        descriptive_statistics: stats,
        message: "Descriptive analysis completed successfully",
    }))
}

// ─── POST /api/v1/analysis/correlation ───────────────────────────
/// Synthesizes a symmetric correlation matrix and extracts the pairs
/// above the significance threshold.

pub async fn correlation_analysis(
    Json(req): Json<CorrelationRequest>,
) -> Result<Json<CorrelationResponse>, AppError> {
    if !CORRELATION_METHODS.contains(&req.method.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Unsupported correlation method '{}'. Supported: {CORRELATION_METHODS:?}",
            req.method
        )));
    }
    if req.columns.len() < 2 {
        return Err(AppError::BadRequest(
            "Correlation analysis requires at least two columns".into(),
        ));
    }

    let mut rng = rand::thread_rng();
    let mut matrix: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
    let mut significant = Vec::new();

    for (i, col_a) in req.columns.iter().enumerate() {
        for (j, col_b) in req.columns.iter().enumerate() {
            if j < i {
                continue;
            }
            let value = if i == j {
                1.0
            } else {
                round3(rng.gen_range(-0.8..0.8))
            };
            matrix
                .entry(col_a.clone())
                .or_default()
                .insert(col_b.clone(), value);
            matrix
                .entry(col_b.clone())
                .or_default()
                .insert(col_a.clone(), value);

            if i != j && value.abs() >= req.significance_threshold {
                significant.push(CorrelatedPair {
                    column_1: col_a.clone(),
                    column_2: col_b.clone(),
                    correlation: value,
                    strength: if value.abs() >= 0.7 { "strong" } else { "moderate" },
                });
            }
        }
    }

    Ok(Json(CorrelationResponse {
        status: "success",
        method: req.method,
        summary: CorrelationSummary {
            total_columns: req.columns.len(),
            significant_pairs: significant.len(),
            significance_threshold: req.significance_threshold,
        },
        correlation_matrix: matrix,
        significant_correlations: significant,
        message: "Correlation analysis completed successfully",
    }))
}
