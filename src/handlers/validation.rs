use axum::Json;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{round2, round3, AppError};

const DEFAULT_QUALITY_THRESHOLD: f64 = 0.8;
const QUALITY_DIMENSIONS: &[&str] = &["completeness", "uniqueness", "consistency", "validity"];
const KNOWN_COLUMN_TYPES: &[&str] = &["integer", "float", "string", "boolean", "datetime"];

// ─── Request / response types ────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct QualityRequest {
    #[serde(default = "default_quality_threshold")]
    pub threshold: f64,
    #[serde(default = "default_quality_columns")]
    pub columns: Vec<String>,
}

fn default_quality_threshold() -> f64 {
    DEFAULT_QUALITY_THRESHOLD
}

fn default_quality_columns() -> Vec<String> {
    vec!["column1".into(), "column2".into(), "column3".into()]
}

#[derive(Debug, Serialize)]
pub struct QualityIssue {
    pub column: String,
    pub dimension: &'static str,
    pub severity: &'static str,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct QualityResponse {
    pub status: &'static str,
    pub overall_score: f64,
    pub dimension_scores: BTreeMap<&'static str, f64>,
    pub passed: bool,
    pub threshold: f64,
    pub issues: Vec<QualityIssue>,
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct SchemaRequest {
    #[serde(default = "default_schema")]
    pub schema: BTreeMap<String, String>,
    #[serde(default)]
    pub strict_mode: bool,
}

fn default_schema() -> BTreeMap<String, String> {
    [
        ("id".to_owned(), "integer".to_owned()),
        ("name".to_owned(), "string".to_owned()),
        ("value".to_owned(), "float".to_owned()),
    ]
    .into()
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnValidation {
    pub column: String,
    pub expected_type: String,
    pub observed_type: String,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SchemaSummary {
    pub total_columns_validated: usize,
    pub passed_validations: usize,
    pub failed_validations: usize,
    pub strict_mode: bool,
}

#[derive(Debug, Serialize)]
pub struct SchemaResponse {
    pub status: &'static str,
    pub schema_valid: bool,
    pub validation_results: Vec<ColumnValidation>,
    pub compliance_percentage: f64,
    pub summary: SchemaSummary,
    pub violations: Vec<ColumnValidation>,
    pub message: &'static str,
}

// ─── POST /api/v1/validation/quality ─────────────────────────────
/// Synthesizes a quality assessment: one score per dimension plus an
/// overall mean judged against the pass threshold.

pub async fn check_data_quality(
    Json(req): Json<QualityRequest>,
) -> Result<Json<QualityResponse>, AppError> {
    if !(0.0..=1.0).contains(&req.threshold) {
        return Err(AppError::BadRequest(
            "threshold must be between 0 and 1".into(),
        ));
    }
    if req.columns.is_empty() {
        return Err(AppError::BadRequest("No columns provided".into()));
    }

    let mut rng = rand::thread_rng();
    let mut dimension_scores = BTreeMap::new();
    for dim in QUALITY_DIMENSIONS {
        dimension_scores.insert(*dim, round3(rng.gen_range(0.7..1.0)));
    }
    let overall_score = round3(
        dimension_scores.values().sum::<f64>() / dimension_scores.len() as f64,
    );

    // Low-scoring dimensions get a synthetic finding on a random column.
    let issues: Vec<QualityIssue> = dimension_scores
        .iter()
        .filter(|(_, score)| **score < 0.85)
        .map(|(dim, score)| {
            let column = &req.columns[rng.gen_range(0..req.columns.len())];
            QualityIssue {
                column: column.clone(),
                dimension: *dim,
                severity: if *score < 0.75 { "high" } else { "medium" },
                description: format!("{dim} score {score} is below the recommended 0.85"),
            }
        })
        .collect();

    Ok(Json(QualityResponse {
        status: "success",
        passed: overall_score >= req.threshold,
        overall_score,
        dimension_scores,
        threshold: req.threshold,
        issues,
        message: "Data quality assessment completed",
    }))
}

// ─── POST /api/v1/validation/schema ──────────────────────────────
/// Checks each declared column against a synthesized observed type;
/// strict mode fails more aggressively.

pub async fn validate_schema(
    Json(req): Json<SchemaRequest>,
) -> Result<Json<SchemaResponse>, AppError> {
    if req.schema.is_empty() {
        return Err(AppError::BadRequest("No schema provided".into()));
    }

    let mut rng = rand::thread_rng();
    let pass_probability = if req.strict_mode { 0.7 } else { 0.9 };

    let validation_results: Vec<ColumnValidation> = req
        .schema
        .iter()
        .map(|(column, expected)| {
            let pass = rng.gen_bool(pass_probability);
            let observed = if pass {
                expected.clone()
            } else {
                random_other_type(&mut rng, expected)
            };
            ColumnValidation {
                column: column.clone(),
                expected_type: expected.clone(),
                observed_type: observed,
                status: if pass { "pass" } else { "fail" },
            }
        })
        .collect();

    let passed = validation_results
        .iter()
        .filter(|r| r.status == "pass")
        .count();
    let total = validation_results.len();
    let violations: Vec<ColumnValidation> = validation_results
        .iter()
        .filter(|r| r.status == "fail")
        .cloned()
        .collect();

    Ok(Json(SchemaResponse {
        status: "success",
        schema_valid: violations.is_empty(),
        compliance_percentage: round2(passed as f64 / total as f64 * 100.0),
        summary: SchemaSummary {
            total_columns_validated: total,
            passed_validations: passed,
            failed_validations: total - passed,
            strict_mode: req.strict_mode,
        },
        validation_results,
        violations,
        message: "Schema validation completed",
    }))
}

// ─── Helpers ─────────────────────────────────────────────────────

fn random_other_type(rng: &mut impl Rng, expected: &str) -> String {
    loop {
        let candidate = KNOWN_COLUMN_TYPES[rng.gen_range(0..KNOWN_COLUMN_TYPES.len())];
        if candidate != expected {
            return candidate.to_owned();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_type_never_equals_expected() {
        let mut rng = rand::thread_rng();
        for _ in 0..50 {
            assert_ne!(random_other_type(&mut rng, "integer"), "integer");
        }
    }
}
