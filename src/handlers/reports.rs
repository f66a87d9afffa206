use axum::Json;
use chrono::{Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use super::{round2, AppError};

const REPORT_TEMPLATES: &[(&str, &str)] = &[
    ("executive_summary", "Executive Summary Report"),
    ("detailed_analysis", "Detailed Analysis Report"),
    ("data_quality", "Data Quality Report"),
    ("ml_performance", "Machine Learning Performance Report"),
    ("custom", "Custom Report"),
];

const EXPORT_FORMATS: &[&str] = &["pdf", "html", "docx", "json", "csv"];

const RETENTION_DAYS: i64 = 30;

// ─── Request / response types ────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default = "default_report_type")]
    pub report_type: String,
    #[serde(default = "default_sections")]
    pub include_sections: Vec<String>,
    pub date_range: Option<DateRange>,
    #[serde(default = "default_data_sources")]
    pub data_sources: Vec<String>,
}

fn default_report_type() -> String {
    "detailed_analysis".into()
}

fn default_sections() -> Vec<String> {
    ["summary", "analysis", "visualizations", "recommendations"]
        .map(String::from)
        .to_vec()
}

fn default_data_sources() -> Vec<String> {
    vec!["primary_dataset".into()]
}

#[derive(Debug, Serialize)]
pub struct ReportMetadata {
    pub report_id: String,
    pub report_type: String,
    pub title: String,
    pub generated_at: String,
    pub date_range: DateRange,
    pub sections_included: Vec<String>,
    pub total_pages: usize,
    pub data_sources: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub status: &'static str,
    pub report_metadata: ReportMetadata,
    pub report_content: BTreeMap<String, Value>,
    pub available_exports: &'static [&'static str],
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub report_id: Option<String>,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_true")]
    pub include_attachments: bool,
}

fn default_format() -> String {
    "pdf".into()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub status: &'static str,
    pub export_id: String,
    pub report_id: String,
    pub format: String,
    pub download_url: String,
    pub file_size_bytes: u64,
    pub include_attachments: bool,
    pub expires_at: String,
    pub message: &'static str,
}

// ─── POST /api/v1/reports/generate ───────────────────────────────
/// Builds a report skeleton from a known template, one synthesized
/// content block per requested section.

pub async fn generate_report(
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let title = REPORT_TEMPLATES
        .iter()
        .find(|(key, _)| *key == req.report_type)
        .map(|(_, title)| (*title).to_owned())
        .ok_or_else(|| {
            let known: Vec<&str> = REPORT_TEMPLATES.iter().map(|(k, _)| *k).collect();
            AppError::BadRequest(format!(
                "Unknown report type '{}'. Available: {known:?}",
                req.report_type
            ))
        })?;

    if req.include_sections.is_empty() {
        return Err(AppError::BadRequest("No sections requested".into()));
    }

    let now = Utc::now();
    let date_range = req.date_range.unwrap_or_else(|| DateRange {
        start: (now - Duration::days(30)).to_rfc3339(),
        end: now.to_rfc3339(),
    });

    let report_content: BTreeMap<String, Value> = req
        .include_sections
        .iter()
        .map(|section| (section.clone(), section_content(section)))
        .collect();

    let mut rng = rand::thread_rng();
    let metadata = ReportMetadata {
        report_id: format!("report_{}", now.format("%Y%m%d_%H%M%S")),
        report_type: req.report_type.clone(),
        title,
        generated_at: now.to_rfc3339(),
        date_range,
        sections_included: req.include_sections,
        // 2 pages of front matter plus a few per section.
        total_pages: 2 + report_content.len() * rng.gen_range(2..5),
        data_sources: req.data_sources,
    };

    Ok(Json(GenerateResponse {
        status: "success",
        message: format!("{} report generated successfully", req.report_type),
        report_metadata: metadata,
        report_content,
        available_exports: EXPORT_FORMATS,
    }))
}

// ─── POST /api/v1/reports/export ─────────────────────────────────

pub async fn export_report(
    Json(req): Json<ExportRequest>,
) -> Result<Json<ExportResponse>, AppError> {
    let report_id = req
        .report_id
        .ok_or_else(|| AppError::BadRequest("No report_id provided".into()))?;

    if !EXPORT_FORMATS.contains(&req.format.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Unsupported export format '{}'. Supported: {EXPORT_FORMATS:?}",
            req.format
        )));
    }

    let mut rng = rand::thread_rng();
    let export_id = format!("exp_{}", &uuid::Uuid::new_v4().to_string()[..8]);

    Ok(Json(ExportResponse {
        status: "success",
        download_url: format!("/exports/{export_id}.{}", req.format),
        export_id,
        report_id,
        format: req.format,
        file_size_bytes: rng.gen_range(50_000..5_000_000),
        include_attachments: req.include_attachments,
        expires_at: (Utc::now() + Duration::days(RETENTION_DAYS)).to_rfc3339(),
        message: "Report export prepared",
    }))
}

// ─── Helpers ─────────────────────────────────────────────────────

fn section_content(section: &str) -> Value {
    let mut rng = rand::thread_rng();
    match section {
        "summary" => json!({
            "headline": "Dataset within expected quality bounds",
            "records_analyzed": rng.gen_range(5_000..50_000),
            "key_findings": [
                "No critical anomalies detected",
                "Seasonal trend present in primary series",
            ],
        }),
        "analysis" => json!({
            "mean_growth_pct": round2(rng.gen_range(-2.0..8.0)),
            "volatility_index": round2(rng.gen_range(0.1..2.5)),
            "segments_compared": rng.gen_range(2..8),
        }),
        "visualizations" => json!({
            "charts": ["trend_line", "category_breakdown", "distribution_histogram"],
        }),
        "recommendations" => json!([
            "Increase sampling frequency for volatile segments",
            "Re-train prediction models monthly",
        ]),
        other => json!({
            "note": format!("Section '{other}' has no dedicated template"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_sections_have_templates() {
        for section in ["summary", "analysis", "visualizations", "recommendations"] {
            assert!(section_content(section) != Value::Null);
        }
        let fallback = section_content("appendix");
        assert!(fallback["note"].as_str().unwrap().contains("appendix"));
    }
}
