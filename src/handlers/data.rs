use axum::{
    extract::{Multipart, State},
    Json,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::AppState;

use super::AppError;

const SUPPORTED_EXTENSIONS: &[&str] = &["csv", "json", "xlsx", "xls"];

// ─── Domain types ────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct DataInfo {
    pub rows: usize,
    pub columns: Vec<String>,
    pub column_count: usize,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: &'static str,
    pub data_id: String,
    pub filename: String,
    pub file_size: usize,
    pub data_info: DataInfo,
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct CleanRequest {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default = "default_true")]
    pub drop_missing: bool,
    #[serde(default = "default_true")]
    pub drop_duplicates: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct CleanResponse {
    pub status: &'static str,
    pub rows_before: usize,
    pub missing_values_removed: usize,
    pub duplicates_removed: usize,
    pub rows_after: usize,
    pub operations: Vec<&'static str>,
    pub message: &'static str,
}

// ─── POST /api/v1/data/upload ────────────────────────────────────
/// Multipart intake. The file must arrive in a `file` field with a
/// supported extension; csv/json payloads are inspected for a row and
/// column summary.

pub async fn upload_data(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_owned();
        if filename.is_empty() {
            return Err(AppError::BadRequest("No file selected".into()));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?;
        upload = Some((filename, bytes.to_vec()));
        break;
    }

    let (filename, bytes) =
        upload.ok_or_else(|| AppError::BadRequest("No file provided".into()))?;

    let max = state.config.max_upload_bytes;
    if bytes.len() > max {
        return Err(AppError::PayloadTooLarge(format!(
            "File too large. Maximum size: {}MB",
            max / (1024 * 1024)
        )));
    }

    let extension = filename
        .rsplit('.')
        .next()
        .map(str::to_lowercase)
        .unwrap_or_default();
    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Unsupported file format. Supported: {SUPPORTED_EXTENSIONS:?}"
        )));
    }

    let data_info = match extension.as_str() {
        "csv" => csv_info(&bytes),
        "json" => json_info(&bytes)?,
        // Binary spreadsheet formats are accepted but not parsed; the
        // demo synthesizes a plausible shape like every other endpoint.
        _ => synthesized_info(),
    };

    Ok(Json(UploadResponse {
        status: "success",
        data_id: format!("data_{}", &uuid::Uuid::new_v4().to_string()[..8]),
        filename,
        file_size: bytes.len(),
        data_info,
        message: "Data uploaded and processed successfully",
    }))
}

// ─── POST /api/v1/data/clean ─────────────────────────────────────

pub async fn clean_data(Json(req): Json<CleanRequest>) -> Json<CleanResponse> {
    let mut rng = rand::thread_rng();

    let rows_before = match &req.data {
        Some(Value::Array(rows)) => rows.len(),
        _ => rng.gen_range(500..1500),
    };

    let missing_values_removed = if req.drop_missing && rows_before > 0 {
        rng.gen_range(0..=rows_before / 10)
    } else {
        0
    };
    let duplicates_removed = if req.drop_duplicates && rows_before > 0 {
        rng.gen_range(0..=rows_before / 20)
    } else {
        0
    };

    let mut operations = Vec::new();
    if req.drop_missing {
        operations.push("drop_missing");
    }
    if req.drop_duplicates {
        operations.push("drop_duplicates");
    }

    Json(CleanResponse {
        status: "success",
        rows_before,
        missing_values_removed,
        duplicates_removed,
        rows_after: rows_before - missing_values_removed - duplicates_removed,
        operations,
        message: "Data cleaned successfully",
    })
}

// ─── Helpers ─────────────────────────────────────────────────────

fn csv_info(bytes: &[u8]) -> DataInfo {
    let text = String::from_utf8_lossy(bytes);
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let columns: Vec<String> = lines
        .next()
        .map(|header| header.split(',').map(|c| c.trim().to_owned()).collect())
        .unwrap_or_default();
    let rows = lines.count();

    DataInfo {
        rows,
        column_count: columns.len(),
        columns,
    }
}

fn json_info(bytes: &[u8]) -> Result<DataInfo, AppError> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| AppError::BadRequest(format!("Invalid JSON payload: {e}")))?;

    let (rows, columns) = match value {
        Value::Array(rows) => {
            let columns: Vec<String> = rows
                .first()
                .and_then(Value::as_object)
                .map(|obj| obj.keys().cloned().collect())
                .unwrap_or_default();
            (rows.len(), columns)
        }
        Value::Object(map) => (1, map.keys().cloned().collect()),
        _ => {
            return Err(AppError::BadRequest(
                "JSON upload must be an object or an array of records".into(),
            ))
        }
    };

    Ok(DataInfo {
        rows,
        column_count: columns.len(),
        columns,
    })
}

fn synthesized_info() -> DataInfo {
    let mut rng = rand::thread_rng();
    let column_count = rng.gen_range(3..12);
    let columns = (1..=column_count).map(|i| format!("col_{i}")).collect();

    DataInfo {
        rows: rng.gen_range(100..10_000),
        columns,
        column_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_header_defines_columns_and_rows_exclude_it() {
        let info = csv_info(b"id,name,score\n1,a,10\n2,b,20\n\n3,c,30\n");
        assert_eq!(info.columns, vec!["id", "name", "score"]);
        assert_eq!(info.column_count, 3);
        assert_eq!(info.rows, 3);
    }

    #[test]
    fn json_array_of_records_is_summarized() {
        let info = json_info(br#"[{"a":1,"b":2},{"a":3,"b":4}]"#).unwrap();
        assert_eq!(info.rows, 2);
        assert_eq!(info.columns, vec!["a", "b"]);
    }

    #[test]
    fn json_scalar_is_rejected() {
        assert!(json_info(b"42").is_err());
        assert!(json_info(b"not json at all").is_err());
    }
}
