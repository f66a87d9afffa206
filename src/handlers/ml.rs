use axum::Json;
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{round4, AppError};

const CLASSIFICATION_ALGORITHMS: &[&str] = &["random_forest", "logistic_regression", "svm"];
const REGRESSION_ALGORITHMS: &[&str] = &["random_forest", "linear_regression", "svm"];

// ─── Request / response types ────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TrainRequest {
    #[serde(default = "default_model_type")]
    pub model_type: String,
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    pub model_name: Option<String>,
    #[serde(default = "default_test_size")]
    pub test_size: f64,
    #[serde(default = "default_cv_folds")]
    pub cv_folds: u32,
    #[serde(default = "default_n_samples")]
    pub n_samples: u32,
    #[serde(default = "default_n_features")]
    pub n_features: u32,
}

fn default_model_type() -> String {
    "classification".into()
}
fn default_algorithm() -> String {
    "random_forest".into()
}
fn default_test_size() -> f64 {
    0.2
}
fn default_cv_folds() -> u32 {
    5
}
fn default_n_samples() -> u32 {
    1000
}
fn default_n_features() -> u32 {
    10
}

/// Training metrics; which fields are present depends on the model type.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TrainingMetrics {
    Classification {
        accuracy: f64,
        cv_mean: f64,
        cv_std: f64,
        test_samples: u32,
    },
    Regression {
        mse: f64,
        rmse: f64,
        cv_mean: f64,
        cv_std: f64,
        test_samples: u32,
    },
}

#[derive(Debug, Serialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

#[derive(Debug, Serialize)]
pub struct TrainResponse {
    pub status: &'static str,
    pub model_name: String,
    pub model_type: String,
    pub algorithm: String,
    pub metrics: TrainingMetrics,
    pub feature_importance: Vec<FeatureImportance>,
    pub trained_at: String,
    pub message: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    #[serde(default = "default_model_name")]
    pub model_name: String,
    #[serde(default = "default_model_type")]
    pub model_type: String,
    #[serde(default = "default_n_predictions")]
    pub n_predictions: usize,
}

fn default_model_name() -> String {
    "model_latest".into()
}
fn default_n_predictions() -> usize {
    10
}

#[derive(Debug, Serialize)]
pub struct Prediction {
    pub index: usize,
    pub value: f64,
    pub confidence: f64,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub status: &'static str,
    pub model_name: String,
    pub predictions: Vec<Prediction>,
    pub count: usize,
    pub predicted_at: String,
    pub message: &'static str,
}

// ─── POST /api/v1/ml/train ───────────────────────────────────────
/// Validates the requested algorithm for the model type, then
/// synthesizes training metrics and feature importances.

pub async fn train_model(Json(req): Json<TrainRequest>) -> Result<Json<TrainResponse>, AppError> {
    let algorithms = match req.model_type.as_str() {
        "classification" => CLASSIFICATION_ALGORITHMS,
        "regression" => REGRESSION_ALGORITHMS,
        other => {
            return Err(AppError::BadRequest(format!(
                "Unsupported model type '{other}'. Supported: [\"classification\", \"regression\"]"
            )))
        }
    };
    if !algorithms.contains(&req.algorithm.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Unsupported {} algorithm: {}",
            req.model_type, req.algorithm
        )));
    }
    if req.test_size <= 0.0 || req.test_size >= 1.0 {
        return Err(AppError::BadRequest(
            "test_size must be between 0 and 1".into(),
        ));
    }
    if req.cv_folds < 2 {
        return Err(AppError::BadRequest("cv_folds must be at least 2".into()));
    }

    let mut rng = rand::thread_rng();
    let test_samples = (req.n_samples as f64 * req.test_size) as u32;

    let metrics = match req.model_type.as_str() {
        "classification" => {
            let accuracy = round4(rng.gen_range(0.82..0.97));
            TrainingMetrics::Classification {
                accuracy,
                cv_mean: round4(accuracy - rng.gen_range(0.0..0.03)),
                cv_std: round4(rng.gen_range(0.005..0.03)),
                test_samples,
            }
        }
        _ => {
            let mse = round4(rng.gen_range(10.0..200.0));
            TrainingMetrics::Regression {
                mse,
                rmse: round4(mse.sqrt()),
                cv_mean: round4(mse + rng.gen_range(-5.0..5.0)),
                cv_std: round4(rng.gen_range(1.0..10.0)),
                test_samples,
            }
        }
    };

    // Raw weights normalized so the importances sum to one.
    let raw: Vec<f64> = (0..req.n_features).map(|_| rng.gen_range(0.01..1.0)).collect();
    let total: f64 = raw.iter().sum();
    let feature_importance = raw
        .iter()
        .enumerate()
        .map(|(i, w)| FeatureImportance {
            feature: format!("feature_{i}"),
            importance: round4(w / total),
        })
        .collect();

    let model_name = req
        .model_name
        .unwrap_or_else(|| format!("model_{}", Utc::now().format("%Y%m%d_%H%M%S")));

    Ok(Json(TrainResponse {
        status: "success",
        model_name,
        model_type: req.model_type,
        algorithm: req.algorithm,
        metrics,
        feature_importance,
        trained_at: Utc::now().to_rfc3339(),
        message: "Model trained successfully",
    }))
}

// ─── POST /api/v1/ml/predict ─────────────────────────────────────

pub async fn make_prediction(
    Json(req): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, AppError> {
    if req.n_predictions == 0 || req.n_predictions > 10_000 {
        return Err(AppError::BadRequest(
            "n_predictions must be between 1 and 10000".into(),
        ));
    }

    let mut rng = rand::thread_rng();
    let classification = req.model_type == "classification";

    let predictions: Vec<Prediction> = (0..req.n_predictions)
        .map(|index| Prediction {
            index,
            value: if classification {
                f64::from(rng.gen_range(0..2u8))
            } else {
                round4(rng.gen_range(0.0..100.0))
            },
            confidence: round4(rng.gen_range(0.6..0.999)),
        })
        .collect();

    Ok(Json(PredictResponse {
        status: "success",
        model_name: req.model_name,
        count: predictions.len(),
        predictions,
        predicted_at: Utc::now().to_rfc3339(),
        message: "Predictions generated successfully",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_tables_differ_by_model_type() {
        assert!(CLASSIFICATION_ALGORITHMS.contains(&"logistic_regression"));
        assert!(!REGRESSION_ALGORITHMS.contains(&"logistic_regression"));
        assert!(REGRESSION_ALGORITHMS.contains(&"linear_regression"));
    }
}
