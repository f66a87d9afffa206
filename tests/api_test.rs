//! Endpoint-level tests driven through the full router, middleware
//! included, so request tracking is exercised the way production
//! traffic exercises it.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use analytics_service::{config::Config, server, AppState};

fn test_app() -> (Arc<AppState>, Router) {
    let state = Arc::new(AppState::new(Config::from_env()));
    let router = server::create_router(state.clone());
    (state, router)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

// ─── Service health ──────────────────────────────────────────────

#[tokio::test]
async fn health_endpoint_reports_service_banner() {
    let (_, app) = test_app();

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "Data Analytics Microservice");
    assert!(body.get("services").is_none());
}

#[tokio::test]
async fn detailed_health_lists_subsystems() {
    let (_, app) = test_app();

    let response = app.oneshot(get("/health?detailed=true")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["services"]["ml_predictor"], "healthy");
    assert_eq!(body["services"]["report_generator"], "healthy");
}

// ─── Domain endpoints ────────────────────────────────────────────

#[tokio::test]
async fn descriptive_analysis_covers_requested_columns() {
    let (_, app) = test_app();

    let response = app
        .oneshot(post_json(
            "/api/v1/analysis/descriptive",
            json!({ "columns": ["age", "income"] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["summary"]["total_columns_analyzed"], 2);
    assert!(body["descriptive_statistics"]["age"]["mean"].is_number());
    assert!(body["descriptive_statistics"]["income"]["std"].is_number());
}

#[tokio::test]
async fn correlation_rejects_unknown_method() {
    let (_, app) = test_app();

    let response = app
        .oneshot(post_json(
            "/api/v1/analysis/correlation",
            json!({ "columns": ["a", "b"], "method": "cosine" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("cosine"));
    assert_eq!(body["status_code"], 400);
}

#[tokio::test]
async fn chart_generation_validates_chart_type() {
    let (_, app) = test_app();

    let ok = app
        .clone()
        .oneshot(post_json(
            "/api/v1/visualization/chart",
            json!({ "chart_type": "pie" }),
        ))
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
    let body = body_json(ok).await;
    assert_eq!(body["chart_type"], "pie");
    assert!(body["chart_id"].as_str().unwrap().starts_with("cht_"));

    let bad = app
        .oneshot(post_json(
            "/api/v1/visualization/chart",
            json!({ "chart_type": "gantt" }),
        ))
        .await
        .unwrap();
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ml_train_rejects_mismatched_algorithm() {
    let (_, app) = test_app();

    let response = app
        .oneshot(post_json(
            "/api/v1/ml/train",
            json!({ "model_type": "regression", "algorithm": "logistic_regression" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ml_train_returns_metrics_for_valid_request() {
    let (_, app) = test_app();

    let response = app
        .oneshot(post_json(
            "/api/v1/ml/train",
            json!({
                "model_type": "classification",
                "algorithm": "random_forest",
                "model_name": "churn_v2",
                "n_features": 4
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["model_name"], "churn_v2");
    assert!(body["metrics"]["accuracy"].is_number());
    assert_eq!(body["feature_importance"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn clean_data_counts_supplied_rows() {
    let (_, app) = test_app();

    let response = app
        .oneshot(post_json(
            "/api/v1/data/clean",
            json!({ "data": [{"a": 1}, {"a": 2}, {"a": 3}] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["rows_before"], 3);
    let removed =
        body["missing_values_removed"].as_u64().unwrap() + body["duplicates_removed"].as_u64().unwrap();
    assert_eq!(body["rows_after"].as_u64().unwrap(), 3 - removed);
}

#[tokio::test]
async fn csv_upload_is_parsed_for_shape() {
    let (_, app) = test_app();

    let boundary = "test-boundary";
    let payload = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"sales.csv\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         id,region,amount\n1,eu,10\n2,us,20\n\r\n\
         --{boundary}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/data/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(payload))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["filename"], "sales.csv");
    assert!(body["data_id"].as_str().unwrap().starts_with("data_"));
    assert_eq!(body["data_info"]["rows"], 2);
    assert_eq!(body["data_info"]["columns"][1], "region");
}

#[tokio::test]
async fn upload_with_unsupported_extension_is_rejected() {
    let (_, app) = test_app();

    let boundary = "test-boundary";
    let payload = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"dump.sql\"\r\n\r\n\
         select 1;\r\n\
         --{boundary}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/data/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(payload))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn report_lifecycle_generates_then_exports() {
    let (_, app) = test_app();

    let generated = app
        .clone()
        .oneshot(post_json("/api/v1/reports/generate", json!({})))
        .await
        .unwrap();
    assert_eq!(generated.status(), StatusCode::OK);
    let body = body_json(generated).await;
    let report_id = body["report_metadata"]["report_id"].as_str().unwrap().to_owned();
    assert!(report_id.starts_with("report_"));
    assert!(body["report_content"].get("summary").is_some());

    let exported = app
        .clone()
        .oneshot(post_json(
            "/api/v1/reports/export",
            json!({ "report_id": report_id, "format": "html" }),
        ))
        .await
        .unwrap();
    assert_eq!(exported.status(), StatusCode::OK);
    let body = body_json(exported).await;
    assert!(body["download_url"].as_str().unwrap().ends_with(".html"));

    let missing_id = app
        .oneshot(post_json("/api/v1/reports/export", json!({ "format": "pdf" })))
        .await
        .unwrap();
    assert_eq!(missing_id.status(), StatusCode::BAD_REQUEST);
}

// ─── Metrics & monitoring ────────────────────────────────────────

#[tokio::test]
async fn requests_are_tracked_per_endpoint() {
    let (state, app) = test_app();

    for _ in 0..2 {
        let response = app.clone().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    // A failing request counts as an error for its own endpoint.
    let bad = app
        .clone()
        .oneshot(post_json(
            "/api/v1/visualization/chart",
            json!({ "chart_type": "gantt" }),
        ))
        .await
        .unwrap();
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

    let response = app.clone().oneshot(get("/api/v1/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(body["GET:/health"]["total_requests"], 2);
    assert_eq!(body["GET:/health"]["total_errors"], 0);
    assert_eq!(body["POST:/api/v1/visualization/chart"]["total_errors"], 1);

    // The store saw the same traffic the HTTP view reports.
    let health = state.metrics.health();
    assert_eq!(health.total_errors, 1);
}

#[tokio::test]
async fn metrics_endpoint_filter_selects_one_key() {
    let (_, app) = test_app();

    app.clone().oneshot(get("/health")).await.unwrap();
    app.clone()
        .oneshot(get("/api/v1/metrics/health"))
        .await
        .unwrap();

    let filtered = app
        .clone()
        .oneshot(get("/api/v1/metrics?endpoint=GET:/health"))
        .await
        .unwrap();
    let body = body_json(filtered).await;
    assert_eq!(body.as_object().unwrap().len(), 1);
    assert!(body.get("GET:/health").is_some());

    let unknown = app
        .oneshot(get("/api/v1/metrics?endpoint=GET:/missing"))
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::OK);
    let body = body_json(unknown).await;
    assert!(body.as_object().unwrap().is_empty());
}

#[tokio::test]
async fn metrics_health_starts_unknown_then_turns_healthy() {
    let (_, app) = test_app();

    // The reading request itself is only recorded after the handler
    // responds, so the very first view sees an empty store.
    let first = app
        .clone()
        .oneshot(get("/api/v1/metrics/health"))
        .await
        .unwrap();
    let body = body_json(first).await;
    assert_eq!(body["service_status"], "unknown");
    assert_eq!(body["total_requests"], 0);

    let second = app.oneshot(get("/api/v1/metrics/health")).await.unwrap();
    let body = body_json(second).await;
    assert_eq!(body["service_status"], "healthy");
    assert_eq!(body["total_requests"], 1);
    assert_eq!(body["endpoints_count"], 1);
}

#[tokio::test]
async fn prometheus_endpoint_serves_plaintext_exposition() {
    let (_, app) = test_app();

    let warm = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(warm.status(), StatusCode::OK);

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );

    let text = body_text(response).await;
    assert!(text.contains("# TYPE service_uptime_seconds counter"));
    assert!(text.contains(r#"http_requests_total{method="GET",endpoint="/health"} 1"#));
    assert!(text.contains(r#"http_errors_total{method="GET",endpoint="/health"} 0"#));
}

#[tokio::test]
async fn metrics_stream_answers_with_server_sent_events() {
    let (_, app) = test_app();

    let response = app
        .oneshot(get("/api/v1/metrics/stream"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/event-stream"));
}

// ─── Fallbacks ───────────────────────────────────────────────────

#[tokio::test]
async fn unknown_route_yields_json_404() {
    let (_, app) = test_app();

    let response = app.oneshot(get("/api/v1/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Endpoint not found");
    assert_eq!(body["status_code"], 404);
}
