// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! GET /health and route registration

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use nutrivision::{
    api::create_app,
    vision::{VisionModelConfig, VisionModelManager},
};
use tower::util::ServiceExt;

use super::fixtures::{app, get, json_body, pipeline, state};

#[tokio::test]
async fn test_health_without_vision() {
    let response = get(app(), "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["vision_ready"], false);
}

#[tokio::test]
async fn test_health_reports_version_info() {
    let body = json_body(get(app(), "/health").await).await;
    let version = &body["version"];
    assert_eq!(version["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(version["build"], nutrivision::version::VERSION);
    let features = version["features"].as_array().unwrap();
    assert_eq!(features.len(), nutrivision::version::FEATURES.len());
    assert!(features.iter().any(|f| f == "nutrient-lookup"));
}

#[tokio::test]
async fn test_health_reports_model_availability() {
    let manager = VisionModelManager::new(VisionModelConfig {
        segmenter_model: Some("/nonexistent/food-seg.onnx".to_string()),
        regressor_model: Some("/nonexistent/xgboost_model.json".to_string()),
        class_features: None,
        ..VisionModelConfig::default()
    })
    .await
    .unwrap();

    let app = create_app(state().with_vision(&manager));
    let body = json_body(get(app, "/health").await).await;
    assert_eq!(body["vision_ready"], false);
    let models = body["models"].as_array().unwrap();
    assert_eq!(models.len(), 3);
    assert!(models.iter().all(|m| m["available"] == false));

    let app = create_app(state().with_pipeline(pipeline(Some(1.0), Some("oat"), 1.0)));
    let body = json_body(get(app, "/health").await).await;
    assert_eq!(body["vision_ready"], true);
}

#[tokio::test]
async fn test_wrong_methods_and_unknown_routes() {
    let response = app()
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/v1/estimate")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let response = get(app(), "/v1/unknown").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_headers_present() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("origin", "http://localhost:8501")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}
