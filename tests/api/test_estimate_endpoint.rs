// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /v1/estimate with stage doubles in place of the loaded models

use axum::http::StatusCode;
use nutrivision::{api::create_app, nutrition::NameMapper};
use serde_json::json;

use super::fixtures::{json_body, photo_base64, pipeline, post_json, state};

fn request(image: &str) -> String {
    json!({ "image": image }).to_string()
}

#[tokio::test]
async fn test_estimate_with_nutrients() {
    // 200 mask pixels at 10 px/cm = 2 cm², 75 g per cm²
    let app = create_app(state().with_pipeline(pipeline(Some(10.0), Some("banana"), 75.0)));
    let response = post_json(app, "/v1/estimate", request(&photo_base64())).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["food_type"], "banana");
    assert_eq!(body["food_name"], "banana");
    assert_eq!(body["predicted_weight"], 150.0);
    assert_eq!(body["pixels_per_cm"], 10.0);
    assert_eq!(body["marker_id"], 3);
    assert_eq!(body["features"]["Food_area"], 2.0);
    assert_eq!(body["features"]["Food_type_banana"], 1.0);
    assert_eq!(body["nutrients"]["calculated_nutrients"]["Calories"], 133.5);
    assert!(body.get("nutrient_error").is_none());
}

#[tokio::test]
async fn test_estimate_maps_class_to_reference_name() {
    let app = create_app(state().with_pipeline(pipeline(Some(10.0), Some("Apple"), 75.0)));
    let body = json_body(post_json(app, "/v1/estimate", request(&photo_base64())).await).await;
    assert_eq!(body["food_name"], "gala apple");
    assert_eq!(body["nutrients"]["food"], "gala apple");
    assert_eq!(body["nutrients"]["calculated_nutrients"]["Calories"], 85.5);
}

#[tokio::test]
async fn test_custom_name_mapper_is_used() {
    let app = create_app(
        state()
            .with_pipeline(pipeline(Some(10.0), Some("durian"), 75.0))
            .with_name_mapper(NameMapper::with_entries([("Durian", "banana")])),
    );
    let body = json_body(post_json(app, "/v1/estimate", request(&photo_base64())).await).await;
    assert_eq!(body["food_type"], "durian");
    assert_eq!(body["food_name"], "banana");
    assert_eq!(body["nutrients"]["calculated_nutrients"]["Calories"], 133.5);

    // Labels outside a custom table fall back, even ones the default table knows
    let app = create_app(
        state()
            .with_pipeline(pipeline(Some(10.0), Some("Apple"), 75.0))
            .with_name_mapper(NameMapper::with_entries([("durian", "banana")])),
    );
    let body = json_body(post_json(app, "/v1/estimate", request(&photo_base64())).await).await;
    assert_eq!(body["food_name"], "Unknown Food");
    assert!(body.get("nutrients").is_none());
}

#[tokio::test]
async fn test_failed_lookup_is_reported_not_fatal() {
    let app = create_app(state().with_pipeline(pipeline(Some(10.0), Some("durian"), 75.0)));
    let response = post_json(app, "/v1/estimate", request(&photo_base64())).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["food_name"], "Unknown Food");
    assert_eq!(body["predicted_weight"], 150.0);
    assert!(body.get("nutrients").is_none());
    assert!(body["nutrient_error"]
        .as_str()
        .unwrap()
        .contains("not found in the database"));
}

#[tokio::test]
async fn test_vision_domain_errors_are_unprocessable() {
    let app = create_app(state().with_pipeline(pipeline(None, Some("banana"), 75.0)));
    let response = post_json(app, "/v1/estimate", request(&photo_base64())).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(response).await["message"], "ArUco marker not found.");

    let app = create_app(state().with_pipeline(pipeline(Some(10.0), None, 75.0)));
    let response = post_json(app, "/v1/estimate", request(&photo_base64())).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(response).await["message"], "Food not detected.");
}

#[tokio::test]
async fn test_bad_images_are_rejected() {
    let app = create_app(state().with_pipeline(pipeline(Some(10.0), Some("banana"), 75.0)));

    // Valid base64, not an image
    let response = post_json(app.clone(), "/v1/estimate", request("aGVsbG8=")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(app.clone(), "/v1/estimate", request("!!not base64!!")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(app, "/v1/estimate", "{}".to_string()).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["details"]["field"], "image");
}

#[tokio::test]
async fn test_estimate_unavailable_without_models() {
    let response = post_json(create_app(state()), "/v1/estimate", request(&photo_base64())).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["error_type"], "service_unavailable");
}

#[tokio::test]
async fn test_data_url_prefix_accepted() {
    let app = create_app(state().with_pipeline(pipeline(Some(10.0), Some("banana"), 75.0)));
    let image = format!("data:image/png;base64,{}", photo_base64());
    let response = post_json(app, "/v1/estimate", request(&image)).await;
    assert_eq!(response.status(), StatusCode::OK);
}
