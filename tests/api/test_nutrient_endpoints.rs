// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! GET /nutrient and GET /nutrient/detailed

use axum::http::StatusCode;
use serde_json::json;

use super::fixtures::{app, get, json_body};

#[tokio::test]
async fn test_banana_breakdown() {
    let response = get(app(), "/nutrient?food=banana&weight=150").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(
        body,
        json!({
            "food": "banana",
            "input_weight": 150.0,
            "calculated_nutrients": {
                "Calories": 133.5,
                "Carbohydrate": 34.5,
                "Protein": 1.65,
                "Fat": 0.45
            }
        })
    );
}

#[tokio::test]
async fn test_name_matching_is_case_insensitive() {
    let lower = json_body(get(app(), "/nutrient?food=banana&weight=80").await).await;
    let upper = json_body(get(app(), "/nutrient?food=%20BaNaNa%20&weight=80").await).await;
    assert_eq!(lower, upper);
}

#[tokio::test]
async fn test_composite_name_matches_either_half() {
    for food in ["pisang%20goreng", "banana%20fritter", "Pisang%20Goreng%20(Banana%20Fritter)"] {
        let response = get(app(), &format!("/nutrient?food={}&weight=100", food)).await;
        assert_eq!(response.status(), StatusCode::OK, "food={}", food);
        let body = json_body(response).await;
        assert_eq!(body["calculated_nutrients"]["Calories"], 300.0);
        assert_eq!(body["calculated_nutrients"]["Fat"], 14.0);
    }
}

#[tokio::test]
async fn test_single_nutrient() {
    let response = get(app(), "/nutrient?food=banana&weight=150&nutrient=Protein").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({
            "food": "banana",
            "input_weight": 150.0,
            "requested_nutrient": "Protein",
            "calculated_value": 1.65
        })
    );
}

#[tokio::test]
async fn test_unknown_food_is_not_found() {
    let response = get(app(), "/nutrient?food=durian&weight=100").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = json_body(response).await;
    assert_eq!(body["error_type"], "not_found");
    assert!(body["message"].as_str().unwrap().contains("durian"));
    assert!(body.get("calculated_nutrients").is_none());
}

#[tokio::test]
async fn test_invalid_nutrient_selector() {
    // Rejected even for foods that do not exist
    for uri in [
        "/nutrient?food=banana&weight=100&nutrient=Sugar",
        "/nutrient?food=durian&weight=100&nutrient=calories",
    ] {
        let response = get(app(), uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        let body = json_body(response).await;
        assert_eq!(body["details"]["field"], "nutrient");
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("Calories, Carbohydrate, Protein, Fat"));
    }
}

#[tokio::test]
async fn test_bad_weights_are_rejected() {
    for uri in [
        "/nutrient?food=banana",
        "/nutrient?food=banana&weight=heavy",
        "/nutrient?food=banana&weight=-5",
        "/nutrient?food=banana&weight=0",
        "/nutrient?weight=10",
    ] {
        let response = get(app(), uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(json_body(response).await["error_type"], "validation_error");
    }
}

#[tokio::test]
async fn test_malformed_reference_row_is_internal_error() {
    let response = get(app(), "/nutrient?food=rojak&weight=100").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let message = json_body(response).await["message"].as_str().unwrap().to_string();
    assert!(message.starts_with("Error processing request:"));
    assert!(message.contains("Calories"));

    // Columns that do parse still work
    let response = get(app(), "/nutrient?food=rojak&weight=100&nutrient=Fat").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["calculated_value"], 4.5);
}

#[tokio::test]
async fn test_detailed_lookup_annotates_units() {
    let response = get(app(), "/nutrient/detailed?food=banana&weight=150").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let nutrients = &body["calculated_nutrients"];
    assert_eq!(nutrients["Calories"], "133.50 kcal");
    assert_eq!(nutrients["Protein"], "1.65 g");
    assert_eq!(nutrients["Sodium"], "1.50 mg");
    assert!(nutrients.get("Iron").is_none());

    let response = get(app(), "/nutrient/detailed?food=durian&weight=150").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
