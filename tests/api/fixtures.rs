// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Shared state builders and stage doubles for the API tests

use axum::{body::Body, http::Request, response::Response, Router};
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use nutrivision::{
    api::{create_app, AppState},
    nutrition::{InMemorySource, NutrientService},
    utils::{Cell, Sheet},
    vision::{
        image_utils::encode_png_base64, ClassEncoder, ColorOrder, DetectedMarker,
        FeatureExtractor, FeatureVector, FoodSegmenter, MarkerDetector, RegressorError,
        Segmentation, VisionPipeline, WeightRegressor,
    },
};
use std::sync::Arc;
use tower::util::ServiceExt;

fn text(s: &str) -> Cell {
    Cell::Text(s.to_string())
}

fn num(v: f64) -> Cell {
    Cell::Number(v)
}

/// Reference sheet: banana, a composite name, a blank cell and a broken row
pub fn reference_sheet() -> Sheet {
    let headers = ["Food", "Weight", "Calories", "Carbohydrate", "Protein", "Fat", "Sodium"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    Sheet::new(
        headers,
        vec![
            vec![text("banana"), num(100.0), num(89.0), num(23.0), num(1.1), num(0.3), num(1.0)],
            vec![
                text("Pisang Goreng (Banana Fritter)"),
                num(50.0),
                num(150.0),
                num(20.0),
                num(2.0),
                num(7.0),
                Cell::Empty,
            ],
            vec![
                text("gala apple"),
                num(100.0),
                num(57.0),
                num(13.7),
                num(0.3),
                num(0.1),
                num(1.0),
            ],
            vec![text("rojak"), num(200.0), text("n/a"), num(40.0), num(6.0), num(9.0), num(300.0)],
        ],
    )
}

pub fn state() -> AppState {
    AppState::new(NutrientService::from_source(InMemorySource::new(reference_sheet())))
}

pub fn app() -> Router {
    create_app(state())
}

pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: String) -> Response {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn json_body(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Marker double with a fixed scale
pub struct FixedMarker(pub Option<f64>);

impl MarkerDetector for FixedMarker {
    fn detect(&self, _image: &DynamicImage) -> Option<DetectedMarker> {
        self.0.map(|pixels_per_cm| DetectedMarker {
            id: 3,
            corners: [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)],
            pixels_per_cm,
        })
    }
}

/// Segmenter double returning a 10x20 rectangle of one class
pub struct RectSegmenter(pub Option<&'static str>);

impl FoodSegmenter for RectSegmenter {
    fn segment(&self, image: &DynamicImage) -> anyhow::Result<Option<Segmentation>> {
        let Some(class_name) = self.0 else {
            return Ok(None);
        };
        let mut mask = GrayImage::new(image.width(), image.height());
        for y in 10..20 {
            for x in 5..25 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        Ok(Some(Segmentation {
            mask,
            class_name: class_name.to_string(),
            confidence: 0.9,
            bbox: [5.0, 10.0, 25.0, 20.0],
            instances: 1,
        }))
    }
}

/// Regressor double: weight proportional to area
pub struct AreaRegressor(pub f64);

impl WeightRegressor for AreaRegressor {
    fn predict(&self, features: &FeatureVector) -> Result<f64, RegressorError> {
        let area = features
            .get("Food_area")
            .ok_or_else(|| RegressorError::MissingFeature("Food_area".to_string()))?;
        Ok(area * self.0)
    }
}

pub fn pipeline(
    marker: Option<f64>,
    class_name: Option<&'static str>,
    grams_per_cm2: f64,
) -> VisionPipeline {
    VisionPipeline::new(
        Arc::new(FixedMarker(marker)),
        Arc::new(RectSegmenter(class_name)),
        FeatureExtractor::new(ClassEncoder::fit(["apple", "banana", "rojak"]), ColorOrder::Rgb),
        Arc::new(AreaRegressor(grams_per_cm2)),
    )
}

pub fn photo_base64() -> String {
    let img = RgbImage::from_pixel(40, 30, Rgb([230, 200, 40]));
    encode_png_base64(&DynamicImage::ImageRgb8(img)).unwrap()
}
