// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Pipeline with the real marker detector and a regressor loaded from disk

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use nutrivision::vision::{
    ClassEncoder, ColorOrder, FeatureExtractor, FeatureVector, FoodSegmenter, Segmentation,
    SquareMarkerDetector, VisionError, VisionModelConfig, VisionModelManager, VisionPipeline,
    WeightRegressor, XgboostRegressor,
};
use std::io::Write;
use std::sync::Arc;

/// Food_area < 10 cm² → 40 g, otherwise 180 g; bananas add 20 g
const MODEL: &str = r#"{
  "learner": {
    "feature_names": ["Food_area", "Food_type_banana"],
    "gradient_booster": {
      "name": "gbtree",
      "model": {
        "trees": [
          {
            "left_children": [1, -1, -1],
            "right_children": [2, -1, -1],
            "split_indices": [0, 0, 0],
            "split_conditions": [10.0, 40.0, 180.0],
            "default_left": [1, 0, 0]
          },
          {
            "left_children": [1, -1, -1],
            "right_children": [2, -1, -1],
            "split_indices": [1, 0, 0],
            "split_conditions": [0.5, 0.0, 20.0],
            "default_left": [1, 0, 0]
          }
        ]
      }
    },
    "learner_model_param": { "base_score": "0E0", "num_feature": "2" },
    "objective": { "name": "reg:squarederror" }
  },
  "version": [2, 0, 3]
}"#;

fn model_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(MODEL.as_bytes()).unwrap();
    file
}

/// 7x7 cell marker, black border, one white payload cell
fn draw_marker(img: &mut RgbImage, x0: u32, y0: u32, cell: u32) {
    for row in 0..7 {
        for col in 0..7 {
            let color = if (row, col) == (3, 3) {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            };
            for y in 0..cell {
                for x in 0..cell {
                    img.put_pixel(x0 + col * cell + x, y0 + row * cell + y, color);
                }
            }
        }
    }
}

/// Segmenter double with a fixed rectangular mask
struct PlateSegmenter {
    rect: (u32, u32, u32, u32),
    class_name: &'static str,
}

impl FoodSegmenter for PlateSegmenter {
    fn segment(&self, image: &DynamicImage) -> anyhow::Result<Option<Segmentation>> {
        let (x0, y0, x1, y1) = self.rect;
        let mut mask = GrayImage::new(image.width(), image.height());
        for y in y0..y1 {
            for x in x0..x1 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        Ok(Some(Segmentation {
            mask,
            class_name: self.class_name.to_string(),
            confidence: 0.8,
            bbox: [x0 as f32, y0 as f32, x1 as f32, y1 as f32],
            instances: 1,
        }))
    }
}

fn pipeline(rect: (u32, u32, u32, u32), class_name: &'static str) -> VisionPipeline {
    let file = model_file();
    let regressor = XgboostRegressor::from_path(file.path()).unwrap();
    VisionPipeline::new(
        Arc::new(SquareMarkerDetector::default()),
        Arc::new(PlateSegmenter { rect, class_name }),
        FeatureExtractor::new(ClassEncoder::fit(["apple", "banana"]), ColorOrder::Rgb),
        Arc::new(regressor),
    )
}

fn photo(with_marker: bool) -> DynamicImage {
    let mut img = RgbImage::from_pixel(240, 200, Rgb([255, 255, 255]));
    if with_marker {
        draw_marker(&mut img, 20, 20, 10);
    }
    DynamicImage::ImageRgb8(img)
}

#[test]
fn test_large_banana() {
    // 100x40 px at 14 px/cm is ~20 cm²
    let estimate = pipeline((120, 120, 220, 160), "banana")
        .estimate(&photo(true))
        .unwrap();
    assert!((estimate.pixels_per_cm - 14.0).abs() < 0.2);
    assert!(estimate.features.get("Food_area").unwrap() > 10.0);
    assert_eq!(estimate.weight_grams, 200.0);
}

#[test]
fn test_small_apple() {
    // 20x20 px is ~2 cm²
    let estimate = pipeline((150, 150, 170, 170), "apple")
        .estimate(&photo(true))
        .unwrap();
    assert_eq!(estimate.food_type, "apple");
    assert_eq!(estimate.weight_grams, 40.0);
}

#[test]
fn test_photo_without_marker() {
    let err = pipeline((120, 120, 220, 160), "banana")
        .estimate(&photo(false))
        .unwrap_err();
    assert!(matches!(err, VisionError::MarkerNotFound));
}

#[test]
fn test_unnamed_model_reads_columns_by_position() {
    let model = XgboostRegressor::from_json_str(&MODEL.replace(
        r#""feature_names": ["Food_area", "Food_type_banana"],"#,
        "",
    ))
    .unwrap();
    assert!(model.feature_names().is_none());

    let row = FeatureVector::new(vec!["a".into(), "b".into()], vec![25.0, 1.0]);
    assert_eq!(model.predict(&row).unwrap(), 200.0);

    let short = FeatureVector::new(vec!["a".into()], vec![25.0]);
    assert!(model.predict(&short).is_err());
}

#[tokio::test]
async fn test_manager_loads_regressor_only() {
    let file = model_file();
    let manager = VisionModelManager::new(VisionModelConfig {
        segmenter_model: None,
        regressor_model: Some(file.path().to_string_lossy().into_owned()),
        class_features: None,
        ..VisionModelConfig::default()
    })
    .await
    .unwrap();

    assert!(!manager.is_ready());
    let available: Vec<_> = manager
        .list_models()
        .into_iter()
        .filter(|m| m.available)
        .map(|m| m.name)
        .collect();
    assert_eq!(available, vec!["weight-regressor"]);
}
