// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision model manager for loading the segmenter, regressor and encoder

use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;

use super::encoder::ClassEncoder;
use super::features::{ColorOrder, FeatureExtractor};
use super::marker::{MarkerConfig, SquareMarkerDetector};
use super::pipeline::VisionPipeline;
use super::regressor::XgboostRegressor;
use super::segmentation::{SegmenterConfig, YoloSegmenter};

/// Configuration for loading vision models
#[derive(Debug, Clone)]
pub struct VisionModelConfig {
    /// Path to the ONNX segmentation model (optional)
    pub segmenter_model: Option<String>,
    /// Path to the XGBoost JSON weight model (optional)
    pub regressor_model: Option<String>,
    /// Spreadsheet whose `Food_type` column fixes the class vocabulary (optional)
    pub class_features: Option<String>,
    pub marker: MarkerConfig,
    pub segmenter: SegmenterConfig,
    pub color_order: ColorOrder,
    /// Factor applied to the `Edge_Density` feature
    pub edge_density_scale: f64,
}

impl Default for VisionModelConfig {
    fn default() -> Self {
        Self {
            segmenter_model: Some("./models/food-seg.onnx".to_string()),
            regressor_model: Some("./models/xgboost_model.json".to_string()),
            class_features: Some("./data/food-features.xlsx".to_string()),
            marker: MarkerConfig::default(),
            segmenter: SegmenterConfig::default(),
            color_order: ColorOrder::default(),
            edge_density_scale: 1.0,
        }
    }
}

/// Information about a loaded vision model
#[derive(Debug, Clone, Serialize)]
pub struct VisionModelInfo {
    pub name: String,
    pub model_type: String,
    pub available: bool,
}

/// Holds the loaded vision models and the pipeline built from them
///
/// Missing or broken model files are logged and leave the pipeline
/// unavailable; the rest of the service keeps working.
pub struct VisionModelManager {
    segmenter: Option<Arc<YoloSegmenter>>,
    regressor: Option<Arc<XgboostRegressor>>,
    encoder: Option<ClassEncoder>,
    pipeline: Option<Arc<VisionPipeline>>,
}

impl VisionModelManager {
    /// Load every configured model; loading runs on the blocking pool
    pub async fn new(config: VisionModelConfig) -> anyhow::Result<Self> {
        tokio::task::spawn_blocking(move || Self::load(&config))
            .await
            .context("Vision model loading task failed")
    }

    /// Load every configured model on the current thread
    pub fn load(config: &VisionModelConfig) -> Self {
        let segmenter = config.segmenter_model.as_ref().and_then(|path| {
            match YoloSegmenter::new(path, config.segmenter.clone()) {
                Ok(model) => {
                    tracing::info!("✅ Segmentation model loaded from {}", path);
                    Some(Arc::new(model))
                }
                Err(e) => {
                    tracing::warn!(
                        "⚠️ Failed to load segmentation model from {}: {:#}",
                        path,
                        e
                    );
                    None
                }
            }
        });

        let regressor = config.regressor_model.as_ref().and_then(|path| {
            match XgboostRegressor::from_path(path) {
                Ok(model) => {
                    tracing::info!("✅ Weight regressor loaded from {}", path);
                    Some(Arc::new(model))
                }
                Err(e) => {
                    tracing::warn!("⚠️ Failed to load weight regressor from {}: {}", path, e);
                    None
                }
            }
        });

        let encoder = config.class_features.as_ref().and_then(|path| {
            match ClassEncoder::from_path(path) {
                Ok(encoder) => {
                    tracing::info!(
                        "✅ Class encoder fitted from {} ({} classes)",
                        path,
                        encoder.len()
                    );
                    Some(encoder)
                }
                Err(e) => {
                    tracing::warn!("⚠️ Failed to fit class encoder from {}: {}", path, e);
                    None
                }
            }
        });

        let pipeline = match (&segmenter, &regressor, &encoder) {
            (Some(segmenter), Some(regressor), Some(encoder)) => Some(Arc::new(VisionPipeline::new(
                Arc::new(SquareMarkerDetector::new(config.marker.clone())),
                segmenter.clone(),
                FeatureExtractor::new(encoder.clone(), config.color_order)
                    .with_edge_density_scale(config.edge_density_scale),
                regressor.clone(),
            ))),
            _ => {
                tracing::warn!("⚠️ Vision pipeline unavailable; photo estimation disabled");
                None
            }
        };

        Self {
            segmenter,
            regressor,
            encoder,
            pipeline,
        }
    }

    /// Get the assembled pipeline if every model loaded
    pub fn pipeline(&self) -> Option<Arc<VisionPipeline>> {
        self.pipeline.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.pipeline.is_some()
    }

    /// List all vision models and whether they loaded
    pub fn list_models(&self) -> Vec<VisionModelInfo> {
        vec![
            VisionModelInfo {
                name: "food-segmenter".to_string(),
                model_type: "segmentation".to_string(),
                available: self.segmenter.is_some(),
            },
            VisionModelInfo {
                name: "weight-regressor".to_string(),
                model_type: "regression".to_string(),
                available: self.regressor.is_some(),
            },
            VisionModelInfo {
                name: "class-encoder".to_string(),
                model_type: "encoding".to_string(),
                available: self.encoder.is_some(),
            },
        ]
    }
}
