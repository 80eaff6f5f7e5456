// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Photo to food type and weight
//!
//! marker → scale, segmentation → mask/box/class, features, regression.
//! Each stage sits behind a trait so the pipeline can be assembled from
//! loaded models or from test doubles.

use image::DynamicImage;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use super::features::{FeatureExtractor, FeatureVector};
use super::image_utils::{decode_base64_image, ImageError};
use super::marker::{DetectedMarker, MarkerDetector};
use super::regressor::{RegressorError, WeightRegressor};
use super::segmentation::{FoodSegmenter, Segmentation};

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("ArUco marker not found.")]
    MarkerNotFound,

    #[error("Food not detected.")]
    FoodNotDetected,

    #[error("Invalid image: {0}")]
    Image(#[from] ImageError),

    #[error("Segmentation failed: {0}")]
    Segmentation(String),

    #[error(transparent)]
    Regressor(#[from] RegressorError),
}

/// Intermediate results before regression
#[derive(Debug, Clone)]
pub struct ExtractedFeatures {
    pub marker: DetectedMarker,
    pub segmentation: Segmentation,
    pub features: FeatureVector,
}

/// Estimated food type and weight for one photo
#[derive(Debug, Clone, Serialize)]
pub struct Estimate {
    pub food_type: String,
    pub confidence: f32,
    pub weight_grams: f64,
    pub pixels_per_cm: f64,
    pub marker_id: u32,
    pub bbox: [f32; 4],
    pub instances: usize,
    pub features: FeatureVector,
}

/// Assembled vision pipeline
#[derive(Clone)]
pub struct VisionPipeline {
    marker: Arc<dyn MarkerDetector>,
    segmenter: Arc<dyn FoodSegmenter>,
    extractor: FeatureExtractor,
    regressor: Arc<dyn WeightRegressor>,
}

impl std::fmt::Debug for VisionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionPipeline")
            .field("classes", &self.extractor.encoder().len())
            .finish_non_exhaustive()
    }
}

impl VisionPipeline {
    pub fn new(
        marker: Arc<dyn MarkerDetector>,
        segmenter: Arc<dyn FoodSegmenter>,
        extractor: FeatureExtractor,
        regressor: Arc<dyn WeightRegressor>,
    ) -> Self {
        Self {
            marker,
            segmenter,
            extractor,
            regressor,
        }
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    /// Marker, segmentation and features, without the weight
    pub fn extract_features(&self, image: &DynamicImage) -> Result<ExtractedFeatures, VisionError> {
        let marker = self
            .marker
            .detect(image)
            .ok_or(VisionError::MarkerNotFound)?;
        debug!("Marker scale: {:.3} px/cm", marker.pixels_per_cm);

        let segmentation = self
            .segmenter
            .segment(image)
            .map_err(|e| VisionError::Segmentation(format!("{:#}", e)))?
            .ok_or(VisionError::FoodNotDetected)?;

        let features = self.extractor.extract(
            image,
            &segmentation.mask,
            &segmentation.bbox,
            marker.pixels_per_cm,
            &segmentation.class_name,
        );

        Ok(ExtractedFeatures {
            marker,
            segmentation,
            features,
        })
    }

    /// Estimate food type and weight from a photo
    pub fn estimate(&self, image: &DynamicImage) -> Result<Estimate, VisionError> {
        let extracted = self.extract_features(image)?;
        let weight_grams = self.regressor.predict(&extracted.features)?;

        info!(
            "Estimated {} at {:.2}g (confidence {:.2})",
            extracted.segmentation.class_name, weight_grams, extracted.segmentation.confidence
        );

        Ok(Estimate {
            food_type: extracted.segmentation.class_name,
            confidence: extracted.segmentation.confidence,
            weight_grams,
            pixels_per_cm: extracted.marker.pixels_per_cm,
            marker_id: extracted.marker.id,
            bbox: extracted.segmentation.bbox,
            instances: extracted.segmentation.instances,
            features: extracted.features,
        })
    }

    /// Decode a base64 photo and estimate
    pub fn estimate_base64(&self, encoded: &str) -> Result<Estimate, VisionError> {
        let (image, info) = decode_base64_image(encoded)?;
        debug!("Decoded {}x{} {:?} photo", info.width, info.height, info.format);
        self.estimate(&image)
    }
}
