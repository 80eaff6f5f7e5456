// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Estimate response types

use serde::Serialize;

use crate::nutrition::{round2, NutrientBreakdown};
use crate::vision::{Estimate, FeatureVector};

/// Response from photo estimation
#[derive(Debug, Clone, Serialize)]
pub struct EstimateResponse {
    /// Segmentation class label
    pub food_type: String,
    /// Reference table name the label maps to
    pub food_name: String,
    pub confidence: f32,
    /// Predicted weight in grams, rounded to two decimals
    pub predicted_weight: f64,
    pub pixels_per_cm: f64,
    pub marker_id: u32,
    pub bbox: [f32; 4],
    pub instances: usize,
    pub features: FeatureVector,
    /// Nutrients for the predicted weight, when the lookup succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nutrients: Option<NutrientBreakdown>,
    /// Lookup failure message otherwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nutrient_error: Option<String>,
    pub processing_time_ms: u64,
}

impl EstimateResponse {
    pub fn new(estimate: Estimate, food_name: String, processing_time_ms: u64) -> Self {
        Self {
            food_type: estimate.food_type,
            food_name,
            confidence: estimate.confidence,
            predicted_weight: round2(estimate.weight_grams),
            pixels_per_cm: estimate.pixels_per_cm,
            marker_id: estimate.marker_id,
            bbox: estimate.bbox,
            instances: estimate.instances,
            features: estimate.features,
            nutrients: None,
            nutrient_error: None,
            processing_time_ms,
        }
    }
}
