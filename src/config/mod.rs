// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration
//!
//! Defaults, optionally overlaid by a TOML file, then by `NUTRIVISION_*`
//! environment variables (a `.env` file is honoured by the binaries).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::vision::{ColorOrder, MarkerConfig, SegmenterConfig, VisionModelConfig};

/// Prefix of every environment override
pub const ENV_PREFIX: &str = "NUTRIVISION_";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// Nutrient reference spreadsheet, re-read on every lookup
    pub reference_data: String,
    /// Spreadsheet with the `Food_type` column the regressor was trained on
    pub class_features: Option<String>,
    pub segmenter_model: Option<String>,
    pub regressor_model: Option<String>,
    pub marker_length_cm: f64,
    pub color_order: ColorOrder,
    /// 255 reproduces regressors trained on summed 8-bit edge maps
    pub edge_density_scale: f64,
    pub segmenter: SegmenterConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            reference_data: "./data/food-dataset.xlsx".to_string(),
            class_features: Some("./data/food-features.xlsx".to_string()),
            segmenter_model: Some("./models/food-seg.onnx".to_string()),
            regressor_model: Some("./models/xgboost_model.json".to_string()),
            marker_length_cm: crate::vision::marker::DEFAULT_MARKER_LENGTH_CM,
            color_order: ColorOrder::default(),
            edge_density_scale: 1.0,
            segmenter: SegmenterConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file; missing keys keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// File (if given) then environment, then validated
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate().map_err(anyhow::Error::msg)?;
        Ok(config)
    }

    /// Apply `NUTRIVISION_*` overrides from a lookup function
    ///
    /// Unparseable values are ignored with a warning.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        fn parsed<T: std::str::FromStr>(name: &str, value: Option<String>) -> Option<T> {
            let value = value?;
            match value.parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!("Ignoring invalid {}{}={}", ENV_PREFIX, name, value);
                    None
                }
            }
        }

        if let Some(v) = var("HOST") {
            self.host = v;
        }
        if let Some(v) = parsed("PORT", var("PORT")) {
            self.port = v;
        }
        if let Some(v) = var("REFERENCE_DATA") {
            self.reference_data = v;
        }
        if let Some(v) = var("CLASS_FEATURES") {
            self.class_features = Some(v);
        }
        if let Some(v) = var("SEGMENTER_MODEL") {
            self.segmenter_model = Some(v);
        }
        if let Some(v) = var("REGRESSOR_MODEL") {
            self.regressor_model = Some(v);
        }
        if let Some(v) = parsed("MARKER_LENGTH_CM", var("MARKER_LENGTH_CM")) {
            self.marker_length_cm = v;
        }
        if let Some(v) = parsed("COLOR_ORDER", var("COLOR_ORDER")) {
            self.color_order = v;
        }
        if let Some(v) = parsed("EDGE_DENSITY_SCALE", var("EDGE_DENSITY_SCALE")) {
            self.edge_density_scale = v;
        }
        if let Some(v) = parsed("CONFIDENCE_THRESHOLD", var("CONFIDENCE_THRESHOLD")) {
            self.segmenter.confidence_threshold = v;
        }
        if let Some(v) = parsed("IOU_THRESHOLD", var("IOU_THRESHOLD")) {
            self.segmenter.iou_threshold = v;
        }
        if let Some(v) = parsed("INSTANCE_SELECTION", var("INSTANCE_SELECTION")) {
            self.segmenter.selection = v;
        }
        if let Some(v) = var("CLASS_NAMES") {
            self.segmenter.class_names = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.reference_data.trim().is_empty() {
            return Err("Reference data path must not be empty".to_string());
        }
        if !(self.marker_length_cm.is_finite() && self.marker_length_cm > 0.0) {
            return Err(format!(
                "Marker length must be positive, got {}",
                self.marker_length_cm
            ));
        }
        if !(self.edge_density_scale.is_finite() && self.edge_density_scale > 0.0) {
            return Err(format!(
                "Edge density scale must be positive, got {}",
                self.edge_density_scale
            ));
        }
        for (name, value) in [
            ("confidence_threshold", self.segmenter.confidence_threshold),
            ("iou_threshold", self.segmenter.iou_threshold),
            ("mask_threshold", self.segmenter.mask_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be within [0, 1], got {}", name, value));
            }
        }
        if self.segmenter.input_size == 0 {
            return Err("Segmenter input size must be greater than 0".to_string());
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Model paths and settings for the vision stack
    pub fn vision_config(&self) -> VisionModelConfig {
        VisionModelConfig {
            segmenter_model: self.segmenter_model.clone(),
            regressor_model: self.regressor_model.clone(),
            class_features: self.class_features.clone(),
            marker: MarkerConfig {
                marker_length_cm: self.marker_length_cm,
                ..MarkerConfig::default()
            },
            segmenter: self.segmenter.clone(),
            color_order: self.color_order,
            edge_density_scale: self.edge_density_scale,
        }
    }
}
