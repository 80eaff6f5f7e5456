// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ONNX YOLO segmentation model
//!
//! Runs a YOLO-seg export (two outputs: predictions and mask prototypes)
//! on CPU through ONNX Runtime.

use anyhow::{anyhow, Context, Result};
use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::Array4;
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::postprocess::process_outputs;
use super::{FoodSegmenter, InstanceSelection, Segmentation, DEFAULT_CLASS_NAMES};

/// Square model input size for YOLO exports
pub const DEFAULT_INPUT_SIZE: u32 = 640;

/// Segmentation thresholds and labels
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    pub input_size: u32,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub mask_threshold: f32,
    pub selection: InstanceSelection,
    /// Label per model class index
    pub class_names: Vec<String>,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            input_size: DEFAULT_INPUT_SIZE,
            confidence_threshold: 0.25,
            iou_threshold: 0.7,
            mask_threshold: 0.5,
            selection: InstanceSelection::default(),
            class_names: DEFAULT_CLASS_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SegmenterConfig {
    /// Label for a class index, `class_<id>` when the list is too short
    pub fn class_name(&self, class_id: usize) -> String {
        self.class_names
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| format!("class_{}", class_id))
    }
}

/// Stretch an image to the model input and lay it out as NCHW in [0, 1]
pub fn preprocess(image: &DynamicImage, input_size: u32) -> Array4<f32> {
    let resized = image::imageops::resize(
        &image.to_rgb8(),
        input_size,
        input_size,
        FilterType::Triangle,
    );

    let size = input_size as usize;
    let mut input = Array4::<f32>::zeros((1, 3, size, size));
    for (x, y, pixel) in resized.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        input[[0, 0, y, x]] = pixel[0] as f32 / 255.0;
        input[[0, 1, y, x]] = pixel[1] as f32 / 255.0;
        input[[0, 2, y, x]] = pixel[2] as f32 / 255.0;
    }
    input
}

/// YOLO-seg food segmenter
#[derive(Clone)]
pub struct YoloSegmenter {
    session: Arc<Mutex<Session>>,
    input_name: String,
    config: SegmenterConfig,
}

impl std::fmt::Debug for YoloSegmenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoloSegmenter")
            .field("input_name", &self.input_name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl YoloSegmenter {
    /// Load the segmentation model from an ONNX file
    pub fn new<P: AsRef<Path>>(model_path: P, config: SegmenterConfig) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("Segmentation model not found: {}", model_path.display());
        }

        info!("Loading segmentation model from {}", model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(4)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context(format!(
                "Failed to load segmentation model from {}",
                model_path.display()
            ))?;

        if session.outputs.len() < 2 {
            anyhow::bail!(
                "Segmentation model must have prediction and prototype outputs, found {}",
                session.outputs.len()
            );
        }

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());

        debug!(
            "Segmentation model loaded - input: {}, outputs: {:?}",
            input_name,
            session.outputs.iter().map(|o| o.name.as_str()).collect::<Vec<_>>()
        );
        info!(
            "Segmentation model ready ({} classes, selection: {})",
            config.class_names.len(),
            config.selection
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            config,
        })
    }

    pub fn config(&self) -> &SegmenterConfig {
        &self.config
    }
}

impl FoodSegmenter for YoloSegmenter {
    fn segment(&self, image: &DynamicImage) -> Result<Option<Segmentation>> {
        let input = preprocess(image, self.config.input_size);
        let input_value = Value::from_array(input).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow!("Segmentation session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_value])
            .context("Segmentation inference failed")?;

        let preds = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract prediction tensor")?;
        let protos = outputs[1]
            .try_extract_array::<f32>()
            .context("Failed to extract prototype tensor")?;

        debug!(
            "Segmentation output shapes: {:?} / {:?}",
            preds.shape(),
            protos.shape()
        );

        process_outputs(preds, protos, (image.width(), image.height()), &self.config)
    }
}
