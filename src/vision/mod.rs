// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Food portion estimation from photos
//!
//! This module provides:
//! - `marker` - Fiducial marker detection and pixel scale
//! - `segmentation` - YOLO-seg food segmentation via ONNX Runtime
//! - `features` / `encoder` - Feature vector for the weight regressor
//! - `regressor` - Gradient-boosted weight model (XGBoost JSON)
//! - `pipeline` - The stages wired together
//!
//! Everything runs on CPU.

pub mod encoder;
pub mod features;
pub mod image_utils;
pub mod marker;
pub mod model_manager;
pub mod pipeline;
pub mod regressor;
pub mod segmentation;

pub use encoder::ClassEncoder;
pub use features::{ColorOrder, FeatureExtractor, FeatureVector, SCALAR_FEATURES};
pub use image_utils::{
    decode_base64_image, decode_image_bytes, detect_format, load_image_file, ImageError, ImageInfo,
};
pub use marker::{DetectedMarker, MarkerConfig, MarkerDetector, SquareMarkerDetector};
pub use model_manager::{VisionModelConfig, VisionModelInfo, VisionModelManager};
pub use pipeline::{Estimate, ExtractedFeatures, VisionError, VisionPipeline};
pub use regressor::{RegressorError, WeightRegressor, XgboostRegressor};
pub use segmentation::{
    FoodSegmenter, InstanceSelection, Segmentation, SegmenterConfig, YoloSegmenter,
};
