// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Food instance segmentation
//!
//! A segmenter returns the union of every kept instance mask at image
//! resolution together with the class, confidence and box of one selected
//! instance.

pub mod model;
pub mod postprocess;

use image::{DynamicImage, GrayImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use model::{SegmenterConfig, YoloSegmenter};
pub use postprocess::{iou, non_max_suppression, Detection};

/// Classes of the bundled food segmentation model, in model output order
pub const DEFAULT_CLASS_NAMES: [&str; 10] = [
    "apple",
    "banana",
    "coleslaw",
    "cooked rice",
    "fried noodle",
    "fried rice",
    "mashed potato",
    "oat",
    "rojak",
    "tangerine",
];

/// Which instance supplies the class, confidence and box
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceSelection {
    /// The most confident kept instance
    #[default]
    HighestConfidence,
    /// The last instance in output order (lowest confidence after sorting)
    Last,
}

impl fmt::Display for InstanceSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HighestConfidence => write!(f, "highest_confidence"),
            Self::Last => write!(f, "last"),
        }
    }
}

impl FromStr for InstanceSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "highest_confidence" | "highest" => Ok(Self::HighestConfidence),
            "last" => Ok(Self::Last),
            other => Err(format!(
                "Unknown instance selection '{}' (expected highest_confidence or last)",
                other
            )),
        }
    }
}

/// Result of segmenting one image
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// Union of all instance masks, 255 = food
    pub mask: GrayImage,
    /// Class label of the selected instance
    pub class_name: String,
    pub confidence: f32,
    /// Selected instance box `[x1, y1, x2, y2]` in image pixels
    pub bbox: [f32; 4],
    /// Number of instances merged into the mask
    pub instances: usize,
}

impl Segmentation {
    pub fn mask_pixels(&self) -> usize {
        self.mask.pixels().filter(|p| p[0] > 0).count()
    }
}

/// Segments food in an image
#[cfg_attr(test, mockall::automock)]
pub trait FoodSegmenter: Send + Sync {
    /// `Ok(None)` when nothing was detected
    fn segment(&self, image: &DynamicImage) -> anyhow::Result<Option<Segmentation>>;
}
