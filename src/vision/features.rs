// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Geometric and appearance features of a segmented food item
//!
//! The feature vector is 13 scalars followed by the one-hot class columns,
//! in the order the weight regressor was trained on:
//!
//! | Feature | Definition |
//! |---------|------------|
//! | `Pixels_per_cm` | marker scale |
//! | `Food_area` | mask pixels / scale² (cm²) |
//! | `Food_width`, `Food_length` | box width and height / scale (cm) |
//! | `Aspect_Ratio`, `Extent`, `Solidity`, `Circularity` | largest external mask contour |
//! | `Estimated_Volume` | ellipsoid from width and length |
//! | `Mean_R`, `Mean_G`, `Mean_B` | mean colour over the mask |
//! | `Edge_Density` | Canny edge pixels of the mask / mask pixels |

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::edges::canny;
use imageproc::geometry::{arc_length, contour_area, convex_hull};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use super::encoder::ClassEncoder;

/// Names of the scalar features, in vector order
pub const SCALAR_FEATURES: [&str; 13] = [
    "Pixels_per_cm",
    "Food_area",
    "Food_width",
    "Food_length",
    "Aspect_Ratio",
    "Extent",
    "Solidity",
    "Circularity",
    "Estimated_Volume",
    "Mean_R",
    "Mean_G",
    "Mean_B",
    "Edge_Density",
];

const CANNY_LOW: f32 = 100.0;
const CANNY_HIGH: f32 = 200.0;

/// Channel order of the `Mean_R/G/B` columns
///
/// `Bgr` suits regressors trained on OpenCV-ordered channel means, where
/// the column labelled `Mean_R` actually holds blue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorOrder {
    #[default]
    Rgb,
    Bgr,
}

impl FromStr for ColorOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rgb" => Ok(Self::Rgb),
            "bgr" => Ok(Self::Bgr),
            other => Err(format!("Unknown colour order '{}' (expected rgb or bgr)", other)),
        }
    }
}

impl fmt::Display for ColorOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rgb => write!(f, "rgb"),
            Self::Bgr => write!(f, "bgr"),
        }
    }
}

/// Ordered, named feature values
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureVector {
    names: Vec<String>,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn new(names: Vec<String>, values: Vec<f64>) -> Self {
        debug_assert_eq!(names.len(), values.len());
        Self { names, values }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.values[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names.iter().map(String::as_str).zip(self.values.iter().copied())
    }
}

// Serialized as an object in feature order
impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

/// Shape descriptors of the largest external contour
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShapeDescriptors {
    pub aspect_ratio: f64,
    pub extent: f64,
    pub solidity: f64,
    pub circularity: f64,
    /// Contour area in pixels
    pub area: f64,
    /// Closed contour length in pixels
    pub perimeter: f64,
}

/// Mask area in cm²
pub fn real_area(mask: &GrayImage, pixels_per_cm: f64) -> f64 {
    mask_pixel_count(mask) as f64 / (pixels_per_cm * pixels_per_cm)
}

/// Box width and length in cm
pub fn width_length(bbox: &[f32; 4], pixels_per_cm: f64) -> (f64, f64) {
    let [x1, y1, x2, y2] = *bbox;
    (
        (x2 - x1).abs() as f64 / pixels_per_cm,
        (y2 - y1).abs() as f64 / pixels_per_cm,
    )
}

/// Ellipsoid with semi-axes w/2, l/2 and min(w, l)/2
pub fn estimate_volume(width: f64, length: f64) -> f64 {
    (4.0 / 3.0) * std::f64::consts::PI * (width / 2.0) * (length / 2.0) * (width.min(length) / 2.0)
}

pub fn shape_descriptors(mask: &GrayImage) -> ShapeDescriptors {
    let contours = find_contours::<i32>(mask);
    let largest = contours
        .iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| (c, contour_area(&c.points).abs()))
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    let Some((contour, area)) = largest else {
        return ShapeDescriptors::default();
    };

    let perimeter = arc_length(&contour.points, true);

    // Inclusive pixel bounds, like an upright bounding rectangle
    let (min_x, max_x, min_y, max_y) = contour.points.iter().fold(
        (i32::MAX, i32::MIN, i32::MAX, i32::MIN),
        |(x0, x1, y0, y1), p| (x0.min(p.x), x1.max(p.x), y0.min(p.y), y1.max(p.y)),
    );
    let w = (max_x - min_x + 1) as f64;
    let h = (max_y - min_y + 1) as f64;

    let hull = convex_hull(contour.points.as_slice());
    let hull_area = contour_area(&hull).abs();

    ShapeDescriptors {
        aspect_ratio: if h > 0.0 { w / h } else { 0.0 },
        extent: if w * h > 0.0 { area / (w * h) } else { 0.0 },
        solidity: if hull_area > 0.0 { area / hull_area } else { 0.0 },
        circularity: if perimeter > 0.0 {
            4.0 * std::f64::consts::PI * area / (perimeter * perimeter)
        } else {
            0.0
        },
        area,
        perimeter,
    }
}

/// Mean `[r, g, b]` over masked pixels, zeros for an empty mask
pub fn mean_color(image: &DynamicImage, mask: &GrayImage) -> [f64; 3] {
    let rgb = image.to_rgb8();
    let mut sum = [0u64; 3];
    let mut count = 0u64;

    for (pixel, m) in rgb.pixels().zip(mask.pixels()) {
        if m[0] > 0 {
            for c in 0..3 {
                sum[c] += pixel[c] as u64;
            }
            count += 1;
        }
    }

    if count == 0 {
        return [0.0; 3];
    }
    sum.map(|s| s as f64 / count as f64)
}

/// Canny edge pixels of the mask over mask pixels, 0 for an empty mask
pub fn edge_density(mask: &GrayImage) -> f64 {
    let area = mask_pixel_count(mask);
    if area == 0 {
        return 0.0;
    }
    let edges = canny(mask, CANNY_LOW, CANNY_HIGH);
    let edge_pixels = edges.pixels().filter(|p| p[0] > 0).count();
    edge_pixels as f64 / area as f64
}

fn mask_pixel_count(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| p[0] > 0).count()
}

/// Builds feature vectors against a fitted class vocabulary
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    encoder: ClassEncoder,
    color_order: ColorOrder,
    edge_density_scale: f64,
}

impl FeatureExtractor {
    pub fn new(encoder: ClassEncoder, color_order: ColorOrder) -> Self {
        Self {
            encoder,
            color_order,
            edge_density_scale: 1.0,
        }
    }

    /// Multiply `Edge_Density` by a constant
    ///
    /// Regressors trained on summed 8-bit edge maps expect 255.
    pub fn with_edge_density_scale(mut self, scale: f64) -> Self {
        self.edge_density_scale = scale;
        self
    }

    pub fn encoder(&self) -> &ClassEncoder {
        &self.encoder
    }

    pub fn feature_names(&self) -> Vec<String> {
        SCALAR_FEATURES
            .iter()
            .map(|s| s.to_string())
            .chain(self.encoder.feature_names())
            .collect()
    }

    /// Compute the feature vector for one segmented item
    ///
    /// A mask whose size differs from the image is resized (nearest) first.
    pub fn extract(
        &self,
        image: &DynamicImage,
        mask: &GrayImage,
        bbox: &[f32; 4],
        pixels_per_cm: f64,
        class_name: &str,
    ) -> FeatureVector {
        let resized;
        let mask = if mask.dimensions() == (image.width(), image.height()) {
            mask
        } else {
            resized = image::imageops::resize(
                mask,
                image.width(),
                image.height(),
                FilterType::Nearest,
            );
            &resized
        };

        let area = real_area(mask, pixels_per_cm);
        let (width, length) = width_length(bbox, pixels_per_cm);
        let shape = shape_descriptors(mask);
        let volume = estimate_volume(width, length);
        let [r, g, b] = mean_color(image, mask);
        let (mean_r, mean_g, mean_b) = match self.color_order {
            ColorOrder::Rgb => (r, g, b),
            ColorOrder::Bgr => (b, g, r),
        };
        let edges = edge_density(mask) * self.edge_density_scale;

        debug!(
            "Features for {}: area {:.2}cm², {:.2}x{:.2}cm, solidity {:.3}",
            class_name, area, width, length, shape.solidity
        );

        let mut values = vec![
            pixels_per_cm,
            area,
            width,
            length,
            shape.aspect_ratio,
            shape.extent,
            shape.solidity,
            shape.circularity,
            volume,
            mean_r,
            mean_g,
            mean_b,
            edges,
        ];
        values.extend(self.encoder.encode(class_name));

        FeatureVector::new(self.feature_names(), values)
    }
}
