// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLO segmentation output decoding
//!
//! `output0` has shape `[1, 4 + classes + coeffs, anchors]` with boxes as
//! centre/size in model input pixels; `output1` holds the mask prototypes
//! `[1, coeffs, mh, mw]`. The input image was stretched to a square, so
//! box and mask coordinates scale independently per axis.

use anyhow::{bail, Result};
use image::{GrayImage, Luma};
use ndarray::{Array2, ArrayView2, ArrayView3, ArrayViewD, Axis, Ix2, Ix3};
use tracing::debug;

use super::model::SegmenterConfig;
use super::{InstanceSelection, Segmentation};

/// One candidate instance in model input space
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// `[x1, y1, x2, y2]` in model input pixels
    pub bbox: [f32; 4],
    pub confidence: f32,
    pub class_id: usize,
    /// Mask coefficients against the prototypes
    pub coefficients: Vec<f32>,
}

/// Intersection over union of two `[x1, y1, x2, y2]` boxes
pub fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let ix1 = a[0].max(b[0]);
    let iy1 = a[1].max(b[1]);
    let ix2 = a[2].min(b[2]);
    let iy2 = a[3].min(b[3]);

    let intersection = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
    let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
    let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
    let union = area_a + area_b - intersection;

    if union <= 0.0 {
        0.0
    } else {
        intersection / union
    }
}

/// Candidates whose best class score exceeds the threshold
pub fn decode_predictions(
    preds: ArrayView2<f32>,
    num_coefficients: usize,
    confidence_threshold: f32,
) -> Result<Vec<Detection>> {
    let (channels, anchors) = preds.dim();
    if channels <= 4 + num_coefficients {
        bail!(
            "Prediction tensor has {} channels, need more than {} for boxes and mask coefficients",
            channels,
            4 + num_coefficients
        );
    }
    let num_classes = channels - 4 - num_coefficients;

    let mut detections = Vec::new();
    for a in 0..anchors {
        let (class_id, confidence) = (0..num_classes)
            .map(|c| (c, preds[[4 + c, a]]))
            .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });

        if confidence <= confidence_threshold {
            continue;
        }

        let (cx, cy, w, h) = (preds[[0, a]], preds[[1, a]], preds[[2, a]], preds[[3, a]]);
        detections.push(Detection {
            bbox: [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0],
            confidence,
            class_id,
            coefficients: (0..num_coefficients)
                .map(|k| preds[[4 + num_classes + k, a]])
                .collect(),
        });
    }

    Ok(detections)
}

/// Greedy per-class suppression; survivors in descending confidence
pub fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<Detection> = Vec::new();
    for det in detections {
        let suppressed = kept
            .iter()
            .any(|k| k.class_id == det.class_id && iou(&k.bbox, &det.bbox) > iou_threshold);
        if !suppressed {
            kept.push(det);
        }
    }
    kept
}

/// Sigmoid of coefficients times prototypes, at prototype resolution
pub fn prototype_mask(coefficients: &[f32], protos: ArrayView3<f32>) -> Array2<f32> {
    let (_, mh, mw) = protos.dim();
    let mut out = Array2::<f32>::zeros((mh, mw));

    for (k, &c) in coefficients.iter().enumerate() {
        out.scaled_add(c, &protos.index_axis(Axis(0), k));
    }
    out.mapv_inplace(|v| 1.0 / (1.0 + (-v).exp()));
    out
}

/// Map a box from model input space to image pixels, clamped to the image
pub fn scale_box(bbox: &[f32; 4], input_size: u32, width: u32, height: u32) -> [f32; 4] {
    let sx = width as f32 / input_size as f32;
    let sy = height as f32 / input_size as f32;
    [
        (bbox[0] * sx).clamp(0.0, width as f32),
        (bbox[1] * sy).clamp(0.0, height as f32),
        (bbox[2] * sx).clamp(0.0, width as f32),
        (bbox[3] * sy).clamp(0.0, height as f32),
    ]
}

/// Binary instance mask at image resolution, cropped to the instance box
pub fn instance_mask(
    detection: &Detection,
    protos: ArrayView3<f32>,
    input_size: u32,
    (width, height): (u32, u32),
    mask_threshold: f32,
) -> GrayImage {
    let probs = prototype_mask(&detection.coefficients, protos);
    let (mh, mw) = probs.dim();
    let [bx1, by1, bx2, by2] = scale_box(&detection.bbox, input_size, width, height);

    GrayImage::from_fn(width, height, |x, y| {
        let fx = x as f32 + 0.5;
        let fy = y as f32 + 0.5;
        if fx < bx1 || fx > bx2 || fy < by1 || fy > by2 {
            return Luma([0]);
        }
        let px = ((fx * mw as f32 / width as f32) as usize).min(mw.saturating_sub(1));
        let py = ((fy * mh as f32 / height as f32) as usize).min(mh.saturating_sub(1));
        if probs[[py, px]] > mask_threshold {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Decode raw model outputs into a merged segmentation
///
/// Returns `None` when no instance survives thresholding or the merged
/// mask is empty.
pub fn process_outputs(
    preds: ArrayViewD<f32>,
    protos: ArrayViewD<f32>,
    image_size: (u32, u32),
    config: &SegmenterConfig,
) -> Result<Option<Segmentation>> {
    if preds.ndim() != 3 || protos.ndim() != 4 {
        bail!(
            "Unexpected segmentation output shapes: {:?} and {:?}",
            preds.shape(),
            protos.shape()
        );
    }

    let preds = preds.index_axis(Axis(0), 0).into_dimensionality::<Ix2>()?;
    let protos = protos.index_axis(Axis(0), 0).into_dimensionality::<Ix3>()?;
    let num_coefficients = protos.dim().0;

    let candidates = decode_predictions(preds, num_coefficients, config.confidence_threshold)?;
    let kept = non_max_suppression(candidates, config.iou_threshold);
    debug!("Segmentation: {} instances after NMS", kept.len());

    let (width, height) = image_size;
    let mut union = GrayImage::new(width, height);
    for det in &kept {
        let mask = instance_mask(det, protos, config.input_size, image_size, config.mask_threshold);
        for (dst, src) in union.pixels_mut().zip(mask.pixels()) {
            dst[0] |= src[0];
        }
    }

    let selected = match config.selection {
        InstanceSelection::HighestConfidence => kept.first(),
        InstanceSelection::Last => kept.last(),
    };
    let Some(selected) = selected else {
        return Ok(None);
    };
    if union.pixels().all(|p| p[0] == 0) {
        debug!("Segmentation: instances found but merged mask is empty");
        return Ok(None);
    }

    Ok(Some(Segmentation {
        mask: union,
        class_name: config.class_name(selected.class_id),
        confidence: selected.confidence,
        bbox: scale_box(&selected.bbox, config.input_size, width, height),
        instances: kept.len(),
    }))
}
