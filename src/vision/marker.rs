// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Fiducial marker detection and pixel scale
//!
//! Finds a square marker of known physical side length and derives the
//! image scale in pixels per centimetre. Candidates are dark quadrilaterals
//! whose outer ring of cells is dark and whose payload grid contains at
//! least one light cell.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::contrast::otsu_level;
use imageproc::geometric_transformations::Projection;
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default physical side length of the marker
pub const DEFAULT_MARKER_LENGTH_CM: f64 = 5.0;

/// Marker detection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerConfig {
    /// Physical side length of the marker in centimetres
    pub marker_length_cm: f64,
    /// Payload grid size (5 for 5x5 dictionaries)
    pub marker_bits: u32,
    /// Smallest accepted side length in pixels
    pub min_side_px: f32,
    /// Polygon approximation tolerance as a fraction of the perimeter
    pub polygon_epsilon: f64,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            marker_length_cm: DEFAULT_MARKER_LENGTH_CM,
            marker_bits: 5,
            min_side_px: 12.0,
            polygon_epsilon: 0.05,
        }
    }
}

/// A detected marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedMarker {
    /// Payload bits read row-major, light cells as 1
    pub id: u32,
    /// Corners clockwise from the top-left-most corner
    pub corners: [(f32, f32); 4],
    /// Image scale derived from the first side
    pub pixels_per_cm: f64,
}

impl DetectedMarker {
    /// Pixel length of the side between corner 0 and corner 1
    pub fn side_px(&self) -> f64 {
        distance(self.corners[0], self.corners[1])
    }
}

/// Locates a size-reference marker in an image
#[cfg_attr(test, mockall::automock)]
pub trait MarkerDetector: Send + Sync {
    /// Returns the first marker found, or `None` when there is none
    fn detect(&self, image: &DynamicImage) -> Option<DetectedMarker>;
}

/// Contour-based square marker detector
#[derive(Debug, Clone, Default)]
pub struct SquareMarkerDetector {
    config: MarkerConfig,
}

impl SquareMarkerDetector {
    pub fn new(config: MarkerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MarkerConfig {
        &self.config
    }

    /// Reduce a contour to four ordered corners, if it is a convex quad
    fn approximate_quad(&self, points: &[Point<i32>]) -> Option<[(f32, f32); 4]> {
        let perimeter = arc_length(points, true);
        if perimeter < 4.0 * self.config.min_side_px as f64 {
            return None;
        }

        let approx = approximate_polygon_dp(points, self.config.polygon_epsilon * perimeter, true);

        // Drop near-duplicate vertices, including the closing one
        let merge_dist = self.config.min_side_px as f64 * 0.5;
        let mut vertices: Vec<(f32, f32)> = Vec::with_capacity(approx.len());
        for p in approx {
            let v = (p.x as f32, p.y as f32);
            if vertices.last().map_or(true, |&last| distance(last, v) >= merge_dist) {
                vertices.push(v);
            }
        }
        while vertices.len() > 1 && distance(vertices[0], vertices[vertices.len() - 1]) < merge_dist
        {
            vertices.pop();
        }

        let mut quad: [(f32, f32); 4] = vertices.try_into().ok()?;

        let sides_ok = (0..4).all(|i| {
            distance(quad[i], quad[(i + 1) % 4]) >= self.config.min_side_px as f64
        });
        if !sides_ok || !is_convex(&quad) {
            return None;
        }

        // Clockwise in image coordinates (y down) has positive signed area
        if signed_area(&quad) < 0.0 {
            quad.reverse();
        }
        let start = (0..4)
            .min_by(|&a, &b| {
                let ka = quad[a].0 + quad[a].1;
                let kb = quad[b].0 + quad[b].1;
                ka.partial_cmp(&kb).unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(0);
        quad.rotate_left(start);

        Some(quad)
    }

    /// Read the cell grid of a candidate; `None` unless it looks like a marker
    fn decode(&self, gray: &GrayImage, level: u8, quad: [(f32, f32); 4]) -> Option<u32> {
        let cells = self.config.marker_bits + 2;
        let projection = Projection::from_control_points(
            [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)],
            quad,
        )?;

        let mut id = 0u32;
        let mut any_light = false;

        for row in 0..cells {
            for col in 0..cells {
                let dark = cell_is_dark(gray, level, &projection, row, col, cells);
                let border = row == 0 || col == 0 || row == cells - 1 || col == cells - 1;

                if border {
                    if !dark {
                        return None;
                    }
                } else {
                    let bit = u32::from(!dark);
                    any_light |= !dark;
                    id = (id << 1) | bit;
                }
            }
        }

        any_light.then_some(id)
    }
}

impl MarkerDetector for SquareMarkerDetector {
    fn detect(&self, image: &DynamicImage) -> Option<DetectedMarker> {
        let gray = image.to_luma8();
        let level = otsu_level(&gray);

        let binary = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
            if gray.get_pixel(x, y)[0] <= level {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        });

        let contours = find_contours::<i32>(&binary);
        debug!("Marker search: {} contours at level {}", contours.len(), level);

        for contour in contours
            .iter()
            .filter(|c| c.border_type == BorderType::Outer)
        {
            let Some(quad) = self.approximate_quad(&contour.points) else {
                continue;
            };
            let Some(id) = self.decode(&gray, level, quad) else {
                continue;
            };

            // Contour points are pixel centres; the marker edge is half a pixel further out
            let corners = outer_edges(&quad);
            let marker = DetectedMarker {
                id,
                corners,
                pixels_per_cm: distance(corners[0], corners[1]) / self.config.marker_length_cm,
            };
            debug!(
                "Marker {} found, side {:.1}px, {:.3} px/cm",
                marker.id,
                marker.side_px(),
                marker.pixels_per_cm
            );
            return Some(marker);
        }

        None
    }
}

/// Average a 3x3 patch around the cell centre and compare to the level
fn cell_is_dark(
    gray: &GrayImage,
    level: u8,
    projection: &Projection,
    row: u32,
    col: u32,
    cells: u32,
) -> bool {
    let n = cells as f32;
    let mut sum = 0u32;
    let mut count = 0u32;

    for dy in [-0.25f32, 0.0, 0.25] {
        for dx in [-0.25f32, 0.0, 0.25] {
            let u = (col as f32 + 0.5 + dx) / n;
            let v = (row as f32 + 0.5 + dy) / n;
            let (x, y) = *projection * (u, v);
            let px = (x.round().max(0.0) as u32).min(gray.width().saturating_sub(1));
            let py = (y.round().max(0.0) as u32).min(gray.height().saturating_sub(1));
            sum += gray.get_pixel(px, py)[0] as u32;
            count += 1;
        }
    }

    sum / count <= level as u32
}

fn distance(a: (f32, f32), b: (f32, f32)) -> f64 {
    let dx = (a.0 - b.0) as f64;
    let dy = (a.1 - b.1) as f64;
    (dx * dx + dy * dy).sqrt()
}

/// Offset every side of a clockwise quad outward by half a pixel
fn outer_edges(quad: &[(f32, f32); 4]) -> [(f32, f32); 4] {
    let offset_line = |i: usize| {
        let a = quad[i];
        let b = quad[(i + 1) % 4];
        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        let len = (dx * dx + dy * dy).sqrt().max(f32::EPSILON);
        let (nx, ny) = (dy / len * 0.5, -dx / len * 0.5);
        ((a.0 + nx, a.1 + ny), (dx, dy))
    };

    std::array::from_fn(|i| {
        let (p, r) = offset_line((i + 3) % 4);
        let (q, s) = offset_line(i);
        let denom = r.0 * s.1 - r.1 * s.0;
        if denom.abs() < f32::EPSILON {
            return quad[i];
        }
        let t = ((q.0 - p.0) * s.1 - (q.1 - p.1) * s.0) / denom;
        (p.0 + t * r.0, p.1 + t * r.1)
    })
}

fn signed_area(quad: &[(f32, f32); 4]) -> f32 {
    (0..4)
        .map(|i| {
            let (x0, y0) = quad[i];
            let (x1, y1) = quad[(i + 1) % 4];
            x0 * y1 - x1 * y0
        })
        .sum::<f32>()
        / 2.0
}

fn is_convex(quad: &[(f32, f32); 4]) -> bool {
    let crosses: Vec<f32> = (0..4)
        .map(|i| {
            let a = quad[i];
            let b = quad[(i + 1) % 4];
            let c = quad[(i + 2) % 4];
            (b.0 - a.0) * (c.1 - b.1) - (b.1 - a.1) * (c.0 - b.0)
        })
        .collect();
    crosses.iter().all(|&c| c > 0.0) || crosses.iter().all(|&c| c < 0.0)
}
