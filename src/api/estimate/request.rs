// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Estimate request types and validation

use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::vision::image_utils::MAX_IMAGE_SIZE;

/// Request for photo estimation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EstimateRequest {
    /// Base64-encoded photo, optionally as a data URL
    #[serde(default)]
    pub image: Option<String>,
}

impl EstimateRequest {
    pub fn validate(&self) -> Result<&str, ApiError> {
        let image = match self.image.as_deref() {
            Some(image) if !image.trim().is_empty() => image,
            _ => {
                return Err(ApiError::ValidationError {
                    field: "image".to_string(),
                    message: "image is required".to_string(),
                })
            }
        };

        // Decoded size, before the data URL prefix is stripped
        if image.len() / 4 * 3 > MAX_IMAGE_SIZE + 64 {
            return Err(ApiError::ValidationError {
                field: "image".to_string(),
                message: format!("image exceeds maximum size of {} bytes", MAX_IMAGE_SIZE),
            });
        }

        Ok(image)
    }
}
