// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Query parameters for nutrient lookups

use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;

/// `?food=<name>&weight=<grams>[&nutrient=<name>]`
///
/// Fields are kept as strings so a malformed weight is reported as a
/// validation error instead of an extractor rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NutrientQuery {
    #[serde(default)]
    pub food: Option<String>,
    #[serde(default)]
    pub weight: Option<String>,
    #[serde(default)]
    pub nutrient: Option<String>,
}

impl NutrientQuery {
    /// Food name and weight in grams
    pub fn validate(&self) -> Result<(String, f64), ApiError> {
        let food = match self.food.as_deref().map(str::trim) {
            Some(food) if !food.is_empty() => food.to_string(),
            _ => {
                return Err(ApiError::ValidationError {
                    field: "food".to_string(),
                    message: "food is required".to_string(),
                })
            }
        };

        let raw = self.weight.as_deref().map(str::trim).unwrap_or_default();
        if raw.is_empty() {
            return Err(ApiError::ValidationError {
                field: "weight".to_string(),
                message: "weight is required".to_string(),
            });
        }
        let weight = raw.parse::<f64>().map_err(|_| ApiError::ValidationError {
            field: "weight".to_string(),
            message: format!("weight must be a number of grams, got '{}'", raw),
        })?;

        Ok((food, weight))
    }
}
