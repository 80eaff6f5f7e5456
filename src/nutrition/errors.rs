// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for nutrient lookup

use thiserror::Error;

use super::nutrient::Nutrient;
use crate::utils::SpreadsheetError;

/// Reference data could not be read or is malformed
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error(transparent)]
    Spreadsheet(#[from] SpreadsheetError),

    #[error("Invalid value '{value}' in column '{column}' for food '{food}'")]
    InvalidValue {
        food: String,
        column: String,
        value: String,
    },

    #[error("Reference weight for food '{food}' must be positive, got {weight}")]
    NonPositiveWeight { food: String, weight: f64 },
}

/// Failure of a nutrient lookup request
#[derive(Debug, Error)]
pub enum NutrientError {
    #[error("Food '{0}' not found in the database.")]
    FoodNotFound(String),

    #[error("Invalid nutrient '{0}'. Choose from: {}", Nutrient::valid_choices())]
    InvalidNutrient(String),

    #[error("Weight must be a positive number of grams, got {0}")]
    InvalidWeight(f64),

    #[error("Error processing request: {0}")]
    Reference(#[from] ReferenceError),
}
