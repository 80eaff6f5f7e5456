// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Nutrient columns of the reference table

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::NutrientError;

/// A nutrient column of the reference table
///
/// Variants are ordered as they appear in responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Nutrient {
    Calories,
    Carbohydrate,
    Protein,
    Fat,
    Calcium,
    Iron,
    Sodium,
    Potassium,
    #[serde(rename = "Vitamin C")]
    VitaminC,
    Cholesterol,
}

impl Nutrient {
    /// Nutrients every reference table must carry
    pub const CORE: [Nutrient; 4] = [
        Nutrient::Calories,
        Nutrient::Carbohydrate,
        Nutrient::Protein,
        Nutrient::Fat,
    ];

    /// Columns of the extended reference table
    pub const EXTENDED: [Nutrient; 6] = [
        Nutrient::Calcium,
        Nutrient::Iron,
        Nutrient::Sodium,
        Nutrient::Potassium,
        Nutrient::VitaminC,
        Nutrient::Cholesterol,
    ];

    /// Column header in the reference spreadsheet
    pub fn column(&self) -> &'static str {
        match self {
            Nutrient::Calories => "Calories",
            Nutrient::Carbohydrate => "Carbohydrate",
            Nutrient::Protein => "Protein",
            Nutrient::Fat => "Fat",
            Nutrient::Calcium => "Calcium",
            Nutrient::Iron => "Iron",
            Nutrient::Sodium => "Sodium",
            Nutrient::Potassium => "Potassium",
            Nutrient::VitaminC => "Vitamin C",
            Nutrient::Cholesterol => "Cholesterol",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Nutrient::Calories => "kcal",
            Nutrient::Carbohydrate | Nutrient::Protein | Nutrient::Fat => "g",
            _ => "mg",
        }
    }

    pub fn all() -> impl Iterator<Item = Nutrient> {
        Self::CORE.into_iter().chain(Self::EXTENDED)
    }

    /// Parse a single-nutrient selector
    ///
    /// Only the core nutrients are selectable and the match is exact, so
    /// `"calories"` is rejected just like `"Sugar"`.
    pub fn parse_selector(name: &str) -> Result<Nutrient, NutrientError> {
        Self::CORE
            .into_iter()
            .find(|n| n.column() == name)
            .ok_or_else(|| NutrientError::InvalidNutrient(name.to_string()))
    }

    /// Comma-separated list of selectable nutrients
    pub fn valid_choices() -> String {
        Self::CORE
            .iter()
            .map(|n| n.column())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}
