// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Proportional nutrient lookup
//!
//! For a food and a weight in grams every nutrient is scaled linearly:
//! `(input_weight / reference_weight) * reference_value`, rounded to two
//! decimals. The reference table is loaded from the source on every call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::errors::NutrientError;
use super::nutrient::Nutrient;
use super::reference::{normalize_food_name, FoodRecord, ReferenceTable};
use super::source::ReferenceSource;

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Scale a reference value to the requested weight
pub fn scale_nutrient(input_weight: f64, reference_weight: f64, reference_value: f64) -> f64 {
    round2((input_weight / reference_weight) * reference_value)
}

/// All core nutrients for a weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientBreakdown {
    pub food: String,
    pub input_weight: f64,
    pub calculated_nutrients: BTreeMap<Nutrient, f64>,
}

/// One requested nutrient for a weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleNutrient {
    pub food: String,
    pub input_weight: f64,
    pub requested_nutrient: Nutrient,
    pub calculated_value: f64,
}

/// Every nutrient present in the table, annotated with its unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedBreakdown {
    pub food: String,
    pub input_weight: f64,
    pub calculated_nutrients: BTreeMap<Nutrient, String>,
}

/// Stateless nutrient lookup over a reference source
#[derive(Clone)]
pub struct NutrientService {
    source: Arc<dyn ReferenceSource>,
}

impl std::fmt::Debug for NutrientService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NutrientService")
            .field("source", &self.source.describe())
            .finish()
    }
}

impl NutrientService {
    pub fn new(source: Arc<dyn ReferenceSource>) -> Self {
        Self { source }
    }

    pub fn from_source<S: ReferenceSource + 'static>(source: S) -> Self {
        Self::new(Arc::new(source))
    }

    /// Full reference table, freshly loaded
    pub fn table(&self) -> Result<ReferenceTable, NutrientError> {
        let table = self.source.load()?;
        debug!("Loaded {} reference rows from {}", table.len(), self.source.describe());
        Ok(table)
    }

    /// Core nutrients (Calories, Carbohydrate, Protein, Fat) for a weight
    pub fn lookup(&self, food: &str, weight: f64) -> Result<NutrientBreakdown, NutrientError> {
        validate_weight(weight)?;
        let table = self.table()?;
        let record = find(&table, food)?;
        let reference_weight = record.reference_weight()?;

        let mut calculated_nutrients = BTreeMap::new();
        for nutrient in Nutrient::CORE {
            let value = record.value(nutrient)?.unwrap_or_default();
            calculated_nutrients.insert(nutrient, scale_nutrient(weight, reference_weight, value));
        }

        info!(
            "Nutrient lookup: {} @ {}g (reference {}g)",
            record.name(),
            weight,
            reference_weight
        );

        Ok(NutrientBreakdown {
            food: record.name().to_string(),
            input_weight: weight,
            calculated_nutrients,
        })
    }

    /// A single core nutrient for a weight
    ///
    /// The selector is checked before the table is read, so an invalid
    /// selector is reported even for unknown foods.
    pub fn lookup_nutrient(
        &self,
        food: &str,
        weight: f64,
        nutrient: &str,
    ) -> Result<SingleNutrient, NutrientError> {
        let nutrient = Nutrient::parse_selector(nutrient)?;
        validate_weight(weight)?;
        let table = self.table()?;
        let record = find(&table, food)?;
        let reference_weight = record.reference_weight()?;
        let value = record.value(nutrient)?.unwrap_or_default();

        Ok(SingleNutrient {
            food: record.name().to_string(),
            input_weight: weight,
            requested_nutrient: nutrient,
            calculated_value: scale_nutrient(weight, reference_weight, value),
        })
    }

    /// Every nutrient column present, formatted as `"<value> <unit>"`
    pub fn lookup_detailed(
        &self,
        food: &str,
        weight: f64,
    ) -> Result<DetailedBreakdown, NutrientError> {
        validate_weight(weight)?;
        let table = self.table()?;
        let record = find(&table, food)?;
        let reference_weight = record.reference_weight()?;

        let mut calculated_nutrients = BTreeMap::new();
        for nutrient in table.nutrients() {
            let value = record.value(nutrient)?.unwrap_or_default();
            let scaled = scale_nutrient(weight, reference_weight, value);
            calculated_nutrients.insert(nutrient, format!("{:.2} {}", scaled, nutrient.unit()));
        }

        Ok(DetailedBreakdown {
            food: record.name().to_string(),
            input_weight: weight,
            calculated_nutrients,
        })
    }
}

fn validate_weight(weight: f64) -> Result<(), NutrientError> {
    if !weight.is_finite() || weight <= 0.0 {
        return Err(NutrientError::InvalidWeight(weight));
    }
    Ok(())
}

fn find<'a>(table: &'a ReferenceTable, food: &str) -> Result<FoodRecord<'a>, NutrientError> {
    table
        .find(food)
        .ok_or_else(|| NutrientError::FoodNotFound(normalize_food_name(food)))
}
