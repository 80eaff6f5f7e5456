// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Nutrient lookup over a reference spreadsheet
//!
//! This module provides:
//! - `reference` - Reference table rows and food-name matching
//! - `source` - Where the table is loaded from (re-read on every request)
//! - `lookup` - Proportional nutrient scaling by weight
//! - `name_mapper` - Vision class label to reference food name

pub mod errors;
pub mod lookup;
pub mod name_mapper;
pub mod nutrient;
pub mod reference;
pub mod source;

pub use errors::{NutrientError, ReferenceError};
pub use lookup::{
    round2, scale_nutrient, DetailedBreakdown, NutrientBreakdown, NutrientService, SingleNutrient,
};
pub use name_mapper::{map_to_reference_name, NameMapper, UNKNOWN_FOOD};
pub use nutrient::Nutrient;
pub use reference::{normalize_food_name, FoodRecord, ReferenceTable};
pub use source::{InMemorySource, ReferenceSource, SpreadsheetSource};
