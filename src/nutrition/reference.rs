// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Nutrient reference table
//!
//! One row per food with a reference weight in grams and the nutrient
//! values for that weight. Food names are matched after trimming and
//! lowercasing; a name such as `"Pisang (Banana)"` also answers to
//! `"pisang"` and `"banana"`.

use std::collections::BTreeMap;

use super::errors::ReferenceError;
use super::nutrient::Nutrient;
use crate::utils::{Cell, Sheet};

/// Column holding the food name
pub const FOOD_COLUMN: &str = "Food";

/// Column holding the reference weight in grams
pub const WEIGHT_COLUMN: &str = "Weight";

/// Normalize a food name for matching (trim, lowercase)
pub fn normalize_food_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Split a `"Name (Name)"` composite into its two normalized halves
fn composite_names(normalized: &str) -> Option<(String, String)> {
    let inner = normalized.strip_suffix(')')?;
    let open = inner.find('(')?;
    let first = inner[..open].trim();
    let second = inner[open + 1..].trim();

    if first.is_empty() || second.is_empty() {
        return None;
    }

    Some((first.to_string(), second.to_string()))
}

/// Parsed reference table
#[derive(Debug, Clone)]
pub struct ReferenceTable {
    sheet: Sheet,
    food_column: usize,
    weight_column: usize,
    nutrient_columns: BTreeMap<Nutrient, usize>,
    /// Normalized full name per row, `None` for rows without a name
    names: Vec<Option<String>>,
}

/// A matched row of the reference table
#[derive(Debug, Clone, Copy)]
pub struct FoodRecord<'a> {
    table: &'a ReferenceTable,
    row: usize,
}

impl ReferenceTable {
    /// Build a table from a worksheet
    ///
    /// `Food`, `Weight` and the four core nutrient columns are required;
    /// the extended nutrient columns are picked up when present.
    pub fn from_sheet(sheet: Sheet) -> Result<Self, ReferenceError> {
        let food_column = sheet.require_column(FOOD_COLUMN)?;
        let weight_column = sheet.require_column(WEIGHT_COLUMN)?;

        let mut nutrient_columns = BTreeMap::new();
        for nutrient in Nutrient::CORE {
            nutrient_columns.insert(nutrient, sheet.require_column(nutrient.column())?);
        }
        for nutrient in Nutrient::EXTENDED {
            if let Some(idx) = sheet.column(nutrient.column()) {
                nutrient_columns.insert(nutrient, idx);
            }
        }

        let names = (0..sheet.rows.len())
            .map(|row| match sheet.cell(row, food_column) {
                Cell::Text(name) => Some(normalize_food_name(name)),
                Cell::Number(v) => Some(v.to_string()),
                Cell::Empty => None,
            })
            .collect();

        Ok(Self {
            sheet,
            food_column,
            weight_column,
            nutrient_columns,
            names,
        })
    }

    pub fn len(&self) -> usize {
        self.sheet.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheet.rows.is_empty()
    }

    /// Nutrient columns present in this table, in response order
    pub fn nutrients(&self) -> impl Iterator<Item = Nutrient> + '_ {
        self.nutrient_columns.keys().copied()
    }

    /// Find a food by name
    ///
    /// An exact match on the full name wins over a match on either half of
    /// a composite name; within each pass the first row wins.
    pub fn find(&self, food: &str) -> Option<FoodRecord<'_>> {
        let wanted = normalize_food_name(food);

        let exact = self
            .names
            .iter()
            .position(|name| name.as_deref() == Some(wanted.as_str()));

        let row = exact.or_else(|| {
            self.names.iter().position(|name| {
                name.as_deref()
                    .and_then(composite_names)
                    .map(|(a, b)| a == wanted || b == wanted)
                    .unwrap_or(false)
            })
        })?;

        Some(FoodRecord { table: self, row })
    }

    /// All rows as JSON records, missing values coerced to 0
    pub fn to_records(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.sheet
            .rows
            .iter()
            .map(|row| {
                self.sheet
                    .headers
                    .iter()
                    .enumerate()
                    .filter(|(_, h)| !h.is_empty())
                    .map(|(idx, header)| {
                        let value = row.get(idx).unwrap_or(&Cell::Empty).to_json();
                        (header.clone(), value)
                    })
                    .collect()
            })
            .collect()
    }
}

impl<'a> FoodRecord<'a> {
    /// Normalized food name as stored in the table
    pub fn name(&self) -> &'a str {
        self.table.names[self.row].as_deref().unwrap_or_default()
    }

    fn number(&self, column: usize, header: &str) -> Result<f64, ReferenceError> {
        let cell = self.table.sheet.cell(self.row, column);
        cell.as_number().ok_or_else(|| ReferenceError::InvalidValue {
            food: self.name().to_string(),
            column: header.to_string(),
            value: cell.as_text().unwrap_or_default().to_string(),
        })
    }

    /// Reference weight in grams; must be positive
    pub fn reference_weight(&self) -> Result<f64, ReferenceError> {
        let weight = self.number(self.table.weight_column, WEIGHT_COLUMN)?;
        if weight <= 0.0 {
            return Err(ReferenceError::NonPositiveWeight {
                food: self.name().to_string(),
                weight,
            });
        }
        Ok(weight)
    }

    /// Value of a nutrient at the reference weight; `None` if the table
    /// has no such column
    pub fn value(&self, nutrient: Nutrient) -> Result<Option<f64>, ReferenceError> {
        match self.table.nutrient_columns.get(&nutrient) {
            Some(&column) => self.number(column, nutrient.column()).map(Some),
            None => Ok(None),
        }
    }
}
