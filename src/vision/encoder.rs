// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! One-hot encoding of food classes
//!
//! The vocabulary is the sorted set of distinct `Food_type` values in the
//! class-feature spreadsheet the regressor was trained against. Classes
//! outside the vocabulary encode to all zeros.

use std::collections::BTreeSet;
use std::path::Path;

use crate::utils::{read_first_sheet, Cell, Sheet, SpreadsheetError};

/// Column holding the class label in the class-feature spreadsheet
pub const FOOD_TYPE_COLUMN: &str = "Food_type";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassEncoder {
    categories: Vec<String>,
}

impl ClassEncoder {
    /// Fit on a list of labels (sorted, deduplicated)
    pub fn fit<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let categories: BTreeSet<String> = labels.into_iter().map(Into::into).collect();
        Self {
            categories: categories.into_iter().collect(),
        }
    }

    /// Fit on the `Food_type` column of a sheet; blank cells are skipped
    pub fn from_sheet(sheet: &Sheet) -> Result<Self, SpreadsheetError> {
        let column = sheet.require_column(FOOD_TYPE_COLUMN)?;
        let labels = (0..sheet.rows.len()).filter_map(|row| match sheet.cell(row, column) {
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(v) => Some(v.to_string()),
            Cell::Empty => None,
        });
        Ok(Self::fit(labels))
    }

    /// Fit on the first sheet of a spreadsheet file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SpreadsheetError> {
        Self::from_sheet(&read_first_sheet(path)?)
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Output column names, `Food_type_<class>`
    pub fn feature_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .map(|c| format!("{}_{}", FOOD_TYPE_COLUMN, c))
            .collect()
    }

    pub fn encode(&self, class_name: &str) -> Vec<f64> {
        let mut out = vec![0.0; self.categories.len()];
        if let Ok(idx) = self.categories.binary_search_by(|c| c.as_str().cmp(class_name)) {
            out[idx] = 1.0;
        }
        out
    }
}
