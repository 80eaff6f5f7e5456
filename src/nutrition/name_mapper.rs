// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision class label to reference food name

use std::collections::HashMap;

/// Returned for labels that have no reference food
pub const UNKNOWN_FOOD: &str = "Unknown Food";

/// Segmentation class → reference table food name
const DEFAULT_MAPPING: &[(&str, &str)] = &[
    ("apple", "gala apple"),
    ("banana", "banana"),
    ("tangerine", "tangerine"),
    ("fried noodle", "noodle, rice"),
    ("fried rice", "rice, fried"),
    ("rojak", "rojak"),
    ("cooked rice", "rice, cooked"),
    ("oat", "oats, rolled"),
    ("mashed potato", "potato, mashed"),
    ("coleslaw", "coleslaw"),
];

/// Static mapping from vision class labels to reference food names
#[derive(Debug, Clone)]
pub struct NameMapper {
    mapping: HashMap<String, String>,
}

impl Default for NameMapper {
    fn default() -> Self {
        Self::with_entries(DEFAULT_MAPPING.iter().copied())
    }
}

impl NameMapper {
    /// Build a mapper from (label, food name) pairs; labels are lowercased
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            mapping: entries
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_lowercase(), v.into()))
                .collect(),
        }
    }

    /// Map a label, falling back to [`UNKNOWN_FOOD`]
    pub fn map(&self, label: &str) -> &str {
        self.mapping
            .get(&label.to_lowercase())
            .map(String::as_str)
            .unwrap_or(UNKNOWN_FOOD)
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}

/// Map a label with the default table
pub fn map_to_reference_name(label: &str) -> String {
    NameMapper::default().map(label).to_string()
}
