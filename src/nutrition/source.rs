// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Reference table sources
//!
//! The lookup service asks its source for a fresh table on every request,
//! so edits to the spreadsheet on disk are visible without a restart.

use std::path::{Path, PathBuf};

use super::errors::ReferenceError;
use super::reference::ReferenceTable;
use crate::utils::{read_first_sheet, Sheet};

/// Provides the nutrient reference table
pub trait ReferenceSource: Send + Sync {
    /// Load the current table
    fn load(&self) -> Result<ReferenceTable, ReferenceError>;

    /// Human-readable description for logs
    fn describe(&self) -> String;
}

/// Reads the first worksheet of a spreadsheet file on every load
#[derive(Debug, Clone)]
pub struct SpreadsheetSource {
    path: PathBuf,
}

impl SpreadsheetSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReferenceSource for SpreadsheetSource {
    fn load(&self) -> Result<ReferenceTable, ReferenceError> {
        let sheet = read_first_sheet(&self.path)?;
        ReferenceTable::from_sheet(sheet)
    }

    fn describe(&self) -> String {
        format!("spreadsheet {}", self.path.display())
    }
}

/// Serves a fixed in-memory sheet
#[derive(Debug, Clone)]
pub struct InMemorySource {
    sheet: Sheet,
}

impl InMemorySource {
    pub fn new(sheet: Sheet) -> Self {
        Self { sheet }
    }
}

impl ReferenceSource for InMemorySource {
    fn load(&self) -> Result<ReferenceTable, ReferenceError> {
        ReferenceTable::from_sheet(self.sheet.clone())
    }

    fn describe(&self) -> String {
        format!("in-memory table ({} rows)", self.sheet.rows.len())
    }
}
