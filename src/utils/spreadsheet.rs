// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Spreadsheet loading for reference data
//!
//! Reads the first worksheet of an xlsx/xls/ods workbook into a header row
//! plus typed cells. Both the nutrient reference table and the class
//! feature table are loaded through here.

use calamine::{open_workbook_auto, Data, Reader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SpreadsheetError {
    #[error("Failed to open workbook {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("Workbook {0} has no worksheets")]
    NoSheet(PathBuf),

    #[error("Worksheet in {0} has no header row")]
    NoHeader(PathBuf),

    #[error("Missing required column '{0}'")]
    MissingColumn(String),
}

/// A single cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    /// Numeric value of the cell, with empty cells read as 0
    ///
    /// Text cells that parse as numbers are accepted; other text is `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            Cell::Empty => Some(0.0),
            Cell::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// JSON value with missing cells coerced to 0
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Cell::Text(s) => serde_json::Value::String(s.clone()),
            Cell::Number(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::from(0)),
            Cell::Empty => serde_json::Value::from(0),
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(v) => Cell::Number(*v as f64),
            Data::Float(v) if v.is_finite() => Cell::Number(*v),
            Data::Float(_) => Cell::Empty,
            Data::Bool(b) => Cell::Number(if *b { 1.0 } else { 0.0 }),
            Data::String(s) if s.trim().is_empty() => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Error(_) | Data::Empty => Cell::Empty,
            other => Cell::Text(other.to_string()),
        }
    }
}

/// Header row plus data rows of one worksheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { headers, rows }
    }

    /// Build a sheet from raw workbook rows; the first row is the header
    pub fn from_rows<'a, I>(rows: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a [Data]>,
    {
        let mut rows = rows.into_iter();
        let headers: Vec<String> = rows
            .next()?
            .iter()
            .map(|c| c.to_string().trim().to_string())
            .collect();

        let rows = rows
            .map(|row| row.iter().map(Cell::from).collect::<Vec<_>>())
            .filter(|row| row.iter().any(|c| *c != Cell::Empty))
            .collect();

        Some(Self { headers, rows })
    }

    /// Index of a column by header name (trimmed, case-insensitive)
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name.trim()))
    }

    pub fn require_column(&self, name: &str) -> Result<usize, SpreadsheetError> {
        self.column(name)
            .ok_or_else(|| SpreadsheetError::MissingColumn(name.to_string()))
    }

    /// Cell at (row, column); short rows read as empty
    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&Cell::Empty)
    }
}

/// Read the first worksheet of a workbook
pub fn read_first_sheet<P: AsRef<Path>>(path: P) -> Result<Sheet, SpreadsheetError> {
    let path = path.as_ref();

    let mut workbook = open_workbook_auto(path).map_err(|source| SpreadsheetError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SpreadsheetError::NoSheet(path.to_path_buf()))?
        .map_err(|source| SpreadsheetError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let sheet = Sheet::from_rows(range.rows())
        .ok_or_else(|| SpreadsheetError::NoHeader(path.to_path_buf()))?;

    debug!(
        "Loaded {} rows x {} columns from {}",
        sheet.rows.len(),
        sheet.headers.len(),
        path.display()
    );

    Ok(sheet)
}
