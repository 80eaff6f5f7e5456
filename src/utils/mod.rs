// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod spreadsheet;

pub use spreadsheet::{read_first_sheet, Cell, Sheet, SpreadsheetError};
