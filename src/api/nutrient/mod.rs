// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Nutrient lookup endpoints
//!
//! Provides GET /nutrient and GET /nutrient/detailed.

pub mod handler;
pub mod request;

pub use handler::{detailed_handler, nutrient_handler, NutrientResponse};
pub use request::NutrientQuery;
