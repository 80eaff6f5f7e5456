// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod nutrition;
pub mod utils;
pub mod version;
pub mod vision;

pub use config::ServiceConfig;
pub use nutrition::{
    map_to_reference_name, NameMapper, Nutrient, NutrientError, NutrientService,
    ReferenceSource, ReferenceTable, SpreadsheetSource, UNKNOWN_FOOD,
};
pub use vision::{Estimate, FeatureVector, VisionError, VisionPipeline};
