// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod data;
pub mod errors;
pub mod estimate;
pub mod http_server;
pub mod nutrient;

pub use data::{data_handler, DataResponse};
pub use errors::{ApiError, ErrorResponse};
pub use estimate::{estimate_handler, EstimateRequest, EstimateResponse};
pub use http_server::{create_app, start_server, AppState, HealthResponse};
pub use nutrient::{detailed_handler, nutrient_handler, NutrientQuery, NutrientResponse};
