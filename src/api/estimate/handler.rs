// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Estimate endpoint handler

use axum::{extract::State, Json};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::request::EstimateRequest;
use super::response::EstimateResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::{run_blocking, AppState};

/// POST /v1/estimate - Food type, weight and nutrients from a photo
///
/// The photo must show the food next to the calibration marker. The
/// predicted weight is fed to the nutrient lookup under the mapped food
/// name; a failed lookup is reported in `nutrient_error` rather than
/// failing the request.
///
/// # Errors
/// - 400 Bad Request: missing or undecodable image
/// - 422 Unprocessable Entity: marker not found or food not detected
/// - 503 Service Unavailable: vision models not loaded
/// - 500 Internal Server Error: inference failed
pub async fn estimate_handler(
    State(state): State<AppState>,
    Json(request): Json<EstimateRequest>,
) -> Result<Json<EstimateResponse>, ApiError> {
    // 1. Validate request
    let image = request
        .validate()
        .inspect_err(|e| warn!("Estimate validation failed: {}", e))?
        .to_string();

    // 2. Vision pipeline from state
    let pipeline = state.vision.clone().ok_or_else(|| {
        warn!("Vision models not loaded");
        ApiError::ServiceUnavailable("Vision models are not loaded".to_string())
    })?;

    // 3. Run the pipeline off the runtime
    let start = Instant::now();
    let estimate = run_blocking(move || Ok(pipeline.estimate_base64(&image)?)).await?;
    let food_name = state.name_mapper.map(&estimate.food_type).to_string();
    debug!("Mapped '{}' to '{}'", estimate.food_type, food_name);

    // 4. Nutrients for the predicted weight
    let service = state.nutrient_service.clone();
    let (name, weight) = (food_name.clone(), estimate.weight_grams);
    let lookup = run_blocking(move || Ok(service.lookup(&name, weight))).await?;

    let mut response =
        EstimateResponse::new(estimate, food_name, start.elapsed().as_millis() as u64);
    match lookup {
        Ok(nutrients) => response.nutrients = Some(nutrients),
        Err(e) => {
            warn!("Nutrient lookup for estimate failed: {}", e);
            response.nutrient_error = Some(e.to_string());
        }
    }

    info!(
        "Estimate complete: {} ({}) {:.2}g in {}ms",
        response.food_type,
        response.food_name,
        response.predicted_weight,
        response.processing_time_ms
    );

    Ok(Json(response))
}
