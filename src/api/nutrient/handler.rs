// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Nutrient lookup handlers

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;
use tracing::{debug, warn};

use super::request::NutrientQuery;
use crate::api::errors::ApiError;
use crate::api::http_server::{run_blocking, AppState};
use crate::nutrition::{DetailedBreakdown, NutrientBreakdown, SingleNutrient};

/// Body of GET /nutrient; the shape depends on whether `nutrient` was given
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum NutrientResponse {
    Single(SingleNutrient),
    Breakdown(NutrientBreakdown),
}

/// GET /nutrient - Scale reference nutrients to a weight
///
/// # Errors
/// - 400 Bad Request: missing/invalid weight or unknown nutrient selector
/// - 404 Not Found: food is not in the reference table
/// - 500 Internal Server Error: reference data unreadable or malformed
pub async fn nutrient_handler(
    State(state): State<AppState>,
    Query(query): Query<NutrientQuery>,
) -> Result<Json<NutrientResponse>, ApiError> {
    let (food, weight) = query
        .validate()
        .inspect_err(|e| warn!("Nutrient query rejected: {}", e))?;
    debug!("Nutrient lookup: food={} weight={} nutrient={:?}", food, weight, query.nutrient);

    let service = state.nutrient_service.clone();
    let response = run_blocking(move || match query.nutrient {
        Some(nutrient) => Ok(NutrientResponse::Single(
            service.lookup_nutrient(&food, weight, &nutrient)?,
        )),
        None => Ok(NutrientResponse::Breakdown(service.lookup(&food, weight)?)),
    })
    .await?;

    Ok(Json(response))
}

/// GET /nutrient/detailed - Every nutrient column, unit-annotated
pub async fn detailed_handler(
    State(state): State<AppState>,
    Query(query): Query<NutrientQuery>,
) -> Result<Json<DetailedBreakdown>, ApiError> {
    let (food, weight) = query.validate()?;
    let service = state.nutrient_service.clone();
    let response = run_blocking(move || Ok(service.lookup_detailed(&food, weight)?)).await?;
    Ok(Json(response))
}
