// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! GET /data - the whole reference table

use axum::{extract::State, Json};
use serde::Serialize;

use super::http_server::{run_blocking, AppState};
use super::ApiError;

#[derive(Debug, Serialize)]
pub struct DataResponse {
    /// One object per row; blank cells are reported as 0
    pub data: Vec<serde_json::Map<String, serde_json::Value>>,
}

pub async fn data_handler(State(state): State<AppState>) -> Result<Json<DataResponse>, ApiError> {
    let service = state.nutrient_service.clone();
    let data = run_blocking(move || Ok(service.table()?.to_records())).await?;
    tracing::debug!("Serving {} reference rows", data.len());
    Ok(Json(DataResponse { data }))
}
