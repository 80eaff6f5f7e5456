// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::data::data_handler;
use super::estimate::estimate_handler;
use super::nutrient::{detailed_handler, nutrient_handler};
use super::ApiError;
use crate::config::ServiceConfig;
use crate::nutrition::{NameMapper, NutrientService};
use crate::vision::{VisionModelInfo, VisionModelManager, VisionPipeline};

/// Shared, read-only state for every handler
#[derive(Clone)]
pub struct AppState {
    pub nutrient_service: Arc<NutrientService>,
    pub name_mapper: Arc<NameMapper>,
    /// `None` when the vision models failed to load
    pub vision: Option<Arc<VisionPipeline>>,
    pub vision_models: Vec<VisionModelInfo>,
}

impl AppState {
    /// State without any vision capability
    pub fn new(nutrient_service: NutrientService) -> Self {
        Self {
            nutrient_service: Arc::new(nutrient_service),
            name_mapper: Arc::new(NameMapper::default()),
            vision: None,
            vision_models: Vec::new(),
        }
    }

    pub fn with_vision(mut self, manager: &VisionModelManager) -> Self {
        self.vision = manager.pipeline();
        self.vision_models = manager.list_models();
        self
    }

    pub fn with_pipeline(mut self, pipeline: VisionPipeline) -> Self {
        self.vision = Some(Arc::new(pipeline));
        self
    }

    pub fn with_name_mapper(mut self, mapper: NameMapper) -> Self {
        self.name_mapper = Arc::new(mapper);
        self
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_handler))
        // Reference table
        .route("/data", get(data_handler))
        // Nutrient lookup
        .route("/nutrient", get(nutrient_handler))
        .route("/nutrient/detailed", get(detailed_handler))
        // Photo estimation
        .route("/v1/estimate", post(estimate_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn start_server(config: &ServiceConfig, state: AppState) -> anyhow::Result<()> {
    let addr = config.listen_addr().parse::<SocketAddr>()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, create_app(state)).await?;

    Ok(())
}

/// Run synchronous work (spreadsheet reads, inference) off the async runtime
pub(crate) async fn run_blocking<F, T>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::InternalError(format!("Worker task failed: {}", e)))?
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Version number, build tag and feature list
    pub version: serde_json::Value,
    pub vision_ready: bool,
    pub models: Vec<VisionModelInfo>,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: crate::version::get_version_info(),
        vision_ready: state.vision.is_some(),
        models: state.vision_models.clone(),
    })
}
