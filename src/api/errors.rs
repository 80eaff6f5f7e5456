// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::nutrition::NutrientError;
use crate::vision::VisionError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    pub details: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone)]
pub enum ApiError {
    NotFound(String),
    ValidationError { field: String, message: String },
    /// Well-formed input the vision pipeline could not work with
    Unprocessable(String),
    ServiceUnavailable(String),
    InternalError(String),
}

impl ApiError {
    pub fn to_response(&self) -> ErrorResponse {
        let (error_type, message, details) = match self {
            ApiError::NotFound(msg) => ("not_found", msg.clone(), None),
            ApiError::ValidationError { field, message } => {
                let mut details = HashMap::new();
                details.insert(
                    "field".to_string(),
                    serde_json::Value::String(field.clone()),
                );
                ("validation_error", message.clone(), Some(details))
            }
            ApiError::Unprocessable(msg) => ("unprocessable_image", msg.clone(), None),
            ApiError::ServiceUnavailable(msg) => ("service_unavailable", msg.clone(), None),
            ApiError::InternalError(msg) => ("internal_error", msg.clone(), None),
        };

        ErrorResponse {
            error_type: error_type.to_string(),
            message,
            details,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::ValidationError { .. } => 400,
            ApiError::Unprocessable(_) => 422,
            ApiError::ServiceUnavailable(_) => 503,
            ApiError::InternalError(_) => 500,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError { field, message } => {
                write!(f, "Validation error for {}: {}", field, message)
            }
            ApiError::Unprocessable(msg) => write!(f, "Unprocessable image: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<NutrientError> for ApiError {
    fn from(err: NutrientError) -> Self {
        let message = err.to_string();
        match err {
            NutrientError::FoodNotFound(_) => ApiError::NotFound(message),
            NutrientError::InvalidNutrient(_) => ApiError::ValidationError {
                field: "nutrient".to_string(),
                message,
            },
            NutrientError::InvalidWeight(_) => ApiError::ValidationError {
                field: "weight".to_string(),
                message,
            },
            NutrientError::Reference(_) => ApiError::InternalError(message),
        }
    }
}

impl From<VisionError> for ApiError {
    fn from(err: VisionError) -> Self {
        let message = err.to_string();
        match err {
            VisionError::MarkerNotFound | VisionError::FoodNotDetected => {
                ApiError::Unprocessable(message)
            }
            VisionError::Image(_) => ApiError::ValidationError {
                field: "image".to_string(),
                message,
            },
            VisionError::Segmentation(_) | VisionError::Regressor(_) => {
                ApiError::InternalError(message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("{}", self);
        }
        (status, Json(self.to_response())).into_response()
    }
}
