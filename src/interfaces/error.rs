//! HTTP error mapping

use crate::domain::errors::{PersistenceError, PredictionError, ValidationError};
use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Seconds a client should wait before retrying while no model is loaded
pub const RETRY_AFTER_SECS: u64 = 5;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    Rejected(ValidationError),
    Prediction(PredictionError),
    Store(PersistenceError),
    BadRequest(String),
    ReloadFailed(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Rejected(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "code": e.code,
                    "message": e.message,
                    "field": e.field,
                })),
            )
                .into_response(),
            ApiError::Prediction(e @ PredictionError::ModelUnavailable) => (
                StatusCode::SERVICE_UNAVAILABLE,
                [(header::RETRY_AFTER, RETRY_AFTER_SECS.to_string())],
                Json(json!({ "code": e.code(), "message": e.to_string() })),
            )
                .into_response(),
            ApiError::Prediction(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "code": e.code(), "message": e.to_string() })),
            )
                .into_response(),
            ApiError::Store(e) => {
                tracing::error!("Event store error: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({ "code": "store_unavailable", "message": "Event store unavailable" })),
                )
                    .into_response()
            }
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "code": "bad_request", "message": msg })),
            )
                .into_response(),
            ApiError::ReloadFailed(msg) => {
                tracing::error!("Model reload failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "code": "reload_failed", "message": msg })),
                )
                    .into_response()
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Rejected(err)
    }
}

impl From<PredictionError> for ApiError {
    fn from(err: PredictionError) -> Self {
        ApiError::Prediction(err)
    }
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        ApiError::Store(err)
    }
}
