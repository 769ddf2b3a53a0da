use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::forecast::pipeline::PipelineError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Extraction failures are not errors: they come back as `ForecastOutcome` variants.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::UpstreamUnavailable(_) | PipelineError::UpstreamTimeout { .. } => {
                AppError::UpstreamUnavailable(err.to_string())
            }
            PipelineError::HistoricalData(inner) => inner,
            PipelineError::RequestConstruction(_) => AppError::Internal(err.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, retryable) = match &self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                false,
            ),
            AppError::UpstreamUnavailable(msg) => {
                tracing::warn!("Upstream unavailable: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "UPSTREAM_UNAVAILABLE",
                    "The forecasting service is unavailable, try again later".to_string(),
                    true,
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                    false,
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    false,
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
                "retryable": retryable
            }
        }));

        (status, body).into_response()
    }
}
