#![allow(dead_code)]

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The generator process exited badly or wrote fatal lines to stderr.
    /// The captured diagnostic text is surfaced to the caller.
    #[error("Generator process error: {0}")]
    GeneratorProcess(String),

    /// The generator exited cleanly but its stdout was not the JSON we
    /// agreed on. The raw payload is logged, never echoed back.
    #[error("Generator contract error: {message}")]
    GeneratorContract { message: String, payload: String },

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            AppError::GeneratorProcess(msg) => {
                tracing::error!("Generator process error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "GENERATOR_PROCESS_ERROR",
                    msg.clone(),
                )
            }
            AppError::GeneratorContract { message, payload } => {
                tracing::error!("Generator contract error: {message}; raw payload: {payload}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "GENERATOR_CONTRACT_ERROR",
                    message.clone(),
                )
            }
            AppError::Upstream(msg) => {
                tracing::error!("Upstream service error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    "An upstream service request failed".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
