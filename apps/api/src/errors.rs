use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::pipeline::{PipelineFailure, Stage};

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Completion backend error: {0}")]
    Completion(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<PipelineFailure> for AppError {
    fn from(failure: PipelineFailure) -> Self {
        match failure.stage {
            Stage::Extraction => AppError::Extraction(failure.detail),
            Stage::Completion => AppError::Completion(failure.detail),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(err.body_text())
        } else {
            AppError::Validation(format!("Malformed multipart body: {}", err.body_text()))
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::PayloadTooLarge(msg) => {
                tracing::warn!("Upload rejected: {msg}");
                (
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "PAYLOAD_TOO_LARGE",
                    "The uploaded resume exceeds the maximum upload size".to_string(),
                )
            }
            AppError::Extraction(msg) => {
                tracing::warn!("Extraction error: {msg}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "EXTRACTION_FAILED",
                    "Could not read any text from the uploaded PDF. \
                     Make sure it is not encrypted or a scanned image."
                        .to_string(),
                )
            }
            AppError::Completion(msg) => {
                tracing::error!("Completion error: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "COMPLETION_UNAVAILABLE",
                    "The analysis service is unavailable. Please try again later.".to_string(),
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
