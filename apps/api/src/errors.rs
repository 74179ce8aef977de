use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::scan::ScanError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A store failure mid-scan. Opportunities added before it stay persisted.
    #[error("Scan failed after {added} opportunities were added: {message}")]
    ScanFailed { added: usize, message: String },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ScanError> for AppError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::ProfileMissing(user_id) => {
                AppError::NotFound(format!("No profile for user {user_id}"))
            }
            ScanError::Store { added, source } => AppError::ScanFailed {
                added,
                message: source.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::ScanFailed { added, message } => {
                tracing::error!("Scan aborted after {added} additions: {message}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SCAN_FAILED",
                    format!("Scan aborted by a storage error after {added} opportunities were added"),
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

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let AppError::ScanFailed { added, .. } = &self {
            error["added_count"] = json!(added);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
