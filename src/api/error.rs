use crate::services::token::TokenError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Unsupported file type")]
    UnsupportedFileType,

    #[error("File too large: {size} bytes exceeds {max} bytes")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid status value: {0}")]
    InvalidStatusValue(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("File not found")]
    FileNotFound,

    #[error("Not Found: {0}")]
    RecordNotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage write failure: {0}")]
    StorageWrite(#[from] std::io::Error),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "Internal Server Error".to_string(),
                )
            }
            AppError::MissingParameter(msg) => (StatusCode::BAD_REQUEST, "MISSING_PARAMETER", msg),
            AppError::InvalidFilename(msg) => (StatusCode::BAD_REQUEST, "INVALID_FILENAME", msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            AppError::Token(e) => {
                // Deliberately collapsed to a generic message; the specific
                // failure reason stays server-side only.
                tracing::warn!("Token verification failed: {}", e);
                (
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHORIZED",
                    "Invalid or expired token".to_string(),
                )
            }
            AppError::UnsupportedFileType => (
                StatusCode::BAD_REQUEST,
                "UNSUPPORTED_FILE_TYPE",
                "unsupported file type".to_string(),
            ),
            AppError::FileTooLarge { size, max } => (
                StatusCode::BAD_REQUEST,
                "FILE_TOO_LARGE",
                format!("file too large: {} bytes exceeds {} bytes", size, max),
            ),
            AppError::InvalidStatusValue(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_STATUS_VALUE", msg)
            }
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
            AppError::FileNotFound => (
                StatusCode::NOT_FOUND,
                "FILE_NOT_FOUND",
                "file not found".to_string(),
            ),
            AppError::RecordNotFound(msg) => (StatusCode::NOT_FOUND, "RECORD_NOT_FOUND", msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            AppError::StorageWrite(e) => {
                tracing::error!("Storage write failure: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_WRITE_FAILURE",
                    "failed to write file".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Anyhow(e) => {
                tracing::error!("Anyhow error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}
