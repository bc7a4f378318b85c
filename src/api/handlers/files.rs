use crate::api::error::AppError;
use crate::utils::validation::{content_type_for, detect_file_type, generate_secure_filename, validate_filename};
use axum::{
    Json,
    body::{Body, Bytes},
    extract::{Query, State},
    http::header,
    response::Response,
};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio_util::io::ReaderStream;
use utoipa::ToSchema;

// ── Request / Response Types ──────────────────────────────────────────

#[derive(Deserialize)]
pub struct FilenameQuery {
    pub filename: Option<String>,
}

#[derive(Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlResponse {
    pub upload_url: String,
    pub method: String,
    pub expires_in: i64,
    pub secure_filename: String,
    pub original_filename: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadUrlResponse {
    pub download_url: String,
    pub expires_in: i64,
    pub filename: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub filename: String,
    pub size: usize,
    #[serde(rename = "type")]
    pub file_type: String,
}

// ── Handlers ──────────────────────────────────────────────────────────

/// Issue a presigned upload URL for a client-supplied original filename.
#[utoipa::path(
    get,
    path = "/api/files/upload-url",
    params(
        ("filename" = String, Query, description = "Original filename")
    ),
    responses(
        (status = 200, description = "Presigned upload URL", body = UploadUrlResponse),
        (status = 400, description = "Missing or invalid filename")
    ),
    tag = "files"
)]
pub async fn get_upload_url(
    State(state): State<crate::AppState>,
    Query(query): Query<FilenameQuery>,
) -> Result<Json<UploadUrlResponse>, AppError> {
    let original_filename = query
        .filename
        .filter(|f| !f.is_empty())
        .ok_or(AppError::MissingParameter("filename required".to_string()))?;

    // The original name only contributes its extension; conflicts and
    // traversal are impossible by construction, but verify anyway.
    let secure_filename = generate_secure_filename(&original_filename);
    if !validate_filename(&secure_filename) {
        return Err(AppError::InvalidFilename("invalid filename".to_string()));
    }

    let ttl = state.config.token_ttl_secs;
    let token = state.tokens.create_token(&secure_filename, ttl);
    let upload_url = format!(
        "{}/api/files/upload?token={}",
        state.config.public_base_url,
        utf8_percent_encode(&token, NON_ALPHANUMERIC)
    );

    Ok(Json(UploadUrlResponse {
        upload_url,
        method: "PUT".to_string(),
        expires_in: ttl,
        secure_filename,
        original_filename,
    }))
}

/// Accept a presigned upload: verify the token, sniff the content against
/// the magic-number allow-list, enforce the size cap, then write.
#[utoipa::path(
    put,
    path = "/api/files/upload",
    params(
        ("token" = String, Query, description = "Presigned upload token")
    ),
    responses(
        (status = 200, description = "File stored", body = UploadResponse),
        (status = 400, description = "Unsupported type or too large"),
        (status = 401, description = "Invalid or expired token")
    ),
    tag = "files"
)]
pub async fn upload_file(
    State(state): State<crate::AppState>,
    Query(query): Query<TokenQuery>,
    body: Bytes,
) -> Result<Json<UploadResponse>, AppError> {
    let token = query
        .token
        .ok_or(AppError::MissingParameter("missing token".to_string()))?;
    let payload = state.tokens.verify_token(&token)?;

    let file_type = detect_file_type(&body).ok_or(AppError::UnsupportedFileType)?;

    if body.len() > state.config.max_upload_size {
        return Err(AppError::FileTooLarge {
            size: body.len(),
            max: state.config.max_upload_size,
        });
    }

    state.storage.write(&payload.filename, &body).await?;

    tracing::info!(
        filename = %payload.filename,
        size = body.len(),
        file_type = %file_type,
        "📦 Stored presigned upload"
    );

    Ok(Json(UploadResponse {
        success: true,
        filename: payload.filename,
        size: body.len(),
        file_type: file_type.to_string(),
    }))
}

/// Issue a presigned download URL for a stored filename.
#[utoipa::path(
    get,
    path = "/api/files/download-url",
    params(
        ("filename" = String, Query, description = "Stored secure filename")
    ),
    responses(
        (status = 200, description = "Presigned download URL", body = DownloadUrlResponse),
        (status = 400, description = "Missing or invalid filename")
    ),
    tag = "files"
)]
pub async fn get_download_url(
    State(state): State<crate::AppState>,
    Query(query): Query<FilenameQuery>,
) -> Result<Json<DownloadUrlResponse>, AppError> {
    let filename = query
        .filename
        .filter(|f| !f.is_empty())
        .ok_or(AppError::MissingParameter("filename required".to_string()))?;

    if !validate_filename(&filename) {
        return Err(AppError::InvalidFilename("invalid filename".to_string()));
    }

    let ttl = state.config.token_ttl_secs;
    let token = state.tokens.create_token(&filename, ttl);
    let download_url = format!(
        "{}/api/files/download?token={}",
        state.config.public_base_url,
        utf8_percent_encode(&token, NON_ALPHANUMERIC)
    );

    Ok(Json(DownloadUrlResponse {
        download_url,
        expires_in: ttl,
        filename,
    }))
}

/// Serve a presigned download as a byte stream.
#[utoipa::path(
    get,
    path = "/api/files/download",
    params(
        ("token" = String, Query, description = "Presigned download token")
    ),
    responses(
        (status = 200, description = "File stream"),
        (status = 401, description = "Invalid or expired token"),
        (status = 404, description = "File not found")
    ),
    tag = "files"
)]
pub async fn download_file(
    State(state): State<crate::AppState>,
    Query(query): Query<TokenQuery>,
) -> Result<Response, AppError> {
    let token = query
        .token
        .ok_or(AppError::MissingParameter("missing token".to_string()))?;
    let payload = state.tokens.verify_token(&token)?;

    let (file, len) = match state.storage.open(&payload.filename).await {
        Ok(opened) => opened,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::FileNotFound);
        }
        Err(e) => return Err(AppError::Internal(format!("failed to read file: {}", e))),
    };

    let basename = Path::new(&payload.filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file");

    let response = Response::builder()
        .header(header::CONTENT_TYPE, content_type_for(&payload.filename))
        .header(header::CONTENT_LENGTH, len)
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", basename),
        )
        .header(
            header::CACHE_CONTROL,
            format!("private, max-age={}", state.config.token_ttl_secs),
        )
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(response)
}
