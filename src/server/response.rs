//! JSON bodies and the mapping from [`CaptionError`] to client-facing messages.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::{
    assets::font::FontHealth,
    foundation::error::{CaptionError, ErrorKind},
    storage::upload::UploadedFile,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UploadResponse {
    pub success: bool,
    pub file_name: String,
    pub mime_type: String,
    pub size: u64,
    pub image_url: String,
}

impl From<UploadedFile> for UploadResponse {
    fn from(f: UploadedFile) -> Self {
        Self {
            success: true,
            file_name: f.stored_name,
            mime_type: f.mime_type,
            size: f.size,
            image_url: f.public_url,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateResponse {
    pub image_url: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse<'a> {
    pub status: &'static str,
    pub font: &'a FontHealth,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

pub(crate) fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorBody { error: message })).into_response()
}

/// `/upload` failures. Details are logged, never returned.
pub(crate) fn upload_error(err: &CaptionError) -> Response {
    let (status, message) = match err {
        CaptionError::NoFile => (StatusCode::BAD_REQUEST, "No file uploaded"),
        CaptionError::RejectedMimeType(_) => (StatusCode::BAD_REQUEST, "Only image files are allowed"),
        CaptionError::TooLarge { .. } => (StatusCode::BAD_REQUEST, "File too large"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "File upload failed"),
    };
    log_failure("upload", err);
    error_response(status, message)
}

/// `/generate` failures. Details are logged, never returned.
pub(crate) fn generate_error(err: &CaptionError) -> Response {
    let (status, message) = match err {
        CaptionError::Encode(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to save image"),
        e if e.kind() == ErrorKind::ClientInput => {
            (StatusCode::BAD_REQUEST, "imageUrl and text are required")
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "Image generation failed"),
    };
    log_failure("generate", err);
    error_response(status, message)
}

fn log_failure(route: &'static str, err: &CaptionError) {
    match err.kind() {
        ErrorKind::ClientInput => tracing::warn!(route, error = %err, "request rejected"),
        ErrorKind::Processing => tracing::error!(route, error = ?err, "request failed"),
    }
}
