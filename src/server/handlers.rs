use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::{Field, MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    foundation::error::{CaptionError, CaptionResult},
    pipeline::CaptionRequest,
    server::{
        response::{
            GenerateResponse, HealthResponse, UploadResponse, generate_error, upload_error,
        },
        routes::AppState,
    },
    storage::upload::UploadedFile,
};

/// Multipart field carrying the uploaded file.
const UPLOAD_FIELD: &str = "file";

pub(crate) async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    match store_upload(&state, multipart).await {
        Ok(file) => Json(UploadResponse::from(file)).into_response(),
        Err(e) => upload_error(&e),
    }
}

async fn store_upload(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> CaptionResult<UploadedFile> {
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!(%rejection, "not a multipart body");
        CaptionError::NoFile
    })?;

    let limit = state.upload_policy.max_bytes;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            return stream_field(state, field).await;
        }
    }
    Err(CaptionError::NoFile)
}

#[tracing::instrument(skip_all, fields(file_name = field.file_name().unwrap_or_default()))]
async fn stream_field(state: &AppState, mut field: Field<'_>) -> CaptionResult<UploadedFile> {
    let original_name = field.file_name().unwrap_or_default().to_string();
    let mime = field.content_type().map(str::to_string);

    let store = state.pipeline.store();
    let mut pending = store.begin_upload(&state.upload_policy, &original_name, mime.as_deref())?;
    loop {
        let next = match field.chunk().await {
            Ok(Some(chunk)) => pending.write_chunk(&chunk).await,
            Ok(None) => return pending.finish().await,
            Err(e) => Err(multipart_error(e, state.upload_policy.max_bytes)),
        };
        if let Err(e) = next {
            pending.abort().await;
            return Err(e);
        }
    }
}

/// The body limit layer surfaces as a 413 multipart error.
fn multipart_error(e: MultipartError, limit: u64) -> CaptionError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        CaptionError::TooLarge { limit }
    } else {
        CaptionError::Other(anyhow::anyhow!("read multipart body: {}", e.body_text()))
    }
}

pub(crate) async fn generate(
    State(state): State<AppState>,
    body: Result<Json<CaptionRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            return generate_error(&CaptionError::validation(rejection.body_text()));
        }
    };

    match state.pipeline.compose(&req).await {
        Ok(artifact) => Json(GenerateResponse {
            image_url: artifact.public_url,
        })
        .into_response(),
        Err(e) => generate_error(&e),
    }
}

pub(crate) async fn health(State(state): State<AppState>) -> Response {
    let font = state.pipeline.fonts().health();
    let status = if font.is_healthy() { "ok" } else { "degraded" };
    Json(HealthResponse { status, font }).into_response()
}
