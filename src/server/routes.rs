use std::{path::Path, sync::Arc};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::Response,
    routing::{get, post},
};
use tower_http::{catch_panic::CatchPanicLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    pipeline::CaptionPipeline,
    server::{handlers, response::error_response},
    storage::upload::UploadPolicy,
};

/// Slack on top of the upload ceiling for multipart framing and headers.
const BODY_LIMIT_SLACK: usize = 64 * 1024;

/// Per-request handler state.
#[derive(Clone, Debug)]
pub struct AppState {
    pub(crate) pipeline: CaptionPipeline,
    pub(crate) upload_policy: Arc<UploadPolicy>,
}

impl AppState {
    pub fn new(pipeline: CaptionPipeline) -> Self {
        Self::with_upload_policy(pipeline, UploadPolicy::default())
    }

    pub fn with_upload_policy(pipeline: CaptionPipeline, upload_policy: UploadPolicy) -> Self {
        Self {
            pipeline,
            upload_policy: Arc::new(upload_policy),
        }
    }
}

/// All routes plus `/images` (storage) and `/` (public assets) static hosting.
pub fn build_router(state: AppState, public_dir: &Path) -> Router {
    let body_limit = usize::try_from(state.upload_policy.max_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(BODY_LIMIT_SLACK);
    let images = ServeDir::new(state.pipeline.store().dir());

    Router::new()
        .route("/upload", post(handlers::upload))
        .route("/generate", post(handlers::generate))
        .route("/health", get(handlers::health))
        .nest_service("/images", images)
        .fallback_service(ServeDir::new(public_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn panic_response(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    tracing::error!(%detail, "request handler panicked");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}
