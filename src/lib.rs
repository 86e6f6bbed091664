//! imgcaption is an HTTP service that stores image uploads and renders centered text captions onto
//! images.
//!
//! - [`CaptionPipeline::compose`] fetches a source image, darkens it with a translucent overlay,
//!   draws each caption line centered at a fixed pitch and stores the result as a PNG
//! - [`ArtifactStore::upload`] validates and stores client uploads
//! - [`server::serve`] exposes both over `axum` with static hosting of the stored files
#![forbid(unsafe_code)]

mod assets;
mod encode;
mod foundation;
mod layout;
mod render;
mod storage;

/// Environment and CLI configuration.
pub mod config;
pub(crate) mod pipeline;
/// HTTP routes and the process entry point.
pub mod server;

pub use crate::assets::decode::{DecodedImage, decode_image};
pub use crate::assets::font::{FontHealth, FontRegistry, LoadedFont, system_fallback_font};
pub use crate::assets::source::{ImageFetcher, ImageSource, MAX_SOURCE_BYTES};
pub use crate::encode::png::write_png;
pub use crate::foundation::core::{Canvas, Point};
pub use crate::foundation::error::{CaptionError, CaptionResult, ErrorKind};
pub use crate::layout::caption::{
    CaptionLayout, FONT_SIZE_PX, LINE_PITCH_PX, LinePlacement, layout_caption,
};
pub use crate::pipeline::{CaptionPipeline, CaptionRequest};
pub use crate::render::compositor::{FrameRGBA, OVERLAY_RGBA8, render_caption};
pub use crate::storage::artifacts::{ArtifactStore, RenderedArtifact};
pub use crate::storage::upload::{
    ALLOWED_MIME_TYPES, MAX_UPLOAD_BYTES, PendingUpload, UploadPolicy, UploadedFile,
    sanitize_file_name,
};
