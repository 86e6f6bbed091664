//! Caption composition pipeline: validate, resolve, fetch, decode, render, persist.

use std::sync::Arc;

use serde::Deserialize;

use crate::{
    assets::{
        decode::decode_image,
        font::FontRegistry,
        source::{ImageFetcher, ImageSource},
    },
    foundation::error::{CaptionError, CaptionResult},
    render::compositor::render_caption,
    storage::artifacts::{ArtifactStore, RenderedArtifact},
};

/// Body of `POST /generate`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionRequest {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl CaptionRequest {
    pub fn new(image_url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            image_url: Some(image_url.into()),
            text: Some(text.into()),
        }
    }

    /// Both fields present and non-empty, as `(image_url, text)`.
    pub fn validate(&self) -> CaptionResult<(&str, &str)> {
        match (self.image_url.as_deref(), self.text.as_deref()) {
            (Some(url), Some(text)) if !url.trim().is_empty() && !text.is_empty() => Ok((url, text)),
            _ => Err(CaptionError::validation("imageUrl and text are required")),
        }
    }
}

/// Everything a compose request needs, shared across requests.
#[derive(Clone, Debug)]
pub struct CaptionPipeline {
    fetcher: ImageFetcher,
    fonts: Arc<FontRegistry>,
    store: ArtifactStore,
}

impl CaptionPipeline {
    pub fn new(fetcher: ImageFetcher, fonts: Arc<FontRegistry>, store: ArtifactStore) -> Self {
        Self {
            fetcher,
            fonts,
            store,
        }
    }

    pub fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Render `req.text` over the image at `req.image_url` and store the result as a PNG.
    ///
    /// Nothing is written unless every step before encoding succeeds.
    #[tracing::instrument(skip_all, fields(lines = tracing::field::Empty))]
    pub async fn compose(&self, req: &CaptionRequest) -> CaptionResult<RenderedArtifact> {
        let (image_url, text) = req.validate()?;
        let font = self.fonts.font()?;
        tracing::Span::current().record("lines", text.split('\n').count());

        let source = ImageSource::parse(image_url, &self.store.images_prefix())?;
        let bytes = self.fetcher.fetch(&source).await?;

        let text = text.to_string();
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || {
            let image = decode_image(&bytes)?;
            let frame = render_caption(&image, &text, &font)?;
            store.write_png(&frame)
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "compose worker did not complete");
            CaptionError::Other(anyhow::anyhow!("compose worker failed: {e}"))
        })?
    }
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;
