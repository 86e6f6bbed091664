use std::sync::Arc;

use anyhow::Context;

use crate::foundation::{
    core::{Canvas, premultiply_rgba8_in_place},
    error::{CaptionError, CaptionResult},
};

/// Decoded source image in premultiplied RGBA8 form.
#[derive(Clone, Debug)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl DecodedImage {
    pub fn canvas(&self) -> CaptionResult<Canvas> {
        Canvas::new(self.width, self.height)
    }
}

/// Decode encoded image bytes (PNG, JPEG, GIF, WebP, BMP or SVG) into premultiplied RGBA8.
///
/// Raster formats keep their native pixel size. SVG documents are rasterized at their intrinsic
/// size.
pub fn decode_image(bytes: &[u8]) -> CaptionResult<DecodedImage> {
    if bytes.is_empty() {
        return Err(CaptionError::decode("image source is empty"));
    }
    if looks_like_svg(bytes) {
        return decode_svg(bytes);
    }

    let dyn_img = image::load_from_memory(bytes)
        .context("decode image from memory")
        .map_err(|e| CaptionError::decode(format!("{e:#}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(DecodedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

fn decode_svg(bytes: &[u8]) -> CaptionResult<DecodedImage> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts)
        .map_err(|e| CaptionError::decode(format!("parse svg tree: {e}")))?;

    let (width, height) = svg_intrinsic_size(&tree)?;
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| CaptionError::decode("failed to allocate svg pixmap"))?;

    let sx = (width as f32) / tree.size().width();
    let sy = (height as f32) / tree.size().height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);
    resvg::render(&tree, xform, &mut pixmap.as_mut());

    // tiny-skia pixmaps are already premultiplied RGBA8.
    Ok(DecodedImage {
        width,
        height,
        rgba8_premul: Arc::new(pixmap.data().to_vec()),
    })
}

fn svg_intrinsic_size(tree: &usvg::Tree) -> CaptionResult<(u32, u32)> {
    fn to_px(v: f32) -> CaptionResult<u32> {
        if !v.is_finite() || v <= 0.0 {
            return Err(CaptionError::decode("svg has invalid width/height"));
        }
        Ok((v.ceil() as u32).max(1))
    }

    const MAX_DIM: u32 = 16_384;
    let size = tree.size();
    let (w, h) = (to_px(size.width())?, to_px(size.height())?);
    if w > MAX_DIM || h > MAX_DIM {
        return Err(CaptionError::decode(format!(
            "svg raster size too large: {w}x{h} (max {MAX_DIM}x{MAX_DIM})"
        )));
    }
    Ok((w, h))
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    if image::guess_format(bytes).is_ok() {
        return false;
    }
    let head = &bytes[..bytes.len().min(512)];
    let Ok(text) = std::str::from_utf8(head) else {
        return false;
    };
    let text = text.trim_start_matches('\u{feff}').trim_start();
    text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
