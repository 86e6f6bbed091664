//! CPU caption compositor.
//!
//! Layer order is fixed: source image at the origin, a full-surface black overlay at 30% opacity,
//! then each caption line in white, centered on its [`LinePlacement`] anchor.

use std::sync::Arc;

use crate::{
    assets::{decode::DecodedImage, font::LoadedFont},
    foundation::{
        core::Canvas,
        error::{CaptionError, CaptionResult},
    },
    layout::caption::{CaptionLayout, LinePlacement, layout_caption},
    render::text::{TextBrushRgba8, TextLayoutEngine},
};

/// Overlay color as straight RGBA8: black at 30% (77/255) opacity.
pub const OVERLAY_RGBA8: [u8; 4] = [0, 0, 0, 77];

/// A rendered frame as RGBA8 pixels.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Premultiplied RGBA of pixel `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.data.get(i..i + 4).map(|px| [px[0], px[1], px[2], px[3]])
    }
}

struct ShapedLine<'a> {
    placement: &'a LinePlacement,
    layout: parley::Layout<TextBrushRgba8>,
}

/// Composite `text` over `image` with the caption font.
///
/// The output has exactly the source image's dimensions.
#[tracing::instrument(skip_all, fields(width = image.width, height = image.height))]
pub fn render_caption(
    image: &DecodedImage,
    text: &str,
    font: &LoadedFont,
) -> CaptionResult<FrameRGBA> {
    let canvas = image.canvas()?;
    let layout = layout_caption(text, canvas);
    tracing::debug!(lines = layout.line_count(), start_y = layout.start_y, "caption layout");

    let mut engine = TextLayoutEngine::for_font(font)?;
    render_layers(image, canvas, Some((&mut engine, font.font_data(), &layout)))
}

fn render_layers(
    image: &DecodedImage,
    canvas: Canvas,
    caption: Option<(
        &mut TextLayoutEngine,
        &vello_cpu::peniko::FontData,
        &CaptionLayout,
    )>,
) -> CaptionResult<FrameRGBA> {
    let (w, h) = canvas.to_u16()?;
    let mut ctx = vello_cpu::RenderContext::new(w, h);

    paint_image(&mut ctx, image)?;
    paint_overlay(&mut ctx, canvas);

    if let Some((engine, font, layout)) = caption {
        let shaped: Vec<ShapedLine<'_>> = layout
            .lines
            .iter()
            .map(|placement| ShapedLine {
                placement,
                layout: engine.layout_line(&placement.text),
            })
            .collect();
        for line in &shaped {
            paint_line(&mut ctx, font, line);
        }
    }

    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);

    Ok(FrameRGBA {
        width: canvas.width,
        height: canvas.height,
        data: pixmap.data_as_u8_slice().to_vec(),
        premultiplied: true,
    })
}

fn paint_image(ctx: &mut vello_cpu::RenderContext, image: &DecodedImage) -> CaptionResult<()> {
    let pixmap = image_premul_bytes_to_pixmap(image)?;
    let paint = vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    };

    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(paint);
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        f64::from(image.width),
        f64::from(image.height),
    ));
    Ok(())
}

fn paint_overlay(ctx: &mut vello_cpu::RenderContext, canvas: Canvas) {
    let [r, g, b, a] = OVERLAY_RGBA8;
    let bounds = canvas.bounds();

    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        bounds.x0, bounds.y0, bounds.x1, bounds.y1,
    ));
}

fn paint_line(
    ctx: &mut vello_cpu::RenderContext,
    font: &vello_cpu::peniko::FontData,
    line: &ShapedLine<'_>,
) {
    // Center the shaped line box on the anchor.
    let width = f64::from(line.layout.width());
    let height = f64::from(line.layout.height());
    let center = line.placement.center;

    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_transform(vello_cpu::kurbo::Affine::translate((
        center.x - width / 2.0,
        center.y - height / 2.0,
    )));

    for text_line in line.layout.lines() {
        for item in text_line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };

            let brush = run.style().brush;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                brush.r, brush.g, brush.b, brush.a,
            ));

            // Positioned glyphs carry layout-space x and baseline y; `glyphs()` is run-relative.
            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
}

fn image_premul_bytes_to_pixmap(image: &DecodedImage) -> CaptionResult<vello_cpu::Pixmap> {
    let (w, h) = image.canvas()?.to_u16()?;
    let rgba8_premul = image.rgba8_premul.as_slice();
    if rgba8_premul.len() != image.width as usize * image.height as usize * 4 {
        return Err(CaptionError::decode("decoded image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(image.width as usize * image.height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
