use crate::{
    assets::font::LoadedFont,
    foundation::error::{CaptionError, CaptionResult},
    layout::caption::FONT_SIZE_PX,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub struct TextBrushRgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl TextBrushRgba8 {
    pub const WHITE: Self = Self {
        r: 255,
        g: 255,
        b: 255,
        a: 255,
    };
}

/// Shapes single caption lines with one registered font face.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family_name: String,
    size_px: f32,
    brush: TextBrushRgba8,
}

impl TextLayoutEngine {
    /// Register `font` with fresh Parley contexts; lines are shaped at the caption size in white.
    pub fn for_font(font: &LoadedFont) -> CaptionResult<Self> {
        Self::with_style(font, FONT_SIZE_PX, TextBrushRgba8::WHITE)
    }

    pub fn with_style(
        font: &LoadedFont,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> CaptionResult<Self> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(CaptionError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let mut font_ctx = parley::FontContext::default();
        font.register(&mut font_ctx)?;
        let family_name = font.family.clone();

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
            size_px,
            brush,
        })
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    /// Shape one line without wrapping. Overlong lines keep their natural width.
    pub fn layout_line(&mut self, text: &str) -> parley::Layout<TextBrushRgba8> {
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(self.size_px));
        builder.push_default(parley::style::StyleProperty::Brush(self.brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        layout
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
