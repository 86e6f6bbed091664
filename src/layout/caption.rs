//! Caption line splitting and block centering.
//!
//! Lines are exactly what the caller delimited with `'\n'`; there is no word wrapping. Every line,
//! blank or not, consumes one [`LINE_PITCH_PX`] and the block of lines is centered vertically on the
//! canvas using that pitch rather than glyph metrics.

use crate::foundation::core::{Canvas, Point};

/// Caption font size in pixels.
pub const FONT_SIZE_PX: f32 = 50.0;

/// Vertical distance between consecutive line centers.
pub const LINE_PITCH_PX: f64 = 60.0;

/// One caption line and the point its text is centered on.
#[derive(Clone, Debug, PartialEq)]
pub struct LinePlacement {
    /// 0-based position in the caption, top to bottom.
    pub index: usize,
    pub text: String,
    /// Horizontal and vertical center of the line.
    pub center: Point,
}

/// All line placements for a caption on a given canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptionLayout {
    pub lines: Vec<LinePlacement>,
    /// `lines.len() * LINE_PITCH_PX`.
    pub total_height: f64,
    /// Center y of the first line.
    pub start_y: f64,
}

impl CaptionLayout {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// Split caption text into ordered lines.
///
/// Splits on `'\n'` only and drops a trailing `'\r'` from each segment so CRLF input behaves like
/// LF input. Empty segments are kept: `"A\n"` is two lines.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

/// Compute line centers for `text` on `canvas`.
///
/// `start_y = (H - N * pitch) / 2 + pitch / 2`, line `i` sits at `start_y + i * pitch`, and every
/// line is centered on `W / 2`.
pub fn layout_caption(text: &str, canvas: Canvas) -> CaptionLayout {
    let lines = split_lines(text);
    let total_height = lines.len() as f64 * LINE_PITCH_PX;
    let start_y = (f64::from(canvas.height) - total_height) / 2.0 + LINE_PITCH_PX / 2.0;
    let center_x = canvas.center_x();

    let lines = lines
        .into_iter()
        .enumerate()
        .map(|(index, line)| LinePlacement {
            index,
            text: line.to_string(),
            center: Point::new(center_x, start_y + index as f64 * LINE_PITCH_PX),
        })
        .collect();

    CaptionLayout {
        lines,
        total_height,
        start_y,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/caption.rs"]
mod tests;
