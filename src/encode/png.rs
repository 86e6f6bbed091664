use std::io::Write;

use image::ImageEncoder as _;

use crate::{
    foundation::{
        core::unpremultiply_rgba8_in_place,
        error::{CaptionError, CaptionResult},
    },
    render::compositor::FrameRGBA,
};

/// Encode `frame` as PNG straight into `writer`.
///
/// Compressed chunks are written as they are produced; the encoded file is never held in memory as
/// a whole. Premultiplied frames are converted to straight alpha first.
pub fn write_png<W: Write>(frame: &FrameRGBA, writer: W) -> CaptionResult<()> {
    let expected = frame.width as usize * frame.height as usize * 4;
    if frame.data.len() != expected {
        return Err(CaptionError::encode(format!(
            "frame byte length {} does not match {}x{} rgba8",
            frame.data.len(),
            frame.width,
            frame.height
        )));
    }

    let straight;
    let pixels = if frame.premultiplied {
        let mut data = frame.data.clone();
        unpremultiply_rgba8_in_place(&mut data);
        straight = data;
        straight.as_slice()
    } else {
        frame.data.as_slice()
    };

    image::codecs::png::PngEncoder::new(writer)
        .write_image(
            pixels,
            frame.width,
            frame.height,
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| CaptionError::encode(format!("encode png: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/encode/png.rs"]
mod tests;
