use super::*;
use crate::assets::font::system_fallback_font;

fn solid(width: u32, height: u32, premul: [u8; 4]) -> DecodedImage {
    let data: Vec<u8> = std::iter::repeat_n(premul, (width * height) as usize)
        .flatten()
        .collect();
    DecodedImage {
        width,
        height,
        rgba8_premul: Arc::new(data),
    }
}

fn near(a: u8, b: u8, tol: u8) -> bool {
    a.abs_diff(b) <= tol
}

/// Inclusive bounding box of bright pixels.
#[derive(Debug)]
struct InkBox {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl InkBox {
    fn center_x(&self) -> f64 {
        f64::from(self.x0 + self.x1) / 2.0
    }

    fn center_y(&self) -> f64 {
        f64::from(self.y0 + self.y1) / 2.0
    }

    fn width(&self) -> f64 {
        f64::from(self.x1 - self.x0 + 1)
    }
}

fn ink_box(frame: &FrameRGBA, rows: std::ops::Range<u32>) -> Option<InkBox> {
    let mut ink: Option<InkBox> = None;
    for y in rows {
        for x in 0..frame.width {
            if !frame.pixel(x, y).is_some_and(|px| px[0] > 128) {
                continue;
            }
            let b = ink.get_or_insert(InkBox {
                x0: x,
                y0: y,
                x1: x,
                y1: y,
            });
            b.x0 = b.x0.min(x);
            b.y0 = b.y0.min(y);
            b.x1 = b.x1.max(x);
            b.y1 = b.y1.max(y);
        }
    }
    ink
}

fn bright_rows(frame: &FrameRGBA, rows: std::ops::Range<u32>) -> usize {
    rows.flat_map(|y| (0..frame.width).map(move |x| (x, y)))
        .filter(|&(x, y)| frame.pixel(x, y).is_some_and(|px| px[0] > 220))
        .count()
}

#[test]
fn overlay_darkens_opaque_white_to_seventy_percent() {
    let image = solid(16, 16, [255, 255, 255, 255]);
    let frame = render_layers(&image, image.canvas().unwrap(), None).unwrap();

    assert_eq!((frame.width, frame.height), (16, 16));
    assert!(frame.premultiplied);
    for px in frame.data.chunks_exact(4) {
        assert!(near(px[0], 178, 2), "{px:?}");
        assert!(near(px[1], 178, 2), "{px:?}");
        assert!(near(px[2], 178, 2), "{px:?}");
        assert_eq!(px[3], 255);
    }
}

#[test]
fn overlay_over_transparent_source_is_the_overlay_itself() {
    let image = solid(4, 4, [0, 0, 0, 0]);
    let frame = render_layers(&image, image.canvas().unwrap(), None).unwrap();
    let px = frame.pixel(2, 2).unwrap();
    assert_eq!(&px[..3], &[0, 0, 0]);
    assert!(near(px[3], OVERLAY_RGBA8[3], 1), "{px:?}");
}

#[test]
fn oversized_images_are_rejected() {
    let image = DecodedImage {
        width: 70_000,
        height: 1,
        rgba8_premul: Arc::new(Vec::new()),
    };
    assert!(render_layers(&image, image.canvas().unwrap(), None).is_err());
}

#[test]
fn pixel_lookup_is_bounds_checked() {
    let frame = FrameRGBA {
        width: 1,
        height: 1,
        data: vec![1, 2, 3, 4],
        premultiplied: true,
    };
    assert_eq!(frame.pixel(0, 0), Some([1, 2, 3, 4]));
    assert_eq!(frame.pixel(1, 0), None);
}

#[test]
fn caption_keeps_source_dimensions() {
    let Some(font) = system_fallback_font() else {
        eprintln!("skipping: no system fonts installed");
        return;
    };

    for (w, h) in [(200, 200), (64, 32), (321, 97)] {
        let image = solid(w, h, [30, 60, 90, 255]);
        let frame = render_caption(&image, "caption", &font).unwrap();
        assert_eq!((frame.width, frame.height), (w, h));
        assert_eq!(frame.data.len(), (w * h * 4) as usize);
    }
}

#[test]
fn two_lines_are_centered_on_their_pitch_anchors() {
    let Some(font) = system_fallback_font() else {
        eprintln!("skipping: no system fonts installed");
        return;
    };

    let image = solid(200, 200, [0, 0, 0, 255]);
    let frame = render_caption(&image, "A\nB", &font).unwrap();

    // Line "A" is centered on y=70 and "B" on y=130 with a 60px pitch.
    let a = ink_box(&frame, 0..100).expect("line A missing");
    let b = ink_box(&frame, 100..200).expect("line B missing");
    assert!((a.center_y() - 70.0).abs() <= 8.0, "A ink {a:?}");
    assert!((b.center_y() - 130.0).abs() <= 8.0, "B ink {b:?}");
    assert!((a.center_x() - 100.0).abs() <= 8.0, "A ink {a:?}");
    assert!((b.center_x() - 100.0).abs() <= 8.0, "B ink {b:?}");

    // Far from the text the overlay over black stays black.
    assert_eq!(&frame.pixel(2, 2).unwrap()[..3], &[0, 0, 0]);
}

#[test]
fn multi_glyph_line_spreads_out_and_centers_on_width() {
    let Some(font) = system_fallback_font() else {
        eprintln!("skipping: no system fonts installed");
        return;
    };

    let image = solid(400, 200, [0, 0, 0, 255]);
    let one = ink_box(&render_caption(&image, "W", &font).unwrap(), 0..200).expect("W missing");
    let four =
        ink_box(&render_caption(&image, "WWWW", &font).unwrap(), 0..200).expect("WWWW missing");

    assert!(four.width() > 3.0 * one.width(), "W {one:?}, WWWW {four:?}");
    assert!((four.center_x() - 200.0).abs() <= 4.0, "WWWW {four:?}");
    assert!((one.center_x() - 200.0).abs() <= 4.0, "W {one:?}");
    assert!((four.center_y() - 100.0).abs() <= 8.0, "WWWW {four:?}");
}

#[test]
fn empty_caption_draws_no_glyphs() {
    let Some(font) = system_fallback_font() else {
        eprintln!("skipping: no system fonts installed");
        return;
    };

    let image = solid(40, 40, [0, 0, 0, 255]);
    let frame = render_caption(&image, "", &font).unwrap();
    assert_eq!(bright_rows(&frame, 0..40), 0);
}
