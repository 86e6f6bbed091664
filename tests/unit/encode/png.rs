use super::*;

struct FailingWriter;

impl Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::other("disk full"))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn png_output_decodes_with_same_size_and_straight_alpha() {
    let frame = FrameRGBA {
        width: 3,
        height: 2,
        data: [[64u8, 0, 0, 128]; 6].concat(),
        premultiplied: true,
    };

    let mut buf = Vec::new();
    write_png(&frame, &mut buf).unwrap();
    assert_eq!(&buf[..8], b"\x89PNG\r\n\x1a\n");

    let decoded = image::load_from_memory(&buf).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (3, 2));
    let px = decoded.get_pixel(1, 1).0;
    assert_eq!(px[3], 128);
    assert!(px[0].abs_diff(128) <= 1, "{px:?}");
}

#[test]
fn length_mismatch_is_an_encode_error() {
    let frame = FrameRGBA {
        width: 2,
        height: 2,
        data: vec![0; 3],
        premultiplied: false,
    };
    assert!(matches!(
        write_png(&frame, Vec::new()).unwrap_err(),
        CaptionError::Encode(_)
    ));
}

#[test]
fn writer_failures_surface_as_encode_errors() {
    let frame = FrameRGBA {
        width: 8,
        height: 8,
        data: vec![255; 8 * 8 * 4],
        premultiplied: true,
    };
    assert!(matches!(
        write_png(&frame, FailingWriter).unwrap_err(),
        CaptionError::Encode(_)
    ));
}
