use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        CaptionError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(CaptionError::decode("x").to_string().contains("decode error:"));
    assert!(CaptionError::encode("x").to_string().contains("encode error:"));
    assert!(
        CaptionError::font_unavailable("x")
            .to_string()
            .contains("font unavailable:")
    );
    assert!(
        CaptionError::TooLarge { limit: 10 }
            .to_string()
            .contains("10 bytes")
    );
}

#[test]
fn kinds_split_client_input_from_processing() {
    assert_eq!(CaptionError::validation("x").kind(), ErrorKind::ClientInput);
    assert_eq!(
        CaptionError::RejectedMimeType("application/pdf".into()).kind(),
        ErrorKind::ClientInput
    );
    assert_eq!(CaptionError::TooLarge { limit: 1 }.kind(), ErrorKind::ClientInput);
    assert_eq!(CaptionError::NoFile.kind(), ErrorKind::ClientInput);

    assert_eq!(CaptionError::decode("x").kind(), ErrorKind::Processing);
    assert_eq!(CaptionError::encode("x").kind(), ErrorKind::Processing);
    assert_eq!(CaptionError::font_unavailable("x").kind(), ErrorKind::Processing);
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = CaptionError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert_eq!(err.kind(), ErrorKind::Processing);
}
