use std::path::Path;

use super::*;
use crate::assets::font::system_fallback_font;

struct Fixture {
    tmp: tempfile::TempDir,
    pipeline: CaptionPipeline,
}

impl Fixture {
    fn new(fonts: FontRegistry) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(tmp.path(), "http://localhost:5500").unwrap();
        let fetcher = ImageFetcher::new(tmp.path()).unwrap();
        Self {
            pipeline: CaptionPipeline::new(fetcher, Arc::new(fonts), store),
            tmp,
        }
    }

    fn with_system_font() -> Option<Self> {
        let font = system_fallback_font()?;
        Some(Self::new(FontRegistry::load_with_fallback(
            Path::new("/nonexistent/caption.ttf"),
            move || Some(font),
        )))
    }

    fn file_count(&self) -> usize {
        std::fs::read_dir(self.tmp.path()).unwrap().count()
    }

    fn put_png(&self, name: &str, w: u32, h: u32) {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([255, 255, 255, 255]));
        img.save(self.tmp.path().join(name)).unwrap();
    }
}

#[test]
fn validate_requires_both_fields() {
    assert!(CaptionRequest::new("http://x/a.png", "hi").validate().is_ok());
    for req in [
        CaptionRequest::default(),
        CaptionRequest {
            image_url: Some("http://x/a.png".into()),
            text: None,
        },
        CaptionRequest {
            image_url: None,
            text: Some("hi".into()),
        },
        CaptionRequest::new("", "hi"),
        CaptionRequest::new("   ", "hi"),
        CaptionRequest::new("http://x/a.png", ""),
    ] {
        assert!(matches!(
            req.validate().unwrap_err(),
            CaptionError::Validation(_)
        ));
    }
}

#[test]
fn request_deserializes_camel_case() {
    let req: CaptionRequest =
        serde_json::from_str(r#"{"imageUrl":"http://x/a.png","text":"A\nB"}"#).unwrap();
    assert_eq!(req.validate().unwrap(), ("http://x/a.png", "A\nB"));

    let partial: CaptionRequest = serde_json::from_str(r#"{"text":"only"}"#).unwrap();
    assert!(partial.validate().is_err());
}

#[tokio::test]
async fn missing_text_writes_nothing() {
    let fx = Fixture::new(FontRegistry::load_with_fallback(
        Path::new("/nonexistent/caption.ttf"),
        || None,
    ));
    let req = CaptionRequest {
        image_url: Some("http://localhost:5500/images/bg.png".into()),
        text: None,
    };
    let err = fx.pipeline.compose(&req).await.unwrap_err();
    assert!(matches!(err, CaptionError::Validation(_)));
    assert_eq!(fx.file_count(), 0);
}

#[tokio::test]
async fn unavailable_font_fails_compose() {
    let fx = Fixture::new(FontRegistry::load_with_fallback(
        Path::new("/nonexistent/caption.ttf"),
        || None,
    ));
    fx.put_png("bg.png", 8, 8);
    let req = CaptionRequest::new("http://localhost:5500/images/bg.png", "hi");
    let err = fx.pipeline.compose(&req).await.unwrap_err();
    assert!(matches!(err, CaptionError::FontUnavailable(_)));
    assert_eq!(fx.file_count(), 1);
}

#[tokio::test]
async fn compose_stored_image_keeps_dimensions() {
    let Some(fx) = Fixture::with_system_font() else {
        eprintln!("skipping: no system font available");
        return;
    };
    fx.put_png("bg.png", 320, 180);

    let req = CaptionRequest::new("http://localhost:5500/images/bg.png", "Hello\nWorld");
    let artifact = fx.pipeline.compose(&req).await.unwrap();

    assert!(artifact.file_name.starts_with("image_"));
    assert!(artifact.file_name.ends_with(".png"));
    assert_eq!(
        artifact.public_url,
        format!("http://localhost:5500/images/{}", artifact.file_name)
    );
    let out = image::open(&artifact.path).unwrap();
    assert_eq!((out.width(), out.height()), (320, 180));
    assert_eq!(artifact.size, std::fs::metadata(&artifact.path).unwrap().len());
}

#[tokio::test]
async fn back_to_back_composes_get_distinct_files() {
    let Some(fx) = Fixture::with_system_font() else {
        eprintln!("skipping: no system font available");
        return;
    };
    fx.put_png("bg.png", 64, 64);

    let req = CaptionRequest::new("http://localhost:5500/images/bg.png", "x");
    let a = fx.pipeline.compose(&req).await.unwrap();
    let b = fx.pipeline.compose(&req).await.unwrap();
    assert_ne!(a.file_name, b.file_name);
    assert!(a.path.exists() && b.path.exists());
    assert_eq!(fx.file_count(), 3);
}

#[tokio::test]
async fn unreachable_source_writes_nothing() {
    let Some(fx) = Fixture::with_system_font() else {
        eprintln!("skipping: no system font available");
        return;
    };
    let req = CaptionRequest::new("http://127.0.0.1:9/missing.png", "hi");
    let err = fx.pipeline.compose(&req).await.unwrap_err();
    assert_eq!(err.kind(), crate::foundation::error::ErrorKind::Processing);
    assert_eq!(fx.file_count(), 0);
}

#[tokio::test]
async fn undecodable_source_writes_nothing() {
    let Some(fx) = Fixture::with_system_font() else {
        eprintln!("skipping: no system font available");
        return;
    };
    std::fs::write(fx.tmp.path().join("junk.png"), b"not an image").unwrap();

    let req = CaptionRequest::new("http://localhost:5500/images/junk.png", "hi");
    let err = fx.pipeline.compose(&req).await.unwrap_err();
    assert!(matches!(err, CaptionError::Decode(_)));
    assert_eq!(fx.file_count(), 1);
}
