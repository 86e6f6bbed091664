use std::{
    fs::File,
    io::{BufWriter, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::{
    encode::png::write_png,
    foundation::error::{CaptionError, CaptionResult},
    render::compositor::FrameRGBA,
};

/// Highest numeric suffix tried when a timestamped name is already taken.
const MAX_NAME_SUFFIX: u32 = 10_000;

/// A persisted output file and the URL it is served under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedArtifact {
    pub file_name: String,
    pub path: PathBuf,
    /// Encoded size in bytes.
    pub size: u64,
    pub public_url: String,
}

/// The image directory plus the public domain its files are served from.
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    dir: PathBuf,
    domain: String,
}

impl ArtifactStore {
    /// Open (and create if needed) the storage directory.
    pub fn open(dir: impl Into<PathBuf>, domain: impl Into<String>) -> CaptionResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create image directory '{}'", dir.display()))?;
        let domain = domain.into().trim_end_matches('/').to_string();
        Ok(Self { dir, domain })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<domain>/images/`, the prefix of every public artifact URL.
    pub fn images_prefix(&self) -> String {
        format!("{}/images/", self.domain)
    }

    pub fn public_url(&self, file_name: &str) -> String {
        format!("{}{file_name}", self.images_prefix())
    }

    /// Create `<stem><ext>` exclusively, or `<stem>-<n><ext>` if that name is taken.
    ///
    /// `ext` includes its leading dot (or is empty).
    pub(crate) fn create_unique(
        &self,
        stem: &str,
        ext: &str,
    ) -> std::io::Result<(String, PathBuf, File)> {
        for n in 0..=MAX_NAME_SUFFIX {
            let file_name = if n == 0 {
                format!("{stem}{ext}")
            } else {
                format!("{stem}-{n}{ext}")
            };
            let path = self.dir.join(&file_name);
            match File::options().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((file_name, path, file)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e),
            }
        }
        Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("no free file name for '{stem}{ext}'"),
        ))
    }

    /// Encode `frame` into a new `image_<unixMillis>.png` artifact.
    ///
    /// Success means the file is fully written and synced. On failure the partial file is removed.
    pub fn write_png(&self, frame: &FrameRGBA) -> CaptionResult<RenderedArtifact> {
        let stem = format!("image_{}", unix_millis());
        let (file_name, path, file) = self
            .create_unique(&stem, ".png")
            .map_err(|e| CaptionError::encode(format!("create artifact file: {e}")))?;

        match encode_into(frame, file) {
            Ok(size) => {
                let public_url = self.public_url(&file_name);
                tracing::info!(%file_name, size, "artifact written");
                Ok(RenderedArtifact {
                    file_name,
                    path,
                    size,
                    public_url,
                })
            }
            Err(e) => {
                if let Err(rm) = std::fs::remove_file(&path) {
                    tracing::warn!(path = %path.display(), error = %rm, "could not remove partial artifact");
                }
                Err(e)
            }
        }
    }
}

fn encode_into(frame: &FrameRGBA, file: File) -> CaptionResult<u64> {
    let mut writer = BufWriter::new(file);
    write_png(frame, &mut writer)?;
    writer
        .flush()
        .map_err(|e| CaptionError::encode(format!("flush artifact: {e}")))?;
    let file = writer
        .into_inner()
        .map_err(|e| CaptionError::encode(format!("flush artifact: {}", e.error())))?;
    file.sync_all()
        .map_err(|e| CaptionError::encode(format!("sync artifact: {e}")))?;
    let size = file
        .metadata()
        .map_err(|e| CaptionError::encode(format!("stat artifact: {e}")))?
        .len();
    Ok(size)
}

/// Milliseconds since the Unix epoch, used to disambiguate stored file names.
pub(crate) fn unix_millis() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "../../tests/unit/storage/artifacts.rs"]
mod tests;
