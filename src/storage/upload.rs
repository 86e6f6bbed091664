//! Upload policy and streamed upload persistence.

use std::path::PathBuf;

use tokio::io::AsyncWriteExt as _;

use crate::{
    foundation::error::{CaptionError, CaptionResult},
    storage::artifacts::{ArtifactStore, unix_millis},
};

/// MIME types accepted by `/upload`.
pub const ALLOWED_MIME_TYPES: [&str; 5] = [
    "image/png",
    "image/jpeg",
    "image/jpg",
    "image/gif",
    "image/webp",
];

/// Upload size ceiling: 10 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct UploadPolicy {
    pub allowed_mime_types: Vec<String>,
    pub max_bytes: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            allowed_mime_types: ALLOWED_MIME_TYPES.iter().map(|m| m.to_string()).collect(),
            max_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

impl UploadPolicy {
    /// Normalize `mime` (lowercase, parameters dropped) and check it against the allow-list.
    pub fn check_mime(&self, mime: Option<&str>) -> CaptionResult<String> {
        let raw = mime.unwrap_or_default();
        let essence = raw
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if self.allowed_mime_types.iter().any(|m| *m == essence) {
            Ok(essence)
        } else {
            Err(CaptionError::RejectedMimeType(raw.to_string()))
        }
    }

    pub fn check_size(&self, size: u64) -> CaptionResult<()> {
        if size > self.max_bytes {
            return Err(CaptionError::TooLarge {
                limit: self.max_bytes,
            });
        }
        Ok(())
    }
}

/// A stored upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedFile {
    pub stored_name: String,
    pub mime_type: String,
    pub size: u64,
    pub public_url: String,
}

/// Split an original client file name into a safe base and its extension.
///
/// Directory components are dropped. Characters outside `[A-Za-z0-9._-]` become `_`. A missing
/// extension becomes `.bin`, an empty base becomes `file`.
pub fn sanitize_file_name(original: &str) -> (String, String) {
    let name = original.rsplit(['/', '\\']).next().unwrap_or_default();
    let (base, ext) = match name.rfind('.') {
        Some(i) if i > 0 => (&name[..i], &name[i + 1..]),
        _ => (name, ""),
    };

    let ext = if ext.is_empty() {
        ".bin".to_string()
    } else {
        format!(".{}", sanitize_component(ext))
    };
    let base = match sanitize_component(base) {
        b if b.is_empty() => "file".to_string(),
        b => b,
    };
    (base, ext)
}

fn sanitize_component(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// An upload being streamed to disk. Call [`PendingUpload::finish`] or [`PendingUpload::abort`].
#[derive(Debug)]
pub struct PendingUpload {
    file: tokio::fs::File,
    path: PathBuf,
    stored_name: String,
    mime_type: String,
    public_url: String,
    written: u64,
    limit: u64,
}

impl PendingUpload {
    pub fn stored_name(&self) -> &str {
        &self.stored_name
    }

    /// Append a chunk, failing with [`CaptionError::TooLarge`] before the limit is crossed.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> CaptionResult<()> {
        let next = self.written + chunk.len() as u64;
        if next > self.limit {
            return Err(CaptionError::TooLarge { limit: self.limit });
        }
        self.file
            .write_all(chunk)
            .await
            .map_err(|e| anyhow::Error::new(e).context("write upload chunk"))?;
        self.written = next;
        Ok(())
    }

    /// Flush and sync the file. On failure the partial file is removed.
    pub async fn finish(mut self) -> CaptionResult<UploadedFile> {
        if let Err(e) = self.sync().await {
            self.abort().await;
            return Err(e);
        }

        tracing::info!(stored_name = %self.stored_name, size = self.written, "upload stored");
        Ok(UploadedFile {
            stored_name: self.stored_name,
            mime_type: self.mime_type,
            size: self.written,
            public_url: self.public_url,
        })
    }

    async fn sync(&mut self) -> CaptionResult<()> {
        self.file
            .flush()
            .await
            .map_err(|e| anyhow::Error::new(e).context("flush upload"))?;
        self.file
            .sync_all()
            .await
            .map_err(|e| anyhow::Error::new(e).context("sync upload"))?;
        Ok(())
    }

    /// Drop the partial file.
    pub async fn abort(self) {
        let Self { file, path, .. } = self;
        drop(file);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::warn!(path = %path.display(), error = %e, "could not remove partial upload");
        }
    }
}

impl ArtifactStore {
    /// Validate the MIME type and open a uniquely named file for a streamed upload.
    ///
    /// Nothing touches storage when the MIME type is rejected.
    pub fn begin_upload(
        &self,
        policy: &UploadPolicy,
        original_name: &str,
        mime: Option<&str>,
    ) -> CaptionResult<PendingUpload> {
        let mime_type = policy.check_mime(mime)?;
        let (base, ext) = sanitize_file_name(original_name);
        let stem = format!("{base}_{}", unix_millis());

        let (stored_name, path, file) = self
            .create_unique(&stem, &ext)
            .map_err(|e| anyhow::Error::new(e).context("create upload file"))?;
        let public_url = self.public_url(&stored_name);

        Ok(PendingUpload {
            file: tokio::fs::File::from_std(file),
            path,
            stored_name,
            mime_type,
            public_url,
            written: 0,
            limit: policy.max_bytes,
        })
    }

    /// Store a complete in-memory upload.
    #[tracing::instrument(skip(self, policy, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        policy: &UploadPolicy,
        bytes: &[u8],
        original_name: &str,
        mime: Option<&str>,
    ) -> CaptionResult<UploadedFile> {
        policy.check_mime(mime)?;
        policy.check_size(bytes.len() as u64)?;

        let mut pending = self.begin_upload(policy, original_name, mime)?;
        match pending.write_chunk(bytes).await {
            Ok(()) => pending.finish().await,
            Err(e) => {
                pending.abort().await;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/storage/upload.rs"]
mod tests;
