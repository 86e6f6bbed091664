//! Resolve a caller-provided `imageUrl` into encoded image bytes.

use std::path::PathBuf;

use base64::{Engine as _, engine::general_purpose};

use crate::foundation::error::{CaptionError, CaptionResult};

/// Upper bound on fetched source payloads.
pub const MAX_SOURCE_BYTES: usize = 50 * 1024 * 1024;

/// Parsed form of an image reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    /// Remote `http(s)` URL.
    Http(reqwest::Url),
    /// Inline `data:` URI payload.
    Data(Vec<u8>),
    /// File already held by this service's image directory.
    Stored(String),
    /// Local filesystem path (plain path or `file://` URL).
    File(PathBuf),
}

impl ImageSource {
    /// Parse `raw`. `images_prefix` is this service's public `<domain>/images/` prefix; URLs under
    /// it are served from storage instead of being fetched over HTTP.
    pub fn parse(raw: &str, images_prefix: &str) -> CaptionResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(CaptionError::validation("image source must be non-empty"));
        }

        if let Some(rest) = raw.strip_prefix("data:") {
            return parse_data_uri(rest).map(Self::Data);
        }

        if !images_prefix.is_empty()
            && let Some(name) = raw.strip_prefix(images_prefix)
        {
            let name = name.split(['?', '#']).next().unwrap_or_default();
            if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
                return Err(CaptionError::decode(format!(
                    "invalid stored image name '{name}'"
                )));
            }
            return Ok(Self::Stored(name.to_string()));
        }

        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            let url = reqwest::Url::parse(raw)
                .map_err(|e| CaptionError::decode(format!("invalid image url: {e}")))?;
            return Ok(Self::Http(url));
        }

        if lower.starts_with("file://") {
            let url = reqwest::Url::parse(raw)
                .map_err(|e| CaptionError::decode(format!("invalid file url: {e}")))?;
            let path = url
                .to_file_path()
                .map_err(|_| CaptionError::decode("file url does not name a local path"))?;
            return Ok(Self::File(path));
        }

        Ok(Self::File(PathBuf::from(raw)))
    }
}

fn parse_data_uri(rest: &str) -> CaptionResult<Vec<u8>> {
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| CaptionError::decode("data uri is missing ','"))?;

    if meta
        .split(';')
        .any(|part| part.trim().eq_ignore_ascii_case("base64"))
    {
        let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        general_purpose::STANDARD
            .decode(cleaned.as_bytes())
            .map_err(|e| CaptionError::decode(format!("invalid base64 in data uri: {e}")))
    } else {
        Ok(payload.as_bytes().to_vec())
    }
}

/// Fetches the bytes behind an [`ImageSource`].
///
/// There is no timeout and no retry: a hung remote holds the request open.
#[derive(Clone, Debug)]
pub struct ImageFetcher {
    client: reqwest::Client,
    images_dir: PathBuf,
    allow_local_files: bool,
}

impl ImageFetcher {
    pub fn new(images_dir: impl Into<PathBuf>) -> CaptionResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| CaptionError::Other(anyhow::Error::new(e).context("build http client")))?;
        Ok(Self {
            client,
            images_dir: images_dir.into(),
            allow_local_files: false,
        })
    }

    /// Allow [`ImageSource::File`] sources. Off by default: it lets callers read any file the
    /// process can open.
    pub fn with_local_files(mut self, allow: bool) -> Self {
        self.allow_local_files = allow;
        self
    }

    #[tracing::instrument(skip_all, level = "debug")]
    pub async fn fetch(&self, source: &ImageSource) -> CaptionResult<Vec<u8>> {
        let bytes = match source {
            ImageSource::Data(bytes) => bytes.clone(),
            ImageSource::Http(url) => self.fetch_http(url).await?,
            ImageSource::Stored(name) => read_file(&self.images_dir.join(name)).await?,
            ImageSource::File(path) if self.allow_local_files => read_file(path).await?,
            ImageSource::File(path) => {
                return Err(CaptionError::decode(format!(
                    "local file sources are disabled ('{}')",
                    path.display()
                )));
            }
        };

        if bytes.len() > MAX_SOURCE_BYTES {
            return Err(CaptionError::decode(format!(
                "image source is {} bytes (max {MAX_SOURCE_BYTES})",
                bytes.len()
            )));
        }
        Ok(bytes)
    }

    async fn fetch_http(&self, url: &reqwest::Url) -> CaptionResult<Vec<u8>> {
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| CaptionError::decode(format!("fetch '{url}': {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CaptionError::decode(format!(
                "fetch '{url}': http status {status}"
            )));
        }
        if let Some(len) = resp.content_length()
            && len > MAX_SOURCE_BYTES as u64
        {
            return Err(CaptionError::decode(format!(
                "fetch '{url}': body is {len} bytes (max {MAX_SOURCE_BYTES})"
            )));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| CaptionError::decode(format!("read body of '{url}': {e}")))?;
        Ok(body.to_vec())
    }
}

async fn read_file(path: &std::path::Path) -> CaptionResult<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| CaptionError::decode(format!("read image '{}': {e}", path.display())))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
