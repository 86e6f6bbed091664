/// Convenience result type used across the crate.
pub type CaptionResult<T> = Result<T, CaptionError>;

/// Top-level error taxonomy used by compositor, storage and upload APIs.
#[derive(thiserror::Error, Debug)]
pub enum CaptionError {
    /// Missing or malformed caller-provided data.
    #[error("validation error: {0}")]
    Validation(String),

    /// The image source could not be fetched or decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// PNG encoding or artifact persistence failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// No caption font face could be loaded at startup.
    #[error("font unavailable: {0}")]
    FontUnavailable(String),

    /// Upload MIME type is outside the allow-list.
    #[error("rejected mime type: {0}")]
    RejectedMimeType(String),

    /// Upload exceeded the configured size ceiling.
    #[error("file too large: exceeds limit of {limit} bytes")]
    TooLarge {
        /// Size ceiling in bytes.
        limit: u64,
    },

    /// Multipart body carried no `file` field.
    #[error("no file uploaded")]
    NoFile,

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Coarse classification used to pick an HTTP status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller sent something we refuse to process (400).
    ClientInput,
    /// The service failed while processing a valid request (500).
    Processing,
}

impl CaptionError {
    /// Build a [`CaptionError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`CaptionError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`CaptionError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`CaptionError::FontUnavailable`] value.
    pub fn font_unavailable(msg: impl Into<String>) -> Self {
        Self::FontUnavailable(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::RejectedMimeType(_) | Self::TooLarge { .. } | Self::NoFile => {
                ErrorKind::ClientInput
            }
            Self::Decode(_) | Self::Encode(_) | Self::FontUnavailable(_) | Self::Other(_) => {
                ErrorKind::Processing
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
