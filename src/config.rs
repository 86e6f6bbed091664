//! Service configuration: CLI flags over environment variables over defaults.

use std::{net::SocketAddr, path::PathBuf};

use crate::foundation::error::{CaptionError, CaptionResult};

pub const DEFAULT_FONT_PATH: &str = "fonts/TiroDevanagariMarathi-Italic.ttf";
pub const DEFAULT_IMAGE_DIR: &str = "public/images";
pub const DEFAULT_PUBLIC_DIR: &str = "public";
pub const DEFAULT_DOMAIN: &str = "http://localhost:5500";
pub const DEFAULT_PORT: u16 = 5500;

/// Resolved runtime configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceConfig {
    pub font_path: PathBuf,
    /// Storage directory for uploads and rendered artifacts, served under `/images`.
    pub image_dir: PathBuf,
    /// Static asset directory served at `/`.
    pub public_dir: PathBuf,
    /// Public base URL used to build artifact URLs.
    pub domain: String,
    pub port: u16,
    /// Accept `file://` and plain-path image sources.
    pub allow_local_files: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            font_path: DEFAULT_FONT_PATH.into(),
            image_dir: DEFAULT_IMAGE_DIR.into(),
            public_dir: DEFAULT_PUBLIC_DIR.into(),
            domain: DEFAULT_DOMAIN.to_string(),
            port: DEFAULT_PORT,
            allow_local_files: false,
        }
    }
}

/// Command-line overrides. Unset flags leave the environment/default value in place.
#[derive(clap::Args, Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Caption font file (TTF/OTF).
    #[arg(long)]
    pub font_path: Option<PathBuf>,

    /// Directory for uploads and generated images.
    #[arg(long)]
    pub image_dir: Option<PathBuf>,

    /// Directory of static assets served at `/`.
    #[arg(long)]
    pub public_dir: Option<PathBuf>,

    /// Public base URL, e.g. `https://captions.example.com`.
    #[arg(long)]
    pub domain: Option<String>,

    /// TCP port to listen on.
    #[arg(long)]
    pub port: Option<u16>,

    /// Accept local filesystem paths as `imageUrl`.
    #[arg(long)]
    pub allow_local_files: bool,
}

impl ServiceConfig {
    /// Read `FONT_PATH`, `IMAGE_PATH`, `PUBLIC_PATH`, `DOMAIN`, `PORT` and `ALLOW_LOCAL_FILES`.
    pub fn from_env() -> CaptionResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`ServiceConfig::from_env`] with an explicit variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CaptionResult<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut cfg = Self::default();

        if let Some(v) = get("FONT_PATH") {
            cfg.font_path = v.into();
        }
        if let Some(v) = get("IMAGE_PATH") {
            cfg.image_dir = v.into();
        }
        if let Some(v) = get("PUBLIC_PATH") {
            cfg.public_dir = v.into();
        }
        if let Some(v) = get("DOMAIN") {
            cfg.domain = v.trim().to_string();
        }
        if let Some(v) = get("PORT") {
            cfg.port = v
                .trim()
                .parse()
                .map_err(|_| CaptionError::validation(format!("invalid PORT '{v}'")))?;
        }
        if let Some(v) = get("ALLOW_LOCAL_FILES") {
            cfg.allow_local_files = parse_flag("ALLOW_LOCAL_FILES", &v)?;
        }
        Ok(cfg)
    }

    pub fn with_overrides(mut self, o: ConfigOverrides) -> Self {
        if let Some(v) = o.font_path {
            self.font_path = v;
        }
        if let Some(v) = o.image_dir {
            self.image_dir = v;
        }
        if let Some(v) = o.public_dir {
            self.public_dir = v;
        }
        if let Some(v) = o.domain {
            self.domain = v;
        }
        if let Some(v) = o.port {
            self.port = v;
        }
        self.allow_local_files |= o.allow_local_files;
        self
    }

    /// Listen on all interfaces.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

fn parse_flag(key: &str, v: &str) -> CaptionResult<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(CaptionError::validation(format!("invalid {key} '{v}'"))),
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
