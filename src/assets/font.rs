//! Caption font loading.
//!
//! The configured font is loaded once at startup. When it cannot be used a system face is picked
//! instead, and the outcome is kept as a [`FontHealth`] value that `/health` reports, so a fallback
//! is never silent.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::foundation::error::{CaptionError, CaptionResult};

/// A parsed font face, ready for both the text shaper and the rasterizer.
///
/// The shaper blob and the raster font data are built once at load time and shared by every
/// caption render.
pub struct LoadedFont {
    /// Primary family name detected from the font data.
    pub family: String,
    /// Face index inside the font data (non-zero for collections).
    pub index: u32,
    blob: parley::fontique::Blob<u8>,
    font_data: vello_cpu::peniko::FontData,
}

impl std::fmt::Debug for LoadedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedFont")
            .field("family", &self.family)
            .field("bytes_len", &self.bytes().len())
            .field("index", &self.index)
            .finish()
    }
}

impl LoadedFont {
    /// Parse `bytes` as a font and read its family name.
    pub fn from_bytes(bytes: Vec<u8>, index: u32) -> CaptionResult<Self> {
        let font_data = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(bytes.clone()),
            index,
        );
        let blob = parley::fontique::Blob::from(bytes);
        let family = register_blob(&mut parley::FontContext::default(), &blob)?;
        Ok(Self {
            family,
            index,
            blob,
            font_data,
        })
    }

    /// Original font file bytes (possibly a collection).
    pub fn bytes(&self) -> &[u8] {
        self.blob.data()
    }

    /// Font data for the rasterizer's glyph runs.
    pub(crate) fn font_data(&self) -> &vello_cpu::peniko::FontData {
        &self.font_data
    }

    /// Make this face resolvable by [`LoadedFont::family`] in `font_ctx`.
    pub(crate) fn register(&self, font_ctx: &mut parley::FontContext) -> CaptionResult<()> {
        register_blob(font_ctx, &self.blob).map(|_| ())
    }
}

/// Outcome of font loading, as reported by `/health`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FontHealth {
    /// The configured font file loaded.
    Custom { family: String, path: PathBuf },
    /// The configured font failed; a system face is used instead.
    Fallback { family: String, reason: String },
    /// No usable face at all; caption rendering is disabled.
    Unavailable { reason: String },
}

impl FontHealth {
    /// `true` only when the configured font is in use.
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Custom { .. })
    }
}

/// Immutable font state shared by all requests.
#[derive(Debug)]
pub struct FontRegistry {
    health: FontHealth,
    font: Option<Arc<LoadedFont>>,
}

impl FontRegistry {
    /// Load the caption font from `path`, falling back to a system sans-serif face.
    pub fn load(path: &Path) -> Self {
        Self::load_with_fallback(path, system_fallback_font)
    }

    /// Like [`FontRegistry::load`] with an explicit fallback provider.
    pub fn load_with_fallback(
        path: &Path,
        fallback: impl FnOnce() -> Option<LoadedFont>,
    ) -> Self {
        let reason = match load_font_file(path) {
            Ok(font) => {
                tracing::info!(family = %font.family, path = %path.display(), "caption font loaded");
                return Self {
                    health: FontHealth::Custom {
                        family: font.family.clone(),
                        path: path.to_path_buf(),
                    },
                    font: Some(Arc::new(font)),
                };
            }
            Err(e) => format!("{e:#}"),
        };

        tracing::warn!(path = %path.display(), %reason, "could not load caption font, trying system fallback");
        match fallback() {
            Some(font) => {
                tracing::warn!(family = %font.family, "using system fallback font for captions");
                Self {
                    health: FontHealth::Fallback {
                        family: font.family.clone(),
                        reason,
                    },
                    font: Some(Arc::new(font)),
                }
            }
            None => {
                tracing::error!("no caption font available; /generate will fail until restart");
                Self {
                    health: FontHealth::Unavailable { reason },
                    font: None,
                }
            }
        }
    }

    pub fn health(&self) -> &FontHealth {
        &self.health
    }

    /// The face to render captions with.
    pub fn font(&self) -> CaptionResult<Arc<LoadedFont>> {
        self.font.clone().ok_or_else(|| match &self.health {
            FontHealth::Unavailable { reason } => CaptionError::font_unavailable(reason.clone()),
            _ => CaptionError::font_unavailable("no font loaded"),
        })
    }
}

fn load_font_file(path: &Path) -> anyhow::Result<LoadedFont> {
    use anyhow::Context as _;

    let bytes =
        std::fs::read(path).with_context(|| format!("read font file '{}'", path.display()))?;
    LoadedFont::from_bytes(bytes, 0).map_err(anyhow::Error::from)
}

/// Concrete sans-serif families tried before fontdb's generic `SansSerif` (which only maps to
/// FreeSans).
const SANS_FAMILIES: &[&str] = &[
    "DejaVu Sans",
    "Liberation Sans",
    "Noto Sans",
    "Arial",
    "Helvetica",
    "Roboto",
    "Open Sans",
];

const SERIF_FAMILIES: &[&str] = &[
    "DejaVu Serif",
    "Liberation Serif",
    "Noto Serif",
    "Times New Roman",
];

/// Family name fragments of faces that cannot render ordinary caption text.
const SYMBOL_MARKERS: &[&str] = &["math", "symbol", "emoji", "dingbat", "wingding", "icon"];

/// Pick a system face: sans-serif first, then serif, then any text face installed.
pub fn system_fallback_font() -> Option<LoadedFont> {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();

    for id in fallback_candidates(&db) {
        let Some((bytes, index)) = db.with_face_data(id, |data, index| (data.to_vec(), index))
        else {
            continue;
        };
        if let Ok(font) = LoadedFont::from_bytes(bytes, index) {
            return Some(font);
        }
    }
    None
}

/// Face ids in preference order, without duplicates.
pub(crate) fn fallback_candidates(db: &usvg::fontdb::Database) -> Vec<usvg::fontdb::ID> {
    use usvg::fontdb::{Family, Query, Stretch, Style, Weight};

    let regular = |family| {
        db.query(&Query {
            families: &[family],
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        })
    };

    let named = |names: &'static [&'static str]| names.iter().map(|&n| Family::Name(n));
    let preferred = named(SANS_FAMILIES)
        .chain([Family::SansSerif])
        .chain(named(SERIF_FAMILIES))
        .chain([Family::Serif]);

    let mut ids: Vec<usvg::fontdb::ID> = preferred.filter_map(regular).collect();

    let text_faces = db
        .faces()
        .filter(|f| !f.families.iter().any(|(name, _)| is_symbol_family(name)));
    let (upright, other): (Vec<_>, Vec<_>) = text_faces.partition(|f| f.style == Style::Normal);
    ids.extend(upright.into_iter().chain(other).map(|f| f.id));
    ids.extend(db.faces().map(|f| f.id));

    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(*id));
    ids
}

/// Whether `family` names a symbol, math or emoji face.
pub(crate) fn is_symbol_family(family: &str) -> bool {
    let lower = family.to_ascii_lowercase();
    SYMBOL_MARKERS.iter().any(|m| lower.contains(m))
}

/// Register `blob` with `font_ctx` and return the family name of its first face.
fn register_blob(
    font_ctx: &mut parley::FontContext,
    blob: &parley::fontique::Blob<u8>,
) -> CaptionResult<String> {
    let families = font_ctx.collection.register_fonts(blob.clone(), None);
    let family_id = families
        .first()
        .map(|(id, _)| *id)
        .ok_or_else(|| CaptionError::font_unavailable("no font families registered from font bytes"))?;

    font_ctx
        .collection
        .family_name(family_id)
        .map(str::to_string)
        .ok_or_else(|| CaptionError::font_unavailable("registered font family has no name"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/font.rs"]
mod tests;
