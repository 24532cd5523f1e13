//! Unicode-aware text rendering for Glint surfaces
//!
//! This crate provides:
//! - UTF-16 decoding with surrogate recovery
//! - Grapheme segmentation for emoji flag and keycap sequences
//! - Glyph resolution over an ordered chain of font and bitmap sources
//! - A bounded, thread-safe glyph bitmap cache
//! - Single-line layout with anchor alignment
//! - Clipped blitting into a [`glint_paint::PixelBuffer`]
//!
//! # Shared Glyph Cache
//!
//! Rasterized glyphs are worth sharing between every surface in the process.
//! Renderers built with [`TextRenderer::new`] use one global cache:
//!
//! ```ignore
//! use glint_text::{global_glyph_cache, GlyphResolver, TextRenderer};
//!
//! let renderer = TextRenderer::with_cache(resolver, global_glyph_cache());
//! ```

pub mod bitmap;
pub mod blit;
pub mod cache;
pub mod config;
pub mod decode;
pub mod font;
pub mod layout;
pub mod rasterizer;
pub mod registry;
pub mod renderer;
pub mod resolver;
pub mod segment;
pub mod source;

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

pub use bitmap::{BitmapGlyph, BitmapSource};
pub use blit::blit;
pub use cache::{CacheStats, GlyphCache, GlyphKey};
pub use config::{CacheConfig, FontsConfig, TextConfig};
pub use decode::{decode, encode};
pub use font::FontSource;
pub use layout::{
    Anchor, ClusterGlyph, LayoutOptions, LayoutRun, LineLayout, PositionedGlyph, TextAlignment,
    TextAnchor,
};
pub use rasterizer::{GlyphBitmap, GlyphRasterizer};
pub use registry::{FontRegistry, GenericFont};
pub use renderer::TextRenderer;
pub use resolver::{FallbackKind, GlyphRef, GlyphResolver};
pub use segment::{segment, CodeRange, GraphemeCluster, GraphemeSegmenter, JoinRule, RuleTable};
pub use source::{GlyphSource, LineMetrics};

/// Global shared glyph cache singleton.
static GLOBAL_GLYPH_CACHE: OnceLock<Arc<GlyphCache>> = OnceLock::new();

/// Get the global shared glyph cache.
///
/// Created on first use with [`cache::DEFAULT_CAPACITY`] entries.
pub fn global_glyph_cache() -> Arc<GlyphCache> {
    Arc::clone(
        GLOBAL_GLYPH_CACHE.get_or_init(|| Arc::new(GlyphCache::new(cache::DEFAULT_CAPACITY))),
    )
}

use thiserror::Error;

/// Text engine errors
///
/// Only setup (loading fonts, tables and configuration) can fail. Drawing
/// never returns an error.
#[derive(Error, Debug)]
pub enum TextError {
    #[error("Failed to load font: {0}")]
    FontLoad(String),

    #[error("Failed to parse font: {0}")]
    FontParse(String),

    #[error("Invalid font data")]
    InvalidFontData,

    #[error("Invalid bitmap table: {0}")]
    BitmapTable(String),

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, TextError>;
