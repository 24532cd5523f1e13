//! Glyph resolution over an ordered chain of sources
//!
//! Each grapheme cluster resolves to exactly one [`GlyphRef`]. Sources are
//! tried in priority order (base font first, then emoji and symbol
//! fallbacks, then overlays) and the first one that knows the whole cluster
//! wins. Clusters nobody knows resolve to the reserved missing glyph.

use crate::bitmap::BitmapSource;
use crate::config::TextConfig;
use crate::rasterizer::{missing_glyph_advance, missing_glyph_box, GlyphBitmap};
use crate::registry::{FontRegistry, GenericFont};
use crate::segment::GraphemeCluster;
use crate::source::{GlyphSource, LineMetrics};
use crate::Result;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Source key of a chain with no sources
const UNSOURCED_KEY: u32 = 0;

static NEXT_SOURCE_KEY: AtomicU32 = AtomicU32::new(UNSOURCED_KEY + 1);

fn next_source_key() -> u32 {
    NEXT_SOURCE_KEY.fetch_add(1, Ordering::Relaxed)
}

/// Role of a source in the fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FallbackKind {
    /// Base text font
    Base,
    Emoji,
    Symbol,
    /// Embedded bitmap table
    Overlay,
}

/// A resolved glyph: which source, which glyph, and how far it advances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlyphRef {
    /// Index into the resolver's source chain
    pub source: u16,
    /// Process-unique key of the source, shared by clones of its resolver
    pub source_key: u32,
    pub glyph_id: u16,
    /// Advance in pixels at the size it was resolved for
    pub advance: u16,
}

impl GlyphRef {
    /// Source index reserved for the missing glyph
    pub const MISSING_SOURCE: u16 = u16::MAX;

    pub fn missing(advance: u16) -> Self {
        Self {
            source: Self::MISSING_SOURCE,
            source_key: UNSOURCED_KEY,
            glyph_id: 0,
            advance,
        }
    }

    pub fn is_missing(&self) -> bool {
        self.source == Self::MISSING_SOURCE
    }
}

/// Resolves clusters against an explicit priority list of glyph sources
#[derive(Clone, Default)]
pub struct GlyphResolver {
    entries: Vec<Entry>,
}

#[derive(Clone)]
struct Entry {
    kind: FallbackKind,
    key: u32,
    source: Arc<dyn GlyphSource>,
}

impl GlyphResolver {
    /// A resolver with no sources; everything resolves to the missing glyph
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source at the lowest priority
    pub fn push(&mut self, kind: FallbackKind, source: Arc<dyn GlyphSource>) {
        if self.entries.len() >= usize::from(GlyphRef::MISSING_SOURCE) {
            tracing::warn!("Glyph source chain is full, ignoring '{}'", source.name());
            return;
        }
        let key = next_source_key();
        tracing::debug!(
            "Glyph source {} ({:?}, key {}): {}",
            self.entries.len(),
            kind,
            key,
            source.name()
        );
        self.entries.push(Entry { kind, key, source });
    }

    pub fn with_source(mut self, kind: FallbackKind, source: Arc<dyn GlyphSource>) -> Self {
        self.push(kind, source);
        self
    }

    /// Build the chain described by `config`.
    ///
    /// Fonts that cannot be found are skipped with a warning. Bitmap tables
    /// are explicit assets, so a table that fails to load is an error.
    pub fn from_config(config: &TextConfig, registry: &mut FontRegistry) -> Result<Self> {
        let mut resolver = Self::new();
        registry.set_coverage_threshold(config.coverage_threshold);

        let chain = [
            (FallbackKind::Base, &config.fonts.base, GenericFont::SansSerif),
            (FallbackKind::Emoji, &config.fonts.emoji, GenericFont::Emoji),
            (FallbackKind::Symbol, &config.fonts.symbol, GenericFont::Symbol),
        ];
        for (kind, names, generic) in chain {
            let face = registry
                .load_first(names)
                .or_else(|| registry.load_generic(generic).ok());
            match face {
                Some(face) => resolver.push(kind, face),
                None => tracing::warn!("No {:?} font available, skipping", kind),
            }
        }

        for path in &config.fonts.bitmap_tables {
            let table = BitmapSource::load(path)?;
            resolver.push(FallbackKind::Overlay, Arc::new(table));
        }

        Ok(resolver)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The source at `index` in the chain
    pub fn source(&self, index: u16) -> Option<&Arc<dyn GlyphSource>> {
        self.entries.get(usize::from(index)).map(|entry| &entry.source)
    }

    pub fn kind(&self, index: u16) -> Option<FallbackKind> {
        self.entries.get(usize::from(index)).map(|entry| entry.kind)
    }

    /// Resolve `cluster` at `size_px`; first matching source wins
    pub fn resolve(&self, cluster: &GraphemeCluster, size_px: u16) -> GlyphRef {
        for (index, entry) in self.entries.iter().enumerate() {
            if let Some(glyph_id) = entry.source.glyph_for(cluster) {
                return GlyphRef {
                    source: index as u16,
                    source_key: entry.key,
                    glyph_id,
                    advance: entry.source.advance(glyph_id, size_px),
                };
            }
        }

        tracing::trace!("No glyph for {:?}, using missing glyph", cluster.chars());
        // The missing box takes its height from the base source
        GlyphRef {
            source_key: self.entries.first().map_or(UNSOURCED_KEY, |entry| entry.key),
            ..GlyphRef::missing(missing_glyph_advance(size_px))
        }
    }

    /// Line metrics of the base source
    pub fn line_metrics(&self, size_px: u16) -> LineMetrics {
        self.entries
            .first()
            .map(|entry| entry.source.line_metrics(size_px))
            .unwrap_or_else(|| LineMetrics::estimate(size_px))
    }

    /// Render `glyph` at `size_px`.
    ///
    /// Never fails: a source error is logged and drawn as the missing glyph.
    pub fn rasterize(&self, glyph: &GlyphRef, size_px: u16) -> GlyphBitmap {
        let Some(source) = self.source(glyph.source) else {
            return missing_glyph_box(size_px, self.line_metrics(size_px));
        };

        match source.rasterize(glyph.glyph_id, size_px) {
            Ok(bitmap) => bitmap,
            Err(e) => {
                tracing::warn!(
                    "Failed to rasterize glyph {} from '{}': {}",
                    glyph.glyph_id,
                    source.name(),
                    e
                );
                missing_glyph_box(size_px, self.line_metrics(size_px))
            }
        }
    }
}

impl std::fmt::Debug for GlyphResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(
                self.entries
                    .iter()
                    .map(|entry| (entry.kind, entry.source.name())),
            )
            .finish()
    }
}
