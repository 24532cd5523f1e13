//! Text renderer
//!
//! High-level entry point that runs a draw call end to end: UTF-16 decoding,
//! grapheme segmentation, glyph resolution, cached rasterization, layout and
//! blitting into the caller's [`DrawState`].
//!
//! Drawing never fails. Malformed text, unknown clusters and glyphs outside
//! the clip all degrade to something visible (or nothing) instead of an
//! error.

use crate::blit::blit;
use crate::cache::GlyphCache;
use crate::config::TextConfig;
use crate::decode::{decode, encode};
use crate::layout::{Anchor, ClusterGlyph, LayoutOptions, LayoutRun, LineLayout};
use crate::registry::FontRegistry;
use crate::resolver::{GlyphRef, GlyphResolver};
use crate::segment::GraphemeSegmenter;
use crate::Result;
use glint_paint::{DrawState, Point};
use std::sync::Arc;

/// Draws UTF-16 text through a resolver chain and a shared glyph cache
pub struct TextRenderer {
    resolver: GlyphResolver,
    cache: Arc<GlyphCache>,
    segmenter: GraphemeSegmenter,
    layout: LineLayout,
    font_size_px: u16,
}

impl TextRenderer {
    /// Create a renderer over `resolver` that uses the global glyph cache
    pub fn new(resolver: GlyphResolver) -> Self {
        Self::with_cache(resolver, crate::global_glyph_cache())
    }

    /// Create a renderer with its own (or a shared) cache.
    ///
    /// Any renderers may share a cache: keys name the source itself, not its
    /// position in the chain.
    pub fn with_cache(resolver: GlyphResolver, cache: Arc<GlyphCache>) -> Self {
        Self {
            resolver,
            cache,
            segmenter: GraphemeSegmenter::default(),
            layout: LineLayout::new(),
            font_size_px: TextConfig::default().font_size_px,
        }
    }

    /// Build fonts, bitmap tables, cache and segmentation rules from `config`
    pub fn from_config(config: &TextConfig) -> Result<Self> {
        let mut registry = FontRegistry::from_config(&config.fonts);
        let resolver = GlyphResolver::from_config(config, &mut registry)?;
        let mut renderer =
            Self::with_cache(resolver, Arc::new(GlyphCache::new(config.cache.capacity)));
        renderer.segmenter = GraphemeSegmenter::new(config.segmentation.clone());
        renderer.set_font_size(config.font_size_px);
        Ok(renderer)
    }

    pub fn with_segmenter(mut self, segmenter: GraphemeSegmenter) -> Self {
        self.segmenter = segmenter;
        self
    }

    pub fn font_size(&self) -> u16 {
        self.font_size_px
    }

    /// Set the pixel size for subsequent draws (at least 1)
    pub fn set_font_size(&mut self, size_px: u16) {
        self.font_size_px = size_px.max(1);
    }

    pub fn resolver(&self) -> &GlyphResolver {
        &self.resolver
    }

    pub fn cache(&self) -> &Arc<GlyphCache> {
        &self.cache
    }

    fn resolve(&self, units: &[u16]) -> Vec<(GlyphRef, std::ops::Range<usize>)> {
        let scalars = decode(units);
        self.segmenter
            .segment(&scalars)
            .iter()
            .map(|cluster| {
                (
                    self.resolver.resolve(cluster, self.font_size_px),
                    cluster.units(),
                )
            })
            .collect()
    }

    /// Resolve, rasterize and lay out `units` without painting
    pub fn prepare(&self, units: &[u16], x: i32, y: i32, options: &LayoutOptions) -> LayoutRun {
        let size_px = self.font_size_px;
        let glyphs = self
            .resolve(units)
            .into_iter()
            .map(|(glyph, units)| ClusterGlyph {
                bitmap: Some(self.cache.get_or_render(&self.resolver, &glyph, size_px)),
                glyph,
                units,
            })
            .collect();

        self.layout.layout(
            glyphs,
            Point::new(x, y),
            options,
            self.resolver.line_metrics(size_px),
        )
    }

    /// Draw `units` at (`x`, `y`) in the state's color, clip and buffer
    pub fn draw_text(
        &self,
        units: &[u16],
        x: i32,
        y: i32,
        anchor: Anchor,
        state: &mut DrawState<'_>,
    ) -> LayoutRun {
        let run = self.prepare(units, x, y, &LayoutOptions::with_anchor(anchor));
        blit(&run, state);
        tracing::trace!(
            "Drew {} clusters ({} units) at ({}, {})",
            run.glyph_count(),
            units.len(),
            x,
            y
        );
        run
    }

    /// [`draw_text`](Self::draw_text) for UTF-8 input
    pub fn draw_str(
        &self,
        text: &str,
        x: i32,
        y: i32,
        anchor: Anchor,
        state: &mut DrawState<'_>,
    ) -> LayoutRun {
        self.draw_text(&encode(text), x, y, anchor, state)
    }

    /// Width of `units` at the current size, without rasterizing
    pub fn measure(&self, units: &[u16]) -> i32 {
        let glyphs: Vec<GlyphRef> = self.resolve(units).into_iter().map(|(g, _)| g).collect();
        self.layout.measure(&glyphs, 0)
    }

    pub fn measure_str(&self, text: &str) -> i32 {
        self.measure(&encode(text))
    }
}
