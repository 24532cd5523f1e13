//! Glyph source capability shared by fonts and bitmap tables

use crate::rasterizer::GlyphBitmap;
use crate::segment::GraphemeCluster;
use crate::Result;

/// Vertical metrics of one line in device pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineMetrics {
    /// Distance from the baseline up to the top of the line box
    pub ascent: i32,
    /// Distance from the baseline down to the bottom of the line box (positive)
    pub descent: i32,
}

impl LineMetrics {
    pub const fn new(ascent: i32, descent: i32) -> Self {
        Self { ascent, descent }
    }

    /// Proportional metrics for when no source reports any
    pub fn estimate(size_px: u16) -> Self {
        let size = i32::from(size_px);
        let ascent = (size * 4 + 2) / 5;
        Self {
            ascent,
            descent: size - ascent,
        }
    }

    pub fn height(&self) -> i32 {
        self.ascent + self.descent
    }
}

/// A provider of glyphs for grapheme clusters.
///
/// Sources are queried in a fixed priority order by the
/// [`GlyphResolver`](crate::GlyphResolver); they are shared between threads
/// and never mutated after loading.
pub trait GlyphSource: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Glyph id for the whole cluster.
    ///
    /// A multi-scalar cluster must match as a unit: a source that only knows
    /// the first scalar returns `None`.
    fn glyph_for(&self, cluster: &GraphemeCluster) -> Option<u16>;

    fn has_glyph(&self, cluster: &GraphemeCluster) -> bool {
        self.glyph_for(cluster).is_some()
    }

    /// Horizontal advance in pixels at `size_px`
    fn advance(&self, glyph_id: u16, size_px: u16) -> u16;

    fn line_metrics(&self, size_px: u16) -> LineMetrics;

    /// Render the glyph's coverage mask at `size_px`
    fn rasterize(&self, glyph_id: u16, size_px: u16) -> Result<GlyphBitmap>;
}
