//! Glyph rasterization using swash
//!
//! Converts font glyph outlines (and color bitmaps) to binary coverage masks.
//! Color emoji are flattened to their alpha channel and painted in the
//! current drawing color.

use crate::source::LineMetrics;
use crate::{Result, TextError};
use swash::scale::{Render, ScaleContext, Source, StrikeWith};
use swash::zeno::Format;

/// Coverage at or above this value is painted
pub const DEFAULT_COVERAGE_THRESHOLD: u8 = 128;

/// Rasterized glyph coverage with placement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphBitmap {
    /// One coverage byte per pixel, row-major (0 = not painted)
    pub coverage: Vec<u8>,
    /// Bitmap width in pixels
    pub width: u32,
    /// Bitmap height in pixels
    pub height: u32,
    /// Horizontal bearing (offset from pen position to left edge)
    pub bearing_x: i16,
    /// Vertical bearing (offset from baseline up to top edge)
    pub bearing_y: i16,
}

impl GlyphBitmap {
    /// A glyph with nothing to paint (like space)
    pub fn empty() -> Self {
        Self {
            coverage: Vec::new(),
            width: 0,
            height: 0,
            bearing_x: 0,
            bearing_y: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Coverage at (x, y), 0 outside the bitmap
    pub fn coverage_at(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.coverage
            .get((y * self.width + x) as usize)
            .copied()
            .unwrap_or(0)
    }

    /// Number of painted pixels
    pub fn ink(&self) -> usize {
        self.coverage.iter().filter(|&&c| c != 0).count()
    }

    /// Collapse coverage to 0 / 255 at `threshold`
    pub fn threshold(&mut self, threshold: u8) {
        let threshold = threshold.max(1);
        for c in &mut self.coverage {
            *c = if *c >= threshold { 255 } else { 0 };
        }
    }
}

/// Glyph rasterizer using swash
pub struct GlyphRasterizer {
    /// Swash scale context (caches scaling state)
    scale_context: ScaleContext,
    threshold: u8,
}

impl GlyphRasterizer {
    /// Create a new glyph rasterizer
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_COVERAGE_THRESHOLD)
    }

    pub fn with_threshold(threshold: u8) -> Self {
        Self {
            scale_context: ScaleContext::new(),
            threshold,
        }
    }

    /// Rasterize a glyph of the face at `face_index` in `font_data`
    pub fn rasterize(
        &mut self,
        font_data: &[u8],
        face_index: u32,
        glyph_id: u16,
        size_px: f32,
    ) -> Result<GlyphBitmap> {
        let swash_font = swash::FontRef::from_index(font_data, face_index as usize)
            .ok_or(TextError::InvalidFontData)?;

        let mut scaler = self
            .scale_context
            .builder(swash_font)
            .size(size_px)
            .build();

        // Color sources first so emoji fonts without outlines still produce a mask
        let mut render = Render::new(&[
            Source::ColorOutline(0),
            Source::ColorBitmap(StrikeWith::BestFit),
            Source::Outline,
        ]);
        render.format(Format::Alpha);

        let Some(image) = render.render(&mut scaler, glyph_id) else {
            // Empty glyph (like space) - no bitmap but has advance
            return Ok(GlyphBitmap::empty());
        };

        let width = image.placement.width;
        let height = image.placement.height;
        let pixels = width as usize * height as usize;

        // Color bitmaps come back as RGBA; keep only alpha
        let coverage = if image.data.len() == pixels * 4 {
            image.data.chunks_exact(4).map(|px| px[3]).collect()
        } else {
            image.data
        };

        let mut bitmap = GlyphBitmap {
            coverage,
            width,
            height,
            bearing_x: clamp_i16(image.placement.left),
            bearing_y: clamp_i16(image.placement.top),
        };
        bitmap.threshold(self.threshold);
        Ok(bitmap)
    }
}

impl Default for GlyphRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp_i16(v: i32) -> i16 {
    v.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

fn missing_box_gap(size_px: u16) -> u16 {
    (size_px / 8).max(1)
}

fn missing_box_width(size_px: u16) -> u16 {
    (size_px / 2).max(3)
}

/// Advance of the missing-glyph box at `size_px`
pub fn missing_glyph_advance(size_px: u16) -> u16 {
    missing_box_width(size_px) + missing_box_gap(size_px)
}

/// Hollow box standing on the baseline and reaching the ascent
pub fn missing_glyph_box(size_px: u16, metrics: LineMetrics) -> GlyphBitmap {
    let width = u32::from(missing_box_width(size_px));
    let height = metrics.ascent.max(3) as u32;
    let mut coverage = vec![0u8; (width * height) as usize];
    for y in 0..height {
        for x in 0..width {
            if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
                coverage[(y * width + x) as usize] = 255;
            }
        }
    }
    GlyphBitmap {
        coverage,
        width,
        height,
        bearing_x: (missing_box_gap(size_px) / 2) as i16,
        bearing_y: clamp_i16(height as i32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rasterizer_creation() {
        let _rasterizer = GlyphRasterizer::new();
    }

    #[test]
    fn test_invalid_font_data() {
        let mut rasterizer = GlyphRasterizer::new();
        let result = rasterizer.rasterize(&[0, 1, 2, 3], 0, 1, 16.0);
        assert!(matches!(result, Err(TextError::InvalidFontData)));
    }

    #[test]
    fn test_threshold_is_binary() {
        let mut bitmap = GlyphBitmap {
            coverage: vec![0, 12, 127, 128, 255],
            width: 5,
            height: 1,
            bearing_x: 0,
            bearing_y: 1,
        };
        bitmap.threshold(128);
        assert_eq!(bitmap.coverage, vec![0, 0, 0, 255, 255]);
        assert_eq!(bitmap.ink(), 2);
    }

    #[test]
    fn test_missing_box_is_hollow() {
        let bitmap = missing_glyph_box(16, LineMetrics::new(13, 3));
        assert_eq!((bitmap.width, bitmap.height), (8, 13));
        assert_eq!(bitmap.bearing_y, 13);
        assert_eq!(bitmap.coverage_at(0, 0), 255);
        assert_eq!(bitmap.coverage_at(4, 6), 0);
        assert_eq!(bitmap.coverage_at(7, 12), 255);
        // Perimeter of an 8x13 rectangle
        assert_eq!(bitmap.ink(), 2 * 8 + 2 * 11);
        assert!(missing_glyph_advance(16) as u32 > bitmap.width);
    }

    #[test]
    fn test_missing_box_tiny_sizes() {
        let bitmap = missing_glyph_box(1, LineMetrics::estimate(1));
        assert_eq!((bitmap.width, bitmap.height), (3, 3));
        assert_eq!(missing_glyph_advance(1), 4);
    }
}
