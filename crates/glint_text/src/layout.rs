//! Single-line text layout
//!
//! Places resolved glyphs left to right on one baseline and aligns the run
//! against its origin or a bounding box. There is no wrapping: one draw call
//! always yields one line.

use crate::rasterizer::GlyphBitmap;
use crate::resolver::GlyphRef;
use crate::source::LineMetrics;
use bitflags::bitflags;
use glint_paint::{Point, Rect};
use std::ops::Range;
use std::sync::Arc;

/// Text alignment options (horizontal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical anchor point for text positioning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAnchor {
    /// Y coordinate is the top of the line box
    #[default]
    Top,
    /// Y coordinate is the text baseline
    Baseline,
    /// Y coordinate is the bottom of the line box
    Bottom,
    /// Y coordinate is the vertical center of the line box
    Center,
}

bitflags! {
    /// Anchor point flags, one per axis.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Anchor: u32 {
        const HCENTER = 1;
        const VCENTER = 2;
        const LEFT = 4;
        const RIGHT = 8;
        const TOP = 16;
        const BOTTOM = 32;
        const BASELINE = 64;
    }
}

impl Anchor {
    pub const TOP_LEFT: Anchor = Anchor::TOP.union(Anchor::LEFT);

    const HORIZONTAL: Anchor = Anchor::HCENTER.union(Anchor::LEFT).union(Anchor::RIGHT);
    const VERTICAL: Anchor = Anchor::VCENTER
        .union(Anchor::TOP)
        .union(Anchor::BOTTOM)
        .union(Anchor::BASELINE);

    /// Split into per-axis anchors.
    ///
    /// An axis with no flag or several flags set falls back to LEFT / TOP.
    pub fn split(self) -> (TextAlignment, TextAnchor) {
        let horizontal = self & Self::HORIZONTAL;
        let alignment = if horizontal == Self::LEFT {
            TextAlignment::Left
        } else if horizontal == Self::HCENTER {
            TextAlignment::Center
        } else if horizontal == Self::RIGHT {
            TextAlignment::Right
        } else {
            tracing::debug!("Invalid horizontal anchor {:?}, using LEFT", horizontal);
            TextAlignment::Left
        };

        let vertical = self & Self::VERTICAL;
        let anchor = if vertical == Self::TOP {
            TextAnchor::Top
        } else if vertical == Self::BASELINE {
            TextAnchor::Baseline
        } else if vertical == Self::BOTTOM {
            TextAnchor::Bottom
        } else if vertical == Self::VCENTER {
            TextAnchor::Center
        } else {
            tracing::debug!("Invalid vertical anchor {:?}, using TOP", vertical);
            TextAnchor::Top
        };

        (alignment, anchor)
    }
}

impl Default for Anchor {
    fn default() -> Self {
        Self::TOP_LEFT
    }
}

/// Options for text layout
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LayoutOptions {
    pub anchor: Anchor,
    /// Align within this box instead of around the origin
    pub bounds: Option<Rect>,
    /// Extra pixels between adjacent glyphs
    pub letter_spacing: i32,
}

impl LayoutOptions {
    pub fn with_anchor(anchor: Anchor) -> Self {
        Self {
            anchor,
            ..Self::default()
        }
    }
}

/// A resolved cluster waiting to be placed
#[derive(Debug, Clone)]
pub struct ClusterGlyph {
    pub glyph: GlyphRef,
    /// UTF-16 unit range of the cluster in the source text
    pub units: Range<usize>,
    pub bitmap: Option<Arc<GlyphBitmap>>,
}

/// A positioned glyph ready for blitting
#[derive(Debug, Clone)]
pub struct PositionedGlyph {
    pub glyph: GlyphRef,
    pub units: Range<usize>,
    /// Pen position in pixels
    pub x: i32,
    /// Baseline Y position
    pub baseline: i32,
    pub bitmap: Option<Arc<GlyphBitmap>>,
}

impl PositionedGlyph {
    /// Horizontal span covered by the advance
    pub fn span(&self) -> Range<i32> {
        self.x..self.x.saturating_add(i32::from(self.glyph.advance))
    }
}

/// One laid-out line
#[derive(Debug, Clone, Default)]
pub struct LayoutRun {
    pub glyphs: Vec<PositionedGlyph>,
    /// Line box: total advance wide, ascent + descent tall
    pub bounds: Rect,
    pub baseline: i32,
    /// Total advance in pixels
    pub advance: i32,
}

impl LayoutRun {
    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PositionedGlyph> {
        self.glyphs.iter()
    }

    pub fn width(&self) -> i32 {
        self.advance
    }
}

/// Line layout engine
#[derive(Debug, Clone, Copy, Default)]
pub struct LineLayout;

impl LineLayout {
    pub fn new() -> Self {
        Self
    }

    /// Total advance of `glyphs` with `letter_spacing` between neighbours
    pub fn measure(&self, glyphs: &[GlyphRef], letter_spacing: i32) -> i32 {
        let advance: i64 = glyphs.iter().map(|g| i64::from(g.advance)).sum();
        let gaps = glyphs.len().saturating_sub(1) as i64;
        clamp_i32(advance + gaps * i64::from(letter_spacing))
    }

    /// Lay `glyphs` out on one line anchored at `origin`
    pub fn layout(
        &self,
        glyphs: Vec<ClusterGlyph>,
        origin: Point,
        options: &LayoutOptions,
        metrics: LineMetrics,
    ) -> LayoutRun {
        let refs: Vec<GlyphRef> = glyphs.iter().map(|g| g.glyph).collect();
        let width = self.measure(&refs, options.letter_spacing);
        let height = metrics.height();
        let (alignment, anchor) = options.anchor.split();

        // Positions are computed wide and clamped, so coordinates near the
        // i32 limits push glyphs off-grid instead of overflowing
        let (w, h) = (i64::from(width), i64::from(height));
        let (ascent, descent) = (i64::from(metrics.ascent), i64::from(metrics.descent));
        let start_x = match (options.bounds, alignment) {
            (None, TextAlignment::Left) => i64::from(origin.x),
            (None, TextAlignment::Center) => i64::from(origin.x) - w / 2,
            (None, TextAlignment::Right) => i64::from(origin.x) - w,
            (Some(b), TextAlignment::Left) => i64::from(b.x),
            (Some(b), TextAlignment::Center) => i64::from(b.x) + (i64::from(b.width) - w) / 2,
            (Some(b), TextAlignment::Right) => i64::from(b.x) + i64::from(b.width) - w,
        };

        let baseline = match (options.bounds, anchor) {
            (_, TextAnchor::Baseline) => i64::from(origin.y),
            (None, TextAnchor::Top) => i64::from(origin.y) + ascent,
            (None, TextAnchor::Bottom) => i64::from(origin.y) - descent,
            (None, TextAnchor::Center) => i64::from(origin.y) - h / 2 + ascent,
            (Some(b), TextAnchor::Top) => i64::from(b.y) + ascent,
            (Some(b), TextAnchor::Bottom) => i64::from(b.y) + i64::from(b.height) - descent,
            (Some(b), TextAnchor::Center) => {
                i64::from(b.y) + (i64::from(b.height) - h) / 2 + ascent
            }
        };

        let mut positioned = Vec::with_capacity(glyphs.len());
        let mut x = start_x;
        for cluster in glyphs {
            positioned.push(PositionedGlyph {
                glyph: cluster.glyph,
                units: cluster.units,
                x: clamp_i32(x),
                baseline: clamp_i32(baseline),
                bitmap: cluster.bitmap,
            });
            x += i64::from(cluster.glyph.advance) + i64::from(options.letter_spacing);
        }

        LayoutRun {
            glyphs: positioned,
            bounds: Rect::new(clamp_i32(start_x), clamp_i32(baseline - ascent), width, height),
            baseline: clamp_i32(baseline),
            advance: width,
        }
    }
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
