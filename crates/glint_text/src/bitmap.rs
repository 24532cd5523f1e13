//! Embedded bitmap glyph tables
//!
//! A [`BitmapSource`] maps exact scalar sequences (single characters, flag
//! pairs, keycaps, ...) to 1-bit glyphs drawn at a design size. Requests at
//! other sizes are scaled nearest-neighbour.
//!
//! Tables can be built in code or loaded from TOML:
//!
//! ```toml
//! name = "emoji"
//! design_px = 16
//! ascent = 13
//! descent = 3
//!
//! [[glyphs]]
//! sequence = [0x1F609]
//! advance = 14
//! rows = [
//!     "..####..",
//!     ".#....#.",
//! ]
//! ```

use crate::rasterizer::GlyphBitmap;
use crate::segment::GraphemeCluster;
use crate::source::{GlyphSource, LineMetrics};
use crate::{Result, TextError};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use smallvec::SmallVec;
use std::path::Path;

/// Longest scalar sequence a table entry can match
const MAX_SEQUENCE_LEN: usize = 2;

/// One glyph of a bitmap table, at the table's design size
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmapGlyph {
    pub width: u32,
    pub height: u32,
    pub bearing_x: i16,
    pub bearing_y: i16,
    pub advance: u16,
    /// 0 or 255 per pixel, row-major
    pub coverage: Vec<u8>,
}

impl BitmapGlyph {
    /// A glyph that only advances the pen
    pub fn blank(advance: u16) -> Self {
        Self {
            width: 0,
            height: 0,
            bearing_x: 0,
            bearing_y: 0,
            advance,
            coverage: Vec::new(),
        }
    }

    /// Build from ASCII-art rows; `#` paints, `.` and space do not.
    ///
    /// The bottom row sits on the baseline.
    pub fn from_rows<S: AsRef<str>>(rows: &[S], advance: u16) -> Result<Self> {
        let height = rows.len() as u32;
        let width = rows
            .first()
            .map(|r| r.as_ref().chars().count() as u32)
            .unwrap_or(0);

        let mut coverage = Vec::with_capacity((width * height) as usize);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.chars().count() as u32 != width {
                return Err(TextError::BitmapTable(format!(
                    "row {} is {} pixels wide, expected {}",
                    i,
                    row.chars().count(),
                    width
                )));
            }
            for c in row.chars() {
                match c {
                    '#' => coverage.push(255),
                    '.' | ' ' => coverage.push(0),
                    other => {
                        return Err(TextError::BitmapTable(format!(
                            "unexpected {other:?} in row {i}"
                        )))
                    }
                }
            }
        }

        Ok(Self {
            width,
            height,
            bearing_x: 0,
            bearing_y: height as i16,
            advance,
            coverage,
        })
    }

    pub fn with_bearing(mut self, bearing_x: i16, bearing_y: i16) -> Self {
        self.bearing_x = bearing_x;
        self.bearing_y = bearing_y;
        self
    }
}

/// Glyph source backed by an in-memory bitmap table
pub struct BitmapSource {
    name: String,
    design_px: u16,
    metrics: LineMetrics,
    glyphs: Vec<BitmapGlyph>,
    index: FxHashMap<SmallVec<[char; 2]>, u16>,
}

impl BitmapSource {
    /// Create an empty table; `metrics` are at `design_px`
    pub fn new(name: impl Into<String>, design_px: u16, metrics: LineMetrics) -> Self {
        Self {
            name: name.into(),
            design_px: design_px.max(1),
            metrics,
            glyphs: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Add or replace the glyph for `sequence`, returning its id.
    ///
    /// Sequences hold one or two scalars, the longest cluster segmentation
    /// produces, and a table holds at most 65,536 glyphs.
    pub fn insert(&mut self, sequence: &[char], glyph: BitmapGlyph) -> Result<u16> {
        if sequence.is_empty() || sequence.len() > MAX_SEQUENCE_LEN {
            return Err(TextError::BitmapTable(format!(
                "sequence {:?} must hold 1 to {} scalars",
                sequence, MAX_SEQUENCE_LEN
            )));
        }
        if let Some(&id) = self.index.get(sequence) {
            self.glyphs[usize::from(id)] = glyph;
            return Ok(id);
        }

        let id = u16::try_from(self.glyphs.len()).map_err(|_| {
            TextError::BitmapTable(format!("table '{}' is full", self.name))
        })?;
        self.glyphs.push(glyph);
        self.index.insert(SmallVec::from_slice(sequence), id);
        Ok(id)
    }

    pub fn with_glyph(mut self, sequence: &[char], glyph: BitmapGlyph) -> Result<Self> {
        self.insert(sequence, glyph)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn design_px(&self) -> u16 {
        self.design_px
    }

    /// Parse a TOML bitmap table
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: TableFile = toml::from_str(content)?;
        let mut source = Self::new(
            table.name,
            table.design_px,
            LineMetrics::new(table.ascent, table.descent),
        );

        for entry in table.glyphs {
            let sequence = entry
                .sequence
                .iter()
                .map(|&cp| {
                    char::from_u32(cp).ok_or_else(|| {
                        TextError::BitmapTable(format!("U+{cp:04X} is not a scalar value"))
                    })
                })
                .collect::<Result<SmallVec<[char; 2]>>>()?;

            let mut glyph = BitmapGlyph::from_rows(&entry.rows, entry.advance)?;
            glyph.bearing_x = entry.bearing_x;
            if let Some(bearing_y) = entry.bearing_y {
                glyph.bearing_y = bearing_y;
            }
            source.insert(&sequence, glyph)?;
        }

        tracing::debug!(
            "Loaded bitmap table '{}' with {} glyphs",
            source.name,
            source.len()
        );
        Ok(source)
    }

    /// Load a TOML bitmap table from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| TextError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    fn scale(&self, value: i32, size_px: u16) -> i32 {
        let design = i32::from(self.design_px);
        let scaled = value * i32::from(size_px);
        // round half away from zero
        if scaled >= 0 {
            (scaled + design / 2) / design
        } else {
            (scaled - design / 2) / design
        }
    }
}

impl GlyphSource for BitmapSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn glyph_for(&self, cluster: &GraphemeCluster) -> Option<u16> {
        self.index.get(cluster.chars()).copied()
    }

    fn advance(&self, glyph_id: u16, size_px: u16) -> u16 {
        self.glyphs
            .get(glyph_id as usize)
            .map(|g| self.scale(i32::from(g.advance), size_px).max(0) as u16)
            .unwrap_or(0)
    }

    fn line_metrics(&self, size_px: u16) -> LineMetrics {
        LineMetrics::new(
            self.scale(self.metrics.ascent, size_px),
            self.scale(self.metrics.descent, size_px),
        )
    }

    fn rasterize(&self, glyph_id: u16, size_px: u16) -> Result<GlyphBitmap> {
        let glyph = self.glyphs.get(glyph_id as usize).ok_or_else(|| {
            TextError::BitmapTable(format!("glyph {glyph_id} not in table '{}'", self.name))
        })?;

        if glyph.width == 0 || glyph.height == 0 {
            return Ok(GlyphBitmap::empty());
        }

        if size_px == self.design_px {
            return Ok(GlyphBitmap {
                coverage: glyph.coverage.clone(),
                width: glyph.width,
                height: glyph.height,
                bearing_x: glyph.bearing_x,
                bearing_y: glyph.bearing_y,
            });
        }

        let width = self.scale(glyph.width as i32, size_px).max(1) as u32;
        let height = self.scale(glyph.height as i32, size_px).max(1) as u32;
        let mut coverage = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            let src_y = y * glyph.height / height;
            for x in 0..width {
                let src_x = x * glyph.width / width;
                coverage.push(glyph.coverage[(src_y * glyph.width + src_x) as usize]);
            }
        }

        Ok(GlyphBitmap {
            coverage,
            width,
            height,
            bearing_x: self.scale(i32::from(glyph.bearing_x), size_px) as i16,
            bearing_y: self.scale(i32::from(glyph.bearing_y), size_px) as i16,
        })
    }
}

#[derive(Deserialize)]
struct TableFile {
    name: String,
    design_px: u16,
    ascent: i32,
    descent: i32,
    #[serde(default)]
    glyphs: Vec<TableGlyph>,
}

#[derive(Deserialize)]
struct TableGlyph {
    sequence: Vec<u32>,
    advance: u16,
    #[serde(default)]
    bearing_x: i16,
    #[serde(default)]
    bearing_y: Option<i16>,
    #[serde(default)]
    rows: Vec<String>,
}
