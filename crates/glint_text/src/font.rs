//! Outline and color fonts as glyph sources

use crate::rasterizer::{GlyphBitmap, GlyphRasterizer};
use crate::segment::GraphemeCluster;
use crate::source::{GlyphSource, LineMetrics};
use crate::{Result, TextError};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use ttf_parser::{name_id, Face, GlyphId};

/// A parsed font face that answers glyph queries for clusters.
///
/// Single scalars go through the cmap. Sequences (flags, keycaps) are shaped
/// with rustybuzz and only match when the font ligates the whole cluster
/// into one glyph.
///
/// Faces borrow the font bytes, so they are parsed on demand. Lookup results
/// are memoized per source, which keeps repeated text from parsing again.
pub struct FontSource {
    family: String,
    data: Arc<Vec<u8>>,
    face_index: u32,
    units_per_em: u16,
    ascender: i16,
    descender: i16,
    rasterizer: Mutex<GlyphRasterizer>,
    lookups: Mutex<FaceLookups>,
}

/// Memoized cmap, shaping and advance results
#[derive(Default)]
struct FaceLookups {
    glyphs: FxHashMap<SmallVec<[char; 2]>, Option<u16>>,
    /// Advances in font units
    advances: FxHashMap<u16, u16>,
}

impl std::fmt::Debug for FontSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontSource")
            .field("family", &self.family)
            .field("face_index", &self.face_index)
            .field("units_per_em", &self.units_per_em)
            .finish()
    }
}

impl FontSource {
    /// Parse the first face of `data`
    pub fn from_data(data: Vec<u8>) -> Result<Self> {
        Self::from_data_with_index(data, 0)
    }

    /// Parse face `face_index` of a font collection
    pub fn from_data_with_index(data: Vec<u8>, face_index: u32) -> Result<Self> {
        let face =
            Face::parse(&data, face_index).map_err(|e| TextError::FontParse(e.to_string()))?;

        let family = face
            .names()
            .into_iter()
            .filter(|name| name.name_id == name_id::FAMILY)
            .find_map(|name| name.to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        let units_per_em = face.units_per_em().max(1);
        let ascender = face.ascender();
        let descender = face.descender();

        Ok(Self {
            family,
            data: Arc::new(data),
            face_index,
            units_per_em,
            ascender,
            descender,
            rasterizer: Mutex::new(GlyphRasterizer::new()),
            lookups: Mutex::new(FaceLookups::default()),
        })
    }

    /// Read and parse a font file
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|source| TextError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_data(data)
    }

    /// Coverage level at which a pixel counts as painted
    pub fn with_coverage_threshold(self, threshold: u8) -> Self {
        Self {
            rasterizer: Mutex::new(GlyphRasterizer::with_threshold(threshold)),
            ..self
        }
    }

    pub fn family_name(&self) -> &str {
        &self.family
    }

    pub fn face_index(&self) -> u32 {
        self.face_index
    }

    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    /// Raw font bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn face(&self) -> Option<Face<'_>> {
        Face::parse(&self.data, self.face_index).ok()
    }

    fn lookups(&self) -> MutexGuard<'_, FaceLookups> {
        self.lookups.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn memoized_glyph(
        &self,
        chars: &[char],
        lookup: impl FnOnce() -> Option<u16>,
    ) -> Option<u16> {
        if let Some(&id) = self.lookups().glyphs.get(chars) {
            return id;
        }
        // Looked up without the lock; a racing thread computes the same id
        let id = lookup();
        self.lookups().glyphs.insert(SmallVec::from_slice(chars), id);
        id
    }

    fn scale(&self, units: i32, size_px: u16) -> i32 {
        let scaled = units as f32 * f32::from(size_px) / f32::from(self.units_per_em);
        scaled.round() as i32
    }

    /// Glyph for a lone scalar from the cmap
    pub fn glyph_id(&self, c: char) -> Option<u16> {
        self.memoized_glyph(&[c], || {
            self.face()?
                .glyph_index(c)
                .map(|id| id.0)
                .filter(|&id| id != 0)
        })
    }

    fn shaped_glyph(&self, cluster: &GraphemeCluster) -> Option<u16> {
        self.memoized_glyph(cluster.chars(), || {
            let face = rustybuzz::Face::from_slice(&self.data, self.face_index)?;
            let mut buffer = rustybuzz::UnicodeBuffer::new();
            for &c in cluster.chars() {
                buffer.add(c, 0);
            }
            let shaped = rustybuzz::shape(&face, &[], buffer);

            match shaped.glyph_infos() {
                [info] if info.glyph_id != 0 => u16::try_from(info.glyph_id).ok(),
                _ => None,
            }
        })
    }

    fn advance_units(&self, glyph_id: u16) -> u16 {
        if let Some(&units) = self.lookups().advances.get(&glyph_id) {
            return units;
        }
        let units = self
            .face()
            .and_then(|face| face.glyph_hor_advance(GlyphId(glyph_id)))
            .unwrap_or(0);
        self.lookups().advances.insert(glyph_id, units);
        units
    }
}

impl GlyphSource for FontSource {
    fn name(&self) -> &str {
        &self.family
    }

    fn glyph_for(&self, cluster: &GraphemeCluster) -> Option<u16> {
        if cluster.is_sequence() {
            self.shaped_glyph(cluster)
        } else {
            self.glyph_id(cluster.first())
        }
    }

    fn advance(&self, glyph_id: u16, size_px: u16) -> u16 {
        let units = self.advance_units(glyph_id);
        self.scale(i32::from(units), size_px).clamp(0, i32::from(u16::MAX)) as u16
    }

    fn line_metrics(&self, size_px: u16) -> LineMetrics {
        LineMetrics::new(
            self.scale(i32::from(self.ascender), size_px),
            self.scale(-i32::from(self.descender), size_px),
        )
    }

    fn rasterize(&self, glyph_id: u16, size_px: u16) -> Result<GlyphBitmap> {
        let mut rasterizer = self
            .rasterizer
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        rasterizer.rasterize(&self.data, self.face_index, glyph_id, f32::from(size_px))
    }
}
