//! Font registry for system font discovery and caching
//!
//! Uses fontdb to find fonts by family name or generic category and hands
//! them out as shared [`FontSource`]s.

use crate::config::FontsConfig;
use crate::font::FontSource;
use crate::rasterizer::DEFAULT_COVERAGE_THRESHOLD;
use crate::{Result, TextError};
use fontdb::{Database, Family, Query, Source, Stretch, Style, Weight};
use rustc_hash::FxHashMap;
use std::path::Path;
use std::sync::Arc;

/// Families tried, in order, when fontdb's own generic family is not installed
const SANS_SERIF_FAMILIES: &[&str] = &[
    "DejaVu Sans",
    "Noto Sans",
    "Liberation Sans",
    "Helvetica",
    "Arial",
    "Segoe UI",
];

const SERIF_FAMILIES: &[&str] = &[
    "DejaVu Serif",
    "Noto Serif",
    "Liberation Serif",
    "Times New Roman",
    "Times",
];

const MONOSPACE_FAMILIES: &[&str] = &[
    "DejaVu Sans Mono",
    "Noto Sans Mono",
    "Liberation Mono",
    "Menlo",
    "Consolas",
    "Courier New",
];

/// Families tried, in order, for [`GenericFont::Emoji`]
const EMOJI_FAMILIES: &[&str] = &[
    "Noto Color Emoji",
    "Apple Color Emoji",
    "Segoe UI Emoji",
    "Twemoji Mozilla",
    "EmojiOne Color",
];

/// Families tried, in order, for [`GenericFont::Symbol`]
const SYMBOL_FAMILIES: &[&str] = &[
    "Noto Sans Symbols 2",
    "Noto Sans Symbols",
    "Segoe UI Symbol",
    "Apple Symbols",
    "DejaVu Sans",
];

/// Generic font category for fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GenericFont {
    #[default]
    SansSerif,
    Serif,
    Monospace,
    /// Color emoji font
    Emoji,
    /// Symbol font covering dingbats and technical symbols
    Symbol,
}

/// Font registry that discovers and caches fonts
pub struct FontRegistry {
    /// fontdb database of every discovered face
    db: Database,
    /// Cached sources (Some = found, None = not found)
    faces: FxHashMap<String, Option<Arc<FontSource>>>,
    /// Coverage threshold given to every loaded source
    coverage_threshold: u8,
}

impl FontRegistry {
    /// Create a registry over the system fonts
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.db.load_system_fonts();
        tracing::debug!("Discovered {} system font faces", registry.db.len());
        registry
    }

    /// Create a registry that knows no fonts until some are added
    pub fn empty() -> Self {
        Self {
            db: Database::new(),
            faces: FxHashMap::default(),
            coverage_threshold: DEFAULT_COVERAGE_THRESHOLD,
        }
    }

    /// Create a registry from the `[fonts]` config section
    pub fn from_config(config: &FontsConfig) -> Self {
        let mut registry = if config.system_fonts {
            Self::new()
        } else {
            Self::empty()
        };
        for dir in &config.font_dirs {
            registry.load_fonts_dir(dir);
        }
        registry
    }

    /// Threshold for sources loaded from now on
    pub fn set_coverage_threshold(&mut self, threshold: u8) {
        self.coverage_threshold = threshold;
    }

    /// Scan a directory for additional fonts
    pub fn load_fonts_dir(&mut self, dir: &Path) {
        let before = self.db.len();
        self.db.load_fonts_dir(dir);
        tracing::debug!(
            "Loaded {} font faces from {}",
            self.db.len() - before,
            dir.display()
        );
    }

    /// Register in-memory font data
    pub fn load_font_data(&mut self, data: Vec<u8>) {
        self.db.load_font_data(data);
    }

    /// Load a font by family name (e.g. "DejaVu Sans")
    pub fn load_font(&mut self, name: &str) -> Result<Arc<FontSource>> {
        // Check cache first (includes failed lookups as None)
        if let Some(cached) = self.faces.get(name) {
            return cached
                .clone()
                .ok_or_else(|| TextError::FontLoad(format!("Font '{}' not found (cached)", name)));
        }

        let result = self
            .query(Family::Name(name))
            .ok_or_else(|| TextError::FontLoad(format!("Font '{}' not found", name)))
            .and_then(|id| self.load_face_by_id(id));

        match result {
            Ok(face) => {
                let face = Arc::new(face);
                self.faces.insert(name.to_string(), Some(Arc::clone(&face)));
                Ok(face)
            }
            Err(e) => {
                self.faces.insert(name.to_string(), None);
                Err(e)
            }
        }
    }

    /// Load a generic font category
    pub fn load_generic(&mut self, generic: GenericFont) -> Result<Arc<FontSource>> {
        let cache_key = format!("__generic_{:?}", generic);

        if let Some(cached) = self.faces.get(&cache_key) {
            return cached.clone().ok_or_else(|| {
                TextError::FontLoad(format!("Generic font {:?} not found (cached)", generic))
            });
        }

        let found = match generic {
            GenericFont::SansSerif => self
                .query(Family::SansSerif)
                .or_else(|| self.query_first(SANS_SERIF_FAMILIES)),
            GenericFont::Serif => self
                .query(Family::Serif)
                .or_else(|| self.query_first(SERIF_FAMILIES)),
            GenericFont::Monospace => self
                .query(Family::Monospace)
                .or_else(|| self.query_first(MONOSPACE_FAMILIES)),
            GenericFont::Emoji => self.query_first(EMOJI_FAMILIES),
            GenericFont::Symbol => self.query_first(SYMBOL_FAMILIES),
        };

        let result = found
            .ok_or_else(|| TextError::FontLoad(format!("Generic font {:?} not found", generic)))
            .and_then(|id| self.load_face_by_id(id));

        match result {
            Ok(face) => {
                tracing::debug!("Generic font {:?} -> {}", generic, face.family_name());
                let face = Arc::new(face);
                self.faces.insert(cache_key, Some(Arc::clone(&face)));
                Ok(face)
            }
            Err(e) => {
                self.faces.insert(cache_key, None);
                Err(e)
            }
        }
    }

    /// Load the first family in `names` that is available
    pub fn load_first(&mut self, names: &[String]) -> Option<Arc<FontSource>> {
        for name in names {
            match self.load_font(name) {
                Ok(face) => return Some(face),
                Err(e) => tracing::debug!("{}", e),
            }
        }
        None
    }

    fn query(&self, family: Family<'_>) -> Option<fontdb::ID> {
        let query = Query {
            families: &[family],
            weight: Weight::NORMAL,
            style: Style::Normal,
            stretch: Stretch::Normal,
        };
        self.db.query(&query)
    }

    fn query_first(&self, names: &[&str]) -> Option<fontdb::ID> {
        names.iter().find_map(|name| self.query(Family::Name(name)))
    }

    /// Load a font face by fontdb ID
    fn load_face_by_id(&self, id: fontdb::ID) -> Result<FontSource> {
        let (src, face_index) = self
            .db
            .face_source(id)
            .ok_or_else(|| TextError::FontLoad("Font source not found".to_string()))?;

        let data = match src {
            Source::File(path) => std::fs::read(&path).map_err(|source| TextError::Io {
                path: path.clone(),
                source,
            })?,
            Source::Binary(arc) => arc.as_ref().as_ref().to_vec(),
            Source::SharedFile(_path, data) => data.as_ref().as_ref().to_vec(),
        };

        Ok(FontSource::from_data_with_index(data, face_index)?
            .with_coverage_threshold(self.coverage_threshold))
    }

    /// List available font families
    pub fn list_families(&self) -> Vec<String> {
        let mut families: Vec<String> = self
            .db
            .faces()
            .filter_map(|face| face.families.first().map(|(name, _)| name.clone()))
            .collect();

        families.sort();
        families.dedup();
        families
    }

    /// Check if a font is available
    pub fn has_font(&self, name: &str) -> bool {
        self.query(Family::Name(name)).is_some()
    }
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_registry() {
        let mut registry = FontRegistry::empty();
        assert!(registry.list_families().is_empty());
        assert!(!registry.has_font("DejaVu Sans"));
        assert!(registry.load_generic(GenericFont::Emoji).is_err());

        // Unparseable data is ignored
        registry.load_font_data(vec![0, 1, 2, 3]);
        assert!(registry.list_families().is_empty());

        // Second lookup hits the negative cache
        let err = registry.load_font("Nope").unwrap_err();
        assert!(!err.to_string().contains("cached"));
        let err = registry.load_font("Nope").unwrap_err();
        assert!(err.to_string().contains("cached"));
    }

    #[test]
    fn test_load_first_skips_missing() {
        let mut registry = FontRegistry::empty();
        let names = vec!["Missing One".to_string(), "Missing Two".to_string()];
        assert!(registry.load_first(&names).is_none());
    }

    #[test]
    fn test_load_generic_fonts() {
        let mut registry = FontRegistry::new();

        // May not be available in minimal CI environments
        let sans = registry.load_generic(GenericFont::SansSerif);
        let mono = registry.load_generic(GenericFont::Monospace);

        if sans.is_err() && mono.is_err() {
            println!("No generic fonts available - skipping test (CI environment)");
            return;
        }

        if let Ok(font) = sans {
            println!("Loaded sans-serif: {}", font.family_name());
            // Cached instance is shared
            let again = registry.load_generic(GenericFont::SansSerif).unwrap();
            assert!(Arc::ptr_eq(&font, &again));
        }
        if let Ok(font) = mono {
            println!("Loaded monospace: {}", font.family_name());
        }
    }

    #[test]
    fn test_generic_uses_installed_families() {
        let mut registry = FontRegistry::new();
        let generics = [
            (GenericFont::SansSerif, SANS_SERIF_FAMILIES),
            (GenericFont::Serif, SERIF_FAMILIES),
            (GenericFont::Monospace, MONOSPACE_FAMILIES),
            (GenericFont::Emoji, EMOJI_FAMILIES),
            (GenericFont::Symbol, SYMBOL_FAMILIES),
        ];

        for (generic, families) in generics {
            let Some(installed) = families.iter().find(|name| registry.has_font(name)) else {
                println!("No {:?} family installed - skipping", generic);
                continue;
            };
            let font = registry.load_generic(generic);
            assert!(font.is_ok(), "{:?} not found although {} is installed", generic, installed);
        }
    }

    #[test]
    fn test_emoji_and_symbol_lookup() {
        let mut registry = FontRegistry::new();
        match registry.load_generic(GenericFont::Emoji) {
            Ok(font) => println!("Emoji font: {}", font.family_name()),
            Err(e) => println!("No emoji font: {}", e),
        }
        match registry.load_generic(GenericFont::Symbol) {
            Ok(font) => println!("Symbol font: {}", font.family_name()),
            Err(e) => println!("No symbol font: {}", e),
        }
    }

    #[test]
    fn test_list_families() {
        let registry = FontRegistry::new();
        let families = registry.list_families();
        // May be empty in minimal CI environments without fonts
        println!("Found {} font families", families.len());
        for name in families.iter().take(5) {
            assert!(registry.has_font(name));
        }
    }
}
