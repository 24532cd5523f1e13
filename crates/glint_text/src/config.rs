//! Text engine configuration (glint.toml)

use crate::rasterizer::DEFAULT_COVERAGE_THRESHOLD;
use crate::segment::RuleTable;
use crate::{Result, TextError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level text configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TextConfig {
    /// Pixel size used when a draw call does not set one
    #[serde(default = "default_font_size")]
    pub font_size_px: u16,
    /// Coverage at or above which a font pixel is painted
    #[serde(default = "default_threshold")]
    pub coverage_threshold: u8,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub fonts: FontsConfig,
    #[serde(default)]
    pub segmentation: RuleTable,
}

fn default_font_size() -> u16 {
    16
}

fn default_threshold() -> u8 {
    DEFAULT_COVERAGE_THRESHOLD
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            font_size_px: default_font_size(),
            coverage_threshold: default_threshold(),
            cache: CacheConfig::default(),
            fonts: FontsConfig::default(),
            segmentation: RuleTable::default(),
        }
    }
}

/// Glyph cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Maximum number of cached glyph bitmaps
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    crate::cache::DEFAULT_CAPACITY
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

/// Glyph source configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FontsConfig {
    /// Base text font families, first available wins
    #[serde(default)]
    pub base: Vec<String>,
    /// Emoji font families
    #[serde(default)]
    pub emoji: Vec<String>,
    /// Symbol font families
    #[serde(default)]
    pub symbol: Vec<String>,
    /// Extra directories to scan for fonts
    #[serde(default)]
    pub font_dirs: Vec<PathBuf>,
    /// Embedded bitmap tables, appended after the fonts
    #[serde(default)]
    pub bitmap_tables: Vec<PathBuf>,
    /// Scan the system font directories
    #[serde(default = "default_true")]
    pub system_fonts: bool,
}

fn default_true() -> bool {
    true
}

impl Default for FontsConfig {
    fn default() -> Self {
        Self {
            base: Vec::new(),
            emoji: Vec::new(),
            symbol: Vec::new(),
            font_dirs: Vec::new(),
            bitmap_tables: Vec::new(),
            system_fonts: true,
        }
    }
}

impl TextConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| TextError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!("Loaded text config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{CodeRange, JoinRule};

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = TextConfig::from_toml_str("").unwrap();
        assert_eq!(config, TextConfig::default());
        assert_eq!(config.font_size_px, 16);
        assert_eq!(config.cache.capacity, 2048);
        assert!(config.fonts.system_fonts);
        assert_eq!(config.segmentation.rules.len(), 2);
    }

    #[test]
    fn test_partial_sections() {
        let config = TextConfig::from_toml_str(
            r#"
            font_size_px = 12

            [cache]
            capacity = 64

            [fonts]
            base = ["DejaVu Sans"]
            bitmap_tables = ["assets/emoji.toml"]
            system_fonts = false
            "#,
        )
        .unwrap();

        assert_eq!(config.font_size_px, 12);
        assert_eq!(config.coverage_threshold, 128);
        assert_eq!(config.cache.capacity, 64);
        assert_eq!(config.fonts.base, vec!["DejaVu Sans".to_string()]);
        assert!(config.fonts.emoji.is_empty());
        assert_eq!(
            config.fonts.bitmap_tables,
            vec![PathBuf::from("assets/emoji.toml")]
        );
        assert!(!config.fonts.system_fonts);
    }

    #[test]
    fn test_custom_rules() {
        let config = TextConfig::from_toml_str(
            r#"
            [[segmentation.rules]]
            name = "keycap"
            second = { start = 0x20E3, end = 0x20E3 }

            [[segmentation.rules]]
            name = "skin-tone"
            second = { start = 0x1F3FB, end = 0x1F3FF }
            "#,
        )
        .unwrap();

        let rules = &config.segmentation.rules;
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0], JoinRule::keycap());
        assert_eq!(rules[1].first, CodeRange::ANY);
        assert!(rules[1].matches('\u{1F44D}', '\u{1F3FD}'));
    }

    #[test]
    fn test_round_trip() {
        let mut config = TextConfig::default();
        config.fonts.emoji = vec!["Noto Color Emoji".to_string()];
        let text = config.to_toml().unwrap();
        assert_eq!(TextConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_parse_error() {
        let result = TextConfig::from_toml_str("font_size_px = \"big\"");
        assert!(matches!(result, Err(TextError::ConfigParse(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = TextConfig::load(Path::new("/nonexistent/glint.toml"));
        assert!(matches!(result, Err(TextError::Io { .. })));
    }
}
