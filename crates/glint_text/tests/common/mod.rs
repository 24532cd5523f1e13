#![allow(dead_code)]

use glint_text::{
    encode, BitmapGlyph, BitmapSource, FallbackKind, GlyphCache, GlyphResolver, LineMetrics,
    TextRenderer,
};
use std::sync::Arc;

pub const SIZE_PX: u16 = 8;

/// Advance of printable ASCII in the base table
pub const TEXT_ADVANCE: i32 = 6;
pub const SPACE_ADVANCE: i32 = 4;
pub const EMOJI_ADVANCE: i32 = 10;

pub const FLAG: [char; 2] = ['\u{1F1EE}', '\u{1F1F9}'];
pub const SMILEY: [char; 1] = ['\u{1F609}'];
pub const KEYCAP: [char; 2] = ['\u{2320}', '\u{20E3}'];

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// "A stri" + flag + "ng wit" + smiley + "h emoj" + keycap + "i"
pub fn scenario_units() -> Vec<u16> {
    encode("A stri\u{1F1EE}\u{1F1F9}ng wit\u{1F609}h emoj\u{2320}\u{20E3}i")
}

/// Scalars of the scenario that are plain text
pub const SCENARIO_LITERAL_LEN: usize = 19;
pub const SCENARIO_SPACES: i32 = 3;

pub fn scenario_width() -> i32 {
    let visible = SCENARIO_LITERAL_LEN as i32 - SCENARIO_SPACES;
    visible * TEXT_ADVANCE + SCENARIO_SPACES * SPACE_ADVANCE + 3 * EMOJI_ADVANCE
}

/// Printable ASCII as solid 4x6 boxes inside a 6 pixel advance
pub fn base_source() -> BitmapSource {
    let mut source = BitmapSource::new("test-base", SIZE_PX, LineMetrics::new(6, 2));
    let rows = ["####"; 6];
    for c in '!'..='~' {
        let glyph = BitmapGlyph::from_rows(&rows, TEXT_ADVANCE as u16)
            .unwrap()
            .with_bearing(1, 6);
        source.insert(&[c], glyph).unwrap();
    }
    source
        .insert(&[' '], BitmapGlyph::blank(SPACE_ADVANCE as u16))
        .unwrap();
    source
}

/// Flag, smiley and keycap as 8x6 outlines inside a 10 pixel advance
pub fn emoji_source() -> BitmapSource {
    let rows = [
        "########", "#......#", "#.#..#.#", "#......#", "#.####.#", "########",
    ];
    let glyph = BitmapGlyph::from_rows(&rows, EMOJI_ADVANCE as u16)
        .unwrap()
        .with_bearing(1, 6);

    let mut source = BitmapSource::new("test-emoji", SIZE_PX, LineMetrics::new(6, 2));
    for sequence in [&FLAG[..], &SMILEY[..], &KEYCAP[..]] {
        source.insert(sequence, glyph.clone()).unwrap();
    }
    source
}

pub fn resolver() -> GlyphResolver {
    GlyphResolver::new()
        .with_source(FallbackKind::Base, Arc::new(base_source()))
        .with_source(FallbackKind::Emoji, Arc::new(emoji_source()))
}

pub fn renderer_with(resolver: GlyphResolver) -> TextRenderer {
    let mut renderer = TextRenderer::with_cache(resolver, Arc::new(GlyphCache::new(64)));
    renderer.set_font_size(SIZE_PX);
    renderer
}

pub fn renderer() -> TextRenderer {
    renderer_with(resolver())
}
