//! UTF-16 code units to Unicode scalar values.
//!
//! Decoding is total: a surrogate that is not part of a well-formed pair
//! becomes U+FFFD and decoding carries on with the next unit.

use std::char::REPLACEMENT_CHARACTER;

/// Decode UTF-16 units, pairing surrogates.
///
/// Each replacement character stands for exactly one malformed unit, so the
/// UTF-16 length of the output always equals `units.len()`.
pub fn decode(units: &[u16]) -> Vec<char> {
    char::decode_utf16(units.iter().copied())
        .map(|r| r.unwrap_or(REPLACEMENT_CHARACTER))
        .collect()
}

/// Encode a string as UTF-16 units.
pub fn encode(text: &str) -> Vec<u16> {
    text.encode_utf16().collect()
}
