//! Grapheme segmentation
//!
//! Groups decoded scalars into the user-perceived characters that get one
//! glyph each. Joining is driven by a [`RuleTable`] rather than hard-coded
//! checks, so additional pair sequences can be configured without touching
//! the scanner.

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};
use std::fmt;
use std::ops::Range;

/// First regional indicator symbol (letter A)
pub const REGIONAL_INDICATOR_FIRST: u32 = 0x1F1E6;
/// Last regional indicator symbol (letter Z)
pub const REGIONAL_INDICATOR_LAST: u32 = 0x1F1FF;
/// COMBINING ENCLOSING KEYCAP
pub const KEYCAP_MARK: char = '\u{20E3}';

/// Inclusive range of scalar values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeRange {
    pub start: u32,
    pub end: u32,
}

impl CodeRange {
    /// Matches every scalar value
    pub const ANY: CodeRange = CodeRange::new(0, 0x10FFFF);

    pub const REGIONAL_INDICATOR: CodeRange =
        CodeRange::new(REGIONAL_INDICATOR_FIRST, REGIONAL_INDICATOR_LAST);

    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub const fn single(c: char) -> Self {
        Self::new(c as u32, c as u32)
    }

    pub fn contains(&self, c: char) -> bool {
        (self.start..=self.end).contains(&(c as u32))
    }
}

impl Default for CodeRange {
    fn default() -> Self {
        Self::ANY
    }
}

/// Join two adjacent scalars into one cluster when the first falls in
/// `first` and the second in `second`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRule {
    pub name: String,
    #[serde(default)]
    pub first: CodeRange,
    #[serde(default)]
    pub second: CodeRange,
}

impl JoinRule {
    pub fn new(name: impl Into<String>, first: CodeRange, second: CodeRange) -> Self {
        Self {
            name: name.into(),
            first,
            second,
        }
    }

    /// Two regional indicators form a flag.
    pub fn regional_indicator_pair() -> Self {
        Self::new(
            "regional-indicator",
            CodeRange::REGIONAL_INDICATOR,
            CodeRange::REGIONAL_INDICATOR,
        )
    }

    /// Any base followed by U+20E3 forms a keycap.
    pub fn keycap() -> Self {
        Self::new("keycap", CodeRange::ANY, CodeRange::single(KEYCAP_MARK))
    }

    pub fn matches(&self, current: char, next: char) -> bool {
        self.first.contains(current) && self.second.contains(next)
    }
}

/// Ordered join rules; the first matching rule wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    #[serde(default = "default_rules")]
    pub rules: Vec<JoinRule>,
}

fn default_rules() -> Vec<JoinRule> {
    vec![JoinRule::regional_indicator_pair(), JoinRule::keycap()]
}

impl RuleTable {
    /// A table that never joins; every scalar is its own cluster
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_rule(mut self, rule: JoinRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// The rule joining `current` and `next`, if any
    pub fn find(&self, current: char, next: char) -> Option<&JoinRule> {
        self.rules.iter().find(|rule| rule.matches(current, next))
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}

/// One user-perceived character: a single scalar or a joined pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GraphemeCluster {
    chars: SmallVec<[char; 2]>,
    units: Range<usize>,
}

impl GraphemeCluster {
    /// Single scalar starting at UTF-16 offset `start`
    pub fn single(c: char, start: usize) -> Self {
        Self {
            chars: smallvec![c],
            units: start..start + c.len_utf16(),
        }
    }

    /// Joined pair starting at UTF-16 offset `start`
    pub fn pair(first: char, second: char, start: usize) -> Self {
        Self {
            chars: smallvec![first, second],
            units: start..start + first.len_utf16() + second.len_utf16(),
        }
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn first(&self) -> char {
        self.chars[0]
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Clusters are never empty
    pub fn is_empty(&self) -> bool {
        false
    }

    /// True for joined pairs
    pub fn is_sequence(&self) -> bool {
        self.chars.len() > 1
    }

    /// UTF-16 unit range in the source text
    pub fn units(&self) -> Range<usize> {
        self.units.clone()
    }
}

impl fmt::Display for GraphemeCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.chars {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// Left-to-right segmenter with one scalar of lookahead
#[derive(Debug, Clone, Default)]
pub struct GraphemeSegmenter {
    rules: RuleTable,
}

impl GraphemeSegmenter {
    pub fn new(rules: RuleTable) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Split `scalars` into clusters.
    ///
    /// A scalar with no joining partner before the end of input is emitted
    /// on its own.
    pub fn segment(&self, scalars: &[char]) -> Vec<GraphemeCluster> {
        let mut clusters = Vec::with_capacity(scalars.len());
        let mut unit = 0;
        let mut i = 0;

        while i < scalars.len() {
            let current = scalars[i];
            let joined = scalars.get(i + 1).and_then(|&next| {
                self.rules.find(current, next).map(|rule| {
                    tracing::trace!(
                        "joined U+{:04X} U+{:04X} ({})",
                        current as u32,
                        next as u32,
                        rule.name
                    );
                    next
                })
            });

            let cluster = match joined {
                Some(next) => GraphemeCluster::pair(current, next, unit),
                None => GraphemeCluster::single(current, unit),
            };
            unit = cluster.units.end;
            i += cluster.len();
            clusters.push(cluster);
        }

        clusters
    }
}

/// Segment with the default flag and keycap rules.
pub fn segment(scalars: &[char]) -> Vec<GraphemeCluster> {
    GraphemeSegmenter::default().segment(scalars)
}

#[cfg(test)]
mod tests {
    use super::*;

    const IT: [char; 2] = ['\u{1F1EE}', '\u{1F1F9}'];

    #[test]
    fn test_flag_is_one_cluster() {
        let clusters = segment(&IT);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].chars(), &IT);
        assert_eq!(clusters[0].units(), 0..4);
    }

    #[test]
    fn test_keycap_is_one_cluster() {
        let clusters = segment(&['\u{2320}', KEYCAP_MARK]);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].chars(), &['\u{2320}', KEYCAP_MARK]);
        assert_eq!(clusters[0].units(), 0..2);
    }

    #[test]
    fn test_plain_text_is_one_per_scalar() {
        let clusters = segment(&['a', 'b', 'c']);
        assert_eq!(clusters.len(), 3);
        assert!(clusters.iter().all(|c| c.len() == 1));
        assert_eq!(clusters[2].units(), 2..3);
    }

    #[test]
    fn test_odd_regional_indicators() {
        // Pairs from the left; the third one stands alone.
        let scalars = ['\u{1F1EE}', '\u{1F1F9}', '\u{1F1FA}'];
        let clusters = segment(&scalars);
        assert_eq!(clusters.len(), 2);
        assert!(clusters[0].is_sequence());
        assert_eq!(clusters[1].chars(), &['\u{1F1FA}']);
        assert_eq!(clusters[1].units(), 4..6);
    }

    #[test]
    fn test_flag_wins_over_keycap() {
        // RI RI + keycap: the flag claims both indicators, the mark is left alone.
        let scalars = ['\u{1F1EE}', '\u{1F1F9}', KEYCAP_MARK];
        let clusters = segment(&scalars);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].chars(), &IT);
        assert_eq!(clusters[1].chars(), &[KEYCAP_MARK]);
    }

    #[test]
    fn test_unpaired_indicator_is_a_keycap_base() {
        // Nothing to pair with, so the keycap rule takes the indicator
        let clusters = segment(&['\u{1F1EE}', KEYCAP_MARK]);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].chars(), &['\u{1F1EE}', KEYCAP_MARK]);

        // After a flag, the third indicator is unpaired and joins the mark
        let scalars = ['\u{1F1EE}', '\u{1F1F9}', '\u{1F1FA}', KEYCAP_MARK];
        let clusters = segment(&scalars);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].chars(), &IT);
        assert_eq!(clusters[1].chars(), &['\u{1F1FA}', KEYCAP_MARK]);
        assert_eq!(clusters[1].units(), 4..7);
    }

    #[test]
    fn test_dangling_at_end() {
        let clusters = segment(&['x', '\u{1F1EE}']);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[1].chars(), &['\u{1F1EE}']);

        let clusters = segment(&['#']);
        assert_eq!(clusters.len(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(segment(&[]).is_empty());
    }

    #[test]
    fn test_custom_rule() {
        // Skin tone modifiers after a waving hand
        let rules = RuleTable::empty().with_rule(JoinRule::new(
            "emoji-modifier",
            CodeRange::single('\u{1F44B}'),
            CodeRange::new(0x1F3FB, 0x1F3FF),
        ));
        let segmenter = GraphemeSegmenter::new(rules);
        let clusters = segmenter.segment(&['\u{1F44B}', '\u{1F3FD}', '\u{1F1EE}', '\u{1F1F9}']);
        // Flags are not joined by this table.
        assert_eq!(clusters.len(), 3);
        assert!(clusters[0].is_sequence());
    }

    #[test]
    fn test_cluster_display() {
        let cluster = GraphemeCluster::pair('1', KEYCAP_MARK, 0);
        assert_eq!(cluster.to_string(), "1\u{20E3}");
    }
}
