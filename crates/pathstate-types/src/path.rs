//! Dotted path representation for addressing locations in a [`Tree`].
//!
//! A path such as `"foo.baz.2"` is split on `.` into segments. Each segment is
//! interpreted by the resolver as a mapping key, or as a sequence index when
//! the segment is a canonical non-negative integer and the container at that
//! level is a sequence.
//!
//! [`Tree`]: crate::Tree

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Separator between path segments.
pub const SEPARATOR: char = '.';

/// A single component of a [`StatePath`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Segment(String);

impl Segment {
    /// Create a segment from raw text.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The segment as a mapping key.
    pub fn as_key(&self) -> &str {
        &self.0
    }

    /// The segment as a sequence index.
    ///
    /// Only canonical decimal integers qualify: `"0"`, `"12"`; not `"01"`,
    /// `"+1"` or `"-1"`.
    pub fn as_index(&self) -> Option<usize> {
        let s = self.0.as_str();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if s.len() > 1 && s.starts_with('0') {
            return None;
        }
        s.parse().ok()
    }

    /// Returns `true` if the segment text is empty (e.g. from `"a..b"`).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A parsed dot-delimited path into a state tree.
///
/// Parsing never fails. The empty string is the root path, which addresses the
/// whole tree. Use [`StatePath::is_well_formed`] to reject paths with empty
/// segments before acting on them.
///
/// # Examples
///
/// ```
/// use pathstate_types::StatePath;
///
/// let path = StatePath::parse("foo.baz.2");
/// assert_eq!(path.len(), 3);
/// assert_eq!(path.segments()[2].as_index(), Some(2));
/// assert!(path.is_well_formed());
/// assert!(!StatePath::parse("foo..bar").is_well_formed());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct StatePath {
    raw: String,
    segments: Vec<Segment>,
}

impl StatePath {
    /// Parse a dotted path.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let segments = if raw.is_empty() {
            Vec::new()
        } else {
            raw.split(SEPARATOR).map(Segment::new).collect()
        };
        Self { raw, segments }
    }

    /// The root path (addresses the whole tree).
    pub fn root() -> Self {
        Self::default()
    }

    /// The original text of the path.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The parsed segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` for the root path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns `true` if the path is non-empty and has no empty segments.
    pub fn is_well_formed(&self) -> bool {
        !self.segments.is_empty() && self.segments.iter().all(|s| !s.is_empty())
    }

    /// Split into the parent segments and the final segment.
    ///
    /// Returns `None` for the root path.
    pub fn split_last(&self) -> Option<(&[Segment], &Segment)> {
        self.segments
            .split_last()
            .map(|(last, parent)| (parent, last))
    }
}

impl fmt::Display for StatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for StatePath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for StatePath {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for StatePath {
    fn from(s: String) -> Self {
        Self::parse(s)
    }
}

impl From<&StatePath> for StatePath {
    fn from(p: &StatePath) -> Self {
        p.clone()
    }
}

impl From<StatePath> for String {
    fn from(p: StatePath) -> Self {
        p.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_segments() {
        let p = StatePath::parse("foo.bar");
        assert_eq!(p.len(), 2);
        assert_eq!(p.segments()[0].as_key(), "foo");
        assert_eq!(p.segments()[1].as_key(), "bar");
        assert_eq!(p.as_str(), "foo.bar");
    }

    #[test]
    fn empty_string_is_root() {
        let p = StatePath::parse("");
        assert!(p.is_root());
        assert!(!p.is_well_formed());
        assert!(p.split_last().is_none());
    }

    #[test]
    fn index_segments_are_canonical() {
        assert_eq!(Segment::new("0").as_index(), Some(0));
        assert_eq!(Segment::new("42").as_index(), Some(42));
        assert_eq!(Segment::new("07").as_index(), None);
        assert_eq!(Segment::new("-1").as_index(), None);
        assert_eq!(Segment::new("+1").as_index(), None);
        assert_eq!(Segment::new("x1").as_index(), None);
        assert_eq!(Segment::new("").as_index(), None);
    }

    #[test]
    fn malformed_paths() {
        assert!(!StatePath::parse("a..b").is_well_formed());
        assert!(!StatePath::parse(".a").is_well_formed());
        assert!(!StatePath::parse("a.").is_well_formed());
        assert!(StatePath::parse("a.b.0").is_well_formed());
    }

    #[test]
    fn split_last_returns_parent_and_leaf() {
        let p = StatePath::parse("foo.baz.2");
        let (parent, last) = p.split_last().unwrap();
        assert_eq!(parent.len(), 2);
        assert_eq!(last.as_index(), Some(2));
    }

    #[test]
    fn serde_as_plain_string() {
        let p = StatePath::parse("foo.bar");
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "\"foo.bar\"");
        let back: StatePath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    proptest! {
        #[test]
        fn display_preserves_raw_text(raw in "[a-z0-9.]{0,24}") {
            let p = StatePath::parse(raw.clone());
            prop_assert_eq!(p.to_string(), raw);
        }

        #[test]
        fn well_formed_paths_have_no_empty_segments(
            segs in proptest::collection::vec("[a-z0-9]{1,6}", 1..6)
        ) {
            let p = StatePath::parse(segs.join("."));
            prop_assert!(p.is_well_formed());
            prop_assert_eq!(p.len(), segs.len());
        }
    }
}
