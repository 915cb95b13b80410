//! Hierarchy path representation

use itertools::Itertools;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Separator between levels in the encoded form ("2-1-3")
pub const SEPARATOR: char = '-';

/// Error returned when a string is not a valid hierarchy path
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid hierarchy path '{0}'")]
pub struct InvalidHierarchy(pub String);

/// Position of a chapter in the outline tree
///
/// Ordering compares level by level, a missing level counting as zero, so
/// `2 < 2-1 < 2-2 < 3`. This is the document order of a valid outline.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HierarchyPath {
    /// Level numbers (e.g., [2, 1, 3] for "2-1-3")
    parts: Vec<u32>,
}

impl HierarchyPath {
    /// Parse an encoded path
    ///
    /// Accepts `positiveInt ('-' positiveInt)*` only.
    /// Examples: "1" -> [1], "2-1-3" -> [2, 1, 3]
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Option<Vec<u32>> = s.split(SEPARATOR).map(parse_level).collect();
        parts.map(|parts| Self { parts })
    }

    /// Top-level path with the given number
    pub fn top_level(number: u32) -> Self {
        Self {
            parts: vec![number],
        }
    }

    /// Build a path from raw level numbers
    ///
    /// Zeros are accepted here; they act as placeholders until the outline is
    /// renumbered.
    pub fn from_parts(parts: Vec<u32>) -> Self {
        debug_assert!(!parts.is_empty(), "hierarchy path must have a level");
        Self { parts }
    }

    /// Level numbers from the top down
    pub fn parts(&self) -> &[u32] {
        &self.parts
    }

    /// Nesting depth (1 = top level)
    pub fn depth(&self) -> usize {
        self.parts.len()
    }

    /// Number on the top level
    pub fn top(&self) -> u32 {
        self.parts.first().copied().unwrap_or(0)
    }

    /// Same path resized to `depth` levels: truncated, or padded with
    /// placeholder zeros
    pub fn resized(&self, depth: usize) -> Self {
        let mut parts = self.parts.clone();
        parts.resize(depth.max(1), 0);
        Self { parts }
    }

    /// True if `self` lies strictly below `ancestor` ("2-1" is below "2")
    pub fn is_descendant_of(&self, ancestor: &HierarchyPath) -> bool {
        self.parts.len() > ancestor.parts.len() && self.parts.starts_with(&ancestor.parts)
    }

    /// True if `self` equals `root` or lies below it
    pub fn is_within(&self, root: &HierarchyPath) -> bool {
        self == root || self.is_descendant_of(root)
    }
}

/// Parse one level: decimal digits without a leading zero
fn parse_level(part: &str) -> Option<u32> {
    if part.starts_with('0') || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

impl fmt::Display for HierarchyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts.iter().join("-"))
    }
}

impl FromStr for HierarchyPath {
    type Err = InvalidHierarchy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| InvalidHierarchy(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_paths() {
        assert_eq!(HierarchyPath::parse("1").unwrap().parts(), &[1]);
        assert_eq!(HierarchyPath::parse("2-1-3").unwrap().parts(), &[2, 1, 3]);
        assert_eq!(HierarchyPath::parse("10-12").unwrap().depth(), 2);
    }

    #[test]
    fn test_parse_rejects_grammar_violations() {
        for invalid in ["", "0", "1-0", "01", "1--2", "-1", "1-", "a", "1.2", "1 - 2"] {
            assert!(
                HierarchyPath::parse(invalid).is_none(),
                "'{}' should be rejected",
                invalid
            );
        }
    }

    #[test]
    fn test_display_joins_with_dash() {
        let path = HierarchyPath::from_parts(vec![2, 1, 3]);
        assert_eq!(path.to_string(), "2-1-3");
        assert_eq!("4-2".parse::<HierarchyPath>().unwrap().to_string(), "4-2");
    }

    #[test]
    fn test_document_order() {
        let mut paths: Vec<HierarchyPath> = ["3", "2-2", "2", "1-1-1", "2-1", "1", "10"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        paths.sort();
        let sorted: Vec<String> = paths.iter().map(ToString::to_string).collect();
        assert_eq!(sorted, ["1", "1-1-1", "2", "2-1", "2-2", "3", "10"]);
    }

    #[test]
    fn test_descendants() {
        let root: HierarchyPath = "2".parse().unwrap();
        let child: HierarchyPath = "2-1".parse().unwrap();
        let other: HierarchyPath = "21".parse().unwrap();

        assert!(child.is_descendant_of(&root));
        assert!(!root.is_descendant_of(&root));
        assert!(root.is_within(&root));
        assert!(!other.is_within(&root));
    }

    #[test]
    fn test_resized() {
        let path: HierarchyPath = "2-1".parse().unwrap();
        assert_eq!(path.resized(4).parts(), &[2, 1, 0, 0]);
        assert_eq!(path.resized(1).parts(), &[2]);
        assert_eq!(path.resized(0).depth(), 1);
    }
}
