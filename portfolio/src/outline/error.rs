//! Structural rejections raised by outline operations

use thiserror::Error;

/// A requested outline edit that would break a structural rule
///
/// Rejections leave the outline untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The outline would become empty
    #[error("the only chapter cannot be deleted")]
    OnlyChapter,

    /// The first position must hold a top-level chapter
    #[error("the first chapter must stay on the top level")]
    FirstChapterFixed,

    /// Move target before the first position
    #[error("chapter is already at the first position")]
    PositionMinReached,

    /// Move target past the last position
    #[error("chapter is already at the last position")]
    PositionMaxReached,

    /// Depth would drop below the top level
    #[error("chapter is already on the top level")]
    HierarchyMinReached,

    /// Depth would exceed the configured maximum
    #[error("chapter is already on the deepest level ({max})")]
    HierarchyMaxReached {
        /// Configured maximum depth
        max: usize,
    },

    /// No top-level chapter exists to number a new chapter after
    #[error("no top-level chapter to continue numbering from")]
    NoTopLevelChapter,

    /// The host list refused to create an item
    #[error("the chapter list refused to add an item")]
    HostRefused,

    /// Index outside the outline
    #[error("no chapter at index {0}")]
    InvalidIndex(usize),
}

impl Rejection {
    /// Dictionary key explaining the rejection
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::OnlyChapter => "a11y.cannotDeleteOnlyItem",
            Self::FirstChapterFixed => "a11y.firstChapterHierarchyFixed",
            Self::PositionMinReached => "a11y.positionMinReached",
            Self::PositionMaxReached => "a11y.positionMaxReached",
            Self::HierarchyMinReached => "a11y.hierarchyMinReached",
            Self::HierarchyMaxReached { .. } => "a11y.hierarchyMaxReached",
            Self::NoTopLevelChapter => "a11y.noTopLevelChapter",
            Self::HostRefused => "a11y.addItemRefused",
            Self::InvalidIndex(_) => "a11y.invalidChapter",
        }
    }

    /// Level substituted for `@level` in the message, if the message has one
    pub fn level(&self) -> Option<usize> {
        match self {
            Self::HierarchyMinReached => Some(1),
            Self::HierarchyMaxReached { max } => Some(*max),
            _ => None,
        }
    }
}
