//! Chapter outline: hierarchy paths, chapter records and the structural
//! operations that keep them consistent

pub mod chapter;
pub mod copy_label;
pub mod drag;
pub mod error;
pub mod hierarchy;
pub mod list;
pub mod model;
pub mod payload;

pub use chapter::Chapter;
pub use drag::{DragSession, MoveRequest};
pub use error::Rejection;
pub use hierarchy::{HierarchyPath, InvalidHierarchy};
pub use list::{ChapterList, MemoryList};
pub use model::{Capabilities, ChapterInfo, Outline, DEFAULT_MAX_DEPTH};
pub use payload::HeaderFooter;
