//! Portfolio document stored as JSON
//!
//! The document plays the host list for the outline: its `chapters` array
//! holds the opaque chapter payloads in document order.

use crate::outline::{ChapterList, HeaderFooter};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reading or writing a portfolio document
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("IO error on {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Invalid portfolio document {}: {}", .0.display(), .1)]
    Json(PathBuf, #[source] serde_json::Error),
}

/// Title page plus chapter payloads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioDocument {
    /// Title of the whole portfolio, used for the cover
    #[serde(default)]
    pub title: String,

    /// Whether the document shows a cover page before the chapters
    #[serde(default, rename = "showCoverPage")]
    pub show_cover_page: bool,

    /// Portfolio-wide header switch, mirrored into every chapter
    #[serde(default, rename = "showHeader")]
    pub show_header: bool,

    /// Portfolio-wide footer switch, mirrored into every chapter
    #[serde(default, rename = "showFooter")]
    pub show_footer: bool,

    /// Chapter payloads, each carrying its `chapterHierarchy`
    #[serde(default)]
    pub chapters: Vec<Value>,
}

impl PortfolioDocument {
    /// Create an empty document
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            show_cover_page: false,
            show_header: false,
            show_footer: false,
            chapters: Vec::new(),
        }
    }

    /// Whether an export includes the cover page
    ///
    /// An explicit choice wins; otherwise `showCoverPage` decides.
    pub fn include_cover(&self, choice: Option<bool>) -> bool {
        choice.unwrap_or(self.show_cover_page)
    }

    /// Record the portfolio-wide header or footer switch
    pub fn set_header_footer(&mut self, part: HeaderFooter, state: bool) {
        match part {
            HeaderFooter::Header => self.show_header = state,
            HeaderFooter::Footer => self.show_footer = state,
        }
    }

    /// Read a document from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).map_err(|e| DocumentError::Io(path.to_path_buf(), e))?;
        serde_json::from_str(&content).map_err(|e| DocumentError::Json(path.to_path_buf(), e))
    }

    /// Write the document as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DocumentError> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| DocumentError::Json(path.to_path_buf(), e))?;
        fs::write(path, content).map_err(|e| DocumentError::Io(path.to_path_buf(), e))
    }
}

impl ChapterList for PortfolioDocument {
    fn values(&self) -> Vec<Value> {
        self.chapters.clone()
    }

    fn add_item(&mut self, initial: Option<&Value>) -> bool {
        self.chapters
            .push(initial.cloned().unwrap_or_else(|| Value::Object(Default::default())));
        true
    }

    fn remove_item(&mut self, index: usize) {
        if index < self.chapters.len() {
            self.chapters.remove(index);
        }
    }

    fn move_item(&mut self, from: usize, to: usize) {
        crate::outline::list::move_within(&mut self.chapters, from, to);
    }

    fn update_item(&mut self, index: usize, value: &Value) {
        if let Some(chapter) = self.chapters.get_mut(index) {
            *chapter = value.clone();
        }
    }
}
