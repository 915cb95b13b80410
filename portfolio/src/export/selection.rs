//! Chapter selection for an export

use crate::outline::{ChapterInfo, HierarchyPath};

/// One chosen chapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSelection {
    /// Position in the outline
    pub index: usize,
    pub hierarchy: HierarchyPath,
    pub title: String,
}

/// Chosen chapters plus whether the cover page was chosen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportChoice {
    pub cover: bool,
    pub chapters: Vec<ExportSelection>,
}

impl ExportChoice {
    pub fn is_empty(&self) -> bool {
        !self.cover && self.chapters.is_empty()
    }
}

/// Turn checkbox states into an ordered selection
///
/// `choices` lines up with the chooser rows. When `has_cover` is set the
/// first row is the cover page and chapter rows start at offset 1. Rows past
/// the end of `chapters` are ignored.
pub fn select_chapters(choices: &[bool], chapters: &[ChapterInfo], has_cover: bool) -> ExportChoice {
    let offset = usize::from(has_cover);
    let cover = has_cover && choices.first().copied().unwrap_or(false);

    let chapters = choices
        .iter()
        .skip(offset)
        .zip(chapters)
        .enumerate()
        .filter(|(_, (chosen, _))| **chosen)
        .map(|(index, (_, info))| ExportSelection {
            index,
            hierarchy: info.hierarchy.clone(),
            title: info.title.clone(),
        })
        .collect();

    ExportChoice { cover, chapters }
}

/// Selection of every chapter
pub fn select_all(chapters: &[ChapterInfo]) -> Vec<ExportSelection> {
    chapters
        .iter()
        .enumerate()
        .map(|(index, info)| ExportSelection {
            index,
            hierarchy: info.hierarchy.clone(),
            title: info.title.clone(),
        })
        .collect()
}
