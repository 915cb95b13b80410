//! Outline model
//!
//! Keeps the chapter list structurally valid under every edit. The outline
//! owns the chapter records and forwards each structural change to the host
//! list so both stay aligned index for index.
//!
//! Rules that hold after every successful operation:
//! - the chapter at position 0 is on the top level
//! - no chapter is deeper than `max_depth`
//! - hierarchy paths increase strictly in list order

use super::chapter::Chapter;
use super::copy_label::{base_name, copy_label, next_copy_number, replace_sub_content_ids};
use super::error::Rejection;
use super::hierarchy::HierarchyPath;
use super::list::{move_within, ChapterList};
use super::payload::{remove_hidden, set_display, HeaderFooter};
use crate::dictionary::Dictionary;
use serde_json::{json, Value};

/// Default maximum nesting depth
pub const DEFAULT_MAX_DEPTH: usize = 4;

/// Operations currently legal for one chapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub edit_label: bool,
    pub move_up: bool,
    pub move_down: bool,
    /// Outdent towards the top level
    pub hierarchy_up: bool,
    /// Indent one level deeper
    pub hierarchy_down: bool,
    pub delete: bool,
    pub clone_with_subchapters: bool,
}

/// Hierarchy and display title of a chapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterInfo {
    pub hierarchy: HierarchyPath,
    pub title: String,
}

/// Ordered chapter list bound to a host list
#[derive(Debug)]
pub struct Outline<L: ChapterList> {
    chapters: Vec<Chapter>,
    list: L,
    max_depth: usize,
}

impl<L: ChapterList> Outline<L> {
    /// Build an outline from the payloads stored in `list`
    ///
    /// Payloads without a valid hierarchy are dropped and the rest are sorted
    /// into document order; both changes are applied to the host list too.
    /// An empty list receives a single top-level chapter. Finally the first
    /// chapter is forced onto the top level, depths are capped at
    /// `max_depth` and everything is renumbered.
    pub fn load(mut list: L, max_depth: usize) -> Self {
        let max_depth = max_depth.max(1);
        let values = list.values();

        let mut chapters = Vec::with_capacity(values.len());
        let mut invalid = Vec::new();
        for (index, value) in values.into_iter().enumerate() {
            match Chapter::from_value(value) {
                Some(chapter) => chapters.push(chapter),
                None => invalid.push(index),
            }
        }
        for &index in invalid.iter().rev() {
            log::warn!("Dropping chapter {} without a valid hierarchy", index);
            list.remove_item(index);
        }

        // Stable selection sort so every step can be mirrored as a host move
        for position in 0..chapters.len() {
            let mut smallest = position;
            for candidate in position + 1..chapters.len() {
                if chapters[candidate].path < chapters[smallest].path {
                    smallest = candidate;
                }
            }
            if smallest != position {
                move_within(&mut chapters, smallest, position);
                list.move_item(smallest, position);
            }
        }

        if chapters.is_empty() {
            let chapter = Chapter::new(HierarchyPath::top_level(1));
            if list.add_item(Some(&json!({}))) {
                chapters.push(chapter);
            } else {
                log::warn!("Chapter list refused the initial chapter");
            }
        }

        if let Some(first) = chapters.first_mut() {
            if first.depth() != 1 {
                first.path = first.path.resized(1);
            }
        }
        for chapter in &mut chapters {
            if chapter.depth() > max_depth {
                chapter.path = chapter.path.resized(max_depth);
            }
        }

        let mut outline = Self {
            chapters,
            list,
            max_depth,
        };
        outline.renumber();
        outline
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn chapter(&self, index: usize) -> Option<&Chapter> {
        self.chapters.get(index)
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Host list backing this outline
    pub fn list(&self) -> &L {
        &self.list
    }

    pub fn into_list(self) -> L {
        self.list
    }

    /// Position of the chapter with the given hierarchy
    pub fn index_of(&self, hierarchy: &HierarchyPath) -> Option<usize> {
        self.chapters
            .iter()
            .position(|chapter| &chapter.path == hierarchy)
    }

    /// Recompute every hierarchy path from list order and depths alone
    ///
    /// A chapter deeper than its predecessor continues the existing counters
    /// instead of starting a fresh count at 1.
    pub fn renumber(&mut self) {
        let deepest = self.chapters.iter().map(Chapter::depth).max().unwrap_or(1);
        let mut counters = vec![1u32; deepest.max(self.max_depth)];
        let mut previous_depth = 0;

        for chapter in &mut self.chapters {
            let depth = chapter.depth();
            if depth == previous_depth {
                counters[depth - 1] += 1;
            } else if depth < previous_depth {
                counters[depth - 1] += 1;
                counters[depth..].iter_mut().for_each(|counter| *counter = 1);
            }
            previous_depth = depth;

            chapter.path = HierarchyPath::from_parts(counters[..depth].to_vec());
        }

        self.sync();
    }

    /// Append a top-level chapter numbered after the highest existing one
    pub fn add_chapter(&mut self) -> Result<usize, Rejection> {
        self.append(json!({}))
    }

    /// Remove a chapter
    ///
    /// Returns the index of the chapter to show afterwards.
    pub fn delete_chapter(&mut self, index: usize) -> Result<usize, Rejection> {
        self.check_delete(index)?;

        self.chapters.remove(index);
        self.list.remove_item(index);
        self.renumber();

        Ok(index.saturating_sub(1))
    }

    /// Whether the chapter at `index` may be deleted
    pub fn check_delete(&self, index: usize) -> Result<(), Rejection> {
        self.check_index(index)?;
        if self.chapters.len() == 1 {
            return Err(Rejection::OnlyChapter);
        }
        if index == 0 && self.chapters[1].depth() != 1 {
            return Err(Rejection::FirstChapterFixed);
        }
        Ok(())
    }

    /// Move a chapter by `offset` positions
    ///
    /// Returns the new index of the moved chapter.
    pub fn move_chapter(&mut self, source: usize, offset: isize) -> Result<usize, Rejection> {
        self.check_index(source)?;

        let target = source as isize + offset;
        if target < 0 {
            return Err(Rejection::PositionMinReached);
        }
        let target = target as usize;
        if target >= self.chapters.len() {
            return Err(Rejection::PositionMaxReached);
        }

        if target == 0 && self.chapters[source].depth() != 1 {
            return Err(Rejection::FirstChapterFixed);
        }
        if source == 0 && target > 0 && self.chapters[1].depth() != 1 {
            return Err(Rejection::FirstChapterFixed);
        }

        if source != target {
            move_within(&mut self.chapters, source, target);
            self.list.move_item(source, target);
            self.renumber();
        }

        Ok(target)
    }

    /// Change the depth of a chapter by `offset` levels (+1 indents)
    ///
    /// Returns the new depth.
    pub fn change_hierarchy(&mut self, index: usize, offset: isize) -> Result<usize, Rejection> {
        self.check_index(index)?;
        if index == 0 {
            return Err(Rejection::FirstChapterFixed);
        }

        let old_depth = self.chapters[index].depth();
        let new_depth = old_depth as isize + offset;
        if new_depth < 1 {
            return Err(Rejection::HierarchyMinReached);
        }
        let new_depth = new_depth as usize;
        if new_depth > self.max_depth {
            return Err(Rejection::HierarchyMaxReached {
                max: self.max_depth,
            });
        }

        if new_depth != old_depth {
            // Placeholder levels are replaced by the renumbering
            self.chapters[index].path = self.chapters[index].path.resized(new_depth);
            self.renumber();
        }

        Ok(new_depth)
    }

    /// Duplicate a chapter, optionally together with its subchapters
    ///
    /// Copies are labelled with the copy marker, get fresh embedded content
    /// identifiers, and are placed right after the original subtree. Returns
    /// the index of the first copy, or `None` when the host refused every
    /// copy.
    pub fn clone_chapter(
        &mut self,
        index: usize,
        include_subchapters: bool,
        dictionary: &Dictionary,
    ) -> Result<Option<usize>, Rejection> {
        self.check_index(index)?;

        let root = self.chapters[index].path.clone();
        let members: Vec<(usize, bool)> = self
            .chapters
            .iter()
            .enumerate()
            .filter(|(_, chapter)| chapter.path.is_within(&root))
            .map(|(position, chapter)| (position, chapter.path != root))
            .collect();

        let steps = self
            .chapters
            .len()
            .saturating_sub(index + members.len()) as isize;
        let copy_marker = dictionary.get("l10n.labelCopy");
        let mut first_clone = None;

        for (member, is_subchapter) in members {
            if is_subchapter && !include_subchapters {
                continue;
            }

            let depth = self.chapters[member].depth();
            let base = base_name(&self.title(member, dictionary), &copy_marker);
            let same_depth_titles: Vec<String> = (0..self.chapters.len())
                .filter(|&position| self.chapters[position].depth() == depth)
                .map(|position| self.title(position, dictionary))
                .collect();
            let number = next_copy_number(
                &base,
                same_depth_titles.iter().map(String::as_str),
                &copy_marker,
            );
            let label = copy_label(&base, number, &copy_marker);

            let mut payload = self.chapters[member].payload.clone();
            replace_sub_content_ids(&mut payload);

            let appended = match self.append(payload) {
                Ok(appended) => appended,
                Err(rejection) => {
                    log::warn!("Could not copy chapter {}: {}", member, rejection);
                    continue;
                }
            };

            for _ in 1..depth {
                self.change_hierarchy(appended, 1)?;
            }
            self.set_label(appended, &label)?;

            let placed = self.move_chapter(appended, -steps)?;
            first_clone.get_or_insert(placed);
        }

        Ok(first_clone)
    }

    /// Which operations are legal for the chapter at `index`
    pub fn capabilities(&self, index: usize) -> Result<Capabilities, Rejection> {
        self.check_index(index)?;

        let depth = self.chapters[index].depth();
        let last = self.chapters.len() - 1;
        let second_is_top_level = self
            .chapters
            .get(1)
            .is_some_and(|chapter| chapter.depth() == 1);

        Ok(Capabilities {
            edit_label: true,
            move_up: index != 0 && (index != 1 || second_is_top_level),
            move_down: index != last && (index != 0 || second_is_top_level),
            hierarchy_up: index != 0 && depth > 1,
            hierarchy_down: index != 0 && depth < self.max_depth,
            delete: index != 0 || second_is_top_level,
            clone_with_subchapters: depth < self.max_depth,
        })
    }

    /// Store a new label for a chapter
    pub fn set_label(&mut self, index: usize, label: &str) -> Result<(), Rejection> {
        self.check_index(index)?;
        self.chapters[index].set_label(label);
        self.list.update_item(index, &self.chapters[index].to_value());
        Ok(())
    }

    /// Display title, falling back to "Chapter N" (1-based)
    pub fn title(&self, index: usize, dictionary: &Dictionary) -> String {
        self.chapters
            .get(index)
            .and_then(Chapter::label)
            .map_or_else(
                || format!("{} {}", dictionary.get("l10n.chapter"), index + 1),
                str::to_string,
            )
    }

    /// Hierarchy and title of every chapter in document order
    pub fn chapters_information(&self, dictionary: &Dictionary) -> Vec<ChapterInfo> {
        self.chapters
            .iter()
            .enumerate()
            .map(|(index, chapter)| ChapterInfo {
                hierarchy: chapter.path.clone(),
                title: self.title(index, dictionary),
            })
            .collect()
    }

    /// Remove hidden content items from every chapter
    ///
    /// Returns how many items were removed in total.
    pub fn delete_hidden(&mut self) -> usize {
        self.update_payloads(remove_hidden)
    }

    /// Switch the header or footer of every chapter on or off
    ///
    /// Returns how many chapters changed.
    pub fn set_header_footer(&mut self, part: HeaderFooter, state: bool) -> usize {
        self.update_payloads(|payload| usize::from(set_display(payload, part, state)))
    }

    /// Apply `edit` to every payload, syncing the chapters it reports changes for
    fn update_payloads<F>(&mut self, mut edit: F) -> usize
    where
        F: FnMut(&mut Value) -> usize,
    {
        let mut total = 0;
        for index in 0..self.chapters.len() {
            let changes = edit(&mut self.chapters[index].payload);
            if changes > 0 {
                self.list.update_item(index, &self.chapters[index].to_value());
                total += changes;
            }
        }
        total
    }

    fn append(&mut self, payload: Value) -> Result<usize, Rejection> {
        let top = self
            .chapters
            .iter()
            .map(|chapter| chapter.path.top())
            .max()
            .ok_or(Rejection::NoTopLevelChapter)?;

        let chapter = Chapter {
            path: HierarchyPath::top_level(top + 1),
            payload,
        };
        if !self.list.add_item(Some(&chapter.to_value())) {
            return Err(Rejection::HostRefused);
        }

        self.chapters.push(chapter);
        Ok(self.chapters.len() - 1)
    }

    fn check_index(&self, index: usize) -> Result<(), Rejection> {
        if index < self.chapters.len() {
            Ok(())
        } else {
            Err(Rejection::InvalidIndex(index))
        }
    }

    fn sync(&mut self) {
        for (index, chapter) in self.chapters.iter().enumerate() {
            self.list.update_item(index, &chapter.to_value());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::list::MemoryList;

    fn outline(paths: &[&str]) -> Outline<MemoryList> {
        let items = paths
            .iter()
            .map(|path| json!({ "chapterHierarchy": path }))
            .collect();
        Outline::load(MemoryList::new(items), DEFAULT_MAX_DEPTH)
    }

    fn paths<L: ChapterList>(outline: &Outline<L>) -> Vec<String> {
        outline
            .chapters()
            .iter()
            .map(|chapter| chapter.path.to_string())
            .collect()
    }

    fn stored_paths(outline: &Outline<MemoryList>) -> Vec<String> {
        outline
            .list()
            .items()
            .iter()
            .map(|item| item["chapterHierarchy"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_load_sanitizes_and_mirrors_into_list() {
        let list = MemoryList::new(vec![
            json!({ "chapterHierarchy": "2", "tag": "b" }),
            json!({ "chapterHierarchy": "x" }),
            json!({ "chapterHierarchy": "1-1", "tag": "a1" }),
            json!({ "tag": "missing" }),
            json!({ "chapterHierarchy": "1", "tag": "a" }),
        ]);
        let outline = Outline::load(list, DEFAULT_MAX_DEPTH);

        assert_eq!(paths(&outline), ["1", "1-1", "2"]);
        assert_eq!(stored_paths(&outline), ["1", "1-1", "2"]);
        let tags: Vec<_> = outline
            .list()
            .items()
            .iter()
            .map(|item| item["tag"].as_str().unwrap())
            .collect();
        assert_eq!(tags, ["a", "a1", "b"]);
    }

    #[test]
    fn test_load_empty_inserts_first_chapter() {
        let outline = Outline::load(MemoryList::default(), DEFAULT_MAX_DEPTH);
        assert_eq!(paths(&outline), ["1"]);
        assert_eq!(stored_paths(&outline), ["1"]);
    }

    #[test]
    fn test_load_caps_depth_and_fixes_first_chapter() {
        let list = MemoryList::new(vec![
            json!({ "chapterHierarchy": "1-2" }),
            json!({ "chapterHierarchy": "2-1-1-1" }),
        ]);
        let outline = Outline::load(list, 2);
        assert_eq!(paths(&outline), ["1", "1-1"]);
    }

    #[test]
    fn test_renumber_keeps_counters_when_going_deeper() {
        let mut outline = outline(&["1", "1-1", "1-1-1", "3", "7-4", "7-5"]);
        assert_eq!(paths(&outline), ["1", "1-1", "1-1-1", "2", "2-1", "2-2"]);

        let before = paths(&outline);
        outline.renumber();
        assert_eq!(paths(&outline), before);
    }

    #[test]
    fn test_add_chapter_numbers_after_highest_top_level() {
        let mut outline = outline(&["1", "1-1"]);
        assert_eq!(outline.add_chapter(), Ok(2));
        assert_eq!(paths(&outline), ["1", "1-1", "2"]);
        assert_eq!(stored_paths(&outline), ["1", "1-1", "2"]);
    }

    #[test]
    fn test_delete_rules() {
        let mut single = outline(&["1"]);
        assert_eq!(single.delete_chapter(0), Err(Rejection::OnlyChapter));

        let mut nested = outline(&["1", "1-1", "2"]);
        assert_eq!(nested.delete_chapter(0), Err(Rejection::FirstChapterFixed));
        assert_eq!(nested.delete_chapter(5), Err(Rejection::InvalidIndex(5)));

        assert_eq!(nested.delete_chapter(1), Ok(0));
        assert_eq!(paths(&nested), ["1", "2"]);
        assert_eq!(nested.delete_chapter(0), Ok(0));
        assert_eq!(paths(&nested), ["1"]);
        assert_eq!(stored_paths(&nested), ["1"]);
    }

    #[test]
    fn test_move_rules() {
        let mut outline = outline(&["1", "1-1", "2"]);
        assert_eq!(outline.move_chapter(0, -1), Err(Rejection::PositionMinReached));
        assert_eq!(outline.move_chapter(2, 1), Err(Rejection::PositionMaxReached));
        assert_eq!(outline.move_chapter(1, -1), Err(Rejection::FirstChapterFixed));
        assert_eq!(outline.move_chapter(0, 1), Err(Rejection::FirstChapterFixed));

        outline.set_label(2, "Last").unwrap();
        assert_eq!(outline.move_chapter(2, -1), Ok(1));
        assert_eq!(paths(&outline), ["1", "2", "2-1"]);
        assert_eq!(outline.chapter(1).unwrap().label(), Some("Last"));
        assert_eq!(outline.list().items()[1]["content"]["metadata"]["title"], "Last");
    }

    #[test]
    fn test_move_is_reversible() {
        let mut outline = outline(&["1", "2", "3"]);
        for index in 0..3 {
            outline.set_label(index, &format!("C{}", index)).unwrap();
        }
        let labels = |outline: &Outline<MemoryList>| -> Vec<String> {
            outline
                .chapters()
                .iter()
                .map(|chapter| chapter.label().unwrap().to_string())
                .collect()
        };
        let before = labels(&outline);

        assert_eq!(outline.move_chapter(0, 1), Ok(1));
        assert_eq!(labels(&outline), ["C1", "C0", "C2"]);
        assert_eq!(outline.move_chapter(1, -1), Ok(0));
        assert_eq!(labels(&outline), before);
    }

    #[test]
    fn test_change_hierarchy_bounds() {
        let mut outline = outline(&["1", "2"]);
        assert_eq!(outline.change_hierarchy(0, 1), Err(Rejection::FirstChapterFixed));
        assert_eq!(outline.change_hierarchy(1, -1), Err(Rejection::HierarchyMinReached));

        for depth in 2..=DEFAULT_MAX_DEPTH {
            assert_eq!(outline.change_hierarchy(1, 1), Ok(depth));
        }
        assert_eq!(
            outline.change_hierarchy(1, 1),
            Err(Rejection::HierarchyMaxReached {
                max: DEFAULT_MAX_DEPTH
            })
        );
        assert_eq!(paths(&outline), ["1", "1-1-1-1"]);

        assert_eq!(outline.change_hierarchy(1, -3), Ok(1));
        assert_eq!(paths(&outline), ["1", "2"]);
    }

    #[test]
    fn test_clone_single_chapter() {
        let dictionary = Dictionary::new();
        let mut outline = outline(&["1", "1-1", "2"]);
        outline.set_label(0, "Intro").unwrap();

        assert_eq!(outline.clone_chapter(0, false, &dictionary), Ok(Some(2)));
        assert_eq!(paths(&outline), ["1", "1-1", "2", "3"]);
        assert_eq!(outline.chapter(2).unwrap().label(), Some("Intro (Copy)"));

        assert_eq!(outline.clone_chapter(0, false, &dictionary), Ok(Some(2)));
        assert_eq!(outline.chapter(2).unwrap().label(), Some("Intro (Copy) (2)"));
        assert_eq!(outline.len(), 5);
    }

    #[test]
    fn test_clone_with_subchapters() {
        let dictionary = Dictionary::new();
        let mut outline = outline(&["1", "1-1", "1-1-1", "2"]);
        outline.set_label(0, "Intro").unwrap();
        outline.set_label(1, "Details").unwrap();

        assert_eq!(outline.clone_chapter(0, true, &dictionary), Ok(Some(3)));
        assert_eq!(paths(&outline), ["1", "1-1", "1-1-1", "2", "2-1", "2-1-1", "3"]);
        assert_eq!(stored_paths(&outline), paths(&outline));
        assert_eq!(outline.chapter(3).unwrap().label(), Some("Intro (Copy)"));
        assert_eq!(outline.chapter(4).unwrap().label(), Some("Details (Copy)"));
        assert_eq!(outline.chapter(5).unwrap().label(), Some("Chapter 3 (Copy)"));
    }

    #[test]
    fn test_capabilities() {
        let outline = outline(&["1", "1-1", "2"]);

        let first = outline.capabilities(0).unwrap();
        assert!(first.edit_label);
        assert!(!first.move_up);
        assert!(!first.move_down);
        assert!(!first.delete);
        assert!(!first.hierarchy_up);
        assert!(!first.hierarchy_down);

        let second = outline.capabilities(1).unwrap();
        assert!(!second.move_up);
        assert!(second.move_down);
        assert!(second.hierarchy_up);
        assert!(second.hierarchy_down);
        assert!(second.delete);

        let last = outline.capabilities(2).unwrap();
        assert!(last.move_up);
        assert!(!last.move_down);
        assert!(last.clone_with_subchapters);

        assert_eq!(outline.capabilities(3), Err(Rejection::InvalidIndex(3)));
    }

    #[test]
    fn test_title_fallback() {
        let dictionary = Dictionary::new();
        let mut outline = outline(&["1", "2"]);
        outline.set_label(1, "Results").unwrap();

        let info = outline.chapters_information(&dictionary);
        assert_eq!(info[0].title, "Chapter 1");
        assert_eq!(info[1].title, "Results");
        assert_eq!(info[1].hierarchy.to_string(), "2");
        assert_eq!(outline.index_of(&"2".parse().unwrap()), Some(1));
    }

    #[test]
    fn test_delete_hidden_updates_list() {
        let list = MemoryList::new(vec![
            json!({ "chapterHierarchy": "1", "items": [{ "isHidden": true }, { "text": "a" }] }),
            json!({ "chapterHierarchy": "2", "items": [{ "text": "b" }] }),
            json!({ "chapterHierarchy": "3", "items": [{ "isHidden": true }, { "isHidden": true }] }),
        ]);
        let mut outline = Outline::load(list, DEFAULT_MAX_DEPTH);

        assert_eq!(outline.delete_hidden(), 3);
        let items = outline.list().items();
        assert_eq!(items[0]["items"], json!([{ "text": "a" }]));
        assert_eq!(items[1]["items"], json!([{ "text": "b" }]));
        assert_eq!(items[2]["items"], json!([]));
        assert_eq!(items[2]["chapterHierarchy"], "3");
        assert_eq!(stored_paths(&outline), ["1", "2", "3"]);
    }

    #[test]
    fn test_set_header_footer_reaches_every_chapter() {
        let mut outline = outline(&["1", "1-1", "2"]);

        assert_eq!(outline.set_header_footer(HeaderFooter::Footer, true), 3);
        assert_eq!(outline.set_header_footer(HeaderFooter::Footer, true), 0);
        assert!(outline
            .list()
            .items()
            .iter()
            .all(|item| item["displayFooter"] == true && item.get("displayHeader").is_none()));
    }
}
