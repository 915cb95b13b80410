//! Translation table for user-facing strings
//!
//! Built once at startup and passed by reference to whatever needs a
//! localized string. Keys are dotted paths (`a11y.notPossible`); overrides
//! may also use `/` as separator, which is normalized to `.`.

use std::collections::HashMap;

/// Built-in English strings
const DEFAULT_STRINGS: &[(&str, &str)] = &[
    ("l10n.chapter", "Chapter"),
    ("l10n.labelCopy", "(Copy)"),
    ("l10n.cover", "Cover"),
    ("l10n.cloning", "Copying chapter"),
    ("l10n.generatingExport", "Generating export"),
    ("l10n.processingChapter", "Processing chapter @number of @of"),
    ("l10n.creatingExportFile", "Creating export file"),
    ("l10n.exportFailedDialogHeader", "Export failed"),
    (
        "l10n.exportFailed",
        "The export could not be created. Please keep this window active while exporting and try again.",
    ),
    ("l10n.nothingToExport", "The chosen chapters have no exportable content."),
    ("l10n.deleteDialogHeader", "Delete chapter?"),
    (
        "l10n.deleteDialogText",
        "Do you really want to delete this chapter? All of its contents will be lost.",
    ),
    ("l10n.deleteHiddenDialogHeader", "Delete hidden contents?"),
    (
        "l10n.deleteHiddenDialogText",
        "Do you really want to delete all hidden contents of this portfolio? They cannot be restored.",
    ),
    ("l10n.header", "Header"),
    ("l10n.footer", "Footer"),
    ("l10n.on", "on"),
    ("l10n.off", "off"),
    ("l10n.deleteDialogConfirm", "Delete"),
    ("l10n.deleteDialogCancel", "Cancel"),
    ("l10n.ok", "OK"),
    ("a11y.notPossible", "Not possible."),
    ("a11y.cannotDeleteOnlyItem", "The only chapter cannot be deleted."),
    (
        "a11y.firstChapterHierarchyFixed",
        "The first chapter must remain on the top level.",
    ),
    ("a11y.positionMinReached", "The chapter is already at the first position."),
    ("a11y.positionMaxReached", "The chapter is already at the last position."),
    ("a11y.hierarchyMinReached", "The chapter is already on level @level."),
    ("a11y.hierarchyMaxReached", "The chapter cannot go deeper than level @level."),
    ("a11y.hierarchyChangedTo", "Chapter moved to level @level."),
    ("a11y.noTopLevelChapter", "There is no top level chapter to continue from."),
    ("a11y.addItemRefused", "The chapter could not be created."),
    ("a11y.invalidChapter", "There is no such chapter."),
    ("a11y.chapterAdded", "Chapter added."),
    ("a11y.chapterDeleted", "Chapter deleted."),
    ("a11y.chapterMoved", "Chapter moved to position @position."),
    ("a11y.chapterCloned", "Chapter copied."),
    ("a11y.hiddenDeleted", "Hidden contents deleted: @count."),
    ("a11y.headerFooterChanged", "@part switched @state in @count chapters."),
    ("a11y.exportStarted", "Export started."),
    ("a11y.exportCancelled", "Export cancelled."),
    ("a11y.exportFinished", "Export finished."),
];

/// Localized string lookup
#[derive(Debug, Clone)]
pub struct Dictionary {
    strings: HashMap<String, String>,
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl Dictionary {
    /// Dictionary holding the built-in strings
    pub fn new() -> Self {
        let strings = DEFAULT_STRINGS
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Self { strings }
    }

    /// Merge translations into the dictionary, replacing existing keys
    pub fn fill<I, K, V>(&mut self, translations: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in translations {
            self.strings.insert(normalize_key(key.as_ref()), value.into());
        }
    }

    /// Look up a string; unknown keys are returned as-is so gaps stay visible
    pub fn get(&self, key: &str) -> String {
        self.strings
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// Look up a string and substitute `@name` placeholders
    pub fn format(&self, key: &str, replacements: &[(&str, String)]) -> String {
        replacements
            .iter()
            .fold(self.get(key), |text, (placeholder, value)| {
                text.replace(placeholder, value)
            })
    }
}

/// Treat `a11y/notPossible` and `a11y.notPossible` as the same key
fn normalize_key(key: &str) -> String {
    key.split(['.', '/'])
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_unknown_keys() {
        let dictionary = Dictionary::new();
        assert_eq!(dictionary.get("l10n.labelCopy"), "(Copy)");
        assert_eq!(dictionary.get("l10n.doesNotExist"), "l10n.doesNotExist");
    }

    #[test]
    fn test_fill_normalizes_keys() {
        let mut dictionary = Dictionary::new();
        dictionary.fill([("l10n/labelCopy", "(Kopie)"), ("a11y..notPossible", "Nicht möglich.")]);

        assert_eq!(dictionary.get("l10n.labelCopy"), "(Kopie)");
        assert_eq!(dictionary.get("a11y.notPossible"), "Nicht möglich.");
    }

    #[test]
    fn test_format_replaces_every_occurrence() {
        let mut dictionary = Dictionary::new();
        dictionary.fill([("test.repeat", "@n and @n of @of")]);

        let text = dictionary.format(
            "test.repeat",
            &[("@n", "2".to_string()), ("@of", "3".to_string())],
        );
        assert_eq!(text, "2 and 2 of 3");
    }
}
