//! Portfolio editor coordinator
//!
//! Composes the outline, the dictionary, the announcer and the export
//! pipeline. Structural rejections never escape from here: they become
//! announcements and a `None`/`false` result.

use crate::announcer::Announcer;
use crate::dictionary::Dictionary;
use crate::export::{
    select_chapters, CancellationToken, Delivery, ExportEvent, ExportFormat, ExportOutcome,
    ExportPipeline, ExportRequest, ExportSettings, RenderSurface,
};
use crate::outline::{
    Capabilities, ChapterInfo, ChapterList, DragSession, HeaderFooter, Outline, Rejection,
};

/// Yes/no question shown to the author
pub trait ConfirmDialog {
    /// Ask the question; `true` means confirmed
    fn confirm(&mut self, header: &str, text: &str) -> bool;
}

impl<F> ConfirmDialog for F
where
    F: FnMut(&str, &str) -> bool,
{
    fn confirm(&mut self, header: &str, text: &str) -> bool {
        self(header, text)
    }
}

/// Chapter editor state
#[derive(Debug)]
pub struct Portfolio<L: ChapterList> {
    outline: Outline<L>,
    dictionary: Dictionary,
    announcer: Announcer,
    drag: DragSession,
    current: usize,
    status: Option<String>,
}

impl<L: ChapterList> Portfolio<L> {
    /// Load the chapters stored in `list`
    pub fn new(list: L, max_depth: usize, dictionary: Dictionary) -> Self {
        Self {
            outline: Outline::load(list, max_depth),
            dictionary,
            announcer: Announcer::default(),
            drag: DragSession::new(),
            current: 0,
            status: None,
        }
    }

    pub fn outline(&self) -> &Outline<L> {
        &self.outline
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn announcer(&self) -> &Announcer {
        &self.announcer
    }

    /// Announcements made so far, oldest first
    pub fn take_announcements(&mut self) -> Vec<String> {
        self.announcer.take_messages()
    }

    /// Index of the displayed chapter
    pub fn current_chapter(&self) -> usize {
        self.current
    }

    /// Progress text of a running export
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn into_list(self) -> L {
        self.outline.into_list()
    }

    /// Display a chapter
    pub fn show_chapter(&mut self, index: usize) -> bool {
        if index < self.outline.len() {
            self.current = index;
            true
        } else {
            self.reject(&Rejection::InvalidIndex(index));
            false
        }
    }

    pub fn add_chapter(&mut self) -> Option<usize> {
        let index = self.apply(|outline| outline.add_chapter())?;
        self.current = index;
        self.read(&[self.dictionary.get("a11y.chapterAdded")]);
        Some(index)
    }

    /// Delete a chapter after the author confirmed it
    ///
    /// Returns `false` when the deletion is not possible or was declined.
    pub fn delete_chapter<D: ConfirmDialog>(&mut self, index: usize, dialog: &mut D) -> bool {
        if let Err(rejection) = self.outline.check_delete(index) {
            self.reject(&rejection);
            return false;
        }

        let confirmed = dialog.confirm(
            &self.dictionary.get("l10n.deleteDialogHeader"),
            &self.dictionary.get("l10n.deleteDialogText"),
        );
        if !confirmed {
            return false;
        }

        match self.apply(|outline| outline.delete_chapter(index)) {
            Some(fallback) => {
                self.current = fallback;
                self.read(&[self.dictionary.get("a11y.chapterDeleted")]);
                true
            }
            None => false,
        }
    }

    /// Delete hidden contents throughout the portfolio after confirmation
    ///
    /// Returns the number of removed items, or `None` when declined.
    pub fn delete_hidden<D: ConfirmDialog>(&mut self, dialog: &mut D) -> Option<usize> {
        let confirmed = dialog.confirm(
            &self.dictionary.get("l10n.deleteHiddenDialogHeader"),
            &self.dictionary.get("l10n.deleteHiddenDialogText"),
        );
        if !confirmed {
            return None;
        }

        let removed = self.outline.delete_hidden();
        self.read(&[self
            .dictionary
            .format("a11y.hiddenDeleted", &[("@count", removed.to_string())])]);
        Some(removed)
    }

    /// Follow the portfolio-wide header or footer switch in every chapter
    ///
    /// Returns the number of chapters that changed.
    pub fn toggle_header_footer(&mut self, part: HeaderFooter, state: bool) -> usize {
        let changed = self.outline.set_header_footer(part, state);
        if changed > 0 {
            let part_name = match part {
                HeaderFooter::Header => self.dictionary.get("l10n.header"),
                HeaderFooter::Footer => self.dictionary.get("l10n.footer"),
            };
            let state_name = self.dictionary.get(if state { "l10n.on" } else { "l10n.off" });
            self.read(&[self.dictionary.format(
                "a11y.headerFooterChanged",
                &[
                    ("@part", part_name),
                    ("@state", state_name),
                    ("@count", changed.to_string()),
                ],
            )]);
        }
        changed
    }

    pub fn move_chapter(&mut self, index: usize, offset: isize) -> Option<usize> {
        let target = self.apply(|outline| outline.move_chapter(index, offset))?;
        self.current = target;
        self.read(&[self.dictionary.format(
            "a11y.chapterMoved",
            &[("@position", (target + 1).to_string())],
        )]);
        Some(target)
    }

    /// Indent (`+1`) or outdent (`-1`) a chapter; returns the new depth
    pub fn change_hierarchy(&mut self, index: usize, offset: isize) -> Option<usize> {
        let depth = self.apply(|outline| outline.change_hierarchy(index, offset))?;
        self.read(&[self
            .dictionary
            .format("a11y.hierarchyChangedTo", &[("@level", depth.to_string())])]);
        Some(depth)
    }

    pub fn clone_chapter(&mut self, index: usize, include_subchapters: bool) -> Option<usize> {
        self.status = Some(self.dictionary.get("l10n.cloning"));
        let dictionary = &self.dictionary;
        let result = self
            .outline
            .clone_chapter(index, include_subchapters, dictionary);
        self.status = None;

        match result {
            Ok(Some(first)) => {
                self.current = first;
                self.read(&[self.dictionary.get("a11y.chapterCloned")]);
                Some(first)
            }
            Ok(None) => {
                self.reject(&Rejection::HostRefused);
                None
            }
            Err(rejection) => {
                self.reject(&rejection);
                None
            }
        }
    }

    pub fn set_label(&mut self, index: usize, label: &str) -> bool {
        self.apply(|outline| outline.set_label(index, label))
            .is_some()
    }

    pub fn capabilities(&self, index: usize) -> Option<Capabilities> {
        self.outline.capabilities(index).ok()
    }

    pub fn chapters_information(&self) -> Vec<ChapterInfo> {
        self.outline.chapters_information(&self.dictionary)
    }

    pub fn begin_drag(&mut self, index: usize) {
        self.drag.begin(index);
    }

    pub fn drag_enter(&mut self, index: usize) {
        self.drag.enter(index);
    }

    pub fn drag_leave(&mut self) {
        self.drag.leave();
    }

    /// Drop the dragged chapter; returns its new index if it moved
    pub fn end_drag(&mut self) -> Option<usize> {
        let request = self.drag.end()?;
        self.move_chapter(request.source, request.offset)
    }

    /// Build an export request from chooser checkbox states
    ///
    /// `cover_title` is set when the chooser shows a cover row first.
    pub fn export_request(
        &self,
        choices: &[bool],
        format: ExportFormat,
        cover_title: Option<&str>,
    ) -> ExportRequest {
        let choice = select_chapters(choices, &self.chapters_information(), cover_title.is_some());
        ExportRequest {
            format,
            cover: cover_title.filter(|_| choice.cover).map(str::to_string),
            chapters: choice.chapters,
        }
    }

    /// Run an export, announcing its phases
    ///
    /// A failed export is reported through `dialog` once.
    pub async fn export<S, D, C>(
        &mut self,
        request: &ExportRequest,
        settings: ExportSettings,
        surface: &mut S,
        delivery: &mut D,
        cancel: CancellationToken,
        dialog: &mut C,
    ) -> ExportOutcome
    where
        S: RenderSurface,
        D: Delivery,
        C: ConfirmDialog,
    {
        let dictionary = &self.dictionary;
        let announcer = &mut self.announcer;
        let status = &mut self.status;

        let outcome = ExportPipeline::new(settings, dictionary)
            .run(request, surface, delivery, cancel, |event| match event {
                ExportEvent::Started => {
                    *status = Some(dictionary.get("l10n.generatingExport"));
                    announcer.read(&[dictionary.get("a11y.exportStarted")]);
                }
                ExportEvent::Progress { current, total } => {
                    let text = dictionary.format(
                        "l10n.processingChapter",
                        &[("@number", current.to_string()), ("@of", total.to_string())],
                    );
                    announcer.read(&[text.as_str()]);
                    *status = Some(text);
                }
                ExportEvent::CreatingFile => {
                    let text = dictionary.get("l10n.creatingExportFile");
                    announcer.read(&[text.as_str()]);
                    *status = Some(text);
                }
                ExportEvent::Ended(_) => *status = None,
            })
            .await;

        match &outcome {
            ExportOutcome::Delivered { .. } => {
                self.read(&[self.dictionary.get("a11y.exportFinished")]);
            }
            ExportOutcome::Cancelled => {
                self.read(&[self.dictionary.get("a11y.exportCancelled")]);
            }
            ExportOutcome::NothingToExport => {
                self.read(&[self.dictionary.get("l10n.nothingToExport")]);
            }
            ExportOutcome::Failed(message) => {
                self.read(&[message.as_str()]);
                dialog.confirm(&self.dictionary.get("l10n.exportFailedDialogHeader"), message);
            }
        }

        outcome
    }

    /// Run an outline operation, announcing a rejection
    fn apply<T, F>(&mut self, operation: F) -> Option<T>
    where
        F: FnOnce(&mut Outline<L>) -> Result<T, Rejection>,
    {
        match operation(&mut self.outline) {
            Ok(value) => Some(value),
            Err(rejection) => {
                self.reject(&rejection);
                None
            }
        }
    }

    fn reject(&mut self, rejection: &Rejection) {
        log::debug!("Rejected: {}", rejection);
        let reason = match rejection.level() {
            Some(level) => self
                .dictionary
                .format(rejection.message_key(), &[("@level", level.to_string())]),
            None => self.dictionary.get(rejection.message_key()),
        };
        let not_possible = self.dictionary.get("a11y.notPossible");
        self.announcer.read(&[not_possible, reason]);
    }

    fn read<S: AsRef<str>>(&mut self, parts: &[S]) {
        self.announcer.read(parts);
    }
}
