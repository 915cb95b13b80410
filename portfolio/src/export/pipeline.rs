//! Export pipeline
//!
//! One export run walks the chosen chapters strictly in document order: the
//! render surface can only show one chapter at a time. Every capture gets a
//! bounded number of attempts; a capture that keeps failing aborts the whole
//! run with a single message. Cancellation is cooperative and checked
//! between steps; a cancelled run discards what it captured and delivers
//! nothing.

use super::cancel::CancellationToken;
use super::delivery::{export_filename, sanitize_filename, timestamp_millis, Delivery};
use super::selection::ExportSelection;
use super::surface::{CaptureError, CaptureOptions, CapturedImage, RenderSurface};
use super::ExportFormat;
use crate::dictionary::Dictionary;
use std::fmt;
use std::time::Duration;

/// Timing and naming of an export run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSettings {
    /// Pause before anything is rendered
    pub start_delay: Duration,
    /// Pause after switching chapters
    pub settle_delay: Duration,
    /// Pause between capture attempts
    pub retry_delay: Duration,
    /// Capture attempts per region
    pub max_attempts: u32,
    /// Prefix of the delivered file name
    pub filename_prefix: String,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            start_delay: Duration::from_millis(100),
            settle_delay: Duration::from_millis(500),
            retry_delay: Duration::from_millis(2500),
            max_attempts: 3,
            filename_prefix: "H5P.Portfolio-Export".to_string(),
        }
    }
}

/// What to export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub format: ExportFormat,
    /// Title of the cover page, when the cover was chosen
    pub cover: Option<String>,
    /// Chosen chapters in document order
    pub chapters: Vec<ExportSelection>,
}

/// One captured image waiting to be packaged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportEntry {
    /// Set on the first image of a chapter (and on the cover)
    pub title: Option<String>,
    /// File name inside an archive
    pub name: String,
    pub image: CapturedImage,
}

/// Progress notifications emitted during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportEvent {
    Started,
    /// About to process chapter `current` (1-based) of `total`
    Progress { current: usize, total: usize },
    CreatingFile,
    /// Run finished; carries the failure message if it failed
    Ended(Option<String>),
}

/// Result of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Delivered { filename: String },
    Cancelled,
    /// The chosen chapters produced no images
    NothingToExport,
    Failed(String),
}

/// Why collecting stopped early
enum Stop {
    Cancelled,
    Failed,
}

#[derive(Clone, Copy)]
enum Target<'a> {
    Cover,
    Region(&'a ExportSelection, &'a str),
}

impl fmt::Display for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Cover => write!(f, "cover"),
            Target::Region(chapter, region) => {
                write!(f, "chapter {} region {}", chapter.hierarchy, region)
            }
        }
    }
}

/// Drives one export run at a time
#[derive(Debug, Clone)]
pub struct ExportPipeline<'a> {
    settings: ExportSettings,
    dictionary: &'a Dictionary,
}

impl<'a> ExportPipeline<'a> {
    pub fn new(settings: ExportSettings, dictionary: &'a Dictionary) -> Self {
        Self {
            settings,
            dictionary,
        }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Capture, package and deliver the requested chapters
    ///
    /// `on_event` sees `Started` first and `Ended` last, exactly once each.
    pub async fn run<S, D, F>(
        &self,
        request: &ExportRequest,
        surface: &mut S,
        delivery: &mut D,
        cancel: CancellationToken,
        mut on_event: F,
    ) -> ExportOutcome
    where
        S: RenderSurface,
        D: Delivery,
        F: FnMut(ExportEvent),
    {
        on_event(ExportEvent::Started);
        let outcome = self
            .export(request, surface, delivery, &cancel, &mut on_event)
            .await;

        let message = match &outcome {
            ExportOutcome::Failed(message) => Some(message.clone()),
            _ => None,
        };
        on_event(ExportEvent::Ended(message));

        outcome
    }

    async fn export<S, D, F>(
        &self,
        request: &ExportRequest,
        surface: &mut S,
        delivery: &mut D,
        cancel: &CancellationToken,
        on_event: &mut F,
    ) -> ExportOutcome
    where
        S: RenderSurface,
        D: Delivery,
        F: FnMut(ExportEvent),
    {
        let entries = match self.collect(request, surface, cancel, on_event).await {
            Ok(entries) => entries,
            Err(Stop::Cancelled) => return self.cancelled(),
            Err(Stop::Failed) => return self.failed(),
        };

        on_event(ExportEvent::CreatingFile);
        if cancel.is_cancelled() {
            return self.cancelled();
        }
        if entries.is_empty() {
            log::info!("Chosen chapters have nothing to export");
            return ExportOutcome::NothingToExport;
        }

        let format = request.format;
        let count = entries.len();
        let packaged = tokio::task::spawn_blocking(move || format.package(&entries)).await;
        let bytes = match packaged {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(error)) => {
                log::error!("Packaging {} image(s) failed: {}", count, error);
                return self.failed();
            }
            Err(error) => {
                log::error!("Packaging task failed: {}", error);
                return self.failed();
            }
        };

        if cancel.is_cancelled() {
            return self.cancelled();
        }

        let filename = export_filename(
            &self.settings.filename_prefix,
            format.extension(),
            timestamp_millis(),
        );
        if let Err(error) = delivery.offer_download(bytes, &filename) {
            log::error!("Could not deliver {}: {}", filename, error);
            return self.failed();
        }

        ExportOutcome::Delivered { filename }
    }

    async fn collect<S, F>(
        &self,
        request: &ExportRequest,
        surface: &mut S,
        cancel: &CancellationToken,
        on_event: &mut F,
    ) -> Result<Vec<ExportEntry>, Stop>
    where
        S: RenderSurface,
        F: FnMut(ExportEvent),
    {
        let mut entries = Vec::new();

        tokio::time::sleep(self.settings.start_delay).await;
        if cancel.is_cancelled() {
            return Err(Stop::Cancelled);
        }

        if let Some(cover_title) = &request.cover {
            if let Err(error) = surface.display_cover().await {
                log::error!("Could not display cover: {}", error);
                return Err(Stop::Failed);
            }
            tokio::time::sleep(self.settings.settle_delay).await;

            let image = self.capture(surface, Target::Cover, cancel).await?;
            entries.push(ExportEntry {
                title: Some(cover_title.clone()),
                name: format!("{}.{}", sanitize_filename(cover_title), image.extension),
                image,
            });
        }

        surface.close_overlays();

        let total = request.chapters.len();
        for (position, chapter) in request.chapters.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(Stop::Cancelled);
            }
            on_event(ExportEvent::Progress {
                current: position + 1,
                total,
            });

            if let Err(error) = surface.display_chapter(chapter).await {
                log::error!("Could not display chapter {}: {}", chapter.hierarchy, error);
                return Err(Stop::Failed);
            }
            tokio::time::sleep(self.settings.settle_delay).await;

            let regions = surface.regions();
            if regions.is_empty() {
                log::info!("Chapter {} has no exportable content", chapter.hierarchy);
                continue;
            }

            for (number, region) in regions.iter().enumerate() {
                let image = self
                    .capture(surface, Target::Region(chapter, region), cancel)
                    .await?;
                entries.push(ExportEntry {
                    title: (number == 0).then(|| chapter.title.clone()),
                    name: format!("{}_{}.{}", chapter.hierarchy, region, image.extension),
                    image,
                });
            }
        }

        Ok(entries)
    }

    /// Capture with bounded retries
    async fn capture<S: RenderSurface>(
        &self,
        surface: &mut S,
        target: Target<'_>,
        cancel: &CancellationToken,
    ) -> Result<CapturedImage, Stop> {
        let options = CaptureOptions {
            enforce_raster_output: true,
        };
        let max_attempts = self.settings.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            let result: Result<CapturedImage, CaptureError> = match target {
                Target::Cover => surface.capture_cover(options).await,
                Target::Region(_, region) => surface.capture(region, options).await,
            };

            match result {
                Ok(image) => return Ok(image),
                Err(error) => {
                    log::warn!(
                        "Capturing {} failed (attempt {}/{}): {}",
                        target,
                        attempt,
                        max_attempts,
                        error
                    );
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(self.settings.retry_delay).await;
                if cancel.is_cancelled() {
                    return Err(Stop::Cancelled);
                }
            }
        }

        log::error!("Giving up on {} after {} attempts", target, max_attempts);
        Err(Stop::Failed)
    }

    fn cancelled(&self) -> ExportOutcome {
        log::info!("Export cancelled");
        ExportOutcome::Cancelled
    }

    fn failed(&self) -> ExportOutcome {
        ExportOutcome::Failed(self.dictionary.get("l10n.exportFailed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Surface whose captures fail a scripted number of times
    #[derive(Default)]
    struct ScriptedSurface {
        regions: HashMap<String, Vec<String>>,
        current: Vec<String>,
        failures_left: usize,
        always_fail: bool,
        cancel_on_failure: Option<CancellationToken>,
        displayed: Vec<String>,
        attempts: usize,
        overlays_closed: bool,
    }

    impl ScriptedSurface {
        fn with_chapters(chapters: &[(&str, &[&str])]) -> Self {
            Self {
                regions: chapters
                    .iter()
                    .map(|(hierarchy, regions)| {
                        (
                            hierarchy.to_string(),
                            regions.iter().map(|r| r.to_string()).collect(),
                        )
                    })
                    .collect(),
                ..Self::default()
            }
        }

        fn attempt(&mut self) -> Result<CapturedImage, CaptureError> {
            self.attempts += 1;
            if self.always_fail || self.failures_left > 0 {
                self.failures_left = self.failures_left.saturating_sub(1);
                if let Some(token) = &self.cancel_on_failure {
                    token.cancel();
                }
                return Err(CaptureError::NotReady("still rendering".to_string()));
            }
            Ok(CapturedImage {
                bytes: vec![0xff, 0xd8, 0xff],
                extension: "jpeg".to_string(),
            })
        }
    }

    impl RenderSurface for ScriptedSurface {
        async fn display_cover(&mut self) -> Result<(), CaptureError> {
            self.displayed.push("cover".to_string());
            Ok(())
        }

        async fn capture_cover(
            &mut self,
            _options: CaptureOptions,
        ) -> Result<CapturedImage, CaptureError> {
            self.attempt()
        }

        fn close_overlays(&mut self) {
            self.overlays_closed = true;
        }

        async fn display_chapter(&mut self, chapter: &ExportSelection) -> Result<(), CaptureError> {
            let hierarchy = chapter.hierarchy.to_string();
            self.current = self.regions.get(&hierarchy).cloned().unwrap_or_default();
            self.displayed.push(hierarchy);
            Ok(())
        }

        fn regions(&self) -> Vec<String> {
            self.current.clone()
        }

        async fn capture(
            &mut self,
            _region: &str,
            options: CaptureOptions,
        ) -> Result<CapturedImage, CaptureError> {
            assert!(options.enforce_raster_output);
            self.attempt()
        }
    }

    #[derive(Default)]
    struct RecordingDelivery {
        files: Vec<(String, Vec<u8>)>,
    }

    impl Delivery for RecordingDelivery {
        fn offer_download(&mut self, bytes: Vec<u8>, filename: &str) -> std::io::Result<()> {
            self.files.push((filename.to_string(), bytes));
            Ok(())
        }
    }

    fn immediate() -> ExportSettings {
        ExportSettings {
            start_delay: Duration::ZERO,
            settle_delay: Duration::ZERO,
            retry_delay: Duration::ZERO,
            ..ExportSettings::default()
        }
    }

    fn selection(index: usize, hierarchy: &str, title: &str) -> ExportSelection {
        ExportSelection {
            index,
            hierarchy: hierarchy.parse().unwrap(),
            title: title.to_string(),
        }
    }

    fn request(format: ExportFormat) -> ExportRequest {
        ExportRequest {
            format,
            cover: None,
            chapters: vec![
                selection(0, "1", "Intro"),
                selection(1, "1-1", "Details"),
                selection(2, "2", "Outro"),
            ],
        }
    }

    #[tokio::test]
    async fn test_cancelled_before_start_delivers_nothing() {
        let dictionary = Dictionary::new();
        let pipeline = ExportPipeline::new(immediate(), &dictionary);
        let mut surface = ScriptedSurface::with_chapters(&[("1", &["a"])]);
        let mut delivery = RecordingDelivery::default();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut events = Vec::new();
        let outcome = pipeline
            .run(
                &request(ExportFormat::Images),
                &mut surface,
                &mut delivery,
                cancel,
                |event| events.push(event),
            )
            .await;

        assert_eq!(outcome, ExportOutcome::Cancelled);
        assert_eq!(events, [ExportEvent::Started, ExportEvent::Ended(None)]);
        assert!(delivery.files.is_empty());
        assert!(surface.displayed.is_empty());
    }

    #[tokio::test]
    async fn test_two_failures_are_retried() {
        let dictionary = Dictionary::new();
        let pipeline = ExportPipeline::new(immediate(), &dictionary);
        let mut surface = ScriptedSurface::with_chapters(&[("1", &["a"]), ("2", &["a"])]);
        surface.failures_left = 2;
        let mut delivery = RecordingDelivery::default();

        let mut events = Vec::new();
        let outcome = pipeline
            .run(
                &request(ExportFormat::Images),
                &mut surface,
                &mut delivery,
                CancellationToken::new(),
                |event| events.push(event),
            )
            .await;

        assert!(matches!(outcome, ExportOutcome::Delivered { .. }));
        assert_eq!(surface.attempts, 4);
        assert_eq!(events.last(), Some(&ExportEvent::Ended(None)));
        assert_eq!(delivery.files.len(), 1);
        assert!(delivery.files[0].0.starts_with("H5P.Portfolio-Export-"));
        assert!(delivery.files[0].0.ends_with(".zip"));
    }

    #[tokio::test]
    async fn test_exhausted_retries_fail_once() {
        let dictionary = Dictionary::new();
        let pipeline = ExportPipeline::new(immediate(), &dictionary);
        let mut surface = ScriptedSurface::with_chapters(&[("1", &["a"]), ("2", &["a"])]);
        surface.always_fail = true;
        let mut delivery = RecordingDelivery::default();

        let mut events = Vec::new();
        let outcome = pipeline
            .run(
                &request(ExportFormat::Images),
                &mut surface,
                &mut delivery,
                CancellationToken::new(),
                |event| events.push(event),
            )
            .await;

        let message = dictionary.get("l10n.exportFailed");
        assert_eq!(outcome, ExportOutcome::Failed(message.clone()));
        assert_eq!(surface.attempts, 3);
        assert_eq!(surface.displayed, ["1"]);
        let failures = events
            .iter()
            .filter(|event| matches!(event, ExportEvent::Ended(Some(_))))
            .count();
        assert_eq!(failures, 1);
        assert_eq!(events.last(), Some(&ExportEvent::Ended(Some(message))));
        assert!(delivery.files.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_during_retry() {
        let dictionary = Dictionary::new();
        let pipeline = ExportPipeline::new(immediate(), &dictionary);
        let cancel = CancellationToken::new();
        let mut surface = ScriptedSurface::with_chapters(&[("1", &["a"])]);
        surface.always_fail = true;
        surface.cancel_on_failure = Some(cancel.clone());
        let mut delivery = RecordingDelivery::default();

        let outcome = pipeline
            .run(
                &request(ExportFormat::Images),
                &mut surface,
                &mut delivery,
                cancel,
                |_| {},
            )
            .await;

        assert_eq!(outcome, ExportOutcome::Cancelled);
        assert_eq!(surface.attempts, 1);
        assert!(delivery.files.is_empty());
    }

    #[tokio::test]
    async fn test_entries_and_progress() {
        let dictionary = Dictionary::new();
        let pipeline = ExportPipeline::new(immediate(), &dictionary);
        let mut surface =
            ScriptedSurface::with_chapters(&[("1", &["a", "b"]), ("2", &["main"])]);
        let mut delivery = RecordingDelivery::default();

        let mut request = request(ExportFormat::Images);
        request.cover = Some("Field Trip: Day 1".to_string());

        let mut events = Vec::new();
        let outcome = pipeline
            .run(
                &request,
                &mut surface,
                &mut delivery,
                CancellationToken::new(),
                |event| events.push(event),
            )
            .await;
        assert!(matches!(outcome, ExportOutcome::Delivered { .. }));
        assert!(surface.overlays_closed);
        assert_eq!(surface.displayed, ["cover", "1", "1-1", "2"]);

        assert_eq!(
            events,
            [
                ExportEvent::Started,
                ExportEvent::Progress { current: 1, total: 3 },
                ExportEvent::Progress { current: 2, total: 3 },
                ExportEvent::Progress { current: 3, total: 3 },
                ExportEvent::CreatingFile,
                ExportEvent::Ended(None),
            ]
        );

        let bytes = delivery.files[0].1.clone();
        let archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        let mut names: Vec<_> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(
            names,
            ["1_a.jpeg", "1_b.jpeg", "2_main.jpeg", "field trip- day 1.jpeg"]
        );
    }

    #[tokio::test]
    async fn test_titles_only_on_first_region() {
        let dictionary = Dictionary::new();
        let pipeline = ExportPipeline::new(immediate(), &dictionary);
        let mut surface = ScriptedSurface::with_chapters(&[("1", &["a", "b"])]);
        let cancel = CancellationToken::new();

        let mut events = Vec::new();
        let entries = match pipeline
            .collect(
                &request(ExportFormat::Images),
                &mut surface,
                &cancel,
                &mut |event| events.push(event),
            )
            .await
        {
            Ok(entries) => entries,
            Err(_) => panic!("collecting should succeed"),
        };

        let titles: Vec<_> = entries.iter().map(|entry| entry.title.as_deref()).collect();
        assert_eq!(titles, [Some("Intro"), None]);
    }

    #[tokio::test]
    async fn test_nothing_to_export() {
        let dictionary = Dictionary::new();
        let pipeline = ExportPipeline::new(immediate(), &dictionary);
        let mut surface = ScriptedSurface::default();
        let mut delivery = RecordingDelivery::default();

        let outcome = pipeline
            .run(
                &request(ExportFormat::Pdf),
                &mut surface,
                &mut delivery,
                CancellationToken::new(),
                |_| {},
            )
            .await;

        assert_eq!(outcome, ExportOutcome::NothingToExport);
        assert!(delivery.files.is_empty());
    }
}
