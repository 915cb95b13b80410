//! Render surface used to capture chapters
//!
//! The surface displays one chapter at a time and captures the regions of
//! whatever it currently displays. Capturing is opaque to the pipeline: it
//! only sees image bytes or an error.

use super::selection::ExportSelection;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name stem of a pre-rendered cover page
pub const COVER_STEM: &str = "cover";

/// Image extensions accepted by the directory surface
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Region name of a chapter image without a `_<region>` suffix
const BARE_REGION: &str = "1";

/// Capture failures
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Render surface not ready: {0}")]
    NotReady(String),

    #[error("No rendering available for chapter {0}")]
    MissingChapter(String),

    #[error("Unknown region '{0}'")]
    UnknownRegion(String),

    #[error("IO error reading {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Per-capture switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Always produce raster (JPEG) output
    pub enforce_raster_output: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            enforce_raster_output: true,
        }
    }
}

/// Encoded image produced by a capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub bytes: Vec<u8>,
    /// File extension matching the encoding, e.g. "jpeg"
    pub extension: String,
}

/// Off-screen viewport showing one chapter at a time
#[allow(async_fn_in_trait)]
pub trait RenderSurface {
    /// Show the cover page
    async fn display_cover(&mut self) -> Result<(), CaptureError>;

    /// Capture the displayed cover page
    async fn capture_cover(&mut self, options: CaptureOptions) -> Result<CapturedImage, CaptureError>;

    /// Close cover and menu state so chapters render unobstructed
    fn close_overlays(&mut self);

    /// Show a chapter
    async fn display_chapter(&mut self, chapter: &ExportSelection) -> Result<(), CaptureError>;

    /// Capturable regions of the displayed chapter, in reading order
    fn regions(&self) -> Vec<String>;

    /// Capture one region of the displayed chapter
    async fn capture(
        &mut self,
        region: &str,
        options: CaptureOptions,
    ) -> Result<CapturedImage, CaptureError>;
}

/// Surface backed by a directory of pre-rendered images
///
/// Chapter images are named `<hierarchy>.<ext>` or `<hierarchy>_<region>.<ext>`;
/// the cover is `cover.<ext>`.
#[derive(Debug)]
pub struct DirectorySurface {
    root: PathBuf,
    quality: u8,
    current: Vec<(String, PathBuf)>,
}

impl DirectorySurface {
    pub fn new(root: impl Into<PathBuf>, quality: u8) -> Self {
        Self {
            root: root.into(),
            quality: quality.clamp(1, 100),
            current: Vec::new(),
        }
    }

    fn image_files(&self) -> Result<Vec<PathBuf>, CaptureError> {
        let entries =
            fs::read_dir(&self.root).map_err(|e| CaptureError::Io(self.root.clone(), e))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| CaptureError::Io(self.root.clone(), e))?.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
            if path.is_file() && is_image {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn read(&self, path: &Path, options: CaptureOptions) -> Result<CapturedImage, CaptureError> {
        let bytes = fs::read(path).map_err(|e| CaptureError::Io(path.to_path_buf(), e))?;

        if options.enforce_raster_output {
            return encode_jpeg(&bytes, self.quality);
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("png")
            .to_ascii_lowercase();
        Ok(CapturedImage { bytes, extension })
    }
}

impl RenderSurface for DirectorySurface {
    async fn display_cover(&mut self) -> Result<(), CaptureError> {
        let cover = self
            .image_files()?
            .into_iter()
            .find(|path| file_stem(path) == COVER_STEM)
            .ok_or_else(|| CaptureError::MissingChapter(COVER_STEM.to_string()))?;

        self.current = vec![(COVER_STEM.to_string(), cover)];
        Ok(())
    }

    async fn capture_cover(&mut self, options: CaptureOptions) -> Result<CapturedImage, CaptureError> {
        let (_, path) = self
            .current
            .first()
            .ok_or_else(|| CaptureError::NotReady("cover is not displayed".to_string()))?;
        self.read(path, options)
    }

    fn close_overlays(&mut self) {
        self.current.clear();
    }

    async fn display_chapter(&mut self, chapter: &ExportSelection) -> Result<(), CaptureError> {
        let hierarchy = chapter.hierarchy.to_string();
        let prefix = format!("{}_", hierarchy);

        let mut current: Vec<(String, PathBuf)> = Vec::new();
        for path in self.image_files()? {
            let stem = file_stem(&path);
            let region = if stem == hierarchy {
                BARE_REGION.to_string()
            } else if let Some(region) = stem.strip_prefix(&prefix) {
                region.to_string()
            } else {
                continue;
            };

            let region = unique_region(region, &current);
            current.push((region, path));
        }
        self.current = current;

        log::debug!(
            "Chapter {} has {} region(s)",
            hierarchy,
            self.current.len()
        );
        Ok(())
    }

    fn regions(&self) -> Vec<String> {
        self.current.iter().map(|(region, _)| region.clone()).collect()
    }

    async fn capture(
        &mut self,
        region: &str,
        options: CaptureOptions,
    ) -> Result<CapturedImage, CaptureError> {
        let (_, path) = self
            .current
            .iter()
            .find(|(name, _)| name == region)
            .ok_or_else(|| CaptureError::UnknownRegion(region.to_string()))?;
        self.read(path, options)
    }
}

/// `region`, or `region-2`, `region-3`, ... when the name is taken
fn unique_region(region: String, taken: &[(String, PathBuf)]) -> String {
    let is_taken = |name: &str| taken.iter().any(|(existing, _)| existing == name);
    let mut candidate = region.clone();
    let mut number = 1;
    while is_taken(&candidate) {
        number += 1;
        candidate = format!("{}-{}", region, number);
    }
    candidate
}

/// Decode any supported image and re-encode it as JPEG
pub fn encode_jpeg(bytes: &[u8], quality: u8) -> Result<CapturedImage, CaptureError> {
    let decoded = image::load_from_memory(bytes)?;
    let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());

    let mut encoded = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut encoded, quality))?;

    Ok(CapturedImage {
        bytes: encoded,
        extension: "jpeg".to_string(),
    })
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default()
        .to_string()
}
