//! Export of chosen chapters as images, PDF or DOCX
//!
//! The pipeline drives a [`RenderSurface`] through the chosen chapters one
//! at a time, collects the captured images and hands them to one of the
//! packagers. The finished file goes to a [`Delivery`].

pub mod archive;
pub mod cancel;
pub mod delivery;
pub mod docx;
pub mod layout;
pub mod pdf;
pub mod pipeline;
pub mod selection;
pub mod surface;

pub use cancel::CancellationToken;
pub use delivery::{Delivery, DirectoryDelivery};
pub use pipeline::{
    ExportEntry, ExportEvent, ExportOutcome, ExportPipeline, ExportRequest, ExportSettings,
};
pub use selection::{select_all, select_chapters, ExportChoice, ExportSelection};
pub use surface::{CaptureError, CaptureOptions, CapturedImage, DirectorySurface, RenderSurface};

use thiserror::Error;

/// Packaging failures
#[derive(Error, Debug)]
pub enum PackageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Image error: {0}")]
    Image(String),

    #[error("Typst compilation failed: {0}")]
    Compilation(String),

    #[error("DOCX error: {0}")]
    Docx(String),
}

/// Output container for an export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// ZIP archive of the captured images
    Images,
    /// Paginated A4 document
    Pdf,
    /// Word-processor document
    Docx,
}

impl ExportFormat {
    /// File extension of the produced file
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Images => "zip",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
        }
    }

    /// Run the packager for this format
    pub fn package(self, entries: &[ExportEntry]) -> Result<Vec<u8>, PackageError> {
        match self {
            ExportFormat::Images => archive::build_archive(entries),
            ExportFormat::Pdf => pdf::build_pdf(entries),
            ExportFormat::Docx => docx::build_docx(entries),
        }
    }
}
