//! Page layout shared by the paginated packagers
//!
//! All measures are millimetres on an A4 page. Titled entries start a new
//! page; images are scaled to the content width (never enlarged) and
//! stacked until the page is full.

use super::pipeline::ExportEntry;
use super::PackageError;

pub const PAGE_WIDTH_MM: f64 = 210.0;
pub const PAGE_HEIGHT_MM: f64 = 297.0;
pub const MARGIN_MM: f64 = 10.0;
pub const CONTENT_WIDTH_MM: f64 = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
pub const CONTENT_HEIGHT_MM: f64 = PAGE_HEIGHT_MM - 2.0 * MARGIN_MM;

/// Vertical space reserved for a chapter title
pub const TITLE_HEIGHT_MM: f64 = 12.0;

/// Gap below each image
pub const SPACING_MM: f64 = 5.0;

/// Captures carry no physical size; treat them as 96 DPI
const PIXELS_PER_MM: f64 = 96.0 / 25.4;

/// Something drawn on a page, positioned from the page's top-left corner
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Title {
        text: String,
        x: f64,
        y: f64,
    },
    Image {
        /// Index into the packaged entries
        entry: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub elements: Vec<Element>,
}

impl Page {
    fn has_image(&self) -> bool {
        self.elements
            .iter()
            .any(|element| matches!(element, Element::Image { .. }))
    }
}

/// Distribute entries over pages
pub fn plan_pages(entries: &[ExportEntry]) -> Result<Vec<Page>, PackageError> {
    let mut pages = Vec::new();
    let mut page = Page::default();
    let mut cursor = 0.0;

    for (index, entry) in entries.iter().enumerate() {
        if let Some(title) = &entry.title {
            if !page.elements.is_empty() {
                pages.push(std::mem::take(&mut page));
                cursor = 0.0;
            }
            page.elements.push(Element::Title {
                text: title.clone(),
                x: MARGIN_MM,
                y: MARGIN_MM + cursor,
            });
            cursor += TITLE_HEIGHT_MM;
        }

        let (mut width, mut height) = natural_size_mm(entry)?;
        if width > CONTENT_WIDTH_MM {
            height *= CONTENT_WIDTH_MM / width;
            width = CONTENT_WIDTH_MM;
        }

        if height > CONTENT_HEIGHT_MM - cursor && page.has_image() {
            pages.push(std::mem::take(&mut page));
            cursor = 0.0;
        }

        // Shrink what still does not fit, e.g. below a title or on a fresh page
        let remaining = CONTENT_HEIGHT_MM - cursor;
        if height > remaining {
            width *= remaining / height;
            height = remaining;
        }

        page.elements.push(Element::Image {
            entry: index,
            x: MARGIN_MM + (CONTENT_WIDTH_MM - width) / 2.0,
            y: MARGIN_MM + cursor,
            width,
            height,
        });
        cursor += height + SPACING_MM;
    }

    if !page.elements.is_empty() {
        pages.push(page);
    }

    Ok(pages)
}

fn natural_size_mm(entry: &ExportEntry) -> Result<(f64, f64), PackageError> {
    let size = imagesize::blob_size(&entry.image.bytes)
        .map_err(|e| PackageError::Image(format!("{}: {}", entry.name, e)))?;
    if size.width == 0 || size.height == 0 {
        return Err(PackageError::Image(format!("{}: image is empty", entry.name)));
    }

    Ok((
        size.width as f64 / PIXELS_PER_MM,
        size.height as f64 / PIXELS_PER_MM,
    ))
}
