//! Paginated document packager using Typst
//!
//! Pages planned by [`layout`](super::layout) are written as Typst markup
//! with absolutely placed titles and images, then compiled to PDF.

use super::layout::{plan_pages, Element, Page, CONTENT_WIDTH_MM};
use super::pipeline::ExportEntry;
use super::PackageError;
use std::collections::HashMap;
use std::sync::OnceLock;
use typst::diag::{FileError, FileResult};
use typst::foundations::{Bytes, Datetime};
use typst::layout::PagedDocument;
use typst::syntax::{FileId, Source, VirtualPath};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, World};
use typst_kit::fonts::{FontSearcher, Fonts};

/// Title font size in points
const TITLE_FONT_SIZE_PT: u32 = 16;

/// Static library instance (created once, reused)
static LIBRARY: OnceLock<LazyHash<Library>> = OnceLock::new();

/// Embedded fonts, searched once
static FONTS: OnceLock<Fonts> = OnceLock::new();

fn library() -> &'static LazyHash<Library> {
    LIBRARY.get_or_init(|| LazyHash::new(Library::builder().build()))
}

fn fonts() -> &'static Fonts {
    FONTS.get_or_init(|| FontSearcher::new().include_system_fonts(false).search())
}

/// The World handed to the Typst compiler
///
/// Provides the generated markup, the embedded fonts and the captured
/// images under `images/<n>.<ext>`.
struct ExportWorld {
    main_source: Source,
    font_book: LazyHash<FontBook>,
    fonts: &'static Fonts,
    files: HashMap<FileId, Bytes>,
}

impl ExportWorld {
    fn new(markup: String, entries: &[ExportEntry]) -> Result<Self, PackageError> {
        let main_id = FileId::new(None, VirtualPath::new("main.typ"));
        let fonts = fonts();
        if fonts.fonts.is_empty() {
            return Err(PackageError::Compilation(
                "No fonts could be loaded".to_string(),
            ));
        }

        let files = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let id = FileId::new(None, VirtualPath::new(image_path(index, entry)));
                (id, Bytes::new(entry.image.bytes.clone()))
            })
            .collect();

        Ok(Self {
            main_source: Source::new(main_id, markup),
            font_book: LazyHash::new(fonts.book.clone()),
            fonts,
            files,
        })
    }
}

impl World for ExportWorld {
    fn library(&self) -> &LazyHash<Library> {
        library()
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &self.font_book
    }

    fn main(&self) -> FileId {
        self.main_source.id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.main_source.id() {
            Ok(self.main_source.clone())
        } else {
            Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
        }
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        self.files
            .get(&id)
            .cloned()
            .ok_or_else(|| FileError::NotFound(id.vpath().as_rootless_path().into()))
    }

    fn font(&self, index: usize) -> Option<Font> {
        self.fonts.fonts.get(index)?.get()
    }

    fn today(&self, _offset: Option<i64>) -> Option<Datetime> {
        None
    }
}

/// Lay out the entries on A4 pages and render them to PDF bytes
pub fn build_pdf(entries: &[ExportEntry]) -> Result<Vec<u8>, PackageError> {
    let pages = plan_pages(entries)?;
    let markup = generate_markup(&pages, entries);
    let world = ExportWorld::new(markup, entries)?;

    let document = typst::compile::<PagedDocument>(&world)
        .output
        .map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
            PackageError::Compilation(messages.join("\n"))
        })?;

    log::info!("Rendering PDF with {} page(s)", document.pages.len());

    typst_pdf::pdf(&document, &typst_pdf::PdfOptions::default())
        .map_err(|e| PackageError::Compilation(format!("PDF export failed: {:?}", e)))
}

fn image_path(index: usize, entry: &ExportEntry) -> String {
    format!("images/{}.{}", index, entry.image.extension)
}

fn generate_markup(pages: &[Page], entries: &[ExportEntry]) -> String {
    let mut markup = String::new();
    markup.push_str("#set page(paper: \"a4\", margin: 0mm)\n");
    markup.push_str(&format!(
        "#set text(size: {}pt, weight: \"bold\")\n\n",
        TITLE_FONT_SIZE_PT
    ));

    for (number, page) in pages.iter().enumerate() {
        if number > 0 {
            markup.push_str("#pagebreak()\n");
        }
        for element in &page.elements {
            markup.push_str(&place_element(element, entries));
        }
    }

    markup
}

fn place_element(element: &Element, entries: &[ExportEntry]) -> String {
    match element {
        Element::Title { text, x, y } => format!(
            "#place(top + left, dx: {:.2}mm, dy: {:.2}mm, box(width: {:.2}mm)[#\"{}\"])\n",
            x,
            y,
            CONTENT_WIDTH_MM,
            escape_typst_string(text)
        ),
        Element::Image {
            entry,
            x,
            y,
            width,
            height,
        } => format!(
            "#place(top + left, dx: {:.2}mm, dy: {:.2}mm, image(\"/{}\", width: {:.2}mm, height: {:.2}mm))\n",
            x,
            y,
            image_path(*entry, &entries[*entry]),
            width,
            height
        ),
    }
}

/// Escape a title for use inside a Typst string literal
///
/// Titles are never parsed as markup, so comment markers and heading or
/// list prefixes come out verbatim.
fn escape_typst_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
