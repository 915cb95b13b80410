//! Word-processor document packager using docx-rs

use super::layout::{plan_pages, Element, MARGIN_MM, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use super::pipeline::ExportEntry;
use super::PackageError;
use docx_rs::{
    AlignmentType, BreakType, Docx, PageMargin, Paragraph, Pic, Run, Style, StyleType,
};
use std::io::Cursor;

/// EMUs (English Metric Units) per millimetre
const EMUS_PER_MM: f64 = 36_000.0;

/// Twentieths of a point per millimetre
const TWIPS_PER_MM: f64 = 1440.0 / 25.4;

const HEADING_STYLE: &str = "Heading1";

/// Lay out the entries on A4 pages and produce a .docx file
///
/// Titles become headings; every planned page after the first starts with
/// a page break.
pub fn build_docx(entries: &[ExportEntry]) -> Result<Vec<u8>, PackageError> {
    let pages = plan_pages(entries)?;

    let margin = mm_to_twips(MARGIN_MM) as i32;
    let mut docx = Docx::new()
        .page_size(mm_to_twips(PAGE_WIDTH_MM), mm_to_twips(PAGE_HEIGHT_MM))
        .page_margin(
            PageMargin::new()
                .top(margin)
                .bottom(margin)
                .left(margin)
                .right(margin),
        )
        .add_style(
            Style::new(HEADING_STYLE, StyleType::Paragraph)
                .name("Heading 1")
                .bold()
                .size(32), // half-points
        );

    for (number, page) in pages.iter().enumerate() {
        for (position, element) in page.elements.iter().enumerate() {
            let mut paragraph = Paragraph::new();
            if number > 0 && position == 0 {
                paragraph = paragraph.add_run(Run::new().add_break(BreakType::Page));
            }

            paragraph = match element {
                Element::Title { text, .. } => paragraph
                    .style(HEADING_STYLE)
                    .add_run(Run::new().add_text(text)),
                Element::Image {
                    entry,
                    width,
                    height,
                    ..
                } => {
                    let pic = Pic::new(&entries[*entry].image.bytes)
                        .size(mm_to_emus(*width), mm_to_emus(*height));
                    paragraph
                        .align(AlignmentType::Center)
                        .add_run(Run::new().add_image(pic))
                }
            };
            docx = docx.add_paragraph(paragraph);
        }
    }

    log::info!("Writing DOCX with {} page(s)", pages.len());

    let mut buffer = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .map_err(|e| PackageError::Docx(format!("Failed to write DOCX: {}", e)))?;

    Ok(buffer.into_inner())
}

fn mm_to_emus(mm: f64) -> u32 {
    (mm * EMUS_PER_MM).round() as u32
}

fn mm_to_twips(mm: f64) -> u32 {
    (mm * TWIPS_PER_MM).round() as u32
}
