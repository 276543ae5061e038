//! Operations that build a new document
//!
//! Sources are only read; the result is a fresh [`PdfDocument`] whose pages
//! are deep copies (see the page copier) or newly drawn pages.

use crate::copy::copy_pages;
use crate::defaults::{A4_HEIGHT, A4_WIDTH, TAB_WIDTH, TEXT_FONT_SIZE, TEXT_LINE_HEIGHT, TEXT_MARGIN};
use crate::font::StandardFont;
use crate::image::{generate_image_operators, ImageFormat, ImageXObject};
use crate::text::{wrap_line, TextRun};
use crate::{Align, Color, PdfDocument, PdfError, Progress, Result};
use lopdf::ObjectId;
use page_range::{parse_page_set, select_indices};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How hard `compress` works on a document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    /// Structural re-save only
    Low,
    /// Re-save and stamp Producer/Creator
    #[default]
    Recommended,
    /// Rebuild from copied pages and drop descriptive metadata
    Extreme,
}

/// An image file with its declared MIME type
#[derive(Debug, Clone, Copy)]
pub struct ImageInput<'a> {
    pub mime_type: &'a str,
    pub data: &'a [u8],
}

/// Concatenate documents in order
///
/// Progress is reported after each source.
pub fn merge(documents: &[PdfDocument], progress: &mut Progress) -> Result<PdfDocument> {
    if documents.is_empty() {
        return Err(PdfError::ValidationError(
            "At least one document is required".to_string(),
        ));
    }

    let mut output = PdfDocument::new();
    let total = documents.len();
    for (done, source) in documents.iter().enumerate() {
        let indices: Vec<usize> = (0..source.page_count()).collect();
        let start = (done * 100 / total) as u32;
        let span = ((done + 1) * 100 / total) as u32 - start;
        copy_pages(&mut output, source, &indices, progress, start, span)?;
        progress.report_step(0, 100, done + 1, total)?;
    }

    log::debug!("merged {total} documents into {} pages", output.page_count());
    Ok(output)
}

/// Copy selected pages into a new document
///
/// Pages are taken in the given order, duplicates included. Numbers outside
/// the document are dropped.
///
/// # Arguments
/// * `pages` - 1-indexed page numbers
pub fn extract_pages(source: &PdfDocument, pages: &[i64], progress: &mut Progress) -> Result<PdfDocument> {
    let indices = select_indices(pages, source.page_count());
    if indices.is_empty() {
        return Err(PdfError::ValidationError(
            "No valid pages selected".to_string(),
        ));
    }
    if indices.len() < pages.len() {
        log::debug!("dropped {} out-of-range page numbers", pages.len() - indices.len());
    }

    progress.report(30)?;
    let mut output = PdfDocument::new();
    copy_pages(&mut output, source, &indices, progress, 30, 50)?;
    Ok(output)
}

/// Copy every page except the listed ones into a new document
///
/// # Arguments
/// * `pages_to_delete` - Comma-separated pages and ranges, e.g. `"1,3,5-8"`
pub fn delete_pages(source: &PdfDocument, pages_to_delete: &str, progress: &mut Progress) -> Result<PdfDocument> {
    let page_count = source.page_count();
    let removed = parse_page_set(pages_to_delete, page_count as u32)?;
    let keep: Vec<usize> = (1..=page_count as u32)
        .filter(|page| !removed.contains(page))
        .map(|page| page as usize - 1)
        .collect();
    if keep.is_empty() {
        return Err(PdfError::ValidationError(
            "Cannot delete all pages".to_string(),
        ));
    }

    let mut output = PdfDocument::new();
    copy_pages(&mut output, source, &keep, progress, 10, 80)?;
    carry_metadata(&mut output, source)?;
    Ok(output)
}

/// Copy pages into a new document in exactly the given order
///
/// The order may omit or repeat pages, but every number must exist.
///
/// # Arguments
/// * `new_order` - 1-indexed page numbers
pub fn reorder_pages(source: &PdfDocument, new_order: &[i64], progress: &mut Progress) -> Result<PdfDocument> {
    if new_order.is_empty() {
        return Err(PdfError::ValidationError("New page order is empty".to_string()));
    }

    let page_count = source.page_count();
    let indices = new_order
        .iter()
        .map(|&page| {
            if page >= 1 && page as usize <= page_count {
                Ok(page as usize - 1)
            } else {
                Err(PdfError::ValidationError(format!(
                    "Page {page} is out of range (document has {page_count} pages)"
                )))
            }
        })
        .collect::<Result<Vec<_>>>()?;

    let mut output = PdfDocument::new();
    copy_pages(&mut output, source, &indices, progress, 10, 80)?;
    carry_metadata(&mut output, source)?;
    Ok(output)
}

/// Title, author, subject and keywords survive a rebuild
fn carry_metadata(output: &mut PdfDocument, source: &PdfDocument) -> Result<()> {
    let mut metadata = output.metadata();
    metadata.copy_descriptive(&source.metadata());
    output.set_metadata(&metadata)
}

/// Build a document with one page per image, each page sized to the image
///
/// Every MIME type is checked before any page is built.
pub fn images_to_pdf(images: &[ImageInput<'_>], progress: &mut Progress) -> Result<PdfDocument> {
    if images.is_empty() {
        return Err(PdfError::ValidationError(
            "At least one image is required".to_string(),
        ));
    }
    for image in images {
        if ImageFormat::from_mime(image.mime_type).is_none() {
            return Err(PdfError::ValidationError(format!(
                "Unsupported image type: {}",
                image.mime_type
            )));
        }
    }

    let mut output = PdfDocument::new();
    // Identical files are embedded once
    let mut embedded: HashMap<&[u8], (ObjectId, u32, u32)> = HashMap::new();
    let total = images.len();

    for (done, image) in images.iter().enumerate() {
        let (image_id, width, height) = match embedded.get(image.data) {
            Some(entry) => *entry,
            None => {
                let xobject = ImageXObject::from_bytes(image.data)?;
                let entry = (
                    xobject.embed(output.inner_mut()),
                    xobject.width,
                    xobject.height,
                );
                embedded.insert(image.data, entry);
                entry
            }
        };

        let (width, height) = (width as f64, height as f64);
        let page_id = output.add_page(width, height)?;
        let name = output.add_page_resource(page_id, b"XObject", "Im", image_id)?;
        output.buffer_content(page_id, &generate_image_operators(&name, 0.0, 0.0, width, height));

        progress.report_step(10, 80, done + 1, total)?;
    }

    Ok(output)
}

/// Lay plain text out on A4 pages in a monospaced font
///
/// Files follow each other without a page break.
pub fn texts_to_pdf<T: AsRef<[u8]>>(files: &[T], progress: &mut Progress) -> Result<PdfDocument> {
    if files.is_empty() {
        return Err(PdfError::ValidationError(
            "At least one text file is required".to_string(),
        ));
    }

    let mut output = PdfDocument::new();
    let mut writer = TextWriter::new(&mut output)?;
    let total = files.len();

    for (done, file) in files.iter().enumerate() {
        let text = normalize_text(file.as_ref());
        for line in text.split('\n') {
            for display in wrap_line(line, writer.font, TEXT_FONT_SIZE, writer.max_width()) {
                writer.write_line(&display)?;
            }
        }
        progress.report_step(10, 80, done + 1, total)?;
    }

    log::debug!("laid out {total} text files on {} pages", writer.doc.page_count());
    Ok(output)
}

/// Decode text bytes and normalize line endings and tabs
fn normalize_text(bytes: &[u8]) -> String {
    let decoded = String::from_utf8_lossy(bytes);
    let text = decoded.strip_prefix('\u{feff}').unwrap_or(&*decoded);
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\t', &" ".repeat(TAB_WIDTH))
}

/// Cursor over A4 pages
struct TextWriter<'a> {
    doc: &'a mut PdfDocument,
    font: StandardFont,
    page_id: ObjectId,
    font_name: String,
    /// Baseline of the next line
    y: f64,
}

impl<'a> TextWriter<'a> {
    fn new(doc: &'a mut PdfDocument) -> Result<Self> {
        let font = StandardFont::Courier;
        let page_id = doc.add_page(A4_WIDTH, A4_HEIGHT)?;
        let font_name = doc.font_resource(page_id, font)?;
        Ok(Self {
            doc,
            font,
            page_id,
            font_name,
            y: Self::top(),
        })
    }

    fn top() -> f64 {
        A4_HEIGHT - TEXT_MARGIN - TEXT_FONT_SIZE
    }

    fn max_width(&self) -> f64 {
        A4_WIDTH - 2.0 * TEXT_MARGIN
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        if self.y < TEXT_MARGIN {
            self.page_id = self.doc.add_page(A4_WIDTH, A4_HEIGHT)?;
            self.font_name = self.doc.font_resource(self.page_id, self.font)?;
            self.y = Self::top();
        }

        if !line.is_empty() {
            let run = TextRun {
                text: line,
                font: self.font,
                resource: &self.font_name,
                size: TEXT_FONT_SIZE,
                color: Color::black(),
            };
            let ops = run.operators(TEXT_MARGIN, self.y, Align::Left);
            self.doc.buffer_content(self.page_id, &ops);
        }

        self.y -= TEXT_FONT_SIZE * TEXT_LINE_HEIGHT;
        Ok(())
    }
}

/// Re-save a document with optional metadata changes and rebuild
///
/// The caller serializes the result compactly at every level.
pub fn compress(source: PdfDocument, level: CompressionLevel, progress: &mut Progress) -> Result<PdfDocument> {
    progress.report(10)?;

    let output = match level {
        CompressionLevel::Low => source,
        CompressionLevel::Recommended => {
            let mut doc = source;
            let mut metadata = doc.metadata();
            metadata.stamp_tool();
            doc.set_metadata(&metadata)?;
            doc
        }
        CompressionLevel::Extreme => {
            progress.report(30)?;
            let mut doc = PdfDocument::new();
            let indices: Vec<usize> = (0..source.page_count()).collect();
            copy_pages(&mut doc, &source, &indices, progress, 30, 30)?;

            let mut metadata = source.metadata();
            metadata.clear_descriptive();
            metadata.stamp_tool();
            doc.set_metadata(&metadata)?;
            doc
        }
    };

    progress.report(80)?;
    log::debug!("compression level {level:?} applied");
    Ok(output)
}
