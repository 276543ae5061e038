//! Operations that change a document in place
//!
//! Each function takes the document by `&mut` and leaves it ready to be
//! serialized. Validation happens before the first change, so a failed call
//! leaves nothing half-applied that callers could mistake for a result.

use crate::defaults::{
    PAGE_NUMBER_FONT_SIZE, PAGE_NUMBER_MARGIN, WATERMARK_ANGLE, WATERMARK_GRAY,
    WATERMARK_SIZE_DIVISOR,
};
use crate::document::PageBox;
use crate::font::StandardFont;
use crate::form::flatten_form;
use crate::text::{align_within, TextRun};
use crate::{Align, Color, MetadataUpdate, PdfDocument, PdfError, Progress, Result};
use lopdf::{dictionary, Object};
use page_range::parse_insertion_points;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Corner or edge center a page number is drawn at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageNumberPosition {
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    #[default]
    BottomCenter,
    BottomRight,
}

impl PageNumberPosition {
    fn align(&self) -> Align {
        match self {
            PageNumberPosition::TopLeft | PageNumberPosition::BottomLeft => Align::Left,
            PageNumberPosition::TopCenter | PageNumberPosition::BottomCenter => Align::Center,
            PageNumberPosition::TopRight | PageNumberPosition::BottomRight => Align::Right,
        }
    }

    fn is_top(&self) -> bool {
        matches!(
            self,
            PageNumberPosition::TopLeft | PageNumberPosition::TopCenter | PageNumberPosition::TopRight
        )
    }
}

/// Rotate pages by relative amounts
///
/// The new angle is the current one plus the delta, normalized into
/// `[0, 360)`. Pages without an entry or with a zero delta are untouched;
/// entries beyond the last page are ignored.
///
/// # Arguments
/// * `rotations` - 0-indexed page -> delta in degrees (a multiple of 90)
pub fn rotate(
    doc: &mut PdfDocument,
    rotations: &BTreeMap<usize, i64>,
    progress: &mut Progress,
) -> Result<()> {
    if let Some(delta) = rotations.values().find(|delta| *delta % 90 != 0) {
        return Err(PdfError::ValidationError(format!(
            "Rotation must be a multiple of 90 degrees, got {delta}"
        )));
    }

    let page_ids = doc.page_ids();
    let total = rotations.len();

    for (done, (&index, &delta)) in rotations.iter().enumerate() {
        if delta != 0 {
            match page_ids.get(index) {
                Some(&page_id) => {
                    let current = doc.rotation_of(page_id);
                    doc.set_rotation_of(page_id, current + delta)?;
                }
                None => log::debug!(
                    "rotation for page index {index} ignored, document has {} pages",
                    page_ids.len()
                ),
            }
        }
        progress.report_step(20, 60, done + 1, total)?;
    }

    Ok(())
}

/// Insert blank pages after the given positions
///
/// Positions are 0-indexed "insert after" points; `0` inserts before the
/// first page. New pages take the size of the first page (A4 for an empty
/// document).
///
/// # Arguments
/// * `insertions` - Comma-separated positions and ranges, e.g. `"0,2"`
pub fn add_blank_pages(doc: &mut PdfDocument, insertions: &str, progress: &mut Progress) -> Result<()> {
    let page_count = doc.page_count();
    let points = parse_insertion_points(insertions, page_count as u32)?;
    if points.is_empty() {
        return Err(PdfError::ValidationError(
            "No valid insertion points given".to_string(),
        ));
    }

    let geometry = if page_count > 0 {
        doc.page_box(1)?
    } else {
        PageBox::a4()
    };

    doc.flatten_page_tree()?;
    progress.report(10)?;

    // Largest position first so earlier positions stay valid
    let total = points.len();
    for (done, &position) in points.iter().rev().enumerate() {
        doc.insert_blank_page(position as usize, geometry.width, geometry.height)?;
        progress.report_step(10, 80, done + 1, total)?;
    }

    log::debug!("inserted {total} blank pages");
    Ok(())
}

/// Draw diagonal text across the center of every page
///
/// # Arguments
/// * `text` - Watermark text, must not be blank
/// * `opacity` - Fill and stroke alpha in `(0, 1]`
pub fn add_watermark(
    doc: &mut PdfDocument,
    text: &str,
    opacity: f64,
    progress: &mut Progress,
) -> Result<()> {
    let text = text.trim();
    if text.is_empty() {
        return Err(PdfError::ValidationError(
            "Watermark text is required".to_string(),
        ));
    }
    if !(opacity > 0.0 && opacity <= 1.0) {
        return Err(PdfError::ValidationError(format!(
            "Opacity must be between 0 and 1, got {opacity}"
        )));
    }

    let font = StandardFont::HelveticaBold;
    let gs_id = doc.inner_mut().add_object(dictionary! {
        "Type" => "ExtGState",
        "ca" => Object::Real(opacity as f32),
        "CA" => Object::Real(opacity as f32),
    });

    let (sin, cos) = WATERMARK_ANGLE.to_radians().sin_cos();
    let page_ids = doc.page_ids();
    let total = page_ids.len();

    for (done, page_id) in page_ids.into_iter().enumerate() {
        let page_box = doc.page_box_of(page_id)?;
        let font_size = page_box.width / WATERMARK_SIZE_DIVISOR;
        let font_name = doc.font_resource(page_id, font)?;
        let gs_name = doc.add_page_resource(page_id, b"ExtGState", "GS", gs_id)?;

        let run = TextRun {
            text,
            font,
            resource: &font_name,
            size: font_size,
            color: Color::gray(WATERMARK_GRAY),
        };
        // Baseline placed so the ascender-descender box is centered on the origin
        let baseline = -font.height(font_size) / 2.0 - font.descender() as f64 * font_size / 1000.0;
        let (cx, cy) = page_box.center();

        let mut ops = format!("q\n/{gs_name} gs\n{cos} {sin} {} {cos} {cx} {cy} cm\n", -sin).into_bytes();
        ops.extend(run.operators(0.0, baseline, Align::Center));
        ops.extend_from_slice(b"Q\n");
        doc.buffer_content(page_id, &ops);

        progress.report_step(10, 80, done + 1, total)?;
    }

    Ok(())
}

/// Number every page, starting at 1
pub fn add_page_numbers(
    doc: &mut PdfDocument,
    position: PageNumberPosition,
    progress: &mut Progress,
) -> Result<()> {
    let font = StandardFont::Helvetica;
    let font_size = PAGE_NUMBER_FONT_SIZE;
    let margin = PAGE_NUMBER_MARGIN;
    let page_ids = doc.page_ids();
    let total = page_ids.len();

    for (done, page_id) in page_ids.into_iter().enumerate() {
        let label = (done + 1).to_string();
        let page_box = doc.page_box_of(page_id)?;
        let font_name = doc.font_resource(page_id, font)?;
        let run = TextRun {
            text: &label,
            font,
            resource: &font_name,
            size: font_size,
            color: Color::black(),
        };

        let x = page_box.x
            + margin
            + align_within(run.width(), page_box.width - 2.0 * margin, position.align());
        let y = if position.is_top() {
            page_box.y + page_box.height - margin - font_size
        } else {
            page_box.y + margin
        };

        doc.buffer_content(page_id, &run.operators(x, y, Align::Left));

        progress.report_step(10, 80, done + 1, total)?;
    }

    Ok(())
}

/// Update the descriptive metadata
///
/// Only the non-blank fields of `update` are written. Producer and Creator
/// are always set to the tool identifier.
pub fn edit_metadata(doc: &mut PdfDocument, update: &MetadataUpdate, progress: &mut Progress) -> Result<()> {
    let mut metadata = doc.metadata();
    metadata.apply(update);
    metadata.stamp_tool();
    progress.report(50)?;
    doc.set_metadata(&metadata)
}

/// Turn interactive form fields into static page content
///
/// A document without a form is returned unchanged.
pub fn flatten(doc: &mut PdfDocument, progress: &mut Progress) -> Result<()> {
    flatten_form(doc, progress)
}
