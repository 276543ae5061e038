//! Form flattening
//!
//! Every widget annotation's normal appearance is drawn into the page as a
//! form XObject placed on the widget rectangle, after which the widgets and
//! the interactive form are removed.

use crate::document::{resolve, resolve_dict, PageBox};
use crate::font::StandardFont;
use crate::metadata::decode_text_string;
use crate::text::TextRun;
use crate::{Align, Color, PdfDocument, Progress, Result};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

/// Annotation flag bit 2
const HIDDEN_FLAG: i64 = 2;

/// Field hierarchy depth limit (safety limit)
const MAX_FIELD_DEPTH: usize = 32;

/// Horizontal padding of generated text field appearances
const FIELD_PADDING: f64 = 2.0;

/// Where a widget's appearance comes from
enum Appearance {
    /// Existing appearance stream object
    Indirect(ObjectId),
    /// Appearance stream stored directly in the /AP dictionary
    Direct(Stream),
    /// Text field value with no appearance of its own
    Generated { text: String, font_size: f64 },
}

struct WidgetPlan {
    appearance: Appearance,
    /// Appearance bounding box in form space, after /Matrix
    bbox: PageBox,
    /// Widget rectangle in page space
    rect: PageBox,
}

struct PagePlan {
    widgets: Vec<WidgetPlan>,
    kept_annots: Vec<Object>,
    removed: usize,
}

/// Flatten the interactive form into static page content
///
/// A document without a form is left untouched.
pub(crate) fn flatten_form(doc: &mut PdfDocument, progress: &mut Progress) -> Result<()> {
    let catalog_id = doc.catalog_id()?;
    let acro_form = doc
        .inner()
        .get_dictionary(catalog_id)
        .ok()
        .and_then(|catalog| catalog.get(b"AcroForm").ok())
        .and_then(|obj| resolve_dict(doc.inner(), obj));
    let Some(acro_form) = acro_form else {
        log::debug!("document has no form, nothing to flatten");
        return Ok(());
    };
    let default_da = acro_form
        .get(b"DA")
        .ok()
        .and_then(|obj| resolve(doc.inner(), obj))
        .and_then(string_value);

    let page_ids = doc.page_ids();
    let total = page_ids.len();
    let mut drawn = 0;

    for (index, page_id) in page_ids.into_iter().enumerate() {
        if let Some(plan) = plan_page(doc.inner(), page_id, default_da.as_deref()) {
            drawn += plan.widgets.len();
            apply_plan(doc, page_id, plan)?;
        }
        progress.report_step(10, 80, index + 1, total)?;
    }

    if let Ok(catalog) = doc.inner_mut().get_dictionary_mut(catalog_id) {
        catalog.remove(b"AcroForm");
    }
    log::debug!("flattened {drawn} form widgets");
    Ok(())
}

fn plan_page(doc: &Document, page_id: ObjectId, default_da: Option<&str>) -> Option<PagePlan> {
    let page = doc.get_dictionary(page_id).ok()?;
    let annots = page
        .get(b"Annots")
        .ok()
        .and_then(|obj| resolve(doc, obj))?
        .as_array()
        .ok()?;

    let mut plan = PagePlan {
        widgets: Vec::new(),
        kept_annots: Vec::new(),
        removed: 0,
    };

    for annot in annots {
        let Some(widget) = resolve(doc, annot).and_then(|obj| obj.as_dict().ok()) else {
            plan.kept_annots.push(annot.clone());
            continue;
        };
        if !is_widget(widget) {
            plan.kept_annots.push(annot.clone());
            continue;
        }
        plan.removed += 1;

        let flags = widget.get(b"F").and_then(Object::as_i64).unwrap_or(0);
        if flags & HIDDEN_FLAG != 0 {
            continue;
        }

        let Some(rect) = widget
            .get(b"Rect")
            .ok()
            .and_then(|obj| resolve(doc, obj))
            .and_then(|obj| obj.as_array().ok())
            .and_then(|rect| PageBox::from_rect(rect).ok())
        else {
            log::debug!("widget without a usable /Rect dropped");
            continue;
        };

        let Some(appearance) =
            normal_appearance(doc, widget).or_else(|| generated_appearance(doc, widget, default_da))
        else {
            continue;
        };

        let bbox = match &appearance {
            Appearance::Indirect(id) => doc
                .get_object(*id)
                .and_then(Object::as_stream)
                .map(|stream| form_bbox(&stream.dict, &rect))
                .unwrap_or_else(|_| local_box(&rect)),
            Appearance::Direct(stream) => form_bbox(&stream.dict, &rect),
            Appearance::Generated { .. } => local_box(&rect),
        };
        if bbox.width <= 0.0 || bbox.height <= 0.0 || rect.width <= 0.0 || rect.height <= 0.0 {
            log::debug!("widget with an empty appearance box dropped");
            continue;
        }

        plan.widgets.push(WidgetPlan {
            appearance,
            bbox,
            rect,
        });
    }

    (plan.removed > 0).then_some(plan)
}

fn apply_plan(doc: &mut PdfDocument, page_id: ObjectId, plan: PagePlan) -> Result<()> {
    for widget in plan.widgets {
        let xobject_id = match widget.appearance {
            Appearance::Indirect(id) => {
                if let Ok(stream) = doc
                    .inner_mut()
                    .get_object_mut(id)
                    .and_then(Object::as_stream_mut)
                {
                    mark_as_form(&mut stream.dict);
                }
                id
            }
            Appearance::Direct(mut stream) => {
                mark_as_form(&mut stream.dict);
                doc.inner_mut().add_object(stream)
            }
            Appearance::Generated { text, font_size } => {
                let stream = text_field_appearance(doc, &text, font_size, &widget.bbox);
                doc.inner_mut().add_object(stream)
            }
        };

        let name = doc.add_page_resource(page_id, b"XObject", "Fm", xobject_id)?;
        let ops = placement_operators(&name, &widget.bbox, &widget.rect);
        doc.buffer_content(page_id, ops.as_bytes());
    }

    if let Ok(page) = doc.inner_mut().get_dictionary_mut(page_id) {
        if plan.kept_annots.is_empty() {
            page.remove(b"Annots");
        } else {
            page.set("Annots", Object::Array(plan.kept_annots));
        }
    }
    log::debug!("removed {} widgets from page {page_id:?}", plan.removed);
    Ok(())
}

fn is_widget(annot: &Dictionary) -> bool {
    matches!(annot.get(b"Subtype").and_then(Object::as_name), Ok(b"Widget"))
}

/// The `/AP /N` stream, choosing the `/AS` state for stateful fields
fn normal_appearance(doc: &Document, widget: &Dictionary) -> Option<Appearance> {
    let ap = widget
        .get(b"AP")
        .ok()
        .and_then(|obj| resolve_dict(doc, obj))?;
    let normal = ap.get(b"N").ok()?;

    match normal {
        Object::Reference(id) => match doc.get_object(*id).ok()? {
            Object::Stream(_) => Some(Appearance::Indirect(*id)),
            Object::Dictionary(states) => appearance_state(doc, widget, states),
            _ => None,
        },
        Object::Stream(stream) => Some(Appearance::Direct(stream.clone())),
        Object::Dictionary(states) => appearance_state(doc, widget, states),
        _ => None,
    }
}

fn appearance_state(doc: &Document, widget: &Dictionary, states: &Dictionary) -> Option<Appearance> {
    let state = widget.get(b"AS").and_then(Object::as_name).ok()?;
    match states.get(state).ok()? {
        Object::Reference(id) => match doc.get_object(*id).ok()? {
            Object::Stream(_) => Some(Appearance::Indirect(*id)),
            _ => None,
        },
        Object::Stream(stream) => Some(Appearance::Direct(stream.clone())),
        _ => None,
    }
}

/// A plain single-line rendering of a text field's value
fn generated_appearance(
    doc: &Document,
    widget: &Dictionary,
    default_da: Option<&str>,
) -> Option<Appearance> {
    let field_type = field_attribute(doc, widget, b"FT").and_then(|obj| obj.as_name().ok());
    if field_type != Some(b"Tx".as_slice()) {
        log::debug!("widget without appearance dropped");
        return None;
    }

    let text = field_attribute(doc, widget, b"V").and_then(string_value)?;
    if text.is_empty() {
        return None;
    }
    let da = field_attribute(doc, widget, b"DA")
        .and_then(string_value)
        .or_else(|| default_da.map(str::to_string));
    let font_size = da.as_deref().and_then(da_font_size).unwrap_or(0.0);

    Some(Appearance::Generated { text, font_size })
}

/// Look up a field attribute on the widget or its ancestor fields
fn field_attribute<'a>(doc: &'a Document, widget: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    let mut current = widget;
    for _ in 0..MAX_FIELD_DEPTH {
        if let Ok(value) = current.get(key) {
            return resolve(doc, value);
        }
        current = current
            .get(b"Parent")
            .ok()
            .and_then(|obj| resolve(doc, obj))?
            .as_dict()
            .ok()?;
    }
    None
}

fn string_value(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        _ => None,
    }
}

/// Font size operand of the `Tf` operator in a default appearance string
fn da_font_size(da: &str) -> Option<f64> {
    let tokens: Vec<&str> = da.split_whitespace().collect();
    let position = tokens.iter().position(|token| *token == "Tf")?;
    tokens.get(position.checked_sub(1)?)?.parse().ok()
}

/// A box of the rectangle's size at the origin
fn local_box(rect: &PageBox) -> PageBox {
    PageBox {
        x: 0.0,
        y: 0.0,
        width: rect.width,
        height: rect.height,
    }
}

/// The form's /BBox transformed by its /Matrix
fn form_bbox(dict: &Dictionary, rect: &PageBox) -> PageBox {
    let bbox = dict
        .get(b"BBox")
        .and_then(Object::as_array)
        .ok()
        .and_then(|values| PageBox::from_rect(values).ok())
        .unwrap_or_else(|| local_box(rect));

    let matrix: Option<Vec<f64>> = dict.get(b"Matrix").and_then(Object::as_array).ok().and_then(|values| {
        values
            .iter()
            .map(|v| v.as_float().ok().map(f64::from))
            .collect()
    });
    let Some([a, b, c, d, e, f]) = matrix.and_then(|m| <[f64; 6]>::try_from(m).ok()) else {
        return bbox;
    };

    let corners = [
        (bbox.x, bbox.y),
        (bbox.x + bbox.width, bbox.y),
        (bbox.x, bbox.y + bbox.height),
        (bbox.x + bbox.width, bbox.y + bbox.height),
    ]
    .map(|(x, y)| (a * x + c * y + e, b * x + d * y + f));

    let min_x = corners.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let max_x = corners.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    let min_y = corners.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let max_y = corners.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

    PageBox {
        x: min_x,
        y: min_y,
        width: max_x - min_x,
        height: max_y - min_y,
    }
}

fn mark_as_form(dict: &mut Dictionary) {
    dict.set("Type", "XObject");
    dict.set("Subtype", "Form");
}

/// Operators that draw a form XObject with its box mapped onto `rect`
fn placement_operators(name: &str, bbox: &PageBox, rect: &PageBox) -> String {
    let sx = rect.width / bbox.width;
    let sy = rect.height / bbox.height;
    let tx = rect.x - bbox.x * sx;
    let ty = rect.y - bbox.y * sy;
    format!("q\n{sx} 0 0 {sy} {tx} {ty} cm\n/{name} Do\nQ\n")
}

fn text_field_appearance(doc: &mut PdfDocument, text: &str, font_size: f64, bbox: &PageBox) -> Stream {
    let font = StandardFont::Helvetica;
    let font_id = doc.standard_font_id(font);

    // Auto-sized fields fit the text to the box height
    let size = if font_size > 0.0 {
        font_size
    } else {
        (bbox.height - 4.0).clamp(4.0, 12.0)
    };
    let baseline = (bbox.height - font.height(size)) / 2.0 - font.descender() as f64 * size / 1000.0;

    let run = TextRun {
        text,
        font,
        resource: "Helv",
        size,
        color: Color::black(),
    };
    let mut content = b"/Tx BMC\nq\n".to_vec();
    content.extend(run.operators(FIELD_PADDING, baseline, Align::Left));
    content.extend_from_slice(b"Q\nEMC\n");

    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![0.into(), 0.into(), Object::Real(bbox.width as f32), Object::Real(bbox.height as f32)],
            "Resources" => dictionary! { "Font" => dictionary! { "Helv" => font_id } },
        },
        content,
    )
}
