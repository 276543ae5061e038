//! Copying pages between documents

use crate::document::{inherited_attribute, INHERITABLE_KEYS};
use crate::{PdfDocument, PdfError, Progress, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{HashMap, HashSet};

/// Deep-copies pages of one document into another
///
/// Every object reachable from a copied page is copied once per copier, so
/// pages copied through the same copier share their fonts, images and content
/// in the target. Annotations are the exception: they belong to one page, so
/// each copy of a page gets its own. Inheritable attributes are materialized
/// on each copy.
/// References to other pages, page tree nodes or the catalog would drag
/// foreign structure along and are replaced by `null`.
pub(crate) struct ObjectCopier<'a> {
    source: &'a Document,
    /// Source object ID -> target object ID
    map: HashMap<ObjectId, ObjectId>,
    /// Same, for objects owned by the page being copied
    page_local: HashMap<ObjectId, ObjectId>,
    /// The current page's `/Annots` array and the annotations it lists
    page_owned: HashSet<ObjectId>,
}

impl<'a> ObjectCopier<'a> {
    pub fn new(source: &'a PdfDocument) -> Self {
        if source.has_pending_content() {
            log::warn!("copying pages with unflushed content; drawn content is not copied");
        }
        Self {
            source: source.inner(),
            map: HashMap::new(),
            page_local: HashMap::new(),
            page_owned: HashSet::new(),
        }
    }

    /// Copy one page into `target`
    ///
    /// The same source page may be copied more than once; every call yields a
    /// new page object.
    ///
    /// # Returns
    /// ID of the new page object, not yet attached to the target's page tree
    pub fn copy_page(&mut self, target: &mut Document, page_id: ObjectId) -> Result<ObjectId> {
        let source = self.source;
        let page = source
            .get_dictionary(page_id)
            .map_err(|_| PdfError::Structure("Page object is not a dictionary".to_string()))?;

        let new_page_id = target.new_object_id();
        self.page_local.clear();
        self.page_owned = annotation_ids(source, page);
        // An annotation's /P names its own copy of the page; references from
        // other pages resolve to the first copy
        self.page_local.insert(page_id, new_page_id);
        self.map.entry(page_id).or_insert(new_page_id);

        let mut copied = Dictionary::new();
        for (key, value) in page.iter() {
            if key.as_slice() == b"Parent" {
                continue;
            }
            let value = self.copy_value(target, value);
            copied.set(key.clone(), value);
        }

        for key in INHERITABLE_KEYS {
            if copied.has(key) {
                continue;
            }
            if let Some(value) = inherited_attribute(source, page_id, key) {
                let value = self.copy_value(target, value);
                copied.set(key.to_vec(), value);
            }
        }

        target.objects.insert(new_page_id, Object::Dictionary(copied));
        Ok(new_page_id)
    }

    fn copy_value(&mut self, target: &mut Document, value: &Object) -> Object {
        match value {
            Object::Reference(id) => self.copy_reference(target, *id),
            Object::Array(items) => Object::Array(
                items
                    .iter()
                    .map(|item| self.copy_value(target, item))
                    .collect(),
            ),
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dictionary(target, dict)),
            Object::Stream(stream) => {
                let dict = self.copy_dictionary(target, &stream.dict);
                let mut stream = stream.clone();
                stream.dict = dict;
                Object::Stream(stream)
            }
            other => other.clone(),
        }
    }

    fn copy_dictionary(&mut self, target: &mut Document, dict: &Dictionary) -> Dictionary {
        let mut copied = Dictionary::new();
        for (key, value) in dict.iter() {
            let value = self.copy_value(target, value);
            copied.set(key.clone(), value);
        }
        copied
    }

    fn copy_reference(&mut self, target: &mut Document, id: ObjectId) -> Object {
        if let Some(new_id) = self.page_local.get(&id).or_else(|| self.map.get(&id)) {
            return Object::Reference(*new_id);
        }

        let source = self.source;
        let Ok(object) = source.get_object(id) else {
            log::debug!("dangling reference {id:?} dropped while copying");
            return Object::Null;
        };
        if is_structural(object) {
            return Object::Null;
        }

        // Registered before recursing so that cycles terminate
        let new_id = target.new_object_id();
        if self.page_owned.contains(&id) || is_annotation(object) {
            self.page_local.insert(id, new_id);
        } else {
            self.map.insert(id, new_id);
        }
        let copied = self.copy_value(target, object);
        target.objects.insert(new_id, copied);

        Object::Reference(new_id)
    }
}

fn is_annotation(object: &Object) -> bool {
    let Object::Dictionary(dict) = object else {
        return false;
    };
    matches!(dict.get(b"Type").and_then(Object::as_name), Ok(b"Annot"))
}

/// IDs of the page's `/Annots` array (when indirect) and of its entries
///
/// Annotations need not carry `/Type /Annot`, so membership in the array is
/// what marks them.
fn annotation_ids(doc: &Document, page: &Dictionary) -> HashSet<ObjectId> {
    let mut ids = HashSet::new();
    let Ok(mut annots) = page.get(b"Annots") else {
        return ids;
    };
    if let Object::Reference(id) = annots {
        ids.insert(*id);
        match doc.get_object(*id) {
            Ok(array) => annots = array,
            Err(_) => return ids,
        }
    }
    if let Object::Array(items) = annots {
        ids.extend(items.iter().filter_map(|item| item.as_reference().ok()));
    }
    ids
}

/// Pages, page tree nodes and the catalog are never copied by reference
fn is_structural(object: &Object) -> bool {
    let Object::Dictionary(dict) = object else {
        return false;
    };
    matches!(
        dict.get(b"Type").and_then(Object::as_name),
        Ok(b"Page") | Ok(b"Pages") | Ok(b"Catalog")
    )
}

/// Copy pages of `source` (by 0-indexed position, in the given order) to the end of `target`
///
/// Progress runs from `start` to `start + span` as pages are copied.
pub(crate) fn copy_pages(
    target: &mut PdfDocument,
    source: &PdfDocument,
    indices: &[usize],
    progress: &mut Progress,
    start: u32,
    span: u32,
) -> Result<()> {
    let source_ids = source.page_ids();
    let mut copier = ObjectCopier::new(source);
    let mut new_ids = Vec::with_capacity(indices.len());

    for (done, &index) in indices.iter().enumerate() {
        let page_id = *source_ids
            .get(index)
            .ok_or(PdfError::InvalidPage(index + 1, source_ids.len()))?;
        new_ids.push(copier.copy_page(target.inner_mut(), page_id)?);
        progress.report_step(start, span, done + 1, indices.len())?;
    }

    target.append_pages(&new_ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};
    use pretty_assertions::assert_eq;

    /// Source with two pages sharing one font, plus a link annotation on
    /// page 1 that points at page 2
    fn source_document() -> PdfDocument {
        let mut doc = PdfDocument::new();
        let first = doc.add_page(200.0, 300.0).unwrap();
        let second = doc.add_page(400.0, 500.0).unwrap();

        let inner = doc.inner_mut();
        let font_id = inner.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let annot_id = inner.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Link",
            "P" => first,
            "Dest" => vec![Object::Reference(second), "Fit".into()],
        });
        for page_id in [first, second] {
            let content_id = inner.add_object(Stream::new(
                Dictionary::new(),
                format!("% page {page_id:?}\n").into_bytes(),
            ));
            let page = inner.get_dictionary_mut(page_id).unwrap();
            page.set("Resources", dictionary! { "Font" => dictionary! { "F1" => font_id } });
            page.set("Contents", content_id);
        }
        inner
            .get_dictionary_mut(first)
            .unwrap()
            .set("Annots", vec![Object::Reference(annot_id)]);
        doc
    }

    fn font_ref(doc: &PdfDocument, page: usize) -> ObjectId {
        let page = doc.inner().get_dictionary(doc.page_id(page).unwrap()).unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
        fonts.get(b"F1").unwrap().as_reference().unwrap()
    }

    #[test]
    fn test_copy_preserves_order_and_geometry() {
        let source = source_document();
        let mut target = PdfDocument::new();
        copy_pages(&mut target, &source, &[1, 0], &mut Progress::new(), 0, 100).unwrap();

        assert_eq!(target.page_count(), 2);
        assert_eq!(target.page_box(1).unwrap().width, 400.0);
        assert_eq!(target.page_box(2).unwrap().width, 200.0);
    }

    #[test]
    fn test_shared_resources_copied_once() {
        let source = source_document();
        let mut target = PdfDocument::new();
        copy_pages(&mut target, &source, &[0, 1], &mut Progress::new(), 0, 100).unwrap();

        assert_eq!(font_ref(&target, 1), font_ref(&target, 2));
    }

    #[test]
    fn test_duplicate_pages_are_distinct_objects() {
        let source = source_document();
        let mut target = PdfDocument::new();
        copy_pages(&mut target, &source, &[0, 0], &mut Progress::new(), 0, 100).unwrap();

        assert_eq!(target.page_count(), 2);
        assert_ne!(target.page_id(1).unwrap(), target.page_id(2).unwrap());
        assert_eq!(font_ref(&target, 1), font_ref(&target, 2));
    }

    fn annotation_of(doc: &PdfDocument, page: usize) -> (ObjectId, ObjectId) {
        let page_id = doc.page_id(page).unwrap();
        let page = doc.inner().get_dictionary(page_id).unwrap();
        let annot_id = page.get(b"Annots").unwrap().as_array().unwrap()[0]
            .as_reference()
            .unwrap();
        let annot = doc.inner().get_dictionary(annot_id).unwrap();
        (annot_id, annot.get(b"P").unwrap().as_reference().unwrap())
    }

    #[test]
    fn test_duplicate_pages_get_their_own_annotations() {
        let source = source_document();
        let mut target = PdfDocument::new();
        copy_pages(&mut target, &source, &[0, 0], &mut Progress::new(), 0, 100).unwrap();

        let (first_annot, first_owner) = annotation_of(&target, 1);
        let (second_annot, second_owner) = annotation_of(&target, 2);
        assert_ne!(first_annot, second_annot);
        assert_eq!(first_owner, target.page_id(1).unwrap());
        assert_eq!(second_owner, target.page_id(2).unwrap());
        // Fonts are still shared
        assert_eq!(font_ref(&target, 1), font_ref(&target, 2));
    }

    #[test]
    fn test_untyped_annotations_are_not_shared() {
        let mut source = source_document();
        let first = source.page_id(1).unwrap();
        let inner = source.inner_mut();
        let note_id = inner.add_object(dictionary! {
            "Subtype" => "Text",
            "Rect" => vec![0.into(), 0.into(), 10.into(), 10.into()],
        });
        let annots_id = inner.add_object(vec![Object::Reference(note_id)]);
        inner.get_dictionary_mut(first).unwrap().set("Annots", annots_id);

        let mut target = PdfDocument::new();
        copy_pages(&mut target, &source, &[0, 0], &mut Progress::new(), 0, 100).unwrap();

        let annots = |page: usize| {
            let page = target.inner().get_dictionary(target.page_id(page).unwrap()).unwrap();
            page.get(b"Annots").unwrap().as_reference().unwrap()
        };
        assert_ne!(annots(1), annots(2));
        let note = |page: usize| {
            target.inner().get_object(annots(page)).unwrap().as_array().unwrap()[0]
                .as_reference()
                .unwrap()
        };
        assert_ne!(note(1), note(2));
    }

    #[test]
    fn test_foreign_page_references_become_null() {
        let source = source_document();
        let mut target = PdfDocument::new();
        copy_pages(&mut target, &source, &[0], &mut Progress::new(), 0, 100).unwrap();

        let page_id = target.page_id(1).unwrap();
        let page = target.inner().get_dictionary(page_id).unwrap();
        let annot_id = page.get(b"Annots").unwrap().as_array().unwrap()[0]
            .as_reference()
            .unwrap();
        let annot = target.inner().get_dictionary(annot_id).unwrap();

        // Back-reference to the copied page is remapped
        assert_eq!(annot.get(b"P").unwrap().as_reference().unwrap(), page_id);
        // Page 2 was not copied
        let dest = annot.get(b"Dest").unwrap().as_array().unwrap();
        assert!(matches!(dest[0], Object::Null));
    }

    #[test]
    fn test_copy_out_of_range() {
        let source = source_document();
        let mut target = PdfDocument::new();
        let err = copy_pages(&mut target, &source, &[5], &mut Progress::new(), 0, 100).unwrap_err();
        assert!(matches!(err, PdfError::InvalidPage(6, 2)));
        assert_eq!(target.page_count(), 0);
    }
}
