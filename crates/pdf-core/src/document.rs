//! PDF Document wrapper

use crate::defaults::{A4_HEIGHT, A4_WIDTH, TOOL_IDENTIFIER};
use crate::font::StandardFont;
use crate::metadata::Metadata;
use crate::{PdfError, Result};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Page attributes a page inherits from its ancestors in the page tree
pub(crate) const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Page tree depth limit (safety limit)
const MAX_TREE_DEPTH: usize = 32;

/// RGB Color (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a new RGB color (values 0.0 - 1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Neutral gray of the given level
    pub fn gray(level: f32) -> Self {
        Self::rgb(level, level, level)
    }

    /// Black color
    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// Page geometry in points, taken from the MediaBox
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PageBox {
    /// A4 portrait at the origin
    pub fn a4() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: A4_WIDTH,
            height: A4_HEIGHT,
        }
    }

    /// Build from a `[x1 y1 x2 y2]` rectangle, normalizing reversed corners
    pub fn from_rect(rect: &[Object]) -> Result<Self> {
        if rect.len() < 4 {
            return Err(PdfError::Structure("Invalid box format".to_string()));
        }
        let mut values = [0.0f64; 4];
        for (value, obj) in values.iter_mut().zip(rect) {
            *value = obj
                .as_float()
                .map_err(|_| PdfError::Structure("Invalid box coordinate".to_string()))?
                as f64;
        }
        let [x1, y1, x2, y2] = values;
        Ok(Self {
            x: x1.min(x2),
            y: y1.min(y2),
            width: (x2 - x1).abs(),
            height: (y2 - y1).abs(),
        })
    }

    /// Center point of the box
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Serializer configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// Prune, compress and write object streams with a cross-reference stream
    pub compact: bool,
}

impl SaveOptions {
    pub fn compact() -> Self {
        Self { compact: true }
    }
}

/// PDF Document wrapper providing high-level operations
///
/// Page numbers in the public API are 1-indexed.
pub struct PdfDocument {
    /// The underlying lopdf document
    inner: Document,
    /// Buffered content operators per page (page object -> operators)
    page_content_buffer: BTreeMap<ObjectId, Vec<u8>>,
    /// Font dictionaries already added (font -> PDF object ID)
    fonts: HashMap<StandardFont, ObjectId>,
}

impl PdfDocument {
    /// Create an empty document with an empty page tree
    ///
    /// Producer and Creator are set to the tool identifier.
    pub fn new() -> Self {
        let mut inner = Document::with_version("1.7");

        let pages_id = inner.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => 0,
        });
        let catalog_id = inner.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = inner.add_object(dictionary! {
            "Producer" => Object::string_literal(TOOL_IDENTIFIER),
            "Creator" => Object::string_literal(TOOL_IDENTIFIER),
        });

        inner.trailer.set("Root", catalog_id);
        inner.trailer.set("Info", info_id);

        Self::wrap(inner)
    }

    /// Open a PDF document from bytes
    ///
    /// Fails with [`PdfError::ParseError`] on anything that is not a loadable,
    /// unencrypted PDF with a page tree.
    ///
    /// # Arguments
    /// * `data` - PDF file bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let inner = Document::load_mem(data).map_err(|e| PdfError::ParseError(e.to_string()))?;

        if inner.trailer.get(b"Encrypt").is_ok() {
            return Err(PdfError::ParseError(
                "Encrypted documents are not supported".to_string(),
            ));
        }

        let doc = Self::wrap(inner);
        doc.pages_root_id()
            .map_err(|e| PdfError::ParseError(e.to_string()))?;

        log::debug!("loaded document with {} pages", doc.page_count());
        Ok(doc)
    }

    fn wrap(inner: Document) -> Self {
        Self {
            inner,
            page_content_buffer: BTreeMap::new(),
            fonts: HashMap::new(),
        }
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    /// Get all page object IDs in order
    pub fn page_ids(&self) -> Vec<ObjectId> {
        self.inner.get_pages().values().copied().collect()
    }

    /// Get the object ID of a page
    ///
    /// # Arguments
    /// * `page` - Page number (1-indexed)
    pub fn page_id(&self, page: usize) -> Result<ObjectId> {
        let pages = self.inner.get_pages();
        pages
            .get(&(page as u32))
            .copied()
            .ok_or(PdfError::InvalidPage(page, pages.len()))
    }

    /// Get the geometry of a page
    ///
    /// # Arguments
    /// * `page` - Page number (1-indexed)
    pub fn page_box(&self, page: usize) -> Result<PageBox> {
        self.page_box_of(self.page_id(page)?)
    }

    /// Get the rotation of a page, one of 0, 90, 180, 270
    ///
    /// # Arguments
    /// * `page` - Page number (1-indexed)
    pub fn rotation(&self, page: usize) -> Result<i64> {
        Ok(self.rotation_of(self.page_id(page)?))
    }

    /// Get the decoded content of a page
    ///
    /// Content still buffered by drawing operations is not included.
    ///
    /// # Arguments
    /// * `page` - Page number (1-indexed)
    pub fn page_content(&self, page: usize) -> Result<Vec<u8>> {
        let page_id = self.page_id(page)?;
        Ok(self.inner.get_page_content(page_id)?)
    }

    /// Read the document metadata
    pub fn metadata(&self) -> Metadata {
        Metadata::read(&self.inner)
    }

    /// Replace the document metadata
    pub fn set_metadata(&mut self, metadata: &Metadata) -> Result<()> {
        metadata.write(&mut self.inner)
    }

    /// Get a reference to the underlying lopdf document
    pub fn inner(&self) -> &Document {
        &self.inner
    }

    /// Get a mutable reference to the underlying lopdf document
    pub fn inner_mut(&mut self) -> &mut Document {
        &mut self.inner
    }

    /// Save the document to bytes
    ///
    /// Buffered content is flushed first. With `compact`, unreachable objects
    /// are pruned, objects renumbered, streams Flate-compressed and the file
    /// is written with object streams and a cross-reference stream.
    pub fn to_bytes(&mut self, options: SaveOptions) -> Result<Vec<u8>> {
        self.flush()?;

        let mut buffer = Vec::new();
        if options.compact {
            let pruned = self.inner.prune_objects();
            log::debug!("pruned {} unreachable objects", pruned.len());
            self.inner.renumber_objects();
            self.inner.compress();
            // Object IDs changed
            self.fonts.clear();

            self.inner
                .save_modern(&mut buffer)
                .map_err(|e| PdfError::SerializeError(e.to_string()))?;
        } else {
            self.inner
                .save_to(&mut buffer)
                .map_err(|e| PdfError::SerializeError(e.to_string()))?;
        }

        Ok(buffer)
    }

    /// Write all buffered content to the page content streams
    ///
    /// Called by [`PdfDocument::to_bytes`]. Page copies read the object graph
    /// directly, so flush before copying pages of a document that was drawn on.
    pub fn flush(&mut self) -> Result<()> {
        // Take ownership of buffer to avoid borrow issues
        let buffers = std::mem::take(&mut self.page_content_buffer);

        for (page_id, content) in buffers {
            if !content.is_empty() {
                self.append_to_content_stream(page_id, &content)?;
            }
        }

        Ok(())
    }

    /// Whether drawing operations are waiting to be flushed
    pub fn has_pending_content(&self) -> bool {
        self.page_content_buffer.values().any(|c| !c.is_empty())
    }

    pub(crate) fn page_box_of(&self, page_id: ObjectId) -> Result<PageBox> {
        for key in [b"MediaBox".as_slice(), b"CropBox".as_slice()] {
            if let Some(obj) = inherited_attribute(&self.inner, page_id, key) {
                let rect = resolve(&self.inner, obj)
                    .and_then(|o| o.as_array().ok())
                    .ok_or_else(|| PdfError::Structure("MediaBox is not an array".to_string()))?;
                return PageBox::from_rect(rect);
            }
        }

        // Fallback: assume A4 page size
        Ok(PageBox::a4())
    }

    pub(crate) fn rotation_of(&self, page_id: ObjectId) -> i64 {
        inherited_attribute(&self.inner, page_id, b"Rotate")
            .and_then(|obj| resolve(&self.inner, obj))
            .and_then(|obj| {
                obj.as_i64()
                    .ok()
                    .or_else(|| obj.as_float().ok().map(|v| v.round() as i64))
            })
            .map(normalize_rotation)
            .unwrap_or(0)
    }

    pub(crate) fn set_rotation_of(&mut self, page_id: ObjectId, angle: i64) -> Result<()> {
        let page = self
            .inner
            .get_dictionary_mut(page_id)
            .map_err(|_| PdfError::Structure("Page object is not a dictionary".to_string()))?;
        page.set("Rotate", Object::Integer(normalize_rotation(angle)));
        Ok(())
    }

    /// Buffer content operators for a page (written at save time)
    pub(crate) fn buffer_content(&mut self, page_id: ObjectId, content: &[u8]) {
        self.page_content_buffer
            .entry(page_id)
            .or_default()
            .extend_from_slice(content);
    }

    /// Append content to a page
    ///
    /// The existing content is wrapped in `q`/`Q` so that its graphics state
    /// does not leak into the appended operators.
    fn append_to_content_stream(&mut self, page_id: ObjectId, content: &[u8]) -> Result<()> {
        let existing: Vec<Object> = {
            let page_dict = self
                .inner
                .get_dictionary(page_id)
                .map_err(|_| PdfError::Structure("Page object is not a dictionary".to_string()))?;

            match page_dict.get(b"Contents") {
                Ok(Object::Reference(ref_id)) => match self.inner.get_object(*ref_id) {
                    Ok(Object::Array(arr)) => arr.clone(),
                    Ok(_) => vec![Object::Reference(*ref_id)],
                    Err(_) => Vec::new(),
                },
                Ok(Object::Array(arr)) => arr.clone(),
                Ok(Object::Stream(stream)) => vec![Object::Stream(stream.clone())],
                _ => Vec::new(),
            }
        };

        let mut contents = Vec::with_capacity(existing.len() + 2);
        if existing.is_empty() {
            let stream_id = self
                .inner
                .add_object(Stream::new(Dictionary::new(), content.to_vec()));
            contents.push(Object::Reference(stream_id));
        } else {
            let open_id = self
                .inner
                .add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
            contents.push(Object::Reference(open_id));

            for obj in existing {
                match obj {
                    Object::Reference(_) => contents.push(obj),
                    // Direct streams must become indirect objects
                    Object::Stream(stream) => {
                        contents.push(Object::Reference(self.inner.add_object(stream)))
                    }
                    _ => {}
                }
            }

            let mut tail = b"\nQ\n".to_vec();
            tail.extend_from_slice(content);
            let tail_id = self.inner.add_object(Stream::new(Dictionary::new(), tail));
            contents.push(Object::Reference(tail_id));
        }

        let page_dict = self
            .inner
            .get_dictionary_mut(page_id)
            .map_err(|_| PdfError::Structure("Page object is not a dictionary".to_string()))?;
        page_dict.set("Contents", Object::Array(contents));

        Ok(())
    }

    /// Get the resource name of a standard font on a page, adding it if needed
    pub(crate) fn font_resource(&mut self, page_id: ObjectId, font: StandardFont) -> Result<String> {
        let font_id = self.standard_font_id(font);
        self.add_page_resource(page_id, b"Font", "F", font_id)
    }

    /// Object ID of a standard font dictionary, shared by the whole document
    pub(crate) fn standard_font_id(&mut self, font: StandardFont) -> ObjectId {
        match self.fonts.get(&font) {
            Some(id) => *id,
            None => {
                let id = self.inner.add_object(font.to_dictionary());
                self.fonts.insert(font, id);
                id
            }
        }
    }

    /// Register an object in a page's resource category (e.g. `Font`, `XObject`)
    ///
    /// Inherited or referenced resources are copied onto the page. An existing
    /// entry for the same object is reused; otherwise the first free
    /// `{prefix}{n}` name is taken.
    ///
    /// # Returns
    /// The resource name to use in content operators
    pub(crate) fn add_page_resource(
        &mut self,
        page_id: ObjectId,
        category: &[u8],
        prefix: &str,
        object_id: ObjectId,
    ) -> Result<String> {
        let mut resources = inherited_attribute(&self.inner, page_id, b"Resources")
            .and_then(|obj| resolve_dict(&self.inner, obj))
            .unwrap_or_default();

        let mut entries = resources
            .get(category)
            .ok()
            .and_then(|obj| resolve_dict(&self.inner, obj))
            .unwrap_or_default();

        let existing = entries.iter().find_map(|(name, value)| match value {
            Object::Reference(id) if *id == object_id => {
                Some(String::from_utf8_lossy(name).into_owned())
            }
            _ => None,
        });

        let name = match existing {
            Some(name) => name,
            None => {
                let mut index = 1;
                let name = loop {
                    let candidate = format!("{prefix}{index}");
                    if !entries.has(candidate.as_bytes()) {
                        break candidate;
                    }
                    index += 1;
                };
                entries.set(name.as_bytes().to_vec(), Object::Reference(object_id));
                name
            }
        };

        resources.set(category.to_vec(), Object::Dictionary(entries));

        let page_dict = self
            .inner
            .get_dictionary_mut(page_id)
            .map_err(|_| PdfError::Structure("Page object is not a dictionary".to_string()))?;
        page_dict.set("Resources", Object::Dictionary(resources));

        Ok(name)
    }

    /// Get the ID of the document catalog
    pub(crate) fn catalog_id(&self) -> Result<ObjectId> {
        self.inner
            .trailer
            .get(b"Root")
            .and_then(Object::as_reference)
            .map_err(|_| PdfError::Structure("Document trailer missing Root entry".to_string()))
    }

    /// Get the ID of the root Pages node
    pub(crate) fn pages_root_id(&self) -> Result<ObjectId> {
        let catalog_id = self.catalog_id()?;
        let catalog = self
            .inner
            .get_dictionary(catalog_id)
            .map_err(|_| PdfError::Structure("Catalog is not a dictionary".to_string()))?;
        let pages_id = catalog
            .get(b"Pages")
            .and_then(Object::as_reference)
            .map_err(|_| PdfError::Structure("Catalog missing Pages entry".to_string()))?;
        self.inner
            .get_dictionary(pages_id)
            .map_err(|_| PdfError::Structure("Pages object is not a dictionary".to_string()))?;

        Ok(pages_id)
    }

    /// Append page objects at the end of the root Pages node
    pub(crate) fn append_pages(&mut self, page_ids: &[ObjectId]) -> Result<()> {
        let pages_id = self.pages_root_id()?;

        for &page_id in page_ids {
            let page_dict = self
                .inner
                .get_dictionary_mut(page_id)
                .map_err(|_| PdfError::Structure("Page object is not a dictionary".to_string()))?;
            page_dict.set("Parent", Object::Reference(pages_id));
        }

        let pages_dict = self
            .inner
            .get_dictionary_mut(pages_id)
            .map_err(|_| PdfError::Structure("Pages object is not a dictionary".to_string()))?;

        let mut kids_array = match pages_dict.get(b"Kids") {
            Ok(Object::Array(kids)) => kids.clone(),
            _ => Vec::new(),
        };
        kids_array.extend(page_ids.iter().map(|id| Object::Reference(*id)));

        let current_count = pages_dict
            .get(b"Count")
            .and_then(Object::as_i64)
            .unwrap_or(0);

        pages_dict.set("Kids", Object::Array(kids_array));
        pages_dict.set("Count", Object::Integer(current_count + page_ids.len() as i64));

        Ok(())
    }

    /// Create a blank page with an empty content stream (not yet in the page tree)
    fn create_blank_page(&mut self, width: f64, height: f64) -> ObjectId {
        let contents_id = self
            .inner
            .add_object(Stream::new(Dictionary::new(), Vec::new()));

        self.inner.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width as f32),
                Object::Real(height as f32),
            ],
            "Resources" => Dictionary::new(),
            "Contents" => contents_id,
        })
    }

    /// Add a blank page at the end of the document
    ///
    /// # Returns
    /// Object ID of the new page
    pub fn add_page(&mut self, width: f64, height: f64) -> Result<ObjectId> {
        let page_id = self.create_blank_page(width, height);
        self.append_pages(&[page_id])?;
        Ok(page_id)
    }

    /// Insert a blank page so that it becomes the page at 0-indexed `index`
    ///
    /// Requires a flat page tree (see [`PdfDocument::flatten_page_tree`]).
    pub(crate) fn insert_blank_page(
        &mut self,
        index: usize,
        width: f64,
        height: f64,
    ) -> Result<ObjectId> {
        let pages_id = self.pages_root_id()?;
        let page_id = self.create_blank_page(width, height);

        let pages_dict = self
            .inner
            .get_dictionary_mut(pages_id)
            .map_err(|_| PdfError::Structure("Pages object is not a dictionary".to_string()))?;

        let mut kids_array = match pages_dict.get(b"Kids") {
            Ok(Object::Array(kids)) => kids.clone(),
            _ => return Err(PdfError::Structure("Pages object missing Kids array".to_string())),
        };
        let index = index.min(kids_array.len());
        kids_array.insert(index, Object::Reference(page_id));
        let count = kids_array.len() as i64;

        pages_dict.set("Kids", Object::Array(kids_array));
        pages_dict.set("Count", Object::Integer(count));

        let page_dict = self
            .inner
            .get_dictionary_mut(page_id)
            .map_err(|_| PdfError::Structure("Page object is not a dictionary".to_string()))?;
        page_dict.set("Parent", Object::Reference(pages_id));

        Ok(page_id)
    }

    /// Make every page a direct kid of the root Pages node
    ///
    /// Inherited attributes are materialized on each page and removed from
    /// the tree, and intermediate Pages nodes are dropped, so that positions
    /// in the root's Kids array are page indices.
    pub(crate) fn flatten_page_tree(&mut self) -> Result<()> {
        let root_id = self.pages_root_id()?;
        let page_ids = self.page_ids();

        let mut materialized = Vec::with_capacity(page_ids.len());
        for &page_id in &page_ids {
            let mut page_dict = self
                .inner
                .get_dictionary(page_id)
                .map_err(|_| PdfError::Structure("Page object is not a dictionary".to_string()))?
                .clone();
            for key in INHERITABLE_KEYS {
                if !page_dict.has(key) {
                    if let Some(value) = inherited_attribute(&self.inner, page_id, key) {
                        page_dict.set(key.to_vec(), value.clone());
                    }
                }
            }
            page_dict.set("Parent", Object::Reference(root_id));
            materialized.push((page_id, page_dict));
        }

        let intermediate = self.intermediate_nodes(root_id);

        for (page_id, page_dict) in materialized {
            self.inner.objects.insert(page_id, Object::Dictionary(page_dict));
        }
        for node_id in &intermediate {
            self.inner.objects.remove(node_id);
        }

        let root = self
            .inner
            .get_dictionary_mut(root_id)
            .map_err(|_| PdfError::Structure("Pages object is not a dictionary".to_string()))?;
        root.set(
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        );
        root.set("Count", Object::Integer(page_ids.len() as i64));
        // Every page now carries its own copy
        for key in INHERITABLE_KEYS {
            root.remove(key);
        }

        if !intermediate.is_empty() {
            log::debug!("flattened {} intermediate page tree nodes", intermediate.len());
        }
        Ok(())
    }

    /// Collect the Pages nodes below the root
    fn intermediate_nodes(&self, root_id: ObjectId) -> Vec<ObjectId> {
        let mut found = Vec::new();
        let mut visited = HashSet::from([root_id]);
        let mut stack = vec![(root_id, 0usize)];

        while let Some((node_id, depth)) = stack.pop() {
            if depth > MAX_TREE_DEPTH {
                continue;
            }
            let Ok(node) = self.inner.get_dictionary(node_id) else {
                continue;
            };
            let Ok(Object::Array(kids)) = node.get(b"Kids") else {
                continue;
            };
            for kid in kids {
                let Ok(kid_id) = kid.as_reference() else {
                    continue;
                };
                let is_pages = self
                    .inner
                    .get_dictionary(kid_id)
                    .ok()
                    .and_then(|d| d.get(b"Type").ok())
                    .and_then(|t| t.as_name().ok())
                    == Some(b"Pages".as_slice());
                if is_pages && visited.insert(kid_id) {
                    found.push(kid_id);
                    stack.push((kid_id, depth + 1));
                }
            }
        }

        found
    }
}

impl Default for PdfDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("version", &self.inner.version)
            .field("pages", &self.page_count())
            .field("objects", &self.inner.objects.len())
            .field("pending_pages", &self.page_content_buffer.len())
            .finish()
    }
}

/// Follow references until a direct object is reached
///
/// Returns `None` for dangling references and reference cycles.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    let mut current = obj;
    for _ in 0..MAX_TREE_DEPTH {
        match current {
            Object::Reference(id) => current = doc.get_object(*id).ok()?,
            _ => return Some(current),
        }
    }
    None
}

/// Resolve an object to a dictionary, cloning it
pub(crate) fn resolve_dict(doc: &Document, obj: &Object) -> Option<Dictionary> {
    match resolve(doc, obj)? {
        Object::Dictionary(dict) => Some(dict.clone()),
        _ => None,
    }
}

/// Look up a page attribute, following the Parent chain if needed
pub(crate) fn inherited_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current_id = page_id;

    for _ in 0..MAX_TREE_DEPTH {
        let dict = doc.get_dictionary(current_id).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => current_id = *parent_id,
            _ => return None,
        }
    }

    None
}

/// Normalize an angle into {0, 90, 180, 270}, snapping to the nearest quarter turn
pub(crate) fn normalize_rotation(angle: i64) -> i64 {
    let angle = angle.rem_euclid(360);
    ((angle + 45) / 90 % 4) * 90
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_document_is_empty_and_valid() {
        let mut doc = PdfDocument::new();
        assert_eq!(doc.page_count(), 0);
        assert_eq!(doc.metadata().producer.as_deref(), Some(TOOL_IDENTIFIER));

        let bytes = doc.to_bytes(SaveOptions::default()).unwrap();
        let reloaded = PdfDocument::from_bytes(&bytes).unwrap();
        assert_eq!(reloaded.page_count(), 0);
    }

    #[test]
    fn test_debug_summarizes_document() {
        let mut doc = PdfDocument::new();
        doc.add_page(100.0, 100.0).unwrap();
        let text = format!("{doc:?}");
        assert!(text.starts_with("PdfDocument {"));
        assert!(text.contains("pages: 1"));
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        let err = PdfDocument::from_bytes(b"definitely not a pdf").err().unwrap();
        assert!(matches!(err, PdfError::ParseError(_)));
        assert!(PdfDocument::from_bytes(&[]).is_err());
    }

    #[test]
    fn test_add_page_and_geometry() {
        let mut doc = PdfDocument::new();
        doc.add_page(300.0, 400.0).unwrap();
        doc.add_page(A4_WIDTH, A4_HEIGHT).unwrap();

        assert_eq!(doc.page_count(), 2);
        let first = doc.page_box(1).unwrap();
        assert_eq!((first.width, first.height), (300.0, 400.0));
        assert!(matches!(doc.page_box(3), Err(PdfError::InvalidPage(3, 2))));
    }

    #[test]
    fn test_page_box_from_rect() {
        let rect = vec![
            Object::Integer(10),
            Object::Integer(20),
            Object::Real(110.0),
            Object::Integer(220),
        ];
        let page_box = PageBox::from_rect(&rect).unwrap();
        assert_eq!(page_box.x, 10.0);
        assert_eq!(page_box.width, 100.0);
        assert_eq!(page_box.height, 200.0);
        assert_eq!(page_box.center(), (60.0, 120.0));

        let reversed = vec![
            Object::Integer(100),
            Object::Integer(100),
            Object::Integer(0),
            Object::Integer(0),
        ];
        let page_box = PageBox::from_rect(&reversed).unwrap();
        assert_eq!((page_box.x, page_box.width), (0.0, 100.0));

        assert!(PageBox::from_rect(&[Object::Integer(0)]).is_err());
    }

    #[test]
    fn test_normalize_rotation() {
        assert_eq!(normalize_rotation(0), 0);
        assert_eq!(normalize_rotation(360), 0);
        assert_eq!(normalize_rotation(-90), 270);
        assert_eq!(normalize_rotation(450), 90);
        assert_eq!(normalize_rotation(-540), 180);
        assert_eq!(normalize_rotation(100), 90);
        assert_eq!(normalize_rotation(316), 0);
    }

    #[test]
    fn test_rotation_round_trip() {
        let mut doc = PdfDocument::new();
        let page_id = doc.add_page(A4_WIDTH, A4_HEIGHT).unwrap();
        assert_eq!(doc.rotation(1).unwrap(), 0);
        doc.set_rotation_of(page_id, -90).unwrap();
        assert_eq!(doc.rotation(1).unwrap(), 270);
    }

    #[test]
    fn test_add_page_resource_picks_free_names() {
        let mut doc = PdfDocument::new();
        let page_id = doc.add_page(A4_WIDTH, A4_HEIGHT).unwrap();
        let a = doc.inner_mut().add_object(Dictionary::new());
        let b = doc.inner_mut().add_object(Dictionary::new());

        assert_eq!(doc.add_page_resource(page_id, b"XObject", "Im", a).unwrap(), "Im1");
        assert_eq!(doc.add_page_resource(page_id, b"XObject", "Im", b).unwrap(), "Im2");
        // Same object again reuses its name
        assert_eq!(doc.add_page_resource(page_id, b"XObject", "Im", a).unwrap(), "Im1");
    }

    #[test]
    fn test_buffered_content_is_wrapped() {
        let mut doc = PdfDocument::new();
        let page_id = doc.add_page(A4_WIDTH, A4_HEIGHT).unwrap();
        doc.buffer_content(page_id, b"1 0 0 RG\n");
        doc.flush().unwrap();
        doc.buffer_content(page_id, b"0 0 1 RG\n");
        assert!(doc.has_pending_content());
        doc.flush().unwrap();
        assert!(!doc.has_pending_content());

        let content = String::from_utf8(doc.page_content(1).unwrap()).unwrap();
        let first = content.find("1 0 0 RG").unwrap();
        let second = content.find("0 0 1 RG").unwrap();
        let last_restore = content.rfind("Q\n").unwrap();
        assert!(content.starts_with("q\n"));
        assert!(first < last_restore && last_restore < second);
    }
}
