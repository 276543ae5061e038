//! Document information dictionary

use crate::defaults::TOOL_IDENTIFIER;
use crate::{PdfError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};

/// Document-level metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Vec<String>,
    pub producer: Option<String>,
    pub creator: Option<String>,
}

/// Fields to change in an edit-metadata request
///
/// Values are trimmed; absent or blank fields leave the document untouched.
/// `keywords` is a comma-separated list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
}

impl Metadata {
    /// Read metadata from the document's Info dictionary
    pub fn read(doc: &Document) -> Metadata {
        let Some(info) = info_dictionary(doc) else {
            return Metadata::default();
        };

        Metadata {
            title: text_entry(info, b"Title"),
            author: text_entry(info, b"Author"),
            subject: text_entry(info, b"Subject"),
            keywords: text_entry(info, b"Keywords")
                .map(|k| split_keywords(&k))
                .unwrap_or_default(),
            producer: text_entry(info, b"Producer"),
            creator: text_entry(info, b"Creator"),
        }
    }

    /// Write every field into the Info dictionary; `None` removes the entry
    pub fn write(&self, doc: &mut Document) -> Result<()> {
        let info = info_dictionary_mut(doc)?;
        set_text_entry(info, b"Title", self.title.as_deref());
        set_text_entry(info, b"Author", self.author.as_deref());
        set_text_entry(info, b"Subject", self.subject.as_deref());
        let keywords = self.keywords.join(", ");
        set_text_entry(
            info,
            b"Keywords",
            (!keywords.is_empty()).then_some(keywords.as_str()),
        );
        set_text_entry(info, b"Producer", self.producer.as_deref());
        set_text_entry(info, b"Creator", self.creator.as_deref());
        Ok(())
    }

    /// Apply the non-blank fields of `update`
    pub fn apply(&mut self, update: &MetadataUpdate) {
        if let Some(title) = non_blank(update.title.as_deref()) {
            self.title = Some(title.to_string());
        }
        if let Some(author) = non_blank(update.author.as_deref()) {
            self.author = Some(author.to_string());
        }
        if let Some(subject) = non_blank(update.subject.as_deref()) {
            self.subject = Some(subject.to_string());
        }
        if let Some(keywords) = non_blank(update.keywords.as_deref()) {
            self.keywords = split_keywords(keywords);
        }
    }

    /// Set Producer and Creator to the tool identifier
    pub fn stamp_tool(&mut self) {
        self.producer = Some(TOOL_IDENTIFIER.to_string());
        self.creator = Some(TOOL_IDENTIFIER.to_string());
    }

    /// Copy the descriptive fields of `other`
    pub fn copy_descriptive(&mut self, other: &Metadata) {
        self.title = other.title.clone();
        self.author = other.author.clone();
        self.subject = other.subject.clone();
        self.keywords = other.keywords.clone();
    }

    /// Drop the descriptive fields, keeping Producer and Creator
    pub fn clear_descriptive(&mut self) {
        self.title = None;
        self.author = None;
        self.subject = None;
        self.keywords.clear();
    }
}

/// Split a comma-separated keyword list, dropping empty entries
pub fn split_keywords(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn info_dictionary_mut(doc: &mut Document) -> Result<&mut Dictionary> {
    let info_id = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) if doc.get_dictionary(*id).is_ok() => *id,
        Ok(Object::Dictionary(dict)) => {
            let dict = dict.clone();
            add_info(doc, dict)
        }
        _ => add_info(doc, Dictionary::new()),
    };

    doc.get_dictionary_mut(info_id)
        .map_err(|_| PdfError::Structure("Info is not a dictionary".to_string()))
}

fn add_info(doc: &mut Document, dict: Dictionary) -> ObjectId {
    let id = doc.add_object(dict);
    doc.trailer.set("Info", Object::Reference(id));
    id
}

fn text_entry(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        _ => None,
    }
}

fn set_text_entry(dict: &mut Dictionary, key: &[u8], value: Option<&str>) {
    match value {
        Some(value) => dict.set(key.to_vec(), encode_text_string(value)),
        None => {
            dict.remove(key);
        }
    }
}

/// Encode a PDF text string: literal for ASCII, UTF-16BE with BOM otherwise
pub fn encode_text_string(value: &str) -> Object {
    if value.is_ascii() {
        return Object::String(value.as_bytes().to_vec(), StringFormat::Literal);
    }

    let mut bytes = vec![0xFE, 0xFF];
    for unit in value.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Decode a PDF text string (UTF-16BE with BOM, otherwise byte-per-char)
pub fn decode_text_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}
