//! Document summaries

use crate::{PdfDocument, Result};
use serde::Serialize;

/// Size and rotation of one page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Page number (1-indexed)
    pub number: usize,
    pub width: f64,
    pub height: f64,
    pub rotation: i64,
}

/// What a caller needs to know about a document before choosing a transform
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInfo {
    pub page_count: usize,
    pub pages: Vec<PageInfo>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Vec<String>,
    pub producer: Option<String>,
    pub creator: Option<String>,
    /// Whether the document has an interactive form
    pub has_form: bool,
}

impl PdfDocument {
    /// Summarize page geometry, rotation and metadata
    pub fn info(&self) -> Result<DocumentInfo> {
        let mut pages = Vec::new();
        for (index, page_id) in self.page_ids().into_iter().enumerate() {
            let page_box = self.page_box_of(page_id)?;
            pages.push(PageInfo {
                number: index + 1,
                width: page_box.width,
                height: page_box.height,
                rotation: self.rotation_of(page_id),
            });
        }

        let has_form = self
            .catalog_id()
            .ok()
            .and_then(|id| self.inner().get_dictionary(id).ok())
            .is_some_and(|catalog| catalog.has(b"AcroForm"));

        let metadata = self.metadata();
        Ok(DocumentInfo {
            page_count: pages.len(),
            pages,
            title: metadata.title,
            author: metadata.author,
            subject: metadata.subject,
            keywords: metadata.keywords,
            producer: metadata.producer,
            creator: metadata.creator,
            has_form,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_info_summarizes_pages() {
        let mut doc = PdfDocument::new();
        doc.add_page(300.0, 400.0).unwrap();
        let second = doc.add_page(500.0, 600.0).unwrap();
        doc.set_rotation_of(second, 90).unwrap();

        let info = doc.info().unwrap();
        assert_eq!(info.page_count, 2);
        assert_eq!(
            info.pages[1],
            PageInfo {
                number: 2,
                width: 500.0,
                height: 600.0,
                rotation: 90,
            }
        );
        assert_eq!(info.producer.as_deref(), Some("pdfworks"));
        assert!(!info.has_form);
    }

    #[test]
    fn test_info_serializes_camel_case() {
        let mut doc = PdfDocument::new();
        doc.add_page(100.0, 100.0).unwrap();
        let json = serde_json::to_value(doc.info().unwrap()).unwrap();
        assert_eq!(json["pageCount"], 1);
        assert_eq!(json["hasForm"], false);
        assert_eq!(json["pages"][0]["width"], 100.0);
    }
}
