//! PDF Core - PDF document mutation engine
//!
//! This crate provides functionality for:
//! - Loading PDF documents from bytes and saving them back, optionally compacted
//! - Copying pages between documents
//! - Rotating, inserting and annotating pages in place
//! - Editing document metadata and flattening forms
//! - Building new documents from images and plain text
//!
//! Operations come in two classes. [`mutate`] functions change a document in
//! place, [`transform`] functions build a new document from one or more
//! sources. Every operation reports into a [`Progress`], which is also where
//! cancellation is observed.
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{mutate, PdfDocument, Progress, SaveOptions};
//!
//! let mut doc = PdfDocument::from_bytes(&std::fs::read("input.pdf")?)?;
//! let mut progress = Progress::new();
//! mutate::add_watermark(&mut doc, "CONFIDENTIAL", 0.3, &mut progress)?;
//! let bytes = doc.to_bytes(SaveOptions::default())?;
//! ```

mod copy;
pub mod defaults;
mod document;
mod font;
mod form;
mod image;
mod info;
mod metadata;
pub mod mutate;
mod progress;
mod text;
pub mod transform;

pub use document::{Color, PageBox, PdfDocument, SaveOptions};
pub use font::StandardFont;
pub use image::{ColorSpace, ImageFilter, ImageFormat, ImageXObject};
pub use info::{DocumentInfo, PageInfo};
pub use metadata::{Metadata, MetadataUpdate};
pub use mutate::PageNumberPosition;
pub use progress::Progress;
pub use text::{wrap_line, TextRun};
pub use transform::{CompressionLevel, ImageInput};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to load PDF: {0}")]
    ParseError(String),

    #[error("{0}")]
    ValidationError(String),

    #[error("Failed to save PDF: {0}")]
    SerializeError(String),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("Malformed document structure: {0}")]
    Structure(String),

    #[error("Job cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Broad category of a [`PdfError`], as reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Input bytes are not a loadable document (or image)
    Parse,
    /// A request that makes no sense against a valid document
    Validation,
    /// Re-encoding the mutated document failed
    Serialize,
    /// The caller withdrew the job
    Cancelled,
}

impl PdfError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            PdfError::ParseError(_)
            | PdfError::ImageError(_)
            | PdfError::Structure(_)
            | PdfError::LopdfError(_) => ErrorKind::Parse,
            PdfError::ValidationError(_) | PdfError::InvalidPage(..) => ErrorKind::Validation,
            PdfError::SerializeError(_) | PdfError::IoError(_) => ErrorKind::Serialize,
            PdfError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

impl From<page_range::PageRangeError> for PdfError {
    fn from(err: page_range::PageRangeError) -> Self {
        PdfError::ValidationError(err.to_string())
    }
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Text alignment options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_default() {
        assert_eq!(Align::default(), Align::Left);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            PdfError::ParseError("bad".into()).kind(),
            ErrorKind::Parse
        );
        assert_eq!(
            PdfError::ImageError("bad".into()).kind(),
            ErrorKind::Parse
        );
        assert_eq!(
            PdfError::ValidationError("bad".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(PdfError::InvalidPage(4, 3).kind(), ErrorKind::Validation);
        assert_eq!(
            PdfError::SerializeError("bad".into()).kind(),
            ErrorKind::Serialize
        );
        assert_eq!(PdfError::Cancelled.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn test_page_range_errors_are_validation() {
        let err: PdfError = page_range::PageRangeError::Empty.into();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "No page numbers given");
    }

    #[test]
    fn test_error_kind_names() {
        assert_eq!(
            serde_json::to_value(ErrorKind::Validation).unwrap(),
            serde_json::json!("validation")
        );
    }

    #[test]
    fn test_validation_message_is_bare() {
        let err = PdfError::ValidationError("Cannot delete all pages".into());
        assert_eq!(err.to_string(), "Cannot delete all pages");
    }
}
