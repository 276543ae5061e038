//! Page Range - page selection parsing shared by the page tools
//!
//! This crate provides:
//! - Tokenizing selection strings such as `"1,3,5-8"`
//! - Resolving a selection into a set of 1-indexed pages within a document
//! - Resolving "insert after" positions for blank page insertion
//! - Translating caller page lists (1-indexed) into 0-indexed positions
//!
//! Bounds policy: pages outside `[1, page_count]` are dropped, ranges are
//! clamped into the document and reversed bounds (`"8-5"`) are swapped.
//! Tokens that are not numbers are rejected.
//!
//! # Example
//!
//! ```
//! use page_range::parse_page_set;
//!
//! let pages = parse_page_set("2,4-6", 8).unwrap();
//! assert_eq!(pages.into_iter().collect::<Vec<_>>(), vec![2, 4, 5, 6]);
//! ```

mod insertion;
mod selection;
mod tokens;

pub use insertion::parse_insertion_points;
pub use selection::{parse_page_set, select_indices};
pub use tokens::{parse_tokens, PageToken};

use thiserror::Error;

/// Errors that can occur while parsing page selections
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageRangeError {
    #[error("No page numbers given")]
    Empty,

    #[error("Invalid page token: \"{0}\"")]
    InvalidToken(String),
}

/// Result type for page range parsing
pub type Result<T> = std::result::Result<T, PageRangeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(PageRangeError::Empty.to_string(), "No page numbers given");
        assert_eq!(
            PageRangeError::InvalidToken("x".to_string()).to_string(),
            "Invalid page token: \"x\""
        );
    }
}
