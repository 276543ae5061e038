//! Resolving selections against a document's page count

use crate::tokens::parse_tokens;
use crate::Result;
use std::collections::BTreeSet;

/// Parse a selection string into the set of 1-indexed pages it covers
///
/// Pages outside `[1, page_count]` are dropped and ranges are clamped into
/// the document, so the result may be empty even for a well-formed input.
///
/// # Arguments
/// * `input` - Selection such as `"1,3,5-8"`
/// * `page_count` - Number of pages in the document
pub fn parse_page_set(input: &str, page_count: u32) -> Result<BTreeSet<u32>> {
    let mut pages = BTreeSet::new();
    let max = i64::from(page_count);

    for token in parse_tokens(input)? {
        let (lo, hi) = token.bounds();
        let start = lo.max(1);
        let end = hi.min(max);
        if start > end {
            log::debug!("selection {token:?} is outside 1..={page_count}, ignored");
            continue;
        }
        for page in start..=end {
            pages.insert(page as u32);
        }
    }

    Ok(pages)
}

/// Translate caller page numbers (1-indexed) into 0-indexed positions
///
/// Order and duplicates are preserved; numbers outside `[1, page_count]`
/// are dropped.
pub fn select_indices(pages: &[i64], page_count: usize) -> Vec<usize> {
    pages
        .iter()
        .filter_map(|&page| {
            if page >= 1 && (page as u64) <= page_count as u64 {
                Some((page - 1) as usize)
            } else {
                log::debug!("page {page} is outside 1..={page_count}, ignored");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PageRangeError;
    use pretty_assertions::assert_eq;

    fn set(input: &str, page_count: u32) -> Vec<u32> {
        parse_page_set(input, page_count)
            .unwrap()
            .into_iter()
            .collect()
    }

    #[test]
    fn test_singles_and_ranges() {
        assert_eq!(set("2,4-6", 8), vec![2, 4, 5, 6]);
        assert_eq!(set("1,3,5-8", 8), vec![1, 3, 5, 6, 7, 8]);
    }

    #[test]
    fn test_overlapping_selection_is_deduplicated() {
        assert_eq!(set("1-3,2,3-4", 10), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_reversed_range() {
        assert_eq!(set("6-4", 8), vec![4, 5, 6]);
    }

    #[test]
    fn test_range_clamped_to_document() {
        assert_eq!(set("0-3", 5), vec![1, 2, 3]);
        assert_eq!(set("4-99", 5), vec![4, 5]);
    }

    #[test]
    fn test_out_of_bounds_dropped() {
        assert_eq!(set("0,9,2", 5), vec![2]);
        assert_eq!(set("7-9", 5), Vec::<u32>::new());
        assert_eq!(set("1,-2", 3), vec![1]);
        assert_eq!(set("-3-2", 5), vec![1, 2]);
    }

    #[test]
    fn test_invalid_selection() {
        assert_eq!(parse_page_set("", 5), Err(PageRangeError::Empty));
        assert!(parse_page_set("one", 5).is_err());
    }

    #[test]
    fn test_select_indices_keeps_order_and_duplicates() {
        assert_eq!(select_indices(&[3, 1, 3], 5), vec![2, 0, 2]);
    }

    #[test]
    fn test_select_indices_drops_out_of_range() {
        assert_eq!(select_indices(&[0, 2, 6, -1, 5], 5), vec![1, 4]);
        assert!(select_indices(&[7, 8], 5).is_empty());
    }
}
