//! "Insert after" positions for blank page insertion

use crate::tokens::parse_tokens;
use crate::Result;
use std::collections::BTreeSet;

/// Parse a list of 0-indexed "insert after" positions
///
/// `0` means before the first page, `n` means after page `n`. Duplicates
/// collapse, negative positions are dropped and positions past the last page
/// are clamped to `page_count` (append at the end). Ranges expand to every
/// position they cover.
///
/// The set iterates ascending; callers apply it in reverse so that earlier
/// insertions do not shift later targets.
pub fn parse_insertion_points(input: &str, page_count: u32) -> Result<BTreeSet<u32>> {
    let mut points = BTreeSet::new();
    let max = i64::from(page_count);

    for token in parse_tokens(input)? {
        let (lo, hi) = token.bounds();
        if hi < 0 {
            log::debug!("insertion point {token:?} is negative, ignored");
            continue;
        }
        for position in lo.max(0)..=hi {
            points.insert(position.min(max) as u32);
            if position >= max {
                break;
            }
        }
    }

    Ok(points)
}
