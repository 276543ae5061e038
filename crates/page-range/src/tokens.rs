//! Selection string tokenizer

use crate::{PageRangeError, Result};

/// One comma-separated element of a selection string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageToken {
    /// A single number, e.g. `3`
    Single(i64),
    /// An inclusive range as written, e.g. `5-8` or `8-5`
    Range(i64, i64),
}

impl PageToken {
    /// Lower and upper bound of the token, with reversed ranges swapped
    pub fn bounds(&self) -> (i64, i64) {
        match *self {
            PageToken::Single(n) => (n, n),
            PageToken::Range(a, b) => (a.min(b), a.max(b)),
        }
    }
}

/// Split a selection string into tokens
///
/// Empty elements (`"1,,2"`, trailing commas) are skipped. Whitespace around
/// numbers and around the dash is ignored. A leading minus is a sign, so
/// `"-2"` is a (negative) single number and `"-3-5"` a range; callers drop
/// whatever falls outside the document. Anything else that is not a number
/// is an error, and so is a string without any token.
pub fn parse_tokens(input: &str) -> Result<Vec<PageToken>> {
    let mut tokens = Vec::new();

    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let token = match range_separator(part) {
            Some(at) => {
                let start = parse_number(&part[..at], part)?;
                let end = parse_number(&part[at + 1..], part)?;
                PageToken::Range(start, end)
            }
            None => PageToken::Single(parse_number(part, part)?),
        };
        tokens.push(token);
    }

    if tokens.is_empty() {
        return Err(PageRangeError::Empty);
    }

    Ok(tokens)
}

/// Byte offset of the dash between two bounds, skipping a leading sign
fn range_separator(part: &str) -> Option<usize> {
    part.char_indices()
        .skip(1)
        .find(|&(_, c)| c == '-')
        .map(|(at, _)| at)
}

fn parse_number(text: &str, token: &str) -> Result<i64> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| PageRangeError::InvalidToken(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_singles_and_ranges() {
        let tokens = parse_tokens("1,3,5-8").unwrap();
        assert_eq!(
            tokens,
            vec![
                PageToken::Single(1),
                PageToken::Single(3),
                PageToken::Range(5, 8)
            ]
        );
    }

    #[test]
    fn test_whitespace_and_empty_parts() {
        let tokens = parse_tokens(" 2 , , 4 - 6 ,").unwrap();
        assert_eq!(tokens, vec![PageToken::Single(2), PageToken::Range(4, 6)]);
    }

    #[test]
    fn test_reversed_range_bounds() {
        let tokens = parse_tokens("8-5").unwrap();
        assert_eq!(tokens[0].bounds(), (5, 8));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse_tokens(""), Err(PageRangeError::Empty));
        assert_eq!(parse_tokens(" , ,"), Err(PageRangeError::Empty));
    }

    #[test]
    fn test_invalid_tokens() {
        assert_eq!(
            parse_tokens("1,abc"),
            Err(PageRangeError::InvalidToken("abc".to_string()))
        );
        assert_eq!(
            parse_tokens("3-"),
            Err(PageRangeError::InvalidToken("3-".to_string()))
        );
        assert!(parse_tokens("1-2-3").is_err());
        assert!(parse_tokens("-").is_err());
    }

    #[test]
    fn test_negative_numbers() {
        assert_eq!(
            parse_tokens("-2, -3-5, 4--1").unwrap(),
            vec![
                PageToken::Single(-2),
                PageToken::Range(-3, 5),
                PageToken::Range(4, -1)
            ]
        );
    }
}
