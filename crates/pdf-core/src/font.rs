//! Standard Type1 fonts
//!
//! The engine draws with the base-14 fonts every PDF reader ships, so nothing
//! is embedded. Metrics come from the Adobe AFM files; text is encoded with
//! WinAnsiEncoding.

use lopdf::{Dictionary, Object};

/// Base-14 fonts used by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    Courier,
}

/// Helvetica advance widths for WinAnsi codes 32..=126
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // space../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p..~
];

/// Helvetica-Bold advance widths for WinAnsi codes 32..=126
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // space../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 0..?
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // P.._
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // `..o
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // p..~
];

/// WinAnsi codes 0x80..=0x9F that differ from Latin-1
const WIN_ANSI_EXTRAS: [(char, u8); 27] = [
    ('€', 0x80),
    ('‚', 0x82),
    ('ƒ', 0x83),
    ('„', 0x84),
    ('…', 0x85),
    ('†', 0x86),
    ('‡', 0x87),
    ('ˆ', 0x88),
    ('‰', 0x89),
    ('Š', 0x8A),
    ('‹', 0x8B),
    ('Œ', 0x8C),
    ('Ž', 0x8E),
    ('‘', 0x91),
    ('’', 0x92),
    ('“', 0x93),
    ('”', 0x94),
    ('•', 0x95),
    ('–', 0x96),
    ('—', 0x97),
    ('˜', 0x98),
    ('™', 0x99),
    ('š', 0x9A),
    ('›', 0x9B),
    ('œ', 0x9C),
    ('ž', 0x9E),
    ('Ÿ', 0x9F),
];

impl StandardFont {
    /// PostScript name used as /BaseFont
    pub fn base_font(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::Courier => "Courier",
        }
    }

    /// Ascender in 1/1000 em
    pub fn ascender(&self) -> i32 {
        match self {
            StandardFont::Helvetica | StandardFont::HelveticaBold => 718,
            StandardFont::Courier => 629,
        }
    }

    /// Descender in 1/1000 em (negative)
    pub fn descender(&self) -> i32 {
        match self {
            StandardFont::Helvetica | StandardFont::HelveticaBold => -207,
            StandardFont::Courier => -157,
        }
    }

    /// Advance width of one WinAnsi code in 1/1000 em
    pub fn code_width(&self, code: u8) -> u16 {
        match self {
            StandardFont::Courier => 600,
            StandardFont::Helvetica => match code {
                32..=126 => HELVETICA_WIDTHS[(code - 32) as usize],
                0x85 | 0x89 | 0x97 | 0x99 => 1000,
                0x91 | 0x92 | 0x82 => 222,
                0x93 | 0x94 | 0x84 => 333,
                0x95 => 350,
                // Accented Latin-1 letters are close to their base letters
                _ => 556,
            },
            StandardFont::HelveticaBold => match code {
                32..=126 => HELVETICA_BOLD_WIDTHS[(code - 32) as usize],
                0x85 | 0x89 | 0x97 | 0x99 => 1000,
                0x91 | 0x92 | 0x82 => 278,
                0x93 | 0x94 | 0x84 => 500,
                0x95 => 350,
                _ => 611,
            },
        }
    }

    /// Width of `text` in points at `font_size`
    pub fn text_width(&self, text: &str, font_size: f64) -> f64 {
        let units: u32 = encode_win_ansi(text)
            .into_iter()
            .map(|code| self.code_width(code) as u32)
            .sum();
        units as f64 * font_size / 1000.0
    }

    /// Height of the ascender-to-descender box in points at `font_size`
    pub fn height(&self, font_size: f64) -> f64 {
        (self.ascender() - self.descender()) as f64 * font_size / 1000.0
    }

    /// Font dictionary referencing the non-embedded base font
    pub fn to_dictionary(&self) -> Dictionary {
        Dictionary::from_iter(vec![
            ("Type", "Font".into()),
            ("Subtype", "Type1".into()),
            ("BaseFont", Object::Name(self.base_font().as_bytes().to_vec())),
            ("Encoding", "WinAnsiEncoding".into()),
        ])
    }

    /// Encode text as a hex string for the Tj operator
    pub fn encode_text_hex(&self, text: &str) -> String {
        let mut result = String::with_capacity(text.len() * 2 + 2);
        result.push('<');
        for code in encode_win_ansi(text) {
            result.push_str(&format!("{code:02X}"));
        }
        result.push('>');
        result
    }
}

/// Map text to WinAnsi codes; characters outside the encoding become `?`
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_code).collect()
}

fn win_ansi_code(c: char) -> u8 {
    let cp = c as u32;
    match cp {
        0x20..=0x7E | 0xA0..=0xFF => cp as u8,
        _ => WIN_ANSI_EXTRAS
            .iter()
            .find(|(ch, _)| *ch == c)
            .map(|(_, code)| *code)
            .unwrap_or(b'?'),
    }
}
