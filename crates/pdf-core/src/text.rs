//! Laying out and drawing text in the standard fonts

use crate::document::Color;
use crate::font::StandardFont;
use crate::Align;

/// One line of text, ready to be drawn
#[derive(Debug, Clone, Copy)]
pub struct TextRun<'a> {
    pub text: &'a str,
    pub font: StandardFont,
    /// Name of the font in the page's (or form's) resources, e.g. "F1"
    pub resource: &'a str,
    /// Font size in points
    pub size: f64,
    pub color: Color,
}

impl TextRun<'_> {
    /// Advance width of the run in points
    pub fn width(&self) -> f64 {
        self.font.text_width(self.text, self.size)
    }

    /// Content stream operators drawing the run
    ///
    /// `(x, y)` is the anchor on the baseline: the start of the run for
    /// [`Align::Left`], its middle for `Center` and its end for `Right`.
    pub fn operators(&self, x: f64, y: f64, align: Align) -> Vec<u8> {
        let start = match align {
            Align::Left => x,
            Align::Center => x - self.width() / 2.0,
            Align::Right => x - self.width(),
        };
        let Color { r, g, b } = self.color;
        format!(
            "BT\n{r} {g} {b} rg\n/{} {} Tf\n{start} {y} Td\n{} Tj\nET\n",
            self.resource,
            self.size,
            self.font.encode_text_hex(self.text)
        )
        .into_bytes()
    }
}

/// Offset of a box of `width` inside `container` for the given alignment
pub(crate) fn align_within(width: f64, container: f64, align: Align) -> f64 {
    match align {
        Align::Left => 0.0,
        Align::Center => (container - width) / 2.0,
        Align::Right => container - width,
    }
}

/// Greedily wrap one line of text to a maximum width
///
/// Words are separated by single spaces, so runs of spaces survive. A word
/// wider than `max_width` on its own is broken between characters. An empty
/// line yields one empty display line.
///
/// # Arguments
/// * `line` - Text without line breaks
/// * `font` - Font used for measurement
/// * `font_size` - Font size in points
/// * `max_width` - Available width in points
pub fn wrap_line(line: &str, font: StandardFont, font_size: f64, max_width: f64) -> Vec<String> {
    let fits = |text: &str| font.text_width(text, font_size) <= max_width;

    let mut lines = Vec::new();
    let mut current: Option<String> = None;

    for word in line.split(' ') {
        if let Some(open) = current.take() {
            let candidate = format!("{open} {word}");
            if fits(&candidate) {
                current = Some(candidate);
                continue;
            }
            lines.push(open);
        }

        if fits(word) {
            current = Some(word.to_string());
            continue;
        }

        // Break an over-long word
        let mut chunk = String::new();
        for ch in word.chars() {
            let mut candidate = chunk.clone();
            candidate.push(ch);
            if !chunk.is_empty() && !fits(&candidate) {
                lines.push(std::mem::take(&mut chunk));
                chunk.push(ch);
            } else {
                chunk = candidate;
            }
        }
        current = Some(chunk);
    }

    if let Some(open) = current {
        lines.push(open);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Width of `n` Courier characters at 12pt, plus slack for rounding
    fn columns(n: usize) -> f64 {
        n as f64 * 7.2 + 0.001
    }

    fn run(text: &str) -> TextRun<'_> {
        TextRun {
            text,
            font: StandardFont::Courier,
            resource: "F1",
            size: 10.0,
            color: Color::black(),
        }
    }

    fn ops(run: &TextRun, x: f64, align: Align) -> String {
        String::from_utf8(run.operators(x, 700.0, align)).unwrap()
    }

    #[test]
    fn test_align_within() {
        assert_eq!(align_within(100.0, 500.0, Align::Left), 0.0);
        assert_eq!(align_within(100.0, 500.0, Align::Center), 200.0);
        assert_eq!(align_within(100.0, 500.0, Align::Right), 400.0);
    }

    #[test]
    fn test_run_operators() {
        assert_eq!(
            ops(&run("Hi"), 100.0, Align::Left),
            "BT\n0 0 0 rg\n/F1 10 Tf\n100 700 Td\n<4869> Tj\nET\n"
        );
    }

    #[test]
    fn test_run_anchor() {
        // Courier is 600 units wide: "abcd" at 10pt is 24pt
        let abcd = run("abcd");
        assert_eq!(abcd.width(), 24.0);
        assert!(ops(&abcd, 100.0, Align::Center).contains("88 700 Td"));
        assert!(ops(&abcd, 100.0, Align::Right).contains("76 700 Td"));
        assert!(ops(&run(""), 100.0, Align::Center).contains("100 700 Td\n<> Tj"));
    }

    #[test]
    fn test_run_color_and_resource() {
        let gray = TextRun {
            resource: "Helv",
            color: Color::gray(0.5),
            ..run("A")
        };
        let text = ops(&gray, 0.0, Align::Left);
        assert!(text.contains("0.5 0.5 0.5 rg"));
        assert!(text.contains("/Helv 10 Tf"));
    }

    #[test]
    fn test_wrap_line() {
        let text = "Hello world this is a test";
        let lines = wrap_line(text, StandardFont::Courier, 12.0, columns(12));
        assert_eq!(lines, vec!["Hello world", "this is a", "test"]);
    }

    #[test]
    fn test_wrap_single_line() {
        let lines = wrap_line("Short", StandardFont::Courier, 12.0, 500.0);
        assert_eq!(lines, vec!["Short"]);
    }

    #[test]
    fn test_wrap_empty_line() {
        let lines = wrap_line("", StandardFont::Courier, 12.0, 500.0);
        assert_eq!(lines, vec![String::new()]);
    }

    #[test]
    fn test_wrap_exact_fit() {
        let lines = wrap_line("Hello world", StandardFont::Courier, 12.0, columns(11));
        assert_eq!(lines, vec!["Hello world"]);
    }

    #[test]
    fn test_wrap_just_over() {
        let lines = wrap_line("Hello world", StandardFont::Courier, 12.0, columns(10));
        assert_eq!(lines, vec!["Hello", "world"]);
    }

    #[test]
    fn test_wrap_keeps_inner_spacing() {
        let lines = wrap_line("a  b", StandardFont::Courier, 12.0, 500.0);
        assert_eq!(lines, vec!["a  b"]);
        let lines = wrap_line("    indented", StandardFont::Courier, 12.0, 500.0);
        assert_eq!(lines, vec!["    indented"]);
    }

    #[test]
    fn test_wrap_breaks_long_word() {
        let word = "x".repeat(25);
        let lines = wrap_line(&word, StandardFont::Courier, 12.0, columns(10));
        assert_eq!(lines, vec!["x".repeat(10), "x".repeat(10), "x".repeat(5)]);
    }

    #[test]
    fn test_wrap_long_word_after_short_one() {
        let text = format!("ab {}", "y".repeat(12));
        let lines = wrap_line(&text, StandardFont::Courier, 12.0, columns(10));
        assert_eq!(lines, vec!["ab".to_string(), "y".repeat(10), "yy".to_string()]);
    }

    #[test]
    fn test_wrap_proportional_font() {
        // "iiii" is much narrower than "WWWW" in Helvetica
        let narrow = wrap_line("iiii iiii", StandardFont::Helvetica, 10.0, 30.0);
        let wide = wrap_line("WWWW WWWW", StandardFont::Helvetica, 10.0, 30.0);
        assert_eq!(narrow.len(), 1);
        assert!(wide.len() > 2);
    }
}
