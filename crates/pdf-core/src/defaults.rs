//! Engine constants

/// A4 width in points
pub const A4_WIDTH: f64 = 595.28;

/// A4 height in points
pub const A4_HEIGHT: f64 = 841.89;

/// Written as Producer and Creator
pub const TOOL_IDENTIFIER: &str = "pdfworks";

/// Gray level of watermark text
pub const WATERMARK_GRAY: f32 = 0.5;

/// Watermark font size is the page width divided by this
pub const WATERMARK_SIZE_DIVISOR: f64 = 8.0;

/// Watermark opacity when a request does not give one
pub const WATERMARK_OPACITY: f64 = 0.3;

/// Watermark angle in degrees, counter-clockwise
pub const WATERMARK_ANGLE: f64 = 45.0;

pub const PAGE_NUMBER_FONT_SIZE: f64 = 12.0;

/// Distance of page numbers from the page edges
pub const PAGE_NUMBER_MARGIN: f64 = 30.0;

pub const TEXT_FONT_SIZE: f64 = 12.0;

/// Margin on all four sides of text-to-pdf pages
pub const TEXT_MARGIN: f64 = 50.0;

/// Line advance as a multiple of the font size
pub const TEXT_LINE_HEIGHT: f64 = 1.2;

/// Tabs in plain text are expanded to this many spaces
pub const TAB_WIDTH: usize = 4;
