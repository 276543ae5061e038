//! Raster images as PDF image XObjects

use crate::{PdfError, Result};
use image::{ColorType, DynamicImage, ImageDecoder, ImageReader};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::io::{Cursor, Write};

impl From<image::ImageError> for PdfError {
    fn from(err: image::ImageError) -> Self {
        PdfError::ImageError(err.to_string())
    }
}

const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Image encodings accepted for conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    /// Map a declared MIME type to a format
    ///
    /// Only `image/jpeg`, `image/jpg` and `image/png` are accepted.
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        match mime_type.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
            "image/png" => Some(ImageFormat::Png),
            _ => None,
        }
    }

    /// Identify the encoding from the file signature
    pub fn sniff(data: &[u8]) -> Result<Self> {
        if data.starts_with(PNG_SIGNATURE) {
            Ok(ImageFormat::Png)
        } else if data.starts_with(JPEG_SIGNATURE) {
            Ok(ImageFormat::Jpeg)
        } else {
            Err(PdfError::ImageError(
                "Not a JPEG or PNG file".to_string(),
            ))
        }
    }
}

/// Color space of the decoded samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
}

impl ColorSpace {
    fn pdf_name(self) -> &'static str {
        match self {
            ColorSpace::Gray => "DeviceGray",
            ColorSpace::Rgb => "DeviceRGB",
            ColorSpace::Cmyk => "DeviceCMYK",
        }
    }
}

/// How the sample bytes are encoded in the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFilter {
    /// The original JPEG file, passed through
    Dct,
    /// zlib-compressed raw samples
    Flate,
}

impl ImageFilter {
    fn pdf_name(self) -> &'static str {
        match self {
            ImageFilter::Dct => "DCTDecode",
            ImageFilter::Flate => "FlateDecode",
        }
    }
}

/// An image ready to be embedded
#[derive(Debug, Clone)]
pub struct ImageXObject {
    pub width: u32,
    pub height: u32,
    pub color_space: ColorSpace,
    pub filter: ImageFilter,
    /// Encoded samples, 8 bits per component
    pub data: Vec<u8>,
    /// zlib-compressed alpha channel, embedded as /SMask
    pub alpha: Option<Vec<u8>>,
}

/// Frame header of a JPEG file
struct JpegFrame {
    width: u32,
    height: u32,
    components: u8,
}

/// Walk the marker segments up to the first start-of-frame
fn jpeg_frame(data: &[u8]) -> Option<JpegFrame> {
    let mut pos = 2;
    loop {
        let marker = match data.get(pos..pos + 2)? {
            [0xFF, 0xFF] => {
                // fill byte
                pos += 1;
                continue;
            }
            [0xFF, marker] => *marker,
            _ => return None,
        };

        // Markers without a length field
        if marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
            pos += 2;
            continue;
        }

        let segment = data.get(pos + 2..)?;
        let length = u16::from_be_bytes([*segment.first()?, *segment.get(1)?]) as usize;
        if length < 2 {
            return None;
        }

        // SOF0-SOF15, minus DHT, JPG and DAC
        if matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC) {
            let header = segment.get(2..8)?;
            return Some(JpegFrame {
                height: u16::from_be_bytes([header[1], header[2]]) as u32,
                width: u16::from_be_bytes([header[3], header[4]]) as u32,
                components: header[5],
            });
        }

        pos += 2 + length;
    }
}

fn zlib(raw: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(raw)?;
    Ok(encoder.finish()?)
}

impl ImageXObject {
    /// Build from JPEG or PNG bytes, whichever the signature says
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        match ImageFormat::sniff(data)? {
            ImageFormat::Jpeg => Self::from_jpeg(data),
            ImageFormat::Png => Self::from_png(data),
        }
    }

    /// Embed a JPEG as-is
    ///
    /// Only the frame header is read; the scan data is never decoded.
    pub fn from_jpeg(data: &[u8]) -> Result<Self> {
        let frame = jpeg_frame(data)
            .ok_or_else(|| PdfError::ImageError("JPEG has no frame header".to_string()))?;
        if frame.width == 0 || frame.height == 0 {
            return Err(PdfError::ImageError("JPEG has no pixels".to_string()));
        }

        let color_space = match frame.components {
            1 => ColorSpace::Gray,
            3 => ColorSpace::Rgb,
            4 => ColorSpace::Cmyk,
            n => {
                return Err(PdfError::ImageError(format!(
                    "Unsupported JPEG component count: {n}"
                )))
            }
        };

        Ok(Self {
            width: frame.width,
            height: frame.height,
            color_space,
            filter: ImageFilter::Dct,
            data: data.to_vec(),
            alpha: None,
        })
    }

    /// Decode a PNG and re-encode its samples with Flate
    ///
    /// Gray images stay gray. An alpha channel that is not fully opaque
    /// becomes a soft mask; an opaque one is dropped.
    pub fn from_png(data: &[u8]) -> Result<Self> {
        let decoder = ImageReader::new(Cursor::new(data))
            .with_guessed_format()?
            .into_decoder()?;
        let (width, height) = decoder.dimensions();
        let color_type = decoder.color_type();
        let image = DynamicImage::from_decoder(decoder)?;

        let (samples, color_space, alpha) = match color_type {
            ColorType::L8 | ColorType::L16 => (image.into_luma8().into_raw(), ColorSpace::Gray, None),
            ColorType::La8 | ColorType::La16 => {
                let (gray, alpha) = split_alpha(image.into_luma_alpha8().into_raw(), 1);
                (gray, ColorSpace::Gray, Some(alpha))
            }
            ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => {
                let (rgb, alpha) = split_alpha(image.into_rgba8().into_raw(), 3);
                (rgb, ColorSpace::Rgb, Some(alpha))
            }
            _ => (image.into_rgb8().into_raw(), ColorSpace::Rgb, None),
        };

        let alpha = alpha
            .filter(|channel| channel.iter().any(|&a| a < u8::MAX))
            .map(|channel| zlib(&channel))
            .transpose()?;

        Ok(Self {
            width,
            height,
            color_space,
            filter: ImageFilter::Flate,
            data: zlib(&samples)?,
            alpha,
        })
    }

    /// The image stream, without its soft mask
    pub fn to_stream(&self) -> Stream {
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => self.width as i64,
            "Height" => self.height as i64,
            "ColorSpace" => self.color_space.pdf_name(),
            "BitsPerComponent" => 8,
            "Filter" => self.filter.pdf_name(),
        };
        if self.color_space == ColorSpace::Cmyk && self.filter == ImageFilter::Dct {
            // Adobe CMYK JPEGs store inverted samples
            let decode: Vec<Object> = [1, 0, 1, 0, 1, 0, 1, 0].into_iter().map(Object::Integer).collect();
            dict.set("Decode", decode);
        }

        let mut stream = Stream::new(dict, self.data.clone());
        stream.allows_compression = false;
        stream
    }

    /// Add the image and its soft mask to `doc`
    ///
    /// # Returns
    /// Object ID of the image XObject
    pub fn embed(&self, doc: &mut Document) -> ObjectId {
        let mut stream = self.to_stream();

        if let Some(alpha) = &self.alpha {
            let mut mask = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => self.width as i64,
                    "Height" => self.height as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                    "Filter" => "FlateDecode",
                },
                alpha.clone(),
            );
            mask.allows_compression = false;
            stream.dict.set("SMask", doc.add_object(mask));
        }

        doc.add_object(stream)
    }
}

/// Split interleaved samples into color and alpha planes
fn split_alpha(interleaved: Vec<u8>, color_channels: usize) -> (Vec<u8>, Vec<u8>) {
    let pixel = color_channels + 1;
    let pixels = interleaved.len() / pixel;
    let mut color = Vec::with_capacity(pixels * color_channels);
    let mut alpha = Vec::with_capacity(pixels);
    for chunk in interleaved.chunks_exact(pixel) {
        color.extend_from_slice(&chunk[..color_channels]);
        alpha.push(chunk[color_channels]);
    }
    (color, alpha)
}

/// Generate operators to draw image at position
///
/// # Arguments
/// * `image_name` - Image resource name (e.g., "Im1")
/// * `x` - X coordinate in points
/// * `y` - Y coordinate in points (from bottom, PDF coordinates)
/// * `width` - Image width in points
/// * `height` - Image height in points
///
/// # Returns
/// PDF content stream operators as bytes
pub fn generate_image_operators(
    image_name: &str,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
) -> Vec<u8> {
    format!("q\n{width} 0 0 {height} {x} {y} cm\n/{image_name} Do\nQ\n").into_bytes()
}
