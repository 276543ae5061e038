//! Typed options per transform kind

use crate::{JobError, Result, TransformKind};
use pdf_core::defaults::WATERMARK_OPACITY;
use pdf_core::{CompressionLevel, MetadataUpdate, PageNumberPosition};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// A transform kind together with its validated options
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    Merge,
    /// 1-indexed pages in output order; `None` extracts every page
    Split { pages: Option<Vec<i64>> },
    DeletePages { pages_to_delete: String },
    ReorderPages { new_order: Vec<i64> },
    AddBlankPages { insertions: String },
    /// 0-indexed page -> delta in degrees
    Rotate { rotations: BTreeMap<usize, i64> },
    AddWatermark { text: String, opacity: f64 },
    AddPageNumbers { position: PageNumberPosition },
    EditMetadata(MetadataUpdate),
    Flatten,
    Compress { level: CompressionLevel },
    ImageToPdf,
    TextToPdf,
}

#[derive(Deserialize)]
struct SplitOptions {
    #[serde(default)]
    pages: Option<Vec<i64>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeletePagesOptions {
    pages_to_delete: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReorderPagesOptions {
    new_order: Vec<i64>,
}

#[derive(Deserialize)]
struct AddBlankPagesOptions {
    insertions: String,
}

#[derive(Deserialize)]
struct RotateOptions {
    rotations: BTreeMap<String, i64>,
}

#[derive(Deserialize)]
struct WatermarkOptions {
    text: String,
    #[serde(default = "default_opacity")]
    opacity: f64,
}

fn default_opacity() -> f64 {
    WATERMARK_OPACITY
}

#[derive(Deserialize)]
struct PageNumberOptions {
    #[serde(default)]
    position: PageNumberPosition,
}

#[derive(Deserialize)]
struct MetadataOptions {
    title: Option<String>,
    author: Option<String>,
    subject: Option<String>,
    keywords: Option<String>,
}

#[derive(Deserialize)]
struct CompressOptions {
    #[serde(default)]
    level: CompressionLevel,
}

impl Transform {
    /// Validate `options` for `kind`
    ///
    /// Missing options (`null`) are treated as an empty object. Page range
    /// strings are checked for syntax here; whether they select anything is
    /// only known once the document is loaded.
    pub fn parse(kind: TransformKind, options: &Value) -> Result<Transform> {
        let transform = match kind {
            TransformKind::Merge => Transform::Merge,
            TransformKind::Split => {
                let SplitOptions { pages } = decode(kind, options)?;
                Transform::Split { pages }
            }
            TransformKind::DeletePages => {
                let DeletePagesOptions { pages_to_delete } = decode(kind, options)?;
                page_range::parse_tokens(&pages_to_delete).map_err(pdf_core::PdfError::from)?;
                Transform::DeletePages { pages_to_delete }
            }
            TransformKind::ReorderPages => {
                let ReorderPagesOptions { new_order } = decode(kind, options)?;
                Transform::ReorderPages { new_order }
            }
            TransformKind::AddBlankPages => {
                let AddBlankPagesOptions { insertions } = decode(kind, options)?;
                page_range::parse_tokens(&insertions).map_err(pdf_core::PdfError::from)?;
                Transform::AddBlankPages { insertions }
            }
            TransformKind::Rotate => {
                let RotateOptions { rotations } = decode(kind, options)?;
                Transform::Rotate {
                    rotations: page_indices(rotations)?,
                }
            }
            TransformKind::AddWatermark => {
                let WatermarkOptions { text, opacity } = decode(kind, options)?;
                Transform::AddWatermark { text, opacity }
            }
            TransformKind::AddPageNumbers => {
                let PageNumberOptions { position } = decode(kind, options)?;
                Transform::AddPageNumbers { position }
            }
            TransformKind::EditMetadata => {
                let MetadataOptions {
                    title,
                    author,
                    subject,
                    keywords,
                } = decode(kind, options)?;
                Transform::EditMetadata(MetadataUpdate {
                    title,
                    author,
                    subject,
                    keywords,
                })
            }
            TransformKind::Flatten => Transform::Flatten,
            TransformKind::Compress => {
                let CompressOptions { level } = decode(kind, options)?;
                Transform::Compress { level }
            }
            TransformKind::ImageToPdf => Transform::ImageToPdf,
            TransformKind::TextToPdf => Transform::TextToPdf,
        };
        Ok(transform)
    }

    pub fn kind(&self) -> TransformKind {
        match self {
            Transform::Merge => TransformKind::Merge,
            Transform::Split { .. } => TransformKind::Split,
            Transform::DeletePages { .. } => TransformKind::DeletePages,
            Transform::ReorderPages { .. } => TransformKind::ReorderPages,
            Transform::AddBlankPages { .. } => TransformKind::AddBlankPages,
            Transform::Rotate { .. } => TransformKind::Rotate,
            Transform::AddWatermark { .. } => TransformKind::AddWatermark,
            Transform::AddPageNumbers { .. } => TransformKind::AddPageNumbers,
            Transform::EditMetadata(_) => TransformKind::EditMetadata,
            Transform::Flatten => TransformKind::Flatten,
            Transform::Compress { .. } => TransformKind::Compress,
            Transform::ImageToPdf => TransformKind::ImageToPdf,
            Transform::TextToPdf => TransformKind::TextToPdf,
        }
    }
}

fn decode<T: DeserializeOwned>(kind: TransformKind, options: &Value) -> Result<T> {
    let options = match options {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other.clone(),
    };
    serde_json::from_value(options)
        .map_err(|e| JobError::validation(format!("Invalid options for {kind}: {e}")))
}

fn page_indices(rotations: BTreeMap<String, i64>) -> Result<BTreeMap<usize, i64>> {
    rotations
        .into_iter()
        .map(|(key, delta)| {
            key.trim()
                .parse::<usize>()
                .map(|index| (index, delta))
                .map_err(|_| JobError::validation(format!("Invalid page index: \"{key}\"")))
        })
        .collect()
}
