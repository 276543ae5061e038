//! Request and message types

use pdf_core::ErrorKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of operations a job can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransformKind {
    Merge,
    Split,
    DeletePages,
    ReorderPages,
    AddBlankPages,
    Rotate,
    AddWatermark,
    AddPageNumbers,
    EditMetadata,
    Flatten,
    Compress,
    ImageToPdf,
    TextToPdf,
}

impl TransformKind {
    /// Wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            TransformKind::Merge => "merge",
            TransformKind::Split => "split",
            TransformKind::DeletePages => "delete-pages",
            TransformKind::ReorderPages => "reorder-pages",
            TransformKind::AddBlankPages => "add-blank-pages",
            TransformKind::Rotate => "rotate",
            TransformKind::AddWatermark => "add-watermark",
            TransformKind::AddPageNumbers => "add-page-numbers",
            TransformKind::EditMetadata => "edit-metadata",
            TransformKind::Flatten => "flatten",
            TransformKind::Compress => "compress",
            TransformKind::ImageToPdf => "image-to-pdf",
            TransformKind::TextToPdf => "text-to-pdf",
        }
    }

    /// Whether the kind combines any number of inputs into one output
    pub fn accepts_many_inputs(&self) -> bool {
        matches!(
            self,
            TransformKind::Merge | TransformKind::ImageToPdf | TransformKind::TextToPdf
        )
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One input file of a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputFile {
    /// Original file name, used in error messages only
    #[serde(default)]
    pub name: String,
    /// Declared MIME type; only image conversion looks at it
    #[serde(default)]
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }
}

/// A job as submitted by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    /// Correlation id echoed in every message
    pub id: String,
    pub kind: TransformKind,
    #[serde(default)]
    pub inputs: Vec<InputFile>,
    /// Kind-specific options, validated by [`crate::Transform::parse`]
    #[serde(default)]
    pub options: serde_json::Value,
}

impl JobRequest {
    pub fn new(id: impl Into<String>, kind: TransformKind, inputs: Vec<InputFile>) -> Self {
        Self {
            id: id.into(),
            kind,
            inputs,
            options: serde_json::Value::Null,
        }
    }

    pub fn with_options(mut self, options: serde_json::Value) -> Self {
        self.options = options;
        self
    }
}

/// A message sent back to the host
///
/// A job emits any number of `progress` messages followed by exactly one
/// `success` or `error`, unless it was cancelled, in which case it stops
/// without a final message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobMessage {
    Progress {
        id: String,
        progress: u8,
    },
    Success {
        id: String,
        /// One buffer per output document
        data: Vec<Vec<u8>>,
    },
    Error {
        id: String,
        error: String,
        kind: ErrorKind,
    },
}

impl JobMessage {
    pub fn id(&self) -> &str {
        match self {
            JobMessage::Progress { id, .. }
            | JobMessage::Success { id, .. }
            | JobMessage::Error { id, .. } => id,
        }
    }

    /// Whether this is the last message of its job
    pub fn is_final(&self) -> bool {
        !matches!(self, JobMessage::Progress { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_kind_names_match_wire() {
        let kinds = [
            TransformKind::Merge,
            TransformKind::DeletePages,
            TransformKind::AddPageNumbers,
            TransformKind::ImageToPdf,
        ];
        for kind in kinds {
            assert_eq!(serde_json::to_value(kind).unwrap(), json!(kind.as_str()));
        }
        assert_eq!(TransformKind::TextToPdf.to_string(), "text-to-pdf");
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let result: Result<JobRequest, _> =
            serde_json::from_value(json!({ "id": "1", "kind": "grayscale" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_request_from_json() {
        let request: JobRequest = serde_json::from_value(json!({
            "id": "job-7",
            "kind": "image-to-pdf",
            "inputs": [{ "name": "a.png", "mimeType": "image/png", "data": [1, 2, 3] }],
        }))
        .unwrap();

        assert_eq!(request.kind, TransformKind::ImageToPdf);
        assert_eq!(
            request.inputs,
            vec![InputFile::new("a.png", "image/png", vec![1, 2, 3])]
        );
        assert_eq!(request.options, serde_json::Value::Null);
    }

    #[test]
    fn test_message_shapes() {
        let progress = JobMessage::Progress {
            id: "a".into(),
            progress: 40,
        };
        assert_eq!(
            serde_json::to_value(&progress).unwrap(),
            json!({ "status": "progress", "id": "a", "progress": 40 })
        );
        assert!(!progress.is_final());

        let error = JobMessage::Error {
            id: "a".into(),
            error: "Cannot delete all pages".into(),
            kind: ErrorKind::Validation,
        };
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({
                "status": "error",
                "id": "a",
                "error": "Cannot delete all pages",
                "kind": "validation",
            })
        );
        assert!(error.is_final());
        assert_eq!(error.id(), "a");
    }

    #[test]
    fn test_many_inputs() {
        assert!(TransformKind::Merge.accepts_many_inputs());
        assert!(TransformKind::TextToPdf.accepts_many_inputs());
        assert!(!TransformKind::Split.accepts_many_inputs());
        assert!(!TransformKind::Compress.accepts_many_inputs());
    }
}
