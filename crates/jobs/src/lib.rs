//! PDF Jobs - the job contract around the pdfworks engine
//!
//! This crate provides:
//! - The request and message schema exchanged with a host
//! - Typed, validated options for each transform kind
//! - A dispatcher that loads inputs, runs one transform and serializes it
//! - A worker pool that runs jobs off the caller's thread
//!
//! # Example
//!
//! ```ignore
//! use pdf_jobs::{JobRequest, WorkerPool};
//!
//! let request: JobRequest = serde_json::from_str(request_json)?;
//! let pool = WorkerPool::new(2);
//! let handle = pool.submit(request);
//! for message in handle.messages() {
//!     println!("{}", serde_json::to_string(&message)?);
//! }
//! ```

mod dispatch;
mod options;
mod pool;
mod schema;

pub use dispatch::execute;
pub use options::Transform;
pub use pdf_core::ErrorKind;
pub use pool::{JobHandle, WorkerPool, MESSAGE_CAPACITY};
pub use schema::{InputFile, JobMessage, JobRequest, TransformKind};

use pdf_core::PdfError;
use thiserror::Error;

/// A failed job, as reported to the host
///
/// `message` is short and human-readable; `kind` lets the host decide how to
/// present it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct JobError {
    pub kind: ErrorKind,
    pub message: String,
}

impl JobError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Validation,
            message: message.into(),
        }
    }

    pub fn cancelled() -> Self {
        PdfError::Cancelled.into()
    }
}

impl From<PdfError> for JobError {
    fn from(err: PdfError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Result type for job operations
pub type Result<T> = std::result::Result<T, JobError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_job_error_from_pdf_error() {
        let err: JobError = PdfError::ValidationError("Cannot delete all pages".into()).into();
        assert_eq!(
            err,
            JobError {
                kind: ErrorKind::Validation,
                message: "Cannot delete all pages".into(),
            }
        );
        assert_eq!(err.to_string(), "Cannot delete all pages");
    }

    #[test]
    fn test_cancelled() {
        let err = JobError::cancelled();
        assert_eq!(err.kind, ErrorKind::Cancelled);
        assert_eq!(err.message, "Job cancelled");
    }
}
