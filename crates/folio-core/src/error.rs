//! Error types for folio operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// All fatal folio errors.
///
/// Non-fatal results of an edit ("project not found", "skill already
/// exists") are [`crate::editors::EditOutcome`] values, not errors.
#[derive(Debug, Error)]
pub enum FolioError {
    /// The canonical document file does not exist.
    #[error("could not find portfolio file at {}", .0.display())]
    NotFound(PathBuf),
    /// The document is not valid JSON, or not an object at top level.
    #[error("{} contains invalid JSON: {source}", path.display())]
    MalformedDocument {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Saving the document failed.
    #[error("error saving {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Clone or pull of the local replica failed.
    #[error("sync failed: {0}")]
    Sync(String),
    /// Stage, commit or push failed.
    #[error("publish failed: {0}")]
    Publish(String),
    /// The external editor could not be started or exited unsuccessfully.
    #[error("failed to run editor `{program}`: {reason}")]
    Launch { program: String, reason: String },
    /// A document key holds a value of the wrong JSON type.
    #[error("field `{field}` must be {expected}")]
    FieldType {
        field: String,
        expected: &'static str,
    },
    /// The console reached end of input while an answer was required.
    #[error("input closed before a required answer was given")]
    InputClosed,
    /// Invalid or incomplete configuration.
    #[error("configuration error: {0}")]
    Config(String),
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// A git operation failed outside of sync/publish.
    #[error("git error: {0}")]
    Git(#[from] git2::Error),
}

/// Convenience alias for Results in folio.
pub type FolioResult<T> = Result<T, FolioError>;
