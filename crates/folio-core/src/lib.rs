//! folio-core — keep a personal portfolio document in sync with a git
//! repository.
//!
//! The portfolio lives as one JSON file inside a local replica of a
//! remote repository. Every command runs the same cycle: bring the
//! replica up to date, load the document, apply one edit, save it back
//! and publish the change as a commit pushed to the remote.

pub mod config;
pub mod console;
pub mod document;
pub mod editors;
pub mod error;
pub mod freeform;
pub mod fsutil;
pub mod git;
pub mod launcher;
pub mod summary;
pub mod sync;

pub use document::Document;
pub use error::{FolioError, FolioResult};
pub use sync::{Operation, SyncController};
