//! Upload and working-directory storage
//!
//! [`FileStore`] owns two roots: the uploads root, where raw archives are
//! kept under a millisecond-prefixed name, and the builds root, holding one
//! `project_<id>` working directory per project.

pub mod archive;
pub mod store;
pub mod walk;

pub use store::{FileStat, FileStore};
pub use walk::{list_files, WalkConfig, DEPENDENCY_CACHE_DIRS};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive {path} could not be read: {reason}")]
    CorruptArchive { path: PathBuf, reason: String },

    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    #[error("Background file task failed: {0}")]
    Task(String),
}

impl FileStoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FileStoreError::Io {
            path: path.into(),
            source,
        }
    }
}
