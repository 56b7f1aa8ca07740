//! Storage module - save-state directories and rendered artifacts

mod artifacts;
mod save_dir;

pub use artifacts::*;
pub use save_dir::*;

use crate::genesis::GenesisError;
use std::path::PathBuf;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Directory {0} already exists; enable override to move it aside")]
    AlreadyExists(PathBuf),
    #[error("Permission denied at {0}")]
    PermissionDenied(PathBuf),
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Genesis error: {0}")]
    Genesis(#[from] GenesisError),
}

impl StorageError {
    /// Classify an I/O error raised while working on `path`
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::AlreadyExists => StorageError::AlreadyExists(path),
            std::io::ErrorKind::PermissionDenied => StorageError::PermissionDenied(path),
            _ => StorageError::Io { path, source },
        }
    }
}
