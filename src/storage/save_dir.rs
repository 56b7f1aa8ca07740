//! Save-state directories
//!
//! When state saving is enabled every node gets an `ethereum` and an `ethash`
//! directory under `<save>/<chain>/<serial>/`. A pre-existing save directory
//! is either moved aside to the first free `<save>-<i>` or reported back to
//! the caller; this module never decides to abort on its own.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::StorageError;

/// What happened while preparing the save directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveDirOutcome {
    /// Nothing was there; a fresh directory was created
    Created,
    /// An existing directory was moved to `moved_to` and a fresh one created
    Replaced { moved_to: PathBuf },
}

/// Host directories of one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDirs {
    pub ethereum: PathBuf,
    pub ethash: PathBuf,
}

/// First `<path>-<i>` (i >= 1) that does not exist
pub fn next_free_suffix(path: &Path) -> PathBuf {
    let mut i = 1u32;
    loop {
        let mut candidate = OsString::from(path.as_os_str());
        candidate.push(format!("-{}", i));
        let candidate = PathBuf::from(candidate);
        if !candidate.exists() {
            return candidate;
        }
        i += 1;
    }
}

/// Create an empty save directory at `path`.
///
/// An existing directory is renamed aside when `override_existing` is set;
/// otherwise `StorageError::AlreadyExists` is returned.
pub fn prepare_save_dir(
    path: &Path,
    override_existing: bool,
) -> Result<SaveDirOutcome, StorageError> {
    let mut outcome = SaveDirOutcome::Created;

    if path.exists() {
        if !override_existing {
            warn!(
                "save directory {} already exists; set override to replace it",
                path.display()
            );
            return Err(StorageError::AlreadyExists(path.to_path_buf()));
        }
        let moved_to = next_free_suffix(path);
        info!(
            "save directory {} already exists, moving it to {}",
            path.display(),
            moved_to.display()
        );
        fs::rename(path, &moved_to).map_err(|e| StorageError::from_io(path, e))?;
        outcome = SaveDirOutcome::Replaced { moved_to };
    }

    fs::create_dir_all(path).map_err(|e| StorageError::from_io(path, e))?;
    Ok(outcome)
}

/// Create the datadirs of node `serial` of `chain` under `root`
pub fn create_node_dirs(root: &Path, chain: &str, serial: u32) -> Result<NodeDirs, StorageError> {
    let base = root.join(chain).join(serial.to_string());
    let dirs = NodeDirs {
        ethereum: base.join("ethereum"),
        ethash: base.join("ethash"),
    };
    for dir in [&dirs.ethereum, &dirs.ethash] {
        fs::create_dir_all(dir).map_err(|e| StorageError::from_io(dir.as_path(), e))?;
    }
    Ok(dirs)
}
