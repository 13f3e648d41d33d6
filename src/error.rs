//! Error taxonomy
//!
//! Failures that can cross a collaborator boundary. Selection, view, search,
//! and range operations are total and never construct one of these; they
//! originate only from filesystem walks, file reads, and template I/O.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A path vanished between listing and use.
    #[error("path not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Permission was denied while walking or reading.
    #[error("access denied: {}", .0.display())]
    Access(PathBuf),

    /// A template references entries that no longer exist on disk.
    ///
    /// Non-fatal: callers report the missing entries and continue with the
    /// ones that validated.
    #[error("template references {} missing entries", missing.len())]
    Validation { missing: Vec<String> },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classify an io::Error raised for a specific path.
    pub fn from_io(err: std::io::Error, path: &std::path::Path) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Error::Access(path.to_path_buf()),
            _ => Error::Io(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
