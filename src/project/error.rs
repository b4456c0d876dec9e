//! Error types for project operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::base::FileId;
use crate::reparse::ReparseError;

/// Errors raised while collecting or reading source files.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("directory not found: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("unsupported file extension: {}", .0.display())]
    UnsupportedExtension(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("failed to load {} file(s)", .0.len())]
    Files(Vec<LoadError>),
}

/// Errors raised by [`ProjectSourceParser`](super::ProjectSourceParser).
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("no file with id {0} in the project")]
    UnknownFile(FileId),

    #[error(transparent)]
    Edit(#[from] ReparseError),

    #[error(transparent)]
    Load(#[from] LoadError),
}
