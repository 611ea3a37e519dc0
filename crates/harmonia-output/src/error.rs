//! Error types for output generation.

use std::path::PathBuf;

use harmonia_transform::TransformError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    /// Failed to create, write or read a file.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot manifest could not be encoded or decoded.
    #[error("invalid snapshot manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Snapshot directory lacks a file listed in its manifest.
    #[error("snapshot file missing: {path}")]
    MissingSnapshot { path: PathBuf },

    #[error(transparent)]
    Polars(#[from] polars::prelude::PolarsError),

    #[error(transparent)]
    Transform(#[from] TransformError),
}

pub type Result<T> = std::result::Result<T, OutputError>;

pub(crate) fn io_error(path: &std::path::Path) -> impl FnOnce(std::io::Error) -> OutputError + '_ {
    move |source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    }
}
