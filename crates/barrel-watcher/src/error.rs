//! Error types for indexing and watching.
//!
//! None of these escape `reindex` or `watch`: they are logged and kept in
//! reports. Only setting up the platform watcher itself can fail a caller.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, WatcherError>;

/// Errors that can occur while indexing or watching directories.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Listing a directory or writing its barrel failed.
    #[error("io error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Export extraction failed for a file.
    #[error(transparent)]
    Extract(#[from] barrel_core::ExtractError),

    /// Notify error.
    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),
}

impl WatcherError {
    /// Creates an IO error with the path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
