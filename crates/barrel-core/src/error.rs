//! Error types for export extraction.
//!
//! Extraction failures are never fatal to a barrel run. Callers log them
//! and treat the file as exporting nothing.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience type for functions that can fail during extraction.
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Things that can go wrong when extracting exports from a source file.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Couldn't read the file from disk (missing, unreadable, not UTF-8).
    #[error("failed to read file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Tree-sitter could not be set up or returned no tree.
    #[error("parser error: {0}")]
    Parser(String),
}

impl ExtractError {
    /// Creates an IO error with the path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
