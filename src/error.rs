//! Error taxonomy for document/folder conversion.
//!
//! Every error class maps to a stable process exit code so calling tooling
//! can branch on cause: 0 success, 1 strict-mode abort or runtime failure,
//! 2 usage/input not found, 3 structural (document unparsable).

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the conversion pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// The document is missing its structural heading or the ASCII tree
    /// block cannot be located. Fatal before any filesystem mutation.
    #[error("structural error: {0}")]
    Structural(String),

    /// A path failed normalization or safety validation.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// Configuration file could not be loaded or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// An ignore pattern failed to compile.
    #[error("invalid ignore pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },

    /// Filesystem operation failed on a specific path.
    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Strict mode escalated recorded issues into an abort.
    #[error("strict mode: {0}")]
    Strict(String),

    /// The requested input file or folder does not exist.
    #[error("input not found: {}", .0.display())]
    InputNotFound(PathBuf),
}

impl Error {
    /// Stable exit code for this error class.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Structural(_) => 3,
            Error::InputNotFound(_) => 2,
            Error::Strict(_)
            | Error::InvalidPath { .. }
            | Error::Config(_)
            | Error::Pattern { .. }
            | Error::Io { .. } => 1,
        }
    }

    /// Wrap a filesystem error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
