//! Error types shared by the elxkit crates.

use std::path::PathBuf;
use thiserror::Error;

use crate::intensity::ScalarKind;

/// Main error type for path bookkeeping and intensity operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Underlying filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A path that has no usable file name.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// An engine output the caller expected was not produced.
    #[error("Missing output: {}", .0.display())]
    MissingOutput(PathBuf),

    /// No maximum was given and the element kind has no integer range.
    #[error("No integer range for scalar kind {0}, an explicit maximum is required")]
    NonIntegerKind(ScalarKind),

    /// Min/max of an empty array is undefined.
    #[error("Cannot normalize an empty array")]
    EmptyArray,

    /// A scalar kind name that could not be parsed.
    #[error("Unknown scalar kind: {0}")]
    UnknownScalarKind(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Create an invalid path error.
    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::InvalidPath(msg.into())
    }

    /// Create a missing output error.
    pub fn missing_output(path: impl Into<PathBuf>) -> Self {
        Self::MissingOutput(path.into())
    }
}
