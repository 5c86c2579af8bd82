//! Error types for engine invocations.
//!
//! Every entry point is all-or-nothing: an error means nothing was
//! promoted and the staging directory has been cleaned up unless it was
//! kept on request.

use std::path::PathBuf;

use elxkit_core::CoreError;
use thiserror::Error;

use crate::engine::{Engine, ExitOutcome};

/// Main error type for registration and transform application.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// Path bookkeeping or staging failure.
    #[error("Core error: {0}")]
    Core(CoreError),

    /// Filesystem error outside the staging directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The engine binary could not be started.
    #[error("Failed to start {engine} ({}): {source}", .program.display())]
    Spawn {
        engine: Engine,
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The engine ran but reported failure.
    #[error("{engine} failed with {outcome}")]
    EngineFailed { engine: Engine, outcome: ExitOutcome },

    /// An output the engine should have produced is missing.
    #[error("Missing engine output: {}", .0.display())]
    MissingOutput(PathBuf),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, RegistrationError>;

impl From<CoreError> for RegistrationError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MissingOutput(path) => Self::MissingOutput(path),
            CoreError::Io(e) => Self::Io(e),
            other => Self::Core(other),
        }
    }
}

impl RegistrationError {
    /// Create a missing output error.
    pub fn missing_output(path: impl Into<PathBuf>) -> Self {
        Self::MissingOutput(path.into())
    }

    /// Create an engine failure error.
    pub fn engine_failed(engine: Engine, outcome: ExitOutcome) -> Self {
        Self::EngineFailed { engine, outcome }
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}
