//! Engine configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{RegistrationError, Result};

/// Environment variable overriding the registration engine binary.
pub const ELASTIX_ENV: &str = "ELXKIT_ELASTIX";
/// Environment variable overriding the transform-application engine binary.
pub const TRANSFORMIX_ENV: &str = "ELXKIT_TRANSFORMIX";

/// How the external engines are located and invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Registration engine binary, resolved via the search path if bare.
    pub elastix_path: PathBuf,
    /// Transform-application engine binary.
    pub transformix_path: PathBuf,
    /// Passed as `-threads`, engine default if `None`.
    pub threads: Option<usize>,
    /// Fail on a non-zero exit status before looking for outputs.
    pub check_exit_status: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            elastix_path: PathBuf::from("elastix"),
            transformix_path: PathBuf::from("transformix"),
            threads: None,
            check_exit_status: true,
        }
    }
}

impl EngineConfig {
    /// Create a new engine config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Default settings with binary paths taken from [`ELASTIX_ENV`] and
    /// [`TRANSFORMIX_ENV`] when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(path) = std::env::var_os(ELASTIX_ENV).filter(|p| !p.is_empty()) {
            config.elastix_path = PathBuf::from(path);
        }
        if let Some(path) = std::env::var_os(TRANSFORMIX_ENV).filter(|p| !p.is_empty()) {
            config.transformix_path = PathBuf::from(path);
        }
        config
    }

    /// Set the registration engine binary.
    pub fn with_elastix_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.elastix_path = path.into();
        self
    }

    /// Set the transform-application engine binary.
    pub fn with_transformix_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.transformix_path = path.into();
        self
    }

    /// Set the number of engine threads.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Only missing outputs signal engine failure.
    pub fn without_exit_status_check(mut self) -> Self {
        self.check_exit_status = false;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.elastix_path.as_os_str().is_empty() {
            return Err(RegistrationError::invalid_configuration("empty elastix path"));
        }
        if self.transformix_path.as_os_str().is_empty() {
            return Err(RegistrationError::invalid_configuration("empty transformix path"));
        }
        if self.threads == Some(0) {
            return Err(RegistrationError::invalid_configuration("threads must be at least 1"));
        }
        Ok(())
    }
}
