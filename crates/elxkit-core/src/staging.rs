//! Scoped staging directories.
//!
//! A [`StagingDir`] is removed recursively when it goes out of scope, on
//! success and on every error path, unless it was marked to be kept.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};
use crate::target::OutputTarget;

#[derive(Debug)]
pub struct StagingDir {
    path: PathBuf,
    keep: bool,
}

impl StagingDir {
    /// Create the directory (and missing parents). An existing directory is
    /// reused.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        fs::create_dir_all(&path)?;
        tracing::debug!("staging directory {}", path.display());
        Ok(Self { path, keep: false })
    }

    /// Create the staging directory of `target`.
    pub fn for_target(target: &OutputTarget) -> Result<Self> {
        Self::create(target.staging_dir())
    }

    /// Keep the directory and its contents after drop.
    pub fn with_keep(mut self, keep: bool) -> Self {
        self.keep = keep;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory promoted files are moved into.
    pub fn parent(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    pub fn is_kept(&self) -> bool {
        self.keep
    }

    /// Fail with [`CoreError::MissingOutput`] for the first of `names` that
    /// does not exist inside the staging directory.
    pub fn require(&self, names: &[&str]) -> Result<()> {
        for name in names {
            let path = self.path.join(name);
            if !path.is_file() {
                return Err(CoreError::missing_output(path));
            }
        }
        Ok(())
    }

    /// Move `name` out of the staging directory into its parent as `dest_name`.
    pub fn promote(&self, name: &str, dest_name: &str) -> Result<PathBuf> {
        let src = self.path.join(name);
        let dest = self.parent().join(dest_name);

        match fs::rename(&src, &dest) {
            Ok(()) => {
                tracing::debug!("promoted {} to {}", src.display(), dest.display());
                Ok(dest)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(CoreError::missing_output(src)),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if self.keep {
            tracing::debug!("keeping staging directory {}", self.path.display());
            return;
        }
        match fs::remove_dir_all(&self.path) {
            Ok(()) => tracing::debug!("removed staging directory {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("failed to remove staging directory {}: {}", self.path.display(), e),
        }
    }
}
