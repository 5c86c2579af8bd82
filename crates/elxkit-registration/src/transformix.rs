//! Transform-application engine invoker.

use std::path::{Path, PathBuf};

use elxkit_core::{OutputTarget, StagingDir};

use crate::config::EngineConfig;
use crate::engine::{execute, Engine, EngineInvocation, EngineRunner, ProcessRunner};
use crate::error::Result;

/// Resampled image written by transformix.
pub const RESULT_IMAGE: &str = "result.nii.gz";

/// Resamples an image with a previously computed transform.
#[derive(Debug, Clone)]
pub struct Transformix<R = ProcessRunner> {
    config: EngineConfig,
    runner: R,
}

impl Transformix<ProcessRunner> {
    pub fn new(config: EngineConfig) -> Self {
        Self { config, runner: ProcessRunner }
    }
}

impl Default for Transformix<ProcessRunner> {
    fn default() -> Self {
        Self::new(EngineConfig::from_env())
    }
}

impl<R: EngineRunner> Transformix<R> {
    pub fn with_runner(config: EngineConfig, runner: R) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Apply `transform_parameters` to `moving` and promote the resampled
    /// image. Returns the promoted image path.
    pub fn apply(
        &self,
        moving: impl AsRef<Path>,
        target: &OutputTarget,
        transform_parameters: impl AsRef<Path>,
        keep_intermediate: bool,
    ) -> Result<PathBuf> {
        let (moving, transform_parameters) = (moving.as_ref(), transform_parameters.as_ref());
        self.config.validate()?;

        let image_name = target.output_filename(moving)?;
        let staging = StagingDir::for_target(target)?.with_keep(keep_intermediate);
        tracing::info!("transforming {} into {}", moving.display(), staging.parent().display());

        let invocation = EngineInvocation::new(Engine::Transformix, &self.config.transformix_path, staging.path())
            .arg_pair("-in", moving)
            .arg_pair("-tp", transform_parameters)
            .threads(self.config.threads);
        execute(&self.runner, &self.config, &invocation)?;

        let image = staging.promote(RESULT_IMAGE, &image_name)?;
        tracing::info!("resampled image {}", image.display());

        Ok(image)
    }
}

/// [`Transformix::apply`] with the default process runner and a config
/// read from the environment.
pub fn apply_transform(
    moving: impl AsRef<Path>,
    target: &OutputTarget,
    transform_parameters: impl AsRef<Path>,
    keep_intermediate: bool,
) -> Result<PathBuf> {
    Transformix::new(EngineConfig::from_env()).apply(moving, target, transform_parameters, keep_intermediate)
}
