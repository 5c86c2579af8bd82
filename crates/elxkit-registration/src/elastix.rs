//! Registration engine invoker.

use std::path::{Path, PathBuf};

use elxkit_core::{leading_stem, transform_parameters_filename, OutputTarget, StagingDir};

use crate::config::EngineConfig;
use crate::engine::{execute, Engine, EngineInvocation, EngineRunner, ProcessRunner};
use crate::error::Result;

/// Result image written by elastix for the first (only) parameter file.
pub const RESULT_IMAGE: &str = "result.0.nii.gz";
/// Transform parameters written by elastix for the first parameter file.
pub const TRANSFORM_PARAMETERS: &str = "TransformParameters.0.txt";

/// Registers a moving image to a fixed image with the elastix binary.
#[derive(Debug, Clone)]
pub struct Elastix<R = ProcessRunner> {
    config: EngineConfig,
    runner: R,
}

impl Elastix<ProcessRunner> {
    pub fn new(config: EngineConfig) -> Self {
        Self { config, runner: ProcessRunner }
    }
}

impl Default for Elastix<ProcessRunner> {
    fn default() -> Self {
        Self::new(EngineConfig::from_env())
    }
}

impl<R: EngineRunner> Elastix<R> {
    pub fn with_runner(config: EngineConfig, runner: R) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Register `moving` onto `fixed` using `parameters`.
    ///
    /// The registered image is promoted as `<name>.nii.gz` and the
    /// transform as `TransformParameters_<moving stem>.txt`, both into the
    /// target's output directory. Returns the path of the promoted
    /// transform-parameter file. Unless `keep_intermediate` is set, the
    /// staging directory is removed afterwards, also on failure.
    pub fn register(
        &self,
        fixed: impl AsRef<Path>,
        moving: impl AsRef<Path>,
        target: &OutputTarget,
        parameters: impl AsRef<Path>,
        keep_intermediate: bool,
    ) -> Result<PathBuf> {
        let (fixed, moving, parameters) = (fixed.as_ref(), moving.as_ref(), parameters.as_ref());
        self.config.validate()?;

        let moving_stem = leading_stem(moving)?;
        let image_name = target.output_filename(moving)?;
        let transform_name = transform_parameters_filename(moving)?;

        let staging = StagingDir::for_target(target)?.with_keep(keep_intermediate);
        tracing::info!("registering {} to {} into {}", moving_stem, fixed.display(), staging.parent().display());

        let invocation = EngineInvocation::new(Engine::Elastix, &self.config.elastix_path, staging.path())
            .arg_pair("-f", fixed)
            .arg_pair("-m", moving)
            .arg_pair("-p", parameters)
            .threads(self.config.threads);
        execute(&self.runner, &self.config, &invocation)?;

        staging.require(&[RESULT_IMAGE, TRANSFORM_PARAMETERS])?;
        let image = staging.promote(RESULT_IMAGE, &image_name)?;
        let transform = staging.promote(TRANSFORM_PARAMETERS, &transform_name)?;
        tracing::info!("registered image {}, transform {}", image.display(), transform.display());

        Ok(transform)
    }
}

/// [`Elastix::register`] with the default process runner and a config
/// read from the environment.
pub fn register(
    fixed: impl AsRef<Path>,
    moving: impl AsRef<Path>,
    target: &OutputTarget,
    parameters: impl AsRef<Path>,
    keep_intermediate: bool,
) -> Result<PathBuf> {
    Elastix::new(EngineConfig::from_env()).register(fixed, moving, target, parameters, keep_intermediate)
}
