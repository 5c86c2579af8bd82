//! Running the external engines.
//!
//! [`EngineRunner`] is the seam between argument assembly and process
//! execution. [`ProcessRunner`] spawns the real binary and blocks until it
//! exits, with stdout and stderr inherited from the caller.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use crate::config::EngineConfig;
use crate::error::{RegistrationError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Engine {
    Elastix,
    Transformix,
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Elastix => f.write_str("elastix"),
            Self::Transformix => f.write_str("transformix"),
        }
    }
}

/// How an engine process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Success,
    /// Non-zero exit code, `None` when terminated by a signal.
    Failed(Option<i32>),
}

impl ExitOutcome {
    pub fn success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<ExitStatus> for ExitOutcome {
    fn from(status: ExitStatus) -> Self {
        if status.success() { Self::Success } else { Self::Failed(status.code()) }
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Failed(Some(code)) => write!(f, "exit code {code}"),
            Self::Failed(None) => f.write_str("termination by signal"),
        }
    }
}

/// A fully assembled engine command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInvocation {
    pub engine: Engine,
    pub program: PathBuf,
    pub output_dir: PathBuf,
    pub args: Vec<OsString>,
}

impl EngineInvocation {
    /// Start a command line with `-out <output_dir>`.
    pub fn new(engine: Engine, program: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        let args = vec![OsString::from("-out"), output_dir.clone().into_os_string()];
        Self { engine, program: program.into(), output_dir, args }
    }

    /// Append a `<flag> <value>` pair.
    pub fn arg_pair(mut self, flag: &str, value: impl AsRef<Path>) -> Self {
        self.args.push(OsString::from(flag));
        self.args.push(value.as_ref().as_os_str().to_os_string());
        self
    }

    /// Append `-threads <n>` if set.
    pub fn threads(mut self, threads: Option<usize>) -> Self {
        if let Some(n) = threads {
            self.args.push(OsString::from("-threads"));
            self.args.push(OsString::from(n.to_string()));
        }
        self
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

pub trait EngineRunner {
    /// Run the invocation to completion.
    fn run(&self, invocation: &EngineInvocation) -> Result<ExitOutcome>;
}

impl<R: EngineRunner + ?Sized> EngineRunner for &R {
    fn run(&self, invocation: &EngineInvocation) -> Result<ExitOutcome> {
        (**self).run(invocation)
    }
}

/// Spawns engine binaries as child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl EngineRunner for ProcessRunner {
    fn run(&self, invocation: &EngineInvocation) -> Result<ExitOutcome> {
        let mut cmd = invocation.to_command();
        tracing::debug!("executing {:?}", cmd);

        let status = cmd.status().map_err(|source| RegistrationError::Spawn {
            engine: invocation.engine,
            program: invocation.program.clone(),
            source,
        })?;
        Ok(ExitOutcome::from(status))
    }
}

/// Run `invocation` and apply the configured exit status policy.
pub(crate) fn execute<R: EngineRunner>(runner: &R, config: &EngineConfig, invocation: &EngineInvocation) -> Result<()> {
    let outcome = runner.run(invocation)?;
    tracing::info!("{} completed with {}", invocation.engine, outcome);

    if !outcome.success() {
        if config.check_exit_status {
            return Err(RegistrationError::engine_failed(invocation.engine, outcome));
        }
        tracing::warn!("ignoring {} exit status, checking outputs only", invocation.engine);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_arguments() {
        let inv = EngineInvocation::new(Engine::Elastix, "elastix", "/out/res_tmp")
            .arg_pair("-f", "/in/fixed.nii.gz")
            .arg_pair("-m", "/in/moving.nii.gz")
            .threads(Some(4));

        let args: Vec<&str> = inv.args.iter().map(|a| a.to_str().unwrap()).collect();
        assert_eq!(
            args,
            ["-out", "/out/res_tmp", "-f", "/in/fixed.nii.gz", "-m", "/in/moving.nii.gz", "-threads", "4"]
        );
    }

    #[test]
    fn test_no_threads_arg_by_default() {
        let inv = EngineInvocation::new(Engine::Transformix, "transformix", "out").threads(None);
        assert_eq!(inv.args.len(), 2);
    }

    #[test]
    fn test_spawn_failure() {
        let inv = EngineInvocation::new(Engine::Elastix, "/nonexistent/bin/elastix-missing", "out");
        let err = ProcessRunner.run(&inv).unwrap_err();
        assert!(matches!(err, RegistrationError::Spawn { engine: Engine::Elastix, .. }));
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(ExitOutcome::Failed(Some(2)).to_string(), "exit code 2");
        assert!(ExitOutcome::Success.success());
    }
}
