// src/exec/launcher.rs

//! Pluggable process launcher.
//!
//! The build driver talks to a [`ProcessLauncher`] instead of spawning
//! processes itself, so tests can record launches without running anything.
//! [`SystemLauncher`] is the production implementation on top of
//! `tokio::process`.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::instructions::Command;
use crate::runtime::HostEnvironment;

/// What to do with a child's standard streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdioMode {
    /// Share the parent's stdout/stderr.
    Inherit,
    /// Capture output and re-emit it line by line through `tracing`.
    Piped,
}

/// Fully resolved process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Complete environment for the child; nothing else is inherited.
    pub env: BTreeMap<String, String>,
    pub cwd: PathBuf,
    pub stdio: StdioMode,
}

impl LaunchSpec {
    /// Build a launch from `command`, merging its environment overrides over
    /// the host environment.
    pub fn from_command(
        command: &Command,
        host: &HostEnvironment,
        cwd: impl Into<PathBuf>,
        stdio: StdioMode,
    ) -> Self {
        Self {
            program: command.executable.clone(),
            args: command.args.clone(),
            env: command.merged_env(host.vars()),
            cwd: cwd.into(),
            stdio,
        }
    }

    /// `tokio::process::Command` configured from this spec.
    pub(crate) fn to_process_command(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args)
            .env_clear()
            .envs(&self.env)
            .current_dir(&self.cwd)
            .stdin(Stdio::null());
        match self.stdio {
            StdioMode::Inherit => {
                cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
            StdioMode::Piped => {
                cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
            }
        }
        cmd
    }
}

/// Exit status of a finished process. `code` is `None` when the process was
/// terminated by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    pub code: Option<i32>,
}

impl ExitOutcome {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Trait abstracting how one-shot processes are run to completion.
pub trait ProcessLauncher: Send + Sync {
    /// Run `spec` and wait for it to exit. Errors mean the process could not
    /// be started or waited on; a non-zero exit is reported in the outcome.
    fn launch(
        &self,
        spec: LaunchSpec,
    ) -> Pin<Box<dyn Future<Output = Result<ExitOutcome>> + Send + '_>>;
}

/// Launcher that spawns real OS processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    fn launch(
        &self,
        spec: LaunchSpec,
    ) -> Pin<Box<dyn Future<Output = Result<ExitOutcome>> + Send + '_>> {
        Box::pin(async move {
            debug!(program = %spec.program, args = ?spec.args, cwd = ?spec.cwd, "launching process");
            let mut cmd = spec.to_process_command();

            let status = match spec.stdio {
                StdioMode::Inherit => cmd
                    .status()
                    .await
                    .with_context(|| format!("running '{}'", spec.program))?,
                StdioMode::Piped => {
                    let output = cmd
                        .output()
                        .await
                        .with_context(|| format!("running '{}'", spec.program))?;
                    for line in String::from_utf8_lossy(&output.stdout)
                        .lines()
                        .chain(String::from_utf8_lossy(&output.stderr).lines())
                    {
                        info!(program = %spec.program, "{}", line);
                    }
                    output.status
                }
            };

            Ok(ExitOutcome {
                code: status.code(),
            })
        })
    }
}
