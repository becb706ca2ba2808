// src/build.rs

//! Build driver: runs a function's build command, if it has one.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::errors::{LocalFnError, Result};
use crate::exec::{LaunchSpec, ProcessLauncher, StdioMode};
use crate::instructions::InstructionSet;
use crate::runtime::RuntimeContext;
use crate::types::FunctionDeclaration;

pub struct BuildDriver<L: ProcessLauncher> {
    context: Arc<RuntimeContext>,
    launcher: L,
}

impl<L: ProcessLauncher> BuildDriver<L> {
    pub fn new(context: Arc<RuntimeContext>, launcher: L) -> Self {
        Self { context, launcher }
    }

    pub fn context(&self) -> &RuntimeContext {
        &self.context
    }

    /// Resolve `decl` and run its build step.
    ///
    /// Spawns at most one process, with the function's source directory as
    /// working directory, and waits for it. No timeout is applied.
    pub async fn build(&self, decl: &FunctionDeclaration) -> Result<()> {
        let instructions = self.context.instructions(decl)?;
        self.build_resolved(decl, &instructions).await
    }

    /// Run the build step of already-resolved `instructions`.
    pub async fn build_resolved(
        &self,
        decl: &FunctionDeclaration,
        instructions: &InstructionSet,
    ) -> Result<()> {
        let Some(command) = &instructions.build else {
            debug!(function = %decl.id, "no build step");
            return Ok(());
        };

        let spec = LaunchSpec::from_command(
            command,
            &self.context.host,
            &decl.src_path,
            StdioMode::Inherit,
        );

        info!(function = %decl.id, program = %spec.program, "building function");

        let outcome = self.launcher.launch(spec).await.map_err(|err| {
            error!(function = %decl.id, error = %err, "build could not be started");
            LocalFnError::BuildFailed {
                function: decl.id.clone(),
                detail: format!("{err:#}"),
            }
        })?;

        if !outcome.success() {
            let detail = match outcome.code {
                Some(code) => format!("build exited with code {code}"),
                None => "build terminated by signal".to_string(),
            };
            error!(function = %decl.id, %detail, "build failed");
            return Err(LocalFnError::BuildFailed {
                function: decl.id.clone(),
                detail,
            });
        }

        info!(function = %decl.id, "build finished");
        Ok(())
    }
}
