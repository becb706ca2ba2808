// src/exec/supervisor.rs

//! Long-running function processes.
//!
//! Per function id there is never more than one process: restarting a
//! function kills the previous instance and waits for it to exit before the
//! replacement is spawned.

use std::collections::HashMap;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::exec::launcher::LaunchSpec;
use crate::types::FunctionId;

/// Handle for a currently running function process.
struct RunningProcess {
    cancel: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<()>,
}

#[derive(Default)]
pub struct ProcessSupervisor {
    active: HashMap<FunctionId, RunningProcess>,
}

impl ProcessSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop any running instance of `function` and start `spec` in its place.
    pub async fn restart(&mut self, function: &str, spec: LaunchSpec) -> Result<()> {
        self.stop(function).await;

        info!(function = %function, program = %spec.program, "starting function process");
        let mut child = spec
            .to_process_command()
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawning run process for function '{}'", function))?;

        if let Some(stdout) = child.stdout.take() {
            forward_lines(function.to_string(), "stdout", stdout);
        }
        if let Some(stderr) = child.stderr.take() {
            forward_lines(function.to_string(), "stderr", stderr);
        }

        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(supervise(function.to_string(), child, cancel_rx));

        self.active.insert(
            function.to_string(),
            RunningProcess {
                cancel: Some(cancel_tx),
                handle,
            },
        );
        Ok(())
    }

    /// Kill the running instance of `function`, if any, and wait for it.
    pub async fn stop(&mut self, function: &str) {
        let Some(mut running) = self.active.remove(function) else {
            return;
        };
        if let Some(cancel) = running.cancel.take() {
            if cancel.send(()).is_err() {
                debug!(function = %function, "process already exited before stop");
            }
        }
        if let Err(err) = running.handle.await {
            warn!(function = %function, error = %err, "supervisor task failed");
        }
    }

    /// Stop every running process.
    pub async fn shutdown(&mut self) {
        let ids: Vec<FunctionId> = self.active.keys().cloned().collect();
        for id in ids {
            self.stop(&id).await;
        }
    }

    pub fn is_running(&self, function: &str) -> bool {
        self.active
            .get(function)
            .is_some_and(|running| !running.handle.is_finished())
    }
}

async fn supervise(function: FunctionId, mut child: Child, cancel_rx: oneshot::Receiver<()>) {
    tokio::select! {
        status = child.wait() => match status {
            Ok(status) => info!(
                function = %function,
                exit_code = ?status.code(),
                success = status.success(),
                "function process exited"
            ),
            Err(err) => warn!(function = %function, error = %err, "waiting for function process failed"),
        },
        cancel = cancel_rx => {
            if cancel.is_ok() {
                debug!(function = %function, "stopping function process");
            }
            if let Err(err) = child.kill().await {
                warn!(function = %function, error = %err, "failed to kill function process");
            }
        }
    }
}

fn forward_lines<R>(function: FunctionId, stream: &'static str, reader: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            info!(function = %function, stream, "{}", line);
        }
    });
}
