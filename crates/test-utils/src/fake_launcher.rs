use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use localfn::exec::{ExitOutcome, LaunchSpec, ProcessLauncher};

/// Scripted result of one launch.
#[derive(Debug, Clone)]
pub enum FakeLaunch {
    Exit(i32),
    SpawnError(String),
}

/// A fake launcher that:
/// - records every `LaunchSpec` it is given
/// - answers with scripted results, falling back to exit code 0.
#[derive(Clone, Default)]
pub struct FakeLauncher {
    launched: Arc<Mutex<Vec<LaunchSpec>>>,
    script: Arc<Mutex<VecDeque<FakeLaunch>>>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result for the next launch.
    pub fn push_result(self, result: FakeLaunch) -> Self {
        self.script.lock().unwrap().push_back(result);
        self
    }

    pub fn launched(&self) -> Vec<LaunchSpec> {
        self.launched.lock().unwrap().clone()
    }
}

impl ProcessLauncher for FakeLauncher {
    fn launch(
        &self,
        spec: LaunchSpec,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<ExitOutcome>> + Send + '_>> {
        self.launched.lock().unwrap().push(spec);
        let next = self.script.lock().unwrap().pop_front();

        Box::pin(async move {
            match next {
                None => Ok(ExitOutcome { code: Some(0) }),
                Some(FakeLaunch::Exit(code)) => Ok(ExitOutcome { code: Some(code) }),
                Some(FakeLaunch::SpawnError(msg)) => Err(anyhow::anyhow!(msg)),
            }
        })
    }
}
