// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`launcher`] runs one-shot processes (builds) behind the
//!   [`ProcessLauncher`] trait so tests can swap in a fake.
//! - [`supervisor`] keeps one long-running process per function and
//!   restarts it on demand.

pub mod launcher;
pub mod supervisor;

pub use launcher::{ExitOutcome, LaunchSpec, ProcessLauncher, StdioMode, SystemLauncher};
pub use supervisor::ProcessSupervisor;
