// src/runtime/context.rs

//! Everything a runtime handler may consult besides the declaration itself.
//!
//! Handlers never read process state directly: the host environment, the
//! filesystem probe and the artifact layout are all injected here so tests
//! can substitute fakes.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::instructions::InstructionSet;
use crate::runtime::RuntimeFamily;
use crate::types::{FunctionDeclaration, Platform};

/// Snapshot of the process environment and platform.
#[derive(Debug, Clone, Default)]
pub struct HostEnvironment {
    vars: BTreeMap<String, String>,
    platform: Platform,
}

impl HostEnvironment {
    /// Capture the current process environment. Variables that are not
    /// valid unicode are skipped.
    pub fn capture() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self {
            vars,
            platform: Platform::current(),
        }
    }

    pub fn from_vars<I, K, V>(vars: I, platform: Platform) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            platform,
        }
    }

    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }
}

/// Computes where build outputs live on disk.
pub trait ArtifactPaths: Send + Sync + Debug {
    fn artifact_path(&self, root: &Path, relative: &Path) -> PathBuf;
}

/// Artifacts under a single directory, relative to the project root unless
/// `dir` is absolute.
#[derive(Debug, Clone)]
pub struct ArtifactDir {
    dir: PathBuf,
}

impl ArtifactDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ArtifactPaths for ArtifactDir {
    fn artifact_path(&self, root: &Path, relative: &Path) -> PathBuf {
        root.join(&self.dir).join(relative)
    }
}

/// Shared context handed to every runtime handler.
#[derive(Debug, Clone)]
pub struct RuntimeContext {
    pub fs: Arc<dyn FileSystem>,
    pub host: HostEnvironment,
    pub artifacts: Arc<dyn ArtifactPaths>,
    /// Directory holding the language bootstrap shims.
    pub shims_dir: PathBuf,
}

impl RuntimeContext {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        host: HostEnvironment,
        artifacts: Arc<dyn ArtifactPaths>,
        shims_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fs,
            host,
            artifacts,
            shims_dir: shims_dir.into(),
        }
    }

    /// Resolve the instruction set for `decl`, dispatching on its runtime.
    pub fn instructions(&self, decl: &FunctionDeclaration) -> Result<InstructionSet> {
        RuntimeFamily::from_identifier(&decl.runtime)?.instructions(decl, self)
    }
}
