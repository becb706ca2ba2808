#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use localfn::fs::mock::MockFileSystem;
use localfn::runtime::{ArtifactDir, HostEnvironment, RuntimeContext};
use localfn::types::{FunctionDeclaration, Platform};

/// Builder for `FunctionDeclaration` rooted at `/proj`.
pub struct FunctionBuilder {
    decl: FunctionDeclaration,
}

impl FunctionBuilder {
    /// A Go function in `/proj/<id>` with handler `main.go`.
    pub fn new(id: &str) -> Self {
        Self {
            decl: FunctionDeclaration {
                id: id.to_string(),
                root: PathBuf::from("/proj"),
                runtime: "go1.x".to_string(),
                src_path: PathBuf::from("/proj").join(id),
                handler: "main.go".to_string(),
            },
        }
    }

    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.decl.root = root.into();
        self
    }

    pub fn runtime(mut self, runtime: &str) -> Self {
        self.decl.runtime = runtime.to_string();
        self
    }

    pub fn src(mut self, src_path: impl Into<PathBuf>) -> Self {
        self.decl.src_path = src_path.into();
        self
    }

    pub fn handler(mut self, handler: &str) -> Self {
        self.decl.handler = handler.to_string();
        self
    }

    pub fn build(self) -> FunctionDeclaration {
        self.decl
    }
}

/// Builder for a `RuntimeContext` over a mock filesystem and a fake host.
pub struct ContextBuilder {
    fs: MockFileSystem,
    vars: Vec<(String, String)>,
    platform: Platform,
    artifacts_dir: String,
    shims_dir: PathBuf,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self {
            fs: MockFileSystem::new(),
            vars: Vec::new(),
            platform: Platform::Unix,
            artifacts_dir: ".build/artifacts".to_string(),
            shims_dir: PathBuf::from("/shims"),
        }
    }

    pub fn fs(mut self, fs: MockFileSystem) -> Self {
        self.fs = fs;
        self
    }

    pub fn var(mut self, key: &str, value: &str) -> Self {
        self.vars.push((key.to_string(), value.to_string()));
        self
    }

    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn build(self) -> Arc<RuntimeContext> {
        Arc::new(RuntimeContext::new(
            Arc::new(self.fs),
            HostEnvironment::from_vars(self.vars, self.platform),
            Arc::new(ArtifactDir::new(self.artifacts_dir)),
            self.shims_dir,
        ))
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
