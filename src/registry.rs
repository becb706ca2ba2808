// src/registry.rs

//! Function registry: the authoritative list of declared functions.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::config::{load_and_validate, Manifest, MANIFEST_FILE};
use crate::errors::{LocalFnError, Result};
use crate::fs::FileSystem;
use crate::types::{FunctionDeclaration, FunctionId};

/// Source of function declarations. Implementations must return the
/// complete, current list on every call.
pub trait FunctionRegistry: Send + Sync {
    fn read(&self, root: &Path) -> Result<Vec<FunctionDeclaration>>;
}

/// Registry backed by the project manifest, re-read on every call.
#[derive(Debug, Clone)]
pub struct ManifestRegistry {
    fs: Arc<dyn FileSystem>,
    file_name: PathBuf,
}

impl ManifestRegistry {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            file_name: PathBuf::from(MANIFEST_FILE),
        }
    }

    /// Use a manifest other than `localfn.toml` (relative to the root).
    pub fn with_file_name(mut self, file_name: impl Into<PathBuf>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn manifest_path(&self, root: &Path) -> PathBuf {
        root.join(&self.file_name)
    }

    /// Load and validate the manifest under `root`.
    pub fn manifest(&self, root: &Path) -> Result<Manifest> {
        load_and_validate(self.fs.as_ref(), self.manifest_path(root))
    }
}

impl FunctionRegistry for ManifestRegistry {
    fn read(&self, root: &Path) -> Result<Vec<FunctionDeclaration>> {
        let root = normalize(&std::path::absolute(root)?);
        let manifest = self.manifest(&root)?;
        let functions = declarations(&root, &manifest);
        debug!(root = ?root, count = functions.len(), "read function declarations");
        Ok(functions)
    }
}

/// Restricts another registry to a single function id.
#[derive(Debug, Clone)]
pub struct FilteredRegistry<R> {
    inner: R,
    only: Option<FunctionId>,
}

impl<R: FunctionRegistry> FilteredRegistry<R> {
    /// `only = None` passes everything through.
    pub fn new(inner: R, only: Option<FunctionId>) -> Self {
        Self { inner, only }
    }
}

impl<R: FunctionRegistry> FunctionRegistry for FilteredRegistry<R> {
    fn read(&self, root: &Path) -> Result<Vec<FunctionDeclaration>> {
        let functions = self.inner.read(root)?;
        let Some(only) = &self.only else {
            return Ok(functions);
        };
        let selected: Vec<FunctionDeclaration> =
            functions.into_iter().filter(|f| &f.id == only).collect();
        if selected.is_empty() {
            return Err(LocalFnError::ConfigError(format!(
                "no function with id '{}' is declared",
                only
            )));
        }
        Ok(selected)
    }
}

/// Resolve every `[function.<id>]` entry against `root`, in id order.
pub fn declarations(root: &Path, manifest: &Manifest) -> Vec<FunctionDeclaration> {
    manifest
        .functions()
        .iter()
        .map(|(id, f)| FunctionDeclaration {
            id: id.clone(),
            root: root.to_path_buf(),
            runtime: f.runtime.clone(),
            src_path: normalize(&root.join(&f.src)),
            handler: f.handler.clone(),
        })
        .collect()
}

/// Lexically drop `.` and resolve `..` so glob patterns built from the path
/// line up with the paths the watcher reports.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    const MANIFEST: &str = r#"
[function.api]
runtime = "node18.x"
src = "./services/api"
handler = "src/index.handler"

[function.jobs]
runtime = "python3.11"
src = "services/tools/../jobs"
handler = "main.handler"
"#;

    #[test]
    fn resolves_source_paths_against_root() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/localfn.toml", MANIFEST);
        let registry = ManifestRegistry::new(Arc::new(fs));

        let functions = registry.read(Path::new("/proj")).unwrap();

        assert_eq!(functions.len(), 2);
        assert_eq!(functions[0].id, "api");
        assert_eq!(functions[0].src_path, PathBuf::from("/proj/services/api"));
        assert_eq!(functions[0].root, PathBuf::from("/proj"));
        assert_eq!(functions[1].id, "jobs");
        assert_eq!(functions[1].src_path, PathBuf::from("/proj/services/jobs"));
    }

    #[test]
    fn rereads_on_every_call() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/localfn.toml", MANIFEST);
        let registry = ManifestRegistry::new(Arc::new(fs.clone()));
        assert_eq!(registry.read(Path::new("/proj")).unwrap().len(), 2);

        fs.add_file(
            "/proj/localfn.toml",
            "[function.only]\nruntime = \"go1.x\"\nsrc = \"only\"\nhandler = \"main.go\"\n",
        );
        let functions = registry.read(Path::new("/proj")).unwrap();
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].id, "only");
    }

    #[test]
    fn filter_selects_one_function() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/localfn.toml", MANIFEST);
        let registry = ManifestRegistry::new(Arc::new(fs));

        let only_jobs = FilteredRegistry::new(registry.clone(), Some("jobs".to_string()));
        let functions = only_jobs.read(Path::new("/proj")).unwrap();
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].id, "jobs");

        let all = FilteredRegistry::new(registry.clone(), None);
        assert_eq!(all.read(Path::new("/proj")).unwrap().len(), 2);

        let missing = FilteredRegistry::new(registry, Some("nope".to_string()));
        assert!(matches!(
            missing.read(Path::new("/proj")),
            Err(LocalFnError::ConfigError(_))
        ));
    }

    #[test]
    fn missing_manifest_is_an_error() {
        let registry = ManifestRegistry::new(Arc::new(MockFileSystem::new()));
        assert!(registry.read(Path::new("/nowhere")).is_err());
    }
}
