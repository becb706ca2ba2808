// src/runtime/mod.rs

//! Runtime dispatch.
//!
//! A runtime identifier such as `node18.x` or `python3.11` is mapped onto a
//! closed set of [`RuntimeFamily`] variants by prefix. Each family has its
//! own handler module that turns a [`FunctionDeclaration`] into an
//! [`InstructionSet`]:
//!
//! - [`node`]: bundles with esbuild, runs under the Lambda runtime interface
//!   client.
//! - [`go`]: compiles a native binary and runs it directly.
//! - [`python`]: no build step; runs through a bootstrap shim.
//! - [`dotnet`]: `dotnet publish`, then runs through a bootstrap assembly.

use std::path::{Component, Path, PathBuf};

use crate::errors::{LocalFnError, Result};
use crate::instructions::InstructionSet;
use crate::types::FunctionDeclaration;

pub mod context;
pub mod dotnet;
pub mod go;
pub mod node;
pub mod python;

pub use context::{ArtifactDir, ArtifactPaths, HostEnvironment, RuntimeContext};

/// Supported runtime families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeFamily {
    Node,
    Go,
    Python,
    Dotnet,
}

impl RuntimeFamily {
    pub const ALL: [RuntimeFamily; 4] = [
        RuntimeFamily::Node,
        RuntimeFamily::Go,
        RuntimeFamily::Python,
        RuntimeFamily::Dotnet,
    ];

    /// Leading token of every runtime identifier in this family.
    pub fn prefix(self) -> &'static str {
        match self {
            RuntimeFamily::Node => "node",
            RuntimeFamily::Go => "go",
            RuntimeFamily::Python => "python",
            RuntimeFamily::Dotnet => "dotnetcore",
        }
    }

    /// Dispatch a runtime identifier to its family. The version suffix is
    /// ignored. Unknown identifiers are an error, never a fallback.
    pub fn from_identifier(identifier: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|family| identifier.starts_with(family.prefix()))
            .ok_or_else(|| LocalFnError::UnknownRuntime(identifier.to_string()))
    }

    /// Everything after the family prefix, e.g. `18.x` for `node18.x`.
    pub fn version_suffix(self, identifier: &str) -> &str {
        identifier.strip_prefix(self.prefix()).unwrap_or("")
    }

    /// Whether functions of this family have a build step.
    pub fn has_build_step(self) -> bool {
        !matches!(self, RuntimeFamily::Python)
    }

    pub fn instructions(
        self,
        decl: &FunctionDeclaration,
        ctx: &RuntimeContext,
    ) -> Result<InstructionSet> {
        match self {
            RuntimeFamily::Node => node::instructions(decl, ctx),
            RuntimeFamily::Go => go::instructions(decl, ctx),
            RuntimeFamily::Python => python::instructions(decl, ctx),
            RuntimeFamily::Dotnet => dotnet::instructions(decl, ctx),
        }
    }
}

/// Convenience: dispatch `identifier` to its family.
pub fn resolve(identifier: &str) -> Result<RuntimeFamily> {
    RuntimeFamily::from_identifier(identifier)
}

/// A `dir/file.symbol` handler string split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HandlerPath {
    /// Directory relative to the function's source path (may be empty).
    pub dir: PathBuf,
    /// File name up to its first dot.
    pub stem: String,
    /// Everything after the last dot of the file name.
    pub symbol: String,
}

impl HandlerPath {
    pub fn parse(handler: &str) -> Self {
        let path = Path::new(handler);
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = file_name.split('.').next().unwrap_or_default().to_string();
        let symbol = file_name
            .rsplit_once('.')
            .map(|(_, s)| s.to_string())
            .unwrap_or_default();
        Self { dir, stem, symbol }
    }

    /// `dir/stem`, relative to the source path.
    pub fn stem_path(&self) -> PathBuf {
        self.dir.join(&self.stem)
    }

    /// Dotted module form, e.g. `src/handlers/api` -> `src.handlers.api`.
    pub fn dotted_module(&self) -> String {
        self.dir
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .chain(std::iter::once(self.stem.clone()))
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Absolute glob for `pattern` under `src_path`, with forward slashes.
pub(crate) fn source_glob(src_path: &Path, pattern: &str) -> String {
    format!("{}/{}", escape_path(src_path).trim_end_matches('/'), pattern)
}

/// `path` as a glob that matches only itself, with forward slashes.
pub(crate) fn escape_path(path: &Path) -> String {
    globset::escape(&path.to_string_lossy().replace('\\', "/"))
        .replace('{', "[{]")
        .replace('}', "[}]")
}

pub(crate) fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
