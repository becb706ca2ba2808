// src/types.rs

use std::path::PathBuf;

/// Canonical function identifier used throughout the crate.
pub type FunctionId = String;

/// A function as declared by the project, resolved against the project root.
///
/// Owned by the function registry; everything else only reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDeclaration {
    pub id: FunctionId,
    /// Project root the function was declared under.
    pub root: PathBuf,
    /// Opaque runtime identifier, e.g. `node18.x`, `python3.11`, `go1.x`.
    pub runtime: String,
    /// Absolute path to the function's source directory.
    pub src_path: PathBuf,
    /// Entry point within `src_path`. Either `dir/file.symbol` or
    /// `Assembly:Namespace.Type::Method`, depending on the runtime family.
    pub handler: String,
}

/// Host operating system family, as far as command resolution cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Unix,
    Windows,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }

    /// Separator used between entries of `PATH`-like variables.
    pub fn path_list_separator(self) -> char {
        match self {
            Platform::Unix => ':',
            Platform::Windows => ';',
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Platform::current()
    }
}
