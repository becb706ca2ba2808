// src/config/loader.rs

use std::path::Path;

use crate::config::model::{Manifest, RawManifest};
use crate::errors::Result;
use crate::fs::FileSystem;

/// Parse manifest text without semantic validation.
pub fn parse_manifest(contents: &str) -> Result<RawManifest> {
    let manifest: RawManifest = toml::from_str(contents)?;
    Ok(manifest)
}

/// Read a manifest through `fs` and validate it.
///
/// This is the entry point the rest of the crate uses:
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks that every function is complete and names a known runtime.
pub fn load_and_validate(fs: &dyn FileSystem, path: impl AsRef<Path>) -> Result<Manifest> {
    let contents = fs.read_to_string(path.as_ref())?;
    let raw = parse_manifest(&contents)?;
    Manifest::try_from(raw)
}
