// src/config/mod.rs

//! Project manifest (`localfn.toml`): global settings plus the declared
//! functions.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, parse_manifest};
pub use model::{ConfigSection, FunctionConfig, Manifest, RawManifest, MANIFEST_FILE};
