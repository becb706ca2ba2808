// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

/// Name of the manifest file looked up in the project root.
pub const MANIFEST_FILE: &str = "localfn.toml";

/// Manifest as read from `localfn.toml`, before validation.
///
/// ```toml
/// [config]
/// artifacts_dir = ".build/artifacts"
/// poll_interval_ms = 100
///
/// [function.api]
/// runtime = "node18.x"
/// src = "services/api"
/// handler = "src/index.handler"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawManifest {
    #[serde(default)]
    pub config: ConfigSection,

    /// All functions from `[function.<id>]`, keyed by id.
    #[serde(default)]
    pub function: BTreeMap<String, FunctionConfig>,
}

/// Validated manifest. Only constructed through `TryFrom<RawManifest>`.
#[derive(Debug, Clone)]
pub struct Manifest {
    config: ConfigSection,
    function: BTreeMap<String, FunctionConfig>,
}

impl Manifest {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        function: BTreeMap<String, FunctionConfig>,
    ) -> Self {
        Self { config, function }
    }

    pub fn config(&self) -> &ConfigSection {
        &self.config
    }

    pub fn functions(&self) -> &BTreeMap<String, FunctionConfig> {
        &self.function
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Where build outputs go, relative to the project root.
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: String,

    /// Directory holding the language bootstrap shims, relative to the
    /// project root unless absolute.
    #[serde(default = "default_shims_dir")]
    pub shims_dir: String,

    /// Paths the watcher never reports, regardless of function.
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,

    /// How often pending edits are checked for stability.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// How long a file must stay untouched before its edit is reported.
    #[serde(default = "default_stability_threshold_ms")]
    pub stability_threshold_ms: u64,
}

impl ConfigSection {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn stability_threshold(&self) -> Duration {
        Duration::from_millis(self.stability_threshold_ms)
    }
}

fn default_artifacts_dir() -> String {
    ".build/artifacts".to_string()
}

fn default_shims_dir() -> String {
    ".localfn/shims".to_string()
}

fn default_ignore() -> Vec<String> {
    vec!["**/.build/**".to_string(), "**/.sst/**".to_string()]
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_stability_threshold_ms() -> u64 {
    20
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            artifacts_dir: default_artifacts_dir(),
            shims_dir: default_shims_dir(),
            ignore: default_ignore(),
            poll_interval_ms: default_poll_interval_ms(),
            stability_threshold_ms: default_stability_threshold_ms(),
        }
    }
}

/// `[function.<id>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionConfig {
    /// Runtime identifier, e.g. `"python3.11"`.
    pub runtime: String,

    /// Source directory relative to the project root.
    pub src: String,

    /// Entry point within `src`.
    pub handler: String,
}
