// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocalFnError {
    #[error("Unknown runtime: {0}")]
    UnknownRuntime(String),

    #[error("Handler not found for function '{function}': none of {candidates:?} exist in {src_path:?}")]
    HandlerNotFound {
        function: String,
        src_path: PathBuf,
        candidates: Vec<String>,
    },

    #[error("Build failed for function '{function}': {detail}")]
    BuildFailed { function: String, detail: String },

    #[error("Watch subscription failed: {0}")]
    WatchSubscriptionFailed(String),

    #[error("Invalid watch pattern '{pattern}' for function '{function}': {reason}")]
    PatternCompileFailed {
        function: String,
        pattern: String,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, LocalFnError>;
