// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `localfn`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "localfn",
    version,
    about = "Build, run and live-reload serverless functions locally.",
    long_about = None
)]
pub struct CliArgs {
    /// Project root containing the manifest.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Manifest file name, relative to the root.
    #[arg(long, value_name = "PATH", default_value = crate::config::MANIFEST_FILE)]
    pub config: PathBuf,

    /// Only build/run/watch the function with this id.
    #[arg(long, value_name = "ID")]
    pub function: Option<String>,

    /// Build every function once and exit; no processes are started.
    #[arg(long)]
    pub once: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `LOCALFN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print build/run/watch instructions without executing
    /// anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
