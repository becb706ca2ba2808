// src/runtime/node.rs

//! Node.js family (`node*`).
//!
//! The handler names a file without its extension (`src/index.handler`), so
//! the entry file is found by probing [`CANDIDATE_EXTENSIONS`] in order.

use std::path::PathBuf;

use crate::errors::{LocalFnError, Result};
use crate::instructions::{Command, InstructionSet, WatchSpec};
use crate::runtime::{path_arg, source_glob, HandlerPath, RuntimeContext, RuntimeFamily};
use crate::types::FunctionDeclaration;

/// Probe order for the entry file.
pub const CANDIDATE_EXTENSIONS: [&str; 4] = ["ts", "tsx", "js", "jsx"];

/// Modules provided by the execution environment; never bundled.
pub const EXTERNAL_MODULES: [&str; 4] = ["pg", "deasync", "kysely", "aws-sdk"];

const ESBUILD: &str = "./node_modules/.bin/esbuild";
const DEFAULT_TARGET: &str = "node14";

pub fn instructions(decl: &FunctionDeclaration, ctx: &RuntimeContext) -> Result<InstructionSet> {
    let entry = HandlerPath::parse(&decl.handler);
    let file = resolve_entry_file(decl, &entry, ctx)?;
    let target = ctx
        .artifacts
        .artifact_path(&decl.root, &entry.dir.join(format!("{}.js", entry.stem)));

    let build = Command::new(ESBUILD)
        .arg("--bundle")
        .args(EXTERNAL_MODULES.iter().map(|m| format!("--external:{m}")))
        .args(["--format=cjs", "--sourcemap", "--platform=node"])
        .arg(format!("--target={}", esbuild_target(&decl.runtime)))
        .arg(format!("--outfile={}", path_arg(&target)))
        .arg(path_arg(&decl.src_path.join(&file)));

    // The runtime interface client selects the export from the "extension".
    let run = Command::new("npx")
        .arg("aws-lambda-ric")
        .arg(path_arg(&target.with_extension(&entry.symbol)))
        .env("AWS_LAMBDA_NODEJS_USE_ALTERNATIVE_CLIENT_1", "true");

    let include = CANDIDATE_EXTENSIONS
        .iter()
        .map(|ext| source_glob(&decl.src_path, &format!("**/*.{ext}")))
        .collect();

    Ok(InstructionSet {
        build: Some(build),
        run,
        watch: WatchSpec {
            include,
            exclude: Vec::new(),
        },
    })
}

/// First candidate (relative to `src_path`) that is a regular file.
fn resolve_entry_file(
    decl: &FunctionDeclaration,
    entry: &HandlerPath,
    ctx: &RuntimeContext,
) -> Result<PathBuf> {
    let candidates: Vec<PathBuf> = CANDIDATE_EXTENSIONS
        .iter()
        .map(|ext| entry.dir.join(format!("{}.{ext}", entry.stem)))
        .collect();

    candidates
        .iter()
        .find(|file| ctx.fs.is_file(&decl.src_path.join(file)))
        .cloned()
        .ok_or_else(|| LocalFnError::HandlerNotFound {
            function: decl.id.clone(),
            src_path: decl.src_path.clone(),
            candidates: candidates.iter().map(|c| path_arg(c)).collect(),
        })
}

/// esbuild `--target` for a runtime identifier: `node18.x` -> `node18`.
fn esbuild_target(runtime: &str) -> String {
    let major: String = RuntimeFamily::Node
        .version_suffix(runtime)
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    if major.is_empty() {
        DEFAULT_TARGET.to_string()
    } else {
        format!("node{major}")
    }
}
