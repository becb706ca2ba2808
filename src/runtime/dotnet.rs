// src/runtime/dotnet.rs

//! .NET Core family (`dotnetcore*`).
//!
//! Handlers look like `Assembly::Namespace.Type::Method`. The project is
//! published into the artifacts directory and run through the bootstrap
//! assembly under `<shims_dir>/dotnet-bootstrap/release`.

use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::instructions::{Command, InstructionSet, WatchSpec};
use crate::runtime::{path_arg, source_glob, RuntimeContext, RuntimeFamily};
use crate::types::FunctionDeclaration;

const DEFAULT_FRAMEWORK_VERSION: &str = "3.1";

pub fn instructions(decl: &FunctionDeclaration, ctx: &RuntimeContext) -> Result<InstructionSet> {
    let relative = decl
        .src_path
        .strip_prefix(&decl.root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| PathBuf::from(&decl.id));
    let output_dir = ctx.artifacts.artifact_path(&decl.root, &relative);
    let target = output_dir.join(format!("{}.dll", assembly_name(&decl.handler)));

    let verbosity = if ctx.host.var("DEBUG").is_some() {
        "minimal"
    } else {
        "quiet"
    };

    let build = Command::new("dotnet")
        .arg("publish")
        .arg("--output")
        .arg(path_arg(&output_dir))
        .args(["--configuration", "Release"])
        .arg("--framework")
        .arg(target_framework(&decl.runtime))
        .args([
            "/p:GenerateRuntimeConfigurationFiles=true",
            "/clp:ForceConsoleColor",
            "--self-contained",
            "false",
            "-nologo",
            "--verbosity",
        ])
        .arg(verbosity);

    let bootstrap = ctx
        .shims_dir
        .join("dotnet-bootstrap")
        .join("release")
        .join("dotnet-bootstrap.dll");

    let run = Command::new("dotnet")
        .arg("exec")
        .arg(path_arg(&bootstrap))
        .arg(path_arg(&target))
        .arg(decl.handler.clone());

    Ok(InstructionSet {
        build: Some(build),
        run,
        watch: WatchSpec {
            include: vec![
                source_glob(&decl.src_path, "**/*.cs"),
                source_glob(&decl.src_path, "**/*.csx"),
            ],
            exclude: Vec::new(),
        },
    })
}

/// `Api::Api.Function::Handler` -> `Api`.
fn assembly_name(handler: &str) -> &str {
    let assembly = handler.split(':').next().unwrap_or(handler);
    assembly.rsplit(['/', '\\']).next().unwrap_or(assembly)
}

/// `dotnetcore3.1` -> `netcoreapp3.1`.
fn target_framework(runtime: &str) -> String {
    let version = RuntimeFamily::Dotnet.version_suffix(runtime);
    let version = if version.is_empty() {
        DEFAULT_FRAMEWORK_VERSION
    } else {
        version
    };
    format!("netcoreapp{version}")
}
