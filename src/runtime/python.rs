// src/runtime/python.rs

//! Python family (`python*`).
//!
//! There is no build step. The interpreter runs a bootstrap shim from
//! `<shims_dir>/python/bootstrap.py`, which imports the handler module and
//! serves invocations.

use std::path::PathBuf;

use crate::errors::Result;
use crate::instructions::{Command, InstructionSet, WatchSpec};
use crate::runtime::{path_arg, source_glob, HandlerPath, HostEnvironment, RuntimeContext};
use crate::types::{FunctionDeclaration, Platform};

pub fn instructions(decl: &FunctionDeclaration, ctx: &RuntimeContext) -> Result<InstructionSet> {
    let entry = HandlerPath::parse(&decl.handler);
    let bootstrap = ctx.shims_dir.join("python").join("bootstrap.py");

    let mut run = Command::new(interpreter(&decl.runtime, ctx.host.platform()))
        .arg("-u")
        .arg(path_arg(&bootstrap))
        .arg(entry.dotted_module())
        .arg(path_arg(&decl.src_path))
        .arg(entry.symbol);

    if let Some(path) = virtualenv_path(&ctx.host) {
        run = run.env("PATH", path);
    }

    Ok(InstructionSet {
        build: None,
        run,
        watch: WatchSpec {
            include: vec![source_glob(&decl.src_path, "**/*.py")],
            exclude: Vec::new(),
        },
    })
}

/// `python3.11` -> `python3`; always `python.exe` on Windows.
fn interpreter(runtime: &str, platform: Platform) -> String {
    match platform {
        Platform::Windows => "python.exe".to_string(),
        Platform::Unix => runtime.split('.').next().unwrap_or(runtime).to_string(),
    }
}

/// `PATH` with the active virtualenv's executables first, if one is active.
fn virtualenv_path(host: &HostEnvironment) -> Option<String> {
    let venv = host.var("VIRTUAL_ENV")?;
    let bin = match host.platform() {
        Platform::Windows => "Scripts",
        Platform::Unix => "bin",
    };
    let venv_bin = path_arg(&PathBuf::from(venv).join(bin));
    Some(format!(
        "{}{}{}",
        venv_bin,
        host.platform().path_list_separator(),
        host.var("PATH").unwrap_or_default()
    ))
}
