// src/lib.rs

pub mod build;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod instructions;
pub mod logging;
pub mod registry;
pub mod runtime;
pub mod types;
pub mod watch;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::build::BuildDriver;
use crate::cli::CliArgs;
use crate::exec::{LaunchSpec, ProcessLauncher, ProcessSupervisor, StdioMode, SystemLauncher};
use crate::fs::{FileSystem, RealFileSystem};
use crate::registry::{FilteredRegistry, FunctionRegistry, ManifestRegistry};
use crate::runtime::{ArtifactDir, HostEnvironment, RuntimeContext};
use crate::types::FunctionDeclaration;
use crate::watch::{
    file_request, ChangeSet, FunctionWatcher, NotifyWatchSource, Subscription, WatchOptions,
    WatchSource,
};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - manifest loading
/// - runtime resolution and builds
/// - one supervised run process per function
/// - the function watcher (rebuild + restart on change)
/// - manifest reloads and Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let root = args
        .root
        .canonicalize()
        .with_context(|| format!("resolving project root {:?}", args.root))?;

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let manifests = ManifestRegistry::new(Arc::clone(&fs)).with_file_name(&args.config);
    let manifest = manifests.manifest(&root)?;
    let settings = manifest.config().clone();

    let context = Arc::new(RuntimeContext::new(
        fs,
        HostEnvironment::capture(),
        Arc::new(ArtifactDir::new(&settings.artifacts_dir)),
        root.join(&settings.shims_dir),
    ));

    let manifest_path = manifests.manifest_path(&root);
    let registry: Arc<dyn FunctionRegistry> =
        Arc::new(FilteredRegistry::new(manifests, args.function.clone()));
    let functions = registry.read(&root)?;

    if args.dry_run {
        print_dry_run(&root, &context, &functions);
        return Ok(());
    }

    let driver = BuildDriver::new(Arc::clone(&context), SystemLauncher);

    if args.once {
        for function in &functions {
            driver.build(function).await?;
        }
        info!(count = functions.len(), "all functions built");
        return Ok(());
    }

    let mut supervisor = ProcessSupervisor::new();
    for function in &functions {
        rebuild_and_restart(&driver, &mut supervisor, function).await;
    }

    let options = WatchOptions::from_config(&settings);
    let mut manifest_watch = watch_manifest(&manifest_path, &options)?;

    let (change_tx, mut change_rx) = mpsc::channel::<ChangeSet>(16);
    let mut watcher = FunctionWatcher::new(
        NotifyWatchSource,
        Arc::clone(&registry),
        Arc::clone(&context),
        options,
        change_tx,
    );
    watcher.reload(&root)?;
    let mut known: Vec<FunctionDeclaration> = functions;

    loop {
        tokio::select! {
            change = change_rx.recv() => {
                let Some(change) = change else {
                    warn!("watcher channel closed");
                    break;
                };
                info!(path = ?change.path, count = change.functions.len(), "source changed");
                for function in &change.functions {
                    rebuild_and_restart(&driver, &mut supervisor, function).await;
                }
            }

            Some(_) = manifest_watch.recv() => {
                info!(manifest = ?manifest_path, "manifest changed; reloading functions");
                match registry.read(&root) {
                    Ok(current) => {
                        for gone in known.iter().filter(|k| !current.iter().any(|c| c.id == k.id)) {
                            info!(function = %gone.id, "function removed");
                            supervisor.stop(&gone.id).await;
                        }
                        for function in &current {
                            rebuild_and_restart(&driver, &mut supervisor, function).await;
                        }
                        known = current;
                        if let Err(err) = watcher.reload(&root) {
                            error!(error = %err, "reloading watcher failed; still watching the previous functions");
                        }
                    }
                    Err(err) => error!(error = %err, "manifest is invalid; keeping previous functions"),
                }
            }

            res = tokio::signal::ctrl_c() => {
                if let Err(e) = res {
                    warn!(error = %e, "failed to listen for Ctrl+C");
                }
                info!("shutting down");
                break;
            }
        }
    }

    watcher.stop();
    supervisor.shutdown().await;
    Ok(())
}

/// Build `function` and (re)start its run process. Failures are logged and
/// leave the function stopped.
async fn rebuild_and_restart<L: ProcessLauncher>(
    driver: &BuildDriver<L>,
    supervisor: &mut ProcessSupervisor,
    function: &FunctionDeclaration,
) {
    let instructions = match driver.context().instructions(function) {
        Ok(instructions) => instructions,
        Err(err) => {
            error!(function = %function.id, error = %err, "cannot resolve function");
            supervisor.stop(&function.id).await;
            return;
        }
    };

    if let Err(err) = driver.build_resolved(function, &instructions).await {
        error!(function = %function.id, error = %err, "function left stopped");
        supervisor.stop(&function.id).await;
        return;
    }

    let spec = LaunchSpec::from_command(
        &instructions.run,
        &driver.context().host,
        &function.src_path,
        StdioMode::Piped,
    );
    if let Err(err) = supervisor.restart(&function.id, spec).await {
        error!(function = %function.id, error = %format!("{err:#}"), "failed to start function");
    }
}

/// Subscription reporting edits of the manifest itself.
fn watch_manifest(manifest_path: &Path, options: &WatchOptions) -> Result<Subscription> {
    NotifyWatchSource
        .subscribe(&file_request(manifest_path, options))
        .context("watching the manifest")
}

/// Print what would be built, run and watched for each function.
fn print_dry_run(root: &Path, context: &RuntimeContext, functions: &[FunctionDeclaration]) {
    println!("localfn dry-run");
    println!("  root = {}", root.display());
    println!();

    println!("functions ({}):", functions.len());
    for function in functions {
        println!("  - {} ({})", function.id, function.runtime);
        println!("      src: {}", function.src_path.display());
        println!("      handler: {}", function.handler);
        match context.instructions(function) {
            Ok(instructions) => {
                match &instructions.build {
                    Some(build) => println!("      build: {} {}", build.executable, build.args.join(" ")),
                    None => println!("      build: (none)"),
                }
                println!(
                    "      run: {} {}",
                    instructions.run.executable,
                    instructions.run.args.join(" ")
                );
                if !instructions.run.env.is_empty() {
                    println!("      env: {:?}", instructions.run.env);
                }
                println!("      watch: {:?}", instructions.watch.include);
            }
            Err(err) => println!("      error: {err}"),
        }
    }
}
