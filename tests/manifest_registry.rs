mod common;

use std::fs;
use std::sync::Arc;

use common::{assert_silent, with_timeout};
use localfn::errors::LocalFnError;
use localfn::fs::RealFileSystem;
use localfn::registry::{FilteredRegistry, FunctionRegistry, ManifestRegistry};
use localfn::runtime::{ArtifactDir, HostEnvironment, RuntimeContext};
use localfn::types::Platform;
use localfn::watch::{FunctionWatcher, WatchOptions};
use localfn_test_utils::fake_source::FakeWatchSource;
use tempfile::TempDir;
use tokio::sync::mpsc;

const TWO_FUNCTIONS: &str = r#"
[config]
poll_interval_ms = 50

[function.api]
runtime = "node18.x"
src = "services/api"
handler = "src/index.handler"

[function.worker]
runtime = "go1.x"
src = "./services/worker"
handler = "main.go"
"#;

const WORKER_ONLY: &str = r#"
[function.worker]
runtime = "go1.x"
src = "services/worker"
handler = "main.go"
"#;

fn project(manifest: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let api = dir.path().join("services/api/src");
    fs::create_dir_all(&api).unwrap();
    fs::write(api.join("index.ts"), "export const handler = async () => {};").unwrap();
    let worker = dir.path().join("services/worker");
    fs::create_dir_all(&worker).unwrap();
    fs::write(worker.join("main.go"), "package main").unwrap();
    fs::write(dir.path().join("localfn.toml"), manifest).unwrap();
    dir
}

fn registry() -> ManifestRegistry {
    ManifestRegistry::new(Arc::new(RealFileSystem))
}

#[test]
fn reads_declarations_in_id_order() {
    let dir = project(TWO_FUNCTIONS);
    let root = dir.path();

    let functions = registry().read(root).unwrap();

    let ids: Vec<&str> = functions.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["api", "worker"]);
    assert_eq!(functions[0].root, root);
    assert_eq!(functions[0].src_path, root.join("services/api"));
    assert_eq!(functions[1].src_path, root.join("services/worker"));
    assert_eq!(functions[0].handler, "src/index.handler");
}

#[test]
fn every_read_sees_the_current_manifest() {
    let dir = project(TWO_FUNCTIONS);
    let registry = registry();
    assert_eq!(registry.read(dir.path()).unwrap().len(), 2);

    fs::write(dir.path().join("localfn.toml"), WORKER_ONLY).unwrap();

    let functions = registry.read(dir.path()).unwrap();
    assert_eq!(functions.len(), 1);
    assert_eq!(functions[0].id, "worker");
}

#[test]
fn unknown_runtime_is_rejected_at_load() {
    let dir = project(
        r#"
[function.legacy]
runtime = "ruby2.7"
src = "legacy"
handler = "app.handler"
"#,
    );

    assert!(matches!(
        registry().read(dir.path()),
        Err(LocalFnError::UnknownRuntime(id)) if id == "ruby2.7"
    ));
}

#[test]
fn missing_manifest_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(registry().read(dir.path()).is_err());
}

#[test]
fn filter_selects_one_function_or_fails() {
    let dir = project(TWO_FUNCTIONS);

    let only = FilteredRegistry::new(registry(), Some("worker".to_string()));
    let functions = only.read(dir.path()).unwrap();
    assert_eq!(functions.len(), 1);
    assert_eq!(functions[0].id, "worker");

    let missing = FilteredRegistry::new(registry(), Some("nope".to_string()));
    assert!(matches!(
        missing.read(dir.path()),
        Err(LocalFnError::ConfigError(_))
    ));
}

#[tokio::test]
async fn watcher_follows_manifest_edits() {
    common::init_tracing();
    let dir = project(TWO_FUNCTIONS);
    let root = dir.path().to_path_buf();

    let context = Arc::new(RuntimeContext::new(
        Arc::new(RealFileSystem),
        HostEnvironment::from_vars(Vec::<(String, String)>::new(), Platform::Unix),
        Arc::new(ArtifactDir::new(".build/artifacts")),
        root.join(".localfn/shims"),
    ));
    let source = FakeWatchSource::new();
    let (tx, mut rx) = mpsc::channel(8);
    let mut watcher = FunctionWatcher::new(
        source.clone(),
        Arc::new(registry()),
        context,
        WatchOptions::default(),
        tx,
    );

    watcher.reload(&root).unwrap();
    assert_eq!(watcher.bindings().len(), 2);

    source.emit(root.join("services/api/src/util.ts"));
    let change = with_timeout(rx.recv()).await.unwrap();
    assert_eq!(change.functions[0].id, "api");

    fs::write(root.join("localfn.toml"), WORKER_ONLY).unwrap();
    watcher.reload(&root).unwrap();

    source.emit(root.join("services/api/src/util.ts"));
    assert_silent(&mut rx).await;

    source.emit(root.join("services/worker/main.go"));
    let change = with_timeout(rx.recv()).await.unwrap();
    assert_eq!(change.functions.len(), 1);
    assert_eq!(change.functions[0].id, "worker");
    assert_eq!(change.path, root.join("services/worker/main.go"));
}
