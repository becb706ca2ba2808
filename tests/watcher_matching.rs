mod common;

use std::path::Path;
use std::sync::Arc;

use common::{assert_silent, with_timeout};
use localfn::watch::{ChangeSet, FunctionWatcher, WatchOptions};
use localfn_test_utils::builders::{ContextBuilder, FunctionBuilder};
use localfn_test_utils::fake_registry::StaticRegistry;
use localfn_test_utils::fake_source::FakeWatchSource;
use tokio::sync::mpsc;

fn ids(change: &ChangeSet) -> Vec<String> {
    let mut ids: Vec<String> = change.functions.iter().map(|f| f.id.clone()).collect();
    ids.sort();
    ids
}

fn start(
    registry: StaticRegistry,
) -> (
    FakeWatchSource,
    FunctionWatcher<FakeWatchSource>,
    mpsc::Receiver<ChangeSet>,
) {
    let source = FakeWatchSource::new();
    let (tx, rx) = mpsc::channel(8);
    let watcher = FunctionWatcher::new(
        source.clone(),
        Arc::new(registry),
        ContextBuilder::new().build(),
        WatchOptions::default(),
        tx,
    );
    (source, watcher, rx)
}

#[tokio::test]
async fn disjoint_functions_are_notified_separately() {
    common::init_tracing();
    let registry = StaticRegistry::new(vec![
        FunctionBuilder::new("a").build(),
        FunctionBuilder::new("b").build(),
    ]);
    let (source, mut watcher, mut rx) = start(registry);
    watcher.reload(Path::new("/proj")).unwrap();

    assert!(source.emit("/proj/a/handlers/main.go"));
    let change = with_timeout(rx.recv()).await.unwrap();
    assert_eq!(change.path, Path::new("/proj/a/handlers/main.go"));
    assert_eq!(ids(&change), vec!["a"]);

    assert!(source.emit("/proj/b/main.go"));
    let change = with_timeout(rx.recv()).await.unwrap();
    assert_eq!(ids(&change), vec!["b"]);
}

#[tokio::test]
async fn overlapping_functions_are_notified_together() {
    let registry = StaticRegistry::new(vec![
        FunctionBuilder::new("a").build(),
        FunctionBuilder::new("lib").src("/proj/a/lib").build(),
    ]);
    let (source, mut watcher, mut rx) = start(registry);
    watcher.reload(Path::new("/proj")).unwrap();

    source.emit("/proj/a/lib/util.go");
    let change = with_timeout(rx.recv()).await.unwrap();
    assert_eq!(ids(&change), vec!["a", "lib"]);
}

#[tokio::test]
async fn unmatched_changes_are_not_reported() {
    let registry = StaticRegistry::new(vec![FunctionBuilder::new("a").build()]);
    let (source, mut watcher, mut rx) = start(registry);
    watcher.reload(Path::new("/proj")).unwrap();

    source.emit("/proj/a/README.md");
    source.emit("/proj/other/main.go");
    assert_silent(&mut rx).await;
}

#[tokio::test]
async fn subscription_covers_union_of_include_globs() {
    let registry = StaticRegistry::new(vec![
        FunctionBuilder::new("a").build(),
        FunctionBuilder::new("jobs")
            .runtime("python3.11")
            .handler("main.handler")
            .build(),
    ]);
    let (source, mut watcher, _rx) = start(registry);
    watcher.reload(Path::new("/proj")).unwrap();

    let requests = source.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].include,
        vec!["/proj/a/**/*.go", "/proj/jobs/**/*.py"]
    );
    assert_eq!(requests[0].ignore, vec!["**/.build/**", "**/.sst/**"]);
    assert!(!requests[0].follow_symlinks);
    assert_eq!(watcher.bindings().len(), 2);
}

#[tokio::test]
async fn unresolvable_function_is_skipped_not_fatal() {
    // Node entry file does not exist, so resolution fails for "api" only.
    let registry = StaticRegistry::new(vec![
        FunctionBuilder::new("api")
            .runtime("node18.x")
            .handler("index.handler")
            .build(),
        FunctionBuilder::new("a").build(),
    ]);
    let (source, mut watcher, mut rx) = start(registry);
    watcher.reload(Path::new("/proj")).unwrap();

    assert_eq!(watcher.bindings().len(), 1);
    assert_eq!(watcher.bindings()[0].function().id, "a");

    source.emit("/proj/a/main.go");
    let change = with_timeout(rx.recv()).await.unwrap();
    assert_eq!(ids(&change), vec!["a"]);
}
