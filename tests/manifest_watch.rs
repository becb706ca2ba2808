mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use common::with_timeout;
use localfn::watch::{file_request, NotifyWatchSource, Subscription, WatchOptions, WatchSource};

fn subscribe(manifest: &Path) -> Subscription {
    NotifyWatchSource
        .subscribe(&file_request(manifest, &WatchOptions::default()))
        .unwrap()
}

/// Wait for the next report, then swallow any trailing events of the same save.
async fn next_report(subscription: &mut Subscription) -> PathBuf {
    let path = with_timeout(subscription.recv()).await.unwrap();
    while tokio::time::timeout(Duration::from_millis(300), subscription.recv())
        .await
        .is_ok()
    {}
    path
}

#[tokio::test]
async fn manifest_survives_rename_over_save() {
    common::init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let manifest = root.join("localfn.toml");
    fs::write(&manifest, "[config]\n").unwrap();

    let mut subscription = subscribe(&manifest);

    // Editor-style save: write a sibling, then rename it over the manifest.
    let swap = root.join(".localfn.toml.swp");
    fs::write(&swap, "[config]\npoll_interval_ms = 50\n").unwrap();
    fs::rename(&swap, &manifest).unwrap();
    assert_eq!(next_report(&mut subscription).await, manifest);

    // The replaced file keeps being reported.
    fs::write(&manifest, "[config]\npoll_interval_ms = 75\n").unwrap();
    assert_eq!(next_report(&mut subscription).await, manifest);
}

#[tokio::test]
async fn sibling_files_are_not_reported() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let manifest = root.join("localfn.toml");
    fs::write(&manifest, "").unwrap();

    let mut subscription = subscribe(&manifest);

    fs::write(root.join("notes.toml"), "x").unwrap();
    fs::create_dir(root.join("nested")).unwrap();
    fs::write(root.join("nested/localfn.toml"), "x").unwrap();

    assert!(
        tokio::time::timeout(Duration::from_millis(500), subscription.recv())
            .await
            .is_err()
    );
}
