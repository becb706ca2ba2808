// src/watch/source.rs

//! Filesystem change subscriptions.
//!
//! A [`WatchSource`] turns a [`WatchRequest`] (include globs, ignore globs,
//! debounce settings) into a [`Subscription`]: a stream of changed paths that
//! have already been filtered and debounced. [`NotifyWatchSource`] is the
//! production implementation on top of `notify`.

use std::any::Any;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::errors::{LocalFnError, Result};
use crate::watch::debounce::spawn_debouncer;
use crate::watch::patterns::build_globset;

/// Write-stability window.
///
/// A path is reported once it has seen no further events for
/// `stability_threshold`, checked every `poll_interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceConfig {
    pub poll_interval: Duration,
    pub stability_threshold: Duration,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            stability_threshold: Duration::from_millis(20),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRequest {
    /// Absolute include globs; only matching paths are reported.
    pub include: Vec<String>,
    /// Globs that are never reported.
    pub ignore: Vec<String>,
    pub follow_symlinks: bool,
    pub debounce: DebounceConfig,
}

/// A live subscription. Dropping it releases every watch resource.
pub struct Subscription {
    events: mpsc::UnboundedReceiver<PathBuf>,
    guard: Box<dyn Any + Send>,
}

impl Subscription {
    /// `guard` is kept alive for as long as the subscription is.
    pub fn new(events: mpsc::UnboundedReceiver<PathBuf>, guard: impl Any + Send) -> Self {
        Self {
            events,
            guard: Box::new(guard),
        }
    }

    /// Next stable changed path; `None` once the source has shut down.
    pub async fn recv(&mut self) -> Option<PathBuf> {
        self.events.recv().await
    }

    pub(crate) fn into_parts(self) -> (mpsc::UnboundedReceiver<PathBuf>, Box<dyn Any + Send>) {
        (self.events, self.guard)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

pub trait WatchSource: Send + Sync {
    /// Open a subscription. Failing to establish it is fatal to the caller.
    fn subscribe(&self, request: &WatchRequest) -> Result<Subscription>;
}

/// Watch source backed by the platform's recommended `notify` watcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotifyWatchSource;

impl WatchSource for NotifyWatchSource {
    fn subscribe(&self, request: &WatchRequest) -> Result<Subscription> {
        let include = build_globset(&request.include).map_err(subscription_failed)?;
        let ignore = build_globset(&request.ignore).map_err(subscription_failed)?;

        // Channel from the blocking notify callback into the async world.
        let (raw_tx, raw_rx) = mpsc::unbounded_channel::<PathBuf>();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !is_content_change(&event.kind) {
                        return;
                    }
                    for path in event.paths {
                        if include.is_match(&path) && !ignore.is_match(&path) {
                            // Receiver gone means the subscription was dropped.
                            if raw_tx.send(path).is_err() {
                                return;
                            }
                        }
                    }
                }
                Err(err) => warn!(error = %err, "file watch error"),
            },
            Config::default().with_follow_symlinks(request.follow_symlinks),
        )
        .map_err(subscription_failed)?;

        let roots = watch_roots(&request.include);
        for root in &roots {
            let mode = if root.recursive {
                RecursiveMode::Recursive
            } else {
                RecursiveMode::NonRecursive
            };
            watcher.watch(&root.path, mode).map_err(|err| {
                LocalFnError::WatchSubscriptionFailed(format!("watching {:?}: {err}", root.path))
            })?;
        }

        info!(?roots, "file watcher started");

        let (events, debouncer) = spawn_debouncer(request.debounce, raw_rx);
        Ok(Subscription::new(events, (watcher, debouncer)))
    }
}

fn subscription_failed(err: impl std::fmt::Display) -> LocalFnError {
    LocalFnError::WatchSubscriptionFailed(err.to_string())
}

/// Creations and content/name modifications count; metadata-only changes,
/// reads and removals do not.
fn is_content_change(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) => true,
        EventKind::Modify(modify) => !matches!(modify, ModifyKind::Metadata(_)),
        _ => false,
    }
}

/// A directory handed to `notify`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRoot {
    pub path: PathBuf,
    pub recursive: bool,
}

/// Directories to watch so that every include glob is covered.
///
/// A glob contributes its longest literal directory prefix, watched
/// recursively. A fully literal pattern names a single file; its parent
/// directory is watched non-recursively, which keeps reporting the file
/// after it is replaced by a rename. Roots already covered by a recursive
/// root are dropped.
pub fn watch_roots(patterns: &[String]) -> Vec<WatchRoot> {
    let mut dirs: Vec<PathBuf> = Vec::new();
    let mut file_parents: Vec<PathBuf> = Vec::new();
    for pattern in patterns {
        let (prefix, literal) = literal_prefix(pattern);
        if literal {
            let parent = prefix.parent().map(Path::to_path_buf).unwrap_or(prefix);
            file_parents.push(parent);
        } else {
            dirs.push(prefix);
        }
    }
    dirs.sort();
    dirs.dedup();
    file_parents.sort();
    file_parents.dedup();

    let mut roots: Vec<WatchRoot> = Vec::new();
    for path in dirs {
        if !roots.iter().any(|kept| path.starts_with(&kept.path)) {
            roots.push(WatchRoot {
                path,
                recursive: true,
            });
        }
    }
    for path in file_parents {
        if !roots.iter().any(|kept| kept.recursive && path.starts_with(&kept.path)) {
            roots.push(WatchRoot {
                path,
                recursive: false,
            });
        }
    }
    roots
}

/// Literal leading components of `pattern`, and whether that is the whole
/// pattern.
fn literal_prefix(pattern: &str) -> (PathBuf, bool) {
    let mut prefix = PathBuf::new();
    if pattern.starts_with('/') {
        prefix.push("/");
    }
    for part in pattern.split('/').filter(|s| !s.is_empty()) {
        if part.contains(['*', '?', '[', ']', '{', '}', '\\']) {
            return (prefix, false);
        }
        prefix.push(part);
    }
    (prefix, true)
}
