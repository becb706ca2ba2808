// src/watch/debounce.rs

//! Write-stability debouncing.
//!
//! Raw change events for a path keep resetting that path's quiet timer. The
//! path is emitted once, after it has been quiet for the stability threshold,
//! on the next poll tick. Distinct paths are emitted in the order they were
//! first reported.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tracing::trace;

use crate::watch::source::DebounceConfig;

/// Task handle that aborts the task when dropped.
#[derive(Debug)]
pub struct AbortOnDrop(JoinHandle<()>);

impl AbortOnDrop {
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self(tokio::spawn(future))
    }
}

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Debounce `raw` into a stream of stable paths.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_debouncer(
    config: DebounceConfig,
    raw: mpsc::UnboundedReceiver<PathBuf>,
) -> (mpsc::UnboundedReceiver<PathBuf>, AbortOnDrop) {
    let (tx, rx) = mpsc::unbounded_channel();
    let task = AbortOnDrop::spawn(run_debouncer(config, raw, tx));
    (rx, task)
}

async fn run_debouncer(
    config: DebounceConfig,
    mut raw: mpsc::UnboundedReceiver<PathBuf>,
    stable: mpsc::UnboundedSender<PathBuf>,
) {
    // Last event time per path, plus the paths in first-reported order.
    let mut pending: HashMap<PathBuf, Instant> = HashMap::new();
    let mut order: VecDeque<PathBuf> = VecDeque::new();
    let mut ticker = tokio::time::interval(config.poll_interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            received = raw.recv() => {
                let Some(path) = received else {
                    return;
                };
                if pending.insert(path.clone(), Instant::now()).is_none() {
                    order.push_back(path);
                }
            }
            _ = ticker.tick(), if !order.is_empty() => {
                let now = Instant::now();
                let mut waiting = VecDeque::with_capacity(order.len());
                while let Some(path) = order.pop_front() {
                    let quiet = pending
                        .get(&path)
                        .is_some_and(|last| now.duration_since(*last) >= config.stability_threshold);
                    if !quiet {
                        waiting.push_back(path);
                        continue;
                    }
                    pending.remove(&path);
                    trace!(?path, "edit stable");
                    if stable.send(path).is_err() {
                        return;
                    }
                }
                order = waiting;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DebounceConfig {
        DebounceConfig {
            poll_interval: Duration::from_millis(100),
            stability_threshold: Duration::from_millis(20),
        }
    }

    async fn settle() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_writes_collapse_into_one_event() {
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let (mut stable, _task) = spawn_debouncer(config(), raw_rx);
        let file = PathBuf::from("/proj/api/index.ts");

        for _ in 0..5 {
            raw_tx.send(file.clone()).unwrap();
            settle().await;
            tokio::time::advance(Duration::from_millis(3)).await;
        }

        assert_eq!(stable.recv().await, Some(file));
        assert!(
            tokio::time::timeout(Duration::from_secs(1), stable.recv())
                .await
                .is_err(),
            "expected exactly one stable event"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn distinct_paths_keep_report_order() {
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let (mut stable, _task) = spawn_debouncer(config(), raw_rx);

        raw_tx.send(PathBuf::from("/b.go")).unwrap();
        raw_tx.send(PathBuf::from("/a.go")).unwrap();
        raw_tx.send(PathBuf::from("/b.go")).unwrap();

        assert_eq!(stable.recv().await, Some(PathBuf::from("/b.go")));
        assert_eq!(stable.recv().await, Some(PathBuf::from("/a.go")));
    }

    #[tokio::test(start_paused = true)]
    async fn bulk_changes_are_each_reported_once_in_order() {
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let (mut stable, _task) = spawn_debouncer(config(), raw_rx);
        let paths: Vec<PathBuf> = (0..5_000)
            .map(|i| PathBuf::from(format!("/repo/pkg{}/file{i}.go", i % 50)))
            .collect();

        for path in paths.iter().chain(paths.iter().rev()) {
            raw_tx.send(path.clone()).unwrap();
        }

        for expected in &paths {
            assert_eq!(stable.recv().await.as_ref(), Some(expected));
        }
        assert!(
            tokio::time::timeout(Duration::from_secs(1), stable.recv())
                .await
                .is_err()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn writes_after_the_window_are_reported_again() {
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let (mut stable, _task) = spawn_debouncer(config(), raw_rx);
        let file = PathBuf::from("/proj/jobs/main.py");

        raw_tx.send(file.clone()).unwrap();
        assert_eq!(stable.recv().await, Some(file.clone()));

        raw_tx.send(file.clone()).unwrap();
        assert_eq!(stable.recv().await, Some(file));
    }
}
