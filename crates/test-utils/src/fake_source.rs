use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use localfn::errors::{LocalFnError, Result};
use localfn::watch::debounce::spawn_debouncer;
use localfn::watch::{Subscription, WatchRequest, WatchSource};

/// Watch source driven by the test.
///
/// Every `subscribe` call records its request and opens a new channel; `emit`
/// pushes a raw change into the most recent one. With `debounced()` the raw
/// changes go through the real debouncer first.
#[derive(Clone, Default)]
pub struct FakeWatchSource {
    senders: Arc<Mutex<Vec<mpsc::UnboundedSender<PathBuf>>>>,
    requests: Arc<Mutex<Vec<WatchRequest>>>,
    debounce: bool,
    failing: Arc<AtomicBool>,
}

impl FakeWatchSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn debounced() -> Self {
        Self {
            debounce: true,
            ..Self::default()
        }
    }

    /// Make subsequent subscriptions fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Report a raw change on the latest subscription. Returns false if that
    /// subscription has been dropped.
    pub fn emit(&self, path: impl Into<PathBuf>) -> bool {
        let senders = self.senders.lock().unwrap();
        match senders.last() {
            Some(tx) => tx.send(path.into()).is_ok(),
            None => false,
        }
    }

    pub fn requests(&self) -> Vec<WatchRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Whether the subscription opened by the `n`th `subscribe` call is
    /// still alive.
    pub fn is_open(&self, n: usize) -> bool {
        self.senders
            .lock()
            .unwrap()
            .get(n)
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Resolve once the subscription opened by the `n`th `subscribe` call has
    /// been dropped. Teardown runs on the Tokio runtime, so callers should
    /// await this rather than poll `is_open`.
    pub async fn closed(&self, n: usize) {
        let tx = self.senders.lock().unwrap().get(n).cloned();
        if let Some(tx) = tx {
            tx.closed().await;
        }
    }
}

impl WatchSource for FakeWatchSource {
    fn subscribe(&self, request: &WatchRequest) -> Result<Subscription> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(LocalFnError::WatchSubscriptionFailed(
                "fake source refused".to_string(),
            ));
        }
        self.requests.lock().unwrap().push(request.clone());

        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.lock().unwrap().push(tx);

        if self.debounce {
            let (stable, debouncer) = spawn_debouncer(request.debounce, rx);
            Ok(Subscription::new(stable, debouncer))
        } else {
            Ok(Subscription::new(rx, ()))
        }
    }
}
