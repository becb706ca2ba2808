// src/watch/watcher.rs

use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::ConfigSection;
use crate::errors::{LocalFnError, Result};
use crate::registry::FunctionRegistry;
use crate::runtime::{escape_path, RuntimeContext};
use crate::types::FunctionDeclaration;
use crate::watch::debounce::AbortOnDrop;
use crate::watch::patterns::{compile_bindings, include_union, matching_functions, WatchBinding};
use crate::watch::source::{DebounceConfig, WatchRequest, WatchSource};

/// A stable change and every function it affects. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    pub path: PathBuf,
    pub functions: Vec<FunctionDeclaration>,
}

/// Subscription settings shared by every reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchOptions {
    pub ignore: Vec<String>,
    pub follow_symlinks: bool,
    pub debounce: DebounceConfig,
}

impl WatchOptions {
    pub fn from_config(config: &ConfigSection) -> Self {
        Self {
            ignore: config.ignore.clone(),
            follow_symlinks: false,
            debounce: DebounceConfig {
                poll_interval: config.poll_interval(),
                stability_threshold: config.stability_threshold(),
            },
        }
    }
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self::from_config(&ConfigSection::default())
    }
}

/// Request reporting edits of the single file at `path`, including saves
/// that replace it by renaming a temporary file over it.
pub fn file_request(path: &Path, options: &WatchOptions) -> WatchRequest {
    WatchRequest {
        include: vec![escape_path(path)],
        ignore: Vec::new(),
        follow_symlinks: options.follow_symlinks,
        debounce: options.debounce,
    }
}

struct ActiveWatch {
    bindings: Arc<Vec<WatchBinding>>,
    // Field order matters: stop dispatching before releasing the source.
    _dispatch: AbortOnDrop,
    _subscription: Box<dyn Any + Send>,
}

enum WatchState {
    Idle,
    Watching(ActiveWatch),
}

/// Maps filesystem changes to the functions they affect.
///
/// Each [`reload`](Self::reload) re-reads the registry, rebuilds every
/// binding and replaces the single underlying subscription. Matched change
/// sets go to the listener channel given at construction.
pub struct FunctionWatcher<S: WatchSource> {
    source: S,
    registry: Arc<dyn FunctionRegistry>,
    context: Arc<RuntimeContext>,
    options: WatchOptions,
    listener: mpsc::Sender<ChangeSet>,
    state: WatchState,
}

impl<S: WatchSource> FunctionWatcher<S> {
    pub fn new(
        source: S,
        registry: Arc<dyn FunctionRegistry>,
        context: Arc<RuntimeContext>,
        options: WatchOptions,
        listener: mpsc::Sender<ChangeSet>,
    ) -> Self {
        Self {
            source,
            registry,
            context,
            options,
            listener,
            state: WatchState::Idle,
        }
    }

    /// Rebuild all bindings for the functions under `root` and resubscribe.
    ///
    /// The previous subscription is replaced only once the new one is open;
    /// if it cannot be opened the error is returned and the previous
    /// bindings keep being served.
    /// Functions that cannot be resolved (other than unknown runtimes) or whose
    /// patterns fail to compile are skipped with a warning.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn reload(&mut self, root: &Path) -> Result<()> {
        let functions = self.registry.read(root)?;

        let mut resolved = Vec::with_capacity(functions.len());
        for decl in functions {
            match self.context.instructions(&decl) {
                Ok(instructions) => resolved.push((decl, instructions)),
                Err(err @ LocalFnError::UnknownRuntime(_)) => return Err(err),
                Err(err) => {
                    warn!(function = %decl.id, error = %err, "cannot resolve function; not watching it");
                }
            }
        }

        let bindings = compile_bindings(resolved);
        let request = WatchRequest {
            include: include_union(&bindings),
            ignore: self.options.ignore.clone(),
            follow_symlinks: self.options.follow_symlinks,
            debounce: self.options.debounce,
        };

        let (events, subscription) = self.source.subscribe(&request)?.into_parts();

        let bindings = Arc::new(bindings);
        let dispatch = AbortOnDrop::spawn(dispatch_changes(
            events,
            Arc::clone(&bindings),
            self.listener.clone(),
        ));

        info!(
            root = ?root,
            functions = bindings.len(),
            patterns = request.include.len(),
            "watching functions"
        );

        self.state = WatchState::Watching(ActiveWatch {
            bindings,
            _dispatch: dispatch,
            _subscription: subscription,
        });
        Ok(())
    }

    /// Drop the current subscription, if any.
    pub fn stop(&mut self) {
        if self.is_watching() {
            debug!("stopping function watcher");
        }
        self.state = WatchState::Idle;
    }

    pub fn is_watching(&self) -> bool {
        matches!(self.state, WatchState::Watching(_))
    }

    /// Bindings of the current subscription; empty while idle.
    pub fn bindings(&self) -> &[WatchBinding] {
        match &self.state {
            WatchState::Watching(active) => active.bindings.as_slice(),
            WatchState::Idle => &[],
        }
    }
}

async fn dispatch_changes(
    mut events: mpsc::UnboundedReceiver<PathBuf>,
    bindings: Arc<Vec<WatchBinding>>,
    listener: mpsc::Sender<ChangeSet>,
) {
    while let Some(path) = events.recv().await {
        let functions = matching_functions(&bindings, &path);
        if functions.is_empty() {
            debug!(?path, "change matched no function");
            continue;
        }

        let ids: Vec<&str> = functions.iter().map(|f| f.id.as_str()).collect();
        debug!(?path, functions = ?ids, "change matched functions");

        if let Err(err) = listener.send(ChangeSet { path, functions }).await {
            warn!("change listener closed; dropping change for {:?}", err.0.path);
            return;
        }
    }
    debug!("watch subscription closed");
}
