// src/watch/mod.rs

//! File watching and change-to-function matching.
//!
//! This module is responsible for:
//! - Compiling each function's include globs into a [`WatchBinding`].
//! - Opening one filesystem subscription for the union of those globs
//!   ([`source`]), with ignore patterns and write-stability debouncing.
//! - Turning each stable change into the set of functions it affects
//!   ([`FunctionWatcher`]).
//!
//! It does not build or restart anything; it only reports which functions
//! changed.

pub mod debounce;
pub mod patterns;
pub mod source;
pub mod watcher;

pub use patterns::{compile_bindings, include_union, matching_functions, WatchBinding};
pub use source::{
    DebounceConfig, NotifyWatchSource, Subscription, WatchRequest, WatchRoot, WatchSource,
};
pub use watcher::{file_request, ChangeSet, FunctionWatcher, WatchOptions};
