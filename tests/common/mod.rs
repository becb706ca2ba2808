#![allow(dead_code)]

use std::time::Duration;

pub use localfn_test_utils::{init_tracing, with_timeout};

/// Assert that nothing arrives on `rx` within a short window.
pub async fn assert_silent<T: std::fmt::Debug>(rx: &mut tokio::sync::mpsc::Receiver<T>) {
    if let Ok(Some(item)) = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await {
        panic!("expected no message, got {item:?}");
    }
}
