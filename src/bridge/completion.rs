//! Success/failure continuation pair handed to the native bridge.

use log::warn;
use tokio::sync::oneshot;

use super::types::NativeValue;
use crate::error::BridgeError;

pub type ResultCallback = Box<dyn FnOnce(NativeValue) + Send + 'static>;
pub type ErrorCallback = Box<dyn FnOnce(BridgeError) + Send + 'static>;

/// Owns the two continuations of one request.
///
/// `succeed` and `fail` consume the completion, so at most one continuation
/// ever runs. Dropping an unresolved completion reports a `NativeFailure`
/// instead of leaving the caller pending forever.
pub struct Completion {
    on_result: Option<ResultCallback>,
    on_error: Option<ErrorCallback>,
}

impl Completion {
    pub fn new<F, G>(on_result: F, on_error: G) -> Self
    where
        F: FnOnce(NativeValue) + Send + 'static,
        G: FnOnce(BridgeError) + Send + 'static,
    {
        Self {
            on_result: Some(Box::new(on_result)),
            on_error: Some(Box::new(on_error)),
        }
    }

    /// Completion that forwards the outcome into a oneshot channel.
    pub fn channel() -> (Self, oneshot::Receiver<Result<NativeValue, BridgeError>>) {
        let (tx, rx) = oneshot::channel();
        let err_tx = std::sync::Arc::new(std::sync::Mutex::new(Some(tx)));
        let ok_tx = std::sync::Arc::clone(&err_tx);

        let completion = Self::new(
            move |value| {
                if let Some(tx) = ok_tx.lock().ok().and_then(|mut guard| guard.take()) {
                    let _ = tx.send(Ok(value));
                }
            },
            move |err| {
                if let Some(tx) = err_tx.lock().ok().and_then(|mut guard| guard.take()) {
                    let _ = tx.send(Err(err));
                }
            },
        );
        (completion, rx)
    }

    pub fn succeed(mut self, value: NativeValue) {
        self.on_error = None;
        if let Some(on_result) = self.on_result.take() {
            on_result(value);
        }
    }

    pub fn fail(mut self, err: BridgeError) {
        self.on_result = None;
        if let Some(on_error) = self.on_error.take() {
            on_error(err);
        }
    }

    /// Deliver a plugin outcome to whichever continuation matches it.
    pub fn resolve(self, outcome: Result<NativeValue, BridgeError>) {
        match outcome {
            Ok(value) => self.succeed(value),
            Err(err) => self.fail(err),
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if let Some(on_error) = self.on_error.take() {
            self.on_result = None;
            warn!("[Completion] Request dropped without completion");
            on_error(BridgeError::native("request dropped without completion"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting() -> (Completion, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let ok = Arc::new(AtomicUsize::new(0));
        let err = Arc::new(AtomicUsize::new(0));
        let (ok_c, err_c) = (Arc::clone(&ok), Arc::clone(&err));
        let completion = Completion::new(
            move |_| {
                ok_c.fetch_add(1, Ordering::SeqCst);
            },
            move |_| {
                err_c.fetch_add(1, Ordering::SeqCst);
            },
        );
        (completion, ok, err)
    }

    #[test]
    fn test_succeed_runs_only_result() {
        let (completion, ok, err) = counting();
        completion.succeed(json!("OK"));
        assert_eq!(ok.load(Ordering::SeqCst), 1);
        assert_eq!(err.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_fail_runs_only_error() {
        let (completion, ok, err) = counting();
        completion.fail(BridgeError::native("nope"));
        assert_eq!(ok.load(Ordering::SeqCst), 0);
        assert_eq!(err.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_reports_failure_once() {
        let (completion, ok, err) = counting();
        drop(completion);
        assert_eq!(ok.load(Ordering::SeqCst), 0);
        assert_eq!(err.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_channel_delivers_outcome() {
        let (completion, mut rx) = Completion::channel();
        completion.succeed(json!(42));
        assert_eq!(rx.try_recv().unwrap(), Ok(json!(42)));

        let (completion, mut rx) = Completion::channel();
        drop(completion);
        assert!(matches!(
            rx.try_recv().unwrap(),
            Err(BridgeError::NativeFailure { .. })
        ));
    }
}
