use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::Value;

use crate::bridge::{ActionRequest, Completion, NativeBridge, PluginStatus};
use crate::error::BridgeError;

/// Mock native bridge that records every request and holds its completion
/// until the test resolves it.
///
/// Pending completions are resolved in submission order.
#[derive(Default)]
pub struct RecordingBridge {
    requests: Mutex<Vec<ActionRequest>>,
    pending: Mutex<VecDeque<Completion>>,
}

impl RecordingBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request seen so far, in order.
    pub fn requests(&self) -> Vec<ActionRequest> {
        self.requests
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn pending(&self) -> usize {
        self.pending.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    /// Complete the oldest pending request successfully.
    ///
    /// Returns `false` when nothing is pending.
    pub fn resolve_next(&self, value: Value) -> bool {
        match self.take_next() {
            Some(completion) => {
                completion.succeed(value);
                true
            }
            None => false,
        }
    }

    /// Fail the oldest pending request with a native failure.
    pub fn reject_next(&self, status: PluginStatus, payload: Value) -> bool {
        match self.take_next() {
            Some(completion) => {
                completion.fail(BridgeError::NativeFailure { status, payload });
                true
            }
            None => false,
        }
    }

    fn take_next(&self) -> Option<Completion> {
        // Release the lock before running continuations.
        let next = self.pending.lock().ok()?.pop_front();
        next
    }
}

impl NativeBridge for RecordingBridge {
    fn invoke(&self, request: ActionRequest, completion: Completion) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        if let Ok(mut pending) = self.pending.lock() {
            pending.push_back(completion);
        }
    }
}
