//! Testability harness utilities.
//!
//! Mock collaborators for exercising the bridge client and the plugin
//! without a real host or audio device.

mod recording_bridge;

pub use recording_bridge::RecordingBridge;

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::audio::HapticFeedback;

/// Haptic driver that only counts pulses.
#[derive(Default)]
pub struct CountingHaptics {
    pulses: AtomicUsize,
}

impl CountingHaptics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pulses(&self) -> usize {
        self.pulses.load(Ordering::SeqCst)
    }
}

impl HapticFeedback for CountingHaptics {
    fn haptic(&self) {
        self.pulses.fetch_add(1, Ordering::SeqCst);
    }
}
