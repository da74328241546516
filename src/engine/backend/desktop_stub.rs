use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::audio::OutputRenderer;
use crate::error::AudioError;

use super::{AudioBackend, TimeSource};

/// Offline backend used for deterministic testing and WAV rendering.
///
/// No device is opened. The renderer is parked until `render` pulls frames
/// from it synchronously.
pub struct DesktopStubBackend {
    sample_rate: u32,
    renderer: Mutex<Option<OutputRenderer>>,
}

impl DesktopStubBackend {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            renderer: Mutex::new(None),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn lock_renderer(&self) -> Result<MutexGuard<'_, Option<OutputRenderer>>, AudioError> {
        self.renderer.lock().map_err(|_| AudioError::LockPoisoned {
            component: "stub_renderer".to_string(),
        })
    }

    /// Pull the next `frames` mono samples from the running renderer.
    pub fn render(&self, frames: usize) -> Result<Vec<f32>, AudioError> {
        let mut guard = self.lock_renderer()?;
        let renderer = guard.as_mut().ok_or(AudioError::NotRunning)?;
        let mut block = vec![0.0f32; frames];
        renderer.render(&mut block);
        Ok(block)
    }
}

impl Default for DesktopStubBackend {
    fn default() -> Self {
        Self::new(48_000)
    }
}

impl AudioBackend for DesktopStubBackend {
    fn start(&self, mut renderer: OutputRenderer) -> Result<(), AudioError> {
        let mut guard = self.lock_renderer()?;
        if guard.is_some() {
            return Err(AudioError::StreamOpenFailed {
                reason: "stub stream already open".to_string(),
            });
        }
        renderer.prepare(self.sample_rate);
        *guard = Some(renderer);
        Ok(())
    }

    fn stop(&self) -> Result<(), AudioError> {
        let mut guard = self.lock_renderer()?;
        if guard.take().is_none() {
            return Err(AudioError::NotRunning);
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.renderer
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }
}

/// Deterministic time source for desktop runs.
///
/// Each call to `now()` advances by a fixed 10ms to guarantee monotonic
/// timestamps even when no real audio stream is active.
pub struct StubTimeSource {
    start: Instant,
    offset_ms: AtomicU64,
}

impl StubTimeSource {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset_ms: AtomicU64::new(0),
        }
    }
}

impl Default for StubTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for StubTimeSource {
    fn now(&self) -> Instant {
        let ms = self.offset_ms.fetch_add(10, Ordering::SeqCst);
        self.start + Duration::from_millis(ms)
    }
}
