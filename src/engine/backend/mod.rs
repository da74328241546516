//! Backend abstractions for the metronome engine.

use std::time::Instant;

use crate::audio::OutputRenderer;
use crate::error::AudioError;

/// Trait implemented by platform-specific audio output backends.
///
/// A backend takes ownership of the renderer, calls
/// `OutputRenderer::prepare` with its actual sample rate, and drives
/// `OutputRenderer::render` from its audio callback until stopped.
pub trait AudioBackend: Send + Sync {
    fn start(&self, renderer: OutputRenderer) -> Result<(), AudioError>;
    fn stop(&self) -> Result<(), AudioError>;
    fn is_running(&self) -> bool;
}

/// Trait representing a monotonic time source used for event timestamps.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Instant;
}

/// Default time source backed by `Instant::now`.
#[derive(Default)]
pub struct SystemTimeSource {
    _unit: (),
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[cfg(target_os = "android")]
mod oboe;
#[cfg(target_os = "android")]
pub use self::oboe::OboeBackend;

#[cfg(not(target_os = "android"))]
mod cpal;
#[cfg(not(target_os = "android"))]
pub use self::cpal::CpalBackend;

mod desktop_stub;
pub use desktop_stub::{DesktopStubBackend, StubTimeSource};
