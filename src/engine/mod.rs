//! Engine module housing the metronome core.
//!
//! `backend` abstracts the audio output device; `core` holds the
//! `SoundMetronome` control layer that the plugin drives.

pub mod backend;
pub mod core;

#[cfg(not(target_os = "android"))]
pub use backend::CpalBackend;
#[cfg(target_os = "android")]
pub use backend::OboeBackend;
pub use backend::{AudioBackend, DesktopStubBackend, StubTimeSource, SystemTimeSource, TimeSource};
pub use core::{Metronome, MetronomeEvent, MetronomeEventKind, SoundMetronome};
