//! Platform identity and capability gating.
//!
//! The platform is resolved once and passed into `BridgeClient` explicitly,
//! so tests can exercise every platform from one process.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::AudioError;

/// Runtime platform reported by the host environment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlatformId {
    Android,
    Ios,
    Other(String),
}

impl PlatformId {
    pub fn as_str(&self) -> &str {
        match self {
            PlatformId::Android => "android",
            PlatformId::Ios => "ios",
            PlatformId::Other(id) => id,
        }
    }
}

impl From<&str> for PlatformId {
    fn from(id: &str) -> Self {
        match id.trim().to_ascii_lowercase().as_str() {
            "android" => PlatformId::Android,
            "ios" => PlatformId::Ios,
            other => PlatformId::Other(other.to_string()),
        }
    }
}

impl From<String> for PlatformId {
    fn from(id: String) -> Self {
        PlatformId::from(id.as_str())
    }
}

impl From<PlatformId> for String {
    fn from(id: PlatformId) -> Self {
        id.as_str().to_string()
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Native features an action may depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Continuous tone output (`playTone` / `stopTone`)
    Tone,
    /// Haptic pulse (`setHaptic`)
    Haptics,
}

/// Read-only platform information injected into the bridge client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformInfo {
    platform_id: PlatformId,
}

impl PlatformInfo {
    pub fn new(platform_id: impl Into<PlatformId>) -> Self {
        Self {
            platform_id: platform_id.into(),
        }
    }

    /// Resolve the platform from the compile target.
    pub fn detect() -> Self {
        cfg_if::cfg_if! {
            if #[cfg(target_os = "android")] {
                Self::new(PlatformId::Android)
            } else if #[cfg(target_os = "ios")] {
                Self::new(PlatformId::Ios)
            } else {
                Self::new(std::env::consts::OS)
            }
        }
    }

    pub fn platform_id(&self) -> &PlatformId {
        &self.platform_id
    }

    /// Tone output is only implemented natively on Android.
    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Tone => self.platform_id == PlatformId::Android,
            Capability::Haptics => true,
        }
    }
}

/// Set once the host has handed its application context to ndk_context.
static APP_CONTEXT_READY: AtomicBool = AtomicBool::new(false);

/// Record that the application context is initialized. Android `nativeInit`
/// calls this after `ndk_context::initialize_android_context`.
pub fn mark_app_context_ready() {
    APP_CONTEXT_READY.store(true, Ordering::Release);
}

pub fn app_context_ready() -> bool {
    APP_CONTEXT_READY.load(Ordering::Acquire)
}

/// Fail instead of reaching `ndk_context::android_context`, which panics
/// before initialization.
pub fn require_app_context() -> Result<(), AudioError> {
    if app_context_ready() {
        Ok(())
    } else {
        Err(AudioError::ContextUnavailable)
    }
}
