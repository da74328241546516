//! Configuration management for the native plugin side
//!
//! This module provides runtime configuration loading from JSON files, so
//! output rate, voice length and tone settings can be tuned without
//! recompilation.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub metronome: MetronomeConfig,
    #[serde(default)]
    pub tone: ToneConfig,
    #[serde(default)]
    pub host: HostConfig,
}

/// Audio output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Output sample rate in Hz requested from the backend
    pub sample_rate: u32,
    /// Capacity of the control -> audio thread command queue
    pub command_queue_capacity: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 96_000,
            command_queue_capacity: 64,
        }
    }
}

/// Metronome voice configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetronomeConfig {
    /// Length of each woodblock voice in milliseconds
    pub click_duration_ms: f32,
    /// Master gain applied to metronome notes
    pub gain: f32,
}

impl Default for MetronomeConfig {
    fn default() -> Self {
        Self {
            click_duration_ms: 30.0,
            gain: 0.9,
        }
    }
}

/// Continuous tone configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneConfig {
    pub frequency_hz: f64,
    pub duration_ms: u32,
    pub looping: bool,
    pub gain: f32,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 440.0,
            duration_ms: 1000,
            looping: true,
            gain: 0.5,
        }
    }
}

/// In-process plugin host configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Name of the worker thread executing plugin actions
    pub thread_name: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            thread_name: "echo-plugin-host".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// Falls back to defaults (with a warning) when the file is missing or
    /// the JSON is invalid.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Android builds ship without a writable config location.
    #[cfg(target_os = "android")]
    pub fn load() -> Self {
        log::info!("[Config] Using default configuration on Android");
        Self::default()
    }

    /// Load configuration for non-Android platforms
    #[cfg(not(target_os = "android"))]
    pub fn load() -> Self {
        Self::load_from_file("assets/echo_config.json")
    }
}
