//! The `Echo` plugin: maps bridge actions onto the metronome engine.

use std::sync::Arc;

use serde_json::Value;

use super::{Plugin, PluginResult};
use crate::audio::{HapticFeedback, Measure};
use crate::bridge::Action;
use crate::config::AppConfig;
use crate::engine::{Metronome, SoundMetronome};
use crate::error::{log_audio_error, AudioError, ErrorCode};

pub struct EchoPlugin {
    metronome: Arc<SoundMetronome>,
}

impl EchoPlugin {
    pub fn new(metronome: Arc<SoundMetronome>) -> Self {
        Self { metronome }
    }

    /// Plugin wired to the compile target's audio device.
    pub fn for_platform(config: &AppConfig) -> Self {
        Self::new(Arc::new(SoundMetronome::for_platform(config)))
    }

    pub fn metronome(&self) -> &Arc<SoundMetronome> {
        &self.metronome
    }

    fn set_beat_speed(&self, args: &[Value]) -> PluginResult {
        let speed = match args.first().and_then(Value::as_f64) {
            Some(speed) => speed,
            None => return PluginResult::json_exception("speed must be a number"),
        };

        let outcome = match args.get(1) {
            Some(Value::String(symbols)) => self.metronome.start(speed, symbols),
            Some(pattern @ Value::Array(_)) => {
                Measure::from_value(pattern).and_then(|m| self.metronome.start_measure(speed, m))
            }
            _ => return PluginResult::json_exception("measure must be a string or an array"),
        };

        Self::report(outcome, "setBeatSpeed")
    }

    fn report(outcome: Result<(), AudioError>, context: &str) -> PluginResult {
        match outcome {
            Ok(()) => PluginResult::ok(),
            Err(err) => {
                log_audio_error(&err, context);
                PluginResult::error(err.message())
            }
        }
    }
}

impl Plugin for EchoPlugin {
    fn execute(&self, action: &str, args: &[Value]) -> PluginResult {
        let action = match action.parse::<Action>() {
            Ok(action) => action,
            Err(_) => {
                log::warn!("[EchoPlugin] Unknown action '{}'", action);
                return PluginResult::invalid_action(action);
            }
        };
        log::debug!("[EchoPlugin] {} {:?}", action, args);

        match action {
            Action::SetBeatSpeed => self.set_beat_speed(args),
            Action::StopBeatSpeed => Self::report(self.metronome.stop(), "stopBeatSpeed"),
            Action::PlayTone => Self::report(self.metronome.play_tone(), "playTone"),
            Action::StopTone => Self::report(self.metronome.stop_tone(), "stopTone"),
            Action::SetHaptic => {
                self.metronome.haptic();
                PluginResult::ok()
            }
        }
    }
}
