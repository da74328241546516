//! SoundMetronome: control side of the metronome and tone player.
//!
//! Owns the measure/tempo state and forwards every change to the audio
//! thread as a `RenderCommand`. The output stream is opened lazily on the
//! first call that needs sound, so a plugin that only pulses haptics never
//! touches the audio device.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use rtrb::{Consumer, Producer};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::audio::measure::note_for_symbol;
use crate::audio::metronome::step_interval_ms;
use crate::audio::{
    command_queue, platform_haptics, retire_queue, HapticFeedback, Measure, OutputRenderer,
    RenderCommand, Steps, HAPTIC_MEASURE, STOP_MEASURE,
};
use crate::config::{AppConfig, AudioConfig, MetronomeConfig, ToneConfig};
use crate::engine::backend::{AudioBackend, SystemTimeSource, TimeSource};
#[cfg(not(target_os = "android"))]
use crate::engine::backend::CpalBackend;
#[cfg(target_os = "android")]
use crate::engine::backend::OboeBackend;
use crate::error::AudioError;

const EVENT_CHANNEL_CAPACITY: usize = 128;

/// The control surface the plugin drives.
pub trait Metronome: Send + Sync {
    /// Start or retarget playback. `"X"` stops, `"Z"` only pulses haptics.
    fn start(&self, bpm: f64, measure: &str) -> Result<(), AudioError>;
    fn stop(&self) -> Result<(), AudioError>;
    fn is_playing(&self) -> bool;
    fn play_single_note(&self, symbol: char) -> Result<(), AudioError>;
}

/// Lifecycle event emitted by the metronome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetronomeEvent {
    pub timestamp_ms: u64,
    pub kind: MetronomeEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetronomeEventKind {
    Started { bpm: f64, measure: String },
    PatternChanged { bpm: f64, measure: String },
    Stopped,
    ToneStarted,
    ToneStopped,
    Haptic,
}

#[derive(Default)]
struct MetronomeState {
    measure: Option<Measure>,
    bpm: f64,
    playing: bool,
    tone_playing: bool,
    commands: Option<Producer<RenderCommand>>,
    retired: Option<Consumer<Steps>>,
}

impl MetronomeState {
    fn send(&mut self, command: RenderCommand) -> Result<(), AudioError> {
        // Free step lists the audio thread has swapped out.
        if let Some(retired) = self.retired.as_mut() {
            while retired.pop().is_ok() {}
        }
        let producer = self.commands.as_mut().ok_or(AudioError::NotRunning)?;
        producer
            .push(command)
            .map_err(|_| AudioError::CommandQueueFull)
    }
}

/// Metronome engine backed by an `AudioBackend`.
pub struct SoundMetronome {
    backend: Arc<dyn AudioBackend>,
    haptics: Arc<dyn HapticFeedback>,
    audio: AudioConfig,
    metronome: MetronomeConfig,
    tone: ToneConfig,
    state: Mutex<MetronomeState>,
    events_tx: broadcast::Sender<MetronomeEvent>,
    time_source: Arc<dyn TimeSource>,
    start_instant: Instant,
}

impl SoundMetronome {
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        haptics: Arc<dyn HapticFeedback>,
        config: &AppConfig,
    ) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            backend,
            haptics,
            audio: config.audio.clone(),
            metronome: config.metronome.clone(),
            tone: config.tone.clone(),
            state: Mutex::new(MetronomeState::default()),
            events_tx,
            time_source: Arc::new(SystemTimeSource::default()),
            start_instant: Instant::now(),
        }
    }

    /// Engine on the compile target's audio device and haptic motor.
    pub fn for_platform(config: &AppConfig) -> Self {
        Self::new(Self::create_backend(config), platform_haptics(), config)
    }

    #[cfg(target_os = "android")]
    fn create_backend(config: &AppConfig) -> Arc<dyn AudioBackend> {
        Arc::new(OboeBackend::new(config.audio.sample_rate))
    }

    #[cfg(not(target_os = "android"))]
    fn create_backend(_config: &AppConfig) -> Arc<dyn AudioBackend> {
        Arc::new(CpalBackend::new())
    }

    /// Replace the clock used for event timestamps.
    pub fn with_time_source(mut self, time_source: Arc<dyn TimeSource>) -> Self {
        self.start_instant = time_source.now();
        self.time_source = time_source;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MetronomeEvent> {
        self.events_tx.subscribe()
    }

    pub fn current_measure(&self) -> Option<String> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.measure.as_ref().map(|m| m.symbols().to_string()))
    }

    pub fn bpm(&self) -> f64 {
        self.state.lock().map(|state| state.bpm).unwrap_or(0.0)
    }

    pub fn is_tone_playing(&self) -> bool {
        self.state
            .lock()
            .map(|state| state.tone_playing)
            .unwrap_or(false)
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, MetronomeState>, AudioError> {
        self.state.lock().map_err(|_| AudioError::LockPoisoned {
            component: "metronome_state".to_string(),
        })
    }

    fn emit_event(&self, kind: MetronomeEventKind) {
        let timestamp_ms = self
            .time_source
            .now()
            .saturating_duration_since(self.start_instant)
            .as_millis() as u64;
        let _ = self.events_tx.send(MetronomeEvent { timestamp_ms, kind });
    }

    /// Open the output stream if it is not already running.
    fn ensure_output(&self, state: &mut MetronomeState) -> Result<(), AudioError> {
        if state.commands.is_some() && self.backend.is_running() {
            return Ok(());
        }

        let (producer, consumer) = command_queue(self.audio.command_queue_capacity);
        let (retire_tx, retire_rx) = retire_queue(self.audio.command_queue_capacity);
        let renderer = OutputRenderer::new(
            consumer,
            self.metronome.clone(),
            self.tone.clone(),
            self.audio.sample_rate,
        )
        .with_retire_queue(retire_tx);
        self.backend.start(renderer)?;

        // A fresh renderer knows nothing about earlier playback.
        state.playing = false;
        state.tone_playing = false;
        state.commands = Some(producer);
        state.retired = Some(retire_rx);
        log::info!("[SoundMetronome] Output opened");
        Ok(())
    }

    /// Install a parsed measure. Shared by symbol and numeric patterns.
    pub fn start_measure(&self, bpm: f64, measure: Measure) -> Result<(), AudioError> {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(AudioError::SpeedInvalid { speed: bpm });
        }

        let kind = {
            let mut state = self.lock_state()?;
            self.ensure_output(&mut state)?;

            let was_playing = state.playing;
            let keep_position = was_playing
                && state
                    .measure
                    .as_ref()
                    .map_or(false, |current| current.symbols() == measure.symbols());

            state.send(RenderCommand::SetMeasure {
                steps: measure.steps().to_vec(),
                bpm,
                keep_position,
            })?;

            log::debug!(
                "[SoundMetronome] '{}' at {} BPM, {:.1} ms per step (keep position: {})",
                measure.symbols(),
                bpm,
                step_interval_ms(bpm, measure.len()),
                keep_position
            );

            let symbols = measure.symbols().to_string();
            state.measure = Some(measure);
            state.bpm = bpm;
            state.playing = true;

            if was_playing {
                MetronomeEventKind::PatternChanged {
                    bpm,
                    measure: symbols,
                }
            } else {
                MetronomeEventKind::Started {
                    bpm,
                    measure: symbols,
                }
            }
        };

        self.emit_event(kind);
        self.haptic();
        Ok(())
    }

    pub fn play_tone(&self) -> Result<(), AudioError> {
        {
            let mut state = self.lock_state()?;
            self.ensure_output(&mut state)?;
            if state.tone_playing {
                return Ok(());
            }
            state.send(RenderCommand::PlayTone)?;
            state.tone_playing = true;
        }
        log::info!("[SoundMetronome] Tone started");
        self.emit_event(MetronomeEventKind::ToneStarted);
        Ok(())
    }

    pub fn stop_tone(&self) -> Result<(), AudioError> {
        {
            let mut state = self.lock_state()?;
            if !state.tone_playing {
                return Ok(());
            }
            state.send(RenderCommand::StopTone)?;
            state.tone_playing = false;
        }
        log::info!("[SoundMetronome] Tone stopped");
        self.emit_event(MetronomeEventKind::ToneStopped);
        Ok(())
    }

    /// Stop everything and close the output stream.
    pub fn shutdown(&self) -> Result<(), AudioError> {
        let mut state = self.lock_state()?;
        let was_playing = state.playing;
        state.playing = false;
        state.tone_playing = false;
        state.commands = None;
        state.retired = None;
        if self.backend.is_running() {
            self.backend.stop()?;
        }
        drop(state);

        if was_playing {
            self.emit_event(MetronomeEventKind::Stopped);
        }
        log::info!("[SoundMetronome] Shut down");
        Ok(())
    }
}

impl Metronome for SoundMetronome {
    fn start(&self, bpm: f64, measure: &str) -> Result<(), AudioError> {
        if measure.is_empty() {
            return Err(AudioError::EmptyMeasure);
        }
        if measure == STOP_MEASURE {
            return self.stop();
        }
        if measure == HAPTIC_MEASURE {
            self.haptic();
            return Ok(());
        }

        let measure = Measure::parse(measure)?;
        self.start_measure(bpm, measure)
    }

    fn stop(&self) -> Result<(), AudioError> {
        {
            let mut state = self.lock_state()?;
            if !state.playing {
                return Ok(());
            }
            state.send(RenderCommand::Stop)?;
            state.playing = false;
        }
        log::info!("[SoundMetronome] Stopped");
        self.emit_event(MetronomeEventKind::Stopped);
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.state.lock().map(|state| state.playing).unwrap_or(false)
    }

    fn play_single_note(&self, symbol: char) -> Result<(), AudioError> {
        let note = note_for_symbol(symbol).ok_or_else(|| AudioError::MeasureUnplayable {
            measure: symbol.to_string(),
        })?;
        let mut state = self.lock_state()?;
        self.ensure_output(&mut state)?;
        state.send(RenderCommand::PlayNote(note))
    }
}

impl HapticFeedback for SoundMetronome {
    fn haptic(&self) {
        self.haptics.haptic();
        self.emit_event(MetronomeEventKind::Haptic);
    }
}
