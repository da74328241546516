//! Output renderer - real-time metronome and tone synthesis
//!
//! The renderer lives inside the backend's audio callback. The control
//! thread talks to it only through an rtrb SPSC queue of `RenderCommand`s,
//! drained at the start of every callback.
//!
//! # Real-Time Safety
//! `render` does not allocate, lock or block. Voices and the tone buffer
//! are generated in `prepare`, before the stream starts. A replaced pattern
//! is handed back over the retire queue so the control thread frees it.
//!
//! # Architecture
//! ```text
//! SoundMetronome (control thread)
//!   └─> Producer<RenderCommand> ──rtrb──> OutputRenderer::render() [audio thread]
//!                                           ├─> step countdown -> trigger note
//!                                           └─> mix woodblock voice + tone
//! ```

use rtrb::{Consumer, Producer, RingBuffer};

use super::measure::{MetronomeNote, Voice};
use super::metronome::{generate_woodblock_sample, samples_per_step};
use super::tone::Tone;
use crate::config::{MetronomeConfig, ToneConfig};

/// Commands sent from the control thread to the audio callback.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    /// Install a measure and tempo. Starts playback if stopped.
    SetMeasure {
        steps: Vec<Option<MetronomeNote>>,
        bpm: f64,
        keep_position: bool,
    },
    /// Stop stepping; a ringing note is left to decay.
    Stop,
    /// Sound one note immediately without touching the measure.
    PlayNote(MetronomeNote),
    PlayTone,
    StopTone,
}

/// Step list installed by `SetMeasure`.
pub type Steps = Vec<Option<MetronomeNote>>;

/// Create the control -> audio command queue.
pub fn command_queue(capacity: usize) -> (Producer<RenderCommand>, Consumer<RenderCommand>) {
    RingBuffer::new(capacity.max(1))
}

/// Create the audio -> control queue carrying replaced step lists.
///
/// Give it the command queue's capacity: each `SetMeasure` retires at most
/// one list, so it cannot fill while the control side keeps draining it.
pub fn retire_queue(capacity: usize) -> (Producer<Steps>, Consumer<Steps>) {
    RingBuffer::new(capacity.max(1))
}

#[derive(Debug, Clone, Copy)]
struct ActiveNote {
    voice: Voice,
    position: usize,
    gain: f32,
}

/// Mono output renderer driven by the audio callback.
pub struct OutputRenderer {
    commands: Consumer<RenderCommand>,
    retired: Option<Producer<Steps>>,
    metronome: MetronomeConfig,
    tone_config: ToneConfig,
    sample_rate: u32,
    voices: [Vec<f32>; 3],
    tone: Tone,

    pattern: Steps,
    bpm: f64,
    playing: bool,
    beat_count: usize,
    samples_per_step: u64,
    countdown: u64,
    active_note: Option<ActiveNote>,

    tone_active: bool,
    tone_position: usize,

    frames_rendered: u64,
}

impl OutputRenderer {
    pub fn new(
        commands: Consumer<RenderCommand>,
        metronome: MetronomeConfig,
        tone_config: ToneConfig,
        sample_rate: u32,
    ) -> Self {
        let voices = Self::build_voices(&metronome, sample_rate);
        let tone = Tone::from_config(&tone_config, sample_rate);
        Self {
            commands,
            retired: None,
            metronome,
            tone_config,
            sample_rate,
            voices,
            tone,
            pattern: Vec::new(),
            bpm: 0.0,
            playing: false,
            beat_count: 0,
            samples_per_step: 1,
            countdown: 0,
            active_note: None,
            tone_active: false,
            tone_position: 0,
            frames_rendered: 0,
        }
    }

    /// Send replaced step lists to `retired` instead of dropping them here.
    pub fn with_retire_queue(mut self, retired: Producer<Steps>) -> Self {
        self.retired = Some(retired);
        self
    }

    fn build_voices(config: &MetronomeConfig, sample_rate: u32) -> [Vec<f32>; 3] {
        Voice::ALL.map(|voice| {
            generate_woodblock_sample(voice, sample_rate, config.click_duration_ms)
        })
    }

    /// Re-render voices and tone for the device rate. Call before streaming.
    pub fn prepare(&mut self, sample_rate: u32) {
        if sample_rate == self.sample_rate {
            return;
        }
        log::info!(
            "[OutputRenderer] Preparing voices at {} Hz (was {} Hz)",
            sample_rate,
            self.sample_rate
        );
        self.sample_rate = sample_rate;
        self.voices = Self::build_voices(&self.metronome, sample_rate);
        self.tone = Tone::from_config(&self.tone_config, sample_rate);
        self.tone_position = 0;
        if !self.pattern.is_empty() {
            self.samples_per_step = samples_per_step(self.bpm, self.pattern.len(), sample_rate);
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_tone_active(&self) -> bool {
        self.tone_active
    }

    pub fn beat_count(&self) -> usize {
        self.beat_count
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Fill `out` with the next block of mono samples.
    pub fn render(&mut self, out: &mut [f32]) {
        // Real-time audio callback - NO ALLOCATIONS, LOCKS, OR BLOCKING!
        self.drain_commands();

        for sample in out.iter_mut() {
            if self.playing {
                if self.countdown == 0 {
                    self.trigger_step();
                    self.countdown = self.samples_per_step;
                }
                self.countdown -= 1;
            }

            let mut mix = 0.0f32;

            if let Some(note) = self.active_note.as_mut() {
                let voice = &self.voices[note.voice.index()];
                if note.position < voice.len() {
                    mix += voice[note.position] * note.gain;
                    note.position += 1;
                } else {
                    self.active_note = None;
                }
            }

            if self.tone_active {
                match self.tone.next_sample(&mut self.tone_position) {
                    Some(value) => mix += value * self.tone_config.gain,
                    None => self.tone_active = false,
                }
            }

            *sample = mix.clamp(-1.0, 1.0);
        }

        self.frames_rendered += out.len() as u64;
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.commands.pop() {
            self.apply(command);
        }
    }

    fn apply(&mut self, command: RenderCommand) {
        match command {
            RenderCommand::SetMeasure {
                steps,
                bpm,
                keep_position,
            } => {
                let len = steps.len().max(1);
                let previous = std::mem::replace(&mut self.pattern, steps);
                self.retire(previous);
                self.bpm = bpm;
                self.samples_per_step = samples_per_step(bpm, len, self.sample_rate);

                if self.playing {
                    self.beat_count = if keep_position {
                        self.beat_count % len
                    } else {
                        0
                    };
                    self.countdown = self.countdown.min(self.samples_per_step);
                } else {
                    self.beat_count = 0;
                    self.countdown = 0;
                    self.playing = true;
                }
            }
            RenderCommand::Stop => {
                self.playing = false;
            }
            RenderCommand::PlayNote(note) => self.start_note(note),
            RenderCommand::PlayTone => {
                if !self.tone_active {
                    self.tone_active = true;
                    self.tone_position = 0;
                }
            }
            RenderCommand::StopTone => {
                self.tone_active = false;
            }
        }
    }

    fn retire(&mut self, steps: Steps) {
        if steps.capacity() == 0 {
            return;
        }
        if let Some(retired) = self.retired.as_mut() {
            // A full queue hands the list back; it is then freed here.
            let _ = retired.push(steps);
        }
    }

    /// Play the next known step, skipping unknown symbols within this tick.
    fn trigger_step(&mut self) {
        let len = self.pattern.len();
        for _ in 0..len {
            let index = self.beat_count % len;
            self.beat_count += 1;
            if let Some(note) = self.pattern[index] {
                self.start_note(note);
                return;
            }
        }
    }

    /// One voice at a time: a new note cuts the previous one.
    fn start_note(&mut self, note: MetronomeNote) {
        let gain = note.volume * self.metronome.gain;
        self.active_note = if gain > 0.0 {
            Some(ActiveNote {
                voice: note.voice,
                position: 0,
                gain,
            })
        } else {
            None
        };
    }
}
