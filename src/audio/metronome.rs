//! Metronome - Sample-accurate step timing and woodblock voices
//!
//! This module provides deterministic metronome sound generation:
//! - Step interval arithmetic: one beat divided by the measure length
//! - Three synthesized woodblock voices (high/mid/low)
//! - Pure functions (no side effects, deterministic output)

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::measure::Voice;

/// Exponential decay rate of the woodblock envelope (1/s)
const WOODBLOCK_DECAY: f32 = 180.0;

/// Length of the noise transient at the head of each voice in milliseconds
const ATTACK_NOISE_MS: f32 = 2.0;

/// Fundamental frequency of each woodblock voice in Hz.
pub fn voice_frequency(voice: Voice) -> f32 {
    match voice {
        Voice::High => 2_000.0,
        Voice::Mid => 1_400.0,
        Voice::Low => 900.0,
    }
}

/// Generates a woodblock sample for one voice.
///
/// A decaying sine at the voice frequency with a short white-noise transient
/// for the strike. Noise uses a fixed seed so output is identical across
/// calls.
///
/// # Arguments
/// * `voice` - Which woodblock to synthesize
/// * `sample_rate` - Sample rate in Hz
/// * `duration_ms` - Length of the sample in milliseconds
///
/// # Returns
/// A `Vec<f32>` of `sample_rate * duration_ms / 1000` samples in [-1.0, 1.0]
pub fn generate_woodblock_sample(voice: Voice, sample_rate: u32, duration_ms: f32) -> Vec<f32> {
    let num_samples = (sample_rate as f32 * duration_ms / 1000.0) as usize;
    let attack_samples = (sample_rate as f32 * ATTACK_NOISE_MS / 1000.0) as usize;
    let frequency = voice_frequency(voice);

    let mut rng = StdRng::seed_from_u64(42 + voice.index() as u64);

    let mut samples = Vec::with_capacity(num_samples);
    for i in 0..num_samples {
        let t = i as f32 / sample_rate as f32;
        let envelope = (-t * WOODBLOCK_DECAY).exp();
        let tone = (t * frequency * std::f32::consts::TAU).sin();
        let noise = if i < attack_samples {
            rng.gen_range(-1.0..1.0) * (1.0 - i as f32 / attack_samples as f32)
        } else {
            0.0
        };
        samples.push(((0.8 * tone + 0.2 * noise) * envelope).clamp(-1.0, 1.0));
    }

    samples
}

/// Converts tempo and measure length to samples per step.
///
/// Formula: samples_per_step = round((sample_rate × 60) / (bpm × steps)),
/// never less than one sample.
///
/// # Examples
/// ```
/// use echo_metronome::audio::metronome::samples_per_step;
/// assert_eq!(samples_per_step(120.0, 4, 96000), 12000);
/// ```
#[inline]
pub fn samples_per_step(bpm: f64, steps: usize, sample_rate: u32) -> u64 {
    let steps = steps.max(1) as f64;
    let samples = (sample_rate as f64 * 60.0) / (bpm * steps);
    if samples.is_finite() {
        (samples.round() as u64).max(1)
    } else {
        1
    }
}

/// Wall-clock step interval in milliseconds. Only used for logging.
#[inline]
pub fn step_interval_ms(bpm: f64, steps: usize) -> f64 {
    60_000.0 / bpm / steps.max(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_woodblock_sample_duration() {
        for &sr in &[44_100, 48_000, 96_000] {
            for voice in Voice::ALL {
                let sample = generate_woodblock_sample(voice, sr, 30.0);
                assert_eq!(sample.len(), (sr as f32 * 30.0 / 1000.0) as usize);
            }
        }
    }

    #[test]
    fn test_woodblock_sample_range() {
        let sample = generate_woodblock_sample(Voice::High, 48_000, 30.0);
        assert!(sample.iter().all(|s| (-1.0..=1.0).contains(s)));
        assert!(sample.iter().any(|s| s.abs() > 0.1), "voice should be audible");
    }

    #[test]
    fn test_woodblock_sample_deterministic() {
        let a = generate_woodblock_sample(Voice::Mid, 48_000, 30.0);
        let b = generate_woodblock_sample(Voice::Mid, 48_000, 30.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_woodblock_decays() {
        let sample = generate_woodblock_sample(Voice::Low, 48_000, 30.0);
        let head = sample[..480].iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        let tail = sample[sample.len() - 480..]
            .iter()
            .fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!(tail < head * 0.1, "head {} tail {}", head, tail);
    }

    #[test]
    fn test_samples_per_step_formula() {
        // 120 BPM, 4 steps, 96kHz: 96000 * 60 / 480 = 12000
        assert_eq!(samples_per_step(120.0, 4, 96_000), 12_000);
        // 60 BPM, 1 step, 48kHz: one beat per second
        assert_eq!(samples_per_step(60.0, 1, 48_000), 48_000);
        // 100 BPM, 3 steps, 44.1kHz: 26460 / 3 = 8820
        assert_eq!(samples_per_step(100.0, 3, 44_100), 8_820);
        // fractional tempo rounds to the nearest sample
        assert_eq!(samples_per_step(140.0, 1, 48_000), 20_571);
    }

    #[test]
    fn test_samples_per_step_never_zero() {
        assert_eq!(samples_per_step(1.0e9, 8, 8_000), 1);
        assert_eq!(samples_per_step(120.0, 0, 48_000), 24_000);
    }

    #[test]
    fn test_step_interval_ms() {
        assert_eq!(step_interval_ms(120.0, 4), 125.0);
        assert_eq!(step_interval_ms(60.0, 1), 1000.0);
    }
}
