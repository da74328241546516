//! Tone generator - continuous sine tone for tuning reference
//!
//! Tones are rendered once into a 16-bit PCM buffer at the output sample
//! rate. Looping tones repeat over the longest prefix holding a whole number
//! of periods, so the loop seam stays phase-continuous.

use crate::config::ToneConfig;

/// Pre-rendered 16-bit mono tone.
#[derive(Debug, Clone, PartialEq)]
pub struct Tone {
    samples: Vec<i16>,
    sample_rate: u32,
    frequency: f64,
    looping: bool,
    loop_end: usize,
}

/// Render a sine tone.
///
/// # Arguments
/// * `frequency` - Tone frequency in Hz
/// * `duration_ms` - Buffer length in milliseconds
/// * `looping` - Whether playback repeats until stopped
/// * `sample_rate` - Output sample rate in Hz
///
/// The buffer holds `sample_rate * duration_ms / 1000` samples, rounded down
/// to an even count.
pub fn generate_tone(frequency: f64, duration_ms: u32, looping: bool, sample_rate: u32) -> Tone {
    let count = ((sample_rate as f64 * (duration_ms as f64 / 1000.0)) as usize) & !1;
    let period = sample_rate as f64 / frequency;

    let samples: Vec<i16> = (0..count)
        .map(|i| {
            let phase = 2.0 * std::f64::consts::PI * i as f64 / period;
            (phase.sin() * i16::MAX as f64) as i16
        })
        .collect();

    let whole_periods = (count as f64 / period).floor();
    let loop_end = if whole_periods >= 1.0 {
        ((whole_periods * period).round() as usize).min(count)
    } else {
        count
    };

    Tone {
        samples,
        sample_rate,
        frequency,
        looping,
        loop_end,
    }
}

impl Tone {
    pub fn from_config(config: &ToneConfig, sample_rate: u32) -> Self {
        generate_tone(
            config.frequency_hz,
            config.duration_ms,
            config.looping,
            sample_rate,
        )
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// End (exclusive) of the loop region.
    pub fn loop_end(&self) -> usize {
        self.loop_end
    }

    /// Read the sample at `position` as f32 and advance it.
    ///
    /// Returns `None` once a one-shot tone is exhausted.
    #[inline]
    pub fn next_sample(&self, position: &mut usize) -> Option<f32> {
        if self.looping && *position >= self.loop_end {
            *position = 0;
        }
        let sample = *self.samples.get(*position)?;
        *position += 1;
        Some(sample as f32 / i16::MAX as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_length_is_even() {
        let tone = generate_tone(440.0, 1000, false, 96_000);
        assert_eq!(tone.samples().len(), 96_000);

        let tone = generate_tone(440.0, 15, false, 44_100);
        // 661.5 samples -> 661 -> 660
        assert_eq!(tone.samples().len(), 660);
    }

    #[test]
    fn test_tone_peak_amplitude() {
        let tone = generate_tone(1000.0, 100, false, 48_000);
        let peak = tone.samples().iter().map(|s| s.unsigned_abs()).max().unwrap();
        assert!(peak > 32_000);
        assert!(peak <= i16::MAX as u16);
    }

    #[test]
    fn test_loop_region_holds_whole_periods() {
        // 48000 / 440 = 109.09 samples per period
        let tone = generate_tone(440.0, 1000, true, 48_000);
        let periods = tone.loop_end() as f64 * 440.0 / 48_000.0;
        assert!((periods - periods.round()).abs() < 0.01, "periods {}", periods);
        assert!(tone.loop_end() <= tone.samples().len());
    }

    #[test]
    fn test_looping_playback_wraps() {
        let tone = generate_tone(1000.0, 10, true, 48_000);
        let mut position = tone.loop_end();
        let first = tone.next_sample(&mut position).unwrap();
        assert_eq!(position, 1);
        assert_eq!(first, 0.0);
    }

    #[test]
    fn test_one_shot_playback_ends() {
        let tone = generate_tone(1000.0, 1, false, 48_000);
        let mut position = 0;
        let mut count = 0;
        while tone.next_sample(&mut position).is_some() {
            count += 1;
        }
        assert_eq!(count, tone.samples().len());
    }
}
