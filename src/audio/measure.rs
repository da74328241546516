//! Measure model: the sequence of notes the metronome cycles through.
//!
//! A measure is given either as a string of note symbols or as a numeric
//! pattern of step codes. Each step is one equal subdivision of a beat.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AudioError;

/// Measure that stops the metronome instead of playing.
pub const STOP_MEASURE: &str = "X";
/// Measure that only triggers a haptic pulse.
pub const HAPTIC_MEASURE: &str = "Z";

/// Woodblock voice used for a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Voice {
    High,
    Mid,
    Low,
}

impl Voice {
    pub const ALL: [Voice; 3] = [Voice::High, Voice::Mid, Voice::Low];

    pub fn index(self) -> usize {
        match self {
            Voice::High => 0,
            Voice::Mid => 1,
            Voice::Low => 2,
        }
    }
}

/// One playable step: which voice, at what volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetronomeNote {
    pub symbol: char,
    pub voice: Voice,
    pub volume: f32,
}

/// Symbol table: lowercase letters descend in volume, the uppercase symbol
/// of each voice is a silent rest.
const NOTE_TABLE: [(char, Voice, f32); 15] = [
    ('e', Voice::High, 1.0),
    ('f', Voice::High, 0.5),
    ('g', Voice::High, 0.3),
    ('h', Voice::High, 0.1),
    ('E', Voice::High, 0.0),
    ('i', Voice::Mid, 1.0),
    ('j', Voice::Mid, 0.5),
    ('k', Voice::Mid, 0.3),
    ('l', Voice::Mid, 0.1),
    ('I', Voice::Mid, 0.0),
    ('m', Voice::Low, 1.0),
    ('n', Voice::Low, 0.5),
    ('o', Voice::Low, 0.3),
    ('p', Voice::Low, 0.1),
    ('M', Voice::Low, 0.0),
];

/// Look up the note for a measure symbol.
pub fn note_for_symbol(symbol: char) -> Option<MetronomeNote> {
    NOTE_TABLE
        .iter()
        .find(|(s, _, _)| *s == symbol)
        .map(|&(symbol, voice, volume)| MetronomeNote {
            symbol,
            voice,
            volume,
        })
}

/// Map a numeric step code to its symbol: 0 rest, 1 high, 2 mid, 3 low.
pub fn symbol_for_code(code: f64) -> Result<char, AudioError> {
    let symbol = match code {
        c if c == 0.0 => 'E',
        c if c == 1.0 => 'e',
        c if c == 2.0 => 'i',
        c if c == 3.0 => 'm',
        _ => {
            return Err(AudioError::PatternValueInvalid {
                value: code.to_string(),
            })
        }
    };
    Ok(symbol)
}

/// A parsed measure.
///
/// Steps with unknown symbols are kept (`None`) so the step interval still
/// divides the beat by the full measure length; playback skips them.
#[derive(Debug, Clone, PartialEq)]
pub struct Measure {
    symbols: String,
    steps: Vec<Option<MetronomeNote>>,
}

impl Measure {
    /// Parse a measure from note symbols, e.g. `"eiii"`.
    pub fn parse(symbols: &str) -> Result<Self, AudioError> {
        if symbols.is_empty() {
            return Err(AudioError::EmptyMeasure);
        }

        let steps: Vec<Option<MetronomeNote>> = symbols.chars().map(note_for_symbol).collect();
        if steps.iter().all(Option::is_none) {
            return Err(AudioError::MeasureUnplayable {
                measure: symbols.to_string(),
            });
        }

        Ok(Self {
            symbols: symbols.to_string(),
            steps,
        })
    }

    /// Build a measure from numeric step codes, e.g. `[1, 0, 1, 0]`.
    pub fn from_codes(codes: &[f64]) -> Result<Self, AudioError> {
        let symbols = codes
            .iter()
            .map(|&code| symbol_for_code(code))
            .collect::<Result<String, _>>()?;
        Self::parse(&symbols)
    }

    /// Interpret a plugin argument: a symbol string or an array of codes.
    pub fn from_value(value: &Value) -> Result<Self, AudioError> {
        match value {
            Value::String(symbols) => Self::parse(symbols),
            Value::Array(items) => {
                let codes = items
                    .iter()
                    .map(|item| {
                        item.as_f64().ok_or_else(|| AudioError::PatternValueInvalid {
                            value: item.to_string(),
                        })
                    })
                    .collect::<Result<Vec<f64>, _>>()?;
                Self::from_codes(&codes)
            }
            _ => Err(AudioError::EmptyMeasure),
        }
    }

    pub fn symbols(&self) -> &str {
        &self.symbols
    }

    pub fn steps(&self) -> &[Option<MetronomeNote>] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
