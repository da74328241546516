// Audio engine error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Audio error code constants
///
/// Single source of truth for the numeric codes reported in plugin error
/// results, so the Java/JS side can switch on them.
///
/// Error code range: 1001-1010
pub struct AudioErrorCodes {}

impl AudioErrorCodes {
    /// Speed value is invalid (must be finite and > 0)
    pub const SPEED_INVALID: i32 = 1001;

    /// Measure string or pattern was empty
    pub const EMPTY_MEASURE: i32 = 1002;

    /// Measure contains no playable step
    pub const MEASURE_UNPLAYABLE: i32 = 1003;

    /// Numeric pattern entry does not map to a note
    pub const PATTERN_VALUE_INVALID: i32 = 1004;

    /// Audio output is not running
    pub const NOT_RUNNING: i32 = 1005;

    /// Failed to open audio stream
    pub const STREAM_OPEN_FAILED: i32 = 1006;

    /// Hardware error occurred
    pub const HARDWARE_ERROR: i32 = 1007;

    /// Mutex was poisoned
    pub const LOCK_POISONED: i32 = 1008;

    /// Render command queue is full
    pub const COMMAND_QUEUE_FULL: i32 = 1009;

    /// The host has not provided its application context yet
    pub const CONTEXT_UNAVAILABLE: i32 = 1010;
}

/// Log an audio error with structured context
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_audio_error(err: &AudioError, context: &str) {
    error!(
        "Audio error in {}: code={}, component=SoundMetronome, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Audio-related errors
///
/// These errors cover the native side: measure parsing, metronome control
/// and output stream management.
///
/// Error code range: 1001-1010
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    /// Speed value is invalid (must be finite and > 0)
    SpeedInvalid { speed: f64 },

    /// The measure cannot be empty
    EmptyMeasure,

    /// No step in the measure maps to a known note
    MeasureUnplayable { measure: String },

    /// A pattern entry is not a known step code, as written by the caller
    PatternValueInvalid { value: String },

    /// Audio output is not running
    NotRunning,

    /// Failed to open audio stream
    StreamOpenFailed { reason: String },

    /// Hardware error occurred
    HardwareError { details: String },

    /// Mutex was poisoned
    LockPoisoned { component: String },

    /// The audio thread has not drained the command queue
    CommandQueueFull,

    /// Native services need the host's application context first
    ContextUnavailable,
}

impl ErrorCode for AudioError {
    fn code(&self) -> i32 {
        match self {
            AudioError::SpeedInvalid { .. } => AudioErrorCodes::SPEED_INVALID,
            AudioError::EmptyMeasure => AudioErrorCodes::EMPTY_MEASURE,
            AudioError::MeasureUnplayable { .. } => AudioErrorCodes::MEASURE_UNPLAYABLE,
            AudioError::PatternValueInvalid { .. } => AudioErrorCodes::PATTERN_VALUE_INVALID,
            AudioError::NotRunning => AudioErrorCodes::NOT_RUNNING,
            AudioError::StreamOpenFailed { .. } => AudioErrorCodes::STREAM_OPEN_FAILED,
            AudioError::HardwareError { .. } => AudioErrorCodes::HARDWARE_ERROR,
            AudioError::LockPoisoned { .. } => AudioErrorCodes::LOCK_POISONED,
            AudioError::CommandQueueFull => AudioErrorCodes::COMMAND_QUEUE_FULL,
            AudioError::ContextUnavailable => AudioErrorCodes::CONTEXT_UNAVAILABLE,
        }
    }

    fn message(&self) -> String {
        match self {
            AudioError::SpeedInvalid { speed } => {
                format!("Speed must be a finite number greater than 0 (got {})", speed)
            }
            AudioError::EmptyMeasure => "the measure cannot be empty".to_string(),
            AudioError::MeasureUnplayable { measure } => {
                format!("Measure '{}' contains no playable note", measure)
            }
            AudioError::PatternValueInvalid { value } => {
                format!("Pattern value {} is not a step code (expected 0-3)", value)
            }
            AudioError::NotRunning => "Audio output not running".to_string(),
            AudioError::StreamOpenFailed { reason } => {
                format!("Failed to open audio stream: {}", reason)
            }
            AudioError::HardwareError { details } => {
                format!("Hardware error: {}", details)
            }
            AudioError::LockPoisoned { component } => {
                format!("Lock poisoned on {}", component)
            }
            AudioError::CommandQueueFull => "Render command queue is full".to_string(),
            AudioError::ContextUnavailable => {
                "Application context not initialized (nativeInit has not run)".to_string()
            }
        }
    }
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AudioError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for AudioError {}

impl From<std::io::Error> for AudioError {
    fn from(err: std::io::Error) -> Self {
        AudioError::HardwareError {
            details: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_error_codes() {
        assert_eq!(
            AudioError::SpeedInvalid { speed: 0.0 }.code(),
            AudioErrorCodes::SPEED_INVALID
        );
        assert_eq!(AudioError::EmptyMeasure.code(), AudioErrorCodes::EMPTY_MEASURE);
        assert_eq!(
            AudioError::MeasureUnplayable {
                measure: "??".to_string()
            }
            .code(),
            AudioErrorCodes::MEASURE_UNPLAYABLE
        );
        assert_eq!(
            AudioError::PatternValueInvalid { value: "7".to_string() }.code(),
            AudioErrorCodes::PATTERN_VALUE_INVALID
        );
        assert_eq!(AudioError::NotRunning.code(), AudioErrorCodes::NOT_RUNNING);
        assert_eq!(
            AudioError::CommandQueueFull.code(),
            AudioErrorCodes::COMMAND_QUEUE_FULL
        );
        assert_eq!(
            AudioError::ContextUnavailable.code(),
            AudioErrorCodes::CONTEXT_UNAVAILABLE
        );
    }

    #[test]
    fn test_audio_error_messages() {
        let err = AudioError::SpeedInvalid { speed: -3.0 };
        assert_eq!(
            err.message(),
            "Speed must be a finite number greater than 0 (got -3)"
        );

        let err = AudioError::EmptyMeasure;
        assert!(err.message().contains("cannot be empty"));

        let err = AudioError::MeasureUnplayable {
            measure: "qq".to_string(),
        };
        assert!(err.message().contains("'qq'"));
    }

    #[test]
    fn test_audio_error_display() {
        let err = AudioError::EmptyMeasure;
        let display = format!("{}", err);
        assert!(display.contains("AudioError"));
        assert!(display.contains(&err.code().to_string()));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::other("device gone");
        let audio_err: AudioError = io_err.into();
        match audio_err {
            AudioError::HardwareError { details } => {
                assert!(details.contains("device gone"));
            }
            _ => panic!("Expected HardwareError"),
        }
    }
}
