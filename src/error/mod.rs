// Error types for the Echo metronome plugin
//
// This module defines error types for the client-side bridge and the native
// audio engine, with stable numeric codes suitable for crossing the JS/JNI
// boundary.

mod audio;
mod bridge;

pub use audio::{log_audio_error, AudioError, AudioErrorCodes};
pub use bridge::{log_bridge_error, BridgeError, BridgeErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the bridge boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
