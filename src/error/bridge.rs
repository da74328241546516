// Bridge error types and constants

use crate::bridge::{Action, PluginStatus};
use crate::error::ErrorCode;
use crate::platform::PlatformId;
use log::error;
use std::fmt;

/// Bridge error code constants
///
/// Error code range: 3001-3003
pub struct BridgeErrorCodes {}

impl BridgeErrorCodes {
    /// Caller passed a malformed speed or pattern
    pub const INVALID_ARGUMENT: i32 = 3001;

    /// Action requires a capability the current platform lacks
    pub const UNSUPPORTED_PLATFORM: i32 = 3002;

    /// The native side reported a failure
    pub const NATIVE_FAILURE: i32 = 3003;
}

/// Log a bridge error with structured context
pub fn log_bridge_error(err: &BridgeError, context: &str) {
    error!(
        "Bridge error in {}: code={}, component=BridgeClient, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors delivered to a caller's failure continuation
///
/// `InvalidArgument` and `UnsupportedPlatform` are raised locally before
/// anything is dispatched. `NativeFailure` carries whatever the native side
/// reported, unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeError {
    /// Caller passed a malformed speed or pattern
    InvalidArgument { reason: String },

    /// The action is not available on this platform
    UnsupportedPlatform { platform: PlatformId, action: Action },

    /// Opaque failure reported by the native bridge
    NativeFailure {
        status: PluginStatus,
        payload: serde_json::Value,
    },
}

impl BridgeError {
    /// Build a failure with an `Error` status and a plain string payload
    pub fn native(message: impl Into<String>) -> Self {
        BridgeError::NativeFailure {
            status: PluginStatus::Error,
            payload: serde_json::Value::String(message.into()),
        }
    }
}

impl ErrorCode for BridgeError {
    fn code(&self) -> i32 {
        match self {
            BridgeError::InvalidArgument { .. } => BridgeErrorCodes::INVALID_ARGUMENT,
            BridgeError::UnsupportedPlatform { .. } => BridgeErrorCodes::UNSUPPORTED_PLATFORM,
            BridgeError::NativeFailure { .. } => BridgeErrorCodes::NATIVE_FAILURE,
        }
    }

    fn message(&self) -> String {
        match self {
            BridgeError::InvalidArgument { reason } => format!("Invalid argument: {}", reason),
            BridgeError::UnsupportedPlatform { platform, action } => {
                format!("Action '{}' is not available on {}", action, platform)
            }
            BridgeError::NativeFailure { status, payload } => match payload {
                serde_json::Value::String(text) => format!("Native failure ({:?}): {}", status, text),
                other => format!("Native failure ({:?}): {}", status, other),
            },
        }
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BridgeError (code {}): {}", self.code(), self.message())
    }
}

impl std::error::Error for BridgeError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bridge_error_codes() {
        assert_eq!(
            BridgeError::InvalidArgument {
                reason: "x".to_string()
            }
            .code(),
            BridgeErrorCodes::INVALID_ARGUMENT
        );
        assert_eq!(
            BridgeError::UnsupportedPlatform {
                platform: PlatformId::Ios,
                action: Action::PlayTone,
            }
            .code(),
            BridgeErrorCodes::UNSUPPORTED_PLATFORM
        );
        assert_eq!(
            BridgeError::native("boom").code(),
            BridgeErrorCodes::NATIVE_FAILURE
        );
    }

    #[test]
    fn test_unsupported_platform_message_names_action() {
        let err = BridgeError::UnsupportedPlatform {
            platform: PlatformId::Ios,
            action: Action::StopTone,
        };
        assert_eq!(err.message(), "Action 'stopTone' is not available on ios");
    }

    #[test]
    fn test_native_failure_keeps_payload() {
        let payload = json!({"reason": "busy", "retry": false});
        let err = BridgeError::NativeFailure {
            status: PluginStatus::Error,
            payload: payload.clone(),
        };
        match &err {
            BridgeError::NativeFailure { payload: kept, .. } => assert_eq!(kept, &payload),
            _ => unreachable!(),
        }
        assert!(err.message().contains("busy"));
    }
}
