//! Native side of the bridge: plugins and the host that dispatches to them.

pub mod echo;
pub mod host;

pub use echo::EchoPlugin;
pub use host::PluginHost;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bridge::PluginStatus;

/// A named native plugin that executes bridge actions.
pub trait Plugin: Send + Sync {
    /// Run `action` with its positional arguments.
    fn execute(&self, action: &str, args: &[Value]) -> PluginResult;
}

/// Outcome of one plugin action, as reported back over the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginResult {
    pub status: PluginStatus,
    #[serde(default)]
    pub message: Value,
}

impl PluginResult {
    pub fn ok() -> Self {
        Self::with_message(PluginStatus::Ok, Value::Null)
    }

    pub fn with_message(status: PluginStatus, message: Value) -> Self {
        Self { status, message }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::with_message(PluginStatus::Error, Value::String(message.into()))
    }

    pub fn json_exception(message: impl Into<String>) -> Self {
        Self::with_message(PluginStatus::JsonException, Value::String(message.into()))
    }

    pub fn invalid_action(action: &str) -> Self {
        Self::with_message(
            PluginStatus::InvalidAction,
            Value::String(format!("Invalid action: {}", action)),
        )
    }

    pub fn class_not_found(plugin: &str) -> Self {
        Self::with_message(
            PluginStatus::ClassNotFound,
            Value::String(format!("Plugin not found: {}", plugin)),
        )
    }

    pub fn is_ok(&self) -> bool {
        self.status == PluginStatus::Ok
    }
}

/// Execute an action whose arguments arrive as a JSON array string, and
/// serialize the result. Used by the JNI shell.
pub fn execute_json(plugin: &dyn Plugin, action: &str, args_json: &str) -> String {
    let result = match serde_json::from_str::<Vec<Value>>(args_json) {
        Ok(args) => plugin.execute(action, &args),
        Err(err) => PluginResult::json_exception(format!("Invalid arguments: {}", err)),
    };
    serde_json::to_string(&result)
        .unwrap_or_else(|_| r#"{"status":"ERROR","message":"unserializable result"}"#.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_serializes_for_the_java_shell() {
        let value = serde_json::to_value(PluginResult::error("boom")).unwrap();
        assert_eq!(value, json!({"status": "ERROR", "message": "boom"}));

        let ok: PluginResult = serde_json::from_value(json!({"status": "OK"})).unwrap();
        assert!(ok.is_ok());
        assert_eq!(ok.message, Value::Null);
    }

    #[test]
    fn test_constructors_set_status() {
        assert_eq!(
            PluginResult::invalid_action("dance").status,
            PluginStatus::InvalidAction
        );
        assert_eq!(
            PluginResult::class_not_found("Nope").status,
            PluginStatus::ClassNotFound
        );
        assert_eq!(
            PluginResult::json_exception("bad").status,
            PluginStatus::JsonException
        );
        assert!(!PluginResult::error("x").is_ok());
    }

    struct EchoArgs;

    impl Plugin for EchoArgs {
        fn execute(&self, _action: &str, args: &[Value]) -> PluginResult {
            PluginResult::with_message(PluginStatus::Ok, json!(args.len()))
        }
    }

    #[test]
    fn test_execute_json() {
        let out = execute_json(&EchoArgs, "setHaptic", "[1, \"e\"]");
        let result: PluginResult = serde_json::from_str(&out).unwrap();
        assert_eq!(result, PluginResult::with_message(PluginStatus::Ok, json!(2)));

        let out = execute_json(&EchoArgs, "setHaptic", "{not json");
        let result: PluginResult = serde_json::from_str(&out).unwrap();
        assert_eq!(result.status, PluginStatus::JsonException);
    }
}
