//! Request and result types shared by the client and the native side.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::platform::Capability;

/// Name under which the native plugin is registered with the host.
pub const PLUGIN_NAME: &str = "Echo";

/// Payload delivered to a success continuation.
pub type NativeValue = Value;

/// Native actions exposed by the `Echo` plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    SetBeatSpeed,
    PlayTone,
    StopTone,
    SetHaptic,
    StopBeatSpeed,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::SetBeatSpeed,
        Action::PlayTone,
        Action::StopTone,
        Action::SetHaptic,
        Action::StopBeatSpeed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::SetBeatSpeed => "setBeatSpeed",
            Action::PlayTone => "playTone",
            Action::StopTone => "stopTone",
            Action::SetHaptic => "setHaptic",
            Action::StopBeatSpeed => "stopBeatSpeed",
        }
    }

    /// Capability the platform must offer before the action is dispatched.
    pub fn required_capability(self) -> Option<Capability> {
        match self {
            Action::PlayTone | Action::StopTone => Some(Capability::Tone),
            Action::SetBeatSpeed | Action::SetHaptic | Action::StopBeatSpeed => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == name)
            .ok_or_else(|| format!("unknown action '{}'", name))
    }
}

/// A single native invocation: plugin, action and ordered arguments.
///
/// Built per call and discarded once dispatched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequest {
    pub plugin_name: String,
    pub action_name: Action,
    pub args: Vec<Value>,
}

impl ActionRequest {
    pub fn new(action: Action, args: Vec<Value>) -> Self {
        Self {
            plugin_name: PLUGIN_NAME.to_string(),
            action_name: action,
            args,
        }
    }
}

/// Status attached to a native plugin result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PluginStatus {
    Ok,
    ClassNotFound,
    InvalidAction,
    JsonException,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_names() {
        assert_eq!(Action::SetBeatSpeed.as_str(), "setBeatSpeed");
        assert_eq!(Action::StopBeatSpeed.as_str(), "stopBeatSpeed");
        for action in Action::ALL {
            assert_eq!(action.as_str().parse::<Action>(), Ok(action));
        }
        assert!("sound_start".parse::<Action>().is_err());
    }

    #[test]
    fn test_tone_actions_need_tone_capability() {
        assert_eq!(
            Action::PlayTone.required_capability(),
            Some(Capability::Tone)
        );
        assert_eq!(
            Action::StopTone.required_capability(),
            Some(Capability::Tone)
        );
        assert_eq!(Action::SetHaptic.required_capability(), None);
    }

    #[test]
    fn test_request_wire_shape() {
        let request = ActionRequest::new(Action::SetBeatSpeed, vec![json!(120), json!([1, 0])]);
        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(
            wire,
            json!({"pluginName": "Echo", "actionName": "setBeatSpeed", "args": [120, [1, 0]]})
        );
    }
}
