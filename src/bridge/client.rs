//! BridgeClient: typed application API over the native `Echo` plugin.
//!
//! Each operation validates its arguments, picks the native action and
//! argument list, and hands a fresh `ActionRequest` to the injected
//! `NativeBridge`. Results and native errors reach the caller's
//! continuations unchanged; the client itself only ever reports
//! `InvalidArgument` and `UnsupportedPlatform`, synchronously.

use log::debug;
use serde_json::Value;

use super::completion::Completion;
use super::native::NativeBridge;
use super::types::{Action, ActionRequest, NativeValue};
use crate::error::{log_bridge_error, BridgeError};
use crate::platform::PlatformInfo;

/// Largest integer an f64 represents exactly (2^53).
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Application-facing metronome bridge.
///
/// # Example
/// ```ignore
/// let client = BridgeClient::new(host, PlatformInfo::new("ios"));
/// client.set_beat(120.0, &[1.0, 0.0, 1.0, 0.0], |_| {}, |err| eprintln!("{err}"));
/// ```
pub struct BridgeClient<B: NativeBridge> {
    bridge: B,
    platform: PlatformInfo,
}

impl<B: NativeBridge> BridgeClient<B> {
    pub fn new(bridge: B, platform: PlatformInfo) -> Self {
        Self { bridge, platform }
    }

    pub fn platform(&self) -> &PlatformInfo {
        &self.platform
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    /// Start or update the metronome (`setBeatSpeed`, args `[speed, pattern]`).
    pub fn set_beat<F, G>(&self, speed: f64, pattern: &[f64], on_result: F, on_error: G)
    where
        F: FnOnce(NativeValue) + Send + 'static,
        G: FnOnce(BridgeError) + Send + 'static,
    {
        let completion = Completion::new(on_result, on_error);
        match beat_args(speed, pattern) {
            Ok(args) => self.dispatch(Action::SetBeatSpeed, args, completion),
            Err(err) => {
                log_bridge_error(&err, "set_beat");
                completion.fail(err);
            }
        }
    }

    /// Start the continuous tone. Android only.
    pub fn play_tone<F, G>(&self, on_result: F, on_error: G)
    where
        F: FnOnce(NativeValue) + Send + 'static,
        G: FnOnce(BridgeError) + Send + 'static,
    {
        self.dispatch(Action::PlayTone, Vec::new(), Completion::new(on_result, on_error));
    }

    /// Stop the continuous tone. Android only.
    pub fn stop_tone<F, G>(&self, on_result: F, on_error: G)
    where
        F: FnOnce(NativeValue) + Send + 'static,
        G: FnOnce(BridgeError) + Send + 'static,
    {
        self.dispatch(Action::StopTone, Vec::new(), Completion::new(on_result, on_error));
    }

    pub fn set_haptic<F, G>(&self, on_result: F, on_error: G)
    where
        F: FnOnce(NativeValue) + Send + 'static,
        G: FnOnce(BridgeError) + Send + 'static,
    {
        self.dispatch(Action::SetHaptic, Vec::new(), Completion::new(on_result, on_error));
    }

    /// Stop the metronome. Always sends the fixed arguments `[0, 0]`.
    pub fn stop<F, G>(&self, on_result: F, on_error: G)
    where
        F: FnOnce(NativeValue) + Send + 'static,
        G: FnOnce(BridgeError) + Send + 'static,
    {
        self.dispatch(
            Action::StopBeatSpeed,
            vec![Value::from(0), Value::from(0)],
            Completion::new(on_result, on_error),
        );
    }

    // ========================================================================
    // FUTURE-BASED API
    // ========================================================================

    pub async fn set_beat_async(
        &self,
        speed: f64,
        pattern: &[f64],
    ) -> Result<NativeValue, BridgeError> {
        let args = beat_args(speed, pattern)?;
        self.call(Action::SetBeatSpeed, args).await
    }

    pub async fn play_tone_async(&self) -> Result<NativeValue, BridgeError> {
        self.call(Action::PlayTone, Vec::new()).await
    }

    pub async fn stop_tone_async(&self) -> Result<NativeValue, BridgeError> {
        self.call(Action::StopTone, Vec::new()).await
    }

    pub async fn set_haptic_async(&self) -> Result<NativeValue, BridgeError> {
        self.call(Action::SetHaptic, Vec::new()).await
    }

    pub async fn stop_async(&self) -> Result<NativeValue, BridgeError> {
        self.call(Action::StopBeatSpeed, vec![Value::from(0), Value::from(0)])
            .await
    }

    async fn call(&self, action: Action, args: Vec<Value>) -> Result<NativeValue, BridgeError> {
        let (completion, rx) = Completion::channel();
        self.dispatch(action, args, completion);
        rx.await
            .unwrap_or_else(|_| Err(BridgeError::native("completion channel closed")))
    }

    /// Capability gate, then hand the request to the bridge.
    fn dispatch(&self, action: Action, args: Vec<Value>, completion: Completion) {
        if let Some(capability) = action.required_capability() {
            if !self.platform.supports(capability) {
                let err = BridgeError::UnsupportedPlatform {
                    platform: self.platform.platform_id().clone(),
                    action,
                };
                log_bridge_error(&err, action.as_str());
                completion.fail(err);
                return;
            }
        }

        debug!("[BridgeClient] {} args={:?}", action, args);
        self.bridge.invoke(ActionRequest::new(action, args), completion);
    }
}

/// Validate speed and pattern and build the `setBeatSpeed` argument list.
fn beat_args(speed: f64, pattern: &[f64]) -> Result<Vec<Value>, BridgeError> {
    if !speed.is_finite() || speed <= 0.0 {
        return Err(BridgeError::InvalidArgument {
            reason: format!("speed must be a finite number greater than 0 (got {})", speed),
        });
    }

    if let Some(index) = pattern.iter().position(|value| !value.is_finite()) {
        return Err(BridgeError::InvalidArgument {
            reason: format!(
                "pattern[{}] must be a finite number (got {})",
                index, pattern[index]
            ),
        });
    }

    let pattern = pattern.iter().copied().map(number_value).collect();
    Ok(vec![number_value(speed), Value::Array(pattern)])
}

/// Integral values travel as JSON integers so the native side can read them
/// with integer accessors.
fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingBridge;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    type Outcomes = Arc<Mutex<Vec<Result<NativeValue, BridgeError>>>>;

    fn client(platform: &str) -> BridgeClient<Arc<RecordingBridge>> {
        BridgeClient::new(Arc::new(RecordingBridge::new()), PlatformInfo::new(platform))
    }

    fn sinks(
        outcomes: &Outcomes,
    ) -> (
        impl FnOnce(NativeValue) + Send + 'static,
        impl FnOnce(BridgeError) + Send + 'static,
    ) {
        let ok = Arc::clone(outcomes);
        let err = Arc::clone(outcomes);
        (
            move |value: NativeValue| ok.lock().unwrap().push(Ok(value)),
            move |e: BridgeError| err.lock().unwrap().push(Err(e)),
        )
    }

    #[test]
    fn test_set_beat_issues_one_request() {
        let client = client("ios");
        let outcomes: Outcomes = Arc::default();
        let (ok, err) = sinks(&outcomes);

        client.set_beat(120.0, &[1.0, 0.0, 1.0, 0.0], ok, err);

        let requests = client.bridge().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].plugin_name, "Echo");
        assert_eq!(requests[0].action_name, Action::SetBeatSpeed);
        assert_eq!(requests[0].args, vec![json!(120), json!([1, 0, 1, 0])]);
        assert!(outcomes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_set_beat_keeps_fractional_values() {
        let client = client("android");
        client.set_beat(92.5, &[0.5], |_| {}, |_| {});
        let requests = client.bridge().requests();
        assert_eq!(requests[0].args, vec![json!(92.5), json!([0.5])]);
    }

    #[test]
    fn test_set_beat_accepts_empty_pattern() {
        let client = client("android");
        client.set_beat(60.0, &[], |_| {}, |_| {});
        assert_eq!(client.bridge().requests()[0].args, vec![json!(60), json!([])]);
    }

    #[test]
    fn test_set_beat_rejects_invalid_speed_before_dispatch() {
        for speed in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let client = client("android");
            let outcomes: Outcomes = Arc::default();
            let (ok, err) = sinks(&outcomes);

            client.set_beat(speed, &[1.0], ok, err);

            assert!(client.bridge().requests().is_empty());
            let outcomes = outcomes.lock().unwrap();
            assert_eq!(outcomes.len(), 1);
            assert!(matches!(
                outcomes[0],
                Err(BridgeError::InvalidArgument { .. })
            ));
        }
    }

    #[test]
    fn test_set_beat_rejects_non_finite_pattern() {
        let client = client("android");
        let outcomes: Outcomes = Arc::default();
        let (ok, err) = sinks(&outcomes);

        client.set_beat(120.0, &[1.0, f64::NAN], ok, err);

        assert!(client.bridge().requests().is_empty());
        match &outcomes.lock().unwrap()[0] {
            Err(BridgeError::InvalidArgument { reason }) => assert!(reason.contains("pattern[1]")),
            other => panic!("Expected InvalidArgument, got {:?}", other),
        };
    }

    #[test]
    fn test_stop_sends_fixed_zeros() {
        let client = client("ios");
        client.stop(|_| {}, |_| {});
        client.stop(|_| {}, |_| {});
        let requests = client.bridge().requests();
        assert_eq!(requests.len(), 2);
        for request in requests {
            assert_eq!(request.action_name, Action::StopBeatSpeed);
            assert_eq!(request.args, vec![json!(0), json!(0)]);
        }
    }

    #[test]
    fn test_tone_dispatched_on_android() {
        let client = client("android");
        client.play_tone(|_| {}, |_| {});
        client.stop_tone(|_| {}, |_| {});
        let requests = client.bridge().requests();
        assert_eq!(requests[0].action_name, Action::PlayTone);
        assert_eq!(requests[1].action_name, Action::StopTone);
        assert!(requests.iter().all(|r| r.args.is_empty()));
    }

    #[test]
    fn test_tone_unsupported_elsewhere() {
        for platform in ["ios", "browser"] {
            for expected in [Action::PlayTone, Action::StopTone] {
                let client = client(platform);
                let outcomes: Outcomes = Arc::default();
                let (ok, err) = sinks(&outcomes);

                match expected {
                    Action::PlayTone => client.play_tone(ok, err),
                    _ => client.stop_tone(ok, err),
                }

                assert!(client.bridge().requests().is_empty());
                let outcomes = outcomes.lock().unwrap();
                assert_eq!(outcomes.len(), 1);
                match &outcomes[0] {
                    Err(BridgeError::UnsupportedPlatform { platform: id, action }) => {
                        assert_eq!(*action, expected);
                        assert_eq!(id.as_str(), platform);
                    }
                    other => panic!("Expected UnsupportedPlatform, got {:?}", other),
                }
            }
        }
    }

    #[test]
    fn test_async_tone_unsupported_elsewhere() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let client = client("ios");

        let play = runtime.block_on(client.play_tone_async());
        let stop = runtime.block_on(client.stop_tone_async());

        assert!(matches!(
            play,
            Err(BridgeError::UnsupportedPlatform {
                action: Action::PlayTone,
                ..
            })
        ));
        assert!(matches!(
            stop,
            Err(BridgeError::UnsupportedPlatform {
                action: Action::StopTone,
                ..
            })
        ));
        assert!(client.bridge().requests().is_empty());
    }

    #[test]
    fn test_set_haptic_on_every_platform() {
        for platform in ["android", "ios", "linux"] {
            let client = client(platform);
            client.set_haptic(|_| {}, |_| {});
            let requests = client.bridge().requests();
            assert_eq!(requests.len(), 1);
            assert_eq!(requests[0].action_name, Action::SetHaptic);
            assert!(requests[0].args.is_empty());
        }
    }

    #[test]
    fn test_native_failure_passes_through_verbatim() {
        let client = client("android");
        let outcomes: Outcomes = Arc::default();
        let (ok, err) = sinks(&outcomes);

        client.set_haptic(ok, err);
        client
            .bridge()
            .reject_next(crate::bridge::PluginStatus::Error, json!({"code": 7}));

        let outcomes = outcomes.lock().unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(
            outcomes[0],
            Err(BridgeError::NativeFailure {
                status: crate::bridge::PluginStatus::Error,
                payload: json!({"code": 7}),
            })
        );
    }

    #[test]
    fn test_async_invalid_argument() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime");
        let client = client("android");
        let result = runtime.block_on(client.set_beat_async(-5.0, &[]));
        assert!(matches!(result, Err(BridgeError::InvalidArgument { .. })));
        assert!(client.bridge().requests().is_empty());
    }
}
