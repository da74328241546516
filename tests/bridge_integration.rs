use std::sync::{Arc, Mutex};
use std::time::Duration;

use echo_metronome::bridge::{NativeValue, PLUGIN_NAME};
use echo_metronome::config::AppConfig;
use echo_metronome::engine::{AudioBackend, DesktopStubBackend, Metronome, SoundMetronome};
use echo_metronome::plugin::{EchoPlugin, PluginHost};
use echo_metronome::testing::CountingHaptics;
use echo_metronome::{BridgeClient, BridgeError, PlatformInfo, PluginStatus};
use serde_json::json;

struct Harness {
    client: BridgeClient<Arc<PluginHost>>,
    backend: Arc<DesktopStubBackend>,
    haptics: Arc<CountingHaptics>,
    metronome: Arc<SoundMetronome>,
}

fn harness(platform: &str) -> Harness {
    let config = AppConfig::default();
    let backend = Arc::new(DesktopStubBackend::new(48_000));
    let haptics = Arc::new(CountingHaptics::new());
    let metronome = Arc::new(SoundMetronome::new(
        backend.clone(),
        haptics.clone(),
        &config,
    ));

    let host = PluginHost::new(&config.host).expect("plugin host");
    host.register(PLUGIN_NAME, Arc::new(EchoPlugin::new(metronome.clone())));

    Harness {
        client: BridgeClient::new(Arc::new(host), PlatformInfo::new(platform)),
        backend,
        haptics,
        metronome,
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime")
}

fn energy(block: &[f32]) -> f32 {
    block.iter().map(|s| s * s).sum()
}

#[test]
fn set_beat_reaches_the_engine_and_produces_audio() {
    let h = harness("ios");
    let rt = runtime();

    rt.block_on(h.client.set_beat_async(120.0, &[1.0, 0.0, 1.0, 0.0]))
        .expect("setBeatSpeed");
    assert!(h.metronome.is_playing());
    assert_eq!(h.metronome.current_measure().as_deref(), Some("eEeE"));
    assert_eq!(h.haptics.pulses(), 1);

    // 120 BPM over 4 steps at 48kHz: 6000 frames per step, rests on odd steps
    let block = h.backend.render(24_000).expect("render");
    assert!(energy(&block[..500]) > 0.0);
    assert_eq!(energy(&block[6_000..12_000]), 0.0);
    assert!(energy(&block[12_000..12_500]) > 0.0);

    rt.block_on(h.client.stop_async()).expect("stopBeatSpeed");
    assert!(!h.metronome.is_playing());
}

#[test]
fn native_failure_passes_through_verbatim() {
    let h = harness("android");
    let rt = runtime();

    let err = rt
        .block_on(h.client.set_beat_async(120.0, &[9.0]))
        .unwrap_err();
    match err {
        BridgeError::NativeFailure { status, payload } => {
            assert_eq!(status, PluginStatus::Error);
            assert!(payload.as_str().unwrap_or_default().contains("9"));
        }
        other => panic!("expected native failure, got {other:?}"),
    }
    assert!(!h.metronome.is_playing());
}

#[test]
fn tone_is_gated_by_platform() {
    let ios = harness("ios");
    let rt = runtime();
    let err = rt.block_on(ios.client.play_tone_async()).unwrap_err();
    assert!(matches!(err, BridgeError::UnsupportedPlatform { .. }));
    assert!(!ios.backend.is_running());

    let android = harness("android");
    rt.block_on(android.client.play_tone_async()).expect("playTone");
    assert!(android.metronome.is_tone_playing());
    let block = android.backend.render(4_800).expect("render");
    assert!(energy(&block) > 0.0);

    rt.block_on(android.client.stop_tone_async()).expect("stopTone");
    assert!(!android.metronome.is_tone_playing());
}

#[test]
fn haptic_works_everywhere() {
    let rt = runtime();
    for platform in ["android", "ios", "browser"] {
        let h = harness(platform);
        rt.block_on(h.client.set_haptic_async()).expect("setHaptic");
        assert_eq!(h.haptics.pulses(), 1, "platform {platform}");
        assert!(!h.backend.is_running());
    }
}

#[test]
fn callback_api_fires_exactly_one_continuation() {
    let h = harness("ios");
    let outcomes: Arc<Mutex<Vec<Result<NativeValue, BridgeError>>>> = Arc::default();
    let (done_tx, done_rx) = std::sync::mpsc::channel();

    let ok_outcomes = Arc::clone(&outcomes);
    let err_outcomes = Arc::clone(&outcomes);
    let ok_done = done_tx.clone();
    h.client.set_beat(
        90.0,
        &[1.0, 2.0, 2.0, 3.0],
        move |value| {
            ok_outcomes.lock().unwrap().push(Ok(value));
            ok_done.send(()).unwrap();
        },
        move |err| {
            err_outcomes.lock().unwrap().push(Err(err));
            done_tx.send(()).unwrap();
        },
    );

    done_rx.recv_timeout(Duration::from_secs(5)).expect("completion");
    assert!(done_rx.recv_timeout(Duration::from_millis(50)).is_err());
    let outcomes = outcomes.lock().unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0], Ok(json!(null)));
    assert_eq!(h.metronome.current_measure().as_deref(), Some("eiim"));
}

#[test]
fn invalid_arguments_never_reach_the_host() {
    let h = harness("android");
    let rt = runtime();

    let err = rt
        .block_on(h.client.set_beat_async(0.0, &[1.0]))
        .unwrap_err();
    assert!(matches!(err, BridgeError::InvalidArgument { .. }));

    let err = rt
        .block_on(h.client.set_beat_async(120.0, &[f64::NAN]))
        .unwrap_err();
    assert!(matches!(err, BridgeError::InvalidArgument { .. }));

    assert!(!h.backend.is_running());
    assert_eq!(h.haptics.pulses(), 0);
}

#[test]
fn host_shutdown_fails_later_requests() {
    let h = harness("android");
    let rt = runtime();
    h.client.bridge().shutdown();

    let err = rt.block_on(h.client.set_haptic_async()).unwrap_err();
    assert!(matches!(
        err,
        BridgeError::NativeFailure {
            status: PluginStatus::Error,
            ..
        }
    ));
}
