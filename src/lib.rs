// Echo Metronome - Cordova-style metronome plugin bridge
// Client API, native plugin dispatch and sample-accurate metronome engine

// Module declarations
pub mod audio;
pub mod bridge;
pub mod config;
pub mod engine;
pub mod error;
pub mod platform;
pub mod plugin;
pub mod testing;

#[cfg(target_os = "android")]
pub mod jni_bridge;

// Re-exports for convenience
pub use bridge::{Action, ActionRequest, BridgeClient, Completion, NativeBridge, PluginStatus};
pub use error::{AudioError, BridgeError};
pub use platform::{Capability, PlatformId, PlatformInfo};

/// Install the global tracing subscriber. Safe to call more than once.
///
/// `log` records are forwarded into tracing, so both macro families end up
/// in the same output.
#[cfg(target_os = "android")]
pub fn init_logging() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let layer = match tracing_android::layer("EchoMetronome") {
        Ok(layer) => layer,
        Err(_) => return,
    };
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::filter::LevelFilter::DEBUG)
        .with(layer)
        .try_init();
}

#[cfg(not(target_os = "android"))]
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// JNI_OnLoad is called when the native library is loaded by Android
#[cfg(target_os = "android")]
#[no_mangle]
pub extern "system" fn JNI_OnLoad(
    _vm: jni::JavaVM,
    _reserved: *mut std::ffi::c_void,
) -> jni::sys::jint {
    init_logging();
    log::info!("JNI_OnLoad called - waiting for nativeInit to provide the context");
    jni::sys::JNI_VERSION_1_6
}
