// Bridge module - client-side API and the native bridging seam

pub mod client;
pub mod completion;
pub mod native;
pub mod types;

pub use client::BridgeClient;
pub use completion::{Completion, ErrorCallback, ResultCallback};
pub use native::NativeBridge;
pub use types::{Action, ActionRequest, NativeValue, PluginStatus, PLUGIN_NAME};
