//! Haptic feedback drivers.

use log::info;

/// Something that can pulse the device's vibration motor.
pub trait HapticFeedback: Send + Sync {
    fn haptic(&self);
}

/// Desktop fallback: there is no motor, so the pulse is only logged.
#[derive(Debug, Default)]
pub struct LogHaptics;

impl HapticFeedback for LogHaptics {
    fn haptic(&self) {
        info!("[Haptics] pulse");
    }
}

#[cfg(target_os = "android")]
pub use android::VibratorHaptics;

#[cfg(target_os = "android")]
mod android {
    use jni::objects::{JObject, JValue};
    use jni::JavaVM;
    use log::warn;

    use super::HapticFeedback;
    use crate::error::AudioError;
    use crate::platform::require_app_context;

    /// Pulse length matching a short confirm tick.
    const PULSE_MS: i64 = 20;

    /// Calls `Vibrator.vibrate(long)` through the activity context.
    #[derive(Debug, Default)]
    pub struct VibratorHaptics;

    impl VibratorHaptics {
        fn vibrate(&self) -> Result<(), AudioError> {
            require_app_context()?;
            self.call_vibrator().map_err(|err| AudioError::HardwareError {
                details: format!("vibrate failed: {:?}", err),
            })
        }

        fn call_vibrator(&self) -> jni::errors::Result<()> {
            let ctx = ndk_context::android_context();
            // SAFETY: nativeInit stored a valid VM pointer before marking the
            // context ready.
            let vm = unsafe { JavaVM::from_raw(ctx.vm().cast()) }?;
            let mut env = vm.attach_current_thread()?;
            // SAFETY: the context pointer is a global ref pinned by nativeInit.
            let context = unsafe { JObject::from_raw(ctx.context().cast()) };

            let service_name = env.new_string("vibrator")?;
            let vibrator = env
                .call_method(
                    &context,
                    "getSystemService",
                    "(Ljava/lang/String;)Ljava/lang/Object;",
                    &[JValue::Object(&service_name)],
                )?
                .l()?;
            if vibrator.is_null() {
                return Ok(());
            }

            env.call_method(&vibrator, "vibrate", "(J)V", &[JValue::Long(PULSE_MS)])?;
            Ok(())
        }
    }

    impl HapticFeedback for VibratorHaptics {
        fn haptic(&self) {
            if let Err(err) = self.vibrate() {
                warn!("[Haptics] {}", err);
            }
        }
    }
}

/// Default haptic driver for the compile target.
pub fn platform_haptics() -> std::sync::Arc<dyn HapticFeedback> {
    cfg_if::cfg_if! {
        if #[cfg(target_os = "android")] {
            std::sync::Arc::new(VibratorHaptics)
        } else {
            std::sync::Arc::new(LogHaptics)
        }
    }
}
