//! Android backend driving the renderer from an Oboe output callback.

use std::sync::{Mutex, MutexGuard};

use oboe::{
    AudioOutputCallback, AudioOutputStreamSafe, AudioStream, AudioStreamAsync, AudioStreamBuilder,
    DataCallbackResult, Output, PerformanceMode, SharingMode,
};

use crate::audio::OutputRenderer;
use crate::error::AudioError;
use crate::platform::require_app_context;

use super::AudioBackend;

/// Output callback wrapping the renderer.
///
/// Real-time safe as long as `OutputRenderer::render` is.
struct RendererCallback {
    renderer: OutputRenderer,
}

impl AudioOutputCallback for RendererCallback {
    type FrameType = (f32, oboe::Mono);

    fn on_audio_ready(
        &mut self,
        _stream: &mut dyn AudioOutputStreamSafe,
        frames: &mut [f32],
    ) -> DataCallbackResult {
        self.renderer.render(frames);
        DataCallbackResult::Continue
    }
}

/// Low-latency mono f32 output via Oboe (AAudio/OpenSL ES).
pub struct OboeBackend {
    sample_rate: u32,
    stream: Mutex<Option<AudioStreamAsync<Output, RendererCallback>>>,
}

impl OboeBackend {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            stream: Mutex::new(None),
        }
    }

    fn lock_stream(
        &self,
    ) -> Result<MutexGuard<'_, Option<AudioStreamAsync<Output, RendererCallback>>>, AudioError>
    {
        self.stream.lock().map_err(|_| AudioError::LockPoisoned {
            component: "oboe_stream".to_string(),
        })
    }
}

impl AudioBackend for OboeBackend {
    fn start(&self, mut renderer: OutputRenderer) -> Result<(), AudioError> {
        let mut guard = self.lock_stream()?;
        if guard.is_some() {
            return Err(AudioError::StreamOpenFailed {
                reason: "output stream already open".to_string(),
            });
        }

        require_app_context()?;
        renderer.prepare(self.sample_rate);
        let mut stream = AudioStreamBuilder::default()
            .set_performance_mode(PerformanceMode::LowLatency)
            .set_sharing_mode(SharingMode::Exclusive)
            .set_direction::<Output>()
            .set_sample_rate(self.sample_rate as i32)
            .set_channel_count::<oboe::Mono>()
            .set_format::<f32>()
            .set_callback(RendererCallback { renderer })
            .open_stream()
            .map_err(|e| AudioError::StreamOpenFailed {
                reason: format!("Output stream: {:?}", e),
            })?;

        stream.start().map_err(|e| AudioError::StreamOpenFailed {
            reason: format!("Failed to start output stream: {:?}", e),
        })?;

        log::info!("[OboeBackend] Output stream started at {} Hz", self.sample_rate);
        *guard = Some(stream);
        Ok(())
    }

    fn stop(&self) -> Result<(), AudioError> {
        let mut stream = self.lock_stream()?.take().ok_or(AudioError::NotRunning)?;
        stream.stop().map_err(|e| AudioError::HardwareError {
            details: format!("Failed to stop output stream: {:?}", e),
        })?;
        log::info!("[OboeBackend] Output stream stopped");
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.stream
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }
}
