//! CPAL-based audio backend for desktop platforms (Linux, macOS, Windows)
//!
//! `cpal::Stream` is not `Send` on every host, so the stream is created,
//! played and dropped on a dedicated thread. The backend only keeps the
//! channel used to tell that thread to shut down.

use std::sync::mpsc;
use std::sync::{Mutex, MutexGuard};
use std::thread::JoinHandle;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};

use crate::audio::OutputRenderer;
use crate::error::{log_audio_error, AudioError};

use super::AudioBackend;

/// Scratch size when the device does not report a buffer range
const DEFAULT_SCRATCH_FRAMES: usize = 4096;
/// Upper bound on the scratch buffer; larger callbacks render in chunks
const MAX_SCRATCH_FRAMES: usize = 16_384;

struct StreamWorker {
    stop_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

/// Output backend on the default cpal device.
#[derive(Default)]
pub struct CpalBackend {
    worker: Mutex<Option<StreamWorker>>,
}

impl CpalBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_worker(&self) -> Result<MutexGuard<'_, Option<StreamWorker>>, AudioError> {
        self.worker.lock().map_err(|_| AudioError::LockPoisoned {
            component: "cpal_worker".to_string(),
        })
    }
}

impl AudioBackend for CpalBackend {
    fn start(&self, renderer: OutputRenderer) -> Result<(), AudioError> {
        let mut guard = self.lock_worker()?;
        if guard.is_some() {
            return Err(AudioError::StreamOpenFailed {
                reason: "output stream already open".to_string(),
            });
        }

        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), AudioError>>();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = std::thread::Builder::new()
            .name("echo-audio-out".to_string())
            .spawn(move || {
                let stream = match open_output_stream(renderer) {
                    Ok(stream) => stream,
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };

                if let Err(err) = stream.play() {
                    let _ = ready_tx.send(Err(AudioError::StreamOpenFailed {
                        reason: format!("Failed to start output stream: {:?}", err),
                    }));
                    return;
                }

                let _ = ready_tx.send(Ok(()));
                // Park until stop() or the backend is dropped.
                let _ = stop_rx.recv();
                drop(stream);
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                log::info!("[CpalBackend] Output stream started");
                *guard = Some(StreamWorker { stop_tx, handle });
                Ok(())
            }
            Ok(Err(err)) => {
                let _ = handle.join();
                log_audio_error(&err, "cpal_start");
                Err(err)
            }
            Err(_) => {
                let _ = handle.join();
                Err(AudioError::StreamOpenFailed {
                    reason: "audio thread exited during startup".to_string(),
                })
            }
        }
    }

    fn stop(&self) -> Result<(), AudioError> {
        let worker = self.lock_worker()?.take().ok_or(AudioError::NotRunning)?;
        let _ = worker.stop_tx.send(());
        worker.handle.join().map_err(|_| AudioError::HardwareError {
            details: "audio thread panicked".to_string(),
        })?;
        log::info!("[CpalBackend] Output stream stopped");
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.worker
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }
}

impl Drop for CpalBackend {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.worker.lock() {
            if let Some(worker) = guard.take() {
                let _ = worker.stop_tx.send(());
                let _ = worker.handle.join();
            }
        }
    }
}

fn open_output_stream(mut renderer: OutputRenderer) -> Result<cpal::Stream, AudioError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| AudioError::StreamOpenFailed {
            reason: "No default output device found".to_string(),
        })?;

    let config = device
        .default_output_config()
        .map_err(|e| AudioError::StreamOpenFailed {
            reason: format!("Failed to get default output config: {:?}", e),
        })?;

    let sample_format = config.sample_format();
    let frames = scratch_frames(config.buffer_size());
    let stream_config: cpal::StreamConfig = config.into();
    renderer.prepare(stream_config.sample_rate.0);

    let scratch = vec![0.0f32; frames];
    match sample_format {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, renderer, scratch),
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, renderer, scratch),
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, renderer, scratch),
        other => Err(AudioError::StreamOpenFailed {
            reason: format!("Unsupported sample format: {:?}", other),
        }),
    }
}

/// Mono scratch length for the device's reported callback size.
fn scratch_frames(buffer_size: &cpal::SupportedBufferSize) -> usize {
    match buffer_size {
        cpal::SupportedBufferSize::Range { max, .. } => {
            (*max as usize).clamp(DEFAULT_SCRATCH_FRAMES, MAX_SCRATCH_FRAMES)
        }
        cpal::SupportedBufferSize::Unknown => DEFAULT_SCRATCH_FRAMES,
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut renderer: OutputRenderer,
    mut mono: Vec<f32>,
) -> Result<cpal::Stream, AudioError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = (config.channels as usize).max(1);
    let chunk_samples = mono.len() * channels;

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                // Render in scratch-sized chunks; the callback never resizes.
                for chunk in data.chunks_mut(chunk_samples) {
                    let block = &mut mono[..chunk.len() / channels];
                    renderer.render(block);

                    // Duplicate the mono signal onto every channel
                    for (frame, &value) in chunk.chunks_mut(channels).zip(block.iter()) {
                        let sample = T::from_sample(value);
                        for slot in frame.iter_mut() {
                            *slot = sample;
                        }
                    }
                }
            },
            |err| log::error!("[CpalBackend] Output stream error: {}", err),
            None,
        )
        .map_err(|e| AudioError::StreamOpenFailed {
            reason: format!("Failed to build output stream: {:?}", e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_follows_reported_buffer_size() {
        assert_eq!(
            scratch_frames(&cpal::SupportedBufferSize::Unknown),
            DEFAULT_SCRATCH_FRAMES
        );
        assert_eq!(
            scratch_frames(&cpal::SupportedBufferSize::Range { min: 64, max: 8_192 }),
            8_192
        );
        assert_eq!(
            scratch_frames(&cpal::SupportedBufferSize::Range { min: 16, max: 256 }),
            DEFAULT_SCRATCH_FRAMES
        );
        assert_eq!(
            scratch_frames(&cpal::SupportedBufferSize::Range {
                min: 64,
                max: u32::MAX
            }),
            MAX_SCRATCH_FRAMES
        );
    }
}
