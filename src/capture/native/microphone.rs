//! Microphone capture using cpal
//!
//! The cpal stream is owned by a dedicated thread for its whole life and
//! samples are fanned out as interleaved f32 over a broadcast channel.

use crate::utils::error::{AppError, AppResult};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};

/// Sample buffers kept per subscriber before the oldest are dropped
const SAMPLE_BUFFER: usize = 64;

/// Names of the available microphones
pub fn get_microphones() -> Vec<String> {
    let host = cpal::default_host();
    match host.input_devices() {
        Ok(devices) => devices.filter_map(|d| d.name().ok()).collect(),
        Err(e) => {
            tracing::warn!("Failed to enumerate microphones: {}", e);
            Vec::new()
        }
    }
}

/// Format of the samples a microphone produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSpec {
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioSpec {
    /// FFmpeg input arguments for reading these samples from `url`
    pub fn input_args(&self, url: &str) -> Vec<String> {
        vec![
            "-thread_queue_size".to_string(),
            "1024".to_string(),
            "-f".to_string(),
            "f32le".to_string(),
            "-ar".to_string(),
            self.sample_rate.to_string(),
            "-ac".to_string(),
            self.channels.to_string(),
            "-i".to_string(),
            url.to_string(),
        ]
    }
}

/// A running microphone stream
pub struct MicrophoneCapture {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    samples: broadcast::Sender<Arc<Vec<f32>>>,
    spec: AudioSpec,
    label: String,
}

impl MicrophoneCapture {
    /// Open the default input device
    pub async fn open() -> AppResult<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let (samples, _) = broadcast::channel(SAMPLE_BUFFER);
        let (ready_tx, ready_rx) = oneshot::channel();

        let thread = {
            let running = running.clone();
            let samples = samples.clone();
            std::thread::spawn(move || capture_loop(running, samples, ready_tx))
        };

        match ready_rx.await {
            Ok(Ok((spec, label))) => {
                tracing::info!(
                    "Microphone opened: {} ({}Hz, {}ch)",
                    label,
                    spec.sample_rate,
                    spec.channels
                );
                Ok(Self {
                    running,
                    thread: Some(thread),
                    samples,
                    spec,
                    label,
                })
            }
            Ok(Err(message)) => {
                let _ = tokio::task::spawn_blocking(move || thread.join()).await;
                Err(AppError::DeviceUnavailable(message))
            }
            Err(_) => Err(AppError::DeviceUnavailable(
                "Microphone thread exited before opening the device".to_string(),
            )),
        }
    }

    pub fn spec(&self) -> AudioSpec {
        self.spec
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Vec<f32>>> {
        self.samples.subscribe()
    }

    /// Stop the stream and wait for its thread
    pub async fn close(mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if tokio::task::spawn_blocking(move || thread.join()).await.is_err() {
                tracing::warn!("Microphone thread did not shut down cleanly");
            }
        }
        tracing::info!("Microphone closed: {}", self.label);
    }
}

impl Drop for MicrophoneCapture {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

fn forward(samples: &broadcast::Sender<Arc<Vec<f32>>>, convert: impl FnOnce() -> Vec<f32>) {
    if samples.receiver_count() > 0 {
        let _ = samples.send(Arc::new(convert()));
    }
}

fn build_stream(
    device: &cpal::Device,
    config: &cpal::SupportedStreamConfig,
    samples: broadcast::Sender<Arc<Vec<f32>>>,
) -> Result<Stream, String> {
    let stream_config = config.config();
    let on_error = |e: StreamError| tracing::error!("Microphone stream error: {}", e);

    let stream = match config.sample_format() {
        SampleFormat::F32 => device.build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| forward(&samples, || data.to_vec()),
            on_error,
            None,
        ),
        SampleFormat::I16 => device.build_input_stream(
            &stream_config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                forward(&samples, || data.iter().map(|&s| s as f32 / i16::MAX as f32).collect())
            },
            on_error,
            None,
        ),
        SampleFormat::U16 => device.build_input_stream(
            &stream_config,
            move |data: &[u16], _: &cpal::InputCallbackInfo| {
                forward(&samples, || data.iter().map(|&s| (s as f32 - 32768.0) / 32768.0).collect())
            },
            on_error,
            None,
        ),
        other => return Err(format!("Unsupported microphone sample format {:?}", other)),
    };
    stream.map_err(|e| format!("Failed to build microphone stream: {}", e))
}

fn capture_loop(
    running: Arc<AtomicBool>,
    samples: broadcast::Sender<Arc<Vec<f32>>>,
    ready: oneshot::Sender<Result<(AudioSpec, String), String>>,
) {
    let host = cpal::default_host();
    let Some(device) = host.default_input_device() else {
        let _ = ready.send(Err("No microphone found".to_string()));
        return;
    };
    let label = device.name().unwrap_or_else(|_| "Unknown".to_string());

    let config = match device.default_input_config() {
        Ok(config) => config,
        Err(e) => {
            let _ = ready.send(Err(format!("Failed to get microphone config: {}", e)));
            return;
        }
    };
    let spec = AudioSpec {
        sample_rate: config.sample_rate().0,
        channels: config.channels(),
    };

    let stream = match build_stream(&device, &config, samples) {
        Ok(stream) => stream,
        Err(message) => {
            let _ = ready.send(Err(message));
            return;
        }
    };
    if let Err(e) = stream.play() {
        let _ = ready.send(Err(format!("Failed to start microphone stream: {}", e)));
        return;
    }

    if ready.send(Ok((spec, label))).is_err() {
        return;
    }

    // Keep the stream alive while the camera session is
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
    }
    drop(stream);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_input_args() {
        let spec = AudioSpec {
            sample_rate: 48000,
            channels: 2,
        };
        let args = spec.input_args("tcp://127.0.0.1:5000");
        let joined = args.join(" ");
        assert!(joined.contains("-f f32le -ar 48000 -ac 2 -i tcp://127.0.0.1:5000"));
    }
}
