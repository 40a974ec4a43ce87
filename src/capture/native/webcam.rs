//! Native webcam capture using nokhwa
//!
//! Each acquired stream runs a capture thread that owns the `Camera` and
//! fans raw frames out over a broadcast channel. The FFmpeg encoder
//! subscribes to that channel while recording. The microphone is opened
//! alongside the camera and lives exactly as long as the stream.

use crate::capture::traits::{
    AudioConstraints, CameraFacing, CameraInfo, CameraSource, LiveStream, Resolution,
    StreamConstraints,
};
use super::microphone::{AudioSpec, MicrophoneCapture};
use super::preview::{self, PreviewThrottle, PREVIEW_INTERVAL};
use crate::utils::error::{AppError, AppResult};
use async_trait::async_trait;
use nokhwa::pixel_format::{RgbAFormat, RgbFormat};
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
    Resolution as NokhwaResolution,
};
use nokhwa::Camera;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, oneshot};

/// Frames buffered per subscriber before the oldest are dropped
const FRAME_BUFFER: usize = 8;

const PREVIEW_BUFFER: usize = 2;

const DEFAULT_FPS: u32 = 30;

/// Get list of available cameras
pub fn get_cameras() -> Vec<CameraInfo> {
    match nokhwa::query(ApiBackend::Auto) {
        Ok(cameras) => cameras
            .into_iter()
            .map(|info| CameraInfo {
                id: match info.index() {
                    CameraIndex::Index(i) => i.to_string(),
                    CameraIndex::String(s) => s.to_string(),
                },
                name: info.human_name().to_string(),
                supported_resolutions: vec![
                    Resolution { width: 1920, height: 1080 },
                    Resolution { width: 1280, height: 720 },
                    Resolution { width: 640, height: 480 },
                ],
            })
            .collect(),
        Err(e) => {
            tracing::warn!("Failed to enumerate cameras: {:?}", e);
            Vec::new()
        }
    }
}

/// Format of the frames a stream produces, as FFmpeg needs to know it
#[derive(Debug, Clone, Copy)]
pub struct FrameSpec {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub format: FrameFormat,
}

impl FrameSpec {
    /// FFmpeg input arguments for reading these frames from stdin
    pub fn input_args(&self) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();
        match self.format {
            FrameFormat::MJPEG => {
                args.extend(["-f", "mjpeg"].map(String::from));
            }
            other => {
                let pixel_format = match other {
                    FrameFormat::YUYV => "yuyv422",
                    FrameFormat::NV12 => "nv12",
                    FrameFormat::RAWRGB => "rgb24",
                    FrameFormat::GRAY => "gray",
                    _ => {
                        tracing::warn!("Unknown camera format {:?}, assuming yuyv422", other);
                        "yuyv422"
                    }
                };
                args.extend(["-f", "rawvideo", "-pixel_format", pixel_format].map(String::from));
                args.push("-video_size".to_string());
                args.push(format!("{}x{}", self.width, self.height));
            }
        }
        args.push("-framerate".to_string());
        args.push(self.fps.to_string());
        args.push("-i".to_string());
        args.push("-".to_string());
        args
    }
}

struct StreamEntry {
    running: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
    frames: broadcast::Sender<Arc<Vec<u8>>>,
    spec: FrameSpec,
    audio: Option<MicrophoneCapture>,
}

/// `CameraSource` backed by the platform camera through nokhwa
pub struct NokhwaCameraSource {
    next_id: AtomicU64,
    streams: Mutex<HashMap<u64, StreamEntry>>,
    preview: broadcast::Sender<Arc<Vec<u8>>>,
}

impl Default for NokhwaCameraSource {
    fn default() -> Self {
        let (preview, _) = broadcast::channel(PREVIEW_BUFFER);
        Self {
            next_id: AtomicU64::new(0),
            streams: Mutex::new(HashMap::new()),
            preview,
        }
    }
}

impl NokhwaCameraSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// JPEG preview frames of whichever stream is live
    pub fn subscribe_preview(&self) -> broadcast::Receiver<Arc<Vec<u8>>> {
        self.preview.subscribe()
    }

    /// Sample format and a sample receiver for a stream's microphone,
    /// `None` if the stream is video-only
    pub fn subscribe_audio(&self, stream_id: u64) -> Option<(AudioSpec, broadcast::Receiver<Arc<Vec<f32>>>)> {
        let streams = self.streams.lock();
        let audio = streams.get(&stream_id)?.audio.as_ref()?;
        Some((audio.spec(), audio.subscribe()))
    }

    /// Frame format and a frame receiver for a live stream
    pub fn subscribe(&self, stream_id: u64) -> Option<(FrameSpec, broadcast::Receiver<Arc<Vec<u8>>>)> {
        let streams = self.streams.lock();
        streams
            .get(&stream_id)
            .map(|entry| (entry.spec, entry.frames.subscribe()))
    }
}

/// Map a nokhwa error message onto the device error taxonomy
fn classify(message: &str) -> AppError {
    let lower = message.to_lowercase();
    if lower.contains("permission") || lower.contains("denied") || lower.contains("not authorized") {
        AppError::PermissionDenied(message.to_string())
    } else {
        AppError::DeviceUnavailable(message.to_string())
    }
}

/// Pick a device for the requested facing. Devices carry no facing
/// information on desktop: the first is treated as front, the second as back.
fn select_camera(facing: Option<CameraFacing>) -> AppResult<(CameraIndex, String)> {
    let cameras = nokhwa::query(ApiBackend::Auto).map_err(|e| classify(&e.to_string()))?;
    if cameras.is_empty() {
        return Err(AppError::DeviceUnavailable("No cameras found".to_string()));
    }

    let position = match facing {
        None | Some(CameraFacing::Front) => 0,
        Some(CameraFacing::Back) => 1,
    };
    cameras
        .get(position)
        .map(|info| (info.index().clone(), info.human_name().to_string()))
        .ok_or_else(|| AppError::DeviceUnavailable(format!("No {:?} camera", facing)))
}

/// JPEG bytes for the preview, reusing MJPEG frames as they are
fn preview_jpeg(frame: &nokhwa::Buffer) -> AppResult<Vec<u8>> {
    if frame.source_frame_format() == FrameFormat::MJPEG {
        return Ok(frame.buffer().to_vec());
    }
    let rgb = frame
        .decode_image::<RgbFormat>()
        .map_err(|e| AppError::Encoder(format!("Failed to decode preview frame: {}", e)))?;
    let (width, height) = (rgb.width(), rgb.height());
    preview::encode_jpeg(&rgb.into_raw(), width, height)
}

fn capture_loop(
    index: CameraIndex,
    ideal: Option<Resolution>,
    running: Arc<AtomicBool>,
    frames: broadcast::Sender<Arc<Vec<u8>>>,
    previews: broadcast::Sender<Arc<Vec<u8>>>,
    ready: oneshot::Sender<Result<FrameSpec, String>>,
) {
    let requested = match ideal {
        Some(res) => RequestedFormatType::Closest(CameraFormat::new(
            NokhwaResolution::new(res.width, res.height),
            FrameFormat::MJPEG,
            DEFAULT_FPS,
        )),
        None => RequestedFormatType::None,
    };
    let format = RequestedFormat::new::<RgbAFormat>(requested);

    let mut camera = match Camera::new(index.clone(), format) {
        Ok(c) => c,
        Err(e) => {
            let _ = ready.send(Err(format!("Failed to open camera {:?}: {}", index, e)));
            return;
        }
    };

    if let Err(e) = camera.open_stream() {
        let _ = ready.send(Err(format!("Failed to open camera stream: {}", e)));
        return;
    }

    let camera_format = camera.camera_format();
    let spec = FrameSpec {
        width: camera_format.resolution().width(),
        height: camera_format.resolution().height(),
        fps: camera_format.frame_rate(),
        format: camera_format.format(),
    };
    tracing::info!(
        "Webcam opened: {}x{} @ {}fps, format={:?}",
        spec.width,
        spec.height,
        spec.fps,
        spec.format
    );

    if ready.send(Ok(spec)).is_err() {
        // Acquirer went away before the stream was handed out
        let _ = camera.stop_stream();
        return;
    }

    let mut frame_count: u64 = 0;
    let mut throttle = PreviewThrottle::new(PREVIEW_INTERVAL);
    while running.load(Ordering::SeqCst) {
        // Blocks until the camera delivers the next frame
        match camera.frame() {
            Ok(frame) => {
                frame_count += 1;
                if frames.receiver_count() > 0 {
                    let _ = frames.send(Arc::new(frame.buffer().to_vec()));
                }
                if previews.receiver_count() > 0 && throttle.ready(Instant::now()) {
                    match preview_jpeg(&frame) {
                        Ok(jpeg) => {
                            let _ = previews.send(Arc::new(jpeg));
                        }
                        Err(e) => tracing::debug!("Skipping preview frame: {}", e),
                    }
                }
            }
            Err(e) => tracing::debug!("Failed to capture frame: {:?}", e),
        }
    }

    if let Err(e) = camera.stop_stream() {
        tracing::warn!("Error stopping camera stream: {:?}", e);
    }
    tracing::info!("Webcam capture thread stopped after {} frames", frame_count);
}

#[async_trait]
impl CameraSource for NokhwaCameraSource {
    async fn acquire(&self, constraints: &StreamConstraints) -> AppResult<LiveStream> {
        if constraints.audio != AudioConstraints::default() {
            tracing::debug!("Audio processing constraints are not applied by the native microphone backend");
        }

        let facing = constraints.video.facing;
        let (index, label) = select_camera(facing)?;
        let ideal = constraints.video.ideal_resolution;

        let running = Arc::new(AtomicBool::new(true));
        let (frames, _) = broadcast::channel(FRAME_BUFFER);
        let (ready_tx, ready_rx) = oneshot::channel();

        let thread = {
            let running = running.clone();
            let frames = frames.clone();
            let previews = self.preview.clone();
            std::thread::spawn(move || capture_loop(index, ideal, running, frames, previews, ready_tx))
        };

        match ready_rx.await {
            Ok(Ok(spec)) => {
                let audio = match MicrophoneCapture::open().await {
                    Ok(audio) => Some(audio),
                    Err(e) => {
                        tracing::warn!("Recording without audio: {}", e);
                        None
                    }
                };
                let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                self.streams.lock().insert(
                    id,
                    StreamEntry {
                        running,
                        thread: Some(thread),
                        frames,
                        spec,
                        audio,
                    },
                );
                Ok(LiveStream {
                    id,
                    facing,
                    label,
                    resolution: Some(Resolution {
                        width: spec.width,
                        height: spec.height,
                    }),
                })
            }
            Ok(Err(message)) => {
                let _ = tokio::task::spawn_blocking(move || thread.join()).await;
                Err(classify(&message))
            }
            Err(_) => Err(AppError::DeviceUnavailable(
                "Camera thread exited before opening the device".to_string(),
            )),
        }
    }

    async fn release(&self, stream: LiveStream) {
        let entry = self.streams.lock().remove(&stream.id);
        let Some(mut entry) = entry else {
            tracing::warn!("Release of unknown camera stream {}", stream.id);
            return;
        };

        entry.running.store(false, Ordering::SeqCst);
        if let Some(thread) = entry.thread.take() {
            if tokio::task::spawn_blocking(move || thread.join()).await.is_err() {
                tracing::warn!("Camera thread for stream {} did not shut down cleanly", stream.id);
            }
        }
        if let Some(audio) = entry.audio.take() {
            audio.close().await;
        }
        tracing::info!("Camera stream {} released", stream.id);
    }
}
