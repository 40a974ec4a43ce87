//! FFmpeg encoder for webcam recordings
//!
//! Raw camera frames are piped into an FFmpeg process that writes a
//! streamable (fragmented) container to stdout. Microphone samples reach
//! FFmpeg as a second input over a loopback TCP socket. Output is collected
//! and handed to the chunk sink once per flush interval while recording.

use super::microphone::AudioSpec;
use super::webcam::NokhwaCameraSource;
use crate::capture::traits::{ChunkSink, EncoderFactory, EncoderSettings, LiveStream, MediaEncoder};
use crate::recorder::codec;
use crate::utils::error::{AppError, AppResult};
use async_trait::async_trait;
use std::io::{ErrorKind, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

/// FFmpeg output arguments for a codec string, `None` if we can't produce it
pub fn output_args(mime_type: &str) -> Option<Vec<String>> {
    let codecs = codec::codecs(mime_type);
    let args: &[&str] = match codec::container(mime_type) {
        "video/mp4" => {
            if !codecs.iter().all(|c| c.starts_with("avc1") || c.starts_with("mp4a")) {
                return None;
            }
            &[
                "-c:v",
                "libx264",
                "-preset",
                "veryfast",
                "-pix_fmt",
                "yuv420p",
                "-movflags",
                "frag_keyframe+empty_moov+default_base_moof",
                "-f",
                "mp4",
            ]
        }
        "video/webm" => {
            if !codecs.iter().all(|c| matches!(*c, "vp8" | "vp9" | "opus" | "vorbis")) {
                return None;
            }
            if codecs.contains(&"vp8") {
                &["-c:v", "libvpx", "-deadline", "realtime", "-pix_fmt", "yuv420p", "-f", "webm"]
            } else {
                &["-c:v", "libvpx-vp9", "-deadline", "realtime", "-cpu-used", "8", "-pix_fmt", "yuv420p", "-f", "webm"]
            }
        }
        _ => return None,
    };
    Some(args.iter().map(|a| a.to_string()).collect())
}

/// FFmpeg audio encoder arguments for the container of a codec string
pub fn audio_args(mime_type: &str) -> Vec<String> {
    let args: &[&str] = match codec::container(mime_type) {
        "video/mp4" => &["-c:a", "aac", "-b:a", "128k"],
        _ => &["-c:a", "libopus", "-b:a", "96k"],
    };
    args.iter().map(|a| a.to_string()).collect()
}

/// Creates FFmpeg encoders fed from nokhwa streams
pub struct FfmpegEncoderFactory {
    cameras: Arc<NokhwaCameraSource>,
    ffmpeg_available: OnceLock<bool>,
}

impl FfmpegEncoderFactory {
    pub fn new(cameras: Arc<NokhwaCameraSource>) -> Self {
        Self {
            cameras,
            ffmpeg_available: OnceLock::new(),
        }
    }

    fn ffmpeg_available(&self) -> bool {
        *self.ffmpeg_available.get_or_init(|| {
            let available = Command::new("ffmpeg").arg("-version").output().is_ok();
            if !available {
                tracing::warn!("FFmpeg not found; recordings need FFmpeg on PATH");
            }
            available
        })
    }
}

#[async_trait]
impl EncoderFactory for FfmpegEncoderFactory {
    fn is_supported(&self, mime_type: &str) -> bool {
        self.ffmpeg_available() && output_args(mime_type).is_some()
    }

    async fn start(
        &self,
        stream: &LiveStream,
        settings: EncoderSettings,
        sink: ChunkSink,
    ) -> AppResult<Box<dyn MediaEncoder>> {
        let (spec, frames) = self
            .cameras
            .subscribe(stream.id)
            .ok_or_else(|| AppError::Encoder(format!("Camera stream {} is not live", stream.id)))?;
        let output = output_args(&settings.mime_type)
            .ok_or_else(|| AppError::UnsupportedCodec(settings.mime_type.clone()))?;

        let mut command = Command::new("ffmpeg");
        command
            .args(["-hide_banner", "-loglevel", "error", "-y"])
            .args(spec.input_args());

        let audio = match self.cameras.subscribe_audio(stream.id) {
            Some((audio_spec, samples)) => {
                let listener = TcpListener::bind("127.0.0.1:0")?;
                listener.set_nonblocking(true)?;
                let url = format!("tcp://{}", listener.local_addr()?);
                command
                    .args(audio_spec.input_args(&url))
                    .args(["-map", "0:v", "-map", "1:a"])
                    .args(audio_args(&settings.mime_type));
                Some((audio_spec, samples, listener))
            }
            None => {
                tracing::info!("Stream {} has no microphone, recording video only", stream.id);
                None
            }
        };

        let mut child = command
            .args(&output)
            .arg("pipe:1")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| AppError::Encoder(format!("Failed to start FFmpeg: {}", e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AppError::Encoder("FFmpeg stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AppError::Encoder("FFmpeg stdout unavailable".to_string()))?;

        let running = Arc::new(AtomicBool::new(true));
        let writer = {
            let running = running.clone();
            std::thread::spawn(move || write_frames(frames, stdin, running))
        };
        let audio_writer = audio.map(|(audio_spec, samples, listener)| {
            let running = running.clone();
            std::thread::spawn(move || write_samples(samples, listener, audio_spec, running))
        });
        let flush_interval = settings.flush_interval;
        let reader = {
            let running = running.clone();
            std::thread::spawn(move || read_output(stdout, flush_interval, sink, running))
        };

        tracing::info!(
            "Started FFmpeg encoder: {}x{} @ {}fps{} -> {}",
            spec.width,
            spec.height,
            spec.fps,
            if audio_writer.is_some() { " with audio" } else { "" },
            settings.mime_type
        );

        Ok(Box::new(FfmpegEncoder {
            mime_type: settings.mime_type,
            running,
            child: Some(child),
            writer: Some(writer),
            audio_writer,
            reader: Some(reader),
        }))
    }
}

fn write_frames(
    mut frames: broadcast::Receiver<Arc<Vec<u8>>>,
    mut stdin: ChildStdin,
    running: Arc<AtomicBool>,
) {
    let mut written: u64 = 0;
    while running.load(Ordering::SeqCst) {
        match frames.blocking_recv() {
            Ok(frame) => {
                if let Err(e) = stdin.write_all(&frame) {
                    tracing::warn!("FFmpeg stopped accepting frames: {}", e);
                    break;
                }
                written += 1;
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!("Encoder fell behind, skipped {} frames", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    // Dropping stdin signals EOF to FFmpeg
    tracing::debug!("Encoder wrote {} frames", written);
}

/// Wait for FFmpeg to connect to the audio socket, then stream samples to
/// it as f32 little-endian until stopped. Closing the socket ends the input.
fn write_samples(
    mut samples: broadcast::Receiver<Arc<Vec<f32>>>,
    listener: TcpListener,
    spec: AudioSpec,
    running: Arc<AtomicBool>,
) {
    let Some(mut socket) = accept_while_running(&listener, &running) else {
        tracing::warn!("FFmpeg never connected to the audio input");
        return;
    };
    if let Err(e) = socket.set_nonblocking(false) {
        tracing::warn!("Failed to configure audio socket: {}", e);
        return;
    }

    let mut written: u64 = 0;
    let mut bytes = Vec::new();
    while running.load(Ordering::SeqCst) {
        match samples.blocking_recv() {
            Ok(buffer) => {
                bytes.clear();
                bytes.extend(buffer.iter().flat_map(|s| s.to_le_bytes()));
                if let Err(e) = socket.write_all(&bytes) {
                    tracing::warn!("FFmpeg stopped accepting audio: {}", e);
                    break;
                }
                written += buffer.len() as u64;
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!("Audio writer fell behind, skipped {} buffers", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    tracing::debug!(
        "Encoder wrote {:.1}s of audio",
        written as f64 / (spec.sample_rate as f64 * spec.channels.max(1) as f64)
    );
}

fn accept_while_running(listener: &TcpListener, running: &AtomicBool) -> Option<TcpStream> {
    while running.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((socket, _)) => return Some(socket),
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(20));
            }
            Err(e) => {
                tracing::warn!("Audio input accept failed: {}", e);
                return None;
            }
        }
    }
    None
}

/// Forward FFmpeg output to the sink once per flush interval while
/// recording. Everything read after the last flush, including what FFmpeg
/// writes while finishing, is returned instead of delivered.
fn read_output(
    mut stdout: impl Read,
    flush_interval: Duration,
    sink: ChunkSink,
    running: Arc<AtomicBool>,
) -> Vec<u8> {
    let mut pending = Vec::new();
    let mut buf = vec![0u8; 64 * 1024];
    let mut last_flush = Instant::now();

    loop {
        match stdout.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                pending.extend_from_slice(&buf[..n]);
                if running.load(Ordering::SeqCst) && last_flush.elapsed() >= flush_interval {
                    sink.deliver(std::mem::take(&mut pending));
                    last_flush = Instant::now();
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::warn!("Failed reading FFmpeg output: {}", e);
                break;
            }
        }
    }
    pending
}

pub struct FfmpegEncoder {
    mime_type: String,
    running: Arc<AtomicBool>,
    child: Option<Child>,
    writer: Option<JoinHandle<()>>,
    audio_writer: Option<JoinHandle<()>>,
    reader: Option<JoinHandle<Vec<u8>>>,
}

#[async_trait]
impl MediaEncoder for FfmpegEncoder {
    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    async fn stop(&mut self) -> AppResult<Vec<Vec<u8>>> {
        self.running.store(false, Ordering::SeqCst);
        let writer = self.writer.take();
        let audio_writer = self.audio_writer.take();
        let reader = self.reader.take();
        let child = self.child.take();

        tokio::task::spawn_blocking(move || -> AppResult<Vec<Vec<u8>>> {
            if let Some(writer) = writer {
                if writer.join().is_err() {
                    tracing::warn!("Encoder writer thread panicked");
                }
            }
            if let Some(audio_writer) = audio_writer {
                if audio_writer.join().is_err() {
                    tracing::warn!("Encoder audio writer thread panicked");
                }
            }
            let trailing = match reader {
                Some(reader) => reader
                    .join()
                    .map_err(|_| AppError::Encoder("Encoder reader thread panicked".to_string()))?,
                None => Vec::new(),
            };
            if let Some(mut child) = child {
                let status = child.wait()?;
                if !status.success() {
                    tracing::warn!("FFmpeg exited with status {}", status);
                }
            }
            tracing::info!("FFmpeg encoder finished");
            Ok(if trailing.is_empty() { Vec::new() } else { vec![trailing] })
        })
        .await
        .map_err(|e| AppError::Encoder(format!("Encoder shutdown task failed: {}", e)))?
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(child) = self.child.as_mut() {
            let _ = child.kill();
        }
    }
}
