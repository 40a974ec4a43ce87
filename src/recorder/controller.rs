//! Recording controller
//!
//! Drives the Idle -> Recording -> Reviewing -> Idle lifecycle around one
//! encoder at a time. Calls that do not apply to the current state are
//! no-ops, never errors.

use super::codec::select_codec;
use super::review::ReviewHandle;
use super::state::{MediaBlob, RecorderState, RecordingSession, RecordingSummary};
use crate::capture::traits::{EncoderFactory, EncoderSettings, LiveStream, MediaEncoder};
use crate::utils::error::AppResult;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Codec preferences and flush interval for new sessions
#[derive(Debug, Clone)]
pub struct RecorderSettings {
    pub codec_preferences: Vec<String>,
    pub fallback_codec: String,
    pub flush_interval: Duration,
}

/// Finished recording awaiting discard or export
struct Review {
    blob: Arc<MediaBlob>,
    handle: Option<ReviewHandle>,
}

pub struct RecordingController {
    encoders: Arc<dyn EncoderFactory>,
    settings: RecorderSettings,
    state: RecorderState,
    session: Option<RecordingSession>,
    encoder: Option<Box<dyn MediaEncoder>>,
    review: Option<Review>,
}

impl RecordingController {
    pub fn new(encoders: Arc<dyn EncoderFactory>, settings: RecorderSettings) -> Self {
        Self {
            encoders,
            settings,
            state: RecorderState::Idle,
            session: None,
            encoder: None,
            review: None,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session.as_ref().map(|s| s.id)
    }

    pub fn chunk_count(&self) -> usize {
        self.session.as_ref().map_or(0, RecordingSession::chunk_count)
    }

    /// Codec a new session would use right now
    pub fn negotiate_codec(&self) -> String {
        select_codec(
            &self.settings.codec_preferences,
            &self.settings.fallback_codec,
            |candidate| self.encoders.is_supported(candidate),
        )
    }

    /// Start recording from `stream`.
    ///
    /// Returns `Ok(false)` without touching anything when there is no stream
    /// or a recording is already running. Starting from Reviewing releases
    /// the previous result once the new encoder is running; if the encoder
    /// fails to start, the previous result stays under review.
    pub async fn start(&mut self, stream: Option<&LiveStream>) -> AppResult<bool> {
        let Some(stream) = stream else {
            tracing::debug!("Ignoring start: no live camera stream");
            return Ok(false);
        };
        if self.state == RecorderState::Recording {
            tracing::debug!("Ignoring start: already recording");
            return Ok(false);
        }

        let mime_type = self.negotiate_codec();
        let session = RecordingSession::new(mime_type.clone());
        let settings = EncoderSettings {
            mime_type,
            flush_interval: self.settings.flush_interval,
        };

        let encoder = self.encoders.start(stream, settings, session.sink()).await?;

        self.release_review();
        tracing::info!(
            "Recording {} started ({}, stream {})",
            session.id,
            encoder.mime_type(),
            stream.id
        );
        self.session = Some(session);
        self.encoder = Some(encoder);
        self.state = RecorderState::Recording;
        Ok(true)
    }

    /// Stop recording and assemble the result. `None` when not recording.
    pub async fn stop(&mut self) -> Option<RecordingSummary> {
        if self.state != RecorderState::Recording {
            tracing::debug!("Ignoring stop: not recording");
            return None;
        }

        let session = self.session.take()?;

        // The session buffer stays open while the encoder drains, so output
        // it flushes from inside `stop` is kept ahead of the trailing chunks.
        if let Some(mut encoder) = self.encoder.take() {
            match encoder.stop().await {
                Ok(trailing) => {
                    for chunk in trailing {
                        session.push_chunk(chunk);
                    }
                }
                Err(e) => tracing::warn!("Encoder did not finish cleanly: {}", e),
            }
        }

        let blob = Arc::new(session.finish());
        let handle = match ReviewHandle::create(&blob) {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!("Could not write review file: {}", e);
                None
            }
        };

        let summary = RecordingSummary {
            session_id: blob.session_id,
            mime_type: blob.mime_type.clone(),
            size_bytes: blob.len(),
            duration_ms: blob.duration_ms,
            preview_path: handle.as_ref().map(|h| h.path().to_string_lossy().to_string()),
        };

        tracing::info!(
            "Recording {} stopped: {} bytes, {}ms",
            summary.session_id,
            summary.size_bytes,
            summary.duration_ms
        );

        self.review = Some(Review { blob, handle });
        self.state = RecorderState::Reviewing;
        Some(summary)
    }

    /// Drop the reviewed recording. Only valid while Reviewing.
    pub fn discard(&mut self) -> bool {
        if self.state != RecorderState::Reviewing {
            return false;
        }
        self.release_review();
        self.state = RecorderState::Idle;
        tracing::info!("Recording discarded");
        true
    }

    /// The reviewed recording, for export. State is unchanged.
    pub fn export_blob(&self) -> Option<Arc<MediaBlob>> {
        if self.state != RecorderState::Reviewing {
            return None;
        }
        self.review.as_ref().map(|r| r.blob.clone())
    }

    pub fn review_path(&self) -> Option<String> {
        self.review
            .as_ref()
            .and_then(|r| r.handle.as_ref())
            .map(|h| h.path().to_string_lossy().to_string())
    }

    fn release_review(&mut self) {
        if let Some(review) = self.review.take() {
            if let Some(handle) = review.handle {
                handle.release();
            }
        }
    }
}
