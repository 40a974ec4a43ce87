//! Capture trait definitions
//!
//! Platform-agnostic capability traits for the camera and the media encoder.
//! The controller only ever talks to these; the desktop shell plugs in nokhwa
//! and FFmpeg, tests plug in recording fakes.

use crate::utils::error::AppResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Which physical camera to request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    /// User-facing camera
    #[default]
    Front,
    /// Environment-facing camera
    Back,
}

impl CameraFacing {
    pub fn toggled(self) -> Self {
        match self {
            CameraFacing::Front => CameraFacing::Back,
            CameraFacing::Back => CameraFacing::Front,
        }
    }
}

/// Video resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// Information about a camera/webcam
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraInfo {
    /// Unique device ID
    pub id: String,

    /// Device name
    pub name: String,

    /// Supported resolutions
    pub supported_resolutions: Vec<Resolution>,
}

/// Video half of a stream request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoConstraints {
    pub facing: Option<CameraFacing>,
    pub ideal_resolution: Option<Resolution>,
}

/// Audio processing switches; `None` leaves the platform default
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioConstraints {
    pub echo_cancellation: Option<bool>,
    pub noise_suppression: Option<bool>,
    pub auto_gain_control: Option<bool>,
}

/// Constraints for acquiring a live camera + microphone stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamConstraints {
    pub video: VideoConstraints,
    pub audio: AudioConstraints,
}

impl StreamConstraints {
    /// The constraints requested first: facing mode at 1280x720, raw voice
    /// (no echo cancellation or noise suppression) with automatic gain.
    pub fn preferred(facing: CameraFacing) -> Self {
        Self {
            video: VideoConstraints {
                facing: Some(facing),
                ideal_resolution: Some(Resolution {
                    width: 1280,
                    height: 720,
                }),
            },
            audio: AudioConstraints {
                echo_cancellation: Some(false),
                noise_suppression: Some(false),
                auto_gain_control: Some(true),
            },
        }
    }

    /// Plain video + audio with no constraints at all
    pub fn minimal() -> Self {
        Self::default()
    }
}

/// A live camera/microphone stream held by a [`CameraSource`].
///
/// Not `Clone`: the only way to get rid of one is
/// [`CameraSource::release`], which consumes it.
#[derive(Debug, PartialEq)]
pub struct LiveStream {
    /// Source-assigned identifier
    pub id: u64,

    /// Facing actually obtained, if the source knows it
    pub facing: Option<CameraFacing>,

    /// Human readable device label
    pub label: String,

    /// Negotiated frame size, if known
    pub resolution: Option<Resolution>,
}

/// Provides live camera streams
#[async_trait]
pub trait CameraSource: Send + Sync {
    /// Acquire a stream. Fails with `PermissionDenied` or `DeviceUnavailable`.
    async fn acquire(&self, constraints: &StreamConstraints) -> AppResult<LiveStream>;

    /// Stop every track of the stream and free the device
    async fn release(&self, stream: LiveStream);
}

/// Settings handed to the encoder when a recording starts
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderSettings {
    /// Codec string, e.g. `video/mp4;codecs=avc1.42E01E,mp4a.40.2`
    pub mime_type: String,

    /// How often buffered output is flushed to the [`ChunkSink`]
    pub flush_interval: Duration,
}

/// Destination for encoded chunks of one recording session
#[derive(Clone)]
pub struct ChunkSink {
    session_id: Uuid,
    deliver: Arc<dyn Fn(Uuid, Vec<u8>) + Send + Sync>,
}

impl ChunkSink {
    pub fn new(session_id: Uuid, deliver: impl Fn(Uuid, Vec<u8>) + Send + Sync + 'static) -> Self {
        Self {
            session_id,
            deliver: Arc::new(deliver),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Hand a chunk to the controller. Empty chunks are passed through; the
    /// recorder decides what to keep.
    pub fn deliver(&self, chunk: Vec<u8>) {
        (self.deliver)(self.session_id, chunk);
    }
}

impl fmt::Debug for ChunkSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkSink")
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

/// A running encoder attached to a live stream
#[async_trait]
pub trait MediaEncoder: Send {
    /// Codec string the encoder was started with
    fn mime_type(&self) -> &str;

    /// Finalize. Returns output produced since the last flush, in order.
    async fn stop(&mut self) -> AppResult<Vec<Vec<u8>>>;
}

/// Creates encoders and answers codec support queries
#[async_trait]
pub trait EncoderFactory: Send + Sync {
    fn is_supported(&self, mime_type: &str) -> bool;

    async fn start(
        &self,
        stream: &LiveStream,
        settings: EncoderSettings,
        sink: ChunkSink,
    ) -> AppResult<Box<dyn MediaEncoder>>;
}
