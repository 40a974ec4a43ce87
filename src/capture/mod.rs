//! Camera capture and encoding
//!
//! Capability traits plus the camera manager. The native nokhwa/FFmpeg
//! backend is only built with the `desktop` feature.

pub mod camera;
pub mod traits;

#[cfg(feature = "desktop")]
pub mod native;

pub use camera::{acquire_with_fallback, AcquireOutcome, AcquireRequest, CameraManager};
pub use traits::{
    AudioConstraints, CameraFacing, CameraInfo, CameraSource, ChunkSink, EncoderFactory,
    EncoderSettings, LiveStream, MediaEncoder, Resolution, StreamConstraints, VideoConstraints,
};
