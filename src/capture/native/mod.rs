//! Native capture backend (desktop)
//!
//! nokhwa for the camera, cpal for the microphone, an FFmpeg subprocess
//! for encoding.

pub mod encoder;
pub mod microphone;
pub mod preview;
pub mod webcam;

pub use encoder::FfmpegEncoderFactory;
pub use microphone::get_microphones;
pub use webcam::{get_cameras, NokhwaCameraSource};
