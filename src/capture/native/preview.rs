//! Live preview frames for the webview
//!
//! The capture thread turns a camera frame into a JPEG at most once per
//! preview interval; the desktop shell forwards it as a data URL.

use crate::utils::error::{AppError, AppResult};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use std::time::{Duration, Instant};

/// Event the preview data URLs are emitted on
pub const PREVIEW_EVENT: &str = "teleprompter://preview";

/// Roughly 15 preview frames a second
pub const PREVIEW_INTERVAL: Duration = Duration::from_millis(66);

const PREVIEW_QUALITY: u8 = 70;

/// Encode packed RGB8 pixels as JPEG
pub fn encode_jpeg(rgb: &[u8], width: u32, height: u32) -> AppResult<Vec<u8>> {
    let expected = width as usize * height as usize * 3;
    if rgb.len() != expected {
        return Err(AppError::Encoder(format!(
            "Preview frame has {} bytes, expected {} for {}x{}",
            rgb.len(),
            expected,
            width,
            height
        )));
    }

    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, PREVIEW_QUALITY)
        .encode(rgb, width, height, ExtendedColorType::Rgb8)
        .map_err(|e| AppError::Encoder(format!("Preview encode failed: {}", e)))?;
    Ok(out)
}

/// `data:` URL an `<img>` can show directly
pub fn data_url(jpeg: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", STANDARD.encode(jpeg))
}

/// Lets one frame through per interval
#[derive(Debug)]
pub struct PreviewThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl PreviewThrottle {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}
