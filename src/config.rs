//! Teleprompter configuration
//!
//! `DisplayConfig` is the user-facing overlay configuration mutated through the
//! settings surface. `TeleprompterConfig` holds the read-only startup tuning
//! (scroll rates, codec preferences, share metadata), optionally loaded from a
//! JSON file named by `TELEPROMPTER_CONFIG`.

use crate::utils::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable naming an optional JSON config file
pub const CONFIG_ENV_VAR: &str = "TELEPROMPTER_CONFIG";

pub const MIN_FONT_SIZE: u32 = 12;
pub const MAX_FONT_SIZE: u32 = 120;
pub const MIN_SCROLL_SPEED: f64 = 1.0;
pub const MAX_SCROLL_SPEED: f64 = 10.0;

const DEFAULT_SCRIPT: &str = "Welcome to your teleprompter.\n\n\
Paste or type your script here. Press play to start scrolling, \
or drag the text to move through it at your own pace.\n\n\
Press record to capture yourself reading. Scrolling starts with the recording \
and stops when the recording ends.";

// =============================================================================
// Display configuration
// =============================================================================

/// Overlay appearance and scroll speed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisplayConfig {
    /// Font size in pixels
    pub font_size: u32,

    /// CSS-style hex color of the script text
    pub text_color: String,

    /// Speed multiplier, slider range 1..=10
    pub scroll_speed: f64,

    /// Opacity of the dark overlay behind the text, in [0, 1]
    pub overlay_opacity: f64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            font_size: 32,
            text_color: "#ffffff".to_string(),
            scroll_speed: 2.0,
            overlay_opacity: 0.5,
        }
    }
}

impl DisplayConfig {
    pub fn set_font_size(&mut self, px: u32) {
        self.font_size = px.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
    }

    /// Set the text color. Returns false (leaving the color unchanged) for
    /// anything other than `#rgb` or `#rrggbb`.
    pub fn set_text_color(&mut self, color: &str) -> bool {
        if !is_hex_color(color) {
            tracing::warn!("Ignoring invalid text color {:?}", color);
            return false;
        }
        self.text_color = color.to_ascii_lowercase();
        true
    }

    pub fn set_scroll_speed(&mut self, speed: f64) {
        if !speed.is_finite() {
            tracing::warn!("Ignoring non-finite scroll speed");
            return;
        }
        self.scroll_speed = speed.clamp(MIN_SCROLL_SPEED, MAX_SCROLL_SPEED);
    }

    pub fn set_overlay_opacity(&mut self, opacity: f64) {
        if !opacity.is_finite() {
            tracing::warn!("Ignoring non-finite overlay opacity");
            return;
        }
        self.overlay_opacity = opacity.clamp(0.0, 1.0);
    }
}

fn is_hex_color(value: &str) -> bool {
    match value.strip_prefix('#') {
        Some(hex) => (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

// =============================================================================
// Startup configuration
// =============================================================================

/// Startup tuning for the controller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeleprompterConfig {
    /// Initial overlay configuration
    pub display: DisplayConfig,

    /// Initial script text
    pub script: String,

    /// Pixels advanced per frame per unit of scroll speed
    pub base_rate: f64,

    /// Multiplier applied to pointer displacement while dragging
    pub drag_sensitivity: f64,

    /// Frame scheduler period in milliseconds
    pub frame_interval_ms: u64,

    /// Encoder flush interval in milliseconds
    pub flush_interval_ms: u64,

    /// Ordered codec preference list
    pub codec_preferences: Vec<String>,

    /// Codec used when none of the preferences is supported
    pub fallback_codec: String,

    /// Link shared by the "share app" action
    pub share_url: String,

    pub share_title: String,

    pub share_text: String,
}

impl Default for TeleprompterConfig {
    fn default() -> Self {
        Self {
            display: DisplayConfig::default(),
            script: DEFAULT_SCRIPT.to_string(),
            base_rate: 0.5,
            drag_sensitivity: 1.0,
            frame_interval_ms: 16,
            flush_interval_ms: 1000,
            codec_preferences: crate::recorder::codec::DEFAULT_CODEC_PREFERENCES
                .iter()
                .map(|c| c.to_string())
                .collect(),
            fallback_codec: crate::recorder::codec::FALLBACK_CODEC.to_string(),
            share_url: "https://teleprompter.app".to_string(),
            share_title: "Camera Teleprompter".to_string(),
            share_text: "Record yourself reading a script with this camera teleprompter.".to_string(),
        }
    }
}

impl TeleprompterConfig {
    /// Parse a config from JSON, filling missing fields with defaults
    pub fn from_json(json: &str) -> AppResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a config file from disk
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_json(&content)?;
        tracing::debug!("Loaded teleprompter config from {:?}", path);
        Ok(config)
    }

    /// Load from `TELEPROMPTER_CONFIG` if set, otherwise use defaults
    pub fn from_env() -> AppResult<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> AppResult<()> {
        if !(self.base_rate.is_finite() && self.base_rate > 0.0) {
            return Err(AppError::Config("baseRate must be a positive number".to_string()));
        }
        if !(self.drag_sensitivity.is_finite() && self.drag_sensitivity > 0.0) {
            return Err(AppError::Config("dragSensitivity must be a positive number".to_string()));
        }
        if self.frame_interval_ms == 0 {
            return Err(AppError::Config("frameIntervalMs must be non-zero".to_string()));
        }
        if self.flush_interval_ms == 0 {
            return Err(AppError::Config("flushIntervalMs must be non-zero".to_string()));
        }
        if self.fallback_codec.trim().is_empty() {
            return Err(AppError::Config("fallbackCodec must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_display_setters_respect_slider_bounds() {
        let mut display = DisplayConfig::default();

        display.set_font_size(4);
        assert_eq!(display.font_size, MIN_FONT_SIZE);

        display.set_scroll_speed(42.0);
        assert_eq!(display.scroll_speed, MAX_SCROLL_SPEED);

        display.set_overlay_opacity(-0.3);
        assert_eq!(display.overlay_opacity, 0.0);

        display.set_overlay_opacity(f64::NAN);
        assert_eq!(display.overlay_opacity, 0.0);
    }

    #[test]
    fn test_text_color_validation() {
        let mut display = DisplayConfig::default();
        assert!(display.set_text_color("#FFCC00"));
        assert_eq!(display.text_color, "#ffcc00");

        assert!(!display.set_text_color("yellow"));
        assert!(!display.set_text_color("#12345"));
        assert_eq!(display.text_color, "#ffcc00");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = TeleprompterConfig::from_json(r#"{"baseRate": 0.8, "display": {"fontSize": 48}}"#).unwrap();
        assert_eq!(config.base_rate, 0.8);
        assert_eq!(config.display.font_size, 48);
        assert_eq!(config.display.text_color, "#ffffff");
        assert_eq!(config.flush_interval_ms, 1000);
        assert_eq!(config.fallback_codec, "video/webm");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = TeleprompterConfig::from_json(r#"{"baseRate": 0}"#).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));

        let err = TeleprompterConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, AppError::Serialization(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("teleprompter.json");
        std::fs::write(&path, r#"{"dragSensitivity": 2.0}"#).unwrap();

        let config = TeleprompterConfig::load(&path).unwrap();
        assert_eq!(config.drag_sensitivity, 2.0);
    }
}
