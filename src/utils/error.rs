//! Error types and handling
//!
//! Common error types used across the teleprompter. No error here is fatal:
//! callers degrade functionality (fallback constraints, default codec,
//! download instead of share) rather than ending the session.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(String),

    #[error("Encoder error: {0}")]
    Encoder(String),

    #[error("Share failed: {0}")]
    ShareFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Whether this error came from acquiring a camera/microphone.
    pub fn is_device_error(&self) -> bool {
        matches!(self, AppError::PermissionDenied(_) | AppError::DeviceUnavailable(_))
    }
}

/// Error response for frontend
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        let code = match &error {
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::PermissionDenied(_) => "PERMISSION_DENIED",
            AppError::DeviceUnavailable(_) => "DEVICE_UNAVAILABLE",
            AppError::UnsupportedCodec(_) => "UNSUPPORTED_CODEC",
            AppError::Encoder(_) => "ENCODER_ERROR",
            AppError::ShareFailed(_) => "SHARE_FAILED",
            AppError::Config(_) => "CONFIG_ERROR",
        };

        ErrorResponse {
            code: code.to_string(),
            message: error.to_string(),
        }
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
