//! System-related Tauri commands

use crate::capture::native::{get_cameras, get_microphones};
use crate::capture::traits::CameraInfo;
use serde::{Deserialize, Serialize};

/// System information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub arch: String,
    pub app_version: String,
    pub cameras: Vec<CameraInfo>,
    pub microphones: Vec<String>,
}

/// Get basic system information, including the devices the app can use
#[tauri::command]
pub async fn get_system_info() -> Result<SystemInfo, String> {
    let cameras = tokio::task::spawn_blocking(get_cameras)
        .await
        .map_err(|e| format!("Camera enumeration failed: {}", e))?;
    let microphones = tokio::task::spawn_blocking(get_microphones)
        .await
        .map_err(|e| format!("Microphone enumeration failed: {}", e))?;

    Ok(SystemInfo {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        app_version: env!("CARGO_PKG_VERSION").to_string(),
        cameras,
        microphones,
    })
}
