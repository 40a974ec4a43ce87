//! Desktop share surface
//!
//! Desktop webviews have no share sheet, so file and link shares report
//! failure and the callers fall back to saving into Downloads or copying
//! the link to the clipboard.

use super::{ShareLink, ShareSurface};
use crate::utils::error::{AppError, AppResult};
use async_trait::async_trait;
use std::path::PathBuf;
use tauri::{AppHandle, Emitter, Manager};
use tauri_plugin_clipboard_manager::ClipboardExt;

/// Event carrying short user-facing messages
pub const NOTICE_EVENT: &str = "teleprompter://notice";

pub struct DesktopShareSurface {
    app: AppHandle,
}

impl DesktopShareSurface {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

#[async_trait]
impl ShareSurface for DesktopShareSurface {
    fn can_share_files(&self) -> bool {
        false
    }

    async fn share_file(&self, file_name: &str, _mime_type: &str, _data: &[u8], _title: &str) -> AppResult<()> {
        Err(AppError::ShareFailed(format!(
            "No share sheet available for {}",
            file_name
        )))
    }

    async fn share_link(&self, link: &ShareLink) -> AppResult<()> {
        Err(AppError::ShareFailed(format!("No share sheet available for {}", link.url)))
    }

    async fn copy_to_clipboard(&self, text: &str) -> AppResult<()> {
        self.app
            .clipboard()
            .write_text(text.to_string())
            .map_err(|e| AppError::ShareFailed(format!("Clipboard write failed: {}", e)))
    }

    async fn save_file(&self, file_name: &str, data: &[u8]) -> AppResult<PathBuf> {
        let dir = self
            .app
            .path()
            .download_dir()
            .map_err(|e| AppError::ShareFailed(format!("No downloads directory: {}", e)))?;
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(file_name);
        tokio::fs::write(&path, data).await?;
        tracing::info!("Saved recording to {:?}", path);
        Ok(path)
    }

    fn notify(&self, message: &str) {
        if let Err(e) = self.app.emit(NOTICE_EVENT, message) {
            tracing::warn!("Failed to emit notice: {}", e);
        }
    }
}
