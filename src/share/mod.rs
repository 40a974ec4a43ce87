//! Sharing and download
//!
//! Exporting a recording tries the native share sheet first and falls back
//! to saving the file. Sharing the app itself tries a link share and falls
//! back to copying the link to the clipboard.

#[cfg(feature = "desktop")]
pub mod desktop;

use crate::recorder::codec::container_extension;
use crate::recorder::state::MediaBlob;
use crate::utils::error::AppResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const CLIPBOARD_NOTICE: &str = "Link copied to clipboard";

/// Title, text and URL for sharing the app
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareLink {
    pub title: String,
    pub text: String,
    pub url: String,
}

/// Platform sharing, clipboard and file-save capabilities
#[async_trait]
pub trait ShareSurface: Send + Sync {
    /// Whether a share sheet accepting files exists on this platform
    fn can_share_files(&self) -> bool;

    async fn share_file(&self, file_name: &str, mime_type: &str, data: &[u8], title: &str) -> AppResult<()>;

    async fn share_link(&self, link: &ShareLink) -> AppResult<()>;

    async fn copy_to_clipboard(&self, text: &str) -> AppResult<()>;

    /// Save directly (the "download" path). Returns where the file went.
    async fn save_file(&self, file_name: &str, data: &[u8]) -> AppResult<PathBuf>;

    /// Show a short message to the user
    fn notify(&self, message: &str);
}

/// File name used when handing the recording to the share sheet
pub fn share_file_name(timestamp_ms: i64, mime_type: &str) -> String {
    format!("teleprompter_{}.{}", timestamp_ms, container_extension(mime_type))
}

/// File name used when saving the recording directly
pub fn download_file_name(timestamp_ms: i64, mime_type: &str) -> String {
    format!("teleprompter_video_{}.{}", timestamp_ms, container_extension(mime_type))
}

/// How a recording left the app
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum ExportOutcome {
    Shared { file_name: String },
    Saved { file_name: String, path: PathBuf },
}

/// Share the recording if possible, otherwise save it
pub async fn export_recording(
    surface: &dyn ShareSurface,
    blob: &MediaBlob,
    title: &str,
    timestamp_ms: i64,
) -> AppResult<ExportOutcome> {
    if surface.can_share_files() {
        let file_name = share_file_name(timestamp_ms, &blob.mime_type);
        match surface.share_file(&file_name, &blob.mime_type, &blob.bytes, title).await {
            Ok(()) => {
                tracing::info!("Shared recording as {}", file_name);
                return Ok(ExportOutcome::Shared { file_name });
            }
            Err(e) => tracing::warn!("Share failed, falling back to download: {}", e),
        }
    } else {
        tracing::debug!("File sharing unavailable, saving recording");
    }

    let file_name = download_file_name(timestamp_ms, &blob.mime_type);
    let path = surface.save_file(&file_name, &blob.bytes).await?;
    tracing::info!("Saved recording to {:?}", path);
    Ok(ExportOutcome::Saved { file_name, path })
}

/// How the app link was shared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AppShareOutcome {
    Shared,
    CopiedToClipboard,
}

/// Share the app link, falling back to the clipboard
pub async fn share_app(surface: &dyn ShareSurface, link: &ShareLink) -> AppResult<AppShareOutcome> {
    match surface.share_link(link).await {
        Ok(()) => Ok(AppShareOutcome::Shared),
        Err(e) => {
            tracing::debug!("Link share unavailable ({}), copying to clipboard", e);
            surface.copy_to_clipboard(&link.url).await?;
            surface.notify(CLIPBOARD_NOTICE);
            Ok(AppShareOutcome::CopiedToClipboard)
        }
    }
}
