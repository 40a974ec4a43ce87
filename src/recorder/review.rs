//! Review handles
//!
//! A finished recording is written to a temporary file so the view can play
//! it back. The file lives exactly as long as the handle: discarding the
//! recording (or starting a new one) drops the handle and deletes the file.

use super::codec::container_extension;
use super::state::MediaBlob;
use crate::utils::error::AppResult;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

#[derive(Debug)]
pub struct ReviewHandle {
    file: NamedTempFile,
}

impl ReviewHandle {
    /// Write `blob` to a fresh temp file
    pub fn create(blob: &MediaBlob) -> AppResult<Self> {
        let suffix = format!(".{}", container_extension(&blob.mime_type));
        let mut file = tempfile::Builder::new()
            .prefix("teleprompter-review-")
            .suffix(&suffix)
            .tempfile()?;
        file.write_all(&blob.bytes)?;
        file.flush()?;

        tracing::debug!("Review file written: {:?} ({} bytes)", file.path(), blob.len());
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Delete the file now, reporting failures instead of ignoring them on drop
    pub fn release(self) {
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            tracing::warn!("Failed to remove review file {:?}: {}", path, e);
        }
    }
}
