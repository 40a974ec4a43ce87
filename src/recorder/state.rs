//! Recording state management
//!
//! Defines the recording state machine, the in-progress session and the
//! finished media blob.

use crate::capture::traits::ChunkSink;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Current state of the recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecorderState {
    /// Ready to record
    #[default]
    Idle,
    /// Encoder running, chunks being buffered
    Recording,
    /// A finished recording is held for preview/export
    Reviewing,
}

/// Encoded output of one session, shared with the encoder's sink
#[derive(Debug, Default)]
struct ChunkBuffer {
    chunks: Vec<Vec<u8>>,
    closed: bool,
}

impl ChunkBuffer {
    fn push(&mut self, chunk: Vec<u8>) -> bool {
        if self.closed || chunk.is_empty() {
            return false;
        }
        self.chunks.push(chunk);
        true
    }
}

/// One recording, from start to stop.
///
/// Chunks go straight from the encoder's sink into the session buffer, in
/// delivery order, until `finish` closes it. Output flushed while the
/// encoder is being stopped therefore still lands before the trailing data.
#[derive(Debug, Clone)]
pub struct RecordingSession {
    pub id: Uuid,
    pub mime_type: String,
    pub started_at: DateTime<Utc>,
    buffer: Arc<Mutex<ChunkBuffer>>,
}

impl RecordingSession {
    pub fn new(mime_type: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            mime_type,
            started_at: Utc::now(),
            buffer: Arc::new(Mutex::new(ChunkBuffer::default())),
        }
    }

    /// Sink for the encoder; appends to this session until it is finished
    pub fn sink(&self) -> ChunkSink {
        let buffer = self.buffer.clone();
        ChunkSink::new(self.id, move |session_id, chunk| {
            let size = chunk.len();
            let mut buffer = buffer.lock();
            if buffer.push(chunk) {
                tracing::debug!("Buffered chunk #{} ({} bytes)", buffer.chunks.len(), size);
            } else if buffer.closed {
                tracing::debug!("Dropping chunk for finished session {}", session_id);
            }
        })
    }

    /// Buffer an encoded chunk; empty chunks are dropped
    pub fn push_chunk(&self, chunk: Vec<u8>) -> bool {
        self.buffer.lock().push(chunk)
    }

    pub fn chunk_count(&self) -> usize {
        self.buffer.lock().chunks.len()
    }

    pub fn buffered_bytes(&self) -> usize {
        self.buffer.lock().chunks.iter().map(Vec::len).sum()
    }

    /// Close the buffer and concatenate the chunks, in arrival order
    pub fn finish(self) -> MediaBlob {
        let chunks = {
            let mut buffer = self.buffer.lock();
            buffer.closed = true;
            std::mem::take(&mut buffer.chunks)
        };
        let mut bytes = Vec::with_capacity(chunks.iter().map(Vec::len).sum());
        for chunk in chunks {
            bytes.extend_from_slice(&chunk);
        }
        let finished_at = Utc::now();
        MediaBlob {
            bytes,
            mime_type: self.mime_type,
            session_id: self.id,
            duration_ms: (finished_at - self.started_at).num_milliseconds().max(0) as u64,
        }
    }
}

/// A finished recording as one binary object
#[derive(Debug, Clone, PartialEq)]
pub struct MediaBlob {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub session_id: Uuid,
    /// Wall-clock length of the session
    pub duration_ms: u64,
}

impl MediaBlob {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Summary of the recording under review, for the frontend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingSummary {
    pub session_id: Uuid,
    pub mime_type: String,
    pub size_bytes: usize,
    pub duration_ms: u64,
    /// Temp file holding the media for preview, if it could be written
    pub preview_path: Option<String>,
}
