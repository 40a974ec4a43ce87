//! Camera source management
//!
//! Owns the single live stream the teleprompter shows and records from.
//! Every acquisition is tagged with a generation; results that come back
//! after a newer request (facing switch) or after teardown are released
//! instead of installed, so at most one device lock is ever held.

use super::traits::{CameraFacing, CameraSource, LiveStream, StreamConstraints};
use crate::utils::error::AppResult;
use std::sync::Arc;

/// Acquire a stream for `facing`, retrying once with minimal constraints
pub async fn acquire_with_fallback(
    source: &dyn CameraSource,
    facing: CameraFacing,
) -> AppResult<LiveStream> {
    match source.acquire(&StreamConstraints::preferred(facing)).await {
        Ok(stream) => Ok(stream),
        Err(e) => {
            tracing::warn!("Camera acquisition ({:?}) failed: {}, retrying with default constraints", facing, e);
            source.acquire(&StreamConstraints::minimal()).await
        }
    }
}

/// A pending acquisition, detached from the manager so it can run while
/// the controller keeps handling events
pub struct AcquireRequest {
    pub generation: u64,
    pub facing: CameraFacing,
    source: Arc<dyn CameraSource>,
}

impl AcquireRequest {
    pub async fn run(&self) -> AppResult<LiveStream> {
        acquire_with_fallback(self.source.as_ref(), self.facing).await
    }

    /// The source, for releasing a result nobody is left to install
    pub fn source(&self) -> Arc<dyn CameraSource> {
        self.source.clone()
    }
}

/// What happened to a finished acquisition
#[derive(Debug)]
pub enum AcquireOutcome {
    /// Stream is now the live one
    Installed,
    /// Result belonged to an outdated request and was released (or dropped if it failed)
    Stale,
    /// Both the preferred and the fallback request failed
    Failed(crate::utils::error::AppError),
}

pub struct CameraManager {
    source: Arc<dyn CameraSource>,
    facing: CameraFacing,
    stream: Option<LiveStream>,
    generation: u64,
    torn_down: bool,
}

impl CameraManager {
    pub fn new(source: Arc<dyn CameraSource>, facing: CameraFacing) -> Self {
        Self {
            source,
            facing,
            stream: None,
            generation: 0,
            torn_down: false,
        }
    }

    pub fn facing(&self) -> CameraFacing {
        self.facing
    }

    pub fn stream(&self) -> Option<&LiveStream> {
        self.stream.as_ref()
    }

    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    /// Start a new acquisition for the current facing. Any request still in
    /// flight becomes stale.
    pub fn begin_acquire(&mut self) -> Option<AcquireRequest> {
        if self.torn_down {
            return None;
        }
        self.generation += 1;
        Some(AcquireRequest {
            generation: self.generation,
            facing: self.facing,
            source: self.source.clone(),
        })
    }

    /// Release the held stream (if any), then request the other camera
    pub async fn toggle_facing(&mut self) -> Option<AcquireRequest> {
        if self.torn_down {
            return None;
        }
        self.release_current().await;
        self.facing = self.facing.toggled();
        tracing::info!("Switching camera to {:?}", self.facing);
        self.begin_acquire()
    }

    /// Install or discard the result of `begin_acquire`
    pub async fn complete(&mut self, generation: u64, result: AppResult<LiveStream>) -> AcquireOutcome {
        let current = !self.torn_down && generation == self.generation;

        match result {
            Ok(stream) if current => {
                self.release_current().await;
                tracing::info!("Camera ready: {} ({:?})", stream.label, stream.facing);
                self.stream = Some(stream);
                AcquireOutcome::Installed
            }
            Ok(stream) => {
                tracing::debug!("Releasing stale camera stream {} (generation {})", stream.id, generation);
                self.source.release(stream).await;
                AcquireOutcome::Stale
            }
            Err(e) if current => {
                tracing::error!("Camera unavailable: {}", e);
                AcquireOutcome::Failed(e)
            }
            Err(e) => {
                tracing::debug!("Ignoring failure of stale camera request: {}", e);
                AcquireOutcome::Stale
            }
        }
    }

    pub async fn release_current(&mut self) -> bool {
        match self.stream.take() {
            Some(stream) => {
                tracing::debug!("Releasing camera stream {}", stream.id);
                self.source.release(stream).await;
                true
            }
            None => false,
        }
    }

    /// Release the stream and refuse further acquisitions; in-flight
    /// requests become stale.
    pub async fn teardown(&mut self) {
        self.torn_down = true;
        self.generation += 1;
        self.release_current().await;
    }
}
