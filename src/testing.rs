//! Recording fakes of the capability traits, shared by the unit tests.

use crate::capture::traits::{
    CameraSource, ChunkSink, EncoderFactory, EncoderSettings, LiveStream, MediaEncoder,
    StreamConstraints,
};
use crate::share::{ShareLink, ShareSurface};
use crate::utils::error::{AppError, AppResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum CameraCall {
    Acquire(StreamConstraints),
    Release(u64),
}

/// Camera fake that counts live streams and records call order
#[derive(Default)]
pub struct FakeCameraSource {
    pub calls: Mutex<Vec<CameraCall>>,
    pub fail_preferred: AtomicBool,
    pub fail_all: AtomicBool,
    next_id: AtomicU64,
    live: AtomicUsize,
    pub max_live: AtomicUsize,
}

impl FakeCameraSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<CameraCall> {
        self.calls.lock().clone()
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CameraSource for FakeCameraSource {
    async fn acquire(&self, constraints: &StreamConstraints) -> AppResult<LiveStream> {
        self.calls.lock().push(CameraCall::Acquire(constraints.clone()));

        if self.fail_all.load(Ordering::SeqCst) {
            return Err(AppError::PermissionDenied("camera access denied".to_string()));
        }
        if self.fail_preferred.load(Ordering::SeqCst) && constraints.video.facing.is_some() {
            return Err(AppError::DeviceUnavailable("no matching camera".to_string()));
        }

        let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_live.fetch_max(live, Ordering::SeqCst);

        Ok(LiveStream {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            facing: constraints.video.facing,
            label: "Fake Camera".to_string(),
            resolution: constraints.video.ideal_resolution,
        })
    }

    async fn release(&self, stream: LiveStream) {
        self.calls.lock().push(CameraCall::Release(stream.id));
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Encoder fake that keeps every sink so tests can push chunks
pub struct FakeEncoderFactory {
    pub supported: HashSet<String>,
    pub started: Mutex<Vec<EncoderSettings>>,
    pub sinks: Mutex<Vec<ChunkSink>>,
    pub trailing: Mutex<Vec<Vec<u8>>>,
    /// Delivered through the sink from inside `stop`, before it returns
    pub flush_on_stop: Mutex<Vec<Vec<u8>>>,
    pub fail_start: AtomicBool,
}

impl FakeEncoderFactory {
    pub fn supporting(codecs: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            supported: codecs.iter().map(|c| c.to_string()).collect(),
            started: Mutex::new(Vec::new()),
            sinks: Mutex::new(Vec::new()),
            trailing: Mutex::new(Vec::new()),
            flush_on_stop: Mutex::new(Vec::new()),
            fail_start: AtomicBool::new(false),
        })
    }

    pub fn started_count(&self) -> usize {
        self.started.lock().len()
    }

    pub fn last_sink(&self) -> Option<ChunkSink> {
        self.sinks.lock().last().cloned()
    }
}

struct FakeEncoder {
    mime_type: String,
    sink: ChunkSink,
    flush_on_stop: Vec<Vec<u8>>,
    trailing: Vec<Vec<u8>>,
}

#[async_trait]
impl MediaEncoder for FakeEncoder {
    fn mime_type(&self) -> &str {
        &self.mime_type
    }

    async fn stop(&mut self) -> AppResult<Vec<Vec<u8>>> {
        for chunk in std::mem::take(&mut self.flush_on_stop) {
            self.sink.deliver(chunk);
        }
        Ok(std::mem::take(&mut self.trailing))
    }
}

#[async_trait]
impl EncoderFactory for FakeEncoderFactory {
    fn is_supported(&self, mime_type: &str) -> bool {
        self.supported.contains(mime_type)
    }

    async fn start(
        &self,
        _stream: &LiveStream,
        settings: EncoderSettings,
        sink: ChunkSink,
    ) -> AppResult<Box<dyn MediaEncoder>> {
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(AppError::Encoder("encoder refused to start".to_string()));
        }
        let mime_type = settings.mime_type.clone();
        self.started.lock().push(settings);
        self.sinks.lock().push(sink.clone());
        Ok(Box::new(FakeEncoder {
            mime_type,
            sink,
            flush_on_stop: std::mem::take(&mut *self.flush_on_stop.lock()),
            trailing: std::mem::take(&mut *self.trailing.lock()),
        }))
    }
}

/// Share surface fake recording every interaction
#[derive(Default)]
pub struct FakeShareSurface {
    pub file_sharing: AtomicBool,
    pub fail_file_share: AtomicBool,
    pub fail_link_share: AtomicBool,
    pub shared_files: Mutex<Vec<(String, usize)>>,
    pub shared_links: Mutex<Vec<ShareLink>>,
    pub saved: Mutex<Vec<(String, usize)>>,
    pub clipboard: Mutex<Vec<String>>,
    pub notices: Mutex<Vec<String>>,
}

impl FakeShareSurface {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_file_sharing() -> Arc<Self> {
        let surface = Self::default();
        surface.file_sharing.store(true, Ordering::SeqCst);
        Arc::new(surface)
    }
}

#[async_trait]
impl ShareSurface for FakeShareSurface {
    fn can_share_files(&self) -> bool {
        self.file_sharing.load(Ordering::SeqCst)
    }

    async fn share_file(&self, file_name: &str, _mime_type: &str, data: &[u8], _title: &str) -> AppResult<()> {
        if self.fail_file_share.load(Ordering::SeqCst) {
            return Err(AppError::ShareFailed("share sheet dismissed".to_string()));
        }
        self.shared_files.lock().push((file_name.to_string(), data.len()));
        Ok(())
    }

    async fn share_link(&self, link: &ShareLink) -> AppResult<()> {
        if self.fail_link_share.load(Ordering::SeqCst) {
            return Err(AppError::ShareFailed("link sharing unsupported".to_string()));
        }
        self.shared_links.lock().push(link.clone());
        Ok(())
    }

    async fn copy_to_clipboard(&self, text: &str) -> AppResult<()> {
        self.clipboard.lock().push(text.to_string());
        Ok(())
    }

    async fn save_file(&self, file_name: &str, data: &[u8]) -> AppResult<PathBuf> {
        self.saved.lock().push((file_name.to_string(), data.len()));
        Ok(PathBuf::from("/downloads").join(file_name))
    }

    fn notify(&self, message: &str) {
        self.notices.lock().push(message.to_string());
    }
}
