//! Teleprompter controller
//!
//! Single owner of the script, display configuration, scroll state, camera
//! stream and recording session. Mutation happens only in `handle` (one
//! event at a time) and `tick` (one animation frame). Slow platform work,
//! camera acquisition and sharing, runs in spawned tasks that report back
//! through the event queue so the controller never blocks on it. Encoded
//! chunks skip the queue: the encoder appends them to the session buffer.

use super::events::{ControllerEvent, ControllerSnapshot, Notification};
use crate::capture::camera::{AcquireOutcome, AcquireRequest, CameraManager};
use crate::capture::traits::{CameraFacing, CameraSource, EncoderFactory};
use crate::config::{DisplayConfig, TeleprompterConfig};
use crate::recorder::{RecorderSettings, RecorderState, RecordingController};
use crate::scroll::{ScrollState, Scroller, TickOutcome};
use crate::share::{self, ShareLink, ShareSurface};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

/// Platform capabilities injected into the controller
#[derive(Clone)]
pub struct Capabilities {
    pub camera: Arc<dyn CameraSource>,
    pub encoders: Arc<dyn EncoderFactory>,
    pub share: Arc<dyn ShareSurface>,
}

pub struct TeleprompterController {
    script: String,
    display: DisplayConfig,
    scroller: Scroller,
    camera: CameraManager,
    recorder: RecordingController,
    share: Arc<dyn ShareSurface>,
    share_link: ShareLink,
    events_tx: mpsc::UnboundedSender<ControllerEvent>,
    notify_tx: broadcast::Sender<Notification>,
    torn_down: bool,
}

impl TeleprompterController {
    pub fn new(
        config: &TeleprompterConfig,
        capabilities: Capabilities,
        events_tx: mpsc::UnboundedSender<ControllerEvent>,
        notify_tx: broadcast::Sender<Notification>,
    ) -> Self {
        let recorder_settings = RecorderSettings {
            codec_preferences: config.codec_preferences.clone(),
            fallback_codec: config.fallback_codec.clone(),
            flush_interval: Duration::from_millis(config.flush_interval_ms),
        };

        Self {
            script: config.script.clone(),
            display: config.display.clone(),
            scroller: Scroller::new(config.base_rate, config.drag_sensitivity),
            camera: CameraManager::new(capabilities.camera, CameraFacing::Front),
            recorder: RecordingController::new(capabilities.encoders, recorder_settings),
            share: capabilities.share,
            share_link: ShareLink {
                title: config.share_title.clone(),
                text: config.share_text.clone(),
                url: config.share_url.clone(),
            },
            events_tx,
            notify_tx,
            torn_down: false,
        }
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn scroll_state(&self) -> ScrollState {
        self.scroller.state()
    }

    pub fn recorder_state(&self) -> RecorderState {
        self.recorder.state()
    }

    pub fn has_camera(&self) -> bool {
        self.camera.has_stream()
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            script: self.script.clone(),
            display: self.display.clone(),
            scroll: self.scroller.state(),
            max_scroll_extent: self.scroller.max_extent(),
            recorder: self.recorder.state(),
            facing: self.camera.facing(),
            camera_ready: self.camera.has_stream(),
            review_path: self.recorder.review_path(),
        }
    }

    pub async fn handle(&mut self, event: ControllerEvent) {
        if self.torn_down {
            self.handle_after_teardown(event).await;
            return;
        }

        match event {
            ControllerEvent::SetScript(script) => {
                self.script = script.clone();
                self.emit(Notification::ScriptChanged { script });
            }
            ControllerEvent::SetFontSize(px) => {
                self.display.set_font_size(px);
                self.emit_display();
            }
            ControllerEvent::SetTextColor(color) => {
                if self.display.set_text_color(&color) {
                    self.emit_display();
                }
            }
            ControllerEvent::SetScrollSpeed(speed) => {
                self.display.set_scroll_speed(speed);
                self.emit_display();
            }
            ControllerEvent::SetOverlayOpacity(opacity) => {
                self.display.set_overlay_opacity(opacity);
                self.emit_display();
            }

            ControllerEvent::ToggleAutoScroll => {
                let active = self.scroller.toggle_auto_scroll();
                self.emit(Notification::AutoScrollChanged { active });
            }
            ControllerEvent::ResetScroll => {
                let position = self.scroller.reset();
                self.emit(Notification::ScrollTo { position });
            }
            ControllerEvent::Layout {
                content_height,
                viewport_height,
            } => {
                let before = self.scroller.state().position;
                self.scroller.set_layout(content_height, viewport_height);
                let position = self.scroller.state().position;
                if position != before {
                    self.emit(Notification::ScrollTo { position });
                }
            }
            ControllerEvent::NativeScroll { offset } => self.scroller.native_scroll(offset),
            ControllerEvent::PointerDown { y } => {
                let was_auto = self.scroller.state().is_auto_scrolling;
                self.scroller.pointer_down(y);
                if was_auto {
                    self.emit(Notification::AutoScrollChanged { active: false });
                }
            }
            ControllerEvent::PointerMove { y } => {
                if let Some(position) = self.scroller.pointer_move(y) {
                    self.emit(Notification::ScrollTo { position });
                }
            }
            ControllerEvent::PointerUp | ControllerEvent::PointerLeave => {
                self.scroller.pointer_release();
            }
            ControllerEvent::TouchStart => {
                let was_auto = self.scroller.state().is_auto_scrolling;
                self.scroller.touch_start();
                if was_auto {
                    self.emit(Notification::AutoScrollChanged { active: false });
                }
            }

            ControllerEvent::AcquireCamera => {
                if self.camera.has_stream() {
                    tracing::debug!("Camera already live");
                } else if let Some(request) = self.camera.begin_acquire() {
                    self.spawn_acquire(request);
                }
            }
            ControllerEvent::ToggleFacing => self.toggle_facing().await,
            ControllerEvent::CameraAcquired { generation, result } => {
                match self.camera.complete(generation, result).await {
                    AcquireOutcome::Installed => {
                        let label = self.camera.stream().map(|s| s.label.clone()).unwrap_or_default();
                        self.emit(Notification::CameraReady {
                            facing: self.camera.facing(),
                            label,
                        });
                    }
                    AcquireOutcome::Stale => {}
                    AcquireOutcome::Failed(e) => {
                        self.emit(Notification::CameraUnavailable { message: e.to_string() });
                    }
                }
            }

            ControllerEvent::StartRecording => self.start_recording().await,
            ControllerEvent::StopRecording => self.stop_recording().await,
            ControllerEvent::DiscardRecording => {
                if self.recorder.discard() {
                    self.emit(Notification::RecordingStateChanged {
                        state: RecorderState::Idle,
                    });
                }
            }
            ControllerEvent::ExportRecording => self.spawn_export(),

            ControllerEvent::ShareApp => self.spawn_share_app(),

            ControllerEvent::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            ControllerEvent::Teardown => self.teardown().await,
        }
    }

    /// One animation frame
    pub fn tick(&mut self) {
        if self.torn_down {
            return;
        }

        match self.scroller.tick(self.display.scroll_speed) {
            TickOutcome::Advanced(position) => self.emit(Notification::ScrollTo { position }),
            TickOutcome::ReachedEnd(position) => {
                tracing::debug!("Reached end of script at {}", position);
                self.emit(Notification::ScrollTo { position });
                self.emit(Notification::AutoScrollChanged { active: false });
            }
            // The view is already showing a resynced offset
            TickOutcome::Resynced(_) | TickOutcome::Unchanged => {}
        }
    }

    async fn handle_after_teardown(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::CameraAcquired { generation, result } => {
                self.camera.complete(generation, result).await;
            }
            ControllerEvent::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            other => tracing::debug!("Ignoring {:?} after teardown", other),
        }
    }

    async fn start_recording(&mut self) {
        match self.recorder.start(self.camera.stream()).await {
            Ok(true) => {
                self.emit(Notification::RecordingStateChanged {
                    state: RecorderState::Recording,
                });
                if self.scroller.set_auto_scroll(true) {
                    self.emit(Notification::AutoScrollChanged { active: true });
                }
            }
            Ok(false) => {}
            Err(e) => {
                tracing::error!("Failed to start recording: {}", e);
                self.emit(Notification::RecordingFailed { message: e.to_string() });
            }
        }
    }

    async fn stop_recording(&mut self) {
        let Some(summary) = self.recorder.stop().await else {
            return;
        };
        self.emit(Notification::RecordingStateChanged {
            state: RecorderState::Reviewing,
        });
        self.emit(Notification::RecordingReady { summary });
        if self.scroller.set_auto_scroll(false) {
            self.emit(Notification::AutoScrollChanged { active: false });
        }
    }

    async fn toggle_facing(&mut self) {
        // The encoder reads from the stream about to be released
        self.stop_recording().await;

        let had_stream = self.camera.has_stream();
        let request = self.camera.toggle_facing().await;
        if had_stream {
            self.emit(Notification::CameraReleased);
        }
        if let Some(request) = request {
            self.spawn_acquire(request);
        }
    }

    async fn teardown(&mut self) {
        tracing::info!("Tearing down teleprompter");
        self.stop_recording().await;
        self.recorder.discard();
        let had_stream = self.camera.has_stream();
        self.camera.teardown().await;
        if had_stream {
            self.emit(Notification::CameraReleased);
        }
        self.torn_down = true;
    }

    fn spawn_acquire(&self, request: AcquireRequest) {
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = request.run().await;
            let event = ControllerEvent::CameraAcquired {
                generation: request.generation,
                result,
            };
            if let Err(mpsc::error::SendError(event)) = events.send(event) {
                // Controller is gone; nobody will install this stream
                if let ControllerEvent::CameraAcquired { result: Ok(stream), .. } = event {
                    tracing::debug!("Releasing camera stream {} acquired after shutdown", stream.id);
                    request.source().release(stream).await;
                }
            }
        });
    }

    fn spawn_export(&self) {
        let Some(blob) = self.recorder.export_blob() else {
            tracing::debug!("Ignoring export: no recording under review");
            return;
        };
        let surface = self.share.clone();
        let notify = self.notify_tx.clone();
        let title = self.share_link.title.clone();

        tokio::spawn(async move {
            let timestamp = Utc::now().timestamp_millis();
            let notification = match share::export_recording(surface.as_ref(), &blob, &title, timestamp).await {
                Ok(outcome) => Notification::Exported { outcome },
                Err(e) => {
                    tracing::error!("Export failed: {}", e);
                    Notification::ExportFailed { message: e.to_string() }
                }
            };
            let _ = notify.send(notification);
        });
    }

    fn spawn_share_app(&self) {
        let surface = self.share.clone();
        let notify = self.notify_tx.clone();
        let link = self.share_link.clone();

        tokio::spawn(async move {
            match share::share_app(surface.as_ref(), &link).await {
                Ok(outcome) => {
                    let _ = notify.send(Notification::AppShared { outcome });
                }
                Err(e) => tracing::error!("Could not share app link: {}", e),
            }
        });
    }

    fn emit_display(&self) {
        self.emit(Notification::DisplayChanged {
            display: self.display.clone(),
        });
    }

    fn emit(&self, notification: Notification) {
        // No subscribers is fine
        let _ = self.notify_tx.send(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::share::{AppShareOutcome, ExportOutcome};
    use crate::testing::{CameraCall, FakeCameraSource, FakeEncoderFactory, FakeShareSurface};
    use std::sync::atomic::Ordering;
    use tokio::time::timeout;

    struct Harness {
        controller: TeleprompterController,
        events_rx: mpsc::UnboundedReceiver<ControllerEvent>,
        notifications: broadcast::Receiver<Notification>,
        camera: Arc<FakeCameraSource>,
        encoders: Arc<FakeEncoderFactory>,
        share: Arc<FakeShareSurface>,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_config(TeleprompterConfig::default())
        }

        fn with_config(config: TeleprompterConfig) -> Self {
            let camera = FakeCameraSource::new();
            let encoders = FakeEncoderFactory::supporting(&["video/mp4"]);
            let share = FakeShareSurface::new();
            let (events_tx, events_rx) = mpsc::unbounded_channel();
            let (notify_tx, notifications) = broadcast::channel(1024);
            let capabilities = Capabilities {
                camera: camera.clone(),
                encoders: encoders.clone(),
                share: share.clone(),
            };
            Self {
                controller: TeleprompterController::new(&config, capabilities, events_tx, notify_tx),
                events_rx,
                notifications,
                camera,
                encoders,
                share,
            }
        }

        /// Feed the next self-posted event (acquisition result, chunk) back in
        async fn pump(&mut self) {
            let event = timeout(Duration::from_secs(2), self.events_rx.recv())
                .await
                .expect("timed out waiting for controller event")
                .expect("event channel closed");
            self.controller.handle(event).await;
        }

        async fn with_camera(mut self) -> Self {
            self.controller.handle(ControllerEvent::AcquireCamera).await;
            self.pump().await;
            assert!(self.controller.has_camera());
            self
        }

        async fn next_notification(&mut self, matches: impl Fn(&Notification) -> bool) -> Notification {
            timeout(Duration::from_secs(2), async {
                loop {
                    match self.notifications.recv().await {
                        Ok(n) if matches(&n) => return n,
                        Ok(_) => continue,
                        Err(e) => panic!("notification channel failed: {e}"),
                    }
                }
            })
            .await
            .expect("timed out waiting for notification")
        }

        fn drain_notifications(&mut self) -> Vec<Notification> {
            let mut out = Vec::new();
            while let Ok(n) = self.notifications.try_recv() {
                out.push(n);
            }
            out
        }
    }

    #[tokio::test]
    async fn test_start_without_camera_is_noop() {
        let mut h = Harness::new();
        h.controller.handle(ControllerEvent::StartRecording).await;

        assert_eq!(h.controller.recorder_state(), RecorderState::Idle);
        assert_eq!(h.encoders.started_count(), 0);
        assert!(!h.controller.scroll_state().is_auto_scrolling);
    }

    #[tokio::test]
    async fn test_camera_ready_notification() {
        let mut h = Harness::new().with_camera().await;
        let n = h.next_notification(|n| matches!(n, Notification::CameraReady { .. })).await;
        assert_eq!(
            n,
            Notification::CameraReady {
                facing: CameraFacing::Front,
                label: "Fake Camera".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_camera_failure_is_reported() {
        let mut h = Harness::new();
        h.camera.fail_all.store(true, Ordering::SeqCst);

        h.controller.handle(ControllerEvent::AcquireCamera).await;
        h.pump().await;

        assert!(!h.controller.has_camera());
        let n = h.next_notification(|n| matches!(n, Notification::CameraUnavailable { .. })).await;
        assert!(matches!(n, Notification::CameraUnavailable { message } if message.contains("denied")));
    }

    #[tokio::test]
    async fn test_recording_drives_auto_scroll() {
        let mut h = Harness::new().with_camera().await;
        h.controller.handle(ControllerEvent::Layout { content_height: 5000.0, viewport_height: 500.0 }).await;

        h.controller.handle(ControllerEvent::StartRecording).await;
        assert_eq!(h.controller.recorder_state(), RecorderState::Recording);
        assert!(h.controller.scroll_state().is_auto_scrolling);

        // Scrolling can be stopped independently of the recording
        h.controller.handle(ControllerEvent::ToggleAutoScroll).await;
        assert!(!h.controller.scroll_state().is_auto_scrolling);
        assert_eq!(h.controller.recorder_state(), RecorderState::Recording);

        h.controller.handle(ControllerEvent::ToggleAutoScroll).await;
        h.controller.handle(ControllerEvent::StopRecording).await;
        assert_eq!(h.controller.recorder_state(), RecorderState::Reviewing);
        assert!(!h.controller.scroll_state().is_auto_scrolling);
        assert!(h.controller.snapshot().review_path.is_some());
    }

    #[tokio::test]
    async fn test_encoder_output_reaches_recording() {
        let mut h = Harness::new().with_camera().await;
        h.encoders.flush_on_stop.lock().push(vec![5, 5]);
        h.encoders.trailing.lock().push(vec![6]);
        h.controller.handle(ControllerEvent::StartRecording).await;

        let sink = h.encoders.last_sink().unwrap();
        sink.deliver(vec![1, 2, 3]);
        sink.deliver(Vec::new());
        sink.deliver(vec![4]);

        h.controller.handle(ControllerEvent::StopRecording).await;
        let n = h.next_notification(|n| matches!(n, Notification::RecordingReady { .. })).await;
        let Notification::RecordingReady { summary } = n else { unreachable!() };
        assert_eq!(summary.size_bytes, 7);
        assert_eq!(summary.mime_type, "video/mp4");
        let path = summary.preview_path.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), vec![1, 2, 3, 4, 5, 5, 6]);
    }

    #[tokio::test]
    async fn test_failed_restart_keeps_review_and_auto_scroll_off() {
        let mut h = Harness::new().with_camera().await;
        h.controller.handle(ControllerEvent::StartRecording).await;
        h.controller.handle(ControllerEvent::StopRecording).await;

        h.encoders.fail_start.store(true, Ordering::SeqCst);
        h.controller.handle(ControllerEvent::StartRecording).await;

        let n = h.next_notification(|n| matches!(n, Notification::RecordingFailed { .. })).await;
        assert!(matches!(n, Notification::RecordingFailed { message } if message.contains("refused")));
        assert_eq!(h.controller.recorder_state(), RecorderState::Reviewing);
        assert!(h.controller.snapshot().review_path.is_some());
        assert!(!h.controller.scroll_state().is_auto_scrolling);
    }

    #[tokio::test]
    async fn test_stop_and_discard_guards() {
        let mut h = Harness::new().with_camera().await;
        h.drain_notifications();

        h.controller.handle(ControllerEvent::StopRecording).await;
        h.controller.handle(ControllerEvent::DiscardRecording).await;
        assert_eq!(h.controller.recorder_state(), RecorderState::Idle);
        assert!(h.drain_notifications().is_empty());

        h.controller.handle(ControllerEvent::StartRecording).await;
        h.controller.handle(ControllerEvent::StartRecording).await;
        assert_eq!(h.encoders.started_count(), 1);

        h.controller.handle(ControllerEvent::StopRecording).await;
        h.controller.handle(ControllerEvent::DiscardRecording).await;
        assert_eq!(h.controller.recorder_state(), RecorderState::Idle);
        assert!(h.controller.snapshot().review_path.is_none());
    }

    #[tokio::test]
    async fn test_drag_during_recording_keeps_auto_scroll_off() {
        let mut h = Harness::new().with_camera().await;
        h.controller.handle(ControllerEvent::Layout { content_height: 3000.0, viewport_height: 1000.0 }).await;
        h.controller.handle(ControllerEvent::StartRecording).await;
        h.controller.tick();

        h.controller.handle(ControllerEvent::PointerDown { y: 500.0 }).await;
        for y in [450.0, 200.0, -4000.0, 9000.0] {
            h.controller.handle(ControllerEvent::PointerMove { y }).await;
            h.controller.tick();
            let scroll = h.controller.scroll_state();
            assert!(!scroll.is_auto_scrolling);
            assert!(scroll.position >= 0.0 && scroll.position <= 2000.0);
        }
        h.controller.handle(ControllerEvent::PointerLeave).await;
        h.controller.tick();

        let scroll = h.controller.scroll_state();
        assert!(!scroll.is_auto_scrolling);
        assert!(!scroll.is_user_dragging);
        assert_eq!(h.controller.recorder_state(), RecorderState::Recording);
    }

    #[tokio::test]
    async fn test_tick_reaching_end_stops_auto_scroll() {
        let mut config = TeleprompterConfig::default();
        config.base_rate = 1.0;
        config.display.scroll_speed = 10.0;
        let mut h = Harness::with_config(config);

        h.controller.handle(ControllerEvent::Layout { content_height: 1600.0, viewport_height: 600.0 }).await;
        h.controller.handle(ControllerEvent::NativeScroll { offset: 995.0 }).await;
        h.controller.tick();
        assert_eq!(h.controller.scroll_state().position, 995.0);

        h.controller.handle(ControllerEvent::ToggleAutoScroll).await;
        h.drain_notifications();
        h.controller.tick();

        let scroll = h.controller.scroll_state();
        assert_eq!(scroll.position, 1000.0);
        assert!(!scroll.is_auto_scrolling);
        assert_eq!(
            h.drain_notifications(),
            vec![
                Notification::ScrollTo { position: 1000.0 },
                Notification::AutoScrollChanged { active: false }
            ]
        );
    }

    #[tokio::test]
    async fn test_toggle_facing_while_recording() {
        let mut h = Harness::new().with_camera().await;
        h.controller.handle(ControllerEvent::StartRecording).await;

        h.controller.handle(ControllerEvent::ToggleFacing).await;
        assert_eq!(h.controller.recorder_state(), RecorderState::Reviewing);
        assert!(!h.controller.has_camera());

        h.pump().await;
        assert!(h.controller.has_camera());
        assert_eq!(h.controller.snapshot().facing, CameraFacing::Back);
        assert_eq!(h.camera.max_live.load(Ordering::SeqCst), 1);

        let calls = h.camera.calls();
        let release = calls.iter().position(|c| matches!(c, CameraCall::Release(1))).unwrap();
        let reacquire = calls.iter().rposition(|c| matches!(c, CameraCall::Acquire(_))).unwrap();
        assert!(release < reacquire);
    }

    #[tokio::test]
    async fn test_export_keeps_review_state() {
        let mut h = Harness::new().with_camera().await;
        h.controller.handle(ControllerEvent::StartRecording).await;
        h.controller.handle(ControllerEvent::StopRecording).await;

        h.controller.handle(ControllerEvent::ExportRecording).await;
        let n = h.next_notification(|n| matches!(n, Notification::Exported { .. })).await;
        assert!(matches!(n, Notification::Exported { outcome: ExportOutcome::Saved { ref file_name, .. } }
            if file_name.starts_with("teleprompter_video_") && file_name.ends_with(".mp4")));
        assert_eq!(h.controller.recorder_state(), RecorderState::Reviewing);
        assert_eq!(h.share.saved.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_export_without_recording_is_ignored() {
        let mut h = Harness::new();
        h.controller.handle(ControllerEvent::ExportRecording).await;
        tokio::task::yield_now().await;
        assert!(h.share.saved.lock().is_empty());
        assert!(h.drain_notifications().is_empty());
    }

    #[tokio::test]
    async fn test_share_app_falls_back_to_clipboard() {
        let mut h = Harness::new();
        h.share.fail_link_share.store(true, Ordering::SeqCst);

        h.controller.handle(ControllerEvent::ShareApp).await;
        let n = h.next_notification(|n| matches!(n, Notification::AppShared { .. })).await;
        assert_eq!(n, Notification::AppShared { outcome: AppShareOutcome::CopiedToClipboard });
        assert_eq!(h.share.clipboard.lock().as_slice(), &[TeleprompterConfig::default().share_url]);
    }

    #[tokio::test]
    async fn test_settings_updates() {
        let mut h = Harness::new();
        h.controller.handle(ControllerEvent::SetFontSize(64)).await;
        h.controller.handle(ControllerEvent::SetTextColor("#00ff00".to_string())).await;
        h.controller.handle(ControllerEvent::SetTextColor("green".to_string())).await;
        h.controller.handle(ControllerEvent::SetScrollSpeed(7.0)).await;
        h.controller.handle(ControllerEvent::SetOverlayOpacity(0.8)).await;
        h.controller.handle(ControllerEvent::SetScript("Line one".to_string())).await;

        let snapshot = h.controller.snapshot();
        assert_eq!(snapshot.display.font_size, 64);
        assert_eq!(snapshot.display.text_color, "#00ff00");
        assert_eq!(snapshot.display.scroll_speed, 7.0);
        assert_eq!(snapshot.display.overlay_opacity, 0.8);
        assert_eq!(snapshot.script, "Line one");

        let display_changes = h
            .drain_notifications()
            .into_iter()
            .filter(|n| matches!(n, Notification::DisplayChanged { .. }))
            .count();
        assert_eq!(display_changes, 4);
    }

    #[tokio::test]
    async fn test_teardown_releases_everything() {
        let mut h = Harness::new().with_camera().await;
        h.controller.handle(ControllerEvent::StartRecording).await;

        h.controller.handle(ControllerEvent::Teardown).await;
        assert!(h.controller.is_torn_down());
        assert_eq!(h.camera.live(), 0);
        assert_eq!(h.controller.recorder_state(), RecorderState::Idle);

        // Late acquisition after teardown is released, never installed
        h.controller.handle(ControllerEvent::AcquireCamera).await;
        let late = h.camera.acquire(&crate::capture::StreamConstraints::minimal()).await;
        h.controller.handle(ControllerEvent::CameraAcquired { generation: 1, result: late }).await;
        assert!(!h.controller.has_camera());
        assert_eq!(h.camera.live(), 0);
    }
}
