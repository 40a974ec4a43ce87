//! Controller runtime
//!
//! Owns the controller inside one task and feeds it, one at a time, either
//! the next queued event or a frame tick. The loop re-arms every frame until
//! its cancellation token fires or a `Teardown` event is handled.

use super::controller::{Capabilities, TeleprompterController};
use super::events::{ControllerEvent, ControllerSnapshot, Notification};
use crate::config::TeleprompterConfig;
use crate::utils::error::{AppError, AppResult};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, Notify};
use tokio::time::MissedTickBehavior;

const NOTIFICATION_CAPACITY: usize = 256;

/// Cancels the frame loop
#[derive(Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once `cancel` has been called
    pub async fn cancelled(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Cloneable handle for talking to a running controller
#[derive(Clone)]
pub struct TeleprompterHandle {
    events: mpsc::UnboundedSender<ControllerEvent>,
    notifications: broadcast::Sender<Notification>,
    cancel: CancellationToken,
}

impl TeleprompterHandle {
    pub fn send(&self, event: ControllerEvent) -> AppResult<()> {
        self.events
            .send(event)
            .map_err(|_| AppError::Config("teleprompter is not running".to_string()))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    pub async fn snapshot(&self) -> AppResult<ControllerSnapshot> {
        let (reply, response) = oneshot::channel();
        self.send(ControllerEvent::Snapshot(reply))?;
        response
            .await
            .map_err(|_| AppError::Config("teleprompter stopped before replying".to_string()))
    }

    /// Tear the controller down and stop the frame loop
    pub fn shutdown(&self) {
        if self.send(ControllerEvent::Teardown).is_err() {
            self.cancel.cancel();
        }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Build a controller and the future that runs it.
///
/// The caller spawns the future on its runtime (`tokio::spawn`, or Tauri's
/// async runtime). The camera is requested as soon as the loop starts.
pub fn build(
    config: &TeleprompterConfig,
    capabilities: Capabilities,
) -> (TeleprompterHandle, impl Future<Output = ()> + Send + 'static) {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (notify_tx, _) = broadcast::channel(NOTIFICATION_CAPACITY);
    let cancel = CancellationToken::new();

    let controller = TeleprompterController::new(config, capabilities, events_tx.clone(), notify_tx.clone());
    let frame_interval = Duration::from_millis(config.frame_interval_ms);

    let handle = TeleprompterHandle {
        events: events_tx,
        notifications: notify_tx,
        cancel: cancel.clone(),
    };

    (handle, run(controller, events_rx, frame_interval, cancel))
}

async fn run(
    mut controller: TeleprompterController,
    mut events: mpsc::UnboundedReceiver<ControllerEvent>,
    frame_interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!("Teleprompter loop started ({}ms frames)", frame_interval.as_millis());
    controller.handle(ControllerEvent::AcquireCamera).await;

    let mut frames = tokio::time::interval(frame_interval);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                controller.handle(ControllerEvent::Teardown).await;
                break;
            }
            Some(event) = events.recv() => {
                controller.handle(event).await;
                if controller.is_torn_down() {
                    cancel.cancel();
                    break;
                }
            }
            _ = frames.tick() => controller.tick(),
        }
    }

    // Anything still queued (a camera stream that resolved late) must be
    // released rather than dropped.
    events.close();
    while let Ok(event) = events.try_recv() {
        controller.handle(event).await;
    }
    tracing::info!("Teleprompter loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderState;
    use crate::testing::{FakeCameraSource, FakeEncoderFactory, FakeShareSurface};
    use tokio::time::{sleep, timeout};

    fn capabilities(camera: Arc<FakeCameraSource>) -> Capabilities {
        Capabilities {
            camera,
            encoders: FakeEncoderFactory::supporting(&["video/webm;codecs=vp8,opus"]),
            share: FakeShareSurface::new(),
        }
    }

    async fn wait_for<F>(handle: &TeleprompterHandle, check: F) -> ControllerSnapshot
    where
        F: Fn(&ControllerSnapshot) -> bool,
    {
        timeout(Duration::from_secs(5), async {
            loop {
                let snapshot = handle.snapshot().await.unwrap();
                if check(&snapshot) {
                    return snapshot;
                }
                sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("condition not reached")
    }

    #[tokio::test]
    async fn test_cancellation_token() {
        let token = CancellationToken::new();
        let waiter = {
            let token = token.clone();
            tokio::spawn(async move { token.cancelled().await })
        };
        assert!(!token.is_cancelled());
        token.cancel();
        timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
        // Already-cancelled tokens resolve immediately
        timeout(Duration::from_secs(1), token.cancelled()).await.unwrap();
    }

    #[tokio::test]
    async fn test_loop_acquires_camera_and_scrolls() {
        let camera = FakeCameraSource::new();
        let mut config = TeleprompterConfig::default();
        config.frame_interval_ms = 1;
        let (handle, task) = build(&config, capabilities(camera.clone()));
        let join = tokio::spawn(task);

        wait_for(&handle, |s| s.camera_ready).await;

        handle
            .send(ControllerEvent::Layout { content_height: 10_000.0, viewport_height: 500.0 })
            .unwrap();
        handle.send(ControllerEvent::StartRecording).unwrap();

        let snapshot = wait_for(&handle, |s| s.scroll.position > 0.0).await;
        assert_eq!(snapshot.recorder, RecorderState::Recording);
        assert!(snapshot.scroll.is_auto_scrolling);

        handle.send(ControllerEvent::StopRecording).unwrap();
        let snapshot = wait_for(&handle, |s| s.recorder == RecorderState::Reviewing).await;
        assert!(!snapshot.scroll.is_auto_scrolling);

        handle.shutdown();
        timeout(Duration::from_secs(2), join).await.unwrap().unwrap();
        assert_eq!(camera.live(), 0);
        assert!(handle.send(ControllerEvent::ToggleAutoScroll).is_err());
    }

    #[tokio::test]
    async fn test_cancel_tears_down() {
        let camera = FakeCameraSource::new();
        let (handle, task) = build(&TeleprompterConfig::default(), capabilities(camera.clone()));
        let mut notifications = handle.subscribe();
        let join = tokio::spawn(task);

        wait_for(&handle, |s| s.camera_ready).await;
        handle.cancellation_token().cancel();
        timeout(Duration::from_secs(2), join).await.unwrap().unwrap();

        assert_eq!(camera.live(), 0);
        let mut saw_release = false;
        while let Ok(n) = notifications.try_recv() {
            saw_release |= n == Notification::CameraReleased;
        }
        assert!(saw_release);
    }
}
