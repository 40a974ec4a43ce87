//! Controller inputs and outputs
//!
//! Every UI interaction and async completion reaches the controller as a `ControllerEvent`; everything the
//! view needs to react to leaves as a `Notification`.

use crate::capture::traits::{CameraFacing, LiveStream};
use crate::config::DisplayConfig;
use crate::recorder::state::{RecorderState, RecordingSummary};
use crate::scroll::ScrollState;
use crate::share::{AppShareOutcome, ExportOutcome};
use crate::utils::error::AppResult;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

#[derive(Debug)]
pub enum ControllerEvent {
    // Settings surface
    SetScript(String),
    SetFontSize(u32),
    SetTextColor(String),
    SetScrollSpeed(f64),
    SetOverlayOpacity(f64),

    // Scrolling
    ToggleAutoScroll,
    ResetScroll,
    Layout { content_height: f64, viewport_height: f64 },
    NativeScroll { offset: f64 },
    PointerDown { y: f64 },
    PointerMove { y: f64 },
    PointerUp,
    PointerLeave,
    TouchStart,

    // Camera
    AcquireCamera,
    ToggleFacing,
    CameraAcquired { generation: u64, result: AppResult<LiveStream> },

    // Recording
    StartRecording,
    StopRecording,
    DiscardRecording,
    ExportRecording,

    ShareApp,

    /// Reply with the current state
    Snapshot(oneshot::Sender<ControllerSnapshot>),

    /// Stop recording, release the camera, end the loop
    Teardown,
}

/// Point-in-time view of the controller, for the frontend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerSnapshot {
    pub script: String,
    pub display: DisplayConfig,
    pub scroll: ScrollState,
    pub max_scroll_extent: f64,
    pub recorder: RecorderState,
    pub facing: CameraFacing,
    pub camera_ready: bool,
    pub review_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Notification {
    #[serde(rename_all = "camelCase")]
    ScrollTo { position: f64 },
    #[serde(rename_all = "camelCase")]
    AutoScrollChanged { active: bool },
    #[serde(rename_all = "camelCase")]
    ScriptChanged { script: String },
    #[serde(rename_all = "camelCase")]
    DisplayChanged { display: DisplayConfig },
    #[serde(rename_all = "camelCase")]
    CameraReady { facing: CameraFacing, label: String },
    CameraReleased,
    #[serde(rename_all = "camelCase")]
    CameraUnavailable { message: String },
    #[serde(rename_all = "camelCase")]
    RecordingStateChanged { state: RecorderState },
    #[serde(rename_all = "camelCase")]
    RecordingReady { summary: RecordingSummary },
    #[serde(rename_all = "camelCase")]
    RecordingFailed { message: String },
    #[serde(rename_all = "camelCase")]
    Exported { outcome: ExportOutcome },
    #[serde(rename_all = "camelCase")]
    ExportFailed { message: String },
    #[serde(rename_all = "camelCase")]
    AppShared { outcome: AppShareOutcome },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_wire_format() {
        let json = serde_json::to_value(Notification::ScrollTo { position: 12.5 }).unwrap();
        assert_eq!(json, serde_json::json!({"type": "scrollTo", "position": 12.5}));

        let json = serde_json::to_value(Notification::RecordingStateChanged {
            state: RecorderState::Reviewing,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"type": "recordingStateChanged", "state": "reviewing"}));

        let json = serde_json::to_value(Notification::CameraReleased).unwrap();
        assert_eq!(json, serde_json::json!({"type": "cameraReleased"}));
    }
}
