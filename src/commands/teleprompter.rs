//! Teleprompter Tauri commands
//!
//! Each command forwards one UI interaction to the controller loop. The
//! results arrive asynchronously as `teleprompter://notification` events.

use crate::teleprompter::{ControllerEvent, ControllerSnapshot, TeleprompterHandle};
use tauri::State;

/// Event the forwarded controller notifications are emitted on
pub const NOTIFICATION_EVENT: &str = "teleprompter://notification";

/// Managed state holding the running controller's handle
pub struct TeleprompterState {
    pub handle: TeleprompterHandle,
}

fn dispatch(state: &TeleprompterState, event: ControllerEvent) -> Result<(), String> {
    state.handle.send(event).map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_snapshot(state: State<'_, TeleprompterState>) -> Result<ControllerSnapshot, String> {
    state.handle.snapshot().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub fn set_script(state: State<'_, TeleprompterState>, script: String) -> Result<(), String> {
    dispatch(&state, ControllerEvent::SetScript(script))
}

#[tauri::command]
pub fn set_font_size(state: State<'_, TeleprompterState>, size: u32) -> Result<(), String> {
    dispatch(&state, ControllerEvent::SetFontSize(size))
}

#[tauri::command]
pub fn set_text_color(state: State<'_, TeleprompterState>, color: String) -> Result<(), String> {
    dispatch(&state, ControllerEvent::SetTextColor(color))
}

#[tauri::command]
pub fn set_scroll_speed(state: State<'_, TeleprompterState>, speed: f64) -> Result<(), String> {
    dispatch(&state, ControllerEvent::SetScrollSpeed(speed))
}

#[tauri::command]
pub fn set_overlay_opacity(state: State<'_, TeleprompterState>, opacity: f64) -> Result<(), String> {
    dispatch(&state, ControllerEvent::SetOverlayOpacity(opacity))
}

#[tauri::command]
pub fn toggle_auto_scroll(state: State<'_, TeleprompterState>) -> Result<(), String> {
    dispatch(&state, ControllerEvent::ToggleAutoScroll)
}

#[tauri::command]
pub fn reset_scroll(state: State<'_, TeleprompterState>) -> Result<(), String> {
    dispatch(&state, ControllerEvent::ResetScroll)
}

/// Script container measurements, sent on mount and whenever layout changes
#[tauri::command]
pub fn report_layout(
    state: State<'_, TeleprompterState>,
    content_height: f64,
    viewport_height: f64,
) -> Result<(), String> {
    dispatch(
        &state,
        ControllerEvent::Layout {
            content_height,
            viewport_height,
        },
    )
}

/// Scroll offset the container actually shows (wheel or touch scrolling)
#[tauri::command]
pub fn report_scroll(state: State<'_, TeleprompterState>, offset: f64) -> Result<(), String> {
    dispatch(&state, ControllerEvent::NativeScroll { offset })
}

#[tauri::command]
pub fn pointer_down(state: State<'_, TeleprompterState>, y: f64) -> Result<(), String> {
    dispatch(&state, ControllerEvent::PointerDown { y })
}

#[tauri::command]
pub fn pointer_move(state: State<'_, TeleprompterState>, y: f64) -> Result<(), String> {
    dispatch(&state, ControllerEvent::PointerMove { y })
}

#[tauri::command]
pub fn pointer_up(state: State<'_, TeleprompterState>) -> Result<(), String> {
    dispatch(&state, ControllerEvent::PointerUp)
}

#[tauri::command]
pub fn pointer_leave(state: State<'_, TeleprompterState>) -> Result<(), String> {
    dispatch(&state, ControllerEvent::PointerLeave)
}

#[tauri::command]
pub fn touch_start(state: State<'_, TeleprompterState>) -> Result<(), String> {
    dispatch(&state, ControllerEvent::TouchStart)
}

#[tauri::command]
pub fn toggle_camera(state: State<'_, TeleprompterState>) -> Result<(), String> {
    dispatch(&state, ControllerEvent::ToggleFacing)
}

#[tauri::command]
pub fn start_recording(state: State<'_, TeleprompterState>) -> Result<(), String> {
    tracing::info!("Start recording requested");
    dispatch(&state, ControllerEvent::StartRecording)
}

#[tauri::command]
pub fn stop_recording(state: State<'_, TeleprompterState>) -> Result<(), String> {
    tracing::info!("Stop recording requested");
    dispatch(&state, ControllerEvent::StopRecording)
}

#[tauri::command]
pub fn discard_recording(state: State<'_, TeleprompterState>) -> Result<(), String> {
    dispatch(&state, ControllerEvent::DiscardRecording)
}

#[tauri::command]
pub fn export_recording(state: State<'_, TeleprompterState>) -> Result<(), String> {
    dispatch(&state, ControllerEvent::ExportRecording)
}

#[tauri::command]
pub fn share_app(state: State<'_, TeleprompterState>) -> Result<(), String> {
    dispatch(&state, ControllerEvent::ShareApp)
}
