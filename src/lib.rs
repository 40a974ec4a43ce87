//! Camera Teleprompter - read your script while recording yourself.
//!
//! The core (scrolling, camera lifecycle, recording, sharing) is
//! platform-neutral and driven through capability traits. The `desktop`
//! feature adds the Tauri shell with a nokhwa camera, a cpal microphone
//! and an FFmpeg encoder.

pub mod capture;
#[cfg(feature = "desktop")]
pub mod commands;
pub mod config;
pub mod recorder;
pub mod scroll;
pub mod share;
pub mod teleprompter;
pub mod utils;

#[cfg(test)]
mod testing;

#[cfg(feature = "desktop")]
use anyhow::Context;

/// Initialize and run the application
#[cfg(feature = "desktop")]
pub fn run() -> anyhow::Result<()> {
    use capture::native::preview::{self, PREVIEW_EVENT};
    use capture::native::{FfmpegEncoderFactory, NokhwaCameraSource};
    use commands::teleprompter::{TeleprompterState, NOTIFICATION_EVENT};
    use share::desktop::DesktopShareSurface;
    use std::sync::Arc;
    use tauri::{Emitter, Manager};
    use teleprompter::Capabilities;
    use tokio::sync::broadcast::error::RecvError;

    utils::init_tracing(utils::logging::DEFAULT_FILTER);
    tracing::info!("Starting Camera Teleprompter v{}", env!("CARGO_PKG_VERSION"));

    let config = config::TeleprompterConfig::from_env().context("failed to load configuration")?;

    let app = tauri::Builder::default()
        .plugin(tauri_plugin_clipboard_manager::init())
        .invoke_handler(tauri::generate_handler![
            // Teleprompter commands
            commands::teleprompter::get_snapshot,
            commands::teleprompter::set_script,
            commands::teleprompter::set_font_size,
            commands::teleprompter::set_text_color,
            commands::teleprompter::set_scroll_speed,
            commands::teleprompter::set_overlay_opacity,
            commands::teleprompter::toggle_auto_scroll,
            commands::teleprompter::reset_scroll,
            commands::teleprompter::report_layout,
            commands::teleprompter::report_scroll,
            commands::teleprompter::pointer_down,
            commands::teleprompter::pointer_move,
            commands::teleprompter::pointer_up,
            commands::teleprompter::pointer_leave,
            commands::teleprompter::touch_start,
            commands::teleprompter::toggle_camera,
            commands::teleprompter::start_recording,
            commands::teleprompter::stop_recording,
            commands::teleprompter::discard_recording,
            commands::teleprompter::export_recording,
            commands::teleprompter::share_app,
            // System commands
            commands::system::get_system_info,
        ])
        .setup(move |app| {
            let cameras = Arc::new(NokhwaCameraSource::new());

            // Forward live camera frames to the webview
            let mut previews = cameras.subscribe_preview();
            let app_handle = app.handle().clone();
            tauri::async_runtime::spawn(async move {
                loop {
                    match previews.recv().await {
                        Ok(jpeg) => {
                            if let Err(e) = app_handle.emit(PREVIEW_EVENT, preview::data_url(&jpeg)) {
                                tracing::debug!("Failed to emit preview frame: {}", e);
                            }
                        }
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break,
                    }
                }
            });

            let capabilities = Capabilities {
                camera: cameras.clone(),
                encoders: Arc::new(FfmpegEncoderFactory::new(cameras)),
                share: Arc::new(DesktopShareSurface::new(app.handle().clone())),
            };

            let (handle, controller_loop) = teleprompter::build(&config, capabilities);
            tauri::async_runtime::spawn(controller_loop);

            // Forward controller notifications to the webview
            let mut notifications = handle.subscribe();
            let app_handle = app.handle().clone();
            tauri::async_runtime::spawn(async move {
                loop {
                    match notifications.recv().await {
                        Ok(notification) => {
                            if let Err(e) = app_handle.emit(NOTIFICATION_EVENT, &notification) {
                                tracing::warn!("Failed to emit notification: {}", e);
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::debug!("Notification forwarder skipped {} messages", skipped);
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            });

            app.manage(TeleprompterState { handle });
            Ok(())
        })
        .build(tauri::generate_context!())
        .context("error while building tauri application")?;

    app.run(|app, event| {
        if let tauri::RunEvent::ExitRequested { .. } = event {
            if let Some(state) = app.try_state::<TeleprompterState>() {
                tracing::info!("Shutting down teleprompter");
                state.handle.shutdown();
            }
        }
    });
    Ok(())
}
