//! Tauri command handlers
//!
//! IPC commands the frontend calls via Tauri's invoke system.

pub mod system;
pub mod teleprompter;
