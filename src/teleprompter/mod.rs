//! Teleprompter/recorder controller
//!
//! - `controller`: the state owner reacting to events and frame ticks
//! - `events`: controller inputs, notifications and snapshots
//! - `runtime`: event queue, frame loop and cancellation

pub mod controller;
pub mod events;
pub mod runtime;

pub use controller::{Capabilities, TeleprompterController};
pub use events::{ControllerEvent, ControllerSnapshot, Notification};
pub use runtime::{build, CancellationToken, TeleprompterHandle};
