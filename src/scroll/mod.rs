//! Script scrolling
//!
//! - `Scroller`: scroll position plus the per-frame tick
//! - `DragTracker`: pointer drag state machine

pub mod drag;
pub mod state;

pub use drag::{DragAnchor, DragState, DragTracker};
pub use state::{ScrollMetrics, ScrollState, Scroller, TickOutcome};
