//! Manual drag tracking
//!
//! Two states: idle, or dragging from an anchor captured at pointer-down.

use serde::{Deserialize, Serialize};

/// Pointer position and scroll offset captured when a drag starts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragAnchor {
    pub pointer_y: f64,
    pub scroll_offset: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragAnchor),
}

#[derive(Debug, Clone)]
pub struct DragTracker {
    state: DragState,
    sensitivity: f64,
}

impl DragTracker {
    pub fn new(sensitivity: f64) -> Self {
        Self {
            state: DragState::Idle,
            sensitivity,
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// Idle -> Dragging. A second pointer-down re-anchors.
    pub fn pointer_down(&mut self, pointer_y: f64, scroll_offset: f64) {
        self.state = DragState::Dragging(DragAnchor {
            pointer_y,
            scroll_offset,
        });
    }

    /// Unclamped offset for the current pointer position, `None` when idle.
    /// Moving the pointer down pulls the text down, i.e. scrolls back.
    pub fn pointer_move(&self, pointer_y: f64) -> Option<f64> {
        match self.state {
            DragState::Dragging(anchor) => {
                Some(anchor.scroll_offset - (pointer_y - anchor.pointer_y) * self.sensitivity)
            }
            DragState::Idle => None,
        }
    }

    /// Dragging -> Idle on pointer-up or pointer-leave. Returns whether a drag ended.
    pub fn release(&mut self) -> bool {
        let was_dragging = self.is_dragging();
        self.state = DragState::Idle;
        was_dragging
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_offset_relative_to_anchor() {
        let mut drag = DragTracker::new(1.0);
        assert_eq!(drag.pointer_move(100.0), None);

        drag.pointer_down(300.0, 50.0);
        assert_eq!(drag.pointer_move(250.0), Some(100.0));
        assert_eq!(drag.pointer_move(320.0), Some(30.0));
    }

    #[test]
    fn test_sensitivity_scales_displacement() {
        let mut drag = DragTracker::new(2.5);
        drag.pointer_down(0.0, 0.0);
        assert_eq!(drag.pointer_move(-10.0), Some(25.0));
    }

    #[test]
    fn test_release() {
        let mut drag = DragTracker::new(1.0);
        assert!(!drag.release());
        drag.pointer_down(10.0, 0.0);
        assert!(drag.release());
        assert_eq!(drag.state(), DragState::Idle);
    }
}
