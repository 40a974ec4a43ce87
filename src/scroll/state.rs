//! Scroll state and the per-frame animation step
//!
//! The scroller reconciles three writers of the script offset: the frame
//! tick (auto-scroll), pointer drags, and native scrolling reported by the
//! view (wheel, trackpad). Each tick applies exactly one of them, in the
//! priority order drag > auto-scroll > resync.

use super::drag::DragTracker;
use serde::{Deserialize, Serialize};

/// Scroll position and mode flags
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollState {
    /// Offset of the script in pixels, within `[0, max_extent]`
    pub position: f64,
    pub is_auto_scrolling: bool,
    pub is_user_dragging: bool,
}

/// Geometry last reported by the view
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollMetrics {
    pub content_height: f64,
    pub viewport_height: f64,
    /// Offset the view is actually showing
    pub rendered_offset: f64,
}

impl ScrollMetrics {
    pub fn max_extent(&self) -> f64 {
        (self.content_height - self.viewport_height).max(0.0)
    }

    pub fn clamp(&self, offset: f64) -> f64 {
        if offset.is_nan() {
            return 0.0;
        }
        offset.clamp(0.0, self.max_extent())
    }
}

/// Result of one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Position untouched (drag in progress, or nothing to do)
    Unchanged,
    /// Auto-scroll moved the text
    Advanced(f64),
    /// Auto-scroll hit the end of the script and switched itself off
    ReachedEnd(f64),
    /// Position re-read from the rendered offset
    Resynced(f64),
}

#[derive(Debug, Clone)]
pub struct Scroller {
    state: ScrollState,
    metrics: ScrollMetrics,
    drag: DragTracker,
    base_rate: f64,
}

impl Scroller {
    pub fn new(base_rate: f64, drag_sensitivity: f64) -> Self {
        Self {
            state: ScrollState::default(),
            metrics: ScrollMetrics::default(),
            drag: DragTracker::new(drag_sensitivity),
            base_rate,
        }
    }

    pub fn state(&self) -> ScrollState {
        self.state
    }

    pub fn metrics(&self) -> ScrollMetrics {
        self.metrics
    }

    pub fn max_extent(&self) -> f64 {
        self.metrics.max_extent()
    }

    /// New content/viewport geometry
    pub fn set_layout(&mut self, content_height: f64, viewport_height: f64) {
        self.metrics.content_height = sanitize(content_height);
        self.metrics.viewport_height = sanitize(viewport_height);
        self.state.position = self.metrics.clamp(self.state.position);
        self.metrics.rendered_offset = self.metrics.clamp(self.metrics.rendered_offset);
    }

    /// The view scrolled on its own (wheel, trackpad, programmatic).
    /// Picked up by the resync branch of the next idle tick.
    pub fn native_scroll(&mut self, offset: f64) {
        self.metrics.rendered_offset = self.metrics.clamp(offset);
    }

    pub fn set_auto_scroll(&mut self, active: bool) -> bool {
        let changed = self.state.is_auto_scrolling != active;
        self.state.is_auto_scrolling = active;
        changed
    }

    pub fn toggle_auto_scroll(&mut self) -> bool {
        self.state.is_auto_scrolling = !self.state.is_auto_scrolling;
        self.state.is_auto_scrolling
    }

    /// Jump back to the top of the script
    pub fn reset(&mut self) -> f64 {
        self.state.position = 0.0;
        self.metrics.rendered_offset = 0.0;
        0.0
    }

    pub fn pointer_down(&mut self, pointer_y: f64) {
        self.drag.pointer_down(pointer_y, self.state.position);
        self.state.is_user_dragging = true;
        self.state.is_auto_scrolling = false;
    }

    /// Returns the new clamped position when a drag is in progress
    pub fn pointer_move(&mut self, pointer_y: f64) -> Option<f64> {
        let offset = self.drag.pointer_move(pointer_y)?;
        let position = self.metrics.clamp(offset);
        self.state.position = position;
        self.metrics.rendered_offset = position;
        Some(position)
    }

    /// Pointer-up or pointer-leave
    pub fn pointer_release(&mut self) -> bool {
        self.state.is_user_dragging = false;
        self.drag.release()
    }

    /// Stop auto-scroll without anchoring a drag; the view scrolls natively
    pub fn touch_start(&mut self) {
        self.state.is_auto_scrolling = false;
    }

    /// One animation frame
    pub fn tick(&mut self, scroll_speed: f64) -> TickOutcome {
        let max = self.metrics.max_extent();

        if self.state.is_user_dragging {
            self.state.position = self.state.position.min(max);
            return TickOutcome::Unchanged;
        }

        if self.state.is_auto_scrolling {
            let next = self.state.position + scroll_speed * self.base_rate;
            if next >= max {
                self.state.position = max;
                self.state.is_auto_scrolling = false;
                self.metrics.rendered_offset = max;
                return TickOutcome::ReachedEnd(max);
            }
            self.state.position = next.max(0.0);
            self.metrics.rendered_offset = self.state.position;
            return TickOutcome::Advanced(self.state.position);
        }

        let rendered = self.metrics.clamp(self.metrics.rendered_offset);
        if rendered != self.state.position {
            self.state.position = rendered;
            return TickOutcome::Resynced(rendered);
        }
        TickOutcome::Unchanged
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}
