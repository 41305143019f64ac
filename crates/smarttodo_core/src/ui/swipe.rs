//! Swipe-to-complete and swipe-to-delete on list rows.
//!
//! # Responsibility
//! - Compute the background and icon drawn behind a row while it is dragged.
//! - Turn a finished swipe into a complete or delete request.
//!
//! # Invariants
//! - Rows cannot be reordered by dragging.
//! - No state is kept between gestures.

use serde::Serialize;

pub const DEFAULT_SWIPE_THRESHOLD: f32 = 0.5;

/// Integer rectangle in row coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SwipeAction {
    /// Right swipe, green background.
    Complete,
    /// Left swipe, red background.
    Delete,
}

/// What to draw behind a dragged row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwipeAffordance {
    pub action: SwipeAction,
    pub background: Rect,
    pub icon: Rect,
}

/// A swipe that crossed the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SwipeEvent {
    Complete { position: usize },
    /// The caller confirms before deleting.
    Delete { position: usize },
}

#[derive(Debug, Clone, Copy)]
pub struct SwipeGestureHelper {
    threshold: f32,
}

impl Default for SwipeGestureHelper {
    fn default() -> Self {
        Self::new(DEFAULT_SWIPE_THRESHOLD)
    }
}

impl SwipeGestureHelper {
    /// `threshold` is the fraction of the row width a swipe must cover.
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Drag-to-reorder is disabled.
    pub fn on_move(&self) -> bool {
        false
    }

    /// Layout for a row displaced by `dx` with an icon of `icon_size`.
    pub fn affordance(
        &self,
        row: Rect,
        dx: i32,
        icon_size: (i32, i32),
    ) -> Option<SwipeAffordance> {
        let (icon_width, icon_height) = icon_size;
        let margin = (row.height() - icon_height) / 2;
        let icon_top = row.top + margin;
        let icon_bottom = icon_top + icon_height;

        match dx {
            0 => None,
            dx if dx > 0 => {
                let icon_left = row.left + margin;
                Some(SwipeAffordance {
                    action: SwipeAction::Complete,
                    background: Rect::new(row.left, row.top, row.left + dx, row.bottom),
                    icon: Rect::new(icon_left, icon_top, icon_left + icon_width, icon_bottom),
                })
            }
            dx => {
                let icon_right = row.right - margin;
                Some(SwipeAffordance {
                    action: SwipeAction::Delete,
                    background: Rect::new(row.right + dx, row.top, row.right, row.bottom),
                    icon: Rect::new(icon_right - icon_width, icon_top, icon_right, icon_bottom),
                })
            }
        }
    }

    /// Resolves a released swipe on the row at `position` of a list of `len`.
    ///
    /// Non-finite input is never a swipe.
    pub fn on_swiped(&self, position: usize, len: usize, dx: f32, width: f32) -> Option<SwipeEvent> {
        if !dx.is_finite() || !width.is_finite() {
            return None;
        }
        if position >= len || width <= 0.0 || dx == 0.0 || dx.abs() < width * self.threshold {
            return None;
        }
        if dx > 0.0 {
            Some(SwipeEvent::Complete { position })
        } else {
            Some(SwipeEvent::Delete { position })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Rect, SwipeAction, SwipeEvent, SwipeGestureHelper};

    #[test]
    fn right_drag_draws_complete_from_left_edge() {
        let helper = SwipeGestureHelper::default();
        let row = Rect::new(0, 100, 400, 180);
        let affordance = helper.affordance(row, 120, (24, 24)).expect("drawn");

        assert_eq!(affordance.action, SwipeAction::Complete);
        assert_eq!(affordance.background, Rect::new(0, 100, 120, 180));
        assert_eq!(affordance.icon, Rect::new(28, 128, 52, 152));
    }

    #[test]
    fn left_drag_draws_delete_from_right_edge() {
        let helper = SwipeGestureHelper::default();
        let row = Rect::new(0, 100, 400, 180);
        let affordance = helper.affordance(row, -150, (24, 24)).expect("drawn");

        assert_eq!(affordance.action, SwipeAction::Delete);
        assert_eq!(affordance.background, Rect::new(250, 100, 400, 180));
        assert_eq!(affordance.icon, Rect::new(348, 128, 372, 152));
        assert!(helper.affordance(row, 0, (24, 24)).is_none());
    }

    #[test]
    fn swipe_must_cross_threshold_on_existing_row() {
        let helper = SwipeGestureHelper::default();
        assert!(!helper.on_move());
        assert_eq!(
            helper.on_swiped(1, 3, 250.0, 400.0),
            Some(SwipeEvent::Complete { position: 1 })
        );
        assert_eq!(
            helper.on_swiped(0, 3, -200.0, 400.0),
            Some(SwipeEvent::Delete { position: 0 })
        );
        assert_eq!(helper.on_swiped(0, 3, 150.0, 400.0), None);
        assert_eq!(helper.on_swiped(3, 3, 300.0, 400.0), None);
    }

    #[test]
    fn non_finite_drag_or_width_is_ignored() {
        let helper = SwipeGestureHelper::default();
        assert_eq!(helper.on_swiped(0, 3, f32::NAN, 400.0), None);
        assert_eq!(helper.on_swiped(0, 3, 1.0, f32::NAN), None);
        assert_eq!(helper.on_swiped(0, 3, f32::INFINITY, 400.0), None);
        assert_eq!(helper.on_swiped(0, 3, -300.0, f32::INFINITY), None);
    }
}
