//! Pointer input: per-frame gaze coalescing and tap detection.

use serde::{Deserialize, Serialize};

use crate::layout::Point;

/// Mouse/pointer button as reported by DOM `button` codes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum PointerButton {
    Primary,
    Auxiliary,
    Secondary,
    Other(i16),
}

impl From<i16> for PointerButton {
    fn from(code: i16) -> Self {
        match code {
            0 => PointerButton::Primary,
            1 => PointerButton::Auxiliary,
            2 => PointerButton::Secondary,
            n => PointerButton::Other(n),
        }
    }
}

/// Keeps only the most recent gaze target between frame boundaries.
#[derive(Debug, Default)]
pub struct GazeCoalescer {
    pending: Option<Point>,
    frame_requested: bool,
}

impl GazeCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a target. Returns `true` when the caller has to schedule a
    /// frame callback, i.e. for the first point of a frame window.
    pub fn push(&mut self, local: Point) -> bool {
        self.pending = Some(local);
        if self.frame_requested {
            false
        } else {
            self.frame_requested = true;
            true
        }
    }

    /// Frame boundary: hand out the latest target and open a new window.
    pub fn take(&mut self) -> Option<Point> {
        self.frame_requested = false;
        self.pending.take()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Distinguishes a click from a drag by the travel between press and release.
#[derive(Debug)]
pub struct TapDetector {
    pressed_at: Option<Point>,
    tolerance: f32,
}

impl TapDetector {
    pub fn new(tolerance: f32) -> Self {
        Self {
            pressed_at: None,
            tolerance: tolerance.max(0.0),
        }
    }

    pub fn press(&mut self, button: PointerButton, local: Point) {
        self.pressed_at = match button {
            PointerButton::Primary => Some(local),
            _ => None,
        };
    }

    /// Returns the tap point if this release completes a primary-button click.
    pub fn release(&mut self, button: PointerButton, local: Point) -> Option<Point> {
        let start = self.pressed_at.take()?;
        if button != PointerButton::Primary {
            return None;
        }
        if start.distance(local) <= self.tolerance {
            Some(local)
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.pressed_at = None;
    }
}
