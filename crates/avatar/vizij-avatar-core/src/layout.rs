//! Geometry helpers and the fit-to-surface placement rule.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    fn is_drawable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Offset of `self` relative to `origin`.
    pub fn relative_to(self, origin: Point) -> Point {
        Point::new(self.x - origin.x, self.y - origin.y)
    }

    pub fn distance(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Scale and top-left position for a model on a surface.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub scale: f32,
    pub position: Point,
}

/// Fit `model` inside `surface` at `margin` of the limiting axis and center
/// it using the scaled model size.
///
/// Returns `None` when either size is empty or not finite.
pub fn fit_to_surface(surface: Size, model: Size, margin: f32) -> Option<Placement> {
    if !surface.is_drawable() || !model.is_drawable() {
        return None;
    }
    let scale = (surface.width / model.width).min(surface.height / model.height) * margin;
    let x = (surface.width - model.width * scale) / 2.0;
    let y = (surface.height - model.height * scale) / 2.0;
    Some(Placement {
        scale,
        position: Point::new(x, y),
    })
}
