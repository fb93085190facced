//! Collision detection between the bird and obstacle columns
//!
//! The bird is a circle, obstacle columns are axis-aligned rectangles. The
//! test clamps the circle center to the rectangle on each axis to find the
//! nearest point, then compares squared distance against squared radius,
//! which handles the center being inside, beside, or diagonal to the rect.

use glam::Vec2;

/// Axis-aligned rectangle (top-left origin, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }
}

/// Check whether a circle overlaps an axis-aligned rectangle
pub fn circle_rect_collides(center: Vec2, radius: f32, rect: &Rect) -> bool {
    let closest = Vec2::new(
        center.x.clamp(rect.x, rect.x + rect.w),
        center.y.clamp(rect.y, rect.y + rect.h),
    );
    let delta = center - closest;
    delta.length_squared() <= radius * radius
}
