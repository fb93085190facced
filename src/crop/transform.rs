//! Placement of the source image inside the crop workspace

use glam::Vec2;

use crate::consts::DEFAULT_ZOOM;

/// Scale, rotation, and offset of the source image relative to the
/// workspace. `offset` is the workspace-space position of the image's own
/// centre. Every setter clamps or normalizes instead of rejecting, so
/// applying the same input twice always lands on the same value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    scale: f32,
    /// Radians, positive clockwise in screen space
    rotation: f32,
    offset: Vec2,
    center: Vec2,
    min_zoom: f32,
    max_zoom: f32,
}

impl Transform {
    pub fn new(workspace_size: u32, min_zoom: f32, max_zoom: f32) -> Self {
        let center = Vec2::splat(workspace_size as f32 / 2.0);
        Self {
            scale: DEFAULT_ZOOM.clamp(min_zoom, max_zoom),
            rotation: 0.0,
            offset: center,
            center,
            min_zoom,
            max_zoom,
        }
    }

    /// Back to the defaults: default zoom, no rotation, image centred.
    pub fn reset(&mut self) {
        self.scale = DEFAULT_ZOOM.clamp(self.min_zoom, self.max_zoom);
        self.rotation = 0.0;
        self.offset = self.center;
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn min_zoom(&self) -> f32 {
        self.min_zoom
    }

    pub fn max_zoom(&self) -> f32 {
        self.max_zoom
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale.clamp(self.min_zoom, self.max_zoom);
    }

    pub fn set_rotation(&mut self, radians: f32) {
        self.rotation = radians;
    }

    /// Set rotation from a degree value, quantized to whole degrees and
    /// clamped to [-180, 180]. Both the slider and the pinch gesture go
    /// through this, so the stored rotation is always a whole-degree step.
    pub fn set_rotation_degrees(&mut self, degrees: f32) {
        let deg = degrees.round().clamp(-180.0, 180.0);
        self.rotation = deg.to_radians();
    }

    /// Current rotation as the whole-degree value the rotation input shows.
    pub fn rotation_degrees(&self) -> i32 {
        self.rotation.to_degrees().round() as i32
    }

    pub fn translate_by(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    pub fn set_offset(&mut self, offset: Vec2) {
        self.offset = offset;
    }

    /// Re-centre the image without touching zoom or rotation.
    pub fn snap_to_center(&mut self) {
        self.offset = self.center;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{MAX_ZOOM, MIN_ZOOM, WORKSPACE_SIZE};
    use proptest::prelude::*;

    fn transform() -> Transform {
        Transform::new(WORKSPACE_SIZE, MIN_ZOOM, MAX_ZOOM)
    }

    #[test]
    fn test_new_starts_at_defaults() {
        let t = transform();
        assert_eq!(t.scale(), DEFAULT_ZOOM);
        assert_eq!(t.rotation(), 0.0);
        assert_eq!(t.offset(), Vec2::splat(150.0));
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut t = transform();
        t.set_scale(2.4);
        t.set_rotation_degrees(45.0);
        t.translate_by(Vec2::new(-30.0, 12.0));
        t.reset();
        assert_eq!(t, transform());
    }

    #[test]
    fn test_rotation_degrees_quantize_and_clamp() {
        let mut t = transform();
        t.set_rotation_degrees(44.6);
        assert_eq!(t.rotation_degrees(), 45);
        t.set_rotation_degrees(300.0);
        assert_eq!(t.rotation_degrees(), 180);
        t.set_rotation_degrees(-300.0);
        assert_eq!(t.rotation_degrees(), -180);
    }

    #[test]
    fn test_translate_accumulates() {
        let mut t = transform();
        t.translate_by(Vec2::new(10.0, -5.0));
        t.translate_by(Vec2::new(2.0, 3.0));
        assert_eq!(t.offset(), Vec2::new(162.0, 148.0));
    }

    #[test]
    fn test_snap_to_center_keeps_zoom_and_rotation() {
        let mut t = transform();
        t.set_scale(2.0);
        t.set_rotation_degrees(30.0);
        t.set_offset(Vec2::new(10.0, 290.0));
        t.snap_to_center();
        assert_eq!(t.offset(), Vec2::splat(150.0));
        assert_eq!(t.scale(), 2.0);
        assert_eq!(t.rotation_degrees(), 30);
    }

    proptest! {
        #[test]
        fn prop_set_scale_lands_in_bounds_and_is_idempotent(s in -100.0f32..100.0) {
            let mut t = transform();
            t.set_scale(s);
            let once = t.scale();
            prop_assert!((MIN_ZOOM..=MAX_ZOOM).contains(&once));
            t.set_scale(once);
            prop_assert_eq!(t.scale(), once);
        }

        #[test]
        fn prop_set_rotation_degrees_is_idempotent(d in -720.0f32..720.0) {
            let mut t = transform();
            t.set_rotation_degrees(d);
            let once = t.rotation();
            t.set_rotation_degrees(t.rotation_degrees() as f32);
            prop_assert_eq!(t.rotation(), once);
        }
    }
}
