//! Pointer and touch gestures driving the crop transform

use glam::Vec2;

use super::transform::Transform;

/// Mapping from raw client coordinates onto the workspace canvas. Built
/// fresh from the canvas bounding rect on every event, since layout and
/// page zoom can change between events.
#[derive(Debug, Clone, Copy)]
pub struct ViewMetrics {
    origin: Vec2,
    client_size: Vec2,
    workspace_size: f32,
}

impl ViewMetrics {
    pub fn new(origin: Vec2, client_size: Vec2, workspace_size: f32) -> Self {
        Self {
            origin,
            client_size,
            workspace_size,
        }
    }

    /// 1:1 mapping, for a canvas displayed at its logical size.
    pub fn identity(workspace_size: f32) -> Self {
        Self::new(Vec2::ZERO, Vec2::splat(workspace_size), workspace_size)
    }

    pub fn to_workspace(&self, client: Vec2) -> Vec2 {
        (client - self.origin) * Vec2::splat(self.workspace_size) / self.client_size
    }
}

/// Translates pointer event sequences into transform updates. Two mutually
/// exclusive modes: single-pointer drag (pan) and two-pointer pinch
/// (zoom + rotate). Positions passed in are raw client coordinates; drag
/// deltas go through [`ViewMetrics`], while the pinch only uses ratios and
/// angle differences, which the mapping cannot change.
#[derive(Debug, Clone, Default)]
pub struct GestureController {
    dragging: bool,
    gesturing: bool,
    last_pos: Vec2,
    start_dist: f32,
    start_angle: f32,
    start_scale: f32,
    start_rotation: f32,
}

impl GestureController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn is_gesturing(&self) -> bool {
        self.gesturing
    }

    pub fn pointer_down(&mut self, transform: &Transform, view: &ViewMetrics, touches: &[Vec2]) {
        match touches {
            [a, b] => {
                self.gesturing = true;
                self.dragging = false;
                self.start_dist = a.distance(*b);
                self.start_angle = touch_angle(*a, *b);
                self.start_scale = transform.scale();
                self.start_rotation = transform.rotation();
            }
            [first, ..] => {
                self.gesturing = false;
                self.dragging = true;
                self.last_pos = view.to_workspace(*first);
            }
            [] => {}
        }
    }

    pub fn pointer_move(&mut self, transform: &mut Transform, view: &ViewMetrics, touches: &[Vec2]) {
        if self.gesturing && touches.len() == 2 {
            let (a, b) = (touches[0], touches[1]);
            let dist = a.distance(b);
            let angle = touch_angle(a, b);

            let ratio = if self.start_dist > 0.0 {
                dist / self.start_dist
            } else {
                1.0
            };
            transform.set_scale(self.start_scale * ratio);

            let rotation = self.start_rotation + (angle - self.start_angle);
            transform.set_rotation_degrees(rotation.to_degrees());
            return;
        }

        if !self.dragging {
            return;
        }
        let Some(first) = touches.first() else {
            return;
        };
        let pos = view.to_workspace(*first);
        transform.translate_by(pos - self.last_pos);
        self.last_pos = pos;
    }

    /// `remaining` is the number of pointers still down after the release.
    /// Dropping from two pointers to one ends the pinch but does not resume
    /// dragging; that takes a fresh pointer-down.
    pub fn pointer_up(&mut self, remaining: usize) {
        if remaining < 2 {
            self.gesturing = false;
        }
        if remaining == 0 {
            self.dragging = false;
        }
    }
}

fn touch_angle(a: Vec2, b: Vec2) -> f32 {
    let d = b - a;
    d.y.atan2(d.x)
}
