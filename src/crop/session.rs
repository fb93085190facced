//! One interactive crop session

use glam::Vec2;
use image::RgbaImage;

use super::gesture::{GestureController, ViewMetrics};
use super::render;
use super::transform::Transform;
use crate::consts::{MAX_ZOOM, MIN_ZOOM, WORKSPACE_SIZE};

/// Lifecycle of the source image behind the workspace.
#[derive(Debug, Clone)]
pub enum SourceState {
    Empty,
    /// A decode is in flight. `prior` keeps the previous image on screen
    /// until the new one lands (or the load fails).
    Loading {
        request: u64,
        prior: Option<RgbaImage>,
    },
    Ready(RgbaImage),
}

/// Owns everything one crop interaction needs: the source image lifecycle,
/// the transform, and gesture state. All mutations go through methods here,
/// so the whole flow can be driven synthetically in tests without a canvas.
#[derive(Debug, Clone)]
pub struct CropSession {
    source: SourceState,
    pub transform: Transform,
    gesture: GestureController,
    workspace_size: u32,
    next_request: u64,
}

impl CropSession {
    pub fn new() -> Self {
        Self {
            source: SourceState::Empty,
            transform: Transform::new(WORKSPACE_SIZE, MIN_ZOOM, MAX_ZOOM),
            gesture: GestureController::new(),
            workspace_size: WORKSPACE_SIZE,
            next_request: 1,
        }
    }

    pub fn workspace_size(&self) -> u32 {
        self.workspace_size
    }

    pub fn source(&self) -> &SourceState {
        &self.source
    }

    /// The image currently shown in the workspace. During a load this is
    /// still the previous image, never a torn or partial one.
    pub fn image(&self) -> Option<&RgbaImage> {
        match &self.source {
            SourceState::Empty => None,
            SourceState::Loading { prior, .. } => prior.as_ref(),
            SourceState::Ready(img) => Some(img),
        }
    }

    pub fn has_image(&self) -> bool {
        self.image().is_some()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.source, SourceState::Loading { .. })
    }

    /// Start an asynchronous image load. Returns the request token the
    /// decode must present on completion; starting another load supersedes
    /// this one (its completion will be ignored).
    pub fn begin_load(&mut self) -> u64 {
        let request = self.next_request;
        self.next_request += 1;
        let prior = match std::mem::replace(&mut self.source, SourceState::Empty) {
            SourceState::Empty => None,
            SourceState::Loading { prior, .. } => prior,
            SourceState::Ready(img) => Some(img),
        };
        self.source = SourceState::Loading { request, prior };
        request
    }

    /// Deliver a decoded image for an earlier [`begin_load`]. Stale tokens
    /// are dropped so only the most recent request ever lands.
    ///
    /// [`begin_load`]: CropSession::begin_load
    pub fn complete_load(&mut self, token: u64, image: RgbaImage) -> bool {
        if !self.is_current_request(token) {
            return false;
        }
        self.set_image(image);
        true
    }

    /// A load failed or was cancelled; put the previous image back.
    pub fn abort_load(&mut self, token: u64) -> bool {
        if !self.is_current_request(token) {
            return false;
        }
        self.source = match std::mem::replace(&mut self.source, SourceState::Empty) {
            SourceState::Loading {
                prior: Some(img), ..
            } => SourceState::Ready(img),
            _ => SourceState::Empty,
        };
        true
    }

    fn is_current_request(&self, token: u64) -> bool {
        matches!(self.source, SourceState::Loading { request, .. } if request == token)
    }

    /// Install a new source image directly (camera capture, preset) and
    /// start the crop from the default placement.
    pub fn set_image(&mut self, image: RgbaImage) {
        self.source = SourceState::Ready(image);
        self.transform.reset();
    }

    pub fn reset_transform(&mut self) {
        self.transform.reset();
    }

    pub fn snap_to_center(&mut self) {
        self.transform.snap_to_center();
    }

    pub fn set_zoom(&mut self, value: f32) {
        self.transform.set_scale(value);
    }

    pub fn set_rotation_degrees(&mut self, degrees: f32) {
        self.transform.set_rotation_degrees(degrees);
    }

    pub fn pointer_down(&mut self, view: &ViewMetrics, touches: &[Vec2]) {
        if !self.has_image() {
            return;
        }
        self.gesture.pointer_down(&self.transform, view, touches);
    }

    pub fn pointer_move(&mut self, view: &ViewMetrics, touches: &[Vec2]) {
        if !self.has_image() {
            return;
        }
        self.gesture.pointer_move(&mut self.transform, view, touches);
    }

    pub fn pointer_up(&mut self, remaining: usize) {
        self.gesture.pointer_up(remaining);
    }

    /// Whether a drag or pinch is in progress. Pointer moves only change
    /// the transform while this holds.
    pub fn is_pointer_active(&self) -> bool {
        self.gesture.is_dragging() || self.gesture.is_gesturing()
    }

    pub fn render_workspace(&self) -> RgbaImage {
        render::render_workspace(self.image(), &self.transform, self.workspace_size)
    }

    pub fn render_crop(&self, out_size: u32) -> RgbaImage {
        render::render_circular_crop(self.image(), &self.transform, self.workspace_size, out_size)
    }
}

impl Default for CropSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn image(tint: u8) -> RgbaImage {
        RgbaImage::from_pixel(64, 64, Rgba([tint, tint, tint, 255]))
    }

    #[test]
    fn test_load_lifecycle() {
        let mut session = CropSession::new();
        assert!(!session.has_image());

        let token = session.begin_load();
        assert!(session.is_loading());
        assert!(session.image().is_none());

        assert!(session.complete_load(token, image(10)));
        assert!(session.has_image());
        assert!(!session.is_loading());
    }

    #[test]
    fn test_new_load_supersedes_in_flight_one() {
        let mut session = CropSession::new();
        let stale = session.begin_load();
        let current = session.begin_load();

        // the superseded decode finishes late and is ignored
        assert!(!session.complete_load(stale, image(1)));
        assert!(session.image().is_none());

        assert!(session.complete_load(current, image(2)));
        assert_eq!(session.image().unwrap().get_pixel(0, 0).0[0], 2);
    }

    #[test]
    fn test_failed_load_restores_prior_image() {
        let mut session = CropSession::new();
        session.set_image(image(7));

        let token = session.begin_load();
        assert!(session.image().is_some(), "prior stays visible mid-load");
        assert!(session.abort_load(token));

        assert!(!session.is_loading());
        assert_eq!(session.image().unwrap().get_pixel(0, 0).0[0], 7);
    }

    #[test]
    fn test_set_image_resets_transform() {
        let mut session = CropSession::new();
        session.set_image(image(1));
        session.set_zoom(2.5);
        session.set_rotation_degrees(90.0);

        session.set_image(image(2));
        assert_eq!(session.transform.scale(), crate::consts::DEFAULT_ZOOM);
        assert_eq!(session.transform.rotation_degrees(), 0);
    }

    #[test]
    fn test_pointers_ignored_without_image() {
        let mut session = CropSession::new();
        let view = ViewMetrics::identity(session.workspace_size() as f32);
        let before = session.transform;

        session.pointer_down(&view, &[Vec2::new(10.0, 10.0)]);
        session.pointer_move(&view, &[Vec2::new(60.0, 60.0)]);
        assert_eq!(session.transform, before);
    }

    #[test]
    fn test_drag_moves_offset_once_ready() {
        let mut session = CropSession::new();
        session.set_image(image(9));
        let view = ViewMetrics::identity(session.workspace_size() as f32);
        let start = session.transform.offset();

        session.pointer_down(&view, &[Vec2::new(10.0, 10.0)]);
        session.pointer_move(&view, &[Vec2::new(25.0, 4.0)]);
        session.pointer_up(0);

        assert_eq!(session.transform.offset(), start + Vec2::new(15.0, -6.0));
    }
}
