//! Flappy Face - a flappy-bird variant where the bird is your own face
//!
//! Core modules:
//! - `sim`: Deterministic game simulation (physics, collisions, scoring)
//! - `crop`: Interactive image crop pipeline (transform, gestures, renderer)
//! - `face`: Sprite persistence with inactivity expiry
//! - `presets`: Pre-made cartoon faces rasterized on the CPU
//! - `render`: Canvas 2d presentation (wasm only)
//! - `tuning`: Data-driven game balance

pub mod crop;
pub mod face;
pub mod presets;
pub mod scores;
pub mod settings;
pub mod sim;
pub mod store;
pub mod tuning;

#[cfg(target_arch = "wasm32")]
pub mod audio;
#[cfg(target_arch = "wasm32")]
pub mod render;

pub use settings::Settings;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Playfield dimensions (logical pixels)
    pub const ARENA_W: f32 = 480.0;
    pub const ARENA_H: f32 = 640.0;

    /// Frame-time normalization: elapsed ms is divided by this to get dtScale
    pub const REFERENCE_FRAME_MS: f64 = 16.67;
    /// Elapsed time cap so tab switches don't integrate into a huge jump
    pub const MAX_FRAME_DELTA_MS: f64 = 32.0;

    /// Bird defaults
    pub const BIRD_X: f32 = 120.0;
    /// Visual radius (the sprite is drawn at this size)
    pub const BIRD_RADIUS: f32 = 32.5;
    /// Collision circle is deliberately smaller than the visual disc
    pub const COLLISION_RADIUS: f32 = 16.0;

    /// Crop workspace (square) and the fixed crop circle inside it
    pub const WORKSPACE_SIZE: u32 = 300;
    pub const CROP_RADIUS_FRAC: f32 = 0.35;

    /// Zoom slider bounds and the reset default
    pub const MIN_ZOOM: f32 = 0.5;
    pub const MAX_ZOOM: f32 = 3.0;
    pub const DEFAULT_ZOOM: f32 = 1.2;

    /// Sprite export = bird diameter x this multiplier
    pub const FACE_RENDER_SCALE: u32 = 2;

    /// Persisted sprite expires after this much inactivity
    pub const FACE_TTL_MS: f64 = 30.0 * 60.0 * 1000.0;
    /// How often the background sweep checks for expiry
    pub const FACE_SWEEP_INTERVAL_MS: i32 = 60_000;
}

