//! Data-driven game balance
//!
//! Gameplay constants gathered in one serde-friendly struct so tests and the
//! shell can override individual values without touching code.

use serde::{Deserialize, Serialize};

/// Gameplay tuning values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tuning {
    /// Downward acceleration per reference frame
    pub gravity: f32,
    /// Upward velocity applied on flap (negative = up)
    pub flap_impulse: f32,
    /// Obstacle scroll speed per reference frame
    pub obstacle_speed: f32,
    /// Obstacle column width
    pub obstacle_width: f32,
    /// Vertical opening between the top and bottom columns
    pub gap_height: f32,
    /// Minimum distance from the arena edge to a gap center
    pub spawn_padding: f32,
    /// Base interval between obstacle spawns (ms)
    pub spawn_base_ms: f64,
    /// Spawn interval jitter, drawn uniformly from +/- this (ms)
    pub spawn_jitter_ms: f64,
    /// Collision/out-of-bounds immunity after a restart (ms)
    pub invincible_ms: f64,
    /// Grace period between confirming a face and the game starting (ms)
    pub autostart_delay_ms: i32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity: 0.25,
            flap_impulse: -6.0,
            obstacle_speed: 1.4,
            obstacle_width: 76.0,
            gap_height: 250.0,
            spawn_padding: 60.0,
            spawn_base_ms: 2500.0,
            spawn_jitter_ms: 400.0,
            invincible_ms: 1200.0,
            autostart_delay_ms: 2000,
        }
    }
}
