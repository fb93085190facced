//! Game state and core simulation types

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use crate::consts::*;
use crate::tuning::Tuning;

/// New obstacles spawn this far past the right arena edge
pub const SPAWN_LEAD: f32 = 20.0;
/// Obstacles are dropped once their trailing edge is this far off-screen
pub const RETIRE_X: f32 = -80.0;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the first flap (face required to leave this phase)
    Start,
    /// Active gameplay
    Playing,
    /// Run ended, waiting for a restart flap
    GameOver,
}

/// The player-controlled sprite
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bird {
    /// Vertical position of the center
    pub y: f32,
    /// Vertical velocity (positive = downward)
    pub vy: f32,
}

impl Bird {
    pub fn centered() -> Self {
        Self {
            y: ARENA_H / 2.0,
            vy: 0.0,
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(BIRD_X, self.y)
    }
}

/// A scrolling obstacle column pair with a vertical gap
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Obstacle {
    /// Left edge of the column
    pub x: f32,
    /// Vertical center of the gap
    pub gap_center: f32,
    /// Set exactly once, when the trailing edge crosses the bird's x
    pub passed: bool,
}

impl Obstacle {
    /// Rectangle of the column above the gap
    pub fn top_rect(&self, tuning: &Tuning) -> Rect {
        Rect::new(
            self.x,
            0.0,
            tuning.obstacle_width,
            self.gap_center - tuning.gap_height / 2.0,
        )
    }

    /// Rectangle of the column below the gap
    pub fn bottom_rect(&self, tuning: &Tuning) -> Rect {
        let top = self.gap_center + tuning.gap_height / 2.0;
        Rect::new(self.x, top, tuning.obstacle_width, ARENA_H - top)
    }
}

/// Things that happened during a tick, for the shell to map to sound,
/// persistence and UI changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Flap was requested without a sprite available
    FacePickerRequested,
    /// The bird flapped
    Flapped,
    /// Gameplay paused
    Paused,
    /// Gameplay resumed
    Resumed,
    /// An obstacle was cleared; payload is the new score
    Scored(u32),
    /// The best score was beaten; payload is the new best
    NewBest(u32),
    /// The run ended
    GameOver,
}

/// Complete game session state
#[derive(Debug, Clone)]
pub struct GameSession {
    /// Run seed for reproducibility
    pub seed: u64,
    pub phase: GamePhase,
    /// Valid only while Playing
    pub paused: bool,
    pub score: u32,
    /// Monotonic across restarts; persisted by the shell on NewBest
    pub best: u32,
    pub bird: Bird,
    /// Ordered by spawn time, i.e. ascending x while moving
    pub obstacles: Vec<Obstacle>,
    /// Collisions and bounds checks are skipped before this timestamp (ms)
    pub invincible_until: f64,
    /// Timestamp of the last obstacle spawn (ms)
    pub last_spawn: f64,
    /// Randomized interval until the next spawn (ms)
    pub next_spawn_ms: f64,
    pub tuning: Tuning,
    rng: Pcg32,
}

impl GameSession {
    pub fn new(seed: u64, best: u32, tuning: Tuning) -> Self {
        let next_spawn_ms = tuning.spawn_base_ms;
        Self {
            seed,
            phase: GamePhase::Start,
            paused: false,
            score: 0,
            best,
            bird: Bird::centered(),
            obstacles: Vec::new(),
            invincible_until: 0.0,
            last_spawn: 0.0,
            next_spawn_ms,
            tuning,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Reset to the Start phase: re-center the bird, clear obstacles and
    /// score, drop any invincibility. Best score and RNG stream carry over.
    pub fn reset(&mut self) {
        self.bird = Bird::centered();
        self.obstacles.clear();
        self.score = 0;
        self.last_spawn = 0.0;
        self.invincible_until = 0.0;
        self.phase = GamePhase::Start;
        self.paused = false;
    }

    /// Delayed start scheduled after a face confirmation; only fires from Start
    pub fn autostart(&mut self) {
        if self.phase == GamePhase::Start {
            self.phase = GamePhase::Playing;
        }
    }

    /// Push a fresh obstacle at the right edge and re-roll the next interval
    pub(super) fn spawn_obstacle(&mut self) {
        let tuning = &self.tuning;
        let min = tuning.spawn_padding + tuning.gap_height / 2.0;
        let max = ARENA_H - tuning.spawn_padding - tuning.gap_height / 2.0;
        // A gap taller than the padded arena pins the center to the middle
        let gap_center = if min < max {
            self.rng.random_range(min..max)
        } else {
            ARENA_H / 2.0
        };

        self.obstacles.push(Obstacle {
            x: ARENA_W + SPAWN_LEAD,
            gap_center,
            passed: false,
        });

        let jitter = tuning.spawn_jitter_ms;
        self.next_spawn_ms = tuning.spawn_base_ms
            + if jitter > 0.0 {
                self.rng.random_range(-jitter..jitter)
            } else {
                0.0
            };
    }
}
