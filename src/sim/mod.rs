//! Gameplay simulation
//!
//! All game logic lives here. This module must stay pure and natively
//! testable:
//! - Wall-clock timestamps come in as parameters
//! - Seeded RNG only
//! - No rendering or platform dependencies; side effects are reported as
//!   [`GameEvent`]s for the shell to act on

pub mod collision;
pub mod state;
pub mod tick;

pub use collision::{Rect, circle_rect_collides};
pub use state::{Bird, GameEvent, GamePhase, GameSession, Obstacle};
pub use tick::{TickInput, dt_scale, tick};
