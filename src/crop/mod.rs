//! Interactive circular crop pipeline
//!
//! The flow: [`gesture`] turns pointer/touch sequences into [`transform`]
//! updates, [`render`] rasterizes the workspace preview and the final
//! circular export, and [`session`] owns one crop interaction end to end.
//! Everything here is pure CPU work so it runs and tests natively.

pub mod gesture;
pub mod render;
pub mod session;
pub mod transform;

pub use gesture::{GestureController, ViewMetrics};
pub use render::{WORKSPACE_BG, crop_circle, render_circular_crop, render_workspace};
pub use session::{CropSession, SourceState};
pub use transform::Transform;
