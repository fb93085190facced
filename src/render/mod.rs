//! Browser presentation layer.
//!
//! Canvas 2D painting and pixel transfer for the WASM build. Everything
//! here is display glue over the pure state in `sim` and `crop`; nothing
//! below this module touches the DOM.

pub mod bitmap;
pub mod scene;

pub use scene::{CloudField, draw_frame};
