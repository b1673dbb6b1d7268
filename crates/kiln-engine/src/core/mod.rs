//! Core contracts between the runtime loop and the application.
//!
//! The runtime owns the window and the graphics device; the application sees
//! input actions, resize notifications and one `FrameCtx` per tick.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::FrameCtx;
