//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types. The
//! runtime translates window events into `InputEvent`s; `ActionMap` turns key
//! transitions into `InputAction`s so the camera and pipeline never see keys.

mod actions;
pub(crate) mod platform;
mod state;
mod types;

pub use actions::{ActionMap, InputAction};
pub use state::{InputState, KeyTransition};
pub use types::{InputEvent, Key, KeyState, Modifiers};
