//! Frame timing.
//!
//! One `Timer` drives the render loop; `tick()` is called once per frame.

mod timer;

pub use timer::{FrameTime, Timer};
