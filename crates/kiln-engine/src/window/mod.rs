//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the single window, and wires them to the
//! graphics device and the application.

mod runtime;

pub use runtime::Runtime;
