//! Startup settings.
//!
//! Settings are read once at startup and passed by reference to the device and
//! the frame pipeline. Nothing in the engine reads configuration through a global.

mod settings;

pub use settings::Settings;
