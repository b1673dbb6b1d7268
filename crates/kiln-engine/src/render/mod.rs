//! Render pass recording.

mod pass;

pub use pass::DrawPass;
