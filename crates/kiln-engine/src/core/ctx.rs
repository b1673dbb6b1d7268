use crate::device::GraphicsDevice;
use crate::input::InputState;
use crate::time::FrameTime;

/// Per-tick context passed to `core::App::on_frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `GraphicsDevice<'w>`
pub struct FrameCtx<'a, 'w> {
    pub device: &'a mut GraphicsDevice<'w>,
    pub input: &'a InputState,
    pub time: FrameTime,
    /// Smoothed frame rate.
    pub fps: f32,
}
