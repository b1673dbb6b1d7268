use anyhow::Result;

use crate::device::GraphicsDevice;
use crate::input::InputAction;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by the runtime.
///
/// Every callback runs on the thread that owns the device.
pub trait App {
    /// Called once after the window and device exist. An error ends the run.
    fn on_start(&mut self, device: &mut GraphicsDevice<'_>) -> Result<()>;

    /// Called for each mapped input action. Returns whether it was consumed.
    fn on_input(&mut self, action: InputAction, pressed: bool) -> bool {
        let _ = (action, pressed);
        false
    }

    /// Called when the OS resized the window's client area.
    fn on_resized(&mut self, width: u32, height: u32) {
        let _ = (width, height);
    }

    /// Called once per tick, after all pending window events.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Called before the device shuts down. Release caller-owned resources here.
    fn on_shutdown(&mut self, device: &mut GraphicsDevice<'_>) {
        let _ = device;
    }
}
