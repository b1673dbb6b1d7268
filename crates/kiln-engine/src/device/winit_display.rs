use winit::dpi::PhysicalSize;
use winit::monitor::{MonitorHandle, VideoModeHandle};
use winit::window::{Fullscreen, Window};

use super::display::{DisplayHost, DisplayMode};

/// [`DisplayHost`] backed by a winit window.
pub struct WinitDisplay<'w> {
    window: &'w Window,
}

impl<'w> WinitDisplay<'w> {
    pub fn new(window: &'w Window) -> Self {
        Self { window }
    }

    fn monitor(&self, index: usize) -> Option<MonitorHandle> {
        self.window.available_monitors().nth(index)
    }
}

impl DisplayHost for WinitDisplay<'_> {
    fn monitor_count(&self) -> usize {
        self.window.available_monitors().count()
    }

    fn monitor_size(&self, index: usize) -> Option<(u32, u32)> {
        self.monitor(index).map(|m| {
            let size = m.size();
            (size.width, size.height)
        })
    }

    fn apply_window_style(&mut self, mode: DisplayMode, monitor: usize, size: (u32, u32)) {
        let handle = self.monitor(monitor);
        match mode {
            DisplayMode::Windowed => {
                self.window.set_fullscreen(None);
                self.window.set_decorations(true);
                let _ = self
                    .window
                    .request_inner_size(PhysicalSize::new(size.0, size.1));
                if let Some(m) = handle {
                    self.window.set_outer_position(m.position());
                }
            }
            DisplayMode::Borderless => {
                self.window
                    .set_fullscreen(Some(Fullscreen::Borderless(handle)));
            }
            // Handled by `set_exclusive_fullscreen` once the back buffer exists.
            DisplayMode::Fullscreen => {}
        }
    }

    fn set_exclusive_fullscreen(&mut self, monitor: Option<usize>, size: (u32, u32)) {
        let Some(index) = monitor else {
            self.window.set_fullscreen(None);
            return;
        };

        let Some(handle) = self.monitor(index) else {
            log::warn!("monitor {index} disappeared before entering fullscreen");
            return;
        };

        match closest_video_mode(&handle, size) {
            Some(mode) => {
                log::debug!(
                    "exclusive fullscreen on monitor {index}: {}x{} @ {} mHz",
                    mode.size().width,
                    mode.size().height,
                    mode.refresh_rate_millihertz()
                );
                self.window.set_fullscreen(Some(Fullscreen::Exclusive(mode)));
            }
            None => {
                log::warn!("monitor {index} reports no video modes; using borderless fullscreen");
                self.window
                    .set_fullscreen(Some(Fullscreen::Borderless(Some(handle))));
            }
        }
    }

    fn request_window_size(&mut self, (width, height): (u32, u32)) {
        // Applied later on some platforms; the Resized event that follows is a no-op.
        let _ = self.window.request_inner_size(PhysicalSize::new(width, height));
    }

    fn window_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    fn set_cursor_visible(&mut self, visible: bool) {
        self.window.set_cursor_visible(visible);
    }

    fn pre_present(&self) {
        self.window.pre_present_notify();
    }
}

/// Picks the video mode nearest `size`, preferring the highest refresh rate.
fn closest_video_mode(monitor: &MonitorHandle, (w, h): (u32, u32)) -> Option<VideoModeHandle> {
    monitor.video_modes().min_by_key(|m| {
        let s = m.size();
        let distance = u64::from(s.width.abs_diff(w)) + u64::from(s.height.abs_diff(h));
        (distance, std::cmp::Reverse(m.refresh_rate_millihertz()))
    })
}
