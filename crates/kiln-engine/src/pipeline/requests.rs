use crate::input::InputAction;

/// Resolution step for grow/shrink, keeping 16:9.
pub const RESOLUTION_STEP: (u32, u32) = (16, 9);

/// Requested display mode.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ModeRequest {
    pub fullscreen: bool,
    pub borderless: bool,
    pub monitor: usize,
}

/// Display changes waiting for the end of the tick.
///
/// Input handlers move the machine out of `Stable`; the frame pipeline takes
/// the pending request once per tick, after present.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum DisplayRequests {
    #[default]
    Stable,
    /// A mode change, optionally followed by a resize requested in the same tick.
    PendingModeChange {
        mode: ModeRequest,
        resize: Option<(u32, u32)>,
    },
    PendingResize { width: u32, height: u32 },
}

impl DisplayRequests {
    pub fn is_stable(&self) -> bool {
        matches!(self, DisplayRequests::Stable)
    }

    /// Requests a mode change. A later request in the same tick replaces an
    /// earlier one; a pending resize is kept and applied after the mode.
    pub fn request_mode(&mut self, mode: ModeRequest) {
        let resize = match *self {
            DisplayRequests::Stable => None,
            DisplayRequests::PendingModeChange { resize, .. } => resize,
            DisplayRequests::PendingResize { width, height } => Some((width, height)),
        };
        *self = DisplayRequests::PendingModeChange { mode, resize };
    }

    /// Requests a resize. The latest size wins.
    pub fn request_resize(&mut self, width: u32, height: u32) {
        *self = match *self {
            DisplayRequests::PendingModeChange { mode, .. } => DisplayRequests::PendingModeChange {
                mode,
                resize: Some((width, height)),
            },
            DisplayRequests::Stable | DisplayRequests::PendingResize { .. } => {
                DisplayRequests::PendingResize { width, height }
            }
        };
    }

    /// Returns the pending request and goes back to `Stable`.
    pub fn take(&mut self) -> DisplayRequests {
        std::mem::take(self)
    }
}

/// Display and toggle state driven by input actions.
#[derive(Debug, Clone)]
pub struct DisplayControls {
    pub fullscreen: bool,
    pub borderless: bool,
    pub monitor: usize,
    pub monitor_count: usize,
    /// Resolution applied by the next `ApplyResolution`.
    pub resolution: (u32, u32),
    /// Upper bound for either side of `resolution`.
    pub max_dimension: u32,
    pub post_fx: bool,
    pub wireframe: bool,
    /// Presentation mode wanted after the current frame.
    pub vsync: bool,
    pub requests: DisplayRequests,
}

impl DisplayControls {
    pub fn new(resolution: (u32, u32), post_fx: bool, monitor_count: usize) -> Self {
        Self {
            fullscreen: false,
            borderless: false,
            monitor: 0,
            monitor_count: monitor_count.max(1),
            resolution,
            max_dimension: u32::MAX,
            post_fx,
            wireframe: false,
            vsync: true,
            requests: DisplayRequests::Stable,
        }
    }

    fn mode(&self) -> ModeRequest {
        ModeRequest {
            fullscreen: self.fullscreen,
            borderless: self.borderless,
            monitor: self.monitor,
        }
    }

    /// Applies a display or toggle action. Returns whether it was consumed.
    ///
    /// Actions fire on press; releases of these actions are consumed silently.
    pub fn handle_action(&mut self, action: InputAction, pressed: bool) -> bool {
        use InputAction::*;

        let consumed = matches!(
            action,
            ToggleFullscreen
                | ToggleBorderless
                | CycleMonitor
                | GrowResolution
                | ShrinkResolution
                | ApplyResolution
                | TogglePostFx
                | ToggleWireframe
                | ToggleVsync
        );
        if !consumed || !pressed {
            return consumed;
        }

        match action {
            ToggleFullscreen => {
                self.fullscreen = !self.fullscreen;
                self.borderless = false;
                self.requests.request_mode(self.mode());
            }
            ToggleBorderless => {
                self.fullscreen = false;
                self.borderless = !self.borderless;
                self.requests.request_mode(self.mode());
            }
            CycleMonitor => {
                self.monitor = (self.monitor + 1) % self.monitor_count;
                log::info!("monitor {} of {}", self.monitor + 1, self.monitor_count);
                self.requests.request_mode(self.mode());
            }
            GrowResolution => {
                let max = self.max_dimension;
                self.resolution.0 = self.resolution.0.saturating_add(RESOLUTION_STEP.0).min(max);
                self.resolution.1 = self.resolution.1.saturating_add(RESOLUTION_STEP.1).min(max);
                log::info!("pending resolution {}x{}", self.resolution.0, self.resolution.1);
            }
            ShrinkResolution => {
                self.resolution.0 = self.resolution.0.saturating_sub(RESOLUTION_STEP.0).max(RESOLUTION_STEP.0);
                self.resolution.1 = self.resolution.1.saturating_sub(RESOLUTION_STEP.1).max(RESOLUTION_STEP.1);
                log::info!("pending resolution {}x{}", self.resolution.0, self.resolution.1);
            }
            ApplyResolution => {
                let (w, h) = self.resolution;
                self.requests.request_resize(w, h);
            }
            TogglePostFx => {
                self.post_fx = !self.post_fx;
                log::info!("post-fx {}", if self.post_fx { "on" } else { "off" });
            }
            ToggleWireframe => self.wireframe = !self.wireframe,
            ToggleVsync => self.vsync = !self.vsync,
            _ => {}
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODE_FS: ModeRequest = ModeRequest {
        fullscreen: true,
        borderless: false,
        monitor: 0,
    };

    // ── state machine ──

    #[test]
    fn take_drains_once() {
        let mut r = DisplayRequests::Stable;
        r.request_resize(800, 600);
        assert_eq!(r.take(), DisplayRequests::PendingResize { width: 800, height: 600 });
        assert_eq!(r.take(), DisplayRequests::Stable);
        assert!(r.is_stable());
    }

    #[test]
    fn latest_resize_wins() {
        let mut r = DisplayRequests::Stable;
        r.request_resize(800, 600);
        r.request_resize(1024, 768);
        assert_eq!(r, DisplayRequests::PendingResize { width: 1024, height: 768 });
    }

    #[test]
    fn mode_change_keeps_earlier_resize() {
        let mut r = DisplayRequests::Stable;
        r.request_resize(800, 600);
        r.request_mode(MODE_FS);
        assert_eq!(
            r,
            DisplayRequests::PendingModeChange {
                mode: MODE_FS,
                resize: Some((800, 600))
            }
        );
    }

    #[test]
    fn resize_after_mode_change_rides_along() {
        let mut r = DisplayRequests::Stable;
        r.request_mode(MODE_FS);
        r.request_resize(640, 360);
        assert_eq!(
            r.take(),
            DisplayRequests::PendingModeChange {
                mode: MODE_FS,
                resize: Some((640, 360))
            }
        );
    }

    // ── controls ──

    #[test]
    fn fullscreen_and_borderless_are_exclusive() {
        let mut c = DisplayControls::new((1280, 720), true, 1);
        c.handle_action(InputAction::ToggleBorderless, true);
        assert!(c.borderless && !c.fullscreen);
        c.handle_action(InputAction::ToggleFullscreen, true);
        assert!(c.fullscreen && !c.borderless);
        assert!(matches!(
            c.requests,
            DisplayRequests::PendingModeChange { mode: ModeRequest { fullscreen: true, borderless: false, .. }, .. }
        ));
    }

    #[test]
    fn release_is_consumed_without_effect() {
        let mut c = DisplayControls::new((1280, 720), true, 1);
        assert!(c.handle_action(InputAction::ToggleFullscreen, false));
        assert!(!c.fullscreen);
        assert!(c.requests.is_stable());
    }

    #[test]
    fn camera_actions_pass_through() {
        let mut c = DisplayControls::new((1280, 720), true, 1);
        assert!(!c.handle_action(InputAction::MoveForward, true));
        assert!(!c.handle_action(InputAction::Quit, true));
    }

    #[test]
    fn monitor_cycles_through_count() {
        let mut c = DisplayControls::new((1280, 720), true, 2);
        c.handle_action(InputAction::CycleMonitor, true);
        assert_eq!(c.monitor, 1);
        c.handle_action(InputAction::CycleMonitor, true);
        assert_eq!(c.monitor, 0);
    }

    #[test]
    fn resolution_changes_apply_only_on_request() {
        let mut c = DisplayControls::new((1280, 720), true, 1);
        c.handle_action(InputAction::GrowResolution, true);
        assert_eq!(c.resolution, (1296, 729));
        assert!(c.requests.is_stable());

        c.handle_action(InputAction::ApplyResolution, true);
        assert_eq!(c.requests.take(), DisplayRequests::PendingResize { width: 1296, height: 729 });
    }

    #[test]
    fn grow_stops_at_max_dimension() {
        let mut c = DisplayControls::new((8180, 4000), true, 1);
        c.max_dimension = 8192;
        for _ in 0..3 {
            c.handle_action(InputAction::GrowResolution, true);
        }
        assert_eq!(c.resolution, (8192, 4027));
    }

    #[test]
    fn shrink_stops_at_one_step() {
        let mut c = DisplayControls::new((20, 10), true, 1);
        for _ in 0..5 {
            c.handle_action(InputAction::ShrinkResolution, true);
        }
        assert_eq!(c.resolution, RESOLUTION_STEP);
    }

    #[test]
    fn toggles_flip() {
        let mut c = DisplayControls::new((1280, 720), true, 1);
        c.handle_action(InputAction::TogglePostFx, true);
        c.handle_action(InputAction::ToggleWireframe, true);
        c.handle_action(InputAction::ToggleVsync, true);
        assert!(!c.post_fx);
        assert!(c.wireframe);
        assert!(!c.vsync);
        assert!(c.requests.is_stable());
    }
}
