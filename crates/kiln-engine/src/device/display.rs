/// Display modes the device can be placed in.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DisplayMode {
    Windowed,
    /// Undecorated window covering the monitor.
    Borderless,
    /// Exclusive fullscreen on the selected monitor.
    Fullscreen,
}

impl DisplayMode {
    /// Borderless wins when both flags are set.
    pub fn from_flags(fullscreen: bool, borderless: bool) -> Self {
        if borderless {
            DisplayMode::Borderless
        } else if fullscreen {
            DisplayMode::Fullscreen
        } else {
            DisplayMode::Windowed
        }
    }

    pub fn is_exclusive(self) -> bool {
        self == DisplayMode::Fullscreen
    }
}

/// Window-system collaborator used by the device for display transitions.
///
/// Implemented over winit for real windows and by [`VirtualDisplay`] for
/// headless devices.
pub trait DisplayHost {
    /// Number of outputs attached to the primary adapter.
    fn monitor_count(&self) -> usize;

    /// Usable size of monitor `index` in physical pixels.
    fn monitor_size(&self, index: usize) -> Option<(u32, u32)>;

    /// Applies window decoration and placement for `mode` on `monitor`.
    fn apply_window_style(&mut self, mode: DisplayMode, monitor: usize, size: (u32, u32));

    /// Enters exclusive fullscreen on `Some(monitor)` or leaves it with `None`.
    fn set_exclusive_fullscreen(&mut self, monitor: Option<usize>, size: (u32, u32));

    /// Resizes the client area of a decorated window.
    fn request_window_size(&mut self, size: (u32, u32));

    /// Current client-area size in physical pixels.
    fn window_size(&self) -> (u32, u32);

    fn set_cursor_visible(&mut self, visible: bool);

    /// Called right before the back buffer is presented.
    fn pre_present(&self) {}
}

/// Planned display transition, produced by [`DisplayState::plan_mode`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ModeTransition {
    pub mode: DisplayMode,
    pub monitor: usize,
    /// Back-buffer size after the transition.
    pub size: (u32, u32),
    /// Exclusive fullscreen is left before the surface is resized.
    pub leave_exclusive: bool,
    /// Exclusive fullscreen is entered after the back buffer is rebuilt.
    pub enter_exclusive: bool,
    /// The requested monitor did not exist and monitor 0 was used instead.
    pub fell_back: bool,
}

/// Current display configuration of a device.
///
/// Planning is pure so the transition rules can be checked without a window.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DisplayState {
    mode: DisplayMode,
    monitor: usize,
    /// Size the window returns to in windowed mode, and the exclusive
    /// fullscreen resolution.
    configured_size: (u32, u32),
    size: (u32, u32),
    /// Largest back-buffer side the device accepts.
    max_dimension: u32,
}

impl DisplayState {
    pub fn windowed(size: (u32, u32)) -> Self {
        let size = clamp_size(size, u32::MAX);
        Self {
            mode: DisplayMode::Windowed,
            monitor: 0,
            configured_size: size,
            size,
            max_dimension: u32::MAX,
        }
    }

    /// Caps every size this state hands out at `max` per side, usually
    /// `wgpu::Limits::max_texture_dimension_2d`.
    pub fn with_max_dimension(mut self, max: u32) -> Self {
        self.max_dimension = max.max(1);
        self.configured_size = self.clamp(self.configured_size);
        self.size = self.clamp(self.size);
        self
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Clamps `size` to `1..=max_dimension` per side, warning when it shrinks.
    pub fn clamp(&self, size: (u32, u32)) -> (u32, u32) {
        let clamped = clamp_size(size, self.max_dimension);
        if clamped.0 < size.0 || clamped.1 < size.1 {
            log::warn!(
                "{}x{} exceeds the device limit of {}; using {}x{}",
                size.0,
                size.1,
                self.max_dimension,
                clamped.0,
                clamped.1
            );
        }
        clamped
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn monitor(&self) -> usize {
        self.monitor
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn configured_size(&self) -> (u32, u32) {
        self.configured_size
    }

    /// Plans a mode change against the outputs reported by `host`.
    pub fn plan_mode(
        &self,
        fullscreen: bool,
        borderless: bool,
        monitor: usize,
        host: &dyn DisplayHost,
    ) -> ModeTransition {
        let mode = DisplayMode::from_flags(fullscreen, borderless);

        let count = host.monitor_count();
        let fell_back = monitor >= count;
        let monitor = if fell_back { 0 } else { monitor };

        let size = match mode {
            DisplayMode::Windowed | DisplayMode::Fullscreen => self.configured_size,
            DisplayMode::Borderless => host
                .monitor_size(monitor)
                .map(|s| self.clamp(s))
                .unwrap_or(self.configured_size),
        };

        let was_exclusive = self.mode.is_exclusive();
        let monitor_changed = monitor != self.monitor;

        ModeTransition {
            mode,
            monitor,
            size,
            leave_exclusive: was_exclusive && (!mode.is_exclusive() || monitor_changed),
            enter_exclusive: mode.is_exclusive() && (!was_exclusive || monitor_changed),
            fell_back,
        }
    }

    pub fn commit_mode(&mut self, t: &ModeTransition) {
        self.mode = t.mode;
        self.monitor = t.monitor;
        self.size = t.size;
    }

    /// Records a resolution change and returns the size actually used.
    ///
    /// Only windowed resizes become the configured size. Fullscreen video-mode
    /// and borderless monitor sizes never replace the windowed size that
    /// leaving those modes restores.
    pub fn commit_size(&mut self, size: (u32, u32)) -> (u32, u32) {
        let size = self.clamp(size);
        if self.mode == DisplayMode::Windowed {
            self.configured_size = size;
        }
        self.size = size;
        size
    }
}

fn clamp_size((w, h): (u32, u32), max: u32) -> (u32, u32) {
    (w.clamp(1, max), h.clamp(1, max))
}

/// In-memory display host for headless devices and tests.
///
/// Records every style and exclusive-fullscreen call it receives.
#[derive(Debug, Clone)]
pub struct VirtualDisplay {
    monitors: Vec<(u32, u32)>,
    pub exclusive: Option<usize>,
    pub style: DisplayMode,
    pub window_size: (u32, u32),
    pub cursor_visible: bool,
    pub log: Vec<String>,
}

impl VirtualDisplay {
    pub fn new(monitors: Vec<(u32, u32)>) -> Self {
        debug_assert!(!monitors.is_empty(), "virtual display needs at least one monitor");
        Self {
            monitors,
            exclusive: None,
            style: DisplayMode::Windowed,
            window_size: (0, 0),
            cursor_visible: true,
            log: Vec::new(),
        }
    }

    /// A single 1920x1080 monitor.
    pub fn single() -> Self {
        Self::new(vec![(1920, 1080)])
    }
}

impl DisplayHost for VirtualDisplay {
    fn monitor_count(&self) -> usize {
        self.monitors.len()
    }

    fn monitor_size(&self, index: usize) -> Option<(u32, u32)> {
        self.monitors.get(index).copied()
    }

    fn apply_window_style(&mut self, mode: DisplayMode, monitor: usize, size: (u32, u32)) {
        self.style = mode;
        self.window_size = size;
        self.log.push(format!("style {mode:?} on {monitor} at {}x{}", size.0, size.1));
    }

    fn set_exclusive_fullscreen(&mut self, monitor: Option<usize>, size: (u32, u32)) {
        self.exclusive = monitor;
        self.window_size = size;
        self.log.push(match monitor {
            Some(m) => format!("enter exclusive on {m}"),
            None => "leave exclusive".to_string(),
        });
    }

    fn request_window_size(&mut self, size: (u32, u32)) {
        self.window_size = size;
        self.log.push(format!("window size {}x{}", size.0, size.1));
    }

    fn window_size(&self) -> (u32, u32) {
        self.window_size
    }

    fn set_cursor_visible(&mut self, visible: bool) {
        self.cursor_visible = visible;
    }
}
