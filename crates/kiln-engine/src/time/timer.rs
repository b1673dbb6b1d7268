use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous tick, in seconds.
    pub dt: f32,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Render loop timer.
///
/// Delta time is clamped so a debugger pause or a blocking display transition
/// does not produce a huge step. Alongside the delta, the timer keeps an
/// exponentially smoothed frame rate for periodic reporting.
#[derive(Debug, Clone)]
pub struct Timer {
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
    smoothed_dt: f32,
    last_report: Instant,
}

const SMOOTHING: f32 = 0.1;

impl Timer {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    /// Creates a timer with custom delta-time clamps.
    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        let now = Instant::now();
        Self {
            last: now,
            frame_index: 0,
            dt_min,
            dt_max,
            smoothed_dt: 0.0,
            last_report: now,
        }
    }

    /// Resets the baseline, e.g. after a display mode change stalled the loop.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    /// Advances the timer and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max)
            .as_secs_f32();

        self.last = now;
        self.smoothed_dt = if self.frame_index == 0 {
            dt
        } else {
            self.smoothed_dt + (dt - self.smoothed_dt) * SMOOTHING
        };

        let ft = FrameTime {
            dt,
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }

    /// Smoothed frames per second.
    pub fn fps(&self) -> f32 {
        if self.smoothed_dt > 0.0 {
            1.0 / self.smoothed_dt
        } else {
            0.0
        }
    }

    /// Returns true once every `interval`, for periodic frame rate logging.
    pub fn report_due(&mut self, interval: Duration) -> bool {
        if self.last.saturating_duration_since(self.last_report) >= interval {
            self.last_report = self.last;
            true
        } else {
            false
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── clamping ──

    #[test]
    fn long_stall_is_clamped() {
        let mut t = Timer::new();
        let start = t.last;
        let ft = t.tick_at(start + Duration::from_secs(5));
        assert!((ft.dt - 0.25).abs() < 1e-6);
    }

    #[test]
    fn zero_step_is_clamped_up() {
        let mut t = Timer::new();
        let start = t.last;
        let ft = t.tick_at(start);
        assert!(ft.dt > 0.0);
    }

    // ── counters ──

    #[test]
    fn frame_index_increments() {
        let mut t = Timer::new();
        let start = t.last;
        assert_eq!(t.tick_at(start + Duration::from_millis(16)).frame_index, 0);
        assert_eq!(t.tick_at(start + Duration::from_millis(32)).frame_index, 1);
    }

    #[test]
    fn fps_tracks_steady_rate() {
        let mut t = Timer::new();
        let mut now = t.last;
        for _ in 0..200 {
            now += Duration::from_millis(10);
            t.tick_at(now);
        }
        assert!((t.fps() - 100.0).abs() < 1.0);
    }

    #[test]
    fn report_fires_once_per_interval() {
        let mut t = Timer::new();
        let start = t.last;
        t.tick_at(start + Duration::from_millis(500));
        assert!(!t.report_due(Duration::from_secs(1)));
        t.tick_at(start + Duration::from_millis(1100));
        assert!(t.report_due(Duration::from_secs(1)));
        assert!(!t.report_due(Duration::from_secs(1)));
    }
}
