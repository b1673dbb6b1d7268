/// What the caller should do after `begin_frame` failed to get a back buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Lost or outdated surface; it was configured again and the next tick can render.
    Reconfigured,
    /// Timed out or otherwise transient; drop this tick.
    SkipFrame,
    /// Out of memory or no surface left. Stop rendering.
    Fatal,
}
