use crate::config::Settings;

/// wgpu-level initialization parameters for the device.
///
/// Keep this structure minimal. Add flags only when a concrete platform or
/// backend requirement exists.
#[derive(Debug, Clone)]
pub struct DeviceInit {
    /// Prefer an sRGB surface format when available.
    pub prefer_srgb: bool,

    /// Present mode. FIFO blocks on present and sets the frame cadence.
    pub present_mode: wgpu::PresentMode,

    /// Optional alpha mode preference for the surface.
    ///
    /// If provided but unsupported on the current surface, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Required wgpu features.
    ///
    /// `POLYGON_MODE_LINE` is added automatically when the adapter has it.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency for the surface. Two means double buffering.
    pub desired_maximum_frame_latency: u32,

    /// Back-buffer format used by headless devices.
    pub offscreen_format: wgpu::TextureFormat,
}

impl Default for DeviceInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
            offscreen_format: wgpu::TextureFormat::Rgba8UnormSrgb,
        }
    }
}

impl DeviceInit {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            present_mode: if settings.vsync {
                wgpu::PresentMode::Fifo
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            ..Self::default()
        }
    }
}
