use super::SurfaceErrorAction;

/// Where frames are presented: a window swapchain or an offscreen texture.
pub(crate) enum PresentationSurface<'w> {
    Window {
        surface: wgpu::Surface<'w>,
        config: wgpu::SurfaceConfiguration,
    },
    Offscreen {
        texture: wgpu::Texture,
        format: wgpu::TextureFormat,
    },
}

/// An acquired back buffer.
pub(crate) struct AcquiredTarget {
    pub surface_texture: Option<wgpu::SurfaceTexture>,
    pub view: wgpu::TextureView,
}

impl<'w> PresentationSurface<'w> {
    pub(crate) fn offscreen(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: (u32, u32),
    ) -> Self {
        Self::Offscreen {
            texture: create_offscreen(device, format, size),
            format,
        }
    }

    pub(crate) fn format(&self) -> wgpu::TextureFormat {
        match self {
            Self::Window { config, .. } => config.format,
            Self::Offscreen { format, .. } => *format,
        }
    }

    /// Resizes the swapchain buffers (or recreates the offscreen texture).
    pub(crate) fn resize(&mut self, device: &wgpu::Device, (width, height): (u32, u32)) {
        if width == 0 || height == 0 {
            return;
        }

        match self {
            Self::Window { surface, config } => {
                config.width = width;
                config.height = height;
                surface.configure(device, config);
            }
            Self::Offscreen { texture, format } => {
                texture.destroy();
                *texture = create_offscreen(device, *format, (width, height));
            }
        }
    }

    pub(crate) fn set_present_mode(&mut self, device: &wgpu::Device, mode: wgpu::PresentMode) {
        if let Self::Window { surface, config } = self {
            config.present_mode = mode;
            surface.configure(device, config);
        }
    }

    pub(crate) fn acquire(&self) -> Result<AcquiredTarget, wgpu::SurfaceError> {
        match self {
            Self::Window { surface, .. } => {
                let surface_texture = surface.get_current_texture()?;
                let view = surface_texture
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                Ok(AcquiredTarget {
                    surface_texture: Some(surface_texture),
                    view,
                })
            }
            Self::Offscreen { texture, .. } => Ok(AcquiredTarget {
                surface_texture: None,
                view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            }),
        }
    }

    /// Maps an acquisition error to an action, reconfiguring when possible.
    pub(crate) fn handle_error(
        &self,
        device: &wgpu::Device,
        err: wgpu::SurfaceError,
    ) -> SurfaceErrorAction {
        match err {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                if let Self::Window { surface, config } = self {
                    if config.width > 0 && config.height > 0 {
                        surface.configure(device, config);
                    }
                }
                SurfaceErrorAction::Reconfigured
            }
            wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
            wgpu::SurfaceError::Timeout => SurfaceErrorAction::SkipFrame,
            wgpu::SurfaceError::Other => SurfaceErrorAction::SkipFrame,
        }
    }

    pub(crate) fn release(self) {
        if let Self::Offscreen { texture, .. } = self {
            texture.destroy();
        }
    }
}

fn create_offscreen(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    (width, height): (u32, u32),
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("kiln offscreen back buffer"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if caps.formats.is_empty() {
        return None;
    }

    if prefer_srgb {
        let preferred = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        for f in preferred {
            if caps.formats.contains(&f) {
                return Some(f);
            }
        }
    }

    Some(caps.formats[0])
}

pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}
