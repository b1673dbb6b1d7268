use super::states::DepthStates;

/// Depth format of the back buffer (24-bit depth, 8-bit stencil).
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

/// Target-size-dependent resources owned by the device.
///
/// The depth texture always matches the presentation surface size. The whole
/// bundle is dropped by `cleanup_back_buffer` and rebuilt by
/// `configure_back_buffer`.
pub struct BackBuffer {
    depth_view: wgpu::TextureView,
    depth_texture: wgpu::Texture,
    depth_states: DepthStates,
    size: (u32, u32),
}

impl BackBuffer {
    pub(crate) fn new(device: &wgpu::Device, size: (u32, u32)) -> Self {
        let (width, height) = (size.0.max(1), size.1.max(1));

        let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("kiln depth buffer"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            depth_view,
            depth_texture,
            depth_states: DepthStates::new(DEPTH_FORMAT),
            size: (width, height),
        }
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    pub fn depth_states(&self) -> &DepthStates {
        &self.depth_states
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Releases the depth view before the depth texture.
    pub(crate) fn destroy(self) {
        let Self {
            depth_view,
            depth_texture,
            ..
        } = self;
        drop(depth_view);
        depth_texture.destroy();
    }
}

/// Rasterizer viewport covering the back buffer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    pub fn full(size: (u32, u32)) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: size.0 as f32,
            height: size.1 as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }

    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}
