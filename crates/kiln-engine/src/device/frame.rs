/// Draw counters for one render pass.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct PassStats {
    pub draw_calls: u32,
    pub indexed_draw_calls: u32,
    /// Index count of the most recent indexed draw.
    pub last_index_count: u32,
}

impl PassStats {
    pub fn total_draws(&self) -> u32 {
        self.draw_calls + self.indexed_draw_calls
    }
}

/// An acquired back buffer plus the encoder recording into it.
///
/// Must be handed back to `GraphicsDevice::present` promptly; holding it blocks
/// acquisition of the next swapchain image.
pub struct Frame {
    pub(crate) surface_texture: Option<wgpu::SurfaceTexture>,
    pub(crate) view: wgpu::TextureView,
    pub(crate) encoder: wgpu::CommandEncoder,
}

impl Frame {
    /// Back-buffer view.
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn encoder(&mut self) -> &mut wgpu::CommandEncoder {
        &mut self.encoder
    }

    /// Splits the frame into its view and encoder so a pass can target the
    /// back buffer while recording.
    pub fn split(&mut self) -> (&wgpu::TextureView, &mut wgpu::CommandEncoder) {
        (&self.view, &mut self.encoder)
    }
}
