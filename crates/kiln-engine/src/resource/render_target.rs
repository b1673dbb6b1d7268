use crate::device::{GraphicsDevice, CLEAR_COLOR};

use super::texture::{Texture, TextureDesc};
use super::{GraphicsResource, ResourceError, ResourceKind};

/// How a render target's size is chosen.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Sizing {
    Fixed,
    /// Follows the back-buffer size at every `initialise`.
    Fullscreen,
}

/// A texture that can also be drawn into.
///
/// The target view exists exactly when the underlying image does.
pub struct RenderTarget {
    target_view: Option<wgpu::TextureView>,
    texture: Texture,
    sizing: Sizing,
}

impl RenderTarget {
    pub fn new(label: impl Into<String>, width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        let desc = TextureDesc::new(label, width, height, format).with_usage(
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        );
        Self {
            target_view: None,
            texture: Texture::new(desc),
            sizing: Sizing::Fixed,
        }
    }

    /// Render target tracking the back-buffer size.
    pub fn fullscreen(label: impl Into<String>, format: wgpu::TextureFormat) -> Self {
        let mut rt = Self::new(label, 0, 0, format);
        rt.set_dimensions_to_fullscreen();
        rt
    }

    /// Marks the target as tracking the back-buffer size. Takes effect at the
    /// next `initialise`.
    pub fn set_dimensions_to_fullscreen(&mut self) {
        self.sizing = Sizing::Fullscreen;
    }

    pub fn sizing(&self) -> Sizing {
        self.sizing
    }

    pub fn width(&self) -> u32 {
        self.texture.width()
    }

    pub fn height(&self) -> u32 {
        self.texture.height()
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.texture.desc().format
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    pub fn target_view(&self) -> Option<&wgpu::TextureView> {
        self.target_view.as_ref()
    }

    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.texture.bind_group()
    }

    pub fn initialise(&mut self, device: &mut GraphicsDevice) -> Result<(), ResourceError> {
        self.release();

        if self.sizing == Sizing::Fullscreen {
            let (w, h) = device.back_buffer_size();
            self.texture.set_size(w, h);
        }

        self.texture
            .initialise_as(device, ResourceKind::RenderTarget)?;

        self.target_view = self
            .texture
            .raw()
            .map(|t| t.create_view(&wgpu::TextureViewDescriptor::default()));
        Ok(())
    }

    /// Clears the target to the debug fill color.
    pub fn clear(&self, encoder: &mut wgpu::CommandEncoder) {
        let Some(view) = &self.target_view else {
            return;
        };

        let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("kiln render target clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }
}

impl GraphicsResource for RenderTarget {
    fn kind(&self) -> ResourceKind {
        ResourceKind::RenderTarget
    }

    fn is_allocated(&self) -> bool {
        self.target_view.is_some() && self.texture.is_allocated()
    }

    fn release(&mut self) {
        self.target_view = None;
        self.texture.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fullscreen_target_starts_unsized_and_tracked() {
        let rt = RenderTarget::fullscreen("gbuffer", wgpu::TextureFormat::Rgba16Float);
        assert_eq!(rt.sizing(), Sizing::Fullscreen);
        assert_eq!((rt.width(), rt.height()), (0, 0));
        assert!(!rt.is_allocated());
    }

    #[test]
    fn fixed_target_keeps_its_size() {
        let mut rt = RenderTarget::new("shadow", 256, 128, wgpu::TextureFormat::Rgba8Unorm);
        assert_eq!(rt.sizing(), Sizing::Fixed);
        rt.release();
        assert_eq!((rt.width(), rt.height()), (256, 128));
    }
}
