//! Fixed-function state objects.
//!
//! wgpu bakes raster, depth and blend settings into pipelines, so the device
//! keeps the prebuilt variants here and a [`StateSelection`] naming the ones in
//! effect. Pipelines are looked up by that selection.

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RasterState {
    Solid,
    Wireframe,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DepthState {
    /// Less-than test with depth writes.
    Enabled,
    /// Always passes, no writes.
    Disabled,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BlendState {
    AlphaOn,
    AlphaOff,
}

/// Currently selected state objects.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct StateSelection {
    pub raster: RasterState,
    pub depth: DepthState,
    pub blend: BlendState,
}

impl Default for StateSelection {
    fn default() -> Self {
        Self {
            raster: RasterState::Solid,
            depth: DepthState::Enabled,
            blend: BlendState::AlphaOn,
        }
    }
}

/// Raster and blend variants plus the shared sampler and texture binding layout.
pub struct FixedStates {
    solid: wgpu::PrimitiveState,
    wireframe: Option<wgpu::PrimitiveState>,
    alpha: wgpu::BlendState,
    pub(crate) sampler: wgpu::Sampler,
    pub(crate) texture_layout: wgpu::BindGroupLayout,
}

impl FixedStates {
    pub(crate) fn new(device: &wgpu::Device) -> Self {
        let solid = wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            polygon_mode: wgpu::PolygonMode::Fill,
            ..Default::default()
        };

        let wireframe = if device.features().contains(wgpu::Features::POLYGON_MODE_LINE) {
            Some(wgpu::PrimitiveState {
                polygon_mode: wgpu::PolygonMode::Line,
                ..solid
            })
        } else {
            log::warn!("adapter lacks POLYGON_MODE_LINE; wireframe renders solid");
            None
        };

        let alpha = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
                operation: wgpu::BlendOperation::Add,
            },
        };

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("kiln anisotropic wrap sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            anisotropy_clamp: 16,
            ..Default::default()
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("kiln texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        Self {
            solid,
            wireframe,
            alpha,
            sampler,
            texture_layout,
        }
    }

    pub fn wireframe_supported(&self) -> bool {
        self.wireframe.is_some()
    }

    pub fn primitive(&self, raster: RasterState) -> wgpu::PrimitiveState {
        match raster {
            RasterState::Solid => self.solid,
            RasterState::Wireframe => self.wireframe.unwrap_or(self.solid),
        }
    }

    pub fn blend(&self, blend: BlendState) -> Option<wgpu::BlendState> {
        match blend {
            BlendState::AlphaOn => Some(self.alpha),
            BlendState::AlphaOff => None,
        }
    }
}

/// Depth-test variants, rebuilt together with the depth buffer.
#[derive(Debug, Clone)]
pub struct DepthStates {
    enabled: wgpu::DepthStencilState,
    disabled: wgpu::DepthStencilState,
}

impl DepthStates {
    pub(crate) fn new(format: wgpu::TextureFormat) -> Self {
        let enabled = wgpu::DepthStencilState {
            format,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        };
        let disabled = wgpu::DepthStencilState {
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::Always,
            ..enabled.clone()
        };
        Self { enabled, disabled }
    }

    pub fn get(&self, depth: DepthState) -> wgpu::DepthStencilState {
        match depth {
            DepthState::Enabled => self.enabled.clone(),
            DepthState::Disabled => self.disabled.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_solid_depth_alpha() {
        let s = StateSelection::default();
        assert_eq!(s.raster, RasterState::Solid);
        assert_eq!(s.depth, DepthState::Enabled);
        assert_eq!(s.blend, BlendState::AlphaOn);
    }

    #[test]
    fn disabled_depth_always_passes_without_writes() {
        let states = DepthStates::new(wgpu::TextureFormat::Depth24PlusStencil8);
        let off = states.get(DepthState::Disabled);
        assert_eq!(off.depth_compare, wgpu::CompareFunction::Always);
        assert!(!off.depth_write_enabled);

        let on = states.get(DepthState::Enabled);
        assert_eq!(on.depth_compare, wgpu::CompareFunction::Less);
        assert!(on.depth_write_enabled);
    }
}
