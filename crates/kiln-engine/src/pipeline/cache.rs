use std::collections::HashMap;

use crate::device::{DepthStates, GraphicsDevice, RasterState, StateSelection, DEPTH_FORMAT};
use crate::scene::Vertex;

use super::uniforms::FrameUniforms;

/// WGSL sources for the three passes, each with `vs_main` and `fs_main`.
#[derive(Debug, Copy, Clone)]
pub struct ShaderSet {
    pub geometry: &'static str,
    pub post_fx: &'static str,
    pub composite: &'static str,
}

impl ShaderSet {
    pub const fn builtin() -> Self {
        Self {
            geometry: include_str!("shaders/geometry.wgsl"),
            post_fx: include_str!("shaders/post_fx.wgsl"),
            composite: include_str!("shaders/composite.wgsl"),
        }
    }
}

impl Default for ShaderSet {
    fn default() -> Self {
        Self::builtin()
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PassKind {
    Geometry,
    PostFx,
    Composite,
}

/// Everything a pipeline is baked from.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PipelineKey {
    pub pass: PassKind,
    pub selection: StateSelection,
    pub targets: [Option<wgpu::TextureFormat>; 3],
}

impl PipelineKey {
    pub fn new(pass: PassKind, selection: StateSelection, formats: &[wgpu::TextureFormat]) -> Self {
        let mut targets = [None; 3];
        for (slot, format) in targets.iter_mut().zip(formats) {
            *slot = Some(*format);
        }
        Self {
            pass,
            selection,
            targets,
        }
    }
}

/// Render pipelines built on demand per [`PipelineKey`].
pub struct PipelineCache {
    geometry_shader: wgpu::ShaderModule,
    post_fx_shader: wgpu::ShaderModule,
    composite_shader: wgpu::ShaderModule,

    uniform_layout: wgpu::BindGroupLayout,
    geometry_layout: wgpu::PipelineLayout,
    quad_layout: wgpu::PipelineLayout,

    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl PipelineCache {
    /// Returns `None` once the device has released its state objects.
    pub fn new(device: &GraphicsDevice, shaders: &ShaderSet) -> Option<Self> {
        let texture_layout = device.texture_layout()?;
        let gpu = device.device();

        let module = |label: &str, source: &'static str| {
            gpu.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
        };

        let uniform_layout = gpu.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("kiln frame uniforms bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(FrameUniforms::SIZE),
                },
                count: None,
            }],
        });

        let geometry_layout = gpu.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("kiln geometry pipeline layout"),
            bind_group_layouts: &[&uniform_layout, texture_layout],
            immediate_size: 0,
        });
        let quad_layout = gpu.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("kiln fullscreen pipeline layout"),
            bind_group_layouts: &[texture_layout],
            immediate_size: 0,
        });

        Some(Self {
            geometry_shader: module("kiln geometry shader", shaders.geometry),
            post_fx_shader: module("kiln post-fx shader", shaders.post_fx),
            composite_shader: module("kiln composite shader", shaders.composite),
            uniform_layout,
            geometry_layout,
            quad_layout,
            pipelines: HashMap::new(),
        })
    }

    pub fn uniform_layout(&self) -> &wgpu::BindGroupLayout {
        &self.uniform_layout
    }

    /// Builds the pipeline for `key` unless it is cached.
    pub fn prepare(&mut self, device: &GraphicsDevice, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        let Some(states) = device.states() else {
            return;
        };

        let (label, module, layout, primitive) = match key.pass {
            PassKind::Geometry => (
                "kiln geometry pipeline",
                &self.geometry_shader,
                &self.geometry_layout,
                states.primitive(key.selection.raster),
            ),
            PassKind::PostFx | PassKind::Composite => {
                // The quad is wound clockwise and never drawn as lines.
                let primitive = wgpu::PrimitiveState {
                    cull_mode: None,
                    ..states.primitive(RasterState::Solid)
                };
                let module = if key.pass == PassKind::PostFx {
                    &self.post_fx_shader
                } else {
                    &self.composite_shader
                };
                ("kiln fullscreen pipeline", module, &self.quad_layout, primitive)
            }
        };

        let blend = states.blend(key.selection.blend);
        let targets: Vec<Option<wgpu::ColorTargetState>> = key
            .targets
            .iter()
            .flatten()
            .map(|&format| {
                Some(wgpu::ColorTargetState {
                    format,
                    blend,
                    write_mask: wgpu::ColorWrites::ALL,
                })
            })
            .collect();

        let depth_stencil = DepthStates::new(DEPTH_FORMAT).get(key.selection.depth);

        let pipeline = device
            .device()
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(layout),
                vertex: wgpu::VertexState {
                    module,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[Vertex::layout()],
                },
                fragment: Some(wgpu::FragmentState {
                    module,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &targets,
                }),
                primitive,
                depth_stencil: Some(depth_stencil),
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        log::debug!("built {:?} pipeline for {:?}", key.pass, key.selection);
        self.pipelines.insert(key, pipeline);
    }

    pub fn get(&self, key: &PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(key)
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    pub fn clear(&mut self) {
        self.pipelines.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_pads_missing_targets() {
        let key = PipelineKey::new(
            PassKind::Composite,
            StateSelection::default(),
            &[wgpu::TextureFormat::Bgra8UnormSrgb],
        );
        assert_eq!(key.targets, [Some(wgpu::TextureFormat::Bgra8UnormSrgb), None, None]);
    }

    #[test]
    fn selection_distinguishes_keys() {
        let formats = [wgpu::TextureFormat::Rgba16Float; 3];
        let solid = PipelineKey::new(PassKind::Geometry, StateSelection::default(), &formats);
        let wire = PipelineKey::new(
            PassKind::Geometry,
            StateSelection {
                raster: RasterState::Wireframe,
                ..StateSelection::default()
            },
            &formats,
        );
        assert_ne!(solid, wire);
    }

    #[test]
    fn builtin_shaders_expose_entry_points() {
        let set = ShaderSet::builtin();
        for src in [set.geometry, set.post_fx, set.composite] {
            assert!(src.contains("fn vs_main"));
            assert!(src.contains("fn fs_main"));
        }
    }
}
