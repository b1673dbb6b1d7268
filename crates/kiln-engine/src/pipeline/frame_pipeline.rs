use anyhow::{Context, Result};

use crate::camera::Camera;
use crate::config::Settings;
use crate::device::{DisplayMode, Frame, GraphicsDevice, PassStats, SurfaceErrorAction};
use crate::input::InputAction;
use crate::render::DrawPass;
use crate::resource::{GraphicsResource, RenderTarget};
use crate::scene::{Mesh, Model};

use super::cache::{PassKind, PipelineCache, PipelineKey, ShaderSet};
use super::quad::fullscreen_quad;
use super::requests::{DisplayControls, DisplayRequests};
use super::uniforms::FrameUniforms;

/// Format of every G-buffer and post-effect target.
pub const GBUFFER_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// Bind group slot of the material texture in the geometry pass.
const MATERIAL_GROUP: u32 = 1;

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum FrameStatus {
    Presented,
    /// No back buffer this tick; the surface may have been reconfigured.
    #[default]
    Skipped,
    /// The presentation surface is gone.
    Fatal,
}

/// What one tick of the pipeline did.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameOutcome {
    pub status: FrameStatus,
    pub geometry: PassStats,
    pub post_fx: Option<PassStats>,
    pub composite: PassStats,
    /// Back-buffer size after a display change applied at the end of the tick.
    pub resized: Option<(u32, u32)>,
}

/// Fullscreen-tracked render targets.
struct Targets {
    diffuse: RenderTarget,
    normal: RenderTarget,
    position: RenderTarget,
    post_fx: RenderTarget,
}

impl Targets {
    fn new() -> Self {
        Self {
            diffuse: RenderTarget::fullscreen("kiln gbuffer diffuse", GBUFFER_FORMAT),
            normal: RenderTarget::fullscreen("kiln gbuffer normal", GBUFFER_FORMAT),
            position: RenderTarget::fullscreen("kiln gbuffer position", GBUFFER_FORMAT),
            post_fx: RenderTarget::fullscreen("kiln post-fx", GBUFFER_FORMAT),
        }
    }

    fn gbuffer(&self) -> [&RenderTarget; 3] {
        [&self.diffuse, &self.normal, &self.position]
    }

    fn all(&self) -> [&RenderTarget; 4] {
        [&self.diffuse, &self.normal, &self.position, &self.post_fx]
    }

    fn all_mut(&mut self) -> [&mut RenderTarget; 4] {
        [
            &mut self.diffuse,
            &mut self.normal,
            &mut self.position,
            &mut self.post_fx,
        ]
    }
}

/// Geometry, post-effect and composite passes, run once per tick.
///
/// Display-mode and resolution changes requested during a tick are applied
/// after present, with every render target released around the device
/// transition.
pub struct FramePipeline {
    targets: Targets,
    uniform_buffer: Option<wgpu::Buffer>,
    uniform_bind_group: Option<wgpu::BindGroup>,
    pipelines: PipelineCache,
    quad: Mesh,
    controls: DisplayControls,
}

impl FramePipeline {
    pub fn new(device: &mut GraphicsDevice, settings: &Settings) -> Result<Self> {
        Self::with_shaders(device, settings, &ShaderSet::builtin())
    }

    pub fn with_shaders(
        device: &mut GraphicsDevice,
        settings: &Settings,
        shaders: &ShaderSet,
    ) -> Result<Self> {
        let pipelines = PipelineCache::new(device, shaders)
            .context("graphics device has no state objects; was it shut down?")?;

        let uniform_buffer = device.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("kiln frame uniforms"),
            size: FrameUniforms::SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = device
            .device()
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("kiln frame uniforms bg"),
                layout: pipelines.uniform_layout(),
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });

        let mut quad = fullscreen_quad();
        quad.build_buffers(device)
            .context("failed to build the fullscreen quad")?;

        let mut pipeline = Self {
            targets: Targets::new(),
            uniform_buffer: Some(uniform_buffer),
            uniform_bind_group: Some(uniform_bind_group),
            pipelines,
            quad,
            controls: DisplayControls::new(
                device.configured_size(),
                settings.post_fx,
                device.number_of_monitors(),
            ),
        };
        pipeline.controls.vsync = device.vsync();
        pipeline.sync_controls(device);
        pipeline.initialise_targets(device);
        Ok(pipeline)
    }

    // ── input ──

    /// Applies a display or toggle action. Returns whether it was consumed.
    pub fn handle_action(&mut self, action: InputAction, pressed: bool) -> bool {
        self.controls.handle_action(action, pressed)
    }

    /// Queues a back-buffer resize, e.g. after the OS resized the window.
    pub fn request_resize(&mut self, width: u32, height: u32) {
        self.controls.requests.request_resize(width, height);
    }

    pub fn pending_requests(&self) -> DisplayRequests {
        self.controls.requests
    }

    pub fn controls(&self) -> &DisplayControls {
        &self.controls
    }

    pub fn post_fx_enabled(&self) -> bool {
        self.controls.post_fx
    }

    pub fn set_post_fx(&mut self, enabled: bool) {
        self.controls.post_fx = enabled;
    }

    /// The diffuse, normal, position and post-effect targets.
    pub fn render_targets(&self) -> [&RenderTarget; 4] {
        self.targets.all()
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    // ── frame ──

    /// Runs one tick: clear, geometry, optional post-effect, composite,
    /// present, then any pending display change.
    pub fn render(
        &mut self,
        device: &mut GraphicsDevice,
        camera: &Camera,
        model: &Model,
    ) -> FrameOutcome {
        let mut outcome = FrameOutcome::default();

        match device.begin_frame() {
            Ok(mut frame) => {
                self.record(device, &mut frame, camera, model, &mut outcome);
                device.present(frame);
                outcome.status = FrameStatus::Presented;
            }
            Err(SurfaceErrorAction::Fatal) => {
                outcome.status = FrameStatus::Fatal;
                return outcome;
            }
            Err(_) => {}
        }

        // No pass is in flight past this point.
        if self.controls.vsync != device.vsync() {
            device.set_vsync(self.controls.vsync);
        }
        outcome.resized = self.apply_display_requests(device);
        outcome
    }

    fn record(
        &mut self,
        device: &mut GraphicsDevice,
        frame: &mut Frame,
        camera: &Camera,
        model: &Model,
        outcome: &mut FrameOutcome,
    ) {
        device.clear_screen(frame);
        for rt in self.targets.all() {
            rt.clear(frame.encoder());
        }

        // Geometry
        device.enable_depth_buffering(true);
        device.enable_alpha_blending(false);
        device.enable_wireframe(self.controls.wireframe);

        let geometry_key = PipelineKey::new(PassKind::Geometry, device.selection(), &[GBUFFER_FORMAT; 3]);
        self.pipelines.prepare(device, geometry_key);
        if let Some(buffer) = &self.uniform_buffer {
            let uniforms = FrameUniforms::from_camera(camera);
            device.queue().write_buffer(buffer, 0, bytemuck::bytes_of(&uniforms));
        }
        outcome.geometry = self.geometry_pass(device, frame.encoder(), &geometry_key, model);

        // Post effect
        device.enable_depth_buffering(false);
        if self.controls.post_fx {
            let key = PipelineKey::new(PassKind::PostFx, device.selection(), &[GBUFFER_FORMAT]);
            self.pipelines.prepare(device, key);
            outcome.post_fx = Some(match self.targets.post_fx.target_view() {
                Some(view) => self.quad_pass(
                    device,
                    frame.encoder(),
                    view,
                    self.targets.diffuse.bind_group(),
                    &key,
                    "kiln post-fx pass",
                ),
                None => PassStats::default(),
            });
        }

        // Composite
        let key = PipelineKey::new(PassKind::Composite, device.selection(), &[device.surface_format()]);
        self.pipelines.prepare(device, key);
        let source = if self.controls.post_fx {
            self.targets.post_fx.bind_group()
        } else {
            self.targets.diffuse.bind_group()
        };
        let (view, encoder) = frame.split();
        outcome.composite = self.quad_pass(device, encoder, view, source, &key, "kiln composite pass");
    }

    fn geometry_pass(
        &self,
        device: &GraphicsDevice,
        encoder: &mut wgpu::CommandEncoder,
        key: &PipelineKey,
        model: &Model,
    ) -> PassStats {
        let (Some(pipeline), Some(uniforms), Some(depth)) = (
            self.pipelines.get(key),
            self.uniform_bind_group.as_ref(),
            device.depth_view(),
        ) else {
            return PassStats::default();
        };

        let attachments: Option<Vec<_>> = self
            .targets
            .gbuffer()
            .iter()
            .map(|rt| rt.target_view().map(load_color))
            .collect();
        let Some(attachments) = attachments else {
            log::warn!("G-buffer targets unavailable; skipping geometry pass");
            return PassStats::default();
        };

        let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("kiln geometry pass"),
            color_attachments: &attachments,
            depth_stencil_attachment: Some(load_depth(depth)),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let mut draw = DrawPass::new(pass, device.default_material(), MATERIAL_GROUP);
        draw.set_pipeline(pipeline);
        draw.set_bind_group(0, uniforms);
        draw.set_viewport(device.viewport());
        model.draw(&mut draw);
        draw.finish()
    }

    fn quad_pass(
        &self,
        device: &GraphicsDevice,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        source: Option<&wgpu::BindGroup>,
        key: &PipelineKey,
        label: &str,
    ) -> PassStats {
        let (Some(pipeline), Some(source), Some(depth)) =
            (self.pipelines.get(key), source, device.depth_view())
        else {
            return PassStats::default();
        };

        let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[load_color(target)],
            depth_stencil_attachment: Some(load_depth(depth)),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let mut draw = DrawPass::new(pass, None, 0);
        draw.set_pipeline(pipeline);
        draw.set_viewport(device.viewport());
        self.quad.draw_with_material(&mut draw, Some(source));
        draw.finish()
    }

    // ── display changes ──

    /// Drains the pending display request. Returns the new back-buffer size
    /// when the device was reconfigured.
    fn apply_display_requests(&mut self, device: &mut GraphicsDevice) -> Option<(u32, u32)> {
        match self.controls.requests.take() {
            DisplayRequests::Stable => return None,
            DisplayRequests::PendingResize { width, height } => {
                if (width, height) == device.back_buffer_size() {
                    log::debug!("resize to current size {width}x{height} ignored");
                    return None;
                }
                self.release_targets();
                device.set_size(width, height);
                for rt in self.targets.all_mut() {
                    rt.set_dimensions_to_fullscreen();
                }
                self.sync_controls(device);
            }
            DisplayRequests::PendingModeChange { mode, resize } => {
                self.release_targets();
                device.set_window_mode(mode.fullscreen, mode.borderless, mode.monitor);
                if let Some((width, height)) = resize {
                    device.set_size(width, height);
                }
                self.sync_controls(device);
            }
        }

        self.initialise_targets(device);
        Some(device.back_buffer_size())
    }

    /// Mirrors the device's committed mode, which may differ from the request
    /// after a monitor fallback or a clamped size.
    ///
    /// Resolution steps continue from the windowed back buffer, or from the
    /// configured size while a fullscreen mode owns the back buffer.
    fn sync_controls(&mut self, device: &GraphicsDevice) {
        let mode = device.display_mode();
        self.controls.fullscreen = mode == DisplayMode::Fullscreen;
        self.controls.borderless = mode == DisplayMode::Borderless;
        self.controls.monitor = device.monitor();
        self.controls.monitor_count = device.number_of_monitors().max(1);
        self.controls.max_dimension = device.max_dimension();
        self.controls.resolution = match mode {
            DisplayMode::Windowed => device.back_buffer_size(),
            DisplayMode::Borderless | DisplayMode::Fullscreen => device.configured_size(),
        };
    }

    fn initialise_targets(&mut self, device: &mut GraphicsDevice) {
        for rt in self.targets.all_mut() {
            // Failures are logged by the target; passes skip missing views.
            let _ = rt.initialise(device);
        }
    }

    fn release_targets(&mut self) {
        for rt in self.targets.all_mut() {
            rt.release();
        }
    }

    /// Frees the render targets, the quad and the uniform buffer.
    pub fn release(&mut self) {
        self.release_targets();
        self.quad.release();
        self.uniform_bind_group = None;
        if let Some(buffer) = self.uniform_buffer.take() {
            buffer.destroy();
        }
        self.pipelines.clear();
    }
}

fn load_color(view: &wgpu::TextureView) -> Option<wgpu::RenderPassColorAttachment<'_>> {
    Some(wgpu::RenderPassColorAttachment {
        view,
        resolve_target: None,
        ops: wgpu::Operations {
            load: wgpu::LoadOp::Load,
            store: wgpu::StoreOp::Store,
        },
        depth_slice: None,
    })
}

fn load_depth(view: &wgpu::TextureView) -> wgpu::RenderPassDepthStencilAttachment<'_> {
    wgpu::RenderPassDepthStencilAttachment {
        view,
        depth_ops: Some(wgpu::Operations {
            load: wgpu::LoadOp::Load,
            store: wgpu::StoreOp::Store,
        }),
        stencil_ops: Some(wgpu::Operations {
            load: wgpu::LoadOp::Load,
            store: wgpu::StoreOp::Store,
        }),
    }
}
