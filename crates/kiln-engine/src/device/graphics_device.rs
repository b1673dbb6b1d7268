use anyhow::{Context, Result};
use winit::window::Window;

use crate::config::Settings;

use super::back_buffer::{BackBuffer, Viewport};
use super::display::{DisplayHost, DisplayMode, DisplayState, VirtualDisplay};
use super::frame::Frame;
use super::mips::MipGenerator;
use super::states::{BlendState, DepthState, FixedStates, RasterState, StateSelection};
use super::surface::{self, PresentationSurface};
use super::winit_display::WinitDisplay;
use super::{DeviceInit, SurfaceErrorAction};

/// Background color of the back buffer and the debug fill of render targets.
pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 227.0 / 255.0,
    g: 0.0,
    b: 140.0 / 255.0,
    a: 1.0,
};

/// 1x1 white texture bound when a mesh has no texture of its own.
struct DefaultMaterial {
    bind_group: wgpu::BindGroup,
    view: wgpu::TextureView,
    texture: wgpu::Texture,
}

/// What is still allocated on a device, for teardown checks.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct LiveResources {
    pub surface: bool,
    pub back_buffer: bool,
    pub state_objects: bool,
    pub default_material: bool,
    pub device: bool,
}

impl LiveResources {
    pub fn any(&self) -> bool {
        self.surface || self.back_buffer || self.state_objects || self.default_material || self.device
    }
}

/// Owns the wgpu device, the presentation surface and the back buffer.
///
/// Exposes the per-frame clear/present contract, the fixed state objects and
/// the display transition protocol. Created once per process.
pub struct GraphicsDevice<'w> {
    #[allow(dead_code)] // outlives the surface
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,

    surface: Option<PresentationSurface<'w>>,
    back_buffer: Option<BackBuffer>,
    states: Option<FixedStates>,
    default_material: Option<DefaultMaterial>,
    mips: MipGenerator,

    selection: StateSelection,
    viewport: Viewport,
    display: DisplayState,
    host: Box<dyn DisplayHost + 'w>,
    /// Requested cursor visibility; exclusive fullscreen always hides it.
    cursor_visible: bool,
    vsync: bool,
    alive: bool,
}

impl<'w> GraphicsDevice<'w> {
    /// Creates a device presenting into `window`.
    ///
    /// Failure here is an environment error the process cannot recover from.
    pub async fn new(window: &'w Window, settings: &Settings, init: DeviceInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let (adapter, device, queue) = request_device(&instance, Some(&surface), &init).await?;
        let (width, height) = capped_size(&device, (size.width, size.height));

        let caps = surface.get_capabilities(&adapter);
        let format = surface::choose_surface_format(&caps, init.prefer_srgb)
            .context("no supported surface formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: init.present_mode,
            alpha_mode: surface::choose_alpha_mode(&caps, init.alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };
        surface.configure(&device, &config);

        let presentation = PresentationSurface::Window { surface, config };
        let host = Box::new(WinitDisplay::new(window));

        Ok(Self::assemble(
            instance,
            adapter,
            device,
            queue,
            presentation,
            host,
            (width, height),
            is_vsync(init.present_mode),
            settings,
        ))
    }

    /// Creates a device rendering into an offscreen back buffer sized from
    /// `settings`, with `host` standing in for the window system.
    pub async fn headless(
        settings: &Settings,
        init: DeviceInit,
        mut host: Box<dyn DisplayHost + 'w>,
    ) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let (adapter, device, queue) = request_device(&instance, None, &init).await?;

        let size = capped_size(&device, settings.screen_size());
        let presentation = PresentationSurface::offscreen(&device, init.offscreen_format, size);
        host.request_window_size(size);

        Ok(Self::assemble(
            instance,
            adapter,
            device,
            queue,
            presentation,
            host,
            size,
            is_vsync(init.present_mode),
            settings,
        ))
    }

    /// Headless device with a single virtual 1920x1080 monitor.
    pub async fn headless_default(settings: &Settings) -> Result<Self> {
        Self::headless(settings, DeviceInit::default(), Box::new(VirtualDisplay::single())).await
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        instance: wgpu::Instance,
        adapter: wgpu::Adapter,
        device: wgpu::Device,
        queue: wgpu::Queue,
        presentation: PresentationSurface<'w>,
        host: Box<dyn DisplayHost + 'w>,
        size: (u32, u32),
        vsync: bool,
        settings: &Settings,
    ) -> Self {
        let limit = device.limits().max_texture_dimension_2d;
        let states = FixedStates::new(&device);
        let default_material = create_default_material(&device, &queue, &states);
        let mips = MipGenerator::new(&device);

        let mut this = Self {
            instance,
            adapter,
            device,
            queue,
            surface: Some(presentation),
            back_buffer: None,
            states: Some(states),
            default_material: Some(default_material),
            mips,
            selection: StateSelection::default(),
            viewport: Viewport::full(size),
            display: DisplayState::windowed(settings.screen_size()).with_max_dimension(limit),
            host,
            cursor_visible: settings.show_cursor,
            vsync,
            alive: true,
        };
        this.display.commit_size(size);
        this.configure_back_buffer(size);
        this.host.set_cursor_visible(this.cursor_visible);

        log::info!(
            "graphics device ready: {} ({:?}), {}x{} {:?}",
            this.adapter.get_info().name,
            this.adapter.get_info().backend,
            size.0,
            size.1,
            this.surface_format()
        );

        let mode = DisplayMode::from_flags(settings.fullscreen, settings.borderless);
        if mode != DisplayMode::Windowed {
            this.set_window_mode(settings.fullscreen, settings.borderless, settings.monitor);
        }

        this
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Format of the back buffer.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface
            .as_ref()
            .map(PresentationSurface::format)
            .unwrap_or(wgpu::TextureFormat::Rgba8UnormSrgb)
    }

    /// Current back-buffer size in physical pixels.
    pub fn back_buffer_size(&self) -> (u32, u32) {
        self.display.size()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display.mode()
    }

    pub fn monitor(&self) -> usize {
        self.display.monitor()
    }

    /// Size restored when returning to windowed mode.
    pub fn configured_size(&self) -> (u32, u32) {
        self.display.configured_size()
    }

    /// Client-area size reported by the display host.
    pub fn window_size(&self) -> (u32, u32) {
        self.host.window_size()
    }

    /// Largest back-buffer side the adapter supports.
    pub fn max_dimension(&self) -> u32 {
        self.display.max_dimension()
    }

    /// Whether the cursor is currently shown.
    pub fn cursor_visible(&self) -> bool {
        self.cursor_visible && !self.display.mode().is_exclusive()
    }

    pub fn vsync(&self) -> bool {
        self.vsync
    }

    pub fn selection(&self) -> StateSelection {
        self.selection
    }

    /// Depth view of the back buffer.
    ///
    /// `None` only between `cleanup_back_buffer` and `configure_back_buffer`.
    pub fn depth_view(&self) -> Option<&wgpu::TextureView> {
        self.back_buffer.as_ref().map(BackBuffer::depth_view)
    }

    /// Depth-stencil state for the current depth selection.
    pub fn depth_stencil_state(&self) -> Option<wgpu::DepthStencilState> {
        self.back_buffer
            .as_ref()
            .map(|bb| bb.depth_states().get(self.selection.depth))
    }

    pub fn states(&self) -> Option<&FixedStates> {
        self.states.as_ref()
    }

    pub fn primitive_state(&self) -> wgpu::PrimitiveState {
        self.states
            .as_ref()
            .map(|s| s.primitive(self.selection.raster))
            .unwrap_or_default()
    }

    pub fn blend_state(&self) -> Option<wgpu::BlendState> {
        self.states
            .as_ref()
            .and_then(|s| s.blend(self.selection.blend))
    }

    /// Bind group of the 1x1 white fallback texture.
    pub fn default_material(&self) -> Option<&wgpu::BindGroup> {
        self.default_material.as_ref().map(|m| &m.bind_group)
    }

    /// Layout shared by every sampled texture (texture + sampler).
    pub fn texture_layout(&self) -> Option<&wgpu::BindGroupLayout> {
        self.states.as_ref().map(|s| &s.texture_layout)
    }

    /// Creates a sampled-view bind group for `view` with the shared sampler.
    pub fn create_sampled_bind_group(
        &self,
        label: Option<&str>,
        view: &wgpu::TextureView,
    ) -> Option<wgpu::BindGroup> {
        let states = self.states.as_ref()?;
        Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label,
            layout: &states.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&states.sampler),
                },
            ],
        }))
    }

    // ── per-frame contract ──

    /// Acquires the back buffer and opens a command encoder for the frame.
    pub fn begin_frame(&mut self) -> std::result::Result<Frame, SurfaceErrorAction> {
        let Some(surface) = self.surface.as_ref() else {
            return Err(SurfaceErrorAction::Fatal);
        };

        let target = match surface.acquire() {
            Ok(t) => t,
            Err(err) => {
                let reason = err.to_string();
                let action = surface.handle_error(&self.device, err);
                log::warn!("back buffer acquisition failed: {reason} ({action:?})");
                return Err(action);
            }
        };

        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("kiln frame encoder"),
            });

        Ok(Frame {
            surface_texture: target.surface_texture,
            view: target.view,
            encoder,
        })
    }

    /// Clears the back buffer to [`CLEAR_COLOR`] and the depth buffer to 1.
    pub fn clear_screen(&self, frame: &mut Frame) {
        let depth = self
            .depth_view()
            .map(|view| wgpu::RenderPassDepthStencilAttachment {
                view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(0),
                    store: wgpu::StoreOp::Store,
                }),
            });

        let (view, encoder) = frame.split();
        let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("kiln clear screen"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: depth,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }

    /// Submits the frame and flips the presentation surface.
    ///
    /// Under FIFO presentation the next `begin_frame` blocks until a buffer is
    /// free, which paces the loop to the display.
    pub fn present(&mut self, frame: Frame) {
        let Frame {
            surface_texture,
            view,
            encoder,
        } = frame;

        self.queue.submit(std::iter::once(encoder.finish()));
        drop(view);

        if let Some(texture) = surface_texture {
            self.host.pre_present();
            texture.present();
        }
    }

    // ── state selection ──

    pub fn enable_wireframe(&mut self, enabled: bool) {
        self.selection.raster = if enabled {
            RasterState::Wireframe
        } else {
            RasterState::Solid
        };
    }

    pub fn enable_depth_buffering(&mut self, enabled: bool) {
        self.selection.depth = if enabled {
            DepthState::Enabled
        } else {
            DepthState::Disabled
        };
    }

    pub fn enable_alpha_blending(&mut self, enabled: bool) {
        self.selection.blend = if enabled {
            BlendState::AlphaOn
        } else {
            BlendState::AlphaOff
        };
    }

    // ── back buffer ──

    /// Releases the depth buffer, its view and the depth states.
    pub fn cleanup_back_buffer(&mut self) {
        if let Some(bb) = self.back_buffer.take() {
            bb.destroy();
        }
    }

    /// Rebuilds the depth resources at `size` and resets the viewport.
    pub fn configure_back_buffer(&mut self, size: (u32, u32)) {
        self.cleanup_back_buffer();
        let bb = BackBuffer::new(&self.device, size);
        self.viewport = Viewport::full(bb.size());
        self.back_buffer = Some(bb);
    }

    // ── display transitions ──

    /// Moves to windowed, borderless or exclusive fullscreen on `monitor`.
    ///
    /// Callers release their fullscreen-tracked render targets first and
    /// rebuild them afterwards.
    pub fn set_window_mode(&mut self, fullscreen: bool, borderless: bool, monitor: usize) {
        let t = self
            .display
            .plan_mode(fullscreen, borderless, monitor, self.host.as_ref());

        if t.fell_back {
            log::warn!("monitor {monitor} not found; using monitor 0");
        }
        log::info!(
            "display mode {:?} on monitor {} at {}x{}",
            t.mode,
            t.monitor,
            t.size.0,
            t.size.1
        );

        self.cleanup_back_buffer();
        if t.leave_exclusive {
            self.host.set_exclusive_fullscreen(None, t.size);
        }
        self.host.apply_window_style(t.mode, t.monitor, t.size);

        if let Some(surface) = self.surface.as_mut() {
            surface.resize(&self.device, t.size);
        }
        self.configure_back_buffer(t.size);

        if t.enter_exclusive {
            self.host.set_exclusive_fullscreen(Some(t.monitor), t.size);
        }

        self.display.commit_mode(&t);
        self.host.set_cursor_visible(self.cursor_visible());
    }

    /// Changes the back-buffer resolution without touching the display mode.
    ///
    /// Sizes beyond the adapter limit are clamped. A windowed device also
    /// resizes the window so the back buffer is not stretched.
    pub fn set_size(&mut self, width: u32, height: u32) {
        let size = self.display.commit_size((width, height));
        log::debug!("back buffer resize to {}x{}", size.0, size.1);

        if self.display.mode() == DisplayMode::Windowed && self.host.window_size() != size {
            self.host.request_window_size(size);
        }

        self.cleanup_back_buffer();
        if let Some(surface) = self.surface.as_mut() {
            surface.resize(&self.device, size);
        }
        self.configure_back_buffer(size);
    }

    /// Number of outputs attached to the display.
    pub fn number_of_monitors(&self) -> usize {
        let count = self.host.monitor_count();
        debug_assert!(count > 0, "display enumeration returned no outputs");
        count
    }

    /// Shows or hides the cursor. Exclusive fullscreen keeps it hidden until
    /// the device leaves that mode.
    pub fn display_cursor(&mut self, visible: bool) {
        self.cursor_visible = visible;
        self.host.set_cursor_visible(self.cursor_visible());
    }

    /// Switches between FIFO and uncapped presentation.
    pub fn set_vsync(&mut self, enabled: bool) {
        if enabled == self.vsync {
            return;
        }
        self.vsync = enabled;
        log::info!("vsync {}", if enabled { "on" } else { "off" });
        let mode = if enabled {
            wgpu::PresentMode::Fifo
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        if let Some(surface) = self.surface.as_mut() {
            surface.set_present_mode(&self.device, mode);
        }
    }

    // ── helpers for resources ──

    /// Fills mip levels 1.. of `texture` from level 0.
    pub fn generate_mips(&mut self, texture: &wgpu::Texture) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("kiln mip encoder"),
            });
        self.mips.generate(&self.device, &mut encoder, texture);
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    // ── teardown ──

    /// Leaves fullscreen and releases everything the device owns.
    ///
    /// Views go before the resources they reference. Caller-owned resources
    /// must already be released.
    pub fn shutdown(&mut self) {
        if !self.alive {
            return;
        }

        if self.display.mode().is_exclusive() {
            let size = self.display.configured_size();
            self.host.set_exclusive_fullscreen(None, size);
        }

        self.cleanup_back_buffer();

        if let Some(material) = self.default_material.take() {
            let DefaultMaterial {
                bind_group,
                view,
                texture,
            } = material;
            drop(bind_group);
            drop(view);
            texture.destroy();
        }

        self.states = None;

        if let Some(surface) = self.surface.take() {
            surface.release();
        }

        self.device.destroy();
        self.alive = false;
        log::info!("graphics device shut down");
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn live_resources(&self) -> LiveResources {
        LiveResources {
            surface: self.surface.is_some(),
            back_buffer: self.back_buffer.is_some(),
            state_objects: self.states.is_some(),
            default_material: self.default_material.is_some(),
            device: self.alive,
        }
    }
}

impl Drop for GraphicsDevice<'_> {
    fn drop(&mut self) {
        if self.alive {
            log::debug!("graphics device dropped without shutdown");
        }
    }
}

fn capped_size(device: &wgpu::Device, size: (u32, u32)) -> (u32, u32) {
    DisplayState::windowed(size)
        .with_max_dimension(device.limits().max_texture_dimension_2d)
        .size()
}

fn is_vsync(mode: wgpu::PresentMode) -> bool {
    matches!(
        mode,
        wgpu::PresentMode::Fifo | wgpu::PresentMode::FifoRelaxed | wgpu::PresentMode::AutoVsync
    )
}

async fn request_device(
    instance: &wgpu::Instance,
    surface: Option<&wgpu::Surface<'_>>,
    init: &DeviceInit,
) -> Result<(wgpu::Adapter, wgpu::Device, wgpu::Queue)> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: surface,
            force_fallback_adapter: false,
        })
        .await
        .context("failed to find a suitable GPU adapter")?;

    let optional = adapter.features() & wgpu::Features::POLYGON_MODE_LINE;

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("kiln device"),
            required_features: init.required_features | optional,
            required_limits: init.required_limits.clone(),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        })
        .await
        .context("failed to create wgpu device/queue")?;

    Ok((adapter, device, queue))
}

fn create_default_material(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    states: &FixedStates,
) -> DefaultMaterial {
    let size = wgpu::Extent3d {
        width: 1,
        height: 1,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("kiln default material"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &[255, 255, 255, 255],
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4),
            rows_per_image: Some(1),
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("kiln default material bg"),
        layout: &states.texture_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&states.sampler),
            },
        ],
    });

    DefaultMaterial {
        bind_group,
        view,
        texture,
    }
}
