use std::path::PathBuf;

use anyhow::{Context, Result};

use kiln_engine::camera::Camera;
use kiln_engine::config::Settings;
use kiln_engine::core::{App, AppControl, FrameCtx};
use kiln_engine::device::{DeviceInit, GraphicsDevice};
use kiln_engine::input::{ActionMap, InputAction};
use kiln_engine::logging::{init_logging, LoggingConfig};
use kiln_engine::pipeline::{FramePipeline, FrameStatus};
use kiln_engine::scene::Model;
use kiln_engine::window::Runtime;

const DEFAULT_SETTINGS: &str = "settings.toml";

/// Free-fly viewer for one scene file.
struct Viewer {
    settings: Settings,
    camera: Camera,
    model: Option<Model>,
    pipeline: Option<FramePipeline>,
}

impl Viewer {
    fn new(settings: Settings) -> Self {
        let (w, h) = settings.screen_size();
        Self {
            settings,
            camera: Camera::new(w, h),
            model: None,
            pipeline: None,
        }
    }
}

impl App for Viewer {
    fn on_start(&mut self, device: &mut GraphicsDevice<'_>) -> Result<()> {
        let pipeline = FramePipeline::new(device, &self.settings)?;

        let (w, h) = device.back_buffer_size();
        self.camera.set_aspect(w, h);

        let model = match self.settings.model_path() {
            Some(path) => Model::load(device, &path, self.settings.generate_mips),
            None => {
                log::warn!("no model configured; rendering an empty scene");
                Model::empty(PathBuf::new())
            }
        };

        self.model = Some(model);
        self.pipeline = Some(pipeline);
        Ok(())
    }

    fn on_input(&mut self, action: InputAction, pressed: bool) -> bool {
        if self.camera.handle_action(action, pressed) {
            return true;
        }
        self.pipeline
            .as_mut()
            .is_some_and(|p| p.handle_action(action, pressed))
    }

    fn on_resized(&mut self, width: u32, height: u32) {
        if let Some(pipeline) = self.pipeline.as_mut() {
            pipeline.request_resize(width, height);
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let (Some(pipeline), Some(model)) = (self.pipeline.as_mut(), self.model.as_ref()) else {
            return AppControl::Continue;
        };

        self.camera.update();
        let outcome = pipeline.render(ctx.device, &self.camera, model);

        if let Some((w, h)) = outcome.resized {
            self.camera.set_aspect(w, h);
        }
        log::trace!(
            "frame {}: {} geometry draw(s)",
            ctx.time.frame_index,
            outcome.geometry.total_draws()
        );

        match outcome.status {
            FrameStatus::Fatal => {
                log::error!("presentation surface lost");
                AppControl::Exit
            }
            FrameStatus::Presented | FrameStatus::Skipped => AppControl::Continue,
        }
    }

    fn on_shutdown(&mut self, _device: &mut GraphicsDevice<'_>) {
        if let Some(mut pipeline) = self.pipeline.take() {
            pipeline.release();
        }
        if let Some(mut model) = self.model.take() {
            model.release();
        }
    }
}

fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS));
    let settings = Settings::load(&path)?;

    init_logging(LoggingConfig::from_settings(&settings));
    log::info!("settings from {}", path.display());

    let init = DeviceInit::from_settings(&settings);
    Runtime::run(settings.clone(), init, ActionMap::default(), Viewer::new(settings))
        .context("viewer exited with an error")
}
