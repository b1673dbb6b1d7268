//! Full ticks of the frame pipeline on a headless adapter.

use std::path::Path;

use kiln_engine::camera::Camera;
use kiln_engine::config::Settings;
use kiln_engine::device::{DisplayMode, GraphicsDevice};
use kiln_engine::input::InputAction;
use kiln_engine::pipeline::{FramePipeline, FrameStatus};
use kiln_engine::resource::GraphicsResource;
use kiln_engine::scene::{ImportedMesh, ImportedNode, ImportedScene, Model};

struct Harness {
    device: GraphicsDevice<'static>,
    pipeline: FramePipeline,
    camera: Camera,
    model: Model,
}

impl Harness {
    fn new(settings: &Settings) -> Option<Self> {
        let mut device = match pollster::block_on(GraphicsDevice::headless_default(settings)) {
            Ok(device) => device,
            Err(e) => {
                eprintln!("skipping: no adapter ({e:#})");
                return None;
            }
        };
        let pipeline = FramePipeline::new(&mut device, settings).expect("pipeline");
        let (w, h) = device.back_buffer_size();
        Some(Self {
            device,
            pipeline,
            camera: Camera::new(w, h),
            model: Model::empty("empty"),
        })
    }

    fn tick(&mut self) -> kiln_engine::pipeline::FrameOutcome {
        self.camera.update();
        self.pipeline.render(&mut self.device, &self.camera, &self.model)
    }

    fn press(&mut self, action: InputAction) {
        assert!(self.pipeline.handle_action(action, true));
        self.pipeline.handle_action(action, false);
    }

    fn finish(mut self) {
        self.pipeline.release();
        self.model.release();
        self.device.shutdown();
        assert!(!self.device.live_resources().any());
    }
}

// ── passes ──

#[test]
fn composite_draws_the_quad_once() {
    let Some(mut h) = Harness::new(&Settings::default()) else {
        return;
    };
    let outcome = h.tick();

    assert_eq!(outcome.status, FrameStatus::Presented);
    assert_eq!(outcome.geometry.total_draws(), 0);
    assert_eq!(outcome.composite.indexed_draw_calls, 1);
    assert_eq!(outcome.composite.last_index_count, 6);
    assert_eq!(outcome.post_fx.map(|s| s.indexed_draw_calls), Some(1));
    assert_eq!(outcome.resized, None);
    h.finish();
}

#[test]
fn quad_mesh_is_one_indexed_draw_of_six() {
    let Some(mut h) = Harness::new(&Settings::default()) else {
        return;
    };
    let quad = ImportedScene {
        roots: vec![ImportedNode {
            name: Some("root".into()),
            meshes: vec![0],
            children: Vec::new(),
        }],
        meshes: vec![ImportedMesh {
            name: "quad".into(),
            positions: vec![[-1.0, -1.0, 5.0], [1.0, -1.0, 5.0], [1.0, 1.0, 5.0], [-1.0, 1.0, 5.0]],
            normals: None,
            tex_coords: None,
            faces: vec![[0, 1, 2], [0, 2, 3]],
            material: None,
        }],
        materials: Vec::new(),
    };
    h.model = Model::from_scene(&mut h.device, Path::new("quad.gltf"), &quad, false);
    assert_eq!(h.model.mesh_count(), 1);

    let outcome = h.tick();
    assert_eq!(outcome.geometry.indexed_draw_calls, 1);
    assert_eq!(outcome.geometry.draw_calls, 0);
    assert_eq!(outcome.geometry.last_index_count, 6);
    h.finish();
}

#[test]
fn post_fx_pass_is_skipped_when_disabled() {
    let settings = Settings {
        post_fx: false,
        ..Settings::default()
    };
    let Some(mut h) = Harness::new(&settings) else {
        return;
    };
    let outcome = h.tick();
    assert_eq!(outcome.post_fx, None);
    assert_eq!(outcome.composite.indexed_draw_calls, 1);

    h.press(InputAction::TogglePostFx);
    assert!(h.tick().post_fx.is_some());
    h.finish();
}

#[test]
fn pipelines_are_reused_across_frames() {
    let Some(mut h) = Harness::new(&Settings::default()) else {
        return;
    };
    h.tick();
    let built = h.pipeline.pipeline_count();
    h.tick();
    assert_eq!(h.pipeline.pipeline_count(), built);
    h.finish();
}

// ── display changes ──

#[test]
fn fullscreen_round_trip_restores_windowed_size() {
    let Some(mut h) = Harness::new(&Settings::default()) else {
        return;
    };

    h.press(InputAction::ToggleFullscreen);
    let outcome = h.tick();
    assert_eq!(outcome.resized, Some((1280, 720)));
    assert_eq!(h.device.display_mode(), DisplayMode::Fullscreen);
    assert!(h.pipeline.pending_requests().is_stable());

    h.press(InputAction::ToggleFullscreen);
    h.tick();
    assert_eq!(h.device.display_mode(), DisplayMode::Windowed);
    assert_eq!(h.device.back_buffer_size(), (1280, 720));
    for rt in h.pipeline.render_targets() {
        assert!(rt.is_allocated());
        assert_eq!((rt.width(), rt.height()), (1280, 720));
    }
    h.finish();
}

#[test]
fn resize_request_resizes_targets_after_present() {
    let Some(mut h) = Harness::new(&Settings::default()) else {
        return;
    };
    h.pipeline.request_resize(1920, 1080);
    let outcome = h.tick();

    assert_eq!(outcome.status, FrameStatus::Presented);
    assert_eq!(outcome.resized, Some((1920, 1080)));
    for rt in h.pipeline.render_targets() {
        assert_eq!((rt.width(), rt.height()), (1920, 1080));
    }
    assert_eq!(h.pipeline.controls().resolution, (1920, 1080));

    // same size again is a no-op
    h.pipeline.request_resize(1920, 1080);
    assert_eq!(h.tick().resized, None);
    h.finish();
}

#[test]
fn borderless_uses_monitor_resolution() {
    let Some(mut h) = Harness::new(&Settings::default()) else {
        return;
    };
    h.press(InputAction::ToggleBorderless);
    let outcome = h.tick();
    assert_eq!(outcome.resized, Some((1920, 1080)));
    assert!(h.pipeline.controls().borderless);
    assert!(!h.pipeline.controls().fullscreen);
    h.finish();
}

#[test]
fn resolution_steps_continue_from_window_resize() {
    let Some(mut h) = Harness::new(&Settings::default()) else {
        return;
    };
    h.pipeline.request_resize(1000, 500);
    h.tick();
    assert_eq!(h.pipeline.controls().resolution, (1000, 500));

    h.press(InputAction::GrowResolution);
    h.press(InputAction::ApplyResolution);
    let step = kiln_engine::pipeline::RESOLUTION_STEP;
    assert_eq!(h.tick().resized, Some((1000 + step.0, 500 + step.1)));
    h.finish();
}

#[test]
fn oversized_resize_is_clamped_and_growth_stops_at_limit() {
    let Some(mut h) = Harness::new(&Settings::default()) else {
        return;
    };
    let max = h.device.max_dimension();
    h.pipeline.request_resize(u32::MAX, 100);
    assert_eq!(h.tick().resized, Some((max, 100)));
    assert_eq!(h.pipeline.controls().resolution, (max, 100));

    h.press(InputAction::GrowResolution);
    assert_eq!(h.pipeline.controls().resolution.0, max);

    h.press(InputAction::ApplyResolution);
    let outcome = h.tick();
    assert_eq!(outcome.status, FrameStatus::Presented);
    assert_eq!(h.device.back_buffer_size().0, max);
    h.finish();
}

// ── presentation ──

#[test]
fn vsync_toggle_applies_after_present() {
    let Some(mut h) = Harness::new(&Settings::default()) else {
        return;
    };
    let initial = h.device.vsync();
    assert_eq!(h.pipeline.controls().vsync, initial);

    h.press(InputAction::ToggleVsync);
    assert_eq!(h.device.vsync(), initial);
    assert_eq!(h.tick().status, FrameStatus::Presented);
    assert_eq!(h.device.vsync(), !initial);

    h.press(InputAction::ToggleVsync);
    h.tick();
    assert_eq!(h.device.vsync(), initial);
    h.finish();
}
