//! Device and resource lifecycle on a headless adapter.
//!
//! Each test returns early when the machine has no usable adapter.

use kiln_engine::config::Settings;
use kiln_engine::device::{DisplayMode, GraphicsDevice};
use kiln_engine::resource::{
    GraphicsResource, MipChain, RenderTarget, ResourceError, Texture, TextureDesc,
};
use kiln_engine::scene::{Mesh, MeshError, Vertex};

fn headless(settings: &Settings) -> Option<GraphicsDevice<'static>> {
    match pollster::block_on(GraphicsDevice::headless_default(settings)) {
        Ok(device) => Some(device),
        Err(e) => {
            eprintln!("skipping: no adapter ({e:#})");
            None
        }
    }
}

// ── lifecycle ──

#[test]
fn shutdown_releases_everything() {
    let Some(mut device) = headless(&Settings::default()) else {
        return;
    };
    assert!(device.live_resources().any());
    assert_eq!(device.back_buffer_size(), (1280, 720));

    device.shutdown();
    assert!(!device.is_alive());
    assert!(!device.live_resources().any());

    // second call is a no-op
    device.shutdown();
    assert!(!device.live_resources().any());
}

#[test]
fn clear_and_present_offscreen() {
    let Some(mut device) = headless(&Settings::default()) else {
        return;
    };
    let Ok(mut frame) = device.begin_frame() else {
        panic!("offscreen back buffer should always be acquirable");
    };
    device.clear_screen(&mut frame);
    device.present(frame);
    device.shutdown();
}

// ── set_size ──

#[test]
fn set_size_rebuilds_back_buffer_and_fullscreen_targets() {
    let Some(mut device) = headless(&Settings::default()) else {
        return;
    };
    let mut rt = RenderTarget::fullscreen("test rt", wgpu::TextureFormat::Rgba16Float);
    rt.initialise(&mut device).expect("render target");
    assert_eq!((rt.width(), rt.height()), (1280, 720));

    rt.release();
    device.set_size(1920, 1080);
    rt.set_dimensions_to_fullscreen();
    rt.initialise(&mut device).expect("render target after resize");

    assert_eq!(device.back_buffer_size(), (1920, 1080));
    assert_eq!(device.viewport().width, 1920.0);
    assert_eq!((rt.width(), rt.height()), (1920, 1080));
    assert!(device.depth_view().is_some());

    rt.release();
    device.shutdown();
}

#[test]
fn borderless_then_windowed_restores_configured_size() {
    let Some(mut device) = headless(&Settings::default()) else {
        return;
    };
    device.set_window_mode(false, true, 0);
    assert_eq!(device.display_mode(), DisplayMode::Borderless);
    assert_eq!(device.back_buffer_size(), (1920, 1080));

    device.set_window_mode(false, false, 0);
    assert_eq!(device.display_mode(), DisplayMode::Windowed);
    assert_eq!(device.back_buffer_size(), (1280, 720));
    device.shutdown();
}

#[test]
fn missing_monitor_falls_back_to_first() {
    let Some(mut device) = headless(&Settings::default()) else {
        return;
    };
    assert_eq!(device.number_of_monitors(), 1);
    device.set_window_mode(false, true, 3);
    assert_eq!(device.monitor(), 0);
    device.shutdown();
}

#[test]
fn oversized_requests_are_clamped_to_adapter_limit() {
    let Some(mut device) = headless(&Settings::default()) else {
        return;
    };
    let max = device.max_dimension();
    device.set_size(max.saturating_add(1000), 100);
    assert_eq!(device.back_buffer_size(), (max, 100));
    assert_eq!(device.configured_size(), (max, 100));

    let Ok(mut frame) = device.begin_frame() else {
        panic!("clamped back buffer should be acquirable");
    };
    device.clear_screen(&mut frame);
    device.present(frame);
    device.shutdown();
}

#[test]
fn oversized_settings_start_clamped() {
    let settings = Settings {
        screen_width: u32::MAX,
        screen_height: 64,
        ..Settings::default()
    };
    let Some(mut device) = headless(&settings) else {
        return;
    };
    assert_eq!(device.back_buffer_size(), (device.max_dimension(), 64));
    device.shutdown();
}

#[test]
fn windowed_set_size_resizes_the_window() {
    let Some(mut device) = headless(&Settings::default()) else {
        return;
    };
    assert_eq!(device.window_size(), (1280, 720));
    device.set_size(800, 600);
    assert_eq!(device.window_size(), (800, 600));

    // exclusive fullscreen leaves the window alone
    device.set_window_mode(true, false, 0);
    device.set_size(1024, 768);
    assert_eq!(device.back_buffer_size(), (1024, 768));
    assert_eq!(device.configured_size(), (800, 600));

    device.set_window_mode(false, false, 0);
    assert_eq!(device.back_buffer_size(), (800, 600));
    device.shutdown();
}

// ── cursor ──

#[test]
fn cursor_hidden_only_in_exclusive_fullscreen() {
    let Some(mut device) = headless(&Settings::default()) else {
        return;
    };
    assert!(device.cursor_visible());

    device.set_window_mode(true, false, 0);
    assert_eq!(device.display_mode(), DisplayMode::Fullscreen);
    assert!(!device.cursor_visible());

    // a request made while exclusive waits for the mode change
    device.display_cursor(true);
    assert!(!device.cursor_visible());

    device.set_window_mode(false, false, 0);
    assert!(device.cursor_visible());

    device.display_cursor(false);
    assert!(!device.cursor_visible());
    device.shutdown();
}

#[test]
fn cursor_preference_comes_from_settings() {
    let settings = Settings {
        show_cursor: false,
        ..Settings::default()
    };
    let Some(mut device) = headless(&settings) else {
        return;
    };
    assert!(!device.cursor_visible());
    device.shutdown();
}

// ── resources ──

#[test]
fn texture_can_be_recreated_after_release() {
    let Some(mut device) = headless(&Settings::default()) else {
        return;
    };
    let pixels = vec![255u8; 4 * 4 * 4];
    let mut texture = Texture::from_rgba8("checker", 4, 4, pixels, MipChain::Single);

    texture.initialise(&mut device).expect("first initialise");
    assert!(texture.is_allocated());
    assert!(texture.bind_group().is_some());

    texture.release();
    assert!(!texture.is_allocated());
    texture.release();

    texture.initialise(&mut device).expect("second initialise");
    assert!(texture.is_allocated());

    texture.release();
    device.shutdown();
}

#[test]
fn built_mesh_rejects_vertex_edits() {
    let Some(mut device) = headless(&Settings::default()) else {
        return;
    };
    let v = Vertex::new([0.0; 3], [0.0, 1.0, 0.0], [0.0; 2]);
    let mut mesh = Mesh::with_geometry("tri", vec![v; 3], vec![0, 1, 2], Vec::new());

    mesh.build_buffers(&device).expect("buffers");
    assert!(mesh.is_locked());
    assert!(mesh.has_buffers());
    assert_eq!(mesh.add_vertex(v), Err(MeshError::Locked("tri".into())));
    assert_eq!(mesh.vertices().len(), 3);

    mesh.reset();
    assert!(!mesh.is_locked());
    mesh.add_vertex(v).expect("unlocked after reset");

    mesh.release();
    device.shutdown();
}

#[test]
fn odd_width_upload_reads_back_unchanged() {
    let Some(mut device) = headless(&Settings::default()) else {
        return;
    };
    let (width, height) = (3u32, 2u32);
    let desc = TextureDesc::new("odd", width, height, wgpu::TextureFormat::Rgba8Unorm)
        .with_usage(wgpu::TextureUsages::COPY_DST | wgpu::TextureUsages::COPY_SRC);
    let mut texture = Texture::new(desc);
    texture.initialise(&mut device).expect("initialise");

    let pixels: Vec<u8> = (0..width * height * 4).map(|i| i as u8).collect();
    texture
        .copy_data_into_texture(&device, &pixels, width * 4)
        .expect("upload");

    let stride = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let readback = device.device().create_buffer(&wgpu::BufferDescriptor {
        label: Some("readback"),
        size: u64::from(stride * height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    let mut encoder = device
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("readback") });
    encoder.copy_texture_to_buffer(
        texture.raw().expect("allocated").as_image_copy(),
        wgpu::TexelCopyBufferInfo {
            buffer: &readback,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(stride),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    device.queue().submit(Some(encoder.finish()));

    let slice = readback.slice(..);
    slice.map_async(wgpu::MapMode::Read, |r| r.expect("map"));
    device
        .device()
        .poll(wgpu::PollType::wait_indefinitely())
        .expect("poll");

    {
        let mapped = slice.get_mapped_range();
        let row = (width * 4) as usize;
        for y in 0..height as usize {
            let got = &mapped[y * stride as usize..][..row];
            assert_eq!(got, &pixels[y * row..][..row], "row {y}");
        }
    }
    readback.unmap();

    texture.release();
    device.shutdown();
}

#[test]
fn copy_requires_allocation_and_write_access() {
    let Some(mut device) = headless(&Settings::default()) else {
        return;
    };
    let pixels = vec![0u8; 4 * 4 * 4];

    let writable = Texture::new(TextureDesc::new(
        "pending",
        4,
        4,
        wgpu::TextureFormat::Rgba8Unorm,
    ));
    let err = writable.copy_data_into_texture(&device, &pixels, 16).unwrap_err();
    assert!(matches!(err, ResourceError::NotAllocated { .. }));

    let desc = TextureDesc::new("sample only", 4, 4, wgpu::TextureFormat::Rgba8Unorm)
        .with_usage(wgpu::TextureUsages::TEXTURE_BINDING);
    let mut read_only = Texture::new(desc);
    read_only.initialise(&mut device).expect("initialise");
    let err = read_only.copy_data_into_texture(&device, &pixels, 16).unwrap_err();
    assert!(matches!(err, ResourceError::NotWritable { .. }));

    read_only.release();
    device.shutdown();
}

#[test]
fn full_mip_chain_on_large_texture() {
    let Some(mut device) = headless(&Settings::default()) else {
        return;
    };
    let pixels = vec![128u8; 512 * 512 * 4];
    let mut texture = Texture::from_rgba8("large", 512, 512, pixels, MipChain::Full);
    texture.initialise(&mut device).expect("initialise with mips");

    assert!(texture.is_allocated());
    assert_eq!(texture.raw().map(|t| t.mip_level_count()), Some(10));

    texture.release();
    device.shutdown();
}
