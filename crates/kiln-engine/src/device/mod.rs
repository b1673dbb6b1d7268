//! Graphics device and presentation surface.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - owning the presentation surface and the depth buffer
//! - the fixed raster/depth/blend state objects
//! - the windowed/borderless/fullscreen transition protocol

mod back_buffer;
mod display;
mod error;
mod frame;
mod graphics_device;
mod init;
mod mips;
mod states;
mod surface;
mod winit_display;

pub use back_buffer::{BackBuffer, Viewport, DEPTH_FORMAT};
pub use display::{DisplayHost, DisplayMode, DisplayState, ModeTransition, VirtualDisplay};
pub use error::SurfaceErrorAction;
pub use frame::{Frame, PassStats};
pub use graphics_device::{GraphicsDevice, LiveResources, CLEAR_COLOR};
pub use init::DeviceInit;
pub use states::{BlendState, DepthState, DepthStates, FixedStates, RasterState, StateSelection};
pub use winit_display::WinitDisplay;
