//! Deferred frame pipeline: geometry pass into the G-buffer, optional
//! post-effect pass, composite onto the back buffer.

mod cache;
mod frame_pipeline;
mod quad;
mod requests;
mod uniforms;

pub use cache::{PassKind, PipelineCache, PipelineKey, ShaderSet};
pub use frame_pipeline::{FrameOutcome, FramePipeline, FrameStatus, GBUFFER_FORMAT};
pub use quad::{fullscreen_quad, quad_vertices};
pub use requests::{DisplayControls, DisplayRequests, ModeRequest, RESOLUTION_STEP};
pub use uniforms::FrameUniforms;
