//! GPU-resident resources.
//!
//! Every resource is created from a stored descriptor, released explicitly by
//! its owner and can be created again after release. Nothing is freed behind
//! the owner's back.

mod error;
mod geometry_buffer;
mod render_target;
mod texture;

use std::fmt;

pub use error::ResourceError;
pub use geometry_buffer::{BufferElement, GeometryBuffer, IndexBuffer, VertexBuffer};
pub use render_target::{RenderTarget, Sizing};
pub use texture::{
    mip_level_count, pack_rows, padded_bytes_per_row, wants_mips, MipChain, Texture, TextureDesc,
    MIP_THRESHOLD,
};

/// Resource categories, used in log and error messages.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ResourceKind {
    Texture,
    RenderTarget,
    VertexBuffer,
    IndexBuffer,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Texture => "texture",
            ResourceKind::RenderTarget => "render target",
            ResourceKind::VertexBuffer => "vertex buffer",
            ResourceKind::IndexBuffer => "index buffer",
        };
        f.write_str(name)
    }
}

/// Lifecycle shared by every GPU-resident object.
pub trait GraphicsResource {
    fn kind(&self) -> ResourceKind;

    /// True while the GPU object exists.
    fn is_allocated(&self) -> bool;

    /// Frees the GPU object. Calling it again is a no-op.
    fn release(&mut self);
}
