use std::marker::PhantomData;

use bytemuck::Pod;

use crate::device::GraphicsDevice;
use crate::render::DrawPass;
use crate::scene::Vertex;

use super::{GraphicsResource, ResourceError, ResourceKind};

/// Element types a [`GeometryBuffer`] can hold.
pub trait BufferElement: Pod {
    const KIND: ResourceKind;
    const USAGE: wgpu::BufferUsages;
}

impl BufferElement for Vertex {
    const KIND: ResourceKind = ResourceKind::VertexBuffer;
    const USAGE: wgpu::BufferUsages = wgpu::BufferUsages::VERTEX;
}

impl BufferElement for u32 {
    const KIND: ResourceKind = ResourceKind::IndexBuffer;
    const USAGE: wgpu::BufferUsages = wgpu::BufferUsages::INDEX;
}

/// Immutable GPU buffer built once from a CPU array.
///
/// The element count is fixed at creation; a different array needs
/// `release` followed by `create`.
pub struct GeometryBuffer<T: BufferElement> {
    label: String,
    buffer: Option<wgpu::Buffer>,
    len: u32,
    _element: PhantomData<T>,
}

pub type VertexBuffer = GeometryBuffer<Vertex>;
pub type IndexBuffer = GeometryBuffer<u32>;

impl<T: BufferElement> GeometryBuffer<T> {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            buffer: None,
            len: 0,
            _element: PhantomData,
        }
    }

    /// Bytes per element.
    pub const fn stride() -> u64 {
        std::mem::size_of::<T>() as u64
    }

    /// Allocates the buffer and uploads `data` through a mapping taken at
    /// creation, so no earlier contents are ever read back.
    pub fn create(&mut self, device: &GraphicsDevice, data: &[T]) -> Result<(), ResourceError> {
        self.try_create(device, data)
            .inspect_err(|e| log::error!("{e}"))
    }

    fn try_create(&mut self, device: &GraphicsDevice, data: &[T]) -> Result<(), ResourceError> {
        if data.is_empty() {
            return Err(ResourceError::EmptyGeometry {
                kind: T::KIND,
                label: self.label.clone(),
            });
        }
        if self.buffer.is_some() {
            return Err(ResourceError::AlreadyAllocated {
                kind: T::KIND,
                label: self.label.clone(),
            });
        }
        if !device.is_alive() {
            return Err(ResourceError::DeviceLost {
                kind: T::KIND,
                label: self.label.clone(),
            });
        }

        let bytes: &[u8] = bytemuck::cast_slice(data);
        let buffer = device.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some(&self.label),
            size: bytes.len() as u64,
            usage: T::USAGE,
            mapped_at_creation: true,
        });

        {
            let mut view = buffer.slice(..).get_mapped_range_mut();
            view.copy_from_slice(bytes);
        }
        buffer.unmap();

        self.len = data.len() as u32;
        self.buffer = Some(buffer);
        Ok(())
    }

    /// Number of elements uploaded at creation (0 when released).
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }
}

impl GeometryBuffer<Vertex> {
    /// Sets this buffer as vertex slot 0.
    pub fn bind(&self, pass: &mut DrawPass<'_>) {
        if let Some(buffer) = &self.buffer {
            pass.set_vertex_buffer(0, buffer.slice(..));
        }
    }
}

impl GeometryBuffer<u32> {
    /// Sets this buffer as the 32-bit index source.
    pub fn bind(&self, pass: &mut DrawPass<'_>) {
        if let Some(buffer) = &self.buffer {
            pass.set_index_buffer(buffer.slice(..), wgpu::IndexFormat::Uint32);
        }
    }
}

impl<T: BufferElement> GraphicsResource for GeometryBuffer<T> {
    fn kind(&self) -> ResourceKind {
        T::KIND
    }

    fn is_allocated(&self) -> bool {
        self.buffer.is_some()
    }

    fn release(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            buffer.destroy();
        }
        self.len = 0;
    }
}
