use thiserror::Error;

use crate::device::GraphicsDevice;
use crate::render::DrawPass;
use crate::resource::{GraphicsResource, IndexBuffer, ResourceError, VertexBuffer};

use super::texture_cache::TextureCache;
use super::vertex::Vertex;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureKind {
    Diffuse,
    Specular,
}

/// A texture used by a mesh, identified by its cache key.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TextureBinding {
    pub kind: TextureKind,
    pub key: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("mesh '{0}' is locked; its GPU buffers were built from the current vertices")]
    Locked(String),

    #[error("mesh '{label}': vertex {index} out of range ({len} vertices)")]
    OutOfRange {
        label: String,
        index: usize,
        len: usize,
    },
}

/// CPU-side geometry plus the GPU buffers built from it.
///
/// Building the buffers locks the mesh: vertex edits are rejected until
/// `reset` releases the buffers again.
pub struct Mesh {
    label: String,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    textures: Vec<TextureBinding>,
    locked: bool,
    vertex_buffer: VertexBuffer,
    index_buffer: IndexBuffer,
}

impl Mesh {
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            vertex_buffer: VertexBuffer::new(format!("{label} vertices")),
            index_buffer: IndexBuffer::new(format!("{label} indices")),
            label,
            vertices: Vec::new(),
            indices: Vec::new(),
            textures: Vec::new(),
            locked: false,
        }
    }

    pub fn with_geometry(
        label: impl Into<String>,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        textures: Vec<TextureBinding>,
    ) -> Self {
        let mut mesh = Self::new(label);
        mesh.vertices = vertices;
        mesh.indices = indices;
        mesh.textures = textures;
        mesh
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn textures(&self) -> &[TextureBinding] {
        &self.textures
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn has_buffers(&self) -> bool {
        self.vertex_buffer.is_allocated()
    }

    fn ensure_unlocked(&self) -> Result<(), MeshError> {
        if self.locked {
            Err(MeshError::Locked(self.label.clone()))
        } else {
            Ok(())
        }
    }

    pub fn add_vertex(&mut self, vertex: Vertex) -> Result<(), MeshError> {
        self.ensure_unlocked()?;
        self.vertices.push(vertex);
        Ok(())
    }

    pub fn delete_vertex(&mut self, index: usize) -> Result<Vertex, MeshError> {
        self.ensure_unlocked()?;
        if index >= self.vertices.len() {
            return Err(MeshError::OutOfRange {
                label: self.label.clone(),
                index,
                len: self.vertices.len(),
            });
        }
        Ok(self.vertices.remove(index))
    }

    /// Removes all vertices and indices.
    pub fn clear(&mut self) -> Result<(), MeshError> {
        self.ensure_unlocked()?;
        self.vertices.clear();
        self.indices.clear();
        Ok(())
    }

    /// Locks the mesh and builds fresh vertex (and index) buffers.
    ///
    /// The index buffer is skipped when the mesh has no indices.
    pub fn build_buffers(&mut self, device: &GraphicsDevice) -> Result<(), ResourceError> {
        self.locked = true;
        self.vertex_buffer.release();
        self.index_buffer.release();

        self.vertex_buffer.create(device, &self.vertices)?;
        if !self.indices.is_empty() {
            self.index_buffer.create(device, &self.indices)?;
        }
        Ok(())
    }

    /// Draws with the first texture binding resolved through `textures`.
    pub fn draw(&self, pass: &mut DrawPass<'_>, textures: &TextureCache) {
        let material = self
            .textures
            .first()
            .and_then(|t| textures.bind_group(&t.key));
        self.draw_with_material(pass, material);
    }

    /// Draws with an explicit material; `None` uses the pass default.
    pub fn draw_with_material(&self, pass: &mut DrawPass<'_>, material: Option<&wgpu::BindGroup>) {
        if !self.vertex_buffer.is_allocated() {
            return;
        }

        pass.bind_material(material);
        self.vertex_buffer.bind(pass);

        if self.index_buffer.is_allocated() {
            self.index_buffer.bind(pass);
            pass.draw_indexed(self.index_buffer.len());
        } else {
            pass.draw(self.vertex_buffer.len());
        }
    }

    /// Releases the GPU buffers and unlocks the mesh.
    pub fn reset(&mut self) {
        self.vertex_buffer.release();
        self.index_buffer.release();
        self.locked = false;
    }

    /// `reset` plus dropping the CPU geometry.
    pub fn release(&mut self) {
        self.reset();
        self.vertices.clear();
        self.indices.clear();
    }
}
