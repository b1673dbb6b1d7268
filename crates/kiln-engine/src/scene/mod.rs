//! Meshes, models and the scene importer.

mod import;
mod mesh;
mod model;
mod texture_cache;
mod vertex;

pub use import::{
    generate_normals, import_gltf, import_gltf_slice, ImportedMaterial, ImportedMesh,
    ImportedNode, ImportedScene, ModelError, TextureRef,
};
pub use mesh::{Mesh, MeshError, TextureBinding, TextureKind};
pub use model::Model;
pub use texture_cache::TextureCache;
pub use vertex::Vertex;
