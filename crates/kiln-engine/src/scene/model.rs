use std::path::{Path, PathBuf};

use crate::device::GraphicsDevice;
use crate::render::DrawPass;
use crate::resource::{wants_mips, MipChain, Texture};

use super::import::{import_gltf, ImportedScene, TextureRef};
use super::mesh::{Mesh, TextureBinding, TextureKind};
use super::texture_cache::TextureCache;

/// Meshes and textures loaded from one scene file.
pub struct Model {
    path: PathBuf,
    meshes: Vec<Mesh>,
    textures: TextureCache,
    generate_mips: bool,
}

impl Model {
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            meshes: Vec::new(),
            textures: TextureCache::new(),
            generate_mips: false,
        }
    }

    /// Imports `path` and uploads its meshes and textures.
    ///
    /// Import failures are logged and leave the model without meshes.
    pub fn load(device: &mut GraphicsDevice, path: &Path, generate_mips: bool) -> Self {
        match import_gltf(path) {
            Ok(scene) => Self::from_scene(device, path, &scene, generate_mips),
            Err(e) => {
                log::error!("model '{}': {e}", path.display());
                if let Some(source) = std::error::Error::source(&e) {
                    log::error!("  caused by: {source}");
                }
                Self::empty(path)
            }
        }
    }

    pub fn from_scene(
        device: &mut GraphicsDevice,
        path: &Path,
        scene: &ImportedScene,
        generate_mips: bool,
    ) -> Self {
        let mut model = Self::empty(path);
        model.generate_mips = generate_mips;

        for index in scene.collect_meshes() {
            let Some(imported) = scene.meshes.get(index) else {
                continue;
            };

            let mut bindings = Vec::new();
            if let Some(material) = imported.material.and_then(|m| scene.materials.get(m)) {
                for (kind, refs) in [
                    (TextureKind::Diffuse, &material.diffuse),
                    (TextureKind::Specular, &material.specular),
                ] {
                    for texture in refs {
                        if let Some(binding) = model.load_texture(device, kind, texture) {
                            bindings.push(binding);
                        }
                    }
                }
            }

            let label = format!("{}[{}]", imported.name, model.meshes.len());
            let mut mesh =
                Mesh::with_geometry(label, imported.vertices(), imported.indices(), bindings);
            if let Err(e) = mesh.build_buffers(device) {
                log::error!("mesh '{}': {e}", mesh.label());
            }
            model.meshes.push(mesh);
        }

        log::info!(
            "model '{}': {} mesh(es), {} texture(s)",
            path.display(),
            model.meshes.len(),
            model.textures.loaded_count()
        );
        model
    }

    /// Resolves a texture through the cache; returns a binding only when
    /// the texture loaded.
    fn load_texture(
        &mut self,
        device: &mut GraphicsDevice,
        kind: TextureKind,
        texture: &TextureRef,
    ) -> Option<TextureBinding> {
        let key = texture.cache_key(&self.path);
        let generate_mips = self.generate_mips;
        let loaded = self
            .textures
            .get_or_load(&key, || decode_texture(device, &key, texture, generate_mips));
        loaded.then_some(TextureBinding { kind, key })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn textures(&self) -> &TextureCache {
        &self.textures
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Draws every mesh; meshes without textures use the default material.
    pub fn draw(&self, pass: &mut DrawPass<'_>) {
        for mesh in &self.meshes {
            mesh.draw(pass, &self.textures);
        }
    }

    pub fn release(&mut self) {
        for mesh in &mut self.meshes {
            mesh.release();
        }
        self.meshes.clear();
        self.textures.release();
    }
}

fn decode_texture(
    device: &mut GraphicsDevice,
    key: &str,
    texture: &TextureRef,
    generate_mips: bool,
) -> Option<Texture> {
    let decoded = match texture {
        TextureRef::File(_) => image::open(key),
        TextureRef::Embedded { bytes, .. } => image::load_from_memory(bytes),
    };
    let rgba = match decoded {
        Ok(img) => img.to_rgba8(),
        Err(e) => {
            log::error!("texture '{key}': {e}");
            return None;
        }
    };

    let (width, height) = rgba.dimensions();
    let mips = if generate_mips && wants_mips(width, height) {
        MipChain::Full
    } else {
        MipChain::Single
    };

    let mut texture = Texture::from_rgba8(key, width, height, rgba.into_raw(), mips);
    texture.initialise(device).ok()?;
    Some(texture)
}
