use std::path::{Path, PathBuf};

use glam::Vec3;
use thiserror::Error;

use super::vertex::Vertex;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read glTF '{path}'")]
    Import {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },

    #[error("failed to resolve glTF buffers")]
    Buffers(#[source] gltf::Error),

    #[error("glTF document has no scene")]
    NoScene,

    #[error("mesh '{mesh}' has a primitive without positions")]
    MissingPositions { mesh: String },
}

/// Where a material texture comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureRef {
    /// Path relative to the model's directory.
    File(PathBuf),
    /// Encoded image bytes stored inside the model file.
    Embedded { image: usize, bytes: Vec<u8> },
}

impl TextureRef {
    /// Key used to share one texture between meshes of the same model.
    pub fn cache_key(&self, model_path: &Path) -> String {
        match self {
            TextureRef::File(rel) => {
                let dir = model_path.parent().unwrap_or_else(|| Path::new(""));
                dir.join(rel).to_string_lossy().replace('\\', "/")
            }
            TextureRef::Embedded { image, .. } => {
                format!("{}#image{image}", model_path.to_string_lossy().replace('\\', "/"))
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedMaterial {
    pub diffuse: Vec<TextureRef>,
    pub specular: Vec<TextureRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportedMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub tex_coords: Option<Vec<[f32; 2]>>,
    pub faces: Vec<[u32; 3]>,
    pub material: Option<usize>,
}

impl ImportedMesh {
    /// Interleaves the attribute streams. Missing normals are generated from
    /// the faces, missing texture coordinates become zero.
    pub fn vertices(&self) -> Vec<Vertex> {
        let generated;
        let normals = match &self.normals {
            Some(n) if n.len() == self.positions.len() => n.as_slice(),
            _ => {
                generated = generate_normals(&self.positions, &self.faces);
                generated.as_slice()
            }
        };

        self.positions
            .iter()
            .enumerate()
            .map(|(i, &position)| {
                let tex_coord = self
                    .tex_coords
                    .as_ref()
                    .and_then(|t| t.get(i).copied())
                    .unwrap_or([0.0, 0.0]);
                Vertex::new(position, normals[i], tex_coord)
            })
            .collect()
    }

    pub fn indices(&self) -> Vec<u32> {
        self.faces.iter().flatten().copied().collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedNode {
    pub name: Option<String>,
    pub meshes: Vec<usize>,
    pub children: Vec<ImportedNode>,
}

/// A format-neutral scene: a node tree referencing flat mesh and material
/// tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedScene {
    pub roots: Vec<ImportedNode>,
    pub meshes: Vec<ImportedMesh>,
    pub materials: Vec<ImportedMaterial>,
}

impl ImportedScene {
    /// Mesh indices in depth-first order: a node's own meshes, then its
    /// children.
    pub fn collect_meshes(&self) -> Vec<usize> {
        fn walk(node: &ImportedNode, out: &mut Vec<usize>) {
            out.extend_from_slice(&node.meshes);
            for child in &node.children {
                walk(child, out);
            }
        }

        let mut out = Vec::new();
        for root in &self.roots {
            walk(root, &mut out);
        }
        out
    }
}

/// Reads a `.gltf` or `.glb` file.
pub fn import_gltf(path: &Path) -> Result<ImportedScene, ModelError> {
    let gltf = gltf::Gltf::open(path).map_err(|source| ModelError::Import {
        path: path.to_path_buf(),
        source,
    })?;
    let base = path.parent();
    let buffers =
        gltf::import_buffers(&gltf.document, base, gltf.blob).map_err(ModelError::Buffers)?;
    convert_document(&gltf.document, &buffers)
}

/// Reads a glTF document held in memory. Relative buffer URIs resolve
/// against `base`.
pub fn import_gltf_slice(bytes: &[u8], base: Option<&Path>) -> Result<ImportedScene, ModelError> {
    let gltf = gltf::Gltf::from_slice(bytes).map_err(|source| ModelError::Import {
        path: PathBuf::from("<memory>"),
        source,
    })?;
    let buffers =
        gltf::import_buffers(&gltf.document, base, gltf.blob).map_err(ModelError::Buffers)?;
    convert_document(&gltf.document, &buffers)
}

fn convert_document(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
) -> Result<ImportedScene, ModelError> {
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(ModelError::NoScene)?;

    // glTF meshes hold several primitives; each primitive becomes one mesh.
    let mut meshes = Vec::new();
    let mut primitives_of = Vec::new();
    for mesh in document.meshes() {
        let name = mesh
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("mesh{}", mesh.index()));
        let mut ids = Vec::new();
        for primitive in mesh.primitives() {
            if let Some(converted) = convert_primitive(&name, &primitive, buffers)? {
                ids.push(meshes.len());
                meshes.push(converted);
            }
        }
        primitives_of.push(ids);
    }

    let materials = document
        .materials()
        .map(|m| convert_material(&m, buffers))
        .collect();

    let roots = scene
        .nodes()
        .map(|n| convert_node(&n, &primitives_of))
        .collect();

    Ok(ImportedScene {
        roots,
        meshes,
        materials,
    })
}

fn convert_node(node: &gltf::Node<'_>, primitives_of: &[Vec<usize>]) -> ImportedNode {
    ImportedNode {
        name: node.name().map(str::to_string),
        meshes: node
            .mesh()
            .and_then(|m| primitives_of.get(m.index()))
            .cloned()
            .unwrap_or_default(),
        children: node
            .children()
            .map(|c| convert_node(&c, primitives_of))
            .collect(),
    }
}

fn is_triangle_mode(mode: gltf::mesh::Mode) -> bool {
    use gltf::mesh::Mode;
    matches!(mode, Mode::Triangles | Mode::TriangleStrip | Mode::TriangleFan)
}

/// Expands an index list of a triangle topology into a triangle list.
///
/// Strips alternate winding so every face keeps the orientation of the first.
/// Points and lines yield no faces.
pub fn triangulate(mode: gltf::mesh::Mode, indices: &[u32]) -> Vec<[u32; 3]> {
    use gltf::mesh::Mode;
    match mode {
        Mode::Triangles => indices.chunks_exact(3).map(|f| [f[0], f[1], f[2]]).collect(),
        Mode::TriangleStrip => indices
            .windows(3)
            .enumerate()
            .map(|(i, w)| if i % 2 == 0 { [w[0], w[1], w[2]] } else { [w[1], w[0], w[2]] })
            .collect(),
        Mode::TriangleFan => match indices.split_first() {
            Some((&hub, rest)) => rest.windows(2).map(|w| [hub, w[0], w[1]]).collect(),
            None => Vec::new(),
        },
        Mode::Points | Mode::Lines | Mode::LineLoop | Mode::LineStrip => Vec::new(),
    }
}

fn convert_primitive(
    mesh: &str,
    primitive: &gltf::Primitive<'_>,
    buffers: &[gltf::buffer::Data],
) -> Result<Option<ImportedMesh>, ModelError> {
    let mode = primitive.mode();
    if !is_triangle_mode(mode) {
        log::warn!("mesh '{mesh}': skipping {mode:?} primitive");
        return Ok(None);
    }

    let reader = primitive.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or_else(|| ModelError::MissingPositions {
            mesh: mesh.to_string(),
        })?
        .collect();
    let normals = reader.read_normals().map(Iterator::collect);
    let tex_coords = reader
        .read_tex_coords(0)
        .map(|t| t.into_f32().collect());

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    if mode == gltf::mesh::Mode::Triangles && indices.len() % 3 != 0 {
        log::warn!(
            "mesh '{mesh}': {} indices is not a multiple of 3; dropping the tail",
            indices.len()
        );
    }
    let faces = triangulate(mode, &indices);

    Ok(Some(ImportedMesh {
        name: mesh.to_string(),
        positions,
        normals,
        tex_coords,
        faces,
        material: primitive.material().index(),
    }))
}

fn convert_material(
    material: &gltf::Material<'_>,
    buffers: &[gltf::buffer::Data],
) -> ImportedMaterial {
    let pbr = material.pbr_metallic_roughness();
    let resolve = |info: Option<gltf::texture::Info<'_>>| {
        info.and_then(|i| texture_ref(&i.texture().source(), buffers))
            .into_iter()
            .collect::<Vec<_>>()
    };

    ImportedMaterial {
        diffuse: resolve(pbr.base_color_texture()),
        // The metallic-roughness map stands in for the specular map.
        specular: resolve(pbr.metallic_roughness_texture()),
    }
}

fn texture_ref(image: &gltf::Image<'_>, buffers: &[gltf::buffer::Data]) -> Option<TextureRef> {
    match image.source() {
        gltf::image::Source::Uri { uri, .. } => {
            if uri.starts_with("data:") {
                log::warn!("image {}: data URIs are not supported", image.index());
                return None;
            }
            Some(TextureRef::File(PathBuf::from(uri.replace("%20", " "))))
        }
        gltf::image::Source::View { view, .. } => {
            let data = buffers.get(view.buffer().index())?;
            let start = view.offset();
            let end = start + view.length();
            let bytes = data.0.get(start..end)?.to_vec();
            Some(TextureRef::Embedded {
                image: image.index(),
                bytes,
            })
        }
    }
}

/// Area-weighted vertex normals. Vertices not touched by any face point up.
pub fn generate_normals(positions: &[[f32; 3]], faces: &[[u32; 3]]) -> Vec<[f32; 3]> {
    let mut acc = vec![Vec3::ZERO; positions.len()];

    for face in faces {
        let [a, b, c] = face.map(|i| i as usize);
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let pa = Vec3::from(positions[a]);
        let n = (Vec3::from(positions[b]) - pa).cross(Vec3::from(positions[c]) - pa);
        acc[a] += n;
        acc[b] += n;
        acc[c] += n;
    }

    acc.into_iter()
        .map(|n| {
            let n = n.normalize_or_zero();
            let n = if n == Vec3::ZERO { Vec3::Y } else { n };
            n.to_array()
        })
        .collect()
}
