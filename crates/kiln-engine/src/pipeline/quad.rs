use crate::scene::{Mesh, Vertex};

const NORMAL: [f32; 3] = [0.0, 0.0, -1.0];

/// Two triangles covering clip space, UV origin at the top-left corner.
pub fn quad_vertices() -> Vec<Vertex> {
    vec![
        Vertex::new([1.0, -1.0, 0.0], NORMAL, [1.0, 1.0]),
        Vertex::new([-1.0, -1.0, 0.0], NORMAL, [0.0, 1.0]),
        Vertex::new([-1.0, 1.0, 0.0], NORMAL, [0.0, 0.0]),
        Vertex::new([1.0, 1.0, 0.0], NORMAL, [1.0, 0.0]),
        Vertex::new([1.0, -1.0, 0.0], NORMAL, [1.0, 1.0]),
        Vertex::new([-1.0, 1.0, 0.0], NORMAL, [0.0, 0.0]),
    ]
}

/// The fullscreen quad mesh used by the post-effect and composite passes.
pub fn fullscreen_quad() -> Mesh {
    Mesh::with_geometry("kiln fullscreen quad", quad_vertices(), (0..6).collect(), Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_has_six_vertices_and_indices() {
        let quad = fullscreen_quad();
        assert_eq!(quad.vertices().len(), 6);
        assert_eq!(quad.indices(), &[0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn uvs_map_clip_corners() {
        for v in quad_vertices() {
            let [x, y, _] = v.position;
            assert_eq!(v.tex_coord, [(x + 1.0) / 2.0, (1.0 - y) / 2.0]);
        }
    }
}
