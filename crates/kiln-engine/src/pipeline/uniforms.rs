use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::camera::Camera;

/// Per-frame constants shared by every stage of the geometry pass.
///
/// Matrices are column-major, matching WGSL `mat4x4<f32>`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view: [[f32; 4]; 4],
    pub view_inv: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub proj_inv: [[f32; 4]; 4],
    /// World-space camera position, `w = 1`.
    pub camera_position: [f32; 4],
}

impl FrameUniforms {
    pub const SIZE: u64 = std::mem::size_of::<FrameUniforms>() as u64;

    pub fn from_matrices(view: Mat4, proj: Mat4, camera_position: glam::Vec3) -> Self {
        Self {
            view: view.to_cols_array_2d(),
            view_inv: view.inverse().to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            proj_inv: proj.inverse().to_cols_array_2d(),
            camera_position: camera_position.extend(1.0).to_array(),
        }
    }

    pub fn from_camera(camera: &Camera) -> Self {
        Self::from_matrices(camera.view_matrix(), camera.projection_matrix(), camera.position())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn layout_is_four_matrices_and_a_vec4() {
        assert_eq!(FrameUniforms::SIZE, 4 * 64 + 16);
        // Uniform buffers need 16-byte multiples.
        assert_eq!(FrameUniforms::SIZE % 16, 0);
    }

    #[test]
    fn inverses_undo_their_matrices() {
        let camera = Camera::new(1280, 720).with_position(Vec3::new(1.0, 2.0, 3.0));
        let u = FrameUniforms::from_camera(&camera);

        let view = Mat4::from_cols_array_2d(&u.view) * Mat4::from_cols_array_2d(&u.view_inv);
        let proj = Mat4::from_cols_array_2d(&u.proj) * Mat4::from_cols_array_2d(&u.proj_inv);
        assert!(view.abs_diff_eq(Mat4::IDENTITY, 1e-4));
        assert!(proj.abs_diff_eq(Mat4::IDENTITY, 1e-4));
        assert_eq!(u.camera_position, [1.0, 2.0, 3.0, 1.0]);
    }
}
