//! Free-fly perspective camera driven by held input actions.

use glam::{Mat4, Vec3};

use crate::input::InputAction;

/// Pitch limit, short of straight up/down where the look-at basis flips.
pub const PITCH_LIMIT: f32 = 88.0 * std::f32::consts::PI / 180.0;

const BOOST_MULTIPLIER: f32 = 2.0;

/// Opposing held keys per axis. Each direction is tracked on its own so
/// releasing one key leaves the other one's input in place.
#[derive(Debug, Copy, Clone, Default)]
struct HeldAxes {
    positive: Vec3,
    negative: Vec3,
}

impl HeldAxes {
    fn set(&mut self, axis: Vec3, positive: bool, pressed: bool) {
        let side = if positive {
            &mut self.positive
        } else {
            &mut self.negative
        };
        *side = if pressed { side.max(axis) } else { *side * (Vec3::ONE - axis) };
    }

    fn value(&self) -> Vec3 {
        self.positive - self.negative
    }
}

/// Perspective camera.
///
/// `rotation` holds pitch (x), yaw (y) and roll (z) in radians. `pan` and
/// `tilt` are the per-tick inputs set by [`Camera::handle_action`] and
/// integrated by [`Camera::update`].
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    rotation: Vec3,
    forward: Vec3,
    up: Vec3,

    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,

    pan: HeldAxes,
    tilt: HeldAxes,
    boost: bool,
    move_speed: f32,
    rotation_speed: f32,

    view: Mat4,
    projection: Mat4,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            forward: Vec3::Z,
            up: Vec3::Y,
            fov_y: 60f32.to_radians(),
            aspect: 1.0,
            near: 0.1,
            far: 10_000.0,
            pan: HeldAxes::default(),
            tilt: HeldAxes::default(),
            boost: false,
            move_speed: 1.0,
            rotation_speed: 0.002,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        };
        camera.set_aspect(width, height);
        camera.view = Mat4::look_at_rh(camera.position, camera.position + camera.forward, camera.up);
        camera
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self.rebuild_view();
        self
    }

    pub fn with_speeds(mut self, move_speed: f32, rotation_speed: f32) -> Self {
        self.move_speed = move_speed;
        self.rotation_speed = rotation_speed;
        self
    }

    /// Rebuilds the projection for a new back buffer size.
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
        self.projection = Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far);
    }

    /// Applies a held action. Returns whether the camera consumed it.
    pub fn handle_action(&mut self, action: InputAction, pressed: bool) -> bool {
        match action {
            InputAction::MoveForward => self.pan.set(Vec3::Z, true, pressed),
            InputAction::MoveBackward => self.pan.set(Vec3::Z, false, pressed),
            InputAction::StrafeLeft => self.pan.set(Vec3::X, true, pressed),
            InputAction::StrafeRight => self.pan.set(Vec3::X, false, pressed),
            InputAction::MoveUp => self.pan.set(Vec3::Y, true, pressed),
            InputAction::MoveDown => self.pan.set(Vec3::Y, false, pressed),
            InputAction::TiltUp => self.tilt.set(Vec3::X, true, pressed),
            InputAction::TiltDown => self.tilt.set(Vec3::X, false, pressed),
            InputAction::TurnLeft => self.tilt.set(Vec3::Y, true, pressed),
            InputAction::TurnRight => self.tilt.set(Vec3::Y, false, pressed),
            InputAction::Boost => self.boost = pressed,
            _ => return false,
        }
        true
    }

    /// Integrates one tick of input: tilt, pitch clamp, pan in the rotated
    /// basis, then the look-at view.
    pub fn update(&mut self) {
        self.rotation += self.tilt.value() * self.rotation_speed;
        self.rotation.x = self.rotation.x.clamp(-PITCH_LIMIT, PITCH_LIMIT);

        let basis = self.basis();
        let multiplier = if self.boost { BOOST_MULTIPLIER } else { 1.0 };
        self.position += basis.transform_vector3(self.pan.value()) * multiplier * self.move_speed;

        self.rebuild_view();
    }

    /// `Rz * Ry * Rx` from the current orientation.
    fn basis(&self) -> Mat4 {
        Mat4::from_rotation_z(self.rotation.z)
            * Mat4::from_rotation_y(self.rotation.y)
            * Mat4::from_rotation_x(self.rotation.x)
    }

    fn rebuild_view(&mut self) {
        let basis = self.basis();
        let forward = basis.transform_vector3(self.forward);
        let up = basis.transform_vector3(self.up);
        self.view = Mat4::look_at_rh(self.position, self.position + forward, up);
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn pitch(&self) -> f32 {
        self.rotation.x
    }

    pub fn is_boosting(&self) -> bool {
        self.boost
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    // ── orientation ──

    #[test]
    fn pitch_never_exceeds_limit() {
        let mut cam = Camera::new(1280, 720).with_speeds(1.0, 0.05);
        cam.handle_action(InputAction::TiltUp, true);
        for _ in 0..10_000 {
            cam.update();
            assert!(cam.pitch() <= PITCH_LIMIT);
        }
        assert_eq!(cam.pitch(), PITCH_LIMIT);
    }

    #[test]
    fn pitch_clamps_downward_too() {
        let mut cam = Camera::new(1280, 720).with_speeds(1.0, 0.05);
        cam.handle_action(InputAction::TiltDown, true);
        for _ in 0..10_000 {
            cam.update();
        }
        assert_eq!(cam.pitch(), -PITCH_LIMIT);
    }

    #[test]
    fn yaw_is_not_clamped() {
        let mut cam = Camera::new(1280, 720).with_speeds(1.0, 0.1);
        cam.handle_action(InputAction::TurnLeft, true);
        for _ in 0..100 {
            cam.update();
        }
        assert!(cam.rotation().y > std::f32::consts::TAU);
    }

    // ── movement ──

    #[test]
    fn zero_input_leaves_position_unchanged() {
        let start = Vec3::new(3.0, -2.0, 7.5);
        let mut cam = Camera::new(1280, 720).with_position(start);
        cam.update();
        assert_eq!(cam.position(), start);
    }

    #[test]
    fn forward_pan_follows_default_forward() {
        let mut cam = Camera::new(1280, 720);
        cam.handle_action(InputAction::MoveForward, true);
        cam.update();
        assert!(approx(cam.position(), Vec3::Z));
    }

    #[test]
    fn boost_doubles_translation() {
        let mut cam = Camera::new(1280, 720);
        cam.handle_action(InputAction::MoveUp, true);
        cam.handle_action(InputAction::Boost, true);
        cam.update();
        assert!(approx(cam.position(), Vec3::new(0.0, 2.0, 0.0)));
    }

    #[test]
    fn release_stops_movement() {
        let mut cam = Camera::new(1280, 720);
        cam.handle_action(InputAction::StrafeLeft, true);
        cam.update();
        let after_one = cam.position();
        cam.handle_action(InputAction::StrafeLeft, false);
        cam.update();
        assert_eq!(cam.position(), after_one);
    }

    #[test]
    fn releasing_opposite_key_keeps_held_direction() {
        let mut cam = Camera::new(1280, 720);
        cam.handle_action(InputAction::MoveForward, true);
        cam.handle_action(InputAction::MoveBackward, true);
        cam.update();
        assert_eq!(cam.position(), Vec3::ZERO);

        cam.handle_action(InputAction::MoveBackward, false);
        cam.update();
        assert!(approx(cam.position(), Vec3::Z));
    }

    #[test]
    fn repeated_press_does_not_accelerate() {
        let mut cam = Camera::new(1280, 720);
        cam.handle_action(InputAction::StrafeRight, true);
        cam.handle_action(InputAction::StrafeRight, true);
        cam.update();
        assert!(approx(cam.position(), -Vec3::X));
    }

    #[test]
    fn pan_is_rotated_by_yaw() {
        let mut cam = Camera::new(1280, 720).with_speeds(1.0, std::f32::consts::FRAC_PI_2);
        cam.handle_action(InputAction::TurnLeft, true);
        cam.update();
        cam.handle_action(InputAction::TurnLeft, false);
        cam.handle_action(InputAction::MoveForward, true);
        cam.update();
        // Quarter turn about +Y maps +Z onto +X.
        assert!(approx(cam.position(), Vec3::X));
    }

    // ── actions ──

    #[test]
    fn display_actions_are_not_consumed() {
        let mut cam = Camera::new(1280, 720);
        assert!(!cam.handle_action(InputAction::ToggleFullscreen, true));
        assert!(!cam.handle_action(InputAction::Quit, true));
        assert!(cam.handle_action(InputAction::Boost, true));
        assert!(cam.is_boosting());
    }

    #[test]
    fn aspect_tracks_resolution() {
        let mut cam = Camera::new(1280, 720);
        cam.set_aspect(1920, 1080);
        assert!((cam.aspect() - 16.0 / 9.0).abs() < 1e-6);
        cam.set_aspect(0, 0);
        assert_eq!(cam.aspect(), 1.0);
    }
}
