use glam::{Mat4, Quat, Vec3};

use crate::mesh::{degrees_to_radians, quat_from_euler, quat_to_euler, radians_to_degrees};

/// A perspective camera placed by a world-space position and orientation.
///
/// `rotation` is the camera's orientation in the world (camera-to-world), so the
/// view matrix is the inverse of `translate(position) * rotate(rotation)`. The
/// camera looks down its local -Z axis with +Y up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub rotation: Quat,
    /// Vertical field of view in radians.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            fov: 60f32.to_radians(),
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Camera {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    pub fn with_fov(position: Vec3, rotation: Quat, fov: f32) -> Self {
        Self {
            position,
            rotation,
            fov,
            ..Default::default()
        }
    }

    pub fn with_planes(position: Vec3, rotation: Quat, fov: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            rotation,
            fov,
            near,
            far,
        }
    }

    /// Turns the camera toward `target`, keeping world +Y as up.
    ///
    /// A target equal to the camera position leaves the rotation unchanged.
    pub fn look_at(&mut self, target: Vec3) {
        if (target - self.position).length_squared() < f32::EPSILON {
            return;
        }
        let view = Mat4::look_at_rh(self.position, target, Vec3::Y);
        self.rotation = Quat::from_mat4(&view).conjugate().normalize();
    }

    /// World-to-camera transform.
    pub fn view_matrix(&self) -> Mat4 {
        (Mat4::from_translation(self.position) * Mat4::from_quat(self.rotation)).inverse()
    }

    /// Right-handed perspective projection mapping depth to wgpu's [0, 1] range.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov, aspect, self.near, self.far)
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    pub fn fov_degrees(&self) -> f32 {
        self.fov.to_degrees()
    }

    pub fn set_fov_degrees(&mut self, degrees: f32) {
        self.fov = degrees.to_radians();
    }

    /// Orientation as XYZ Euler angles in degrees.
    pub fn euler_degrees(&self) -> Vec3 {
        radians_to_degrees(quat_to_euler(self.rotation))
    }

    pub fn set_euler_degrees(&mut self, degrees: Vec3) {
        self.rotation = quat_from_euler(degrees_to_radians(degrees));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec3_near(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-4, "{a:?} != {b:?}");
    }

    #[test]
    fn defaults() {
        let camera = Camera::new(Vec3::new(1.0, 2.0, 3.0));
        assert!((camera.fov - std::f32::consts::FRAC_PI_3).abs() < 1e-6);
        assert_eq!(camera.near, 0.1);
        assert_eq!(camera.far, 100.0);
        assert_eq!(camera.rotation, Quat::IDENTITY);
    }

    #[test]
    fn view_moves_world_opposite_to_camera() {
        let camera = Camera::new(Vec3::new(0.0, 0.0, 5.0));
        let p = camera.view_matrix().transform_point3(Vec3::ZERO);
        assert_vec3_near(p, Vec3::new(0.0, 0.0, -5.0));
    }

    #[test]
    fn look_at_puts_target_straight_ahead() {
        let mut camera = Camera::new(Vec3::new(4.0, 3.0, 3.0));
        camera.look_at(Vec3::ZERO);

        let distance = Vec3::new(4.0, 3.0, 3.0).length();
        let p = camera.view_matrix().transform_point3(Vec3::ZERO);
        assert_vec3_near(p, Vec3::new(0.0, 0.0, -distance));
        assert_vec3_near(camera.forward(), -Vec3::new(4.0, 3.0, 3.0).normalize());
    }

    #[test]
    fn look_at_matches_glam_view() {
        let mut camera = Camera::new(Vec3::new(-2.0, 1.0, 6.0));
        camera.look_at(Vec3::new(1.0, 0.5, 0.0));
        let expected = Mat4::look_at_rh(camera.position, Vec3::new(1.0, 0.5, 0.0), Vec3::Y);
        assert!(camera.view_matrix().abs_diff_eq(expected, 1e-4));
    }

    #[test]
    fn look_at_self_is_ignored() {
        let mut camera = Camera::new(Vec3::ONE);
        camera.look_at(Vec3::ONE);
        assert_eq!(camera.rotation, Quat::IDENTITY);
    }

    #[test]
    fn projection_maps_near_and_far_to_unit_depth() {
        let camera = Camera::default();
        let proj = camera.projection_matrix(16.0 / 9.0);
        let near = proj.project_point3(Vec3::new(0.0, 0.0, -camera.near));
        let far = proj.project_point3(Vec3::new(0.0, 0.0, -camera.far));
        assert!(near.z.abs() < 1e-4);
        assert!((far.z - 1.0).abs() < 1e-4);
    }

    #[test]
    fn fov_degrees_round_trip() {
        let mut camera = Camera::default();
        assert!((camera.fov_degrees() - 60.0).abs() < 1e-4);
        camera.set_fov_degrees(90.0);
        assert!((camera.fov - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn euler_round_trip() {
        let mut camera = Camera::default();
        camera.set_euler_degrees(Vec3::new(-20.0, 35.0, 5.0));
        assert_vec3_near(camera.euler_degrees(), Vec3::new(-20.0, 35.0, 5.0));
    }
}
