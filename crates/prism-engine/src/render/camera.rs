use glam::{Mat4, Vec3};

/// Left-handed perspective camera.
///
/// Produces the view and projection matrices written into every
/// renderable's constant buffer. Depth maps to `[0, 1]`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub at: Vec3,
    pub up: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_lh(self.eye, self.at, self.up)
    }

    /// Projection for a drawable of `width` x `height` pixels.
    ///
    /// Zero dimensions (minimized window) are treated as one pixel.
    pub fn projection(&self, width: u32, height: u32) -> Mat4 {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        Mat4::perspective_lh(self.fov_y, aspect, self.near, self.far)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 1.0, -5.0),
            at: Vec3::new(0.0, 1.0, 0.0),
            up: Vec3::Y,
            fov_y: std::f32::consts::FRAC_PI_2,
            near: 0.01,
            far: 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_moves_eye_to_origin_looking_down_plus_z() {
        let cam = Camera::default();
        let view = cam.view();

        assert!(view.transform_point3(cam.eye).abs_diff_eq(Vec3::ZERO, 1e-5));

        let target = view.transform_point3(cam.at);
        assert!(target.abs_diff_eq(Vec3::new(0.0, 0.0, 5.0), 1e-5));
    }

    #[test]
    fn projection_maps_near_and_far_to_unit_depth_range() {
        let cam = Camera::default();
        let proj = cam.projection(800, 600);

        let near = proj.project_point3(Vec3::new(0.0, 0.0, cam.near));
        let far = proj.project_point3(Vec3::new(0.0, 0.0, cam.far));

        assert!((near.z - 0.0).abs() < 1e-4);
        assert!((far.z - 1.0).abs() < 1e-4);
    }

    #[test]
    fn zero_sized_drawable_does_not_produce_nan() {
        let proj = Camera::default().projection(0, 0);
        assert!(!proj.is_nan());
    }
}
