use glam::{Mat4, Vec3};

/// World transform of a renderable.
///
/// The matrix starts as identity and only changes by composing rotation,
/// scale and translation primitives onto it, so it is always affine.
///
/// Composition order: every new primitive is applied *after* the ones
/// already composed. In row-vector notation that is `world = world * m`; with
/// glam's column vectors it is `world = m * world`. So `rotate_x` followed by
/// `translate` rotates the object about its own origin and then moves it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WorldTransform {
    matrix: Mat4,
}

impl WorldTransform {
    pub const IDENTITY: Self = Self {
        matrix: Mat4::IDENTITY,
    };

    pub fn new() -> Self {
        Self::IDENTITY
    }

    #[inline]
    pub fn matrix(&self) -> &Mat4 {
        &self.matrix
    }

    /// Back to identity.
    pub fn reset(&mut self) {
        self.matrix = Mat4::IDENTITY;
    }

    /// Rotates around the x-axis; `angle` in radians.
    pub fn rotate_x(&mut self, angle: f32) {
        self.compose(Mat4::from_rotation_x(angle));
    }

    /// Rotates around the y-axis; `angle` in radians.
    pub fn rotate_y(&mut self, angle: f32) {
        self.compose(Mat4::from_rotation_y(angle));
    }

    /// Rotates around the z-axis; `angle` in radians.
    pub fn rotate_z(&mut self, angle: f32) {
        self.compose(Mat4::from_rotation_z(angle));
    }

    /// Euler rotation: roll about z first, then pitch about x, then yaw about y.
    pub fn rotate_roll_pitch_yaw(&mut self, pitch: f32, yaw: f32, roll: f32) {
        self.compose(
            Mat4::from_rotation_y(yaw) * Mat4::from_rotation_x(pitch) * Mat4::from_rotation_z(roll),
        );
    }

    /// Non-uniform scale along the three axes.
    pub fn scale(&mut self, scale_x: f32, scale_y: f32, scale_z: f32) {
        self.compose(Mat4::from_scale(Vec3::new(scale_x, scale_y, scale_z)));
    }

    pub fn translate(&mut self, offset: Vec3) {
        self.compose(Mat4::from_translation(offset));
    }

    #[inline]
    fn compose(&mut self, m: Mat4) {
        self.matrix = m * self.matrix;
    }
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
