use crate::render::transform::WorldTransform;
use crate::render::vertex::SimpleVertex;

use super::Shape;

const VERTICES: [SimpleVertex; 8] = [
    SimpleVertex::new([-1.0, 1.0, -1.0], [0.0, 0.0, 1.0, 1.0]),
    SimpleVertex::new([1.0, 1.0, -1.0], [0.0, 1.0, 0.0, 1.0]),
    SimpleVertex::new([1.0, 1.0, 1.0], [0.0, 1.0, 1.0, 1.0]),
    SimpleVertex::new([-1.0, 1.0, 1.0], [1.0, 0.0, 0.0, 1.0]),
    SimpleVertex::new([-1.0, -1.0, -1.0], [1.0, 0.0, 1.0, 1.0]),
    SimpleVertex::new([1.0, -1.0, -1.0], [1.0, 1.0, 0.0, 1.0]),
    SimpleVertex::new([1.0, -1.0, 1.0], [1.0, 1.0, 1.0, 1.0]),
    SimpleVertex::new([-1.0, -1.0, 1.0], [0.0, 0.0, 0.0, 1.0]),
];

// Clockwise front faces, two triangles per side.
const INDICES: [u16; 36] = [
    3, 1, 0, 2, 1, 3, // top
    0, 5, 4, 1, 5, 0, // front
    3, 4, 7, 0, 4, 3, // left
    1, 6, 5, 2, 6, 1, // right
    2, 7, 6, 3, 7, 2, // back
    6, 4, 5, 7, 4, 6, // bottom
];

/// Vertex-colored cube spanning `[-1, 1]` on every axis.
#[derive(Debug, Clone, Default)]
pub struct Cube {
    /// Spin about the y-axis in radians per second; zero keeps it still.
    spin: f32,
}

impl Cube {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cube that rotates about its y-axis every frame.
    pub fn spinning(radians_per_second: f32) -> Self {
        Self {
            spin: radians_per_second,
        }
    }
}

impl Shape for Cube {
    fn vertices(&self) -> &[SimpleVertex] {
        &VERTICES
    }

    fn indices(&self) -> &[u16] {
        &INDICES
    }

    fn update(&mut self, world: &mut WorldTransform, dt: f32) {
        if self.spin != 0.0 {
            world.rotate_y(self.spin * dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts() {
        let cube = Cube::new();
        assert_eq!(cube.num_vertices(), 8);
        assert_eq!(cube.num_indices(), 36);
    }

    #[test]
    fn every_index_references_a_vertex() {
        assert!(INDICES.iter().all(|&i| (i as usize) < VERTICES.len()));
    }

    #[test]
    fn still_cube_does_not_animate() {
        let mut cube = Cube::new();
        let mut world = WorldTransform::new();
        cube.update(&mut world, 0.5);
        assert_eq!(world, WorldTransform::IDENTITY);
    }

    #[test]
    fn spinning_cube_rotates_by_rate_times_dt() {
        let mut cube = Cube::spinning(2.0);
        let mut world = WorldTransform::new();
        cube.update(&mut world, 0.25);

        let mut expected = WorldTransform::new();
        expected.rotate_y(0.5);
        assert!(world.matrix().abs_diff_eq(*expected.matrix(), 1e-6));
    }
}
