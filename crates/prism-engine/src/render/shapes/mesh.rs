use crate::render::vertex::SimpleVertex;

use super::Shape;

/// Arbitrary indexed triangle list owned on the CPU side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    vertices: Vec<SimpleVertex>,
    indices: Vec<u16>,
}

impl Mesh {
    pub fn new(vertices: Vec<SimpleVertex>, indices: Vec<u16>) -> Self {
        Self { vertices, indices }
    }

    /// Single triangle, handy for smoke tests and placeholders.
    pub fn triangle(color: [f32; 4]) -> Self {
        Self::new(
            vec![
                SimpleVertex::new([0.0, 1.0, 0.0], color),
                SimpleVertex::new([1.0, -1.0, 0.0], color),
                SimpleVertex::new([-1.0, -1.0, 0.0], color),
            ],
            vec![0, 1, 2],
        )
    }
}

impl Shape for Mesh {
    fn vertices(&self) -> &[SimpleVertex] {
        &self.vertices
    }

    fn indices(&self) -> &[u16] {
        &self.indices
    }
}
