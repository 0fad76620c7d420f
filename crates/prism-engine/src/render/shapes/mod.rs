//! Geometry providers for renderables.
//!
//! A `Shape` hands out vertex and 16-bit index data; the renderable copies it
//! into GPU buffers once at initialization.

mod cube;
mod mesh;

pub use cube::Cube;
pub use mesh::Mesh;

use super::transform::WorldTransform;
use super::vertex::SimpleVertex;

/// Geometry capability of a renderable.
pub trait Shape {
    fn vertices(&self) -> &[SimpleVertex];

    fn indices(&self) -> &[u16];

    /// Number of vertices uploaded. Defaults to the whole vertex slice.
    fn num_vertices(&self) -> u32 {
        self.vertices().len() as u32
    }

    /// Number of indices uploaded and drawn. Defaults to the whole index slice.
    fn num_indices(&self) -> u32 {
        self.indices().len() as u32
    }

    /// Per-frame animation hook, called from `Renderable::update`.
    fn update(&mut self, world: &mut WorldTransform, dt: f32) {
        let _ = (world, dt);
    }
}
