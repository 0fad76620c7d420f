use bytemuck::{Pod, Zeroable};

/// Vertex format shared by every shape: object-space position plus a
/// linear RGBA color.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct SimpleVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl SimpleVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x4  // color
    ];

    /// Byte distance between consecutive vertices.
    pub const STRIDE: u64 = std::mem::size_of::<SimpleVertex>() as u64;

    pub const fn new(position: [f32; 3], color: [f32; 4]) -> Self {
        Self { position, color }
    }

    /// Input layout matching `@location(0)` / `@location(1)` in the vertex stage.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: Self::STRIDE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}
