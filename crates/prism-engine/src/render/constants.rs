//! Per-object constant buffer.

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Uniform block consumed by the vertex stage at `@group(0) @binding(0)`.
///
/// Matrices are column-major, matching both glam and WGSL `mat4x4<f32>`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ConstantBuffer {
    pub world: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

impl ConstantBuffer {
    pub const SIZE: u64 = std::mem::size_of::<ConstantBuffer>() as u64;

    pub fn new(world: &Mat4, view: &Mat4, projection: &Mat4) -> Self {
        Self {
            world: world.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
        }
    }

    pub fn min_binding_size() -> NonZeroU64 {
        NonZeroU64::new(Self::SIZE).expect("ConstantBuffer has non-zero size by construction")
    }

    /// Layout every renderable's bind group is created against.
    pub fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("prism object bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: Some(Self::min_binding_size()),
                },
                count: None,
            }],
        })
    }
}
