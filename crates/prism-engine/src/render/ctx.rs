/// Device-side handles a renderable or renderer needs while creating GPU
/// resources.
pub struct RenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub surface_format: wgpu::TextureFormat,
    /// Layout of the per-object constant buffer bind group.
    pub object_layout: &'a wgpu::BindGroupLayout,
}

impl<'a> RenderCtx<'a> {
    #[inline]
    pub fn new(
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        object_layout: &'a wgpu::BindGroupLayout,
    ) -> Self {
        Self {
            device,
            queue,
            surface_format,
            object_layout,
        }
    }
}
