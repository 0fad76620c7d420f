/// A single acquired swap-chain image plus the encoder recording into it.
///
/// Submit it promptly: holding the surface texture blocks acquisition of the
/// next frame.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
