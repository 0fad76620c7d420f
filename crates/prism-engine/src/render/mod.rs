//! Scene rendering.
//!
//! A [`Renderable`] owns GPU geometry and a world transform; the
//! [`Renderer`] owns the named renderables and shaders, builds pipelines on
//! demand and submits one frame per `render` call.
//!
//! Conventions:
//! - left-handed world space, clockwise front faces
//! - matrices are glam column-major; composed transforms apply in call order

mod camera;
mod constants;
mod ctx;
mod depth;
mod pipeline;
mod renderable;
mod renderer;
mod shader;
mod transform;
mod vertex;

pub mod shapes;

#[cfg(test)]
mod test_gpu;

pub use camera::Camera;
pub use constants::ConstantBuffer;
pub use ctx::RenderCtx;
pub use renderable::{Renderable, RenderableError};
pub use renderer::{Renderer, SceneError};
pub use shader::{PixelShader, VertexShader};
pub use transform::WorldTransform;
pub use vertex::SimpleVertex;
