use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;

use crate::device::{Gpu, SurfaceErrorAction};
use crate::game::AppControl;

use super::camera::Camera;
use super::constants::ConstantBuffer;
use super::ctx::RenderCtx;
use super::depth::DepthTarget;
use super::pipeline::{pipeline_key, PipelineCache, PipelineKey};
use super::renderable::Renderable;
use super::shader::{PixelShader, VertexShader};

/// Scene registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    DuplicateRenderable(String),
    DuplicateVertexShader(String),
    DuplicatePixelShader(String),
    UnknownRenderable(String),
    UnknownVertexShader(String),
    UnknownPixelShader(String),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateRenderable(n) => write!(f, "renderable `{n}` already exists"),
            Self::DuplicateVertexShader(n) => write!(f, "vertex shader `{n}` already exists"),
            Self::DuplicatePixelShader(n) => write!(f, "pixel shader `{n}` already exists"),
            Self::UnknownRenderable(n) => write!(f, "no renderable named `{n}`"),
            Self::UnknownVertexShader(n) => write!(f, "no vertex shader named `{n}`"),
            Self::UnknownPixelShader(n) => write!(f, "no pixel shader named `{n}`"),
        }
    }
}

impl std::error::Error for SceneError {}

/// GPU objects that only exist after `Renderer::initialize`.
struct GpuState {
    object_layout: wgpu::BindGroupLayout,
    depth: DepthTarget,
    pipelines: PipelineCache,
}

/// Owns the scene and turns it into one frame per `render` call.
///
/// Renderables and shaders are registered by name before the window exists;
/// `initialize` then creates every GPU resource against the window's device.
pub struct Renderer {
    renderables: HashMap<String, Renderable>,
    vertex_shaders: HashMap<String, Rc<VertexShader>>,
    pixel_shaders: HashMap<String, Rc<PixelShader>>,

    camera: Camera,
    clear_color: wgpu::Color,

    gpu: Option<GpuState>,

    /// Renderables already reported as not drawable.
    warned_skipped: HashSet<String>,
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            renderables: HashMap::new(),
            vertex_shaders: HashMap::new(),
            pixel_shaders: HashMap::new(),
            camera: Camera::default(),
            clear_color: wgpu::Color {
                r: 0.0,
                g: 0.125,
                b: 0.6,
                a: 1.0,
            },
            gpu: None,
            warned_skipped: HashSet::new(),
        }
    }

    // ── registration ─────────────────────────────────────────────────────

    pub fn add_renderable(
        &mut self,
        name: impl Into<String>,
        renderable: Renderable,
    ) -> Result<(), SceneError> {
        match self.renderables.entry(name.into()) {
            Entry::Occupied(e) => Err(SceneError::DuplicateRenderable(e.key().clone())),
            Entry::Vacant(e) => {
                e.insert(renderable);
                Ok(())
            }
        }
    }

    pub fn add_vertex_shader(
        &mut self,
        name: impl Into<String>,
        shader: Rc<VertexShader>,
    ) -> Result<(), SceneError> {
        match self.vertex_shaders.entry(name.into()) {
            Entry::Occupied(e) => Err(SceneError::DuplicateVertexShader(e.key().clone())),
            Entry::Vacant(e) => {
                e.insert(shader);
                Ok(())
            }
        }
    }

    pub fn add_pixel_shader(
        &mut self,
        name: impl Into<String>,
        shader: Rc<PixelShader>,
    ) -> Result<(), SceneError> {
        match self.pixel_shaders.entry(name.into()) {
            Entry::Occupied(e) => Err(SceneError::DuplicatePixelShader(e.key().clone())),
            Entry::Vacant(e) => {
                e.insert(shader);
                Ok(())
            }
        }
    }

    pub fn set_vertex_shader_of_renderable(
        &mut self,
        renderable: &str,
        vertex_shader: &str,
    ) -> Result<(), SceneError> {
        let shader = self
            .vertex_shaders
            .get(vertex_shader)
            .ok_or_else(|| SceneError::UnknownVertexShader(vertex_shader.to_string()))?;
        let target = self
            .renderables
            .get_mut(renderable)
            .ok_or_else(|| SceneError::UnknownRenderable(renderable.to_string()))?;

        target.set_vertex_shader(Rc::clone(shader));
        Ok(())
    }

    pub fn set_pixel_shader_of_renderable(
        &mut self,
        renderable: &str,
        pixel_shader: &str,
    ) -> Result<(), SceneError> {
        let shader = self
            .pixel_shaders
            .get(pixel_shader)
            .ok_or_else(|| SceneError::UnknownPixelShader(pixel_shader.to_string()))?;
        let target = self
            .renderables
            .get_mut(renderable)
            .ok_or_else(|| SceneError::UnknownRenderable(renderable.to_string()))?;

        target.set_pixel_shader(Rc::clone(shader));
        Ok(())
    }

    pub fn renderable(&self, name: &str) -> Option<&Renderable> {
        self.renderables.get(name)
    }

    pub fn renderable_mut(&mut self, name: &str) -> Option<&mut Renderable> {
        self.renderables.get_mut(name)
    }

    pub fn renderable_count(&self) -> usize {
        self.renderables.len()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn set_clear_color(&mut self, color: wgpu::Color) {
        self.clear_color = color;
    }

    pub fn is_initialized(&self) -> bool {
        self.gpu.is_some()
    }

    /// Bind group layout for per-object constants, once initialized.
    ///
    /// Renderables registered after `initialize` use it to create their own
    /// GPU resources.
    pub fn object_layout(&self) -> Option<&wgpu::BindGroupLayout> {
        self.gpu.as_ref().map(|state| &state.object_layout)
    }

    // ── lifecycle ────────────────────────────────────────────────────────

    /// Compiles every registered shader and creates every renderable's GPU
    /// resources. Stops at the first failing renderable.
    pub fn initialize(&mut self, gpu: &Gpu<'_>) -> Result<()> {
        let device = gpu.device();
        let surface_format = gpu.surface_format();

        for (name, shader) in &self.vertex_shaders {
            shader
                .initialize(device)
                .with_context(|| format!("failed to compile vertex shader `{name}`"))?;
        }
        for (name, shader) in &self.pixel_shaders {
            shader
                .initialize(device)
                .with_context(|| format!("failed to compile pixel shader `{name}`"))?;
        }

        let object_layout = ConstantBuffer::bind_group_layout(device);
        let ctx = RenderCtx::new(device, gpu.queue(), surface_format, &object_layout);

        for (name, renderable) in self.renderables.iter_mut() {
            renderable
                .initialize(&ctx)
                .with_context(|| format!("failed to initialize renderable `{name}`"))?;
        }

        let pipelines = PipelineCache::new(device, &object_layout, surface_format);

        let size = gpu.size();
        let depth = DepthTarget::new(device, size.width, size.height);

        self.gpu = Some(GpuState {
            object_layout,
            depth,
            pipelines,
        });

        log::info!(
            "renderer initialized: {} renderables, {} vertex shaders, {} pixel shaders",
            self.renderables.len(),
            self.vertex_shaders.len(),
            self.pixel_shaders.len(),
        );

        Ok(())
    }

    /// Resizes the depth target to follow the swap chain.
    pub fn resize(&mut self, gpu: &Gpu<'_>, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        if let Some(state) = self.gpu.as_mut() {
            if !state.depth.matches(new_size.width, new_size.height) {
                state.depth = DepthTarget::new(gpu.device(), new_size.width, new_size.height);
            }
        }
    }

    /// Advances every renderable's animation by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        for renderable in self.renderables.values_mut() {
            renderable.update(dt);
        }
    }

    /// Clears the frame and draws every renderable that has both shaders.
    pub fn render(&mut self, gpu: &mut Gpu<'_>) -> AppControl {
        let Some(state) = self.gpu.as_mut() else {
            log::warn!("render called before the renderer was initialized");
            return AppControl::Continue;
        };

        let size = gpu.size();
        if size.width == 0 || size.height == 0 {
            return AppControl::Continue;
        }

        let mut frame = match gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                log::debug!("surface error: {err:?}");
                let action = gpu.handle_surface_error(err);
                if action == SurfaceErrorAction::Fatal {
                    log::error!("surface is out of memory; stopping");
                    return AppControl::Exit(1);
                }
                return AppControl::Continue;
            }
        };

        let view = self.camera.view();
        let projection = self.camera.projection(size.width, size.height);

        // Uploads and pipeline creation need `&mut`; do them before the pass
        // borrows everything immutably.
        let mut draws: Vec<(&Renderable, PipelineKey)> = Vec::with_capacity(self.renderables.len());

        for (name, renderable) in &self.renderables {
            let (Some(vs), Some(ps), Some(cbo)) = (
                renderable.vertex_shader(),
                renderable.pixel_shader(),
                renderable.constant_buffer(),
            ) else {
                if self.warned_skipped.insert(name.clone()) {
                    log::debug!("renderable `{name}` skipped: missing shader or not initialized");
                }
                continue;
            };

            let constants = ConstantBuffer::new(renderable.world_matrix(), &view, &projection);
            gpu.queue().write_buffer(cbo, 0, bytemuck::bytes_of(&constants));

            if let Err(err) = state.pipelines.get_or_create(gpu.device(), vs, ps) {
                if self.warned_skipped.insert(name.clone()) {
                    log::error!("renderable `{name}` skipped: {err:#}");
                }
                continue;
            }

            let key = pipeline_key(vs, ps);
            draws.push((renderable, key));
        }

        {
            let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("prism scene pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: state.depth.view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            for (renderable, key) in &draws {
                let Some(pipeline) = state.pipelines.get(key) else { continue };
                rpass.set_pipeline(pipeline);
                renderable.draw(&mut rpass);
            }
        }

        gpu.submit(frame);

        AppControl::Continue
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
