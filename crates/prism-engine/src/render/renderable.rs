use std::fmt;
use std::rc::Rc;

use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use super::constants::ConstantBuffer;
use super::ctx::RenderCtx;
use super::shader::{PixelShader, VertexShader};
use super::shapes::Shape;
use super::transform::WorldTransform;
use super::vertex::SimpleVertex;

const INDEX_SIZE: u64 = std::mem::size_of::<u16>() as u64;

/// Why a renderable could not create its GPU buffers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderableError {
    /// The shape reports zero vertices or zero indices.
    EmptyGeometry { what: &'static str },
    /// The shape reports more elements than its slice holds.
    CountMismatch {
        what: &'static str,
        declared: u32,
        available: usize,
    },
    /// 16-bit indices cannot address this many vertices.
    TooManyVertices(u32),
    IndexOutOfRange { index: u16, num_vertices: u32 },
    /// The buffer exceeds the device's `max_buffer_size`.
    BufferTooLarge { what: &'static str, size: u64, max: u64 },
}

impl fmt::Display for RenderableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGeometry { what } => write!(f, "shape has no {what} data"),
            Self::CountMismatch {
                what,
                declared,
                available,
            } => write!(
                f,
                "shape declares {declared} {what} elements but provides {available}"
            ),
            Self::TooManyVertices(n) => {
                write!(f, "{n} vertices cannot be addressed by 16-bit indices")
            }
            Self::IndexOutOfRange {
                index,
                num_vertices,
            } => write!(f, "index {index} out of range for {num_vertices} vertices"),
            Self::BufferTooLarge { what, size, max } => {
                write!(f, "{what} buffer of {size} bytes exceeds device limit of {max}")
            }
        }
    }
}

impl std::error::Error for RenderableError {}

/// A drawable scene object.
///
/// Owns its vertex, index and constant buffers exclusively (they are
/// released when replaced or when the renderable is dropped), shares its
/// shaders with other renderables, and carries a world transform.
///
/// A fresh renderable holds no GPU resources; [`Renderable::initialize`]
/// must succeed before it can be drawn.
pub struct Renderable {
    shape: Box<dyn Shape>,

    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    constant_buffer: Option<wgpu::Buffer>,
    bind_group: Option<wgpu::BindGroup>,

    /// Element counts uploaded by the last successful `initialize`; the
    /// bound ranges derive from these, not from the live shape.
    num_vertices: u32,
    num_indices: u32,

    vertex_shader: Option<Rc<VertexShader>>,
    pixel_shader: Option<Rc<PixelShader>>,

    world: WorldTransform,
}

impl Renderable {
    pub fn new(shape: impl Shape + 'static) -> Self {
        Self::from_boxed(Box::new(shape))
    }

    pub fn from_boxed(shape: Box<dyn Shape>) -> Self {
        Self {
            shape,
            vertex_buffer: None,
            index_buffer: None,
            constant_buffer: None,
            bind_group: None,
            num_vertices: 0,
            num_indices: 0,
            vertex_shader: None,
            pixel_shader: None,
            world: WorldTransform::IDENTITY,
        }
    }

    /// Creates the vertex, index and constant buffers and resets the world
    /// matrix to identity.
    ///
    /// Calling it again replaces every buffer; the previous ones are dropped.
    /// On error nothing is replaced.
    pub fn initialize(&mut self, ctx: &RenderCtx<'_>) -> Result<(), RenderableError> {
        validate_geometry(self.shape.as_ref(), ctx.device.limits().max_buffer_size)?;

        let num_vertices = self.shape.num_vertices();
        let num_indices = self.shape.num_indices();
        let vertices = &self.shape.vertices()[..num_vertices as usize];
        let indices = &self.shape.indices()[..num_indices as usize];

        let vertex_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("prism renderable vbo"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("prism renderable ibo"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        let constant_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("prism renderable cbo"),
            size: ConstantBuffer::SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("prism renderable bind group"),
            layout: ctx.object_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: constant_buffer.as_entire_binding(),
            }],
        });

        self.world.reset();

        let initial = ConstantBuffer::new(self.world.matrix(), &Mat4::IDENTITY, &Mat4::IDENTITY);
        ctx.queue
            .write_buffer(&constant_buffer, 0, bytemuck::bytes_of(&initial));

        self.vertex_buffer = Some(vertex_buffer);
        self.index_buffer = Some(index_buffer);
        self.constant_buffer = Some(constant_buffer);
        self.bind_group = Some(bind_group);
        self.num_vertices = num_vertices;
        self.num_indices = num_indices;

        Ok(())
    }

    /// True once `initialize` has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.vertex_buffer.is_some()
            && self.index_buffer.is_some()
            && self.constant_buffer.is_some()
            && self.bind_group.is_some()
    }

    /// Runs the shape's per-frame animation against the world transform.
    pub fn update(&mut self, dt: f32) {
        self.shape.update(&mut self.world, dt);
    }

    /// Binds buffers and issues one indexed draw. The caller has already set
    /// a pipeline built from this renderable's shaders.
    ///
    /// Returns `false` (and draws nothing) when not initialized.
    pub fn draw(&self, rpass: &mut wgpu::RenderPass<'_>) -> bool {
        let (Some(vbo), Some(ibo), Some(bind_group)) = (
            self.vertex_buffer.as_ref(),
            self.index_buffer.as_ref(),
            self.bind_group.as_ref(),
        ) else {
            return false;
        };

        rpass.set_bind_group(0, bind_group, &[]);
        rpass.set_vertex_buffer(0, vbo.slice(..self.vertex_buffer_size()));
        rpass.set_index_buffer(
            ibo.slice(..self.index_buffer_size()),
            wgpu::IndexFormat::Uint16,
        );
        rpass.draw_indexed(0..self.num_indices(), 0, 0..1);
        true
    }

    // ── shaders ──────────────────────────────────────────────────────────

    pub fn set_vertex_shader(&mut self, vertex_shader: Rc<VertexShader>) {
        self.vertex_shader = Some(vertex_shader);
    }

    pub fn set_pixel_shader(&mut self, pixel_shader: Rc<PixelShader>) {
        self.pixel_shader = Some(pixel_shader);
    }

    pub fn vertex_shader(&self) -> Option<&Rc<VertexShader>> {
        self.vertex_shader.as_ref()
    }

    pub fn pixel_shader(&self) -> Option<&Rc<PixelShader>> {
        self.pixel_shader.as_ref()
    }

    /// Input layout of the bound vertex shader.
    pub fn vertex_layout(&self) -> Option<&wgpu::VertexBufferLayout<'static>> {
        self.vertex_shader.as_deref().map(VertexShader::layout)
    }

    // ── buffers ──────────────────────────────────────────────────────────

    pub fn vertex_buffer(&self) -> Option<&wgpu::Buffer> {
        self.vertex_buffer.as_ref()
    }

    pub fn index_buffer(&self) -> Option<&wgpu::Buffer> {
        self.index_buffer.as_ref()
    }

    pub fn constant_buffer(&self) -> Option<&wgpu::Buffer> {
        self.constant_buffer.as_ref()
    }

    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.bind_group.as_ref()
    }

    /// Bytes of vertex data bound for drawing: stride times vertex count.
    /// Zero until initialized.
    ///
    /// The allocation behind it may be padded up to wgpu's copy alignment.
    pub fn vertex_buffer_size(&self) -> u64 {
        SimpleVertex::STRIDE * u64::from(self.num_vertices)
    }

    /// Bytes of index data bound for drawing: two bytes per index.
    pub fn index_buffer_size(&self) -> u64 {
        INDEX_SIZE * u64::from(self.num_indices)
    }

    /// Vertices uploaded by the last `initialize`.
    pub fn num_vertices(&self) -> u32 {
        self.num_vertices
    }

    /// Indices drawn per `draw` call.
    pub fn num_indices(&self) -> u32 {
        self.num_indices
    }

    pub fn shape(&self) -> &dyn Shape {
        self.shape.as_ref()
    }

    // ── transform ────────────────────────────────────────────────────────

    pub fn world_matrix(&self) -> &Mat4 {
        self.world.matrix()
    }

    pub fn world(&self) -> &WorldTransform {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut WorldTransform {
        &mut self.world
    }

    pub fn rotate_x(&mut self, angle: f32) {
        self.world.rotate_x(angle);
    }

    pub fn rotate_y(&mut self, angle: f32) {
        self.world.rotate_y(angle);
    }

    pub fn rotate_z(&mut self, angle: f32) {
        self.world.rotate_z(angle);
    }

    pub fn rotate_roll_pitch_yaw(&mut self, pitch: f32, yaw: f32, roll: f32) {
        self.world.rotate_roll_pitch_yaw(pitch, yaw, roll);
    }

    pub fn scale(&mut self, scale_x: f32, scale_y: f32, scale_z: f32) {
        self.world.scale(scale_x, scale_y, scale_z);
    }

    pub fn translate(&mut self, offset: Vec3) {
        self.world.translate(offset);
    }
}

/// Checks a shape's data before any GPU allocation is attempted.
pub(crate) fn validate_geometry(shape: &dyn Shape, max_buffer_size: u64) -> Result<(), RenderableError> {
    let num_vertices = shape.num_vertices();
    let num_indices = shape.num_indices();

    if num_vertices == 0 {
        return Err(RenderableError::EmptyGeometry { what: "vertex" });
    }
    if num_indices == 0 {
        return Err(RenderableError::EmptyGeometry { what: "index" });
    }

    let vertices = shape.vertices();
    if num_vertices as usize > vertices.len() {
        return Err(RenderableError::CountMismatch {
            what: "vertex",
            declared: num_vertices,
            available: vertices.len(),
        });
    }

    let indices = shape.indices();
    if num_indices as usize > indices.len() {
        return Err(RenderableError::CountMismatch {
            what: "index",
            declared: num_indices,
            available: indices.len(),
        });
    }

    if num_vertices > u32::from(u16::MAX) + 1 {
        return Err(RenderableError::TooManyVertices(num_vertices));
    }

    if let Some(&index) = indices[..num_indices as usize]
        .iter()
        .find(|&&i| u32::from(i) >= num_vertices)
    {
        return Err(RenderableError::IndexOutOfRange {
            index,
            num_vertices,
        });
    }

    let vertex_bytes = SimpleVertex::STRIDE * u64::from(num_vertices);
    if vertex_bytes > max_buffer_size {
        return Err(RenderableError::BufferTooLarge {
            what: "vertex",
            size: vertex_bytes,
            max: max_buffer_size,
        });
    }

    let index_bytes = INDEX_SIZE * u64::from(num_indices);
    if index_bytes > max_buffer_size {
        return Err(RenderableError::BufferTooLarge {
            what: "index",
            size: index_bytes,
            max: max_buffer_size,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::shapes::{Cube, Mesh};
    use crate::render::test_gpu;

    fn white(position: [f32; 3]) -> SimpleVertex {
        SimpleVertex::new(position, [1.0; 4])
    }

    /// Triangle whose `update` edits its own geometry.
    struct Reshaping {
        mesh: Mesh,
        grow: bool,
    }

    impl Reshaping {
        fn new(grow: bool) -> Self {
            Self {
                mesh: Mesh::triangle([1.0; 4]),
                grow,
            }
        }
    }

    impl Shape for Reshaping {
        fn vertices(&self) -> &[SimpleVertex] {
            self.mesh.vertices()
        }
        fn indices(&self) -> &[u16] {
            self.mesh.indices()
        }
        fn update(&mut self, _world: &mut WorldTransform, _dt: f32) {
            let vertices = self.mesh.vertices().to_vec();
            let mut indices = self.mesh.indices().to_vec();
            if self.grow {
                indices.extend_from_slice(&[0, 2, 1]);
            } else {
                indices.clear();
            }
            self.mesh = Mesh::new(vertices, indices);
        }
    }

    fn test_ctx<'a>(
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        layout: &'a wgpu::BindGroupLayout,
    ) -> RenderCtx<'a> {
        RenderCtx::new(device, queue, wgpu::TextureFormat::Bgra8UnormSrgb, layout)
    }

    /// Reports more elements than it stores.
    struct Lying;

    impl Shape for Lying {
        fn vertices(&self) -> &[SimpleVertex] {
            &[]
        }
        fn indices(&self) -> &[u16] {
            &[0]
        }
        fn num_vertices(&self) -> u32 {
            3
        }
    }

    // ── lifecycle ────────────────────────────────────────────────────────

    #[test]
    fn new_renderable_owns_no_gpu_resources() {
        let r = Renderable::new(Cube::new());
        assert!(!r.is_initialized());
        assert!(r.vertex_buffer().is_none());
        assert!(r.index_buffer().is_none());
        assert!(r.constant_buffer().is_none());
        assert!(r.vertex_shader().is_none());
        assert!(r.pixel_shader().is_none());
        assert!(r.vertex_layout().is_none());
        assert_eq!(*r.world_matrix(), Mat4::IDENTITY);
    }

    // ── buffer sizes ─────────────────────────────────────────────────────

    #[test]
    fn nothing_is_bound_before_initialize() {
        let r = Renderable::new(Cube::new());
        assert_eq!(r.num_vertices(), 0);
        assert_eq!(r.num_indices(), 0);
        assert_eq!(r.vertex_buffer_size(), 0);
        assert_eq!(r.index_buffer_size(), 0);
    }

    // ── transforms ───────────────────────────────────────────────────────

    #[test]
    fn transform_methods_compose_onto_world() {
        let mut r = Renderable::new(Cube::new());
        r.rotate_x(0.2);
        r.rotate_y(0.3);
        r.rotate_z(0.4);
        r.rotate_roll_pitch_yaw(0.1, 0.2, 0.3);
        r.scale(1.0, 2.0, 3.0);
        r.translate(Vec3::new(4.0, 5.0, 6.0));

        let mut expected = WorldTransform::new();
        expected.rotate_x(0.2);
        expected.rotate_y(0.3);
        expected.rotate_z(0.4);
        expected.rotate_roll_pitch_yaw(0.1, 0.2, 0.3);
        expected.scale(1.0, 2.0, 3.0);
        expected.translate(Vec3::new(4.0, 5.0, 6.0));

        assert_eq!(r.world(), &expected);
    }

    #[test]
    fn update_runs_shape_animation() {
        let mut r = Renderable::new(Cube::spinning(1.0));
        r.update(0.5);

        let mut expected = WorldTransform::new();
        expected.rotate_y(0.5);
        assert!(r.world_matrix().abs_diff_eq(*expected.matrix(), 1e-6));
    }

    // ── shaders ──────────────────────────────────────────────────────────

    #[test]
    fn shaders_are_shared_not_copied() {
        let vs = Rc::new(VertexShader::new("main", "", "vs_main"));
        let ps = Rc::new(PixelShader::new("main", "", "ps_main"));

        let mut a = Renderable::new(Cube::new());
        let mut b = Renderable::new(Cube::new());
        a.set_vertex_shader(Rc::clone(&vs));
        b.set_vertex_shader(Rc::clone(&vs));
        a.set_pixel_shader(Rc::clone(&ps));

        assert_eq!(Rc::strong_count(&vs), 3);
        assert!(Rc::ptr_eq(a.vertex_shader().unwrap(), b.vertex_shader().unwrap()));
        assert!(b.pixel_shader().is_none());
        assert_eq!(a.vertex_layout().unwrap().array_stride, SimpleVertex::STRIDE);

        drop(a);
        assert_eq!(Rc::strong_count(&vs), 2);
        assert_eq!(Rc::strong_count(&ps), 1);
    }

    #[test]
    fn replacing_a_shader_releases_the_old_reference() {
        let first = Rc::new(PixelShader::new("first", "", "ps_main"));
        let second = Rc::new(PixelShader::new("second", "", "ps_main"));

        let mut r = Renderable::new(Cube::new());
        r.set_pixel_shader(Rc::clone(&first));
        r.set_pixel_shader(Rc::clone(&second));

        assert_eq!(Rc::strong_count(&first), 1);
        assert_eq!(r.pixel_shader().unwrap().name(), "second");
    }

    // ── validation ───────────────────────────────────────────────────────

    #[test]
    fn cube_is_valid_geometry() {
        assert_eq!(validate_geometry(&Cube::new(), u64::MAX), Ok(()));
    }

    #[test]
    fn empty_geometry_is_rejected() {
        let no_vertices = Mesh::new(vec![], vec![0]);
        assert_eq!(
            validate_geometry(&no_vertices, u64::MAX),
            Err(RenderableError::EmptyGeometry { what: "vertex" })
        );

        let no_indices = Mesh::new(vec![white([0.0; 3])], vec![]);
        assert_eq!(
            validate_geometry(&no_indices, u64::MAX),
            Err(RenderableError::EmptyGeometry { what: "index" })
        );
    }

    #[test]
    fn declared_counts_must_fit_slices() {
        assert_eq!(
            validate_geometry(&Lying, u64::MAX),
            Err(RenderableError::CountMismatch {
                what: "vertex",
                declared: 3,
                available: 0,
            })
        );
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mesh = Mesh::new(vec![white([0.0; 3]), white([1.0; 3])], vec![0, 1, 2]);
        assert_eq!(
            validate_geometry(&mesh, u64::MAX),
            Err(RenderableError::IndexOutOfRange {
                index: 2,
                num_vertices: 2,
            })
        );
    }

    #[test]
    fn oversized_buffer_is_rejected() {
        let err = validate_geometry(&Cube::new(), 100).unwrap_err();
        assert_eq!(
            err,
            RenderableError::BufferTooLarge {
                what: "vertex",
                size: 224,
                max: 100,
            }
        );
        assert!(err.to_string().contains("224"));
    }

    #[test]
    fn too_many_vertices_for_u16_indices() {
        let vertices = vec![white([0.0; 3]); 65_537];
        let mesh = Mesh::new(vertices, vec![0, 1, 2]);
        assert_eq!(
            validate_geometry(&mesh, u64::MAX),
            Err(RenderableError::TooManyVertices(65_537))
        );
    }

    // ── GPU-backed ───────────────────────────────────────────────────────

    #[test]
    fn initialize_creates_buffers_and_resets_world() {
        let Some((device, queue)) = test_gpu::device() else {
            eprintln!("no GPU adapter available; skipping");
            return;
        };
        let layout = ConstantBuffer::bind_group_layout(&device);
        let ctx = test_ctx(&device, &queue, &layout);

        let mut r = Renderable::new(Mesh::triangle([1.0, 0.0, 0.0, 1.0]));
        r.translate(Vec3::new(1.0, 2.0, 3.0));
        r.initialize(&ctx).unwrap();

        assert!(r.is_initialized());
        assert_eq!(*r.world_matrix(), Mat4::IDENTITY);

        let vbo = r.vertex_buffer().unwrap();
        let ibo = r.index_buffer().unwrap();
        assert!(vbo.usage().contains(wgpu::BufferUsages::VERTEX));
        assert!(ibo.usage().contains(wgpu::BufferUsages::INDEX));
        // Three indices: the bound range is exact even though the
        // allocation is padded to 4-byte alignment.
        assert_eq!(r.vertex_buffer_size(), 28 * 3);
        assert_eq!(r.index_buffer_size(), 6);
        assert!(vbo.size() >= r.vertex_buffer_size());
        assert!(ibo.size() >= r.index_buffer_size());
        assert_eq!(r.constant_buffer().unwrap().size(), ConstantBuffer::SIZE);
    }

    #[test]
    fn bound_ranges_ignore_geometry_changes_until_reinitialized() {
        let Some((device, queue)) = test_gpu::device() else {
            eprintln!("no GPU adapter available; skipping");
            return;
        };
        let layout = ConstantBuffer::bind_group_layout(&device);
        let ctx = test_ctx(&device, &queue, &layout);

        let mut r = Renderable::new(Reshaping::new(true));
        r.initialize(&ctx).unwrap();
        r.update(0.016);

        assert_eq!(r.shape().num_indices(), 6);
        assert_eq!(r.num_indices(), 3);
        assert_eq!(r.index_buffer_size(), 6);

        let ibo = r.index_buffer().unwrap();
        assert!(r.index_buffer_size() <= ibo.size());
        let _ = ibo.slice(..r.index_buffer_size());

        r.initialize(&ctx).unwrap();
        assert_eq!(r.num_indices(), 6);
        assert_eq!(r.index_buffer_size(), 12);
        assert!(r.index_buffer_size() <= r.index_buffer().unwrap().size());
    }

    #[test]
    fn initialize_twice_replaces_buffers() {
        let Some((device, queue)) = test_gpu::device() else {
            eprintln!("no GPU adapter available; skipping");
            return;
        };
        let layout = ConstantBuffer::bind_group_layout(&device);
        let ctx = test_ctx(&device, &queue, &layout);

        let mut r = Renderable::new(Cube::new());
        r.initialize(&ctx).unwrap();
        let first_vbo = r.vertex_buffer().unwrap().clone();
        let first_ibo = r.index_buffer().unwrap().clone();
        let first_cbo = r.constant_buffer().unwrap().clone();
        r.rotate_z(1.0);

        r.initialize(&ctx).unwrap();

        assert!(r.is_initialized());
        assert_eq!(*r.world_matrix(), Mat4::IDENTITY);
        assert_ne!(r.vertex_buffer().unwrap(), &first_vbo);
        assert_ne!(r.index_buffer().unwrap(), &first_ibo);
        assert_ne!(r.constant_buffer().unwrap(), &first_cbo);
        assert_eq!(r.vertex_buffer_size(), 28 * 8);
        assert_eq!(r.index_buffer_size(), 2 * 36);
    }

    #[test]
    fn failed_reinitialize_keeps_previous_buffers() {
        let Some((device, queue)) = test_gpu::device() else {
            eprintln!("no GPU adapter available; skipping");
            return;
        };
        let layout = ConstantBuffer::bind_group_layout(&device);
        let ctx = test_ctx(&device, &queue, &layout);

        let mut r = Renderable::new(Reshaping::new(false));
        r.initialize(&ctx).unwrap();
        let first_vbo = r.vertex_buffer().unwrap().clone();
        let first_ibo = r.index_buffer().unwrap().clone();
        let first_cbo = r.constant_buffer().unwrap().clone();

        // The update empties the index list, so the second upload is invalid.
        r.update(0.016);
        r.translate(Vec3::X);
        assert_eq!(
            r.initialize(&ctx),
            Err(RenderableError::EmptyGeometry { what: "index" })
        );

        assert_eq!(r.vertex_buffer().unwrap(), &first_vbo);
        assert_eq!(r.index_buffer().unwrap(), &first_ibo);
        assert_eq!(r.constant_buffer().unwrap(), &first_cbo);
        assert_eq!(r.num_indices(), 3);
        assert!(r.world_matrix().abs_diff_eq(Mat4::from_translation(Vec3::X), 1e-6));
    }

    #[test]
    fn failed_initialize_creates_nothing() {
        let Some((device, queue)) = test_gpu::device() else {
            eprintln!("no GPU adapter available; skipping");
            return;
        };
        let layout = ConstantBuffer::bind_group_layout(&device);
        let ctx = test_ctx(&device, &queue, &layout);

        let mut empty = Renderable::new(Mesh::default());
        assert_eq!(
            empty.initialize(&ctx),
            Err(RenderableError::EmptyGeometry { what: "vertex" })
        );
        assert!(!empty.is_initialized());
    }
}
