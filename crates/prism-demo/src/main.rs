use std::process::ExitCode;
use std::rc::Rc;

use anyhow::Result;
use glam::Vec3;

use prism_engine::game::Game;
use prism_engine::logging::{init_logging, LoggingConfig};
use prism_engine::render::shapes::{Cube, Shape};
use prism_engine::render::{PixelShader, Renderable, SimpleVertex, VertexShader, WorldTransform};

const SHADER_NAME: &str = "MainShader";
const SHADER_SOURCE: &str = include_str!("../shaders/simple.wgsl");

/// Small cube circling the center one.
///
/// The world matrix is rebuilt every frame from the accumulated angle.
struct OrbitingCube {
    inner: Cube,
    angle: f32,
}

impl OrbitingCube {
    fn new() -> Self {
        Self {
            inner: Cube::new(),
            angle: 0.0,
        }
    }
}

impl Shape for OrbitingCube {
    fn vertices(&self) -> &[SimpleVertex] {
        self.inner.vertices()
    }

    fn indices(&self) -> &[u16] {
        self.inner.indices()
    }

    fn update(&mut self, world: &mut WorldTransform, dt: f32) {
        self.angle += dt;

        world.reset();
        world.scale(0.3, 0.3, 0.3);
        world.rotate_z(-self.angle);
        world.translate(Vec3::new(-4.0, 0.0, 0.0));
        world.rotate_y(-self.angle * 2.0);
    }
}

fn build(game: &mut Game) -> Result<()> {
    let renderer = game.renderer_mut();

    renderer.add_vertex_shader(
        SHADER_NAME,
        Rc::new(VertexShader::new(SHADER_NAME, SHADER_SOURCE, "vs_main")),
    )?;
    renderer.add_pixel_shader(
        SHADER_NAME,
        Rc::new(PixelShader::new(SHADER_NAME, SHADER_SOURCE, "ps_main")),
    )?;

    renderer.add_renderable("Cube", Renderable::new(Cube::spinning(1.0)))?;
    renderer.add_renderable("Orbit", Renderable::new(OrbitingCube::new()))?;

    for name in ["Cube", "Orbit"] {
        renderer.set_vertex_shader_of_renderable(name, SHADER_NAME)?;
        renderer.set_pixel_shader_of_renderable(name, SHADER_NAME)?;
    }

    Ok(())
}

fn main() -> ExitCode {
    init_logging(LoggingConfig::default());

    let mut game = Game::new("Prism cube demo");

    if let Err(err) = build(&mut game) {
        log::error!("failed to build scene: {err:#}");
        return ExitCode::FAILURE;
    }

    match game.run() {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
