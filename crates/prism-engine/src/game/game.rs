use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

use crate::device::Gpu;
use crate::render::Renderer;
use crate::window::MainWindow;

use super::config::GameConfig;
use super::frame_loop::FrameLoop;
use super::stage::{AppControl, Stage};

/// Composition root: one main window, one renderer, one frame loop.
///
/// Build the scene through [`Game::renderer_mut`] before calling
/// [`Game::run`]; GPU resources are created once the window exists.
pub struct Game {
    name: String,
    config: GameConfig,
    renderer: Renderer,
}

impl Game {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let config = GameConfig::default().title(name.clone());
        Self::with_config(name, config)
    }

    pub fn with_config(name: impl Into<String>, config: GameConfig) -> Self {
        Self {
            name: name.into(),
            config,
            renderer: Renderer::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut GameConfig {
        &mut self.config
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    /// Opens the window, initializes the renderer and pumps events until
    /// the window closes or a frame asks to exit.
    ///
    /// Returns the exit code. Window or renderer startup failures are
    /// returned as errors instead.
    pub fn run(mut self) -> Result<i32> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        event_loop.set_control_flow(ControlFlow::Poll);

        self.renderer.set_clear_color(self.config.clear_color);

        let frame_loop = match self.config.dt_clamp {
            Some((dt_min, dt_max)) => FrameLoop::with_clamps(dt_min, dt_max),
            None => FrameLoop::new(),
        };

        log::info!("starting `{}`", self.name);

        let mut state = GameState {
            game: self,
            window: None,
            frame_loop,
            exit_code: None,
            startup_error: None,
        };

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        state.finish()
    }
}

/// Adapts the renderer and the window's GPU context to one frame step.
struct FrameStage<'a, 'w> {
    renderer: &'a mut Renderer,
    gpu: &'a mut Gpu<'w>,
}

impl Stage for FrameStage<'_, '_> {
    fn update(&mut self, dt: f32) {
        self.renderer.update(dt);
    }

    fn render(&mut self) -> AppControl {
        self.renderer.render(self.gpu)
    }
}

// Field order matters: the renderer's GPU objects drop before the window's device.
struct GameState {
    game: Game,
    window: Option<MainWindow>,
    frame_loop: FrameLoop,
    exit_code: Option<i32>,
    startup_error: Option<anyhow::Error>,
}

impl GameState {
    fn request_exit(&mut self, event_loop: &ActiveEventLoop, code: i32) {
        if self.exit_code.is_none() {
            log::info!("exit requested (code {code})");
            self.exit_code = Some(code);
        }
        event_loop.exit();
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let config = &self.game.config;
        let window = MainWindow::create(event_loop, &config.window, config.gpu.clone())?;

        let renderer = &mut self.game.renderer;
        window
            .with_gpu(|gpu| renderer.initialize(gpu))
            .context("failed to initialize renderer")?;

        // Startup time is not part of the first frame.
        self.frame_loop.reset();
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn finish(self) -> Result<i32> {
        match self.startup_error {
            Some(err) => Err(err),
            None => Ok(self.exit_code.unwrap_or(0)),
        }
    }
}

impl ApplicationHandler for GameState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.exit_code.is_some() {
            return;
        }

        if let Err(err) = self.start(event_loop) {
            log::error!("startup failed: {err:#}");
            self.startup_error = Some(err);
            self.request_exit(event_loop, 1);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_code.is_some() {
            event_loop.exit();
            return;
        }

        // The queue is drained: run the next frame.
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.as_mut() else {
            return;
        };
        if window.id() != window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested => self.request_exit(event_loop, 0),

            WindowEvent::KeyboardInput { event, .. } if is_escape_press(&event) => {
                self.request_exit(event_loop, 0);
            }

            WindowEvent::Resized(new_size) => {
                resize_window(window, &mut self.game.renderer, new_size);
                window.request_redraw();
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let new_size = window.inner_size();
                resize_window(window, &mut self.game.renderer, new_size);
            }

            WindowEvent::RedrawRequested => {
                if self.exit_code.is_some() {
                    return;
                }

                let control = run_frame(window, &mut self.game.renderer, &mut self.frame_loop);

                if let AppControl::Exit(code) = control {
                    self.request_exit(event_loop, code);
                }
            }

            _ => {}
        }
    }
}

/// One Update+Render pair against the window's GPU context.
fn run_frame(
    window: &mut MainWindow,
    renderer: &mut Renderer,
    frame_loop: &mut FrameLoop,
) -> AppControl {
    window.with_gpu_mut(|gpu| {
        let mut stage = FrameStage { renderer, gpu };
        frame_loop.step(&mut stage)
    })
}

fn resize_window(window: &mut MainWindow, renderer: &mut Renderer, new_size: PhysicalSize<u32>) {
    window.resize(new_size);
    window.with_gpu(|gpu| renderer.resize(gpu, new_size));
}

fn is_escape_press(event: &KeyEvent) -> bool {
    event.state == ElementState::Pressed
        && !event.repeat
        && event.physical_key == PhysicalKey::Code(KeyCode::Escape)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_game_uses_name_as_title() {
        let game = Game::new("cubes");
        assert_eq!(game.name(), "cubes");
        assert_eq!(game.config().window.title, "cubes");
        assert!(!game.renderer().is_initialized());
        assert_eq!(game.renderer().renderable_count(), 0);
    }

    #[test]
    fn config_can_be_changed_before_run() {
        let mut game = Game::new("cubes");
        game.config_mut().clear_color = wgpu::Color::BLACK;
        assert_eq!(game.config().clear_color, wgpu::Color::BLACK);
    }

    // Opening a real window needs a running event loop; these bindings
    // check that the frame and resize paths reach the window's GPU context.
    #[test]
    fn frame_and_resize_reach_the_window_gpu() {
        let _: fn(&mut MainWindow, &mut Renderer, &mut FrameLoop) -> AppControl = run_frame;
        let _: fn(&mut MainWindow, &mut Renderer, PhysicalSize<u32>) = resize_window;
    }
}
