use anyhow::{Context, Result};
use ouroboros::self_referencing;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowId};

use crate::device::{Gpu, GpuInit};

/// Window configuration.
#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "prism".to_string(),
            initial_size: LogicalSize::new(800.0, 600.0),
        }
    }
}

/// The game's main window together with its GPU context.
///
/// The surface inside `Gpu` borrows the window, so both live in one
/// self-referential value and are dropped together.
#[self_referencing]
pub struct MainWindow {
    window: Window,

    #[borrows(window)]
    #[covariant]
    pub(crate) gpu: Gpu<'this>,
}

impl MainWindow {
    /// Opens the window and creates the device and swap chain for it.
    pub fn create(
        event_loop: &ActiveEventLoop,
        config: &WindowConfig,
        gpu_init: GpuInit,
    ) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        log::info!("window `{}` created ({:?})", config.title, window.id());

        MainWindowTryBuilder {
            window,
            gpu_builder: |window| pollster::block_on(Gpu::new(window, gpu_init)),
        }
        .try_build()
    }

    pub fn id(&self) -> WindowId {
        self.with_window(|w| w.id())
    }

    pub fn inner_size(&self) -> PhysicalSize<u32> {
        self.with_window(|w| w.inner_size())
    }

    pub fn request_redraw(&self) {
        self.with_window(|w| w.request_redraw());
    }

    /// Reconfigures the swap chain for a new client size.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.with_gpu_mut(|gpu| gpu.resize(new_size));
    }
}
