use std::time::Duration;

use winit::dpi::LogicalSize;

use crate::device::GpuInit;
use crate::window::WindowConfig;

/// Startup configuration for a [`Game`](super::Game).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub window: WindowConfig,
    pub gpu: GpuInit,
    /// Background color each frame is cleared to.
    pub clear_color: wgpu::Color,
    /// Optional `(min, max)` bounds on the frame delta. `None` reports the
    /// measured time unchanged.
    pub dt_clamp: Option<(Duration, Duration)>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            gpu: GpuInit::default(),
            clear_color: wgpu::Color {
                r: 0.0,
                g: 0.0,
                b: 0.2,
                a: 1.0,
            },
            dt_clamp: None,
        }
    }
}

impl GameConfig {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.window.title = title.into();
        self
    }

    /// Initial client area in logical pixels.
    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.window.initial_size = LogicalSize::new(width, height);
        self
    }

    pub fn present_mode(mut self, mode: wgpu::PresentMode) -> Self {
        self.gpu.present_mode = mode;
        self
    }

    pub fn clear_color(mut self, color: wgpu::Color) -> Self {
        self.clear_color = color;
        self
    }

    pub fn dt_clamp(mut self, dt_min: Duration, dt_max: Duration) -> Self {
        self.dt_clamp = Some((dt_min, dt_max));
        self
    }
}
