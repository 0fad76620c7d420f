/// Control directive returned by per-frame callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    /// Leave the loop; the value becomes the process exit code.
    Exit(i32),
}

impl AppControl {
    pub fn is_exit(self) -> bool {
        matches!(self, Self::Exit(_))
    }
}

/// One Update+Render step, driven by [`FrameLoop`](super::FrameLoop).
pub trait Stage {
    /// Advances simulation by `dt` seconds.
    fn update(&mut self, dt: f32);

    /// Draws and presents one frame.
    fn render(&mut self) -> AppControl;
}
