//! The OS window and the GPU context bound to it.

mod main_window;

pub use main_window::{MainWindow, WindowConfig};
