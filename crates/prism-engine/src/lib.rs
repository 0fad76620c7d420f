//! Prism engine crate.
//!
//! A small real-time 3D renderer: one window, one GPU device, and a scene of
//! named renderables drawn with user-supplied WGSL shaders.

pub mod device;
pub mod game;
pub mod logging;
pub mod render;
pub mod time;
pub mod window;
