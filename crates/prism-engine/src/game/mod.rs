//! Game composition root and the frame loop.
//!
//! `Game` wires the main window and the renderer together and pumps the OS
//! event queue. Every time the queue drains, `FrameLoop` performs exactly one
//! Update+Render pair with the measured frame delta.

mod config;
mod frame_loop;
mod game;
mod stage;

pub use config::GameConfig;
pub use frame_loop::FrameLoop;
pub use game::Game;
pub use stage::{AppControl, Stage};
