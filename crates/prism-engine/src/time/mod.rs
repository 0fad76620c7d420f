//! Frame timing.
//!
//! One `FrameClock` per game loop; call `tick()` once per Update+Render pair.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
