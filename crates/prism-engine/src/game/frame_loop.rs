use std::time::{Duration, Instant};

use crate::time::{FrameClock, FrameTime};

use super::stage::{AppControl, Stage};

/// Runs one Update+Render pair per idle iteration of the event loop.
#[derive(Debug, Clone, Default)]
pub struct FrameLoop {
    clock: FrameClock,
    last: Option<FrameTime>,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame loop whose deltas are clamped to `[dt_min, dt_max]`.
    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        Self {
            clock: FrameClock::with_clamps(dt_min, dt_max),
            last: None,
        }
    }

    /// Rebases timing, e.g. once startup work has finished.
    pub fn reset(&mut self) {
        self.clock.reset();
    }

    pub fn reset_at(&mut self, now: Instant) {
        self.clock.reset_at(now);
    }

    /// Timing of the most recent step.
    pub fn last_frame(&self) -> Option<FrameTime> {
        self.last
    }

    pub fn step<S: Stage + ?Sized>(&mut self, stage: &mut S) -> AppControl {
        self.step_at(stage, Instant::now())
    }

    /// Measures the delta since the previous step, then calls `update`
    /// and `render` once each.
    pub fn step_at<S: Stage + ?Sized>(&mut self, stage: &mut S, now: Instant) -> AppControl {
        let ft = self.clock.tick_at(now);
        self.last = Some(ft);

        stage.update(ft.dt);
        stage.render()
    }
}
