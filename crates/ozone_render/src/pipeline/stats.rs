//! Rendering statistics.

use std::time::Duration;

/// Statistics accumulated across frames until [`RenderStats::reset`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Frames rendered.
    pub frames: u64,
    /// Time spent culling and sorting, microseconds.
    pub prepare_micros: u64,
    /// Time spent issuing geometry, microseconds.
    pub geometry_micros: u64,
    /// Time spent compositing the offscreen target, microseconds.
    pub postprocess_micros: u64,
    /// Time spent drawing the UI, microseconds.
    pub ui_micros: u64,
    /// Time spent waiting for the effects scan, microseconds.
    pub effects_wait_micros: u64,
    /// Cells whose column passed the frustum test.
    pub cells_scheduled: u64,
    /// Cells in the frustum span rejected by the column test.
    pub cells_culled: u64,
    /// Structures staged for drawing.
    pub structs_staged: u64,
    /// Objects staged for drawing.
    pub objects_staged: u64,
    /// Fragments staged for drawing.
    pub frags_staged: u64,
}

impl RenderStats {
    /// Saturating microsecond count of a duration.
    #[must_use]
    pub fn micros(duration: Duration) -> u64 {
        u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
    }

    /// Sum of all timed phases, microseconds.
    #[must_use]
    pub const fn total_micros(&self) -> u64 {
        self.prepare_micros
            + self.geometry_micros
            + self.postprocess_micros
            + self.ui_micros
            + self.effects_wait_micros
    }

    /// Average frame time in milliseconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn frame_time_ms(&self) -> f32 {
        if self.frames == 0 {
            0.0
        } else {
            self.total_micros() as f32 / self.frames as f32 / 1000.0
        }
    }

    /// Returns FPS calculated from frame time.
    #[must_use]
    pub fn fps(&self) -> f32 {
        let frame_time_ms = self.frame_time_ms();
        if frame_time_ms > 0.0 {
            1000.0 / frame_time_ms
        } else {
            0.0
        }
    }

    /// Zeroes every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
