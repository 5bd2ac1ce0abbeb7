//! Frame composition.
//!
//! When post-processing is on or the render scale is not 1, the scene is
//! drawn into an offscreen target of `round(window * scale)` pixels and then
//! composited to the window in one full-screen pass.

mod targets;

pub use targets::{FrameTargets, TargetLayout};

use std::time::Instant;

use crate::config::{RenderConfig, ScaleFilter};
use crate::error::RenderResult;
use crate::gpu::{CompositePass, GpuDevice};
use crate::pipeline::RenderStats;

/// Offscreen target lifecycle and the composite pass.
#[derive(Debug)]
pub struct FrameCompositor {
    scale: f32,
    filter: ScaleFilter,
    postprocess: bool,
    glow: bool,
    offscreen: bool,
    window_width: i32,
    window_height: i32,
    render_width: i32,
    render_height: i32,
    targets: Option<FrameTargets>,
}

impl FrameCompositor {
    /// Creates a compositor with nothing allocated.
    #[must_use]
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            scale: config.scale,
            filter: config.scale_filter,
            postprocess: config.postprocess,
            glow: config.glow && config.postprocess,
            offscreen: config.is_offscreen(),
            window_width: 0,
            window_height: 0,
            render_width: 0,
            render_height: 0,
            targets: None,
        }
    }

    /// True if the scene goes through an offscreen target.
    #[must_use]
    pub const fn is_offscreen(&self) -> bool {
        self.offscreen
    }

    /// True if glow targets are allocated with the main target.
    #[must_use]
    pub const fn has_glow(&self) -> bool {
        self.glow
    }

    /// Window size.
    #[must_use]
    pub const fn window_size(&self) -> (i32, i32) {
        (self.window_width, self.window_height)
    }

    /// Scene render size.
    #[must_use]
    pub const fn render_size(&self) -> (i32, i32) {
        (self.render_width, self.render_height)
    }

    /// Current targets, `None` when on-screen or unallocated.
    #[must_use]
    pub const fn targets(&self) -> Option<&FrameTargets> {
        self.targets.as_ref()
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn scaled(&self, size: i32) -> i32 {
        ((size as f32 * self.scale + 0.5) as i32).max(1)
    }

    /// Recomputes sizes for a new window and reallocates the offscreen
    /// targets. The previous generation is freed first.
    ///
    /// # Errors
    ///
    /// Fails if allocation fails or a framebuffer is incomplete; nothing is
    /// left allocated in that case. Both are fatal.
    pub fn resize<D: GpuDevice + ?Sized>(&mut self, device: &mut D, width: i32, height: i32) -> RenderResult<()> {
        self.window_width = width.max(1);
        self.window_height = height.max(1);

        if !self.offscreen {
            self.render_width = self.window_width;
            self.render_height = self.window_height;
            return Ok(());
        }

        self.render_width = self.scaled(self.window_width);
        self.render_height = self.scaled(self.window_height);

        if let Some(mut old) = self.targets.take() {
            old.release(device);
        }

        let layout = TargetLayout {
            width: self.render_width,
            height: self.render_height,
            filter: self.filter,
            glow: self.glow,
        };

        match FrameTargets::create(device, layout) {
            Ok(targets) => {
                self.targets = Some(targets);
                tracing::info!(
                    window = ?self.window_size(),
                    render = ?self.render_size(),
                    glow = self.glow,
                    "FrameCompositor: targets allocated"
                );
                Ok(())
            }
            Err(err) => {
                tracing::error!(%err, "FrameCompositor: target allocation failed");
                Err(err)
            }
        }
    }

    /// Draws the scene via `scene`, through the offscreen target when one is
    /// allocated, then composites it and restores the window viewport.
    pub fn draw_orbis<D, F>(&mut self, device: &mut D, stats: &mut RenderStats, scene: F)
    where
        D: GpuDevice + ?Sized,
        F: FnOnce(&mut D, &mut RenderStats),
    {
        let main = self.targets.as_ref().and_then(|t| t.main_frame.zip(t.colour_buffer));

        if let Some((frame, _)) = main {
            device.viewport(self.render_width, self.render_height);
            device.bind_framebuffer(Some(frame));
        }

        scene(device, stats);

        if let Some((_, colour)) = main {
            let begin = Instant::now();

            device.bind_framebuffer(None);
            device.viewport(self.window_width, self.window_height);
            device.composite(CompositePass {
                colour,
                glow: self.targets.as_ref().and_then(|t| t.glow_buffer),
                postprocess: self.postprocess,
                width: self.window_width,
                height: self.window_height,
            });

            stats.postprocess_micros += RenderStats::micros(begin.elapsed());
        }
    }

    /// Frees all targets. Safe to call repeatedly or before any `resize`.
    pub fn destroy<D: GpuDevice + ?Sized>(&mut self, device: &mut D) {
        if let Some(mut targets) = self.targets.take() {
            targets.release(device);
            tracing::info!("FrameCompositor: targets released");
        }
    }
}
