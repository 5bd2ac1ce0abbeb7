//! The render engine: one explicit owner for camera, scheduler, compositor,
//! effects thread and device.

use std::ops::{BitOr, BitOrAssign};
use std::sync::Arc;
use std::time::Instant;

use ozone_matrix::{Collider, Orbis, OrbisCollider};
use parking_lot::RwLock;

use crate::camera::Camera;
use crate::compositor::FrameCompositor;
use crate::config::EngineConfig;
use crate::effects::EffectsWorker;
use crate::error::{RenderError, RenderResult};
use crate::gpu::{DrawSink, GpuDevice, EXT_FRAMEBUFFER_OBJECT, EXT_TEXTURE_FLOAT};
use crate::pipeline::{RenderScheduler, RenderStats};

/// What a call to [`RenderEngine::update`] does.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct UpdateFlags(u32);

impl UpdateFlags {
    /// Nothing.
    pub const NONE: Self = Self(0);
    /// Cull and draw the world.
    pub const DRAW_ORBIS: Self = Self(0x01);
    /// Draw the user interface.
    pub const DRAW_UI: Self = Self(0x02);
    /// Run the effects scan alongside drawing.
    pub const EFFECTS: Self = Self(0x04);
    /// Everything.
    pub const ALL: Self = Self(0x07);

    /// True if every flag of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for UpdateFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for UpdateFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Owner of all render state.
///
/// Lifecycle: [`RenderEngine::init`] → [`RenderEngine::load`] → per-frame
/// [`RenderEngine::update`] → [`RenderEngine::unload`] →
/// [`RenderEngine::destroy`]. Dropping the engine runs `destroy`.
pub struct RenderEngine<D: GpuDevice> {
    config: EngineConfig,
    device: D,
    orbis: Arc<RwLock<Orbis>>,
    collider: Box<dyn Collider + Send + Sync>,
    camera: Camera,
    scheduler: RenderScheduler,
    compositor: FrameCompositor,
    effects: EffectsWorker,
    stats: RenderStats,
    destroyed: bool,
}

impl<D: GpuDevice> RenderEngine<D> {
    /// Validates the configuration, checks device capabilities and allocates
    /// the frame targets for a `width × height` window.
    ///
    /// # Errors
    ///
    /// Every error is fatal: invalid configuration, a missing device
    /// capability, or a failed or incomplete framebuffer.
    pub fn init(
        config: EngineConfig,
        mut device: D,
        orbis: Arc<RwLock<Orbis>>,
        width: i32,
        height: i32,
    ) -> RenderResult<Self> {
        tracing::info!(width, height, "RenderEngine: initialising");

        if let Err(err) = config.validate() {
            tracing::error!(%err, "RenderEngine: bad configuration");
            return Err(err.into());
        }

        let render = &config.render;
        let mut required = Vec::new();
        if render.is_offscreen() {
            required.push(EXT_FRAMEBUFFER_OBJECT);
        }
        if render.postprocess && render.glow {
            required.push(EXT_TEXTURE_FLOAT);
        }
        if let Some(missing) = required.into_iter().find(|ext| !device.has_extension(ext)) {
            tracing::error!(extension = missing, "RenderEngine: missing device capability");
            return Err(RenderError::MissingExtension(missing));
        }

        let mut compositor = FrameCompositor::new(render);
        compositor.resize(&mut device, width, height)?;

        let engine = Self {
            camera: Camera::new(width, height),
            scheduler: RenderScheduler::new(render),
            effects: EffectsWorker::new(config.effects.distance),
            compositor,
            config,
            device,
            orbis,
            collider: Box::new(OrbisCollider),
            stats: RenderStats::default(),
            destroyed: false,
        };

        tracing::info!(
            offscreen = engine.compositor.is_offscreen(),
            distance = engine.config.render.distance,
            "RenderEngine: initialised"
        );
        Ok(engine)
    }

    /// Replaces the collider used to resolve the camera's medium.
    pub fn set_collider(&mut self, collider: Box<dyn Collider + Send + Sync>) {
        self.collider = collider;
    }

    /// Starts the effects thread if effects are enabled.
    ///
    /// # Errors
    ///
    /// Fails if the thread cannot be spawned.
    pub fn load(&mut self) -> RenderResult<()> {
        if self.destroyed {
            tracing::debug!("RenderEngine: load after destroy ignored");
            return Ok(());
        }
        if !self.config.effects.enabled {
            tracing::debug!("RenderEngine: effects disabled");
            return Ok(());
        }
        self.effects.load(Arc::clone(&self.orbis))
    }

    /// Stops the effects thread. Blocks until it has exited.
    pub fn unload(&mut self) {
        self.effects.unload();
    }

    /// Runs one frame.
    ///
    /// With [`UpdateFlags::EFFECTS`] the effects scan runs while the world and
    /// UI are drawn, and this call returns only after the scan has been
    /// applied to the camera. The world lock is held for reading while the
    /// world is drawn; it must not be held for writing by the caller.
    pub fn update(&mut self, flags: UpdateFlags, sink: &mut dyn DrawSink) {
        if self.destroyed {
            tracing::debug!("RenderEngine: update after destroy ignored");
            return;
        }

        let scanning = flags.contains(UpdateFlags::EFFECTS) && self.effects.begin(self.camera.p);

        if flags.contains(UpdateFlags::DRAW_ORBIS) {
            let Self {
                device,
                orbis,
                collider,
                camera,
                scheduler,
                compositor,
                stats,
                ..
            } = self;
            let orbis = orbis.read();

            compositor.draw_orbis(device, stats, |device, stats| {
                scheduler.prepare_draw(&orbis, &**collider, camera, stats);
                scheduler.draw_geometry(device, sink, stats);
            });
        }

        if flags.contains(UpdateFlags::DRAW_UI) {
            let begin = Instant::now();
            sink.draw_ui();
            self.stats.ui_micros += RenderStats::micros(begin.elapsed());
        }

        if scanning {
            let begin = Instant::now();
            if let Some(scan) = self.effects.finish() {
                self.camera.apply_effects(&scan);
            }
            self.stats.effects_wait_micros += RenderStats::micros(begin.elapsed());
        }

        self.stats.frames += 1;
    }

    /// Reallocates frame targets for a new window size.
    ///
    /// # Errors
    ///
    /// Allocation failures are fatal.
    pub fn resize(&mut self, width: i32, height: i32) -> RenderResult<()> {
        if self.destroyed {
            tracing::debug!("RenderEngine: resize after destroy ignored");
            return Ok(());
        }
        self.camera.resize(width, height);
        self.compositor.resize(&mut self.device, width, height)
    }

    /// Stops the effects thread and frees all device resources. Idempotent.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.effects.unload();
        self.compositor.destroy(&mut self.device);
        self.destroyed = true;

        tracing::info!(frames = self.stats.frames, "RenderEngine: destroyed");
    }

    /// True after `destroy`.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The shared world.
    #[must_use]
    pub const fn orbis(&self) -> &Arc<RwLock<Orbis>> {
        &self.orbis
    }

    /// Camera.
    #[must_use]
    pub const fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Camera, for moving the viewer between frames.
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Scheduler.
    #[must_use]
    pub const fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }

    /// Compositor.
    #[must_use]
    pub const fn compositor(&self) -> &FrameCompositor {
        &self.compositor
    }

    /// Effects thread owner.
    #[must_use]
    pub const fn effects(&self) -> &EffectsWorker {
        &self.effects
    }

    /// Device.
    #[must_use]
    pub const fn device(&self) -> &D {
        &self.device
    }

    /// Device.
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Accumulated statistics.
    #[must_use]
    pub const fn stats(&self) -> &RenderStats {
        &self.stats
    }

    /// Zeroes the statistics.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }
}

impl<D: GpuDevice> Drop for RenderEngine<D> {
    fn drop(&mut self) {
        self.destroy();
    }
}
