//! Camera state read by the frustum and the scheduler.

use ozone_core::{Vec3, TAU};

use crate::effects::EffectsScan;

/// Viewer position, orientation and projection.
///
/// Heading `h` rotates about `+z` with `h = 0` looking along `+y`; pitch `v`
/// is the elevation above the horizon, clamped to `[-PI/2, PI/2]`.
#[derive(Clone, Debug)]
pub struct Camera {
    /// Eye position.
    pub p: Vec3,
    h: f32,
    v: f32,
    at: Vec3,
    right: Vec3,
    up: Vec3,
    /// Vertical field of view, radians.
    pub vert_fov: f32,
    /// Viewport width / height.
    pub aspect: f32,
    /// Zoom; larger values make distant objects appear bigger.
    pub mag: f32,
    /// Far clip distance. Set by the scheduler from the current visibility.
    pub max_dist: f32,
    /// Render the scene in night-vision green.
    pub night_vision: bool,
    width: i32,
    height: i32,
    flash: f32,
    shake: f32,
}

impl Camera {
    /// Default vertical field of view.
    pub const DEFAULT_VERT_FOV: f32 = 80.0 * std::f32::consts::PI / 180.0;

    /// Creates a camera at the origin looking along `+y` for a window of the
    /// given size.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        let mut camera = Self {
            p: Vec3::ZERO,
            h: 0.0,
            v: 0.0,
            at: Vec3::Y,
            right: Vec3::X,
            up: Vec3::Z,
            vert_fov: Self::DEFAULT_VERT_FOV,
            aspect: 1.0,
            mag: 1.0,
            max_dist: 0.0,
            night_vision: false,
            width: 1,
            height: 1,
            flash: 0.0,
            shake: 0.0,
        };
        camera.resize(width, height);
        camera
    }

    /// Updates the window size and aspect ratio. Sizes below 1 are raised to 1.
    #[allow(clippy::cast_precision_loss)]
    pub fn resize(&mut self, width: i32, height: i32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.aspect = self.width as f32 / self.height as f32;
    }

    /// Window width.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Window height.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Sets heading and pitch and recomputes the basis.
    pub fn set_orientation(&mut self, h: f32, v: f32) {
        let half_pi = std::f32::consts::FRAC_PI_2;
        // rem_euclid rounds tiny negative headings up to TAU itself
        let h = h.rem_euclid(TAU);
        self.h = if h >= TAU { 0.0 } else { h };
        self.v = v.clamp(-half_pi, half_pi);

        let (sin_h, cos_h) = self.h.sin_cos();
        let (sin_v, cos_v) = self.v.sin_cos();

        self.at = Vec3::new(-sin_h * cos_v, cos_h * cos_v, sin_v);
        self.right = Vec3::new(cos_h, sin_h, 0.0);
        self.up = self.right.cross(self.at);
    }

    /// Points the camera at `target`. A target at the eye keeps the current
    /// orientation.
    pub fn look_at(&mut self, target: Vec3) {
        let dir = target - self.p;
        if dir.length_squared() <= 0.0 {
            return;
        }
        let horizontal = dir.x.hypot(dir.y);
        let h = if horizontal > 0.0 { (-dir.x).atan2(dir.y) } else { self.h };
        self.set_orientation(h, dir.z.atan2(horizontal));
    }

    /// Heading, radians in `[0, TAU)`.
    #[must_use]
    pub const fn heading(&self) -> f32 {
        self.h
    }

    /// Pitch, radians.
    #[must_use]
    pub const fn pitch(&self) -> f32 {
        self.v
    }

    /// Forward unit vector.
    #[must_use]
    pub const fn at(&self) -> Vec3 {
        self.at
    }

    /// Right unit vector, always horizontal.
    #[must_use]
    pub const fn right(&self) -> Vec3 {
        self.right
    }

    /// Up unit vector.
    #[must_use]
    pub const fn up(&self) -> Vec3 {
        self.up
    }

    /// Flash intensity from the last effects scan.
    #[must_use]
    pub const fn flash(&self) -> f32 {
        self.flash
    }

    /// Shake intensity from the last effects scan.
    #[must_use]
    pub const fn shake(&self) -> f32 {
        self.shake
    }

    /// Takes over the accumulators of a completed effects scan.
    pub fn apply_effects(&mut self, scan: &EffectsScan) {
        self.flash = scan.flash;
        self.shake = scan.shake;
    }
}
