//! Mathematical types shared by the world model and the render core.

pub mod approx;
mod vec3;

pub use vec3::Vec3;

/// Full turn in radians.
pub const TAU: f32 = std::f32::consts::TAU;

/// Linear interpolation between `a` and `b`.
#[inline]
#[must_use]
pub fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}
