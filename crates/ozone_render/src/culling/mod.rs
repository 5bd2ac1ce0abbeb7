//! Culling systems.
//!
//! The frustum bounds which cells are visited at all and tests individual
//! bounding spheres inside them.

mod frustum;

pub use frustum::{Frustum, Plane};

/// Radius actually used by visibility tests: negative, NaN and infinite
/// radii collapse to a point test.
#[inline]
#[must_use]
pub fn cull_radius(radius: f32) -> f32 {
    if radius.is_finite() && radius > 0.0 {
        radius
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cull_radius() {
        assert_eq!(cull_radius(2.5), 2.5);
        assert_eq!(cull_radius(-1.0), 0.0);
        assert_eq!(cull_radius(f32::NAN), 0.0);
        assert_eq!(cull_radius(f32::INFINITY), 0.0);
    }
}
