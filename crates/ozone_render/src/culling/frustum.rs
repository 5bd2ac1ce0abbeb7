//! View frustum for culling.
//!
//! Built directly from the camera basis: four side planes through the eye and
//! a far plane at `camera.max_dist`. There is no near plane; the side planes
//! already reject everything behind the eye.

use bytemuck::{Pod, Zeroable};
use ozone_core::Vec3;
use ozone_matrix::{Orbis, Span};

use super::cull_radius;
use crate::camera::Camera;

/// A plane in 3D space (Ax + By + Cz + D = 0) with a unit inward normal.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Plane {
    /// Normal X component.
    pub a: f32,
    /// Normal Y component.
    pub b: f32,
    /// Normal Z component.
    pub c: f32,
    /// Negated distance of the plane from the origin along the normal.
    pub d: f32,
}

impl Plane {
    /// Creates a new plane.
    #[must_use]
    pub const fn new(a: f32, b: f32, c: f32, d: f32) -> Self {
        Self { a, b, c, d }
    }

    /// Plane through `point` facing `normal` (normalized here).
    #[must_use]
    pub fn from_normal_point(normal: Vec3, point: Vec3) -> Self {
        let n = normal.normalized();
        Self::new(n.x, n.y, n.z, -n.dot(point))
    }

    /// Unit normal.
    #[must_use]
    pub const fn normal(&self) -> Vec3 {
        Vec3::new(self.a, self.b, self.c)
    }

    /// Signed distance from a point to the plane, positive on the inner side.
    #[inline]
    #[must_use]
    pub fn distance(&self, p: Vec3) -> f32 {
        self.a * p.x + self.b * p.y + self.c * p.z + self.d
    }
}

/// View frustum.
#[derive(Debug, Clone, Copy, Default)]
pub struct Frustum {
    /// Left, right, bottom, top, far planes.
    planes: [Plane; 5],
    /// Far-plane corners relative to the eye.
    corners: [Vec3; 4],
    /// Far clip distance of the last update.
    max_dist: f32,
}

impl Frustum {
    /// Left plane index.
    pub const LEFT: usize = 0;
    /// Right plane index.
    pub const RIGHT: usize = 1;
    /// Bottom plane index.
    pub const BOTTOM: usize = 2;
    /// Top plane index.
    pub const TOP: usize = 3;
    /// Far plane index.
    pub const FAR: usize = 4;

    const MIN_FOV: f32 = 1.0e-3;

    /// Creates a frustum that accepts everything until the first update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes planes from the camera. Call once per frame before any query.
    pub fn update(&mut self, camera: &Camera) {
        let fov = camera.vert_fov.clamp(Self::MIN_FOV, std::f32::consts::PI - Self::MIN_FOV);
        let aspect = if camera.aspect.is_finite() && camera.aspect > 0.0 { camera.aspect } else { 1.0 };
        let max_dist = if camera.max_dist.is_finite() { camera.max_dist.max(0.0) } else { 0.0 };

        let ty = (0.5 * fov).tan();
        let tx = ty * aspect;

        let p = camera.p;
        let at = camera.at();
        let right = camera.right();
        let up = camera.up();

        self.planes[Self::LEFT] = Plane::from_normal_point(right + tx * at, p);
        self.planes[Self::RIGHT] = Plane::from_normal_point(tx * at - right, p);
        self.planes[Self::BOTTOM] = Plane::from_normal_point(up + ty * at, p);
        self.planes[Self::TOP] = Plane::from_normal_point(ty * at - up, p);
        self.planes[Self::FAR] = Plane::from_normal_point(-at, p + max_dist * at);

        let forward = max_dist * at;
        let side = (max_dist * tx) * right;
        let vert = (max_dist * ty) * up;
        self.corners = [
            forward - side - vert,
            forward + side - vert,
            forward - side + vert,
            forward + side + vert,
        ];
        self.max_dist = max_dist;
    }

    /// Current planes, for upload or inspection.
    #[must_use]
    pub const fn planes(&self) -> &[Plane; 5] {
        &self.planes
    }

    /// Far clip distance of the last update.
    #[must_use]
    pub const fn max_dist(&self) -> f32 {
        self.max_dist
    }

    /// Tests if a sphere intersects the frustum. Conservative: may accept a
    /// sphere just outside a corner, never rejects one that is inside.
    #[inline]
    #[must_use]
    pub fn is_visible(&self, p: Vec3, radius: f32) -> bool {
        let radius = cull_radius(radius);
        self.planes.iter().all(|plane| plane.distance(p) >= -radius)
    }

    /// Tests if the vertical column over `(x, y)`, spanning the whole world
    /// height and widened by `radius`, intersects the frustum.
    #[inline]
    #[must_use]
    pub fn is_visible_cell(&self, x: f32, y: f32, radius: f32) -> bool {
        let radius = cull_radius(radius);
        self.planes.iter().all(|plane| {
            plane.a * x + plane.b * y + plane.c.abs() * Orbis::DIM_Z + plane.d >= -radius
        })
    }

    /// Cells the frustum may touch when the eye is at `eye`, widened by
    /// `margin` world units and clamped to the grid.
    ///
    /// A zero far plane degenerates to the single cell holding the eye.
    #[must_use]
    pub fn get_extremes(&self, orbis: &Orbis, eye: Vec3, margin: f32) -> Span {
        if self.max_dist <= 0.0 {
            return orbis.get_inters(eye, 0.0);
        }

        let mut min = eye;
        let mut max = eye;
        for &corner in &self.corners {
            let p = eye + corner;
            min = min.min(p);
            max = max.max(p);
        }
        orbis.get_inters_area(min.x, min.y, max.x, max.y, cull_radius(margin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(max_dist: f32) -> Camera {
        let mut camera = Camera::new(800, 600);
        camera.max_dist = max_dist;
        camera
    }

    #[test]
    fn test_plane_normalization() {
        let plane = Plane::from_normal_point(Vec3::new(3.0, 4.0, 0.0), Vec3::ZERO);

        // 3-4-5 triangle, so length is 5
        assert!((plane.a - 0.6).abs() < 0.001);
        assert!((plane.b - 0.8).abs() < 0.001);
        assert_eq!(plane.d, 0.0);
    }

    #[test]
    fn test_sphere_in_front() {
        let mut frustum = Frustum::new();
        frustum.update(&camera(100.0));

        assert!(frustum.is_visible(Vec3::new(0.0, 50.0, 0.0), 0.0));
        assert!(!frustum.is_visible(Vec3::new(0.0, -50.0, 0.0), 1.0));
        assert!(!frustum.is_visible(Vec3::new(0.0, 150.0, 0.0), 1.0));
        // straddles the far plane
        assert!(frustum.is_visible(Vec3::new(0.0, 105.0, 0.0), 10.0));
        // far off to the side
        assert!(!frustum.is_visible(Vec3::new(-90.0, 10.0, 0.0), 1.0));
    }

    #[test]
    fn test_degenerate_radius_is_point_test() {
        let mut frustum = Frustum::new();
        frustum.update(&camera(100.0));

        let behind = Vec3::new(0.0, -2.0, 0.0);
        assert!(!frustum.is_visible(behind, f32::NAN));
        assert!(!frustum.is_visible(behind, -5.0));
        assert!(frustum.is_visible(behind, 5.0));
    }

    #[test]
    fn test_cell_column_spans_world_height() {
        let mut cam = camera(100.0);
        cam.p = Vec3::new(0.0, 0.0, 0.0);
        cam.set_orientation(0.0, 1.2);

        let mut frustum = Frustum::new();
        frustum.update(&cam);

        // A point on the ground ahead is below the view, but its column is not.
        assert!(!frustum.is_visible(Vec3::new(0.0, 20.0, 0.0), 0.0));
        assert!(frustum.is_visible_cell(0.0, 20.0, 0.0));

        frustum.update(&camera(100.0));
        assert!(frustum.is_visible_cell(0.0, 20.0, 0.0));
        assert!(!frustum.is_visible_cell(0.0, -40.0, 0.0));
        assert!(frustum.is_visible_cell(0.0, -40.0, 50.0));
    }

    #[test]
    fn test_extremes_cover_frustum() {
        let orbis = Orbis::with_cells(64);
        let cam = camera(100.0);

        let mut frustum = Frustum::new();
        frustum.update(&cam);

        let span = frustum.get_extremes(&orbis, cam.p, 0.0);
        assert_eq!(span.min_y, 32);
        assert_eq!(span.max_y, 38);
        assert!(span.min_x < 32 && span.max_x > 32);

        // every visible sample lies in a spanned cell
        let margin = 8.0;
        let span = frustum.get_extremes(&orbis, cam.p, margin);
        for i in -60..=60 {
            for j in -20..=60 {
                #[allow(clippy::cast_precision_loss)]
                let p = Vec3::new(i as f32 * 4.0, j as f32 * 4.0, 0.0);
                if frustum.is_visible(p, 1.0) {
                    let (x, y) = orbis.cell_coords(p.x, p.y);
                    assert!(span.contains(x, y), "{p:?} outside {span:?}");
                }
            }
        }
    }

    #[test]
    fn test_zero_far_plane_is_single_cell() {
        let orbis = Orbis::with_cells(16);
        let cam = camera(0.0);

        let mut frustum = Frustum::new();
        frustum.update(&cam);

        let span = frustum.get_extremes(&orbis, cam.p, 1000.0);
        assert_eq!(span.cell_count(), 1);
        assert!(span.contains(8, 8));
    }
}
