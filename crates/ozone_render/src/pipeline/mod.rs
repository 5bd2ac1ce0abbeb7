//! Render scheduling.
//!
//! [`RenderScheduler::prepare_draw`] resolves fog, culls the world in two
//! levels (cell columns, then entities) and sorts the draw lists;
//! [`RenderScheduler::draw_geometry`] consumes them in pass order.
//!
//! ```text
//! prepare_draw:  medium/fog → wind → frustum → visited mask → cells → sort
//! draw_geometry: clear → [caelum] → structs solid ↑ → terra → objects solid ↑
//!                → frags → objects alpha ↓ → water → structs alpha ↓
//!                → clear lists
//! ```
//!
//! `↑` is front-to-back, `↓` back-to-front. The sky is skipped below ground
//! level and inside liquids.

mod draw_list;
mod stats;

pub use draw_list::{DrawEntry, DrawList, DrawRef};
pub use stats::RenderStats;

use std::time::Instant;

use ozone_core::{mix, Bitset, Vec3, TAU};
use ozone_matrix::{Cell, Collider, Frag, FragId, Medium, Object, Orbis, Span, StructId};

use crate::camera::Camera;
use crate::config::RenderConfig;
use crate::culling::Frustum;
use crate::gpu::{DrawSink, GpuDevice, MeshPass};

/// Visibility inside water, world units.
pub const WATER_VISIBILITY: f32 = 32.0;
/// Visibility inside lava, world units.
pub const LAVA_VISIBILITY: f32 = 4.0;
/// Wind phase advance per frame, radians.
pub const WIND_PHI_INC: f32 = 0.04;
/// Wind amplitude passed to the vegetation shaders.
pub const WIND_FACTOR: f32 = 0.0008;
/// Fragments further than this along the view axis are not drawn.
pub const FRAG_VISIBILITY_RANGE: f32 = 150.0;

/// Radius of a cell column that still catches a maximal wide-culled object
/// standing at the cell's edge.
#[must_use]
pub fn cell_wide_radius(wide_cull_factor: f32) -> f32 {
    (Cell::SIZE / 2.0 + Object::MAX_DIM * wide_cull_factor) * std::f32::consts::SQRT_2
}

/// Fog parameters for the current frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fog {
    /// Clear and fog colour.
    pub colour: [f32; 4],
    /// Fog end distance; also the far clip distance.
    pub visibility: f32,
    /// Medium the camera is in.
    pub medium: Medium,
}

/// Per-frame visibility culling and draw list construction.
#[derive(Debug)]
pub struct RenderScheduler {
    frustum: Frustum,
    /// Structures already visited this frame.
    drawn_structs: Bitset,
    structs: DrawList,
    objects: DrawList,
    /// Fragments in cell order.
    frags: Vec<FragId>,
    visibility_range: f32,
    wide_cull_factor: f32,
    cell_wide_radius: f32,
    visibility_coefficient: f32,
    fog: Fog,
    /// Camera above ground and out of liquid at the last `prepare_draw`.
    sky_visible: bool,
    /// Draw the sky without stars.
    low_detail: bool,
    wind_phi: f32,
    span: Span,
}

impl RenderScheduler {
    /// Creates a scheduler with draw lists sized for a typical scene.
    #[must_use]
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            frustum: Frustum::new(),
            drawn_structs: Bitset::new(0),
            structs: DrawList::with_capacity(64),
            objects: DrawList::with_capacity(8192),
            frags: Vec::with_capacity(1024),
            visibility_range: config.distance,
            wide_cull_factor: config.wide_cull_factor,
            cell_wide_radius: cell_wide_radius(config.wide_cull_factor),
            visibility_coefficient: config.visibility_coefficient,
            fog: Fog {
                colour: [0.0, 0.0, 0.0, 1.0],
                visibility: config.distance,
                medium: Medium::AIR,
            },
            sky_visible: false,
            low_detail: config.low_detail,
            wind_phi: 0.0,
            span: Span::new(0, 0, -1, -1),
        }
    }

    /// Frustum of the last [`RenderScheduler::prepare_draw`].
    #[must_use]
    pub const fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    /// Staged structures, ascending distance after `prepare_draw`.
    #[must_use]
    pub const fn structs(&self) -> &DrawList {
        &self.structs
    }

    /// Staged objects, ascending distance after `prepare_draw`.
    #[must_use]
    pub const fn objects(&self) -> &DrawList {
        &self.objects
    }

    /// Staged fragments in cell order.
    #[must_use]
    pub fn frags(&self) -> &[FragId] {
        &self.frags
    }

    /// Fog of the last `prepare_draw`.
    #[must_use]
    pub const fn fog(&self) -> Fog {
        self.fog
    }

    /// True if the last `prepare_draw` left the sky to be drawn.
    #[must_use]
    pub const fn sky_visible(&self) -> bool {
        self.sky_visible
    }

    /// Wind phase, always in `[0, TAU)`.
    #[must_use]
    pub const fn wind_phi(&self) -> f32 {
        self.wind_phi
    }

    /// Cell span visited by the last `prepare_draw`.
    #[must_use]
    pub const fn span(&self) -> Span {
        self.span
    }

    /// Column radius used for the cell-level cull.
    #[must_use]
    pub const fn cell_radius(&self) -> f32 {
        self.cell_wide_radius
    }

    fn resolve_medium(&mut self, orbis: &Orbis, collider: &dyn Collider, camera: &Camera) {
        let hit = collider.translate(orbis, camera.p, Vec3::ZERO);

        let terra = &orbis.terra;
        let terra_visibility = if terra.liquid.contains(Medium::WATER_BIT) {
            WATER_VISIBILITY
        } else {
            LAVA_VISIBILITY
        };

        let (mut colour, mut visibility) = if camera.p.z < 0.0 {
            (terra.liquid_fog_colour, terra_visibility)
        } else {
            (orbis.caelum.colour, self.visibility_range)
        };

        if hit.medium.intersects(Medium::LIQUID_MASK) {
            if let Some(str_) = hit.medium_struct.and_then(|id| orbis.struct_(id)) {
                if hit.medium.contains(Medium::SEA_BIT) {
                    colour = terra.liquid_fog_colour;
                    visibility = terra_visibility;
                } else if hit.medium.contains(Medium::WATER_BIT) {
                    colour = str_.water_fog_colour;
                    visibility = WATER_VISIBILITY;
                } else {
                    colour = str_.lava_fog_colour;
                    visibility = LAVA_VISIBILITY;
                }
            }
        }

        if hit.medium.contains(Medium::WATER_BIT) {
            let caelum = &orbis.caelum;
            let ratio = mix(caelum.night_luminance, 1.0, caelum.ratio);
            for c in &mut colour[..3] {
                *c *= ratio;
            }
        }

        if camera.night_vision {
            colour = [0.0, colour[0] + colour[1] + colour[2], 0.0, colour[3]];
        }

        self.fog = Fog {
            colour,
            visibility,
            medium: hit.medium,
        };
        self.sky_visible = camera.p.z >= 0.0 && !hit.medium.intersects(Medium::LIQUID_MASK);
    }

    /// Culls the world around the camera and builds sorted draw lists.
    ///
    /// Sets `camera.max_dist` to the resolved visibility.
    pub fn prepare_draw(
        &mut self,
        orbis: &Orbis,
        collider: &dyn Collider,
        camera: &mut Camera,
        stats: &mut RenderStats,
    ) {
        let begin = Instant::now();

        self.resolve_medium(orbis, collider, camera);
        self.wind_phi = (self.wind_phi + WIND_PHI_INC).rem_euclid(TAU);

        camera.max_dist = self.fog.visibility;
        self.frustum.update(camera);
        self.span = self.frustum.get_extremes(orbis, camera.p, self.cell_wide_radius);

        self.drawn_structs.ensure_len(orbis.struct_slots());
        self.drawn_structs.clear_all();

        // leftovers of a frame that was prepared but never drawn
        self.structs.clear();
        self.objects.clear();
        self.frags.clear();

        for (x, y) in self.span.cells() {
            let (cx, cy) = orbis.cell_centre(x, y);

            if self.frustum.is_visible_cell(cx, cy, self.cell_wide_radius) {
                self.schedule_cell(orbis, camera, x, y);
                stats.cells_scheduled += 1;
            } else {
                stats.cells_culled += 1;
            }
        }

        self.structs.sort();
        self.objects.sort();

        stats.structs_staged += self.structs.len() as u64;
        stats.objects_staged += self.objects.len() as u64;
        stats.frags_staged += self.frags.len() as u64;
        stats.prepare_micros += RenderStats::micros(begin.elapsed());

        tracing::trace!(
            structs = self.structs.len(),
            objects = self.objects.len(),
            frags = self.frags.len(),
            span = ?self.span,
            "prepare_draw"
        );
    }

    /// Stages the visible entities of cell `(x, y)`.
    ///
    /// The frustum must have been updated for this frame. A structure spanning
    /// several cells is staged at most once between two `prepare_draw` calls.
    pub fn schedule_cell(&mut self, orbis: &Orbis, camera: &Camera, x: i32, y: i32) {
        let cell = orbis.cell(x, y);
        let eye = camera.p;

        if self.drawn_structs.len() < orbis.struct_slots() {
            self.drawn_structs.ensure_len(orbis.struct_slots());
        }

        for &id in &cell.structs {
            if self.drawn_structs.test_and_set(id.index()) {
                continue;
            }
            let Some(str_) = orbis.struct_(id) else {
                continue;
            };

            let p = str_.centre();
            if self.frustum.is_visible(p, str_.radius()) {
                self.structs.push((p - eye).fast_length(), DrawRef::Struct(id));
            }
        }

        for &id in &cell.objects {
            let Some(obj) = orbis.object(id) else {
                continue;
            };

            let mut radius = obj.radius();
            if obj.has_flag(Object::WIDE_CULL_BIT) {
                radius *= self.wide_cull_factor;
            }

            if self.frustum.is_visible(obj.p, radius) {
                let distance = (obj.p - eye).fast_length();

                // radius / (distance * mag) >= coefficient, without dividing by zero
                if radius >= self.visibility_coefficient * distance * camera.mag {
                    self.objects.push(distance, DrawRef::Object(id));
                }
            }
        }

        let at = camera.at();
        for &id in &cell.frags {
            let Some(frag) = orbis.frag(id) else {
                continue;
            };

            let ahead = (frag.p - eye).dot(at);
            if (0.0..=FRAG_VISIBILITY_RANGE).contains(&ahead) && self.frustum.is_visible(frag.p, Frag::RADIUS) {
                self.frags.push(id);
            }
        }
    }

    /// True if structure `id` was visited since the last `prepare_draw`.
    #[must_use]
    pub fn is_visited(&self, id: StructId) -> bool {
        self.drawn_structs.get(id.index())
    }

    /// Issues the staged draws in pass order and clears the lists.
    pub fn draw_geometry<D: GpuDevice + ?Sized>(
        &mut self,
        device: &mut D,
        sink: &mut dyn DrawSink,
        stats: &mut RenderStats,
    ) {
        let begin = Instant::now();

        device.clear(self.fog.colour);

        if self.sky_visible {
            sink.draw_caelum(!self.low_detail);
        }

        for entry in &self.structs {
            entry.issue(sink, MeshPass::Solid);
        }

        sink.draw_terra();

        for entry in &self.objects {
            entry.issue(sink, MeshPass::Solid);
        }

        for &id in &self.frags {
            sink.draw_frag(id);
        }

        for entry in self.objects.iter().rev() {
            entry.issue(sink, MeshPass::Alpha);
        }

        sink.draw_water();

        for entry in self.structs.iter().rev() {
            entry.issue(sink, MeshPass::Alpha);
        }

        self.structs.clear();
        self.objects.clear();
        self.frags.clear();

        stats.geometry_micros += RenderStats::micros(begin.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::{DrawCall, DrawRecorder, HeadlessDevice};
    use ozone_matrix::{OrbisCollider, Struct};

    fn setup() -> (RenderScheduler, Camera, RenderStats) {
        let scheduler = RenderScheduler::new(&RenderConfig::default());
        let camera = Camera::new(800, 600);
        (scheduler, camera, RenderStats::default())
    }

    #[test]
    fn test_cell_wide_radius() {
        let r = cell_wide_radius(6.0);
        assert!((r - 32.0 * std::f32::consts::SQRT_2).abs() < 1e-4);
    }

    #[test]
    fn test_wind_phase_wraps() {
        let (mut scheduler, mut camera, mut stats) = setup();
        let orbis = Orbis::with_cells(4);

        for _ in 0..200 {
            scheduler.prepare_draw(&orbis, &OrbisCollider, &mut camera, &mut stats);
            assert!((0.0..TAU).contains(&scheduler.wind_phi()));
        }
        let expected = (200.0 * WIND_PHI_INC).rem_euclid(TAU);
        assert!((scheduler.wind_phi() - expected).abs() < 1e-3);
    }

    #[test]
    fn test_air_fog() {
        let (mut scheduler, mut camera, mut stats) = setup();
        let orbis = Orbis::with_cells(4);
        camera.p = Vec3::new(0.0, 0.0, 10.0);

        scheduler.prepare_draw(&orbis, &OrbisCollider, &mut camera, &mut stats);
        let fog = scheduler.fog();
        assert_eq!(fog.colour, orbis.caelum.colour);
        assert_eq!(fog.visibility, 350.0);
        assert_eq!(camera.max_dist, 350.0);
        assert!(fog.medium.is_air());
    }

    #[test]
    fn test_underwater_fog_is_tinted() {
        let (mut scheduler, mut camera, mut stats) = setup();
        let mut orbis = Orbis::with_cells(4);
        orbis.caelum.ratio = 0.0;
        orbis.caelum.night_luminance = 0.5;
        camera.p = Vec3::new(0.0, 0.0, -5.0);

        scheduler.prepare_draw(&orbis, &OrbisCollider, &mut camera, &mut stats);
        let fog = scheduler.fog();
        let base = orbis.terra.liquid_fog_colour;
        assert_eq!(fog.visibility, WATER_VISIBILITY);
        assert!((fog.colour[2] - base[2] * 0.5).abs() < 1e-6);
        assert_eq!(fog.colour[3], base[3]);
    }

    #[test]
    fn test_lava_pool_fog() {
        let (mut scheduler, mut camera, mut stats) = setup();
        let mut orbis = Orbis::with_cells(4);
        let pool = Struct::new(Vec3::new(-8.0, -8.0, 0.0), Vec3::new(8.0, 8.0, 8.0)).with_liquid(Medium::LAVA_BIT);
        let lava_colour = pool.lava_fog_colour;
        orbis.add_struct(pool);
        camera.p = Vec3::new(0.0, 0.0, 4.0);

        scheduler.prepare_draw(&orbis, &OrbisCollider, &mut camera, &mut stats);
        assert_eq!(scheduler.fog().colour, lava_colour);
        assert_eq!(scheduler.fog().visibility, LAVA_VISIBILITY);
    }

    #[test]
    fn test_night_vision_fog() {
        let (mut scheduler, mut camera, mut stats) = setup();
        let mut orbis = Orbis::with_cells(4);
        orbis.caelum.colour = [0.1, 0.2, 0.3, 1.0];
        camera.p = Vec3::new(0.0, 0.0, 10.0);
        camera.night_vision = true;

        scheduler.prepare_draw(&orbis, &OrbisCollider, &mut camera, &mut stats);
        let fog = scheduler.fog().colour;
        assert_eq!(fog[0], 0.0);
        assert!((fog[1] - 0.6).abs() < 1e-6);
        assert_eq!(fog[2], 0.0);
    }

    #[test]
    fn test_frags_forward_range() {
        let (mut scheduler, mut camera, mut stats) = setup();
        let mut orbis = Orbis::with_cells(32);
        let near = orbis.add_frag(Frag::new(Vec3::new(0.0, 20.0, 0.0), Vec3::ZERO));
        let far = orbis.add_frag(Frag::new(Vec3::new(0.0, 200.0, 0.0), Vec3::ZERO));
        let behind = orbis.add_frag(Frag::new(Vec3::new(0.0, -20.0, 0.0), Vec3::ZERO));

        scheduler.prepare_draw(&orbis, &OrbisCollider, &mut camera, &mut stats);
        assert_eq!(scheduler.frags(), &[near]);
        assert!(!scheduler.frags().contains(&far));
        assert!(!scheduler.frags().contains(&behind));
    }

    #[test]
    fn test_tiny_object_is_culled() {
        let (mut scheduler, mut camera, mut stats) = setup();
        let mut orbis = Orbis::with_cells(64);
        // radius ~0.17, needs distance <= 0.17 / 0.002 = 86.6
        let near = orbis.add_object(Object::new(Vec3::new(0.0, 50.0, 0.0), Vec3::new(0.1, 0.1, 0.1)));
        let far = orbis.add_object(Object::new(Vec3::new(0.0, 120.0, 0.0), Vec3::new(0.1, 0.1, 0.1)));

        scheduler.prepare_draw(&orbis, &OrbisCollider, &mut camera, &mut stats);
        let staged: Vec<_> = scheduler.objects().iter().map(|e| e.target).collect();
        assert_eq!(staged, vec![DrawRef::Object(near)]);
        assert!(!staged.contains(&DrawRef::Object(far)));

        camera.mag = 0.5;
        scheduler.prepare_draw(&orbis, &OrbisCollider, &mut camera, &mut stats);
        assert_eq!(scheduler.objects().len(), 2);
    }

    #[test]
    fn test_object_at_eye_is_staged() {
        let (mut scheduler, mut camera, mut stats) = setup();
        let mut orbis = Orbis::with_cells(4);
        let id = orbis.add_object(Object::new(Vec3::ZERO, Vec3::ZERO));

        scheduler.prepare_draw(&orbis, &OrbisCollider, &mut camera, &mut stats);
        assert_eq!(scheduler.objects().entries()[0].target, DrawRef::Object(id));
    }

    #[test]
    fn test_draw_geometry_pass_order() {
        let (mut scheduler, mut camera, mut stats) = setup();
        let mut orbis = Orbis::with_cells(32);
        let s = orbis
            .add_struct(Struct::new(Vec3::new(-4.0, 30.0, 0.0), Vec3::new(4.0, 38.0, 8.0)))
            .expect("slot");
        let near = orbis.add_object(Object::new(Vec3::new(0.0, 10.0, 0.0), Vec3::new(1.0, 1.0, 1.0)));
        let far = orbis.add_object(Object::new(Vec3::new(0.0, 20.0, 0.0), Vec3::new(1.0, 1.0, 1.0)));
        let frag = orbis.add_frag(Frag::new(Vec3::new(0.0, 15.0, 0.0), Vec3::ZERO));

        scheduler.prepare_draw(&orbis, &OrbisCollider, &mut camera, &mut stats);

        let mut device = HeadlessDevice::new();
        let mut sink = DrawRecorder::new();
        scheduler.draw_geometry(&mut device, &mut sink, &mut stats);

        assert_eq!(
            sink.calls,
            vec![
                DrawCall::Caelum { stars: true },
                DrawCall::Bsp(s, MeshPass::Solid),
                DrawCall::Terra,
                DrawCall::Imago(near, MeshPass::Solid),
                DrawCall::Imago(far, MeshPass::Solid),
                DrawCall::Frag(frag),
                DrawCall::Imago(far, MeshPass::Alpha),
                DrawCall::Imago(near, MeshPass::Alpha),
                DrawCall::Water,
                DrawCall::Bsp(s, MeshPass::Alpha),
            ]
        );
        assert!(scheduler.structs().is_empty());
        assert!(scheduler.objects().is_empty());
        assert!(scheduler.frags().is_empty());
        assert_eq!(stats.structs_staged, 1);
        assert_eq!(stats.objects_staged, 2);
        assert_eq!(stats.frags_staged, 1);
        assert_eq!(device.calls().len(), 1);
    }

    #[test]
    fn test_no_sky_when_submerged() {
        let (mut scheduler, mut camera, mut stats) = setup();
        let mut orbis = Orbis::with_cells(8);
        let mut device = HeadlessDevice::new();
        let mut sink = DrawRecorder::new();

        camera.p = Vec3::new(0.0, 0.0, -5.0);
        scheduler.prepare_draw(&orbis, &OrbisCollider, &mut camera, &mut stats);
        scheduler.draw_geometry(&mut device, &mut sink, &mut stats);
        assert!(!scheduler.sky_visible());
        assert_eq!(sink.calls, vec![DrawCall::Terra, DrawCall::Water]);

        // above sea level but inside a pool
        let pool = Struct::new(Vec3::new(-8.0, -8.0, 0.0), Vec3::new(8.0, 8.0, 8.0)).with_liquid(Medium::WATER_BIT);
        orbis.add_struct(pool);
        camera.p = Vec3::new(0.0, 0.0, 4.0);
        sink.calls.clear();
        scheduler.prepare_draw(&orbis, &OrbisCollider, &mut camera, &mut stats);
        scheduler.draw_geometry(&mut device, &mut sink, &mut stats);
        assert_eq!(sink.count(|c| matches!(c, DrawCall::Caelum { .. })), 0);
        assert_eq!(sink.count(|c| *c == DrawCall::Water), 1);

        camera.p = Vec3::new(0.0, 0.0, 12.0);
        sink.calls.clear();
        scheduler.prepare_draw(&orbis, &OrbisCollider, &mut camera, &mut stats);
        scheduler.draw_geometry(&mut device, &mut sink, &mut stats);
        assert!(scheduler.sky_visible());
        assert_eq!(sink.calls.first(), Some(&DrawCall::Caelum { stars: true }));
    }

    #[test]
    fn test_low_detail_sky_has_no_stars() {
        let config = RenderConfig {
            low_detail: true,
            ..RenderConfig::default()
        };
        let mut scheduler = RenderScheduler::new(&config);
        let mut camera = Camera::new(800, 600);
        let mut stats = RenderStats::default();
        let orbis = Orbis::with_cells(4);
        let mut device = HeadlessDevice::new();
        let mut sink = DrawRecorder::new();

        camera.p = Vec3::new(0.0, 0.0, 10.0);
        scheduler.prepare_draw(&orbis, &OrbisCollider, &mut camera, &mut stats);
        scheduler.draw_geometry(&mut device, &mut sink, &mut stats);
        assert_eq!(sink.calls.first(), Some(&DrawCall::Caelum { stars: false }));
    }

    #[test]
    fn test_schedule_cell_marks_visited() {
        let (mut scheduler, mut camera, mut stats) = setup();
        let mut orbis = Orbis::with_cells(8);
        let id = orbis
            .add_struct(Struct::new(Vec3::new(-4.0, 4.0, 0.0), Vec3::new(4.0, 12.0, 4.0)))
            .expect("slot");

        scheduler.prepare_draw(&orbis, &OrbisCollider, &mut camera, &mut stats);
        assert!(scheduler.is_visited(id));
        assert_eq!(scheduler.structs().len(), 1);

        // Scheduling the other overlapped cell again in the same frame adds nothing.
        scheduler.schedule_cell(&orbis, &camera, 3, 4);
        scheduler.schedule_cell(&orbis, &camera, 4, 4);
        assert_eq!(scheduler.structs().len(), 1);
    }
}
