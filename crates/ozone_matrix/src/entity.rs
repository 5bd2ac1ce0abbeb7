//! Structures, objects and fragments.

use ozone_core::Vec3;

use crate::medium::Medium;

/// Index of a structure slot in [`crate::Orbis`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructId(pub u16);

impl StructId {
    /// Slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of an object slot in [`crate::Orbis`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

impl ObjectId {
    /// Slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a fragment slot in [`crate::Orbis`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragId(pub u32);

impl FragId {
    /// Slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A large static world piece (building, bridge, terrain block).
#[derive(Clone, Debug, PartialEq)]
pub struct Struct {
    /// Minimum corner of the bounding box.
    pub mins: Vec3,
    /// Maximum corner of the bounding box.
    pub maxs: Vec3,
    /// Liquid filling the structure's volume, `Medium::AIR` if dry.
    pub liquid: Medium,
    /// Fog colour when the camera is inside the structure's water.
    pub water_fog_colour: [f32; 4],
    /// Fog colour when the camera is inside the structure's lava.
    pub lava_fog_colour: [f32; 4],
}

impl Struct {
    /// Creates a dry structure with the given bounds.
    #[must_use]
    pub fn new(mins: Vec3, maxs: Vec3) -> Self {
        Self {
            mins: mins.min(maxs),
            maxs: mins.max(maxs),
            liquid: Medium::AIR,
            water_fog_colour: [0.00, 0.05, 0.25, 1.0],
            lava_fog_colour: [0.30, 0.20, 0.00, 1.0],
        }
    }

    /// Fills the structure's volume with liquid.
    #[must_use]
    pub fn with_liquid(mut self, liquid: Medium) -> Self {
        self.liquid = liquid;
        self
    }

    /// Full extent of the bounding box.
    #[inline]
    #[must_use]
    pub fn dim(&self) -> Vec3 {
        self.maxs - self.mins
    }

    /// Centre of the bounding box.
    #[inline]
    #[must_use]
    pub fn centre(&self) -> Vec3 {
        self.mins + 0.5 * self.dim()
    }

    /// Bounding radius used for culling: the approximate length of the full
    /// diagonal, twice what a tight sphere needs.
    #[inline]
    #[must_use]
    pub fn radius(&self) -> f32 {
        self.dim().fast_length()
    }

    /// True if `p` lies inside the bounding box.
    #[must_use]
    pub fn contains(&self, p: Vec3) -> bool {
        self.mins.x <= p.x
            && p.x <= self.maxs.x
            && self.mins.y <= p.y
            && p.y <= self.maxs.y
            && self.mins.z <= p.z
            && p.z <= self.maxs.z
    }
}

/// A transient event raised on an object during the last simulation tick.
///
/// Ids `>= 0` are gameplay events (use, damage, hit, ...). Negative ids are
/// audio/visual triggers consumed by the effects scan.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObjectEvent {
    /// Event id.
    pub id: i32,
    /// Source intensity, 1.0 for a standard trigger.
    pub intensity: f32,
}

/// A dynamic world entity (creature, item, vehicle).
#[derive(Clone, Debug, PartialEq)]
pub struct Object {
    /// Centre position.
    pub p: Vec3,
    /// Half-extents of the bounding box.
    pub dim: Vec3,
    /// `*_BIT` flags.
    pub flags: u32,
    /// Events raised since the last [`Object::clear_events`].
    pub events: Vec<ObjectEvent>,
}

impl Object {
    /// Object takes part in collisions.
    pub const SOLID_BIT: u32 = 0x0000_0001;
    /// Object's visual extent exceeds its bounds (particle emitters, lights).
    pub const WIDE_CULL_BIT: u32 = 0x0000_0004;

    /// Largest half-extent any object may have.
    pub const MAX_DIM: f32 = 4.0;

    /// Camera flash trigger.
    pub const EVENT_FLASH: i32 = -1;
    /// Camera shake trigger.
    pub const EVENT_SHAKE: i32 = -2;

    /// Creates a solid object with no events.
    #[must_use]
    pub fn new(p: Vec3, dim: Vec3) -> Self {
        Self {
            p,
            dim,
            flags: Self::SOLID_BIT,
            events: Vec::new(),
        }
    }

    /// Adds flags.
    #[must_use]
    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags |= flags;
        self
    }

    /// Approximate length of the half-extent.
    #[inline]
    #[must_use]
    pub fn radius(&self) -> f32 {
        self.dim.fast_length()
    }

    /// True if any of `flags` is set.
    #[inline]
    #[must_use]
    pub const fn has_flag(&self, flags: u32) -> bool {
        self.flags & flags != 0
    }

    /// Raises an event.
    pub fn add_event(&mut self, id: i32, intensity: f32) {
        self.events.push(ObjectEvent { id, intensity });
    }

    /// Drops all events; called by the simulation at the start of a tick.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}

/// A small short-lived visual particle or debris piece.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frag {
    /// Position.
    pub p: Vec3,
    /// Velocity.
    pub velocity: Vec3,
}

impl Frag {
    /// Radius used for culling every fragment.
    pub const RADIUS: f32 = 1.0;

    /// Creates a fragment.
    #[must_use]
    pub const fn new(p: Vec3, velocity: Vec3) -> Self {
        Self { p, velocity }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_struct_bounds_are_normalised() {
        let s = Struct::new(Vec3::new(10.0, 0.0, 5.0), Vec3::new(0.0, 10.0, -5.0));
        assert_eq!(s.mins, Vec3::new(0.0, 0.0, -5.0));
        assert_eq!(s.maxs, Vec3::new(10.0, 10.0, 5.0));
        assert_eq!(s.centre(), Vec3::new(5.0, 5.0, 0.0));
        assert!(s.contains(Vec3::new(1.0, 9.0, 0.0)));
        assert!(!s.contains(Vec3::new(11.0, 9.0, 0.0)));
    }

    #[test]
    fn test_object_flags_and_events() {
        let mut obj = Object::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 1.0)).with_flags(Object::WIDE_CULL_BIT);
        assert!(obj.has_flag(Object::WIDE_CULL_BIT));
        assert!(obj.has_flag(Object::SOLID_BIT));

        obj.add_event(Object::EVENT_FLASH, 1.0);
        obj.add_event(3, 0.5);
        assert_eq!(obj.events.len(), 2);
        obj.clear_events();
        assert!(obj.events.is_empty());
    }
}
