//! Collider queries the render core consumes.
//!
//! The render core only asks one question of the collider: which medium does
//! a (possibly zero-length) sweep end in. Collision resolution belongs to the
//! simulation; [`OrbisCollider`] answers the medium query against the world
//! grid and reports an unobstructed sweep.

use ozone_core::Vec3;

use crate::entity::StructId;
use crate::medium::Medium;
use crate::orbis::Orbis;

/// Result of a sweep.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    /// Media the sweep ends in.
    pub medium: Medium,
    /// Structure whose liquid volume contains the end point, if any.
    pub medium_struct: Option<StructId>,
    /// Fraction of the requested movement completed, in `[0, 1]`.
    pub ratio: f32,
}

impl Default for Hit {
    fn default() -> Self {
        Self {
            medium: Medium::AIR,
            medium_struct: None,
            ratio: 1.0,
        }
    }
}

/// Sweep test against the world.
pub trait Collider {
    /// Sweeps a point from `from` by `delta`.
    fn translate(&self, orbis: &Orbis, from: Vec3, delta: Vec3) -> Hit;
}

/// Medium-only collider over the world grid.
#[derive(Clone, Copy, Debug, Default)]
pub struct OrbisCollider;

impl Collider for OrbisCollider {
    fn translate(&self, orbis: &Orbis, from: Vec3, delta: Vec3) -> Hit {
        let p = from + delta;
        let mut hit = Hit::default();

        if p.z < 0.0 {
            hit.medium |= Medium::SEA_BIT | orbis.terra.liquid;
        }

        for &id in &orbis.get_cell(p).structs {
            let Some(str_) = orbis.struct_(id) else {
                continue;
            };
            if str_.liquid.intersects(Medium::LIQUID_MASK) && str_.contains(p) {
                hit.medium |= str_.liquid;
                hit.medium_struct = Some(id);
                break;
            }
        }
        hit
    }
}
