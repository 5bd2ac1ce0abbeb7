//! Seeded demo world and a tiny simulation that keeps it moving.

use ozone_core::Vec3;
use ozone_matrix::{Frag, Medium, Object, ObjectId, Orbis, Struct};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Chance per tick that some mover raises a flash or shake.
const EVENT_CHANCE: f64 = 0.05;

/// What to put into the world.
#[derive(Clone, Copy, Debug)]
pub struct DemoSettings {
    /// Cells per axis.
    pub cells: i32,
    /// Buildings.
    pub buildings: usize,
    /// Water pools.
    pub pools: usize,
    /// Objects.
    pub objects: usize,
    /// Fragments.
    pub frags: usize,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            cells: 64,
            buildings: 400,
            pools: 12,
            objects: 8_000,
            frags: 1_000,
        }
    }
}

/// Builds a deterministic world from `seed`.
pub fn build(seed: u64, settings: &DemoSettings) -> Orbis {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut orbis = Orbis::with_cells(settings.cells.max(1));
    let dim = orbis.dim();
    let inner = (dim - 32.0).max(1.0);

    for _ in 0..settings.buildings {
        let mins = Vec3::new(rng.gen_range(-inner..inner), rng.gen_range(-inner..inner), 0.0);
        let size = Vec3::new(rng.gen_range(6.0..30.0), rng.gen_range(6.0..30.0), rng.gen_range(8.0..60.0));
        orbis.add_struct(Struct::new(mins, mins + size));
    }

    for _ in 0..settings.pools {
        let mins = Vec3::new(rng.gen_range(-inner..inner), rng.gen_range(-inner..inner), -4.0);
        let size = Vec3::new(rng.gen_range(10.0..24.0), rng.gen_range(10.0..24.0), 4.0);
        orbis.add_struct(Struct::new(mins, mins + size).with_liquid(Medium::WATER_BIT));
    }

    for i in 0..settings.objects {
        let p = Vec3::new(rng.gen_range(-dim..dim), rng.gen_range(-dim..dim), rng.gen_range(0.0..4.0));
        let half = Vec3::new(rng.gen_range(0.3..2.0), rng.gen_range(0.3..2.0), rng.gen_range(0.5..2.0));
        let mut obj = Object::new(p, half);
        if i % 50 == 0 {
            obj = obj.with_flags(Object::WIDE_CULL_BIT);
        }
        orbis.add_object(obj);
    }

    for _ in 0..settings.frags {
        let p = Vec3::new(rng.gen_range(-dim..dim), rng.gen_range(-dim..dim), rng.gen_range(0.0..20.0));
        let velocity = Vec3::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..0.0));
        orbis.add_frag(Frag::new(p, velocity));
    }

    tracing::info!(
        cells = settings.cells,
        structs = settings.buildings + settings.pools,
        objects = settings.objects,
        frags = settings.frags,
        seed,
        "demo world built"
    );
    orbis
}

/// Random walkers and the occasional explosion.
pub struct Simulation {
    rng: ChaCha8Rng,
    movers: Vec<ObjectId>,
}

impl Simulation {
    /// Picks every eighth object of `orbis` as a mover.
    pub fn new(seed: u64, orbis: &Orbis) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed.wrapping_add(1)),
            movers: orbis.objects().map(|(id, _)| id).step_by(8).collect(),
        }
    }

    /// Advances the world by one tick.
    pub fn tick(&mut self, orbis: &mut Orbis) {
        orbis.update();

        let limit = orbis.dim() - 1.0;
        for &id in &self.movers {
            let Some(p) = orbis.object(id).map(|o| o.p) else {
                continue;
            };
            let x = (p.x + self.rng.gen_range(-0.5..0.5)).clamp(-limit, limit);
            let y = (p.y + self.rng.gen_range(-0.5..0.5)).clamp(-limit, limit);
            orbis.move_object(id, Vec3::new(x, y, p.z));
        }

        if self.movers.is_empty() || !self.rng.gen_bool(EVENT_CHANCE) {
            return;
        }
        let id = self.movers[self.rng.gen_range(0..self.movers.len())];
        let event = if self.rng.gen_bool(0.5) {
            Object::EVENT_FLASH
        } else {
            Object::EVENT_SHAKE
        };
        let intensity = self.rng.gen_range(10.0..200.0);
        if let Some(obj) = orbis.object_mut(id) {
            obj.add_event(event, intensity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> DemoSettings {
        DemoSettings {
            cells: 8,
            buildings: 4,
            pools: 1,
            objects: 64,
            frags: 8,
        }
    }

    #[test]
    fn test_build_is_deterministic() {
        let a = build(5, &small());
        let b = build(5, &small());

        let pa: Vec<_> = a.objects().map(|(_, o)| o.p).collect();
        let pb: Vec<_> = b.objects().map(|(_, o)| o.p).collect();
        assert_eq!(pa, pb);
        assert_eq!(a.structs().count(), 5);
    }

    #[test]
    fn test_tick_keeps_movers_inside() {
        let mut orbis = build(9, &small());
        let mut sim = Simulation::new(9, &orbis);

        for _ in 0..500 {
            sim.tick(&mut orbis);
        }
        let dim = orbis.dim();
        assert!(orbis.objects().all(|(_, o)| o.p.x.abs() <= dim && o.p.y.abs() <= dim));
    }
}
