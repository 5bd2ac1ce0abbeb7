//! Camera effects from nearby object events.
//!
//! Objects raise negative-id events for audio/visual triggers. Once per frame
//! the [`EffectsWorker`] scans the cells around the camera, attenuates each
//! trigger by inverse squared distance, caps it at 1 and sums flashes and
//! shakes separately.

mod worker;

pub use worker::EffectsWorker;

use ozone_core::Vec3;
use ozone_matrix::{Object, Orbis};

/// Accumulated camera effects of one scan.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EffectsScan {
    /// Flash intensity.
    pub flash: f32,
    /// Shake intensity.
    pub shake: f32,
}

/// Sums the camera effects of all objects within `distance` cells of `eye`.
#[must_use]
pub fn scan_effects(orbis: &Orbis, eye: Vec3, distance: f32) -> EffectsScan {
    let mut scan = EffectsScan::default();
    let span = orbis.get_inters(eye, distance);

    for (x, y) in span.cells() {
        for &id in &orbis.cell(x, y).objects {
            let Some(obj) = orbis.object(id) else {
                continue;
            };

            let dist2 = (obj.p - eye).length_squared();
            let attenuation = if dist2 > 1.0 { 1.0 / dist2 } else { 1.0 };

            for event in obj.events.iter().filter(|e| e.id < 0) {
                let intensity = (event.intensity * attenuation).min(1.0);

                if event.id == Object::EVENT_FLASH {
                    scan.flash += intensity;
                } else {
                    scan.shake += intensity;
                }
            }
        }
    }
    scan
}
