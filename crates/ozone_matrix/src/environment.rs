//! Sky and terrain state that affects how the world is lit and fogged.

use crate::medium::Medium;

/// Sky state: day/night cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Caelum {
    /// 1.0 at full day, 0.0 at full night.
    pub ratio: f32,
    /// Luminance multiplier at full night.
    pub night_luminance: f32,
    /// Sky colour (RGBA), used as fog colour in open air.
    pub colour: [f32; 4],
}

impl Default for Caelum {
    fn default() -> Self {
        Self {
            ratio: 1.0,
            night_luminance: 0.25,
            colour: [0.45, 0.60, 0.80, 1.0],
        }
    }
}

/// Terrain state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Terra {
    /// Liquid filling everything below `z = 0`: water or lava.
    pub liquid: Medium,
    /// Fog colour inside that liquid.
    pub liquid_fog_colour: [f32; 4],
}

impl Default for Terra {
    fn default() -> Self {
        Self {
            liquid: Medium::WATER_BIT,
            liquid_fog_colour: [0.00, 0.05, 0.25, 1.0],
        }
    }
}
