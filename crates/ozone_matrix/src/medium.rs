//! Ambient media a point in the world can be in.

use std::ops::{BitOr, BitOrAssign};

/// Bit set of media. The empty set is plain air.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Medium(u32);

impl Medium {
    /// Air.
    pub const AIR: Self = Self(0);
    /// Water.
    pub const WATER_BIT: Self = Self(0x01);
    /// Lava.
    pub const LAVA_BIT: Self = Self(0x02);
    /// The terrain's global liquid (below sea level) rather than a structure's.
    pub const SEA_BIT: Self = Self(0x04);
    /// Any liquid.
    pub const LIQUID_MASK: Self = Self(Self::WATER_BIT.0 | Self::LAVA_BIT.0);

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// True if every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if any bit of `other` is set.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// True for plain air.
    #[must_use]
    pub const fn is_air(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Medium {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Medium {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}
