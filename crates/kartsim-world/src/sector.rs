//! Sectors and the extra floors stacked inside them.

use bitflags::bitflags;
use kartsim_core::{Fixed, SectorId, SlopeId};

bitflags! {
    /// Extra floor behaviour flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ExtraFloorFlags: u32 {
        /// The slab is present at all.
        const EXISTS = 1 << 0;
        /// Solid to karts.
        const BLOCK_PLAYER = 1 << 1;
        /// Solid to everything that is not a kart.
        const BLOCK_OTHERS = 1 << 2;
        /// Solid to every object.
        const SOLID = Self::BLOCK_PLAYER.bits() | Self::BLOCK_OTHERS.bits();
        /// Liquid volume; never obstructs, marks overlapping objects submerged.
        const SWIMMABLE = 1 << 3;
        /// Passable from below: only ever a floor.
        const PLATFORM = 1 << 4;
        /// Passable from above: only ever a ceiling.
        const REVERSE_PLATFORM = 1 << 5;
        /// Top and bottom are intangible, sides are still solid.
        const INTANGIBLE_FLATS = 1 << 6;
    }
}

/// A slab stacked inside a sector.
///
/// The slab's top is its control sector's ceiling and its bottom is the
/// control sector's floor, both read at query time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtraFloor {
    pub control: SectorId,
    pub flags: ExtraFloorFlags,
}

impl ExtraFloor {
    pub const fn new(control: SectorId, flags: ExtraFloorFlags) -> Self {
        Self { control, flags }
    }

    /// Solid, existing slab.
    pub fn solid(control: SectorId) -> Self {
        Self::new(control, ExtraFloorFlags::EXISTS | ExtraFloorFlags::SOLID)
    }

    #[inline]
    pub fn exists(&self) -> bool {
        self.flags.contains(ExtraFloorFlags::EXISTS)
    }

    /// Check if the slab obstructs an object of the given class.
    #[inline]
    pub fn blocks(&self, kart: bool) -> bool {
        if !self.exists() {
            return false;
        }
        if kart {
            self.flags.contains(ExtraFloorFlags::BLOCK_PLAYER)
        } else {
            self.flags.contains(ExtraFloorFlags::BLOCK_OTHERS)
        }
    }

    #[inline]
    pub fn is_swimmable(&self) -> bool {
        self.exists() && self.flags.contains(ExtraFloorFlags::SWIMMABLE)
    }

    /// Whether the top can support an object, given its gravity direction.
    #[inline]
    pub fn acts_as_floor(&self, flipped: bool) -> bool {
        if flipped {
            !self.flags.contains(ExtraFloorFlags::PLATFORM)
        } else {
            !self.flags.contains(ExtraFloorFlags::REVERSE_PLATFORM)
        }
    }

    /// Whether the bottom can cap an object, given its gravity direction.
    #[inline]
    pub fn acts_as_ceiling(&self, flipped: bool) -> bool {
        if flipped {
            !self.flags.contains(ExtraFloorFlags::REVERSE_PLATFORM)
        } else {
            !self.flags.contains(ExtraFloorFlags::PLATFORM)
        }
    }
}

/// A level region with floor and ceiling heights.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sector {
    pub floor_height: Fixed,
    pub ceiling_height: Fixed,
    pub floor_slope: Option<SlopeId>,
    pub ceiling_slope: Option<SlopeId>,
    pub extra_floors: Vec<ExtraFloor>,
    pub special: u16,
    pub tag: u16,
}

impl Sector {
    pub fn new(floor_height: Fixed, ceiling_height: Fixed) -> Self {
        Self {
            floor_height,
            ceiling_height,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_floor_slope(mut self, slope: SlopeId) -> Self {
        self.floor_slope = Some(slope);
        self
    }

    #[must_use]
    pub fn with_ceiling_slope(mut self, slope: SlopeId) -> Self {
        self.ceiling_slope = Some(slope);
        self
    }

    #[must_use]
    pub fn with_extra_floor(mut self, extra: ExtraFloor) -> Self {
        self.extra_floors.push(extra);
        self
    }

    #[must_use]
    pub fn with_special(mut self, special: u16, tag: u16) -> Self {
        self.special = special;
        self.tag = tag;
        self
    }

    #[inline]
    pub fn is_special(&self) -> bool {
        self.special != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_blocking() {
        let player_only = ExtraFloor::new(
            SectorId::new(1),
            ExtraFloorFlags::EXISTS | ExtraFloorFlags::BLOCK_PLAYER,
        );
        assert!(player_only.blocks(true));
        assert!(!player_only.blocks(false));

        let gone = ExtraFloor::new(SectorId::new(1), ExtraFloorFlags::SOLID);
        assert!(!gone.blocks(true));
    }

    #[test]
    fn platform_swaps_under_reverse_gravity() {
        let platform = ExtraFloor::new(
            SectorId::new(1),
            ExtraFloorFlags::EXISTS | ExtraFloorFlags::SOLID | ExtraFloorFlags::PLATFORM,
        );
        assert!(platform.acts_as_floor(false));
        assert!(!platform.acts_as_ceiling(false));
        assert!(!platform.acts_as_floor(true));
        assert!(platform.acts_as_ceiling(true));
    }
}
