//! Floor and ceiling heights as seen by a particular object.
//!
//! Extra floors form a stack of slabs inside a sector. Whether a slab acts as
//! a floor or a ceiling for an object depends on where the object's centre is
//! relative to the slab's midpoint, on the slab's platform flags (which swap
//! under reversed gravity) and on whether the slab blocks the object's class
//! at all. Callers only see the merged result.

use kartsim_core::{Fixed, LineId, SectorId};

use crate::level::Level;
use crate::sector::{ExtraFloor, ExtraFloorFlags};

/// The object-dependent inputs to a height query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceQuery {
    pub x: Fixed,
    pub y: Fixed,
    /// Bottom of the object.
    pub z: Fixed,
    pub height: Fixed,
    /// Object falls upwards.
    pub flipped: bool,
    /// Object belongs to the player (kart) class.
    pub kart: bool,
}

impl SurfaceQuery {
    /// Same object, different XY.
    #[inline]
    #[must_use]
    pub fn at(self, x: Fixed, y: Fixed) -> Self {
        Self { x, y, ..self }
    }

    #[inline]
    pub fn top(&self) -> Fixed {
        self.z + self.height
    }

    /// True when the object's centre sits above the slab's midpoint, which
    /// makes the slab a floor candidate rather than a ceiling candidate.
    #[inline]
    fn above_midpoint(&self, bottom: Fixed, top: Fixed) -> bool {
        let mid = bottom + (top - bottom).half();
        (self.z - mid).abs() < (self.top() - mid).abs()
    }

    /// Check if the object overlaps the vertical range `bottom..top`.
    #[inline]
    fn overlaps(&self, bottom: Fixed, top: Fixed) -> bool {
        self.z < top && self.top() > bottom
    }
}

/// Merged floor and ceiling at a point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Surface {
    pub floorz: Fixed,
    pub ceilingz: Fixed,
    /// The object overlaps a swimmable slab.
    pub submerged: bool,
}

impl Surface {
    /// Check if an object of `height` fits between floor and ceiling.
    #[inline]
    pub fn admits(&self, height: Fixed) -> bool {
        self.ceilingz - self.floorz >= height
    }
}

/// Vertical gap through a two-sided line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Opening {
    pub top: Fixed,
    pub bottom: Fixed,
    /// Lower of the two base floors, for drop-off checks.
    pub lowfloor: Fixed,
}

impl Opening {
    #[inline]
    pub fn range(&self) -> Fixed {
        self.top - self.bottom
    }
}

impl Level {
    /// Highest floor under the object in `sector`, counting the base floor
    /// and every extra floor that can support it.
    pub fn highest_floor_at(&self, sector: SectorId, query: &SurfaceQuery) -> Fixed {
        let mut floor = self.floor_z_at(sector, query.x, query.y);
        for extra in self.tangible_flats(sector, query.kart) {
            let (bottom, top) = self.slab_at(extra, query.x, query.y);
            if top > floor
                && extra.acts_as_floor(query.flipped)
                && query.above_midpoint(bottom, top)
            {
                floor = top;
            }
        }
        floor
    }

    /// Lowest ceiling over the object in `sector`.
    pub fn lowest_ceiling_at(&self, sector: SectorId, query: &SurfaceQuery) -> Fixed {
        let mut ceiling = self.ceiling_z_at(sector, query.x, query.y);
        for extra in self.tangible_flats(sector, query.kart) {
            let (bottom, top) = self.slab_at(extra, query.x, query.y);
            if bottom < ceiling
                && extra.acts_as_ceiling(query.flipped)
                && !query.above_midpoint(bottom, top)
            {
                ceiling = bottom;
            }
        }
        ceiling
    }

    /// Floor, ceiling and submersion for the object at its query point.
    pub fn surface_at(&self, sector: SectorId, query: &SurfaceQuery) -> Surface {
        let submerged = self
            .sector(sector)
            .extra_floors
            .iter()
            .filter(|extra| extra.is_swimmable())
            .any(|extra| {
                let (bottom, top) = self.slab_at(extra, query.x, query.y);
                query.overlaps(bottom, top)
            });

        Surface {
            floorz: self.highest_floor_at(sector, query),
            ceilingz: self.lowest_ceiling_at(sector, query),
            submerged,
        }
    }

    /// Opening through a two-sided line, evaluated at the point on the line
    /// closest to the object. `None` for one-sided lines.
    pub fn line_opening(&self, line: LineId, query: &SurfaceQuery) -> Option<Opening> {
        let line = self.line(line);
        let back = line.back?;
        let front = line.front;
        let (px, py) = line.segment().closest_point(query.x, query.y);

        let front_floor = self.floor_z_at(front, px, py);
        let back_floor = self.floor_z_at(back, px, py);
        let mut opening = Opening {
            top: self
                .ceiling_z_at(front, px, py)
                .min(self.ceiling_z_at(back, px, py)),
            bottom: front_floor.max(back_floor),
            lowfloor: front_floor.min(back_floor),
        };

        // Slab sides stay solid even when their flats are intangible.
        let slabs = [front, back].into_iter().flat_map(|sector| {
            self.sector(sector)
                .extra_floors
                .iter()
                .filter(|extra| extra.blocks(query.kart))
        });
        for extra in slabs {
            let (bottom, top) = self.slab_at(extra, px, py);
            if query.above_midpoint(bottom, top) {
                if top > opening.bottom && extra.acts_as_floor(query.flipped) {
                    opening.bottom = top;
                }
            } else if bottom < opening.top && extra.acts_as_ceiling(query.flipped) {
                opening.top = bottom;
            }
        }

        Some(opening)
    }

    /// Solid slabs whose top and bottom can stop an object vertically.
    fn tangible_flats(&self, sector: SectorId, kart: bool) -> impl Iterator<Item = &ExtraFloor> {
        self.sector(sector).extra_floors.iter().filter(move |extra| {
            extra.blocks(kart) && !extra.flags.contains(ExtraFloorFlags::INTANGIBLE_FLATS)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::test_maps::{fx, two_rooms};
    use crate::sector::{ExtraFloor, ExtraFloorFlags, Sector};
    use crate::slope::Slope;

    fn query(x: i32, y: i32, z: i32) -> SurfaceQuery {
        SurfaceQuery {
            x: fx(x),
            y: fx(y),
            z: fx(z),
            height: fx(56),
            flipped: false,
            kart: true,
        }
    }

    /// Room A holds a slab from 64 to 96 controlled by a dummy sector.
    fn slab_level(flags: ExtraFloorFlags) -> (crate::Level, SectorId) {
        let (mut builder, a, _) =
            two_rooms(Sector::new(fx(0), fx(256)), Sector::new(fx(0), fx(256)));
        let control = builder.add_sector(Sector::new(fx(64), fx(96)));
        builder
            .sector_mut(a)
            .unwrap()
            .extra_floors
            .push(ExtraFloor::new(control, flags));
        (builder.build().unwrap(), a)
    }

    #[test]
    fn base_heights_without_extra_floors() {
        let (builder, a, _) = two_rooms(Sector::new(fx(8), fx(200)), Sector::new(fx(0), fx(256)));
        let level = builder.build().unwrap();
        let surface = level.surface_at(a, &query(50, 50, 8));
        assert_eq!(surface.floorz, fx(8));
        assert_eq!(surface.ceilingz, fx(200));
        assert!(!surface.submerged);
    }

    #[test]
    fn slab_is_floor_above_and_ceiling_below() {
        let (level, a) = slab_level(ExtraFloorFlags::EXISTS | ExtraFloorFlags::SOLID);

        let above = level.surface_at(a, &query(50, 50, 96));
        assert_eq!(above.floorz, fx(96));
        assert_eq!(above.ceilingz, fx(256));

        let below = level.surface_at(a, &query(50, 50, 0));
        assert_eq!(below.floorz, fx(0));
        assert_eq!(below.ceilingz, fx(64));
    }

    #[test]
    fn platform_only_supports_from_above() {
        let flags = ExtraFloorFlags::EXISTS | ExtraFloorFlags::SOLID | ExtraFloorFlags::PLATFORM;
        let (level, a) = slab_level(flags);

        let below = level.surface_at(a, &query(50, 50, 0));
        assert_eq!(below.ceilingz, fx(256));

        let above = level.surface_at(a, &query(50, 50, 100));
        assert_eq!(above.floorz, fx(96));
    }

    #[test]
    fn platform_is_ceiling_under_reverse_gravity() {
        let flags = ExtraFloorFlags::EXISTS | ExtraFloorFlags::SOLID | ExtraFloorFlags::PLATFORM;
        let (level, a) = slab_level(flags);
        let flipped = SurfaceQuery {
            flipped: true,
            ..query(50, 50, 0)
        };
        assert_eq!(level.surface_at(a, &flipped).ceilingz, fx(64));

        let flipped_above = SurfaceQuery {
            flipped: true,
            ..query(50, 50, 100)
        };
        assert_eq!(level.surface_at(a, &flipped_above).floorz, fx(0));
    }

    #[test]
    fn player_only_slab_ignored_by_others() {
        let flags = ExtraFloorFlags::EXISTS | ExtraFloorFlags::BLOCK_PLAYER;
        let (level, a) = slab_level(flags);
        let item = SurfaceQuery {
            kart: false,
            ..query(50, 50, 100)
        };
        assert_eq!(level.surface_at(a, &item).floorz, fx(0));
        assert_eq!(level.surface_at(a, &query(50, 50, 100)).floorz, fx(96));
    }

    #[test]
    fn swimmable_marks_submerged_without_blocking() {
        let (level, a) = slab_level(ExtraFloorFlags::EXISTS | ExtraFloorFlags::SWIMMABLE);
        let surface = level.surface_at(a, &query(50, 50, 40));
        assert!(surface.submerged);
        assert_eq!(surface.floorz, fx(0));
        assert_eq!(surface.ceilingz, fx(256));
        assert!(!level.surface_at(a, &query(50, 50, 120)).submerged);
    }

    #[test]
    fn intangible_flats_skip_heights_but_narrow_openings() {
        let flags =
            ExtraFloorFlags::EXISTS | ExtraFloorFlags::SOLID | ExtraFloorFlags::INTANGIBLE_FLATS;
        let (level, a) = slab_level(flags);
        assert_eq!(level.surface_at(a, &query(50, 50, 100)).floorz, fx(0));

        let opening = level.line_opening(LineId::new(3), &query(250, 50, 0)).unwrap();
        assert_eq!(opening.top, fx(64));
        assert_eq!(opening.bottom, fx(0));
    }

    #[test]
    fn opening_uses_narrower_side() {
        let (builder, _, _) = two_rooms(Sector::new(fx(0), fx(256)), Sector::new(fx(40), fx(128)));
        let level = builder.build().unwrap();
        let opening = level.line_opening(LineId::new(3), &query(240, 100, 0)).unwrap();
        assert_eq!(opening.bottom, fx(40));
        assert_eq!(opening.top, fx(128));
        assert_eq!(opening.lowfloor, fx(0));
        assert_eq!(opening.range(), fx(88));
        assert!(level.line_opening(LineId::new(0), &query(10, 100, 0)).is_none());
    }

    #[test]
    fn sloped_floor_overrides_flat_height() {
        let (mut builder, a, _) =
            two_rooms(Sector::new(fx(0), fx(256)), Sector::new(fx(0), fx(256)));
        let ramp = builder.add_slope(
            Slope::from_points([
                [fx(0), fx(0), fx(0)],
                [fx(256), fx(0), fx(64)],
                [fx(0), fx(256), fx(0)],
            ])
            .unwrap(),
        );
        builder.sector_mut(a).unwrap().floor_slope = Some(ramp);
        let level = builder.build().unwrap();
        assert_eq!(level.highest_floor_at(a, &query(128, 10, 32)), fx(32));
        assert_eq!(level.floor_z_at(a, fx(0), fx(200)), fx(0));
    }
}
