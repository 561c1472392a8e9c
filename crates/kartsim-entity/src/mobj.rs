//! The world object component.

use bitflags::bitflags;
use hashbrown::HashSet;
use kartsim_core::{BBox, BlockPos, Fixed, SectorId};

use crate::{Category, ObjectId};

bitflags! {
    /// Per-object movement flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MobjFlags: u32 {
        /// Passes through objects and lines; heights are still tracked.
        const NOCLIP = 1 << 0;
        /// Ignores vertical fit tests only.
        const NOCLIPHEIGHT = 1 << 1;
        /// Not pulled by gravity.
        const NOGRAVITY = 1 << 2;
        /// Never linked into the blockmap, so nothing else can find it.
        const NOBLOCKMAP = 1 << 3;
        /// Skipped by every object-vs-object test.
        const NOINTERACT = 1 << 4;
        /// Reverse gravity: falls towards the ceiling.
        const VERTICALFLIP = 1 << 5;
        /// Refuses to walk off ledges higher than the drop-off limit.
        const NODROPOFF = 1 << 6;
        /// Hovers; keeps its height when the floor drops away.
        const FLOAT = 1 << 7;
    }
}

/// A simulated object: kart, item, projectile or physical decoration.
///
/// Positions are the centre of the base in XY and the bottom in Z.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mobj {
    pub x: Fixed,
    pub y: Fixed,
    pub z: Fixed,
    /// Position at the start of the tick, for render interpolation.
    pub prev: (Fixed, Fixed, Fixed),
    pub radius: Fixed,
    pub height: Fixed,
    pub momx: Fixed,
    pub momy: Fixed,
    pub momz: Fixed,
    pub floorz: Fixed,
    pub ceilingz: Fixed,
    /// Lowest floor under the object's bounding box.
    pub dropoffz: Fixed,
    /// Sector containing the centre, `None` when outside the map.
    pub sector: Option<SectorId>,
    /// Every sector the bounding box overlaps, rebuilt on each move.
    pub touching: HashSet<SectorId>,
    pub flags: MobjFlags,
    pub category: Category,
    /// Thrower of an item or projectile.
    pub owner: Option<ObjectId>,
    /// Tics left during which the owner is ignored.
    pub owner_grace: u32,
    pub submerged: bool,
    /// Blockmap cell this object is linked into.
    pub block: Option<BlockPos>,
}

impl Mobj {
    /// Build the component from a spawn descriptor. Height caches are
    /// filled in by the world when the object is linked.
    pub fn from_spawn(spawn: &MobjSpawn) -> Self {
        let z = spawn.z.unwrap_or(Fixed::ZERO);
        Self {
            x: spawn.x,
            y: spawn.y,
            z,
            prev: (spawn.x, spawn.y, z),
            radius: spawn.radius,
            height: spawn.height,
            momx: spawn.momx,
            momy: spawn.momy,
            momz: spawn.momz,
            floorz: z,
            ceilingz: z + spawn.height,
            dropoffz: z,
            sector: None,
            touching: HashSet::new(),
            flags: spawn.flags,
            category: spawn.category,
            owner: spawn.owner,
            owner_grace: spawn.owner_grace,
            submerged: false,
            block: None,
        }
    }

    #[inline]
    pub fn top(&self) -> Fixed {
        self.z + self.height
    }

    #[inline]
    pub fn is_kart(&self) -> bool {
        self.category.is_kart()
    }

    #[inline]
    pub fn is_flipped(&self) -> bool {
        self.flags.contains(MobjFlags::VERTICALFLIP)
    }

    /// Footprint at the current position.
    #[inline]
    pub fn bbox(&self) -> BBox {
        BBox::around(self.x, self.y, self.radius)
    }

    /// Footprint if the object stood at (x, y).
    #[inline]
    pub fn bbox_at(&self, x: Fixed, y: Fixed) -> BBox {
        BBox::around(x, y, self.radius)
    }

    /// Resting on whichever surface gravity pulls it towards.
    #[inline]
    pub fn on_ground(&self) -> bool {
        if self.is_flipped() {
            self.top() >= self.ceilingz
        } else {
            self.z <= self.floorz
        }
    }

    /// True while `other` is this object's owner and the grace window is open.
    #[inline]
    pub fn ignores_owner(&self, other: ObjectId) -> bool {
        self.owner_grace > 0 && self.owner == Some(other)
    }
}

/// Already-resolved template data for a new object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MobjSpawn {
    pub x: Fixed,
    pub y: Fixed,
    /// `None` places the object on the floor (or ceiling when flipped).
    pub z: Option<Fixed>,
    pub radius: Fixed,
    pub height: Fixed,
    pub category: Category,
    pub flags: MobjFlags,
    pub momx: Fixed,
    pub momy: Fixed,
    pub momz: Fixed,
    pub owner: Option<ObjectId>,
    pub owner_grace: u32,
}

impl MobjSpawn {
    /// Object of `category` standing on the floor at (x, y).
    pub const fn new(category: Category, x: Fixed, y: Fixed, radius: Fixed, height: Fixed) -> Self {
        Self {
            x,
            y,
            z: None,
            radius,
            height,
            category,
            flags: MobjFlags::empty(),
            momx: Fixed::ZERO,
            momy: Fixed::ZERO,
            momz: Fixed::ZERO,
            owner: None,
            owner_grace: 0,
        }
    }

    /// Standard kart footprint: radius 16, height 56.
    pub const fn kart(x: Fixed, y: Fixed) -> Self {
        Self::new(Category::Kart, x, y, Fixed::from_int(16), Fixed::from_int(56))
    }

    #[must_use]
    pub const fn with_z(mut self, z: Fixed) -> Self {
        self.z = Some(z);
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: MobjFlags) -> Self {
        self.flags |= flags;
        self
    }

    #[must_use]
    pub const fn with_momentum(mut self, momx: Fixed, momy: Fixed, momz: Fixed) -> Self {
        self.momx = momx;
        self.momy = momy;
        self.momz = momz;
        self
    }

    /// Thrown by `owner`, which is ignored for `grace` tics.
    #[must_use]
    pub const fn with_owner(mut self, owner: ObjectId, grace: u32) -> Self {
        self.owner = Some(owner);
        self.owner_grace = grace;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hecs::World;

    fn fx(v: i32) -> Fixed {
        Fixed::from_int(v)
    }

    #[test]
    fn spawn_descriptor_fills_component() {
        let spawn = MobjSpawn::kart(fx(10), fx(20))
            .with_z(fx(8))
            .with_momentum(fx(1), fx(2), fx(0))
            .with_flags(MobjFlags::NODROPOFF);
        let mobj = Mobj::from_spawn(&spawn);
        assert_eq!(mobj.prev, (fx(10), fx(20), fx(8)));
        assert_eq!(mobj.top(), fx(64));
        assert_eq!(mobj.momy, fx(2));
        assert!(mobj.is_kart());
        assert!(mobj.flags.contains(MobjFlags::NODROPOFF));
        assert_eq!(mobj.bbox(), BBox::new(fx(-6), fx(26), fx(4), fx(36)));
    }

    #[test]
    fn grounded_depends_on_gravity() {
        let mut mobj = Mobj::from_spawn(&MobjSpawn::kart(fx(0), fx(0)));
        mobj.floorz = fx(0);
        mobj.ceilingz = fx(128);
        assert!(mobj.on_ground());

        mobj.flags |= MobjFlags::VERTICALFLIP;
        assert!(!mobj.on_ground());
        mobj.z = fx(72);
        assert!(mobj.on_ground());
    }

    #[test]
    fn owner_grace_expires() {
        let mut world = World::new();
        let thrower = world.spawn(());
        let stranger = world.spawn(());
        let spawn = MobjSpawn::new(Category::Item, fx(0), fx(0), fx(8), fx(16))
            .with_owner(thrower, 3);
        let mut item = Mobj::from_spawn(&spawn);
        assert!(item.ignores_owner(thrower));
        assert!(!item.ignores_owner(stranger));
        item.owner_grace = 0;
        assert!(!item.ignores_owner(thrower));
    }
}
