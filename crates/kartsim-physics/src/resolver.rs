//! Position checks.
//!
//! [`PhysicsWorld::check_position`] decides whether an object fits at a
//! point and reports the floor and ceiling it would have there. All working
//! state is local to the call, so hooks fired from inside a check may run
//! further checks of their own. The one exception is the record of pickups
//! already fired, which a move shares across its sub-steps.
//!
//! Order of work:
//! 1. sector and surface heights at the target, always filled in
//! 2. nearby objects, by the category policy table
//! 3. lines crossing the footprint, collecting triggers even when blocked
//! 4. the final vertical fit

use hashbrown::HashSet;
use kartsim_core::{BBox, Fixed, LineId, SectorId};
use kartsim_entity::{Category, MobjFlags, ObjectId};
use kartsim_world::{LineFlags, SurfaceQuery};
use tracing::warn;

#[cfg(feature = "profiling")]
use kartsim_profiler::{profile_scope, EventCategory};

use crate::config::Interaction;
use crate::dispatch::{pair_key, InteractionHooks, PairKey};
use crate::world::PhysicsWorld;

/// What stopped a position check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Blocker {
    /// A solid object.
    Object(ObjectId),
    /// A wall, or a two-sided line whose opening does not admit the object.
    Line(LineId),
    /// Floor and ceiling at the target do not admit the object.
    Height,
    /// The target is outside every sector.
    NoSector,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Accepted,
    Blocked(Blocker),
    /// The object was removed by a hook during the check.
    Removed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactKind {
    Touch,
    Bounce,
}

/// An overlapping object recorded for deferred dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Contact {
    pub other: ObjectId,
    pub kind: ContactKind,
}

/// Result of a position check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verdict {
    pub outcome: Outcome,
    pub floorz: Fixed,
    pub ceilingz: Fixed,
    /// Lowest floor under the footprint.
    pub dropoffz: Fixed,
    pub sector: Option<SectorId>,
    pub submerged: bool,
    pub contacts: Vec<Contact>,
    /// Trigger lines crossed by the footprint, in line order.
    pub special_lines: Vec<LineId>,
}

impl Verdict {
    fn removed() -> Self {
        Self {
            outcome: Outcome::Removed,
            floorz: Fixed::ZERO,
            ceilingz: Fixed::ZERO,
            dropoffz: Fixed::ZERO,
            sector: None,
            submerged: false,
            contacts: Vec::new(),
            special_lines: Vec::new(),
        }
    }

    #[inline]
    pub fn is_accepted(&self) -> bool {
        self.outcome == Outcome::Accepted
    }

    #[inline]
    pub fn blocker(&self) -> Option<Blocker> {
        match self.outcome {
            Outcome::Blocked(blocker) => Some(blocker),
            _ => None,
        }
    }
}

/// Pickup pairs already fired during one move.
pub(crate) type FiredPickups = HashSet<PairKey>;

/// Copy of the fields a check reads from an object, so no borrow of the
/// object store is held across hook calls.
#[derive(Clone, Copy, Debug)]
struct Body {
    x: Fixed,
    y: Fixed,
    z: Fixed,
    radius: Fixed,
    height: Fixed,
    floorz: Fixed,
    ceilingz: Fixed,
    flags: MobjFlags,
    category: Category,
    owner: Option<ObjectId>,
    owner_grace: u32,
}

impl Body {
    fn of(world: &PhysicsWorld, id: ObjectId) -> Option<Self> {
        world.mobj(id).map(|mobj| Self {
            x: mobj.x,
            y: mobj.y,
            z: mobj.z,
            radius: mobj.radius,
            height: mobj.height,
            floorz: mobj.floorz,
            ceilingz: mobj.ceilingz,
            flags: mobj.flags,
            category: mobj.category,
            owner: mobj.owner,
            owner_grace: mobj.owner_grace,
        })
    }

    #[inline]
    fn top(&self) -> Fixed {
        self.z + self.height
    }

    #[inline]
    fn flipped(&self) -> bool {
        self.flags.contains(MobjFlags::VERTICALFLIP)
    }

    #[inline]
    fn ignores_owner(&self, other: ObjectId) -> bool {
        self.owner_grace > 0 && self.owner == Some(other)
    }

    #[inline]
    fn overlaps_vertically(&self, other: &Self) -> bool {
        other.z < self.top() && other.top() > self.z
    }
}

impl PhysicsWorld {
    /// Check whether `id` fits with its centre at (x, y), keeping its
    /// current z. Nothing about the object is changed.
    pub fn check_position<H: InteractionHooks + ?Sized>(
        &mut self,
        hooks: &mut H,
        id: ObjectId,
        x: Fixed,
        y: Fixed,
    ) -> Verdict {
        self.check_position_within(hooks, id, x, y, &mut FiredPickups::new())
    }

    /// [`check_position`](Self::check_position) as one step of a longer
    /// move. Pairs in `fired` do not pick up again.
    pub(crate) fn check_position_within<H: InteractionHooks + ?Sized>(
        &mut self,
        hooks: &mut H,
        id: ObjectId,
        x: Fixed,
        y: Fixed,
        fired: &mut FiredPickups,
    ) -> Verdict {
        #[cfg(feature = "profiling")]
        profile_scope!(EventCategory::CheckPosition);

        let Some(mover) = Body::of(self, id) else {
            return Verdict::removed();
        };
        self.stats.check_position += 1;

        let query = SurfaceQuery {
            x,
            y,
            z: mover.z,
            height: mover.height,
            flipped: mover.flipped(),
            kart: mover.category.is_kart(),
        };
        let noclip = mover.flags.contains(MobjFlags::NOCLIP);

        let Some(sector) = self.level.point_in_sector(x, y) else {
            if !noclip {
                warn!(?id, %x, %y, "position outside every sector");
            }
            return Verdict {
                outcome: if noclip {
                    Outcome::Accepted
                } else {
                    Outcome::Blocked(Blocker::NoSector)
                },
                floorz: mover.floorz,
                ceilingz: mover.ceilingz,
                dropoffz: mover.floorz,
                ..Verdict::removed()
            };
        };

        let surface = self.level.surface_at(sector, &query);
        let mut verdict = Verdict {
            outcome: Outcome::Accepted,
            floorz: surface.floorz,
            ceilingz: surface.ceilingz,
            dropoffz: surface.floorz,
            sector: Some(sector),
            submerged: surface.submerged,
            contacts: Vec::new(),
            special_lines: Vec::new(),
        };
        if noclip {
            return verdict;
        }

        let bbox = BBox::around(x, y, mover.radius);
        if !mover.flags.contains(MobjFlags::NOINTERACT) {
            let found = self.check_objects(hooks, id, &mover, (x, y), fired, &mut verdict);
            if let Some(outcome) = found {
                verdict.outcome = outcome;
                return verdict;
            }
        }

        if let Some(line) = self.check_lines(&query, &mover, &bbox, &mut verdict) {
            verdict.outcome = Outcome::Blocked(Blocker::Line(line));
            return verdict;
        }

        if !mover.flags.contains(MobjFlags::NOCLIPHEIGHT) && !self.fits(id, &mover, &verdict) {
            verdict.outcome = Outcome::Blocked(Blocker::Height);
        }
        verdict
    }

    /// Object pass. Returns the outcome to stop with, if any.
    fn check_objects<H: InteractionHooks + ?Sized>(
        &mut self,
        hooks: &mut H,
        id: ObjectId,
        mover: &Body,
        (x, y): (Fixed, Fixed),
        fired: &mut FiredPickups,
        verdict: &mut Verdict,
    ) -> Option<Outcome> {
        let candidates = self.blockmap.objects_in_box(&BBox::around(x, y, mover.radius));
        self.stats.object_queries += 1;
        self.stats.cells_visited += candidates.cells() as u64;

        for other_id in candidates {
            if other_id == id {
                continue;
            }
            // Gone since the snapshot was taken.
            let Some(other) = Body::of(self, other_id) else {
                continue;
            };
            if other.flags.contains(MobjFlags::NOINTERACT)
                || mover.ignores_owner(other_id)
                || other.ignores_owner(id)
            {
                continue;
            }
            let blockdist = mover.radius + other.radius;
            if (other.x - x).abs() >= blockdist || (other.y - y).abs() >= blockdist {
                continue;
            }

            let overlapping = mover.overlaps_vertically(&other);
            match self.config.policy.get(mover.category, other.category) {
                Interaction::Ignore => {}
                Interaction::Touch if overlapping => verdict.contacts.push(Contact {
                    other: other_id,
                    kind: ContactKind::Touch,
                }),
                Interaction::Bounce if overlapping => verdict.contacts.push(Contact {
                    other: other_id,
                    kind: ContactKind::Bounce,
                }),
                Interaction::Pickup if overlapping => {
                    if !self.claim_pickup(fired, pair_key(id, other_id)) {
                        continue;
                    }
                    hooks.on_pickup(self, id, other_id);
                    if !self.contains(id) {
                        return Some(Outcome::Removed);
                    }
                }
                Interaction::Block => {
                    if !self.rest_against(mover, &other, verdict) {
                        return Some(Outcome::Blocked(Blocker::Object(other_id)));
                    }
                }
                Interaction::Touch | Interaction::Bounce | Interaction::Pickup => {}
            }
        }
        None
    }

    /// True the first time a pair picks up in this move, and in this tick
    /// while one is running.
    fn claim_pickup(&mut self, fired: &mut FiredPickups, pair: PairKey) -> bool {
        if !fired.insert(pair) {
            return false;
        }
        match &mut self.tick_pickups {
            Some(tick) => tick.insert(pair),
            None => true,
        }
    }

    /// Treat a solid object as something to stand on or duck under.
    /// Returns false if it is in the way instead.
    fn rest_against(&self, mover: &Body, other: &Body, verdict: &mut Verdict) -> bool {
        let max_step = self.config.max_step;
        if mover.flipped() {
            if other.z >= mover.top() - max_step {
                verdict.ceilingz = verdict.ceilingz.min(other.z);
                return true;
            }
            if other.top() <= mover.z {
                verdict.floorz = verdict.floorz.max(other.top());
                return true;
            }
        } else {
            if other.top() <= mover.z + max_step {
                verdict.floorz = verdict.floorz.max(other.top());
                return true;
            }
            if other.z >= mover.top() {
                verdict.ceilingz = verdict.ceilingz.min(other.z);
                return true;
            }
        }
        false
    }

    /// Line pass. Returns the first blocking line; triggers are collected
    /// from every crossed line either way.
    fn check_lines(
        &mut self,
        query: &SurfaceQuery,
        mover: &Body,
        bbox: &BBox,
        verdict: &mut Verdict,
    ) -> Option<LineId> {
        let lines = self.blockmap.lines_in_box(bbox);
        self.stats.line_queries += 1;
        self.stats.cells_visited += self.blockmap.cells_in_box(bbox) as u64;

        let mut blocking = None;
        for id in lines {
            let line = self.level.line(id);
            if !bbox.crosses_segment(&line.segment()) {
                continue;
            }
            if line.is_trigger() {
                verdict.special_lines.push(id);
            }
            if blocking.is_none() && self.line_blocks(id, query, mover, verdict) {
                blocking = Some(id);
            }
        }
        blocking
    }

    fn line_blocks(
        &self,
        id: LineId,
        query: &SurfaceQuery,
        mover: &Body,
        verdict: &mut Verdict,
    ) -> bool {
        let line = self.level.line(id);
        if line.flags.contains(LineFlags::IMPASSABLE)
            || (query.kart && line.flags.contains(LineFlags::BLOCK_KARTS))
        {
            return true;
        }
        let Some(opening) = self.level.line_opening(id, query) else {
            return true;
        };

        verdict.ceilingz = verdict.ceilingz.min(opening.top);
        verdict.floorz = verdict.floorz.max(opening.bottom);
        verdict.dropoffz = verdict.dropoffz.min(opening.lowfloor);

        if mover.flags.contains(MobjFlags::NOCLIPHEIGHT) {
            return false;
        }
        let config = &self.config;
        if opening.range() < mover.height {
            return true;
        }
        let (headroom_lost, step_up) = if query.flipped {
            (opening.bottom > mover.z, mover.top() - opening.top)
        } else {
            (opening.top < mover.top(), opening.bottom - mover.z)
        };
        if headroom_lost || step_up > config.max_step {
            return true;
        }
        mover.flags.contains(MobjFlags::NODROPOFF)
            && !mover.flags.contains(MobjFlags::FLOAT)
            && opening.bottom - opening.lowfloor > config.max_dropoff
    }

    /// Final vertical test against the merged floor and ceiling.
    fn fits(&self, id: ObjectId, mover: &Body, verdict: &Verdict) -> bool {
        if verdict.ceilingz < verdict.floorz {
            warn!(
                ?id,
                floorz = %verdict.floorz,
                ceilingz = %verdict.ceilingz,
                "floor above ceiling"
            );
            return false;
        }
        if verdict.ceilingz - verdict.floorz < mover.height {
            return false;
        }
        let max_step = self.config.max_step;
        if mover.flipped() {
            let top = mover.top().min(verdict.ceilingz);
            mover.top() - verdict.ceilingz <= max_step && top - mover.height >= verdict.floorz
        } else {
            let z = mover.z.max(verdict.floorz);
            verdict.floorz - mover.z <= max_step && z + mover.height <= verdict.ceilingz
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InteractionPolicy;
    use crate::fixtures::{
        fx, kart_at, open_room, slab_room, step_rooms, two_rooms, world_with, Recorder,
        SHARED_LINE,
    };
    use crate::{NoHooks, PhysicsConfig};
    use kartsim_entity::MobjSpawn;
    use kartsim_world::Sector;

    #[test]
    fn open_floor_is_accepted_with_heights() {
        let mut world = world_with(open_room());
        let id = kart_at(&mut world, 100, 100);
        let verdict = world.check_position(&mut NoHooks, id, fx(500), fx(500));
        assert!(verdict.is_accepted());
        assert_eq!(verdict.floorz, fx(0));
        assert_eq!(verdict.ceilingz, fx(256));
        assert_eq!(verdict.sector, Some(SectorId::new(0)));
        assert_eq!(world.stats().check_position, 1);
    }

    #[test]
    fn high_step_through_two_sided_line_is_rejected() {
        // Radius 16, height 56 at floor 0 facing a back floor of 40.
        let mut world = world_with(step_rooms(40));
        let id = kart_at(&mut world, 200, 128);
        let verdict = world.check_position(&mut NoHooks, id, fx(250), fx(128));
        assert_eq!(verdict.outcome, Outcome::Blocked(Blocker::Line(SHARED_LINE)));
    }

    #[test]
    fn low_step_is_climbable() {
        let mut world = world_with(step_rooms(24));
        let id = kart_at(&mut world, 200, 128);
        let verdict = world.check_position(&mut NoHooks, id, fx(250), fx(128));
        assert!(verdict.is_accepted());
        assert_eq!(verdict.floorz, fx(24));
        assert_eq!(verdict.dropoffz, fx(0));
    }

    #[test]
    fn low_opening_blocks() {
        let level = two_rooms(Sector::new(fx(0), fx(256)), Sector::new(fx(0), fx(48)), |l| l);
        let mut world = world_with(level);
        let id = kart_at(&mut world, 200, 128);
        let verdict = world.check_position(&mut NoHooks, id, fx(250), fx(128));
        assert_eq!(verdict.blocker(), Some(Blocker::Line(SHARED_LINE)));
    }

    #[test]
    fn walls_and_impassable_lines_block() {
        let mut world = world_with(open_room());
        let id = kart_at(&mut world, 100, 100);
        let verdict = world.check_position(&mut NoHooks, id, fx(10), fx(100));
        assert!(matches!(verdict.blocker(), Some(Blocker::Line(_))));

        let level = two_rooms(Sector::new(fx(0), fx(256)), Sector::new(fx(0), fx(256)), |l| {
            l.with_flags(LineFlags::IMPASSABLE)
        });
        let mut world = world_with(level);
        let id = kart_at(&mut world, 200, 128);
        let verdict = world.check_position(&mut NoHooks, id, fx(250), fx(128));
        assert_eq!(verdict.blocker(), Some(Blocker::Line(SHARED_LINE)));
    }

    #[test]
    fn kart_only_lines_let_items_through() {
        let level = two_rooms(Sector::new(fx(0), fx(256)), Sector::new(fx(0), fx(256)), |l| {
            l.with_flags(LineFlags::BLOCK_KARTS)
        });
        let mut world = world_with(level);
        let kart = kart_at(&mut world, 200, 128);
        let item = world
            .spawn(MobjSpawn::new(Category::Item, fx(200), fx(64), fx(8), fx(16)))
            .unwrap();
        assert!(!world.check_position(&mut NoHooks, kart, fx(250), fx(128)).is_accepted());
        assert!(world.check_position(&mut NoHooks, item, fx(255), fx(64)).is_accepted());
    }

    #[test]
    fn triggers_collected_even_when_blocked() {
        let level = two_rooms(Sector::new(fx(0), fx(256)), Sector::new(fx(40), fx(256)), |l| {
            l.with_special(7, 1)
        });
        let mut world = world_with(level);
        let id = kart_at(&mut world, 200, 128);
        let verdict = world.check_position(&mut NoHooks, id, fx(250), fx(128));
        assert!(!verdict.is_accepted());
        assert_eq!(verdict.special_lines, vec![SHARED_LINE]);
    }

    #[test]
    fn noclip_accepts_with_true_heights() {
        let mut world = world_with(step_rooms(40));
        let id = world
            .spawn(MobjSpawn::kart(fx(200), fx(128)).with_flags(MobjFlags::NOCLIP))
            .unwrap();
        let verdict = world.check_position(&mut NoHooks, id, fx(300), fx(128));
        assert!(verdict.is_accepted());
        assert_eq!(verdict.floorz, fx(40));
        assert_eq!(verdict.ceilingz, fx(256));
        assert_eq!(verdict.sector, Some(SectorId::new(1)));
    }

    #[test]
    fn outside_map_is_no_sector() {
        let mut world = world_with(open_room());
        let id = kart_at(&mut world, 100, 100);
        let verdict = world.check_position(&mut NoHooks, id, fx(-100), fx(100));
        assert_eq!(verdict.outcome, Outcome::Blocked(Blocker::NoSector));
        assert_eq!(verdict.floorz, fx(0));
    }

    #[test]
    fn kart_pairs_bounce_under_racing_rules() {
        let mut world = world_with(open_room());
        let a = kart_at(&mut world, 100, 100);
        let b = kart_at(&mut world, 150, 100);
        let verdict = world.check_position(&mut NoHooks, a, fx(125), fx(100));
        assert!(verdict.is_accepted());
        assert_eq!(
            verdict.contacts,
            vec![Contact {
                other: b,
                kind: ContactKind::Bounce
            }]
        );
    }

    #[test]
    fn kart_pairs_block_under_classic_rules() {
        let config = PhysicsConfig::default().with_policy(InteractionPolicy::classic());
        let mut world = PhysicsWorld::new(open_room(), config);
        let a = kart_at(&mut world, 100, 100);
        let b = kart_at(&mut world, 150, 100);
        let verdict = world.check_position(&mut NoHooks, a, fx(125), fx(100));
        assert_eq!(verdict.blocker(), Some(Blocker::Object(b)));
        // Exactly blockdist apart is clear.
        assert!(world.check_position(&mut NoHooks, a, fx(118), fx(100)).is_accepted());
    }

    #[test]
    fn low_obstacle_is_stood_on() {
        let mut world = world_with(open_room());
        let kart = kart_at(&mut world, 100, 100);
        world
            .spawn(MobjSpawn::new(Category::Obstacle, fx(140), fx(100), fx(16), fx(16)))
            .unwrap();
        let verdict = world.check_position(&mut NoHooks, kart, fx(130), fx(100));
        assert!(verdict.is_accepted());
        assert_eq!(verdict.floorz, fx(16));
    }

    #[test]
    fn thrower_grace_skips_owner() {
        let config = PhysicsConfig::default().with_policy(
            InteractionPolicy::kart_racing().with_symmetric(
                Category::Kart,
                Category::Missile,
                Interaction::Block,
            ),
        );
        let mut world = PhysicsWorld::new(open_room(), config);
        let kart = kart_at(&mut world, 100, 100);
        let shell = world
            .spawn(
                MobjSpawn::new(Category::Missile, fx(100), fx(100), fx(8), fx(16))
                    .with_owner(kart, 2),
            )
            .unwrap();
        assert!(world.check_position(&mut NoHooks, shell, fx(104), fx(100)).is_accepted());

        world.mobj_mut(shell).unwrap().owner_grace = 0;
        let verdict = world.check_position(&mut NoHooks, shell, fx(104), fx(100));
        assert_eq!(verdict.blocker(), Some(Blocker::Object(kart)));
    }

    #[test]
    fn slab_sets_ceiling_for_object_beneath() {
        let mut world = world_with(slab_room());
        let id = kart_at(&mut world, 100, 100);
        // 56 tall under a slab starting at 64.
        let verdict = world.check_position(&mut NoHooks, id, fx(200), fx(100));
        assert!(verdict.is_accepted());
        assert_eq!(verdict.ceilingz, fx(64));

        world.mobj_mut(id).unwrap().height = fx(70);
        let verdict = world.check_position(&mut NoHooks, id, fx(200), fx(100));
        assert_eq!(verdict.blocker(), Some(Blocker::Height));
    }

    #[test]
    fn pickup_runs_immediately() {
        let mut world = world_with(open_room());
        let kart = kart_at(&mut world, 100, 100);
        let ring = world
            .spawn(MobjSpawn::new(Category::Pickup, fx(130), fx(100), fx(8), fx(16)))
            .unwrap();
        let mut hooks = Recorder::default();
        let verdict = world.check_position(&mut hooks, kart, fx(120), fx(100));
        assert!(verdict.is_accepted());
        assert_eq!(hooks.pickups, vec![(kart, ring)]);
        assert!(world.events().is_empty());
    }

    /// Removes the mover from inside a pickup.
    struct Crusher;

    impl InteractionHooks for Crusher {
        fn on_pickup(&mut self, world: &mut PhysicsWorld, mover: ObjectId, _other: ObjectId) {
            world.remove(mover);
        }
    }

    #[test]
    fn mover_removed_mid_check_reports_removed() {
        let mut world = world_with(open_room());
        let kart = kart_at(&mut world, 100, 100);
        world
            .spawn(MobjSpawn::new(Category::Pickup, fx(130), fx(100), fx(8), fx(16)))
            .unwrap();
        let verdict = world.check_position(&mut Crusher, kart, fx(120), fx(100));
        assert_eq!(verdict.outcome, Outcome::Removed);
        assert_eq!(
            world.check_position(&mut NoHooks, kart, fx(120), fx(100)).outcome,
            Outcome::Removed
        );
    }

    /// Spawns an item on pickup and checks positions for it before the
    /// outer check has finished.
    #[derive(Default)]
    struct Spawner {
        spawned: Option<ObjectId>,
        nested: Option<Verdict>,
    }

    impl InteractionHooks for Spawner {
        fn on_pickup(&mut self, world: &mut PhysicsWorld, _mover: ObjectId, other: ObjectId) {
            world.remove(other);
            let item = world
                .spawn(MobjSpawn::new(Category::Item, fx(300), fx(300), fx(8), fx(16)))
                .unwrap();
            self.spawned = Some(item);
            self.nested = Some(world.check_position(self, item, fx(310), fx(300)));
        }
    }

    #[test]
    fn nested_check_inside_pickup() {
        let mut world = world_with(open_room());
        let kart = kart_at(&mut world, 100, 100);
        let ring = world
            .spawn(MobjSpawn::new(Category::Pickup, fx(130), fx(100), fx(8), fx(16)))
            .unwrap();
        // An item the outer check reaches after the pickup.
        let other = world
            .spawn(MobjSpawn::new(Category::Item, fx(140), fx(120), fx(8), fx(16)))
            .unwrap();

        let mut hooks = Spawner::default();
        let verdict = world.check_position(&mut hooks, kart, fx(120), fx(100));

        assert!(verdict.is_accepted());
        assert!(!world.contains(ring));
        assert!(hooks.nested.as_ref().is_some_and(Verdict::is_accepted));
        assert!(hooks.nested.as_ref().is_some_and(|v| v.contacts.is_empty()));
        assert_eq!(
            verdict.contacts,
            vec![Contact {
                other,
                kind: ContactKind::Touch
            }]
        );
        assert_eq!(world.stats().check_position, 2);
    }
}
