//! Gameplay for the sandbox race: item boxes, banana spin-outs, laps and
//! boost pads, wired through the physics hooks.

use hashbrown::HashMap;
use kartsim_core::{Fixed, LineId, SectorId, Side};
use kartsim_entity::{Category, ObjectId};
use kartsim_physics::{InteractionHooks, PhysicsWorld};
use tracing::{debug, info};

use crate::track::{fx, BOOST_SECTOR, FINISH_LINE};

/// Per-race tallies.
#[derive(Debug, Default)]
pub struct RaceStats {
    pub pickups: u32,
    pub spinouts: u32,
    pub bounces: u32,
    pub boosts: u32,
    pub laps: HashMap<ObjectId, u32>,
}

/// Race rules applied through the physics hooks.
#[derive(Debug, Default)]
pub struct RaceHooks {
    pub stats: RaceStats,
}

impl InteractionHooks for RaceHooks {
    fn on_pickup(&mut self, world: &mut PhysicsWorld, mover: ObjectId, other: ObjectId) {
        // Resting item boxes run checks too, so either side may be the box.
        let is_box = |id| {
            world
                .mobj(id)
                .is_some_and(|mobj| mobj.category == Category::Pickup)
        };
        let (kart, item) = if is_box(other) { (mover, other) } else { (other, mover) };
        if world.remove(item) {
            self.stats.pickups += 1;
            debug!(?kart, ?item, "item box collected");
        }
    }

    fn on_touch(&mut self, world: &mut PhysicsWorld, toucher: ObjectId, touched: ObjectId) {
        let hazard = world
            .mobj(touched)
            .is_some_and(|mobj| mobj.category == Category::Hazard);
        if !hazard {
            return;
        }
        let Some(kart) = world.mobj_mut(toucher).filter(|mobj| mobj.is_kart()) else {
            return;
        };
        kart.momx = Fixed::ZERO;
        kart.momy = Fixed::ZERO;
        world.remove(touched);
        self.stats.spinouts += 1;
        debug!(kart = ?toucher, "spun out");
    }

    fn on_bounce(
        &mut self,
        world: &mut PhysicsWorld,
        a: ObjectId,
        b: ObjectId,
        _relative: (Fixed, Fixed),
    ) {
        if world.apply_bounce(a, b) {
            self.stats.bounces += 1;
        }
    }

    fn on_special_line(&mut self, world: &mut PhysicsWorld, object: ObjectId, line: LineId) {
        let finish = world.level().line(line);
        if finish.special != FINISH_LINE {
            return;
        }
        // The trigger fires on every move while the footprint straddles the
        // line; a lap is the centre passing from the pit side to the east.
        let segment = finish.segment();
        let crossed = world.mobj(object).is_some_and(|mobj| {
            mobj.is_kart()
                && segment.point_side(mobj.prev.0, mobj.prev.1) == Side::Back
                && segment.point_side(mobj.x, mobj.y) == Side::Front
        });
        if crossed {
            let laps = self.stats.laps.entry(object).or_default();
            *laps += 1;
            info!(kart = ?object, laps = *laps, "crossed the finish line");
        }
    }

    fn on_sector_entered(&mut self, world: &mut PhysicsWorld, object: ObjectId, sector: SectorId) {
        if world.level().sector(sector).special != BOOST_SECTOR {
            return;
        }
        if let Some(kart) = world.mobj_mut(object).filter(|mobj| mobj.is_kart()) {
            kart.momx = kart.momx + kart.momx.half();
            kart.momy = kart.momy + kart.momy.half();
            self.stats.boosts += 1;
        }
    }
}

/// Steers karts back and forth across the track.
#[derive(Debug, Default)]
pub struct Driver {
    heading: HashMap<ObjectId, i32>,
}

impl Driver {
    const THRUST: i32 = 2;
    const TOP_SPEED: i32 = 20;
    const TURN_MARGIN: i32 = 96;

    /// Push every kart towards its current end of the track, turning around
    /// near the far walls.
    pub fn steer(&mut self, world: &mut PhysicsWorld) {
        let karts: Vec<ObjectId> = world
            .ids()
            .filter(|&id| world.mobj(id).is_some_and(|mobj| mobj.is_kart()))
            .collect();
        let far = 2 * crate::track::ROOM - Self::TURN_MARGIN;

        for id in karts {
            let heading = self.heading.entry(id).or_insert(1);
            let Some(kart) = world.mobj_mut(id) else {
                continue;
            };
            let x = kart.x.to_int();
            if x > far {
                *heading = -1;
            } else if x < Self::TURN_MARGIN {
                *heading = 1;
            }
            let target = fx(*heading * Self::TOP_SPEED);
            let thrust = fx(*heading * Self::THRUST);
            if (*heading > 0 && kart.momx < target) || (*heading < 0 && kart.momx > target) {
                kart.momx = kart.momx + thrust;
            }
        }
        self.heading.retain(|&id, _| world.contains(id));
    }
}
