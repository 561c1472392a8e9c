//! Direct placement for teleporters, respawns and cameras.

use kartsim_core::Fixed;
use kartsim_entity::ObjectId;
use tracing::debug;

#[cfg(feature = "profiling")]
use kartsim_profiler::{profile_scope, EventCategory};

use crate::dispatch::InteractionHooks;
use crate::resolver::Outcome;
use crate::world::PhysicsWorld;

impl PhysicsWorld {
    /// Teleport and reset the interpolation origin to the destination.
    ///
    /// Returns false only if the object was removed during the move.
    pub fn set_origin<H: InteractionHooks + ?Sized>(
        &mut self,
        hooks: &mut H,
        id: ObjectId,
        x: Fixed,
        y: Fixed,
        z: Fixed,
    ) -> bool {
        if !self.move_origin(hooks, id, x, y, z) {
            return false;
        }
        match self.mobj_mut(id) {
            Some(mobj) => {
                mobj.prev = (x, y, z);
                true
            }
            None => false,
        }
    }

    /// Place the object at (x, y, z) without sub-stepping or sliding.
    ///
    /// The destination is always taken, even when something there would
    /// block a normal move; the position check only refreshes floor,
    /// ceiling, sector and touching bookkeeping and raises touch events.
    /// Returns false only if the object was removed during the move.
    pub fn move_origin<H: InteractionHooks + ?Sized>(
        &mut self,
        hooks: &mut H,
        id: ObjectId,
        x: Fixed,
        y: Fixed,
        z: Fixed,
    ) -> bool {
        #[cfg(feature = "profiling")]
        profile_scope!(EventCategory::SetOrigin);

        let Some(mobj) = self.mobj_mut(id) else {
            return false;
        };
        mobj.z = z;
        self.stats.teleports += 1;

        let verdict = self.check_position(hooks, id, x, y);
        match verdict.outcome {
            Outcome::Removed => return false,
            Outcome::Blocked(blocker) => {
                debug!(?id, ?blocker, %x, %y, %z, "teleport destination obstructed");
            }
            Outcome::Accepted => {}
        }
        self.commit(id, x, y, &verdict, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InteractionPolicy;
    use crate::fixtures::{fx, kart_at, open_room, step_rooms, world_with, Recorder};
    use crate::{NoHooks, PhysicsConfig};
    use kartsim_core::SectorId;
    use kartsim_entity::{Category, MobjSpawn};

    #[test]
    fn set_origin_resets_interpolation() {
        let mut world = world_with(open_room());
        let id = kart_at(&mut world, 100, 100);
        assert!(world.set_origin(&mut NoHooks, id, fx(600), fx(700), fx(30)));
        let mobj = world.mobj(id).unwrap();
        assert_eq!((mobj.x, mobj.y, mobj.z), (fx(600), fx(700), fx(30)));
        assert_eq!(mobj.prev, (fx(600), fx(700), fx(30)));
        assert_eq!(world.stats().teleports, 1);
    }

    #[test]
    fn move_origin_keeps_previous_position() {
        let mut world = world_with(open_room());
        let id = kart_at(&mut world, 100, 100);
        assert!(world.move_origin(&mut NoHooks, id, fx(600), fx(700), fx(0)));
        assert_eq!(world.mobj(id).unwrap().prev, (fx(100), fx(100), fx(0)));
    }

    #[test]
    fn set_origin_twice_is_idempotent() {
        let mut world = world_with(step_rooms(40));
        let id = kart_at(&mut world, 100, 100);
        assert!(world.set_origin(&mut NoHooks, id, fx(250), fx(128), fx(40)));
        let first = (*world.mobj(id).unwrap()).clone();
        assert!(world.set_origin(&mut NoHooks, id, fx(250), fx(128), fx(40)));
        let second = (*world.mobj(id).unwrap()).clone();

        assert_eq!(first.floorz, second.floorz);
        assert_eq!(first.ceilingz, second.ceilingz);
        assert_eq!(first.touching, second.touching);
        assert_eq!(first.floorz, fx(40));
        assert!(first.touching.contains(&SectorId::new(0)));
        assert!(first.touching.contains(&SectorId::new(1)));
    }

    #[test]
    fn teleport_onto_solid_object_still_places() {
        let config = PhysicsConfig::default().with_policy(InteractionPolicy::classic());
        let mut world = PhysicsWorld::new(open_room(), config);
        let a = kart_at(&mut world, 100, 100);
        kart_at(&mut world, 500, 500);
        assert!(world.set_origin(&mut NoHooks, a, fx(510), fx(500), fx(0)));
        assert_eq!(world.mobj(a).unwrap().x, fx(510));
    }

    #[test]
    fn teleport_raises_touches() {
        let mut world = world_with(open_room());
        let kart = kart_at(&mut world, 100, 100);
        let item = world
            .spawn(MobjSpawn::new(Category::Item, fx(500), fx(500), fx(8), fx(16)))
            .unwrap();
        assert!(world.set_origin(&mut NoHooks, kart, fx(510), fx(500), fx(0)));

        let mut hooks = Recorder::default();
        world.dispatch(&mut hooks);
        assert_eq!(hooks.touches, vec![(kart, item), (item, kart)]);
    }

    /// Deletes whatever tries to pick something up.
    struct Trap;

    impl InteractionHooks for Trap {
        fn on_pickup(&mut self, world: &mut PhysicsWorld, mover: ObjectId, _other: ObjectId) {
            world.remove(mover);
        }
    }

    #[test]
    fn removal_during_teleport_returns_false() {
        let mut world = world_with(open_room());
        let kart = kart_at(&mut world, 100, 100);
        world
            .spawn(MobjSpawn::new(Category::Pickup, fx(500), fx(500), fx(8), fx(16)))
            .unwrap();
        assert!(!world.set_origin(&mut Trap, kart, fx(505), fx(500), fx(0)));
        assert!(!world.contains(kart));
    }
}
