//! Deferred gameplay events and the hooks that receive them.
//!
//! Moves queue their touches, bounces and triggers here instead of calling
//! gameplay directly, so every object finishes moving before any hook runs.
//! The queue drops repeats of the same pair or trigger until it is drained.

use hashbrown::HashSet;
use kartsim_core::{Fixed, LineId, SectorId};
use kartsim_entity::{object_key, ObjectId};
use tracing::{trace, warn};

#[cfg(feature = "profiling")]
use kartsim_profiler::{profile_scope, EventCategory};

use crate::world::PhysicsWorld;

/// Gameplay callbacks.
///
/// Every hook receives the world mutably and may spawn, remove, move or
/// query objects, including re-entrant position checks.
pub trait InteractionHooks {
    /// A mover overlapped an object under a `Pickup` rule. Called in the
    /// middle of the position check; if `mover` is removed here the check
    /// reports the mover as removed. A pair fires at most once per move,
    /// and once per tick while [`PhysicsWorld::tick`] runs.
    fn on_pickup(&mut self, world: &mut PhysicsWorld, mover: ObjectId, other: ObjectId) {
        let _ = (world, mover, other);
    }

    /// Called once for each direction of a touching pair.
    fn on_touch(&mut self, world: &mut PhysicsWorld, toucher: ObjectId, touched: ObjectId) {
        let _ = (world, toucher, touched);
    }

    /// Two bouncing objects overlapped. `relative` is `a`'s momentum minus
    /// `b`'s at the time of the move. Applies an elastic rebound by default.
    fn on_bounce(
        &mut self,
        world: &mut PhysicsWorld,
        a: ObjectId,
        b: ObjectId,
        relative: (Fixed, Fixed),
    ) {
        let _ = relative;
        world.apply_bounce(a, b);
    }

    /// An object's footprint crossed a trigger line.
    fn on_special_line(&mut self, world: &mut PhysicsWorld, object: ObjectId, line: LineId) {
        let _ = (world, object, line);
    }

    /// An object started touching a sector with a non-zero special.
    fn on_sector_entered(&mut self, world: &mut PhysicsWorld, object: ObjectId, sector: SectorId) {
        let _ = (world, object, sector);
    }
}

/// Hooks with default behaviour only.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHooks;

impl InteractionHooks for NoHooks {}

/// A queued event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhysicsEvent {
    Touch {
        a: ObjectId,
        b: ObjectId,
    },
    Bounce {
        a: ObjectId,
        b: ObjectId,
        relative: (Fixed, Fixed),
    },
    SpecialLine {
        object: ObjectId,
        line: LineId,
    },
    SectorEntered {
        object: ObjectId,
        sector: SectorId,
    },
}

impl PhysicsEvent {
    fn key(&self) -> EventKey {
        match *self {
            Self::Touch { a, b } => EventKey::Touch(pair_key(a, b)),
            Self::Bounce { a, b, .. } => EventKey::Bounce(pair_key(a, b)),
            Self::SpecialLine { object, line } => EventKey::Line(object_key(object), line),
            Self::SectorEntered { object, sector } => EventKey::Sector(object_key(object), sector),
        }
    }
}

/// Unordered identity of two objects.
pub(crate) type PairKey = (u64, u64);

#[inline]
pub(crate) fn pair_key(a: ObjectId, b: ObjectId) -> PairKey {
    let (a, b) = (object_key(a), object_key(b));
    (a.min(b), a.max(b))
}

/// Identity of an event for de-duplication.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum EventKey {
    Touch(PairKey),
    Bounce(PairKey),
    Line(u64, LineId),
    Sector(u64, SectorId),
}

/// Pending events for the current batch.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<PhysicsEvent>,
    seen: HashSet<EventKey>,
}

impl EventQueue {
    /// Queue an event. Returns false if it repeats one already queued.
    pub fn push(&mut self, event: PhysicsEvent) -> bool {
        if !self.seen.insert(event.key()) {
            return false;
        }
        self.events.push(event);
        true
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PhysicsEvent> {
        self.events.iter()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.seen.clear();
    }

    /// Take every queued event and start a fresh batch.
    fn take_batch(&mut self) -> Vec<PhysicsEvent> {
        self.seen.clear();
        std::mem::take(&mut self.events)
    }
}

impl PhysicsWorld {
    /// Deliver queued events to `hooks`. Events queued by the hooks
    /// themselves are delivered in further rounds, up to the configured
    /// limit; anything left stays queued. Returns the number of hook calls.
    pub fn dispatch<H: InteractionHooks + ?Sized>(&mut self, hooks: &mut H) -> usize {
        #[cfg(feature = "profiling")]
        profile_scope!(EventCategory::Dispatch);

        let mut delivered = 0;
        for _ in 0..self.config.max_dispatch_rounds {
            if self.events.is_empty() {
                return delivered;
            }
            for event in self.events.take_batch() {
                delivered += self.deliver(hooks, event);
            }
        }
        if !self.events.is_empty() {
            warn!(
                pending = self.events.len(),
                rounds = self.config.max_dispatch_rounds,
                "event dispatch round limit reached"
            );
        }
        delivered
    }

    fn deliver<H: InteractionHooks + ?Sized>(
        &mut self,
        hooks: &mut H,
        event: PhysicsEvent,
    ) -> usize {
        trace!(?event, "dispatch");
        let mut calls = 0;
        match event {
            PhysicsEvent::Touch { a, b } => {
                if self.contains(a) && self.contains(b) {
                    hooks.on_touch(self, a, b);
                    calls += 1;
                }
                if self.contains(a) && self.contains(b) {
                    hooks.on_touch(self, b, a);
                    calls += 1;
                }
            }
            PhysicsEvent::Bounce { a, b, relative } => {
                if self.contains(a) && self.contains(b) {
                    hooks.on_bounce(self, a, b, relative);
                    calls += 1;
                }
            }
            PhysicsEvent::SpecialLine { object, line } => {
                if self.contains(object) {
                    hooks.on_special_line(self, object, line);
                    calls += 1;
                }
            }
            PhysicsEvent::SectorEntered { object, sector } => {
                if self.contains(object) {
                    hooks.on_sector_entered(self, object, sector);
                    calls += 1;
                }
            }
        }
        self.stats.events_dispatched += calls as u64;
        calls
    }
}
