//! Moving objects: sub-stepped XY moves with wall sliding, vertical
//! movement and ground friction.

use kartsim_core::constants::MAP_BLOCK_UNITS;
use kartsim_core::{Fixed, SectorId};
use kartsim_entity::{Mobj, MobjFlags, ObjectId};
use tracing::{debug, trace};

#[cfg(feature = "profiling")]
use kartsim_profiler::{profile_scope, EventCategory};

use crate::dispatch::{InteractionHooks, PhysicsEvent};
use crate::resolver::{Blocker, ContactKind, FiredPickups, Outcome, Verdict};
use crate::world::PhysicsWorld;

/// Momentum below this after friction is zeroed.
const STOPSPEED: Fixed = Fixed::from_raw(0x1000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Reached the target.
    Moved,
    /// Blocked by a wall, then moved some distance along it.
    Slid,
    /// Stopped short; the object may still have advanced part of the way.
    Blocked,
    /// Removed by a hook during the move.
    Removed,
}

/// Where a move ended and why.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveResult {
    pub outcome: MoveOutcome,
    pub x: Fixed,
    pub y: Fixed,
    /// What stopped the straight part of the move, if anything.
    pub blocker: Option<Blocker>,
}

impl MoveResult {
    /// True if the object reached the target or slid.
    #[inline]
    pub fn moved(&self) -> bool {
        matches!(self.outcome, MoveOutcome::Moved | MoveOutcome::Slid)
    }
}

enum StepRun {
    Done,
    Stopped(Blocker),
    Removed,
}

impl PhysicsWorld {
    /// Move `id` towards (x, y) in steps short enough not to skip over
    /// thin walls. Each accepted step is committed before the next is
    /// checked. When a wall stops the move, the rest of the displacement
    /// is projected onto the wall and tried once. Each pickup pair fires
    /// at most once over the whole move.
    pub fn try_move<H: InteractionHooks + ?Sized>(
        &mut self,
        hooks: &mut H,
        id: ObjectId,
        x: Fixed,
        y: Fixed,
    ) -> MoveResult {
        #[cfg(feature = "profiling")]
        profile_scope!(EventCategory::TryMove);

        let Some((start_x, start_y)) = self.position(id) else {
            return MoveResult::removed(x, y);
        };

        let mut fired = FiredPickups::new();
        let blocker = match self.step_towards(hooks, id, (x - start_x, y - start_y), &mut fired) {
            StepRun::Removed => return MoveResult::removed(start_x, start_y),
            StepRun::Done => return self.result(id, MoveOutcome::Moved, None),
            StepRun::Stopped(blocker) => blocker,
        };

        let Some((stop_x, stop_y)) = self.position(id) else {
            return MoveResult::removed(start_x, start_y);
        };
        let Blocker::Line(line) = blocker else {
            debug!(?id, ?blocker, "move blocked");
            return self.result(id, MoveOutcome::Blocked, Some(blocker));
        };

        let (slide_x, slide_y) = self.level.line(line).segment().project(x - stop_x, y - stop_y);
        if slide_x == Fixed::ZERO && slide_y == Fixed::ZERO {
            debug!(?id, %line, "move blocked head-on");
            return self.result(id, MoveOutcome::Blocked, Some(blocker));
        }

        self.stats.slides += 1;
        trace!(?id, %line, dx = %slide_x, dy = %slide_y, "sliding");
        if let StepRun::Removed = self.step_towards(hooks, id, (slide_x, slide_y), &mut fired) {
            return MoveResult::removed(stop_x, stop_y);
        }
        match self.position(id) {
            Some(end) if end != (stop_x, stop_y) => {
                self.result(id, MoveOutcome::Slid, Some(blocker))
            }
            Some(_) => self.result(id, MoveOutcome::Blocked, Some(blocker)),
            None => MoveResult::removed(stop_x, stop_y),
        }
    }

    /// Run the sub-steps of a displacement, committing each accepted one.
    fn step_towards<H: InteractionHooks + ?Sized>(
        &mut self,
        hooks: &mut H,
        id: ObjectId,
        (dx, dy): (Fixed, Fixed),
        fired: &mut FiredPickups,
    ) -> StepRun {
        let Some((x0, y0, radius)) = self.mobj(id).map(|m| (m.x, m.y, m.radius)) else {
            return StepRun::Removed;
        };
        let steps = self.substeps_for(radius, dx, dy);

        for step in 1..=steps {
            let x = x0 + fraction_of(dx, step, steps);
            let y = y0 + fraction_of(dy, step, steps);
            self.stats.substeps += 1;

            let verdict = self.check_position_within(hooks, id, x, y, fired);
            match verdict.outcome {
                Outcome::Removed => return StepRun::Removed,
                Outcome::Blocked(blocker) => {
                    trace!(?id, step, steps, ?blocker, "sub-step rejected");
                    self.queue_special_lines(id, &verdict);
                    return StepRun::Stopped(blocker);
                }
                Outcome::Accepted => {
                    if !self.commit(id, x, y, &verdict, true) {
                        return StepRun::Removed;
                    }
                }
            }
        }
        StepRun::Done
    }

    /// Number of sub-steps for a displacement. A move no longer than one
    /// radius is a single step; longer moves advance at most a fraction of
    /// a radius along either axis per step.
    fn substeps_for(&self, radius: Fixed, dx: Fixed, dy: Fixed) -> u32 {
        let (dx, dy) = (i128::from(dx.raw()), i128::from(dy.raw()));
        let reach = i128::from(radius.raw());
        if dx * dx + dy * dy <= reach * reach {
            return 1;
        }
        let step = radius
            .min(Fixed::from_int(MAP_BLOCK_UNITS))
            .fixed_mul(self.config.substep_fraction)
            .max(Fixed::ONE);
        let step = i128::from(step.raw());
        let longest = dx.abs().max(dy.abs());
        let count = (longest + step - 1) / step;
        count.clamp(1, i128::from(u32::MAX)) as u32
    }

    /// Apply an accepted (or teleport) verdict at (x, y): position, height
    /// caches, touching sectors, blockmap cell and deferred events.
    /// Returns false if the object no longer exists.
    pub(crate) fn commit(
        &mut self,
        id: ObjectId,
        x: Fixed,
        y: Fixed,
        verdict: &Verdict,
        clamp_z: bool,
    ) -> bool {
        let Some(radius) = self.mobj(id).map(|m| m.radius) else {
            return false;
        };
        self.blockmap.fit_radius(radius);
        let touching = self.touching_sectors(x, y, radius, verdict.sector);
        let max_step = self.config.max_step;

        let Ok(mobj) = self.objects.query_one_mut::<&mut Mobj>(id) else {
            return false;
        };
        let was_grounded = mobj.on_ground();
        mobj.x = x;
        mobj.y = y;
        mobj.floorz = verdict.floorz;
        mobj.ceilingz = verdict.ceilingz;
        mobj.dropoffz = verdict.dropoffz;
        mobj.sector = verdict.sector;
        mobj.submerged = verdict.submerged;
        if clamp_z && !mobj.flags.contains(MobjFlags::NOCLIPHEIGHT) {
            clamp_height(mobj, was_grounded, max_step);
        }

        let mut entered: Vec<SectorId> = touching
            .iter()
            .filter(|sector| !mobj.touching.contains(*sector))
            .filter(|sector| self.level.sector(**sector).is_special())
            .copied()
            .collect();
        entered.sort_unstable();
        mobj.touching = touching;

        if !mobj.flags.contains(MobjFlags::NOBLOCKMAP) {
            mobj.block = Some(self.blockmap.relink(id, mobj.block, x, y));
        }
        let momentum = (mobj.momx, mobj.momy);

        for contact in &verdict.contacts {
            let event = match contact.kind {
                ContactKind::Touch => PhysicsEvent::Touch {
                    a: id,
                    b: contact.other,
                },
                ContactKind::Bounce => {
                    let Some(other) = self.mobj(contact.other).map(|m| (m.momx, m.momy)) else {
                        continue;
                    };
                    PhysicsEvent::Bounce {
                        a: id,
                        b: contact.other,
                        relative: (momentum.0 - other.0, momentum.1 - other.1),
                    }
                }
            };
            self.events.push(event);
        }
        self.queue_special_lines(id, verdict);
        for sector in entered {
            self.events.push(PhysicsEvent::SectorEntered { object: id, sector });
        }
        true
    }

    fn queue_special_lines(&mut self, id: ObjectId, verdict: &Verdict) {
        for &line in &verdict.special_lines {
            self.events.push(PhysicsEvent::SpecialLine { object: id, line });
        }
    }

    /// Re-check a stationary object in place, picking up height changes
    /// and objects that moved into it. Returns false if it was removed.
    pub(crate) fn refresh_position<H: InteractionHooks + ?Sized>(
        &mut self,
        hooks: &mut H,
        id: ObjectId,
    ) -> bool {
        let Some((x, y)) = self.position(id) else {
            return false;
        };
        let mut verdict = self.check_position(hooks, id, x, y);
        if verdict.outcome == Outcome::Removed {
            return false;
        }
        verdict.contacts.clear();
        verdict.special_lines.clear();
        self.commit(id, x, y, &verdict, false)
    }

    /// Gravity and vertical momentum, clamped between floor and ceiling.
    pub fn z_movement(&mut self, id: ObjectId) {
        let gravity = self.config.gravity;
        let Some(mobj) = self.mobj_mut(id) else {
            return;
        };
        if !mobj.flags.contains(MobjFlags::NOGRAVITY) && !mobj.on_ground() {
            if mobj.is_flipped() {
                mobj.momz += gravity;
            } else {
                mobj.momz -= gravity;
            }
        }
        mobj.z += mobj.momz;
        if mobj.flags.contains(MobjFlags::NOCLIPHEIGHT) {
            return;
        }

        if mobj.z < mobj.floorz {
            mobj.z = mobj.floorz;
            mobj.momz = mobj.momz.max(Fixed::ZERO);
        }
        if mobj.top() > mobj.ceilingz {
            mobj.z = (mobj.ceilingz - mobj.height).max(mobj.floorz);
            mobj.momz = mobj.momz.min(Fixed::ZERO);
        }
    }

    /// Slow down grounded objects.
    pub fn apply_friction(&mut self, id: ObjectId) {
        let friction = self.config.friction;
        let Some(mobj) = self.mobj_mut(id) else {
            return;
        };
        if !mobj.on_ground() {
            return;
        }
        for momentum in [&mut mobj.momx, &mut mobj.momy] {
            *momentum = momentum.fixed_mul(friction);
            if momentum.abs() < STOPSPEED {
                *momentum = Fixed::ZERO;
            }
        }
    }

    fn position(&self, id: ObjectId) -> Option<(Fixed, Fixed)> {
        self.mobj(id).map(|m| (m.x, m.y))
    }

    fn result(&self, id: ObjectId, outcome: MoveOutcome, blocker: Option<Blocker>) -> MoveResult {
        match self.position(id) {
            Some((x, y)) => MoveResult {
                outcome,
                x,
                y,
                blocker,
            },
            None => MoveResult::removed(Fixed::ZERO, Fixed::ZERO),
        }
    }
}

impl MoveResult {
    fn removed(x: Fixed, y: Fixed) -> Self {
        Self {
            outcome: MoveOutcome::Removed,
            x,
            y,
            blocker: None,
        }
    }
}

/// `d * step / steps` without accumulating rounding error.
fn fraction_of(d: Fixed, step: u32, steps: u32) -> Fixed {
    Fixed::from_raw((i64::from(d.raw()) * i64::from(step) / i64::from(steps)) as i32)
}

/// Step up onto a higher floor, snap down small drops if the object was
/// grounded, and keep it under the ceiling. Mirrored under reverse gravity.
fn clamp_height(mobj: &mut Mobj, was_grounded: bool, max_step: Fixed) {
    let sticks = was_grounded && !mobj.flags.contains(MobjFlags::FLOAT);
    if mobj.is_flipped() {
        if mobj.top() > mobj.ceilingz || (sticks && mobj.ceilingz - mobj.top() <= max_step) {
            mobj.z = mobj.ceilingz - mobj.height;
        }
        mobj.z = mobj.z.max(mobj.floorz);
    } else {
        if mobj.z < mobj.floorz || (sticks && mobj.z - mobj.floorz <= max_step) {
            mobj.z = mobj.floorz;
        }
        if mobj.top() > mobj.ceilingz {
            mobj.z = (mobj.ceilingz - mobj.height).max(mobj.floorz);
        }
    }
}
