//! The simulated world: level, blockmap and objects.

use hashbrown::HashSet;
use hecs::Ref;
use kartsim_core::{BBox, Error, Fixed, Result, SectorId};
use kartsim_entity::{Mobj, MobjFlags, MobjSpawn, ObjectId};
use kartsim_world::{Level, SurfaceQuery};
use tracing::{debug, trace_span};

#[cfg(feature = "profiling")]
use kartsim_profiler::{profile_scope, EventCategory};

use crate::blockmap::Blockmap;
use crate::config::PhysicsConfig;
use crate::dispatch::{EventQueue, InteractionHooks};
use crate::movement::MoveOutcome;
use crate::resolver::FiredPickups;

/// Query and work counters, for regression tests and the profiler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PhysicsStats {
    pub check_position: u64,
    pub object_queries: u64,
    pub line_queries: u64,
    pub cells_visited: u64,
    pub substeps: u64,
    pub slides: u64,
    pub teleports: u64,
    pub events_dispatched: u64,
}

/// Level geometry, its blockmap and every live object.
pub struct PhysicsWorld {
    pub(crate) level: Level,
    pub(crate) blockmap: Blockmap,
    pub(crate) objects: hecs::World,
    pub(crate) config: PhysicsConfig,
    pub(crate) stats: PhysicsStats,
    pub(crate) events: EventQueue,
    /// Pickup pairs fired so far in the running tick.
    pub(crate) tick_pickups: Option<FiredPickups>,
    /// Objects in spawn order; removed ids are pruned after each tick.
    order: Vec<ObjectId>,
    gametic: u64,
}

impl PhysicsWorld {
    pub fn new(level: Level, config: PhysicsConfig) -> Self {
        let blockmap = Blockmap::build(&level);
        Self {
            level,
            blockmap,
            objects: hecs::World::new(),
            config,
            stats: PhysicsStats::default(),
            events: EventQueue::default(),
            tick_pickups: None,
            order: Vec::new(),
            gametic: 0,
        }
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    /// Mutable level access for scripted height changes. Heights are read
    /// through the level on every query, so changes apply immediately.
    pub fn level_mut(&mut self) -> &mut Level {
        &mut self.level
    }

    pub fn blockmap(&self) -> &Blockmap {
        &self.blockmap
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut PhysicsConfig {
        &mut self.config
    }

    pub fn stats(&self) -> &PhysicsStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = PhysicsStats::default();
    }

    /// Events waiting for the next [`dispatch`](Self::dispatch).
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    pub fn gametic(&self) -> u64 {
        self.gametic
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.objects.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.objects.len() == 0
    }

    #[inline]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains(id)
    }

    /// Live objects in spawn order.
    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.order.iter().copied().filter(|&id| self.objects.contains(id))
    }

    pub fn mobj(&self, id: ObjectId) -> Option<Ref<'_, Mobj>> {
        self.objects.get::<&Mobj>(id).ok()
    }

    pub fn mobj_mut(&mut self, id: ObjectId) -> Option<&mut Mobj> {
        self.objects.query_one_mut::<&mut Mobj>(id).ok()
    }

    /// Create an object and link it into the world.
    ///
    /// Fails with [`Error::OutOfBounds`] if no sector contains the spawn point.
    pub fn spawn(&mut self, spawn: MobjSpawn) -> Result<ObjectId> {
        let (x, y) = (spawn.x, spawn.y);
        let sector = self
            .level
            .point_in_sector(x, y)
            .ok_or_else(|| Error::OutOfBounds(format!("no sector contains ({x}, {y})")))?;
        self.blockmap.fit_radius(spawn.radius);

        let mut mobj = Mobj::from_spawn(&spawn);
        let flipped = mobj.is_flipped();
        if spawn.z.is_none() {
            mobj.z = if flipped {
                self.level.ceiling_z_at(sector, x, y) - mobj.height
            } else {
                self.level.floor_z_at(sector, x, y)
            };
        }
        let surface = self.level.surface_at(sector, &surface_query(&mobj, x, y));
        if spawn.z.is_none() {
            mobj.z = if flipped {
                surface.ceilingz - mobj.height
            } else {
                surface.floorz
            };
        }
        mobj.floorz = surface.floorz;
        mobj.ceilingz = surface.ceilingz;
        mobj.dropoffz = surface.floorz;
        mobj.submerged = surface.submerged;
        mobj.sector = Some(sector);
        mobj.prev = (x, y, mobj.z);
        mobj.touching = self.touching_sectors(x, y, mobj.radius, Some(sector));
        if !mobj.flags.contains(MobjFlags::NOBLOCKMAP) {
            mobj.block = Some(self.blockmap.cell_at(x, y));
        }

        let block = mobj.block;
        let id = self.objects.spawn((mobj,));
        if block.is_some() {
            self.blockmap.link(id, x, y);
        }
        self.order.push(id);

        debug!(?id, category = spawn.category.name(), %x, %y, %sector, "spawned object");
        Ok(id)
    }

    /// Remove an object. Returns false if it was already gone.
    pub fn remove(&mut self, id: ObjectId) -> bool {
        let Some(block) = self.mobj(id).map(|mobj| mobj.block) else {
            return false;
        };
        if let Some(cell) = block {
            self.blockmap.unlink(id, cell);
        }
        debug!(?id, "removed object");
        self.objects.despawn(id).is_ok()
    }

    /// Advance every object by one tick, then drain the event queue.
    pub fn tick<H: InteractionHooks + ?Sized>(&mut self, hooks: &mut H) {
        #[cfg(feature = "profiling")]
        profile_scope!(EventCategory::Tick);
        let _span = trace_span!("tick", gametic = self.gametic).entered();

        self.tick_pickups = Some(FiredPickups::new());
        // Objects spawned by hooks during this pass start moving next tick.
        let order = self.order.clone();
        for id in order {
            if self.contains(id) {
                self.think(hooks, id);
            }
        }
        self.order.retain(|&id| self.objects.contains(id));

        self.dispatch(hooks);
        self.tick_pickups = None;
        self.gametic += 1;

        #[cfg(feature = "profiling")]
        {
            kartsim_profiler::report_world!(kartsim_profiler::WorldCounts {
                objects: u32::try_from(self.len()).unwrap_or(u32::MAX),
                pending_events: u32::try_from(self.events.len()).unwrap_or(u32::MAX),
                checks: self.stats.check_position,
            });
            kartsim_profiler::end_tick(self.gametic);
        }
    }

    fn think<H: InteractionHooks + ?Sized>(&mut self, hooks: &mut H, id: ObjectId) {
        let Some(mobj) = self.mobj_mut(id) else {
            return;
        };
        mobj.prev = (mobj.x, mobj.y, mobj.z);
        mobj.owner_grace = mobj.owner_grace.saturating_sub(1);
        let (x, y, momx, momy) = (mobj.x, mobj.y, mobj.momx, mobj.momy);

        if momx == Fixed::ZERO && momy == Fixed::ZERO {
            if !self.refresh_position(hooks, id) {
                return;
            }
        } else {
            let result = self.try_move(hooks, id, x + momx, y + momy);
            let Some(mobj) = self.mobj_mut(id) else {
                return;
            };
            match result.outcome {
                MoveOutcome::Moved => {}
                MoveOutcome::Slid => {
                    mobj.momx = result.x - x;
                    mobj.momy = result.y - y;
                }
                MoveOutcome::Blocked => {
                    mobj.momx = Fixed::ZERO;
                    mobj.momy = Fixed::ZERO;
                }
                MoveOutcome::Removed => return,
            }
        }

        self.apply_friction(id);
        self.z_movement(id);
    }

    /// Exchange the two objects' momentum along the line between their
    /// centres, as an equal-mass elastic collision. Does nothing if either
    /// object is gone or they are already separating.
    pub fn apply_bounce(&mut self, a: ObjectId, b: ObjectId) -> bool {
        let Some(first) = self.mobj(a).map(|m| (m.x, m.y, m.momx, m.momy)) else {
            return false;
        };
        let Some(second) = self.mobj(b).map(|m| (m.x, m.y, m.momx, m.momy)) else {
            return false;
        };
        let raw = |v: Fixed| i128::from(v.raw());

        let (nx, ny) = (raw(second.0 - first.0), raw(second.1 - first.1));
        let (dvx, dvy) = (raw(first.2 - second.2), raw(first.3 - second.3));
        let len2 = nx * nx + ny * ny;

        let (ix, iy) = if len2 == 0 {
            (dvx, dvy)
        } else {
            let approach = dvx * nx + dvy * ny;
            if approach <= 0 {
                return false;
            }
            (nx * approach / len2, ny * approach / len2)
        };

        if let Some(mobj) = self.mobj_mut(a) {
            mobj.momx = saturate(raw(mobj.momx) - ix);
            mobj.momy = saturate(raw(mobj.momy) - iy);
        }
        if let Some(mobj) = self.mobj_mut(b) {
            mobj.momx = saturate(raw(mobj.momx) + ix);
            mobj.momy = saturate(raw(mobj.momy) + iy);
        }
        true
    }

    /// The sector holding (x, y) plus both sides of every line crossing the
    /// object's footprint there.
    pub fn touching_sectors(
        &self,
        x: Fixed,
        y: Fixed,
        radius: Fixed,
        center: Option<SectorId>,
    ) -> HashSet<SectorId> {
        let bbox = BBox::around(x, y, radius);
        let mut touching: HashSet<SectorId> = center.into_iter().collect();
        for id in self.blockmap.lines_in_box(&bbox) {
            let line = self.level.line(id);
            if bbox.crosses_segment(&line.segment()) {
                touching.insert(line.front);
                touching.extend(line.back);
            }
        }
        touching
    }
}

/// Height query for `mobj` as if it stood at (x, y).
pub(crate) fn surface_query(mobj: &Mobj, x: Fixed, y: Fixed) -> SurfaceQuery {
    SurfaceQuery {
        x,
        y,
        z: mobj.z,
        height: mobj.height,
        flipped: mobj.is_flipped(),
        kart: mobj.is_kart(),
    }
}

fn saturate(raw: i128) -> Fixed {
    Fixed::from_raw(raw.clamp(i128::from(i32::MIN), i128::from(i32::MAX)) as i32)
}
