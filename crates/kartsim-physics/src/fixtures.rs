//! Maps and helpers shared by the physics tests.

use kartsim_core::{Fixed, LineId, SectorId};
use kartsim_entity::{MobjSpawn, ObjectId};
use kartsim_world::{ExtraFloor, Level, LevelBuilder, LineDef, Sector};

use crate::{InteractionHooks, PhysicsConfig, PhysicsWorld};

pub fn fx(v: i32) -> Fixed {
    Fixed::from_int(v)
}

/// One 1024 x 1024 room, floor 0, ceiling 256.
pub fn open_room() -> Level {
    room_with(Sector::new(fx(0), fx(256)))
}

/// The open room with a solid slab from 64 to 96 across all of it.
pub fn slab_room() -> Level {
    let mut builder = LevelBuilder::new();
    let room = builder.add_sector(Sector::new(fx(0), fx(256)));
    let control = builder.add_sector(Sector::new(fx(64), fx(96)));
    if let Some(sector) = builder.sector_mut(room) {
        sector.extra_floors.push(ExtraFloor::solid(control));
    }
    square(&mut builder, room, 1024);
    builder.build().unwrap()
}

fn room_with(sector: Sector) -> Level {
    let mut builder = LevelBuilder::new();
    let room = builder.add_sector(sector);
    square(&mut builder, room, 1024);
    builder.build().unwrap()
}

fn square(builder: &mut LevelBuilder, sector: SectorId, size: i32) {
    let v0 = builder.add_vertex(fx(0), fx(0));
    let v1 = builder.add_vertex(fx(0), fx(size));
    let v2 = builder.add_vertex(fx(size), fx(size));
    let v3 = builder.add_vertex(fx(size), fx(0));
    for (a, b) in [(v0, v1), (v1, v2), (v2, v3), (v3, v0)] {
        builder.add_line(LineDef::one_sided(a, b, sector));
    }
}

/// Room A is x 0..256, room B is x 256..512, both y 0..256.
///
/// Line 3 is the shared two-sided line at x = 256 (front B, back A) and is
/// passed through `shared` before being added. Room A is sector 0.
pub fn two_rooms(room_a: Sector, room_b: Sector, shared: impl FnOnce(LineDef) -> LineDef) -> Level {
    let mut builder = LevelBuilder::new();
    let a = builder.add_sector(room_a);
    let b = builder.add_sector(room_b);
    let v0 = builder.add_vertex(fx(0), fx(0));
    let v1 = builder.add_vertex(fx(256), fx(0));
    let v2 = builder.add_vertex(fx(512), fx(0));
    let v3 = builder.add_vertex(fx(512), fx(256));
    let v4 = builder.add_vertex(fx(256), fx(256));
    let v5 = builder.add_vertex(fx(0), fx(256));

    builder.add_line(LineDef::one_sided(v0, v5, a));
    builder.add_line(LineDef::one_sided(v5, v4, a));
    builder.add_line(LineDef::one_sided(v1, v0, a));
    builder.add_line(shared(LineDef::two_sided(v1, v4, b, a)));
    builder.add_line(LineDef::one_sided(v4, v3, b));
    builder.add_line(LineDef::one_sided(v3, v2, b));
    builder.add_line(LineDef::one_sided(v2, v1, b));
    builder.build().unwrap()
}

/// Two rooms with ceiling 256 where room B's floor is `back_floor`.
pub fn step_rooms(back_floor: i32) -> Level {
    two_rooms(
        Sector::new(fx(0), fx(256)),
        Sector::new(fx(back_floor), fx(256)),
        |line| line,
    )
}

/// Line between the two rooms.
pub const SHARED_LINE: LineId = LineId::new(3);

pub fn world_with(level: Level) -> PhysicsWorld {
    PhysicsWorld::new(level, PhysicsConfig::default())
}

/// Radius 16, height 56 kart standing on the floor.
pub fn kart_at(world: &mut PhysicsWorld, x: i32, y: i32) -> ObjectId {
    world.spawn(MobjSpawn::kart(fx(x), fx(y))).unwrap()
}

/// Records every hook call instead of acting on it.
#[derive(Debug, Default)]
pub struct Recorder {
    pub pickups: Vec<(ObjectId, ObjectId)>,
    pub touches: Vec<(ObjectId, ObjectId)>,
    pub bounces: Vec<(ObjectId, ObjectId)>,
    pub lines: Vec<(ObjectId, LineId)>,
    pub sectors: Vec<(ObjectId, SectorId)>,
}

impl InteractionHooks for Recorder {
    fn on_pickup(&mut self, _world: &mut PhysicsWorld, mover: ObjectId, other: ObjectId) {
        self.pickups.push((mover, other));
    }

    fn on_touch(&mut self, _world: &mut PhysicsWorld, toucher: ObjectId, touched: ObjectId) {
        self.touches.push((toucher, touched));
    }

    fn on_bounce(
        &mut self,
        _world: &mut PhysicsWorld,
        a: ObjectId,
        b: ObjectId,
        _relative: (Fixed, Fixed),
    ) {
        self.bounces.push((a, b));
    }

    fn on_special_line(&mut self, _world: &mut PhysicsWorld, object: ObjectId, line: LineId) {
        self.lines.push((object, line));
    }

    fn on_sector_entered(&mut self, _world: &mut PhysicsWorld, object: ObjectId, sector: SectorId) {
        self.sectors.push((object, sector));
    }
}
