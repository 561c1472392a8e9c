//! The demo track: two connected rooms with a ramp, a platform and a finish
//! line.

use kartsim_core::{Fixed, Result};
use kartsim_world::{ExtraFloor, ExtraFloorFlags, Level, LevelBuilder, LineDef, Sector, Slope};

/// Special on the line between the two rooms.
pub const FINISH_LINE: u16 = 1;
/// Special on the ramp room.
pub const BOOST_SECTOR: u16 = 2;

/// Size of one room along each axis.
pub const ROOM: i32 = 1024;

pub fn fx(v: i32) -> Fixed {
    Fixed::from_int(v)
}

/// Pit lane on the west (x 0..1024), ramp room on the east (x 1024..2048).
///
/// The pit lane has a drive-under platform from 160 to 168. The ramp room's
/// floor rises 48 units from west to east.
pub fn build() -> Result<Level> {
    let mut builder = LevelBuilder::new();

    let ramp = builder.add_slope(Slope::from_points([
        [fx(ROOM), fx(0), fx(0)],
        [fx(2 * ROOM), fx(0), fx(48)],
        [fx(ROOM), fx(ROOM), fx(0)],
    ])?);
    let platform = builder.add_sector(Sector::new(fx(160), fx(168)));
    let pit = builder.add_sector(Sector::new(fx(0), fx(512)).with_extra_floor(ExtraFloor::new(
        platform,
        ExtraFloorFlags::EXISTS | ExtraFloorFlags::SOLID | ExtraFloorFlags::PLATFORM,
    )));
    let east = builder.add_sector(
        Sector::new(fx(0), fx(512))
            .with_floor_slope(ramp)
            .with_special(BOOST_SECTOR, 0),
    );

    let v0 = builder.add_vertex(fx(0), fx(0));
    let v1 = builder.add_vertex(fx(ROOM), fx(0));
    let v2 = builder.add_vertex(fx(2 * ROOM), fx(0));
    let v3 = builder.add_vertex(fx(2 * ROOM), fx(ROOM));
    let v4 = builder.add_vertex(fx(ROOM), fx(ROOM));
    let v5 = builder.add_vertex(fx(0), fx(ROOM));

    builder.add_line(LineDef::one_sided(v0, v5, pit));
    builder.add_line(LineDef::one_sided(v5, v4, pit));
    builder.add_line(LineDef::one_sided(v1, v0, pit));
    builder.add_line(LineDef::two_sided(v1, v4, east, pit).with_special(FINISH_LINE, 0));
    builder.add_line(LineDef::one_sided(v4, v3, east));
    builder.add_line(LineDef::one_sided(v3, v2, east));
    builder.add_line(LineDef::one_sided(v2, v1, east));

    builder.build()
}
