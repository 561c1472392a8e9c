//! Vertices and lines (linedefs).

use bitflags::bitflags;
use kartsim_core::{BBox, Fixed, SectorId, Segment, Side, VertexId};
use serde::{Deserialize, Serialize};

/// A map vertex.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    pub x: Fixed,
    pub y: Fixed,
}

impl Vertex {
    #[inline]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }
}

bitflags! {
    /// Line behaviour flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct LineFlags: u16 {
        /// Blocks every object regardless of the opening.
        const IMPASSABLE = 1 << 0;
        /// Blocks karts only.
        const BLOCK_KARTS = 1 << 1;
        /// Has a back sector.
        const TWO_SIDED = 1 << 2;
        /// Raises a special-line event when touched.
        const TRIGGER = 1 << 3;
    }
}

/// Line description handed to the [`LevelBuilder`](crate::LevelBuilder).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineDef {
    pub v1: VertexId,
    pub v2: VertexId,
    pub front: SectorId,
    pub back: Option<SectorId>,
    pub flags: LineFlags,
    pub special: u16,
    pub tag: u16,
}

impl LineDef {
    /// A wall with a sector on its front side only.
    pub const fn one_sided(v1: VertexId, v2: VertexId, front: SectorId) -> Self {
        Self {
            v1,
            v2,
            front,
            back: None,
            flags: LineFlags::empty(),
            special: 0,
            tag: 0,
        }
    }

    /// A boundary between two sectors.
    pub const fn two_sided(v1: VertexId, v2: VertexId, front: SectorId, back: SectorId) -> Self {
        Self {
            v1,
            v2,
            front,
            back: Some(back),
            flags: LineFlags::TWO_SIDED,
            special: 0,
            tag: 0,
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: LineFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Mark as a trigger line with the given special and tag.
    #[must_use]
    pub fn with_special(mut self, special: u16, tag: u16) -> Self {
        self.special = special;
        self.tag = tag;
        self.flags |= LineFlags::TRIGGER;
        self
    }
}

/// A resolved line inside a built [`Level`](crate::Level).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    pub v1: VertexId,
    pub v2: VertexId,
    pub front: SectorId,
    pub back: Option<SectorId>,
    pub flags: LineFlags,
    pub special: u16,
    pub tag: u16,
    pub(crate) segment: Segment,
    pub(crate) bbox: BBox,
}

impl Line {
    #[inline]
    pub fn segment(&self) -> Segment {
        self.segment
    }

    #[inline]
    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    #[inline]
    pub fn is_two_sided(&self) -> bool {
        self.back.is_some()
    }

    #[inline]
    pub fn is_trigger(&self) -> bool {
        self.flags.contains(LineFlags::TRIGGER)
    }

    /// Sector on the given side of the line.
    #[inline]
    pub fn sector_on(&self, side: Side) -> Option<SectorId> {
        match side {
            Side::Front => Some(self.front),
            Side::Back => self.back,
        }
    }

    /// Check if the line borders `sector` on exactly one side.
    #[inline]
    pub fn bounds_sector(&self, sector: SectorId) -> bool {
        (self.front == sector) != (self.back == Some(sector))
    }
}
