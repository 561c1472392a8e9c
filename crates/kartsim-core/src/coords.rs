//! Blockmap cell coordinates.

use serde::{Deserialize, Serialize};

use crate::constants::{FRACBITS, MAP_BLOCK_SHIFT};
use crate::{BBox, Fixed};

/// Position of a cell in the blockmap grid, relative to the grid origin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
}

impl BlockPos {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Cell containing the map point (x, y) for a grid whose lower-left
    /// corner is (origin_x, origin_y).
    #[inline]
    pub const fn containing(x: Fixed, y: Fixed, origin_x: Fixed, origin_y: Fixed) -> Self {
        Self::new(
            cell_of(x.raw() as i64 - origin_x.raw() as i64),
            cell_of(y.raw() as i64 - origin_y.raw() as i64),
        )
    }

    /// Clamp into a `width` x `height` grid.
    #[inline]
    pub fn clamped(self, width: i32, height: i32) -> Self {
        Self::new(self.x.clamp(0, width - 1), self.y.clamp(0, height - 1))
    }
}

#[inline]
const fn cell_of(offset: i64) -> i32 {
    (offset >> (FRACBITS + MAP_BLOCK_SHIFT)) as i32
}

/// Inclusive rectangle of blockmap cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockRange {
    pub min: BlockPos,
    pub max: BlockPos,
}

impl BlockRange {
    /// Cells touched by `bbox`, clamped to a `width` x `height` grid.
    pub fn covering(
        bbox: &BBox,
        origin_x: Fixed,
        origin_y: Fixed,
        width: i32,
        height: i32,
    ) -> Self {
        let min = BlockPos::containing(bbox.left, bbox.bottom, origin_x, origin_y);
        let max = BlockPos::containing(bbox.right, bbox.top, origin_x, origin_y);
        Self {
            min: min.clamped(width, height),
            max: max.clamped(width, height),
        }
    }

    /// Iterate all cells, row by row.
    pub fn iter(self) -> impl Iterator<Item = BlockPos> {
        (self.min.y..=self.max.y)
            .flat_map(move |y| (self.min.x..=self.max.x).map(move |x| BlockPos::new(x, y)))
    }

    /// Number of cells in the range.
    pub fn len(&self) -> usize {
        let w = (self.max.x - self.min.x + 1).max(0) as usize;
        let h = (self.max.y - self.min.y + 1).max(0) as usize;
        w * h
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
