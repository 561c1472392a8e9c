//! Uniform grid over the level for range queries.
//!
//! Lines are bucketed once at build time into every cell their segment
//! passes through. Objects are bucketed by the cell holding their centre,
//! so object queries pad the box by the largest radius seen (at least
//! [`MAX_RADIUS`]) to catch neighbours whose centre lies in another cell.

use kartsim_core::constants::{MAP_BLOCK_UNITS, MAX_RADIUS};
use kartsim_core::{BBox, BlockPos, BlockRange, Fixed, LineId};
use kartsim_entity::ObjectId;
use kartsim_world::Level;
use tracing::debug;

#[cfg(feature = "profiling")]
use kartsim_profiler::{profile_scope, EventCategory};

/// The blockmap grid.
#[derive(Clone, Debug)]
pub struct Blockmap {
    origin_x: Fixed,
    origin_y: Fixed,
    width: i32,
    height: i32,
    lines: Vec<Vec<LineId>>,
    objects: Vec<Vec<ObjectId>>,
    /// Padding for object queries. Only ever grows.
    reach: Fixed,
}

impl Blockmap {
    /// Build the grid for `level` with a one cell margin on every side.
    pub fn build(level: &Level) -> Self {
        let cell = Fixed::from_int(MAP_BLOCK_UNITS);
        let bounds = level.bounds();
        let origin_x = bounds.left - cell;
        let origin_y = bounds.bottom - cell;
        let far = BlockPos::containing(bounds.right, bounds.top, origin_x, origin_y);
        let width = far.x + 2;
        let height = far.y + 2;
        let cells = (width * height) as usize;

        let mut map = Self {
            origin_x,
            origin_y,
            width,
            height,
            lines: vec![Vec::new(); cells],
            objects: vec![Vec::new(); cells],
            reach: MAX_RADIUS,
        };

        for (index, line) in level.lines().iter().enumerate() {
            let id = LineId::new(index as u32);
            let segment = line.segment();
            let range = map.range(&line.bbox());
            for pos in range.iter() {
                // Widen by one unit so lines lying on a cell edge land in both cells.
                if map.cell_bbox(pos).expand(Fixed::ONE).crosses_segment(&segment) {
                    let index = map.index(pos);
                    map.lines[index].push(id);
                }
            }
        }

        debug!(width, height, lines = level.lines().len(), "blockmap built");
        map
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Cell holding (x, y), clamped onto the grid.
    #[inline]
    pub fn cell_at(&self, x: Fixed, y: Fixed) -> BlockPos {
        BlockPos::containing(x, y, self.origin_x, self.origin_y).clamped(self.width, self.height)
    }

    /// Padding applied to object queries.
    #[inline]
    pub fn reach(&self) -> Fixed {
        self.reach
    }

    /// Widen object queries so an object of `radius` is found from every
    /// cell its footprint overlaps.
    pub fn fit_radius(&mut self, radius: Fixed) {
        if radius > self.reach {
            debug!(%radius, "blockmap object padding widened");
            self.reach = radius;
        }
    }

    /// Register an object at its centre. Returns the cell used.
    pub fn link(&mut self, id: ObjectId, x: Fixed, y: Fixed) -> BlockPos {
        let pos = self.cell_at(x, y);
        let index = self.index(pos);
        self.objects[index].push(id);
        pos
    }

    /// Remove an object from `pos`. Returns false if it was not there.
    pub fn unlink(&mut self, id: ObjectId, pos: BlockPos) -> bool {
        let index = self.index(pos.clamped(self.width, self.height));
        let bucket = &mut self.objects[index];
        match bucket.iter().position(|&other| other == id) {
            Some(slot) => {
                bucket.swap_remove(slot);
                true
            }
            None => false,
        }
    }

    /// Move an object between cells if its centre changed cell.
    pub fn relink(&mut self, id: ObjectId, from: Option<BlockPos>, x: Fixed, y: Fixed) -> BlockPos {
        let to = self.cell_at(x, y);
        if from == Some(to) {
            return to;
        }
        if let Some(from) = from {
            self.unlink(id, from);
        }
        self.link(id, x, y)
    }

    /// Objects that may overlap `bbox`, snapshotted at call time.
    ///
    /// The snapshot may hold ids that are removed before they are visited;
    /// callers check liveness per item.
    pub fn objects_in_box(&self, bbox: &BBox) -> BoxObjects {
        #[cfg(feature = "profiling")]
        profile_scope!(EventCategory::BlockmapQuery);
        let range = self.range(&bbox.expand(self.reach));
        let ids = range
            .iter()
            .flat_map(|pos| self.objects[self.index(pos)].iter().copied())
            .collect();
        BoxObjects {
            ids,
            next: 0,
            cells: range.len(),
        }
    }

    /// Lines whose cells overlap `bbox`, sorted and without duplicates.
    pub fn lines_in_box(&self, bbox: &BBox) -> Vec<LineId> {
        #[cfg(feature = "profiling")]
        profile_scope!(EventCategory::BlockmapQuery);
        let mut lines: Vec<LineId> = self
            .range(bbox)
            .iter()
            .flat_map(|pos| self.lines[self.index(pos)].iter().copied())
            .collect();
        lines.sort_unstable();
        lines.dedup();
        lines
    }

    /// Number of cells `lines_in_box` would visit for `bbox`.
    pub fn cells_in_box(&self, bbox: &BBox) -> usize {
        self.range(bbox).len()
    }

    /// Total linked objects.
    pub fn object_count(&self) -> usize {
        self.objects.iter().map(Vec::len).sum()
    }

    #[inline]
    fn range(&self, bbox: &BBox) -> BlockRange {
        BlockRange::covering(bbox, self.origin_x, self.origin_y, self.width, self.height)
    }

    #[inline]
    fn index(&self, pos: BlockPos) -> usize {
        (pos.y * self.width + pos.x) as usize
    }

    fn cell_bbox(&self, pos: BlockPos) -> BBox {
        let size = Fixed::from_int(MAP_BLOCK_UNITS);
        let left = self.origin_x + size * pos.x;
        let bottom = self.origin_y + size * pos.y;
        BBox::new(left, left + size, bottom, bottom + size)
    }
}

/// Snapshot of the objects near a box.
///
/// Cloning restarts iteration from the clone's current position.
#[derive(Clone, Debug)]
pub struct BoxObjects {
    ids: Vec<ObjectId>,
    next: usize,
    cells: usize,
}

impl BoxObjects {
    /// Cells scanned to build the snapshot.
    pub fn cells(&self) -> usize {
        self.cells
    }
}

impl Iterator for BoxObjects {
    type Item = ObjectId;

    fn next(&mut self) -> Option<ObjectId> {
        let id = self.ids.get(self.next).copied();
        self.next += 1;
        id
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.ids.len().saturating_sub(self.next);
        (left, Some(left))
    }
}

impl ExactSizeIterator for BoxObjects {}
