//! Level container, builder and validation.

use kartsim_core::{
    BBox, BlockPos, BlockRange, Error, Fixed, LineId, Result, SectorId, Segment, SlopeId, VertexId,
};

use crate::line::{Line, LineDef, LineFlags, Vertex};
use crate::sector::{ExtraFloor, Sector};
use crate::slope::Slope;

/// Static level geometry.
#[derive(Clone, Debug)]
pub struct Level {
    vertices: Vec<Vertex>,
    lines: Vec<Line>,
    sectors: Vec<Sector>,
    slopes: Vec<Slope>,
    /// Lines bordering each sector on exactly one side.
    sector_lines: Vec<Vec<LineId>>,
    /// Bounding box of each sector's boundary, `None` for sectors with no lines.
    sector_bounds: Vec<Option<BBox>>,
    sector_grid: SectorGrid,
    bounds: BBox,
}

impl Level {
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    #[inline]
    pub fn line(&self, id: LineId) -> &Line {
        &self.lines[id.index()]
    }

    #[inline]
    pub fn sector(&self, id: SectorId) -> &Sector {
        &self.sectors[id.index()]
    }

    #[inline]
    pub fn slope(&self, id: SlopeId) -> &Slope {
        &self.slopes[id.index()]
    }

    /// Bounding box of every vertex.
    pub fn bounds(&self) -> BBox {
        self.bounds
    }

    /// Lines bordering `sector` on exactly one side.
    pub fn sector_lines(&self, sector: SectorId) -> &[LineId] {
        &self.sector_lines[sector.index()]
    }

    /// Move a sector's flat floor height (scripted platforms, crushers).
    pub fn set_floor_height(&mut self, sector: SectorId, height: Fixed) {
        tracing::trace!(%sector, %height, "floor height changed");
        self.sectors[sector.index()].floor_height = height;
    }

    /// Move a sector's flat ceiling height.
    pub fn set_ceiling_height(&mut self, sector: SectorId, height: Fixed) {
        tracing::trace!(%sector, %height, "ceiling height changed");
        self.sectors[sector.index()].ceiling_height = height;
    }

    /// Toggle extra floor flags at runtime (e.g. a crumbling platform).
    pub fn set_extra_floor(&mut self, sector: SectorId, index: usize, extra: ExtraFloor) {
        self.sectors[sector.index()].extra_floors[index] = extra;
    }

    /// Floor height of `sector` at (x, y), honouring its floor slope.
    #[inline]
    pub fn floor_z_at(&self, sector: SectorId, x: Fixed, y: Fixed) -> Fixed {
        let s = self.sector(sector);
        s.floor_slope
            .map_or(s.floor_height, |id| self.slope(id).z_at(x, y))
    }

    /// Ceiling height of `sector` at (x, y), honouring its ceiling slope.
    #[inline]
    pub fn ceiling_z_at(&self, sector: SectorId, x: Fixed, y: Fixed) -> Fixed {
        let s = self.sector(sector);
        s.ceiling_slope
            .map_or(s.ceiling_height, |id| self.slope(id).z_at(x, y))
    }

    /// Top and bottom of an extra floor at (x, y).
    #[inline]
    pub fn slab_at(&self, extra: &ExtraFloor, x: Fixed, y: Fixed) -> (Fixed, Fixed) {
        (
            self.floor_z_at(extra.control, x, y),
            self.ceiling_z_at(extra.control, x, y),
        )
    }

    /// Sectors whose bounds overlap the grid cell holding (x, y).
    pub fn sector_candidates(&self, x: Fixed, y: Fixed) -> &[SectorId] {
        self.sector_grid.cell(x, y)
    }

    /// Sector containing (x, y), if any.
    pub fn point_in_sector(&self, x: Fixed, y: Fixed) -> Option<SectorId> {
        self.sector_candidates(x, y)
            .iter()
            .copied()
            .filter(|sector| {
                self.sector_bounds[sector.index()].is_some_and(|b| b.contains_point(x, y))
            })
            .find(|&sector| {
                let crossings = self
                    .sector_lines(sector)
                    .iter()
                    .filter(|&&line| self.line(line).segment.crosses_ray_from(x, y))
                    .count();
                crossings % 2 == 1
            })
    }
}

/// Coarse grid over the level bounds listing the sectors whose bounding
/// box overlaps each cell. Cells are the size of a blockmap cell.
#[derive(Clone, Debug)]
struct SectorGrid {
    origin_x: Fixed,
    origin_y: Fixed,
    width: i32,
    height: i32,
    cells: Vec<Vec<SectorId>>,
}

impl SectorGrid {
    fn build(bounds: &BBox, sector_bounds: &[Option<BBox>]) -> Self {
        let (origin_x, origin_y) = (bounds.left, bounds.bottom);
        let far = BlockPos::containing(bounds.right, bounds.top, origin_x, origin_y);
        let (width, height) = (far.x + 1, far.y + 1);
        let mut cells = vec![Vec::new(); (width * height) as usize];

        for (index, sector) in sector_bounds.iter().enumerate() {
            let Some(sector) = sector else {
                continue;
            };
            let range = BlockRange::covering(sector, origin_x, origin_y, width, height);
            for pos in range.iter() {
                cells[(pos.y * width + pos.x) as usize].push(SectorId::new(index as u32));
            }
        }

        Self {
            origin_x,
            origin_y,
            width,
            height,
            cells,
        }
    }

    fn cell(&self, x: Fixed, y: Fixed) -> &[SectorId] {
        let pos = BlockPos::containing(x, y, self.origin_x, self.origin_y);
        if pos.x < 0 || pos.y < 0 || pos.x >= self.width || pos.y >= self.height {
            return &[];
        }
        &self.cells[(pos.y * self.width + pos.x) as usize]
    }
}

/// Builds and validates a [`Level`].
#[derive(Clone, Debug, Default)]
pub struct LevelBuilder {
    vertices: Vec<Vertex>,
    lines: Vec<LineDef>,
    sectors: Vec<Sector>,
    slopes: Vec<Slope>,
}

impl LevelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, x: Fixed, y: Fixed) -> VertexId {
        self.vertices.push(Vertex::new(x, y));
        VertexId::new(self.vertices.len() as u32 - 1)
    }

    pub fn add_sector(&mut self, sector: Sector) -> SectorId {
        self.sectors.push(sector);
        SectorId::new(self.sectors.len() as u32 - 1)
    }

    pub fn add_slope(&mut self, slope: Slope) -> SlopeId {
        self.slopes.push(slope);
        SlopeId::new(self.slopes.len() as u32 - 1)
    }

    pub fn add_line(&mut self, line: LineDef) -> LineId {
        self.lines.push(line);
        LineId::new(self.lines.len() as u32 - 1)
    }

    /// Mutable access to a sector added earlier, e.g. to attach extra floors
    /// whose control sectors are created afterwards.
    pub fn sector_mut(&mut self, id: SectorId) -> Option<&mut Sector> {
        self.sectors.get_mut(id.index())
    }

    /// Validate references and heights and produce the level.
    pub fn build(self) -> Result<Level> {
        let sector_count = self.sectors.len();
        let check_sector = |id: SectorId, what: &str| -> Result<()> {
            if id.index() < sector_count {
                Ok(())
            } else {
                Err(Error::OutOfBounds(format!("{what} references missing {id}")))
            }
        };

        for (index, sector) in self.sectors.iter().enumerate() {
            let id = SectorId::new(index as u32);
            for slope in [sector.floor_slope, sector.ceiling_slope].into_iter().flatten() {
                if slope.index() >= self.slopes.len() {
                    return Err(Error::OutOfBounds(format!("{id} references missing {slope}")));
                }
            }
            if sector.floor_slope.is_none()
                && sector.ceiling_slope.is_none()
                && sector.floor_height > sector.ceiling_height
            {
                return Err(Error::InvalidData(format!(
                    "{id} floor {} is above ceiling {}",
                    sector.floor_height, sector.ceiling_height
                )));
            }
            for extra in &sector.extra_floors {
                check_sector(extra.control, &id.to_string())?;
                if extra.control == id {
                    return Err(Error::InvalidData(format!("{id} controls its own extra floor")));
                }
            }
        }

        let mut lines = Vec::with_capacity(self.lines.len());
        let mut sector_lines = vec![Vec::new(); sector_count];
        for (index, def) in self.lines.iter().enumerate() {
            let id = LineId::new(index as u32);
            let vertex = |v: VertexId| {
                self.vertices
                    .get(v.index())
                    .copied()
                    .ok_or_else(|| Error::OutOfBounds(format!("{id} references missing {v}")))
            };
            let (a, b) = (vertex(def.v1)?, vertex(def.v2)?);
            if a == b {
                return Err(Error::InvalidData(format!("{id} has zero length")));
            }
            check_sector(def.front, &id.to_string())?;
            if let Some(back) = def.back {
                check_sector(back, &id.to_string())?;
            } else if def.flags.contains(LineFlags::TWO_SIDED) {
                return Err(Error::InvalidData(format!("{id} is two-sided without a back sector")));
            }

            let mut flags = def.flags;
            flags.set(LineFlags::TWO_SIDED, def.back.is_some());
            let segment = Segment::new(a.x, a.y, b.x, b.y);
            let line = Line {
                v1: def.v1,
                v2: def.v2,
                front: def.front,
                back: def.back,
                flags,
                special: def.special,
                tag: def.tag,
                segment,
                bbox: segment.bbox(),
            };
            for sector in [Some(def.front), def.back].into_iter().flatten() {
                if line.bounds_sector(sector) {
                    sector_lines[sector.index()].push(id);
                }
            }
            lines.push(line);
        }

        let sector_bounds: Vec<Option<BBox>> = sector_lines
            .iter()
            .map(|ids: &Vec<LineId>| {
                ids.iter()
                    .map(|id| lines[id.index()].bbox)
                    .reduce(|acc: BBox, b| acc.merge(&b))
            })
            .collect();

        let mut bounds = match self.vertices.first() {
            Some(v) => BBox::new(v.x, v.x, v.y, v.y),
            None => return Err(Error::InvalidData("level has no vertices".into())),
        };
        for v in &self.vertices {
            bounds.add_point(v.x, v.y);
        }
        let sector_grid = SectorGrid::build(&bounds, &sector_bounds);

        tracing::debug!(
            vertices = self.vertices.len(),
            lines = lines.len(),
            sectors = sector_count,
            slopes = self.slopes.len(),
            "level built"
        );

        Ok(Level {
            vertices: self.vertices,
            lines,
            sectors: self.sectors,
            slopes: self.slopes,
            sector_lines,
            sector_bounds,
            sector_grid,
            bounds,
        })
    }
}

/// Small hand-made maps shared by the tests in this crate.
#[cfg(test)]
pub(crate) mod test_maps {
    use super::*;

    pub fn fx(v: i32) -> Fixed {
        Fixed::from_int(v)
    }

    /// Two 256x256 rooms side by side. Room A spans x 0..256 and room B
    /// x 256..512, joined by a two-sided line at x = 256.
    pub fn two_rooms(room_a: Sector, room_b: Sector) -> (LevelBuilder, SectorId, SectorId) {
        let mut b = LevelBuilder::new();
        let a = b.add_sector(room_a);
        let bs = b.add_sector(room_b);
        let v0 = b.add_vertex(fx(0), fx(0));
        let v1 = b.add_vertex(fx(256), fx(0));
        let v2 = b.add_vertex(fx(512), fx(0));
        let v3 = b.add_vertex(fx(512), fx(256));
        let v4 = b.add_vertex(fx(256), fx(256));
        let v5 = b.add_vertex(fx(0), fx(256));
        b.add_line(LineDef::one_sided(v0, v5, a));
        b.add_line(LineDef::one_sided(v5, v4, a));
        b.add_line(LineDef::one_sided(v1, v0, a));
        b.add_line(LineDef::two_sided(v1, v4, bs, a));
        b.add_line(LineDef::one_sided(v4, v3, bs));
        b.add_line(LineDef::one_sided(v3, v2, bs));
        b.add_line(LineDef::one_sided(v2, v1, bs));
        (b, a, bs)
    }
}
