//! Bounding boxes and line-side tests in fixed-point.
//!
//! Products of two coordinate differences can exceed 64 bits, so side and
//! projection tests widen to `i128` and stay exact.

use serde::{Deserialize, Serialize};

use crate::Fixed;

/// Which side of a directed line a point lies on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Right-hand side when walking from `v1` to `v2`.
    Front,
    /// Left-hand side, or exactly on the line.
    Back,
}

/// Axis-aligned bounding box in map space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BBox {
    pub left: Fixed,
    pub right: Fixed,
    pub bottom: Fixed,
    pub top: Fixed,
}

impl BBox {
    /// Create a box from its edges.
    #[inline]
    pub const fn new(left: Fixed, right: Fixed, bottom: Fixed, top: Fixed) -> Self {
        Self {
            left,
            right,
            bottom,
            top,
        }
    }

    /// Square box of half-width `radius` centred on (x, y).
    #[inline]
    pub fn around(x: Fixed, y: Fixed, radius: Fixed) -> Self {
        Self {
            left: x - radius,
            right: x + radius,
            bottom: y - radius,
            top: y + radius,
        }
    }

    /// Smallest box containing both points.
    #[inline]
    pub fn from_points(x1: Fixed, y1: Fixed, x2: Fixed, y2: Fixed) -> Self {
        Self {
            left: x1.min(x2),
            right: x1.max(x2),
            bottom: y1.min(y2),
            top: y1.max(y2),
        }
    }

    #[inline]
    pub fn width(&self) -> Fixed {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> Fixed {
        self.top - self.bottom
    }

    /// Check if a point is inside the box (edges inclusive).
    #[inline]
    pub fn contains_point(&self, x: Fixed, y: Fixed) -> bool {
        x >= self.left && x <= self.right && y >= self.bottom && y <= self.top
    }

    /// Check if the interiors of two boxes overlap. Boxes that only share an
    /// edge do not intersect.
    #[inline]
    pub fn intersects(&self, other: &BBox) -> bool {
        self.left < other.right
            && self.right > other.left
            && self.bottom < other.top
            && self.top > other.bottom
    }

    /// Grow the box by `margin` on every side.
    #[inline]
    pub fn expand(&self, margin: Fixed) -> Self {
        Self {
            left: self.left - margin,
            right: self.right + margin,
            bottom: self.bottom - margin,
            top: self.top + margin,
        }
    }

    /// Expand the box to include a point.
    #[inline]
    pub fn add_point(&mut self, x: Fixed, y: Fixed) {
        self.left = self.left.min(x);
        self.right = self.right.max(x);
        self.bottom = self.bottom.min(y);
        self.top = self.top.max(y);
    }

    /// Merge two boxes.
    #[inline]
    pub fn merge(&self, other: &BBox) -> BBox {
        BBox {
            left: self.left.min(other.left),
            right: self.right.max(other.right),
            bottom: self.bottom.min(other.bottom),
            top: self.top.max(other.top),
        }
    }

    /// The side of `seg` the whole box lies on, or `None` if the box
    /// straddles the (infinite) line.
    pub fn side_of(&self, seg: &Segment) -> Option<Side> {
        let corners = [
            (self.left, self.bottom),
            (self.left, self.top),
            (self.right, self.bottom),
            (self.right, self.top),
        ];
        let first = seg.point_side(corners[0].0, corners[0].1);
        corners[1..]
            .iter()
            .all(|&(x, y)| seg.point_side(x, y) == first)
            .then_some(first)
    }

    /// Check if the segment passes through the box: the bounding boxes
    /// overlap and the box straddles the line.
    #[inline]
    pub fn crosses_segment(&self, seg: &Segment) -> bool {
        self.intersects(&seg.bbox()) && self.side_of(seg).is_none()
    }
}

/// Directed 2D segment from (x1, y1) to (x2, y2).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub x1: Fixed,
    pub y1: Fixed,
    pub x2: Fixed,
    pub y2: Fixed,
}

impl Segment {
    #[inline]
    pub const fn new(x1: Fixed, y1: Fixed, x2: Fixed, y2: Fixed) -> Self {
        Self { x1, y1, x2, y2 }
    }

    #[inline]
    pub fn dx(&self) -> Fixed {
        self.x2 - self.x1
    }

    #[inline]
    pub fn dy(&self) -> Fixed {
        self.y2 - self.y1
    }

    #[inline]
    pub fn bbox(&self) -> BBox {
        BBox::from_points(self.x1, self.y1, self.x2, self.y2)
    }

    /// Which side of the line (x, y) is on. Points on the line are `Back`.
    #[inline]
    pub fn point_side(&self, x: Fixed, y: Fixed) -> Side {
        if self.cross(x, y) > 0 {
            Side::Front
        } else {
            Side::Back
        }
    }

    /// Signed area term; positive on the front side.
    #[inline]
    fn cross(&self, x: Fixed, y: Fixed) -> i128 {
        let px = i128::from(x.raw()) - i128::from(self.x1.raw());
        let py = i128::from(y.raw()) - i128::from(self.y1.raw());
        i128::from(self.dy().raw()) * px - py * i128::from(self.dx().raw())
    }

    /// Closest point to (x, y) on the infinite line through the segment.
    pub fn closest_point(&self, x: Fixed, y: Fixed) -> (Fixed, Fixed) {
        let dx = i128::from(self.dx().raw());
        let dy = i128::from(self.dy().raw());
        let len_sq = dx * dx + dy * dy;
        if len_sq == 0 {
            return (self.x1, self.y1);
        }
        let px = i128::from(x.raw()) - i128::from(self.x1.raw());
        let py = i128::from(y.raw()) - i128::from(self.y1.raw());
        let dot = px * dx + py * dy;
        let ox = i128::from(self.x1.raw()) + dx * dot / len_sq;
        let oy = i128::from(self.y1.raw()) + dy * dot / len_sq;
        (Fixed(saturate(ox)), Fixed(saturate(oy)))
    }

    /// Component of the vector (vx, vy) along the segment direction.
    pub fn project(&self, vx: Fixed, vy: Fixed) -> (Fixed, Fixed) {
        let dx = i128::from(self.dx().raw());
        let dy = i128::from(self.dy().raw());
        let len_sq = dx * dx + dy * dy;
        if len_sq == 0 {
            return (Fixed::ZERO, Fixed::ZERO);
        }
        let dot = i128::from(vx.raw()) * dx + i128::from(vy.raw()) * dy;
        (
            Fixed(saturate(dx * dot / len_sq)),
            Fixed(saturate(dy * dot / len_sq)),
        )
    }

    /// Check if the horizontal ray from (x, y) towards +x crosses the segment.
    /// Used for even-odd point-in-polygon tests.
    pub fn crosses_ray_from(&self, x: Fixed, y: Fixed) -> bool {
        let (y1, y2) = (self.y1, self.y2);
        if (y1 > y) == (y2 > y) {
            return false;
        }
        // x coordinate of the segment at height y, compared without division
        let dy = i128::from((y2 - y1).raw());
        let lhs = (i128::from(x.raw()) - i128::from(self.x1.raw())) * dy;
        let rhs =
            i128::from((self.x2 - self.x1).raw()) * (i128::from(y.raw()) - i128::from(y1.raw()));
        if dy > 0 {
            lhs < rhs
        } else {
            lhs > rhs
        }
    }
}

/// Clamp a wide intermediate back into `i32` range.
#[inline]
fn saturate(v: i128) -> i32 {
    v.clamp(i128::from(i32::MIN), i128::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fx(v: i32) -> Fixed {
        Fixed::from_int(v)
    }

    #[test]
    fn point_side_of_vertical_line() {
        // Walking north along x = 0: east is the right-hand (front) side.
        let seg = Segment::new(fx(0), fx(0), fx(0), fx(10));
        assert_eq!(seg.point_side(fx(5), fx(5)), Side::Front);
        assert_eq!(seg.point_side(fx(-5), fx(5)), Side::Back);
        assert_eq!(seg.point_side(fx(0), fx(5)), Side::Back);
    }

    #[test]
    fn box_straddling_line() {
        let seg = Segment::new(fx(0), fx(-100), fx(0), fx(100));
        let across = BBox::around(fx(0), fx(0), fx(16));
        let beside = BBox::around(fx(32), fx(0), fx(16));
        assert!(across.crosses_segment(&seg));
        assert!(!beside.crosses_segment(&seg));
        assert_eq!(beside.side_of(&seg), Some(Side::Front));
    }

    #[test]
    fn box_near_segment_end_does_not_cross() {
        // The infinite line passes through the box, the segment does not.
        let seg = Segment::new(fx(0), fx(0), fx(0), fx(10));
        let past_end = BBox::around(fx(0), fx(50), fx(8));
        assert!(past_end.side_of(&seg).is_none());
        assert!(!past_end.crosses_segment(&seg));
    }

    #[test]
    fn boxes_sharing_an_edge_do_not_intersect() {
        let a = BBox::new(fx(0), fx(10), fx(0), fx(10));
        let b = BBox::new(fx(10), fx(20), fx(0), fx(10));
        let c = BBox::new(fx(5), fx(15), fx(5), fx(15));
        assert!(!a.intersects(&b));
        assert!(a.intersects(&c));
    }

    #[test]
    fn closest_point_and_projection() {
        let seg = Segment::new(fx(0), fx(0), fx(10), fx(0));
        assert_eq!(seg.closest_point(fx(3), fx(7)), (fx(3), fx(0)));
        assert_eq!(seg.project(fx(4), fx(9)), (fx(4), fx(0)));

        let diag = Segment::new(fx(0), fx(0), fx(10), fx(10));
        assert_eq!(diag.project(fx(8), fx(0)), (fx(4), fx(4)));
    }

    #[test]
    fn ray_crossing_counts() {
        let seg = Segment::new(fx(10), fx(-10), fx(10), fx(10));
        assert!(seg.crosses_ray_from(fx(0), fx(0)));
        assert!(!seg.crosses_ray_from(fx(20), fx(0)));
        assert!(!seg.crosses_ray_from(fx(0), fx(20)));
    }
}
