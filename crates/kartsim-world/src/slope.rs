//! Sloped floor and ceiling planes.

use glam::DVec3;
use kartsim_core::{Error, Fixed, Result};
use serde::{Deserialize, Serialize};

/// A non-vertical plane used in place of a flat sector height.
///
/// Stored as an origin on the plane, the unit direction of steepest ascent
/// in the XY plane, and the rise per map unit along that direction, so a
/// height query is two fixed-point multiplies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slope {
    pub origin_x: Fixed,
    pub origin_y: Fixed,
    pub origin_z: Fixed,
    pub dir_x: Fixed,
    pub dir_y: Fixed,
    pub zdelta: Fixed,
}

impl Slope {
    /// Horizontal plane at height `z`.
    pub const fn flat(z: Fixed) -> Self {
        Self {
            origin_x: Fixed::ZERO,
            origin_y: Fixed::ZERO,
            origin_z: z,
            dir_x: Fixed::ONE,
            dir_y: Fixed::ZERO,
            zdelta: Fixed::ZERO,
        }
    }

    /// Plane through three points, given as `[x, y, z]`.
    ///
    /// Fails if the points are collinear or the plane is vertical.
    pub fn from_points(points: [[Fixed; 3]; 3]) -> Result<Self> {
        let [a, b, c] = points.map(|p| DVec3::new(p[0].to_f64(), p[1].to_f64(), p[2].to_f64()));
        let normal = (b - a).cross(c - a);
        if normal.length_squared() < f64::EPSILON {
            return Err(Error::InvalidData("slope points are collinear".into()));
        }
        if normal.z.abs() < 1e-9 {
            return Err(Error::InvalidData("slope plane is vertical".into()));
        }

        // z = a.z + gx * (x - a.x) + gy * (y - a.y)
        let gx = -normal.x / normal.z;
        let gy = -normal.y / normal.z;
        let steepness = gx.hypot(gy);
        let [ox, oy, oz] = points[0];
        if steepness < 1e-9 {
            return Ok(Self {
                origin_x: ox,
                origin_y: oy,
                ..Self::flat(oz)
            });
        }

        Ok(Self {
            origin_x: ox,
            origin_y: oy,
            origin_z: oz,
            dir_x: Fixed::from_f64(gx / steepness),
            dir_y: Fixed::from_f64(gy / steepness),
            zdelta: Fixed::from_f64(steepness),
        })
    }

    /// Height of the plane at (x, y).
    #[inline]
    pub fn z_at(&self, x: Fixed, y: Fixed) -> Fixed {
        let along = (x - self.origin_x).fixed_mul(self.dir_x)
            + (y - self.origin_y).fixed_mul(self.dir_y);
        self.origin_z + along.fixed_mul(self.zdelta)
    }

    #[inline]
    pub fn is_flat(&self) -> bool {
        self.zdelta == Fixed::ZERO
    }
}
