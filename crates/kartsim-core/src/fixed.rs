//! 16.16 fixed-point scalar.
//!
//! All positions, heights and momenta in the simulation are stored as
//! [`Fixed`] so that a tick produces bit-identical results on every machine.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::constants::{FRACBITS, FRACUNIT};

/// Signed 16.16 fixed-point number.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Pod,
    Zeroable,
    Serialize,
    Deserialize,
)]
#[repr(transparent)]
pub struct Fixed(pub i32);

impl Fixed {
    /// 0.0
    pub const ZERO: Self = Self(0);
    /// 1.0
    pub const ONE: Self = Self(FRACUNIT);
    /// Largest representable value.
    pub const MAX: Self = Self(i32::MAX);
    /// Smallest representable value.
    pub const MIN: Self = Self(i32::MIN);

    /// Create from a whole number of map units.
    #[inline]
    pub const fn from_int(units: i32) -> Self {
        Self(units << FRACBITS)
    }

    /// Create from a raw 16.16 value.
    #[inline]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Create from a float, rounding to the nearest representable value.
    #[inline]
    pub fn from_f64(value: f64) -> Self {
        let raw = (value * f64::from(FRACUNIT)).round();
        Self(raw.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32)
    }

    /// Raw 16.16 value.
    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Whole map units, rounded towards negative infinity.
    #[inline]
    pub const fn to_int(self) -> i32 {
        self.0 >> FRACBITS
    }

    #[inline]
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / FRACUNIT as f32
    }

    #[inline]
    pub fn to_f64(self) -> f64 {
        f64::from(self.0) / f64::from(FRACUNIT)
    }

    /// Fixed-point multiply with a 64-bit intermediate.
    #[inline]
    pub const fn fixed_mul(self, rhs: Self) -> Self {
        Self(((self.0 as i64 * rhs.0 as i64) >> FRACBITS) as i32)
    }

    /// Fixed-point divide. Division by zero or overflow saturates.
    #[inline]
    pub const fn fixed_div(self, rhs: Self) -> Self {
        if rhs.0 == 0 {
            return if self.0 < 0 { Self::MIN } else { Self::MAX };
        }
        let q = ((self.0 as i64) << FRACBITS) / rhs.0 as i64;
        if q > i32::MAX as i64 {
            Self::MAX
        } else if q < i32::MIN as i64 {
            Self::MIN
        } else {
            Self(q as i32)
        }
    }

    #[inline]
    pub const fn abs(self) -> Self {
        Self(self.0.wrapping_abs())
    }

    #[inline]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Halve, rounding towards negative infinity.
    #[inline]
    pub const fn half(self) -> Self {
        Self(self.0 >> 1)
    }
}

impl Add for Fixed {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Fixed {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Fixed {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Fixed {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Fixed {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Mul for Fixed {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        self.fixed_mul(rhs)
    }
}

impl Div for Fixed {
    type Output = Self;

    #[inline]
    fn div(self, rhs: Self) -> Self {
        self.fixed_div(rhs)
    }
}

impl Mul<i32> for Fixed {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: i32) -> Self {
        Self(self.0 * rhs)
    }
}

impl Div<i32> for Fixed {
    type Output = Self;

    #[inline]
    fn div(self, rhs: i32) -> Self {
        Self(self.0 / rhs)
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.to_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn int_conversions() {
        assert_eq!(Fixed::from_int(1), Fixed::ONE);
        assert_eq!(Fixed::from_int(-3).to_int(), -3);
        assert_eq!(Fixed::from_raw(FRACUNIT / 2).to_int(), 0);
    }

    #[test]
    fn float_conversions() {
        assert_relative_eq!(Fixed::from_f64(2.5).to_f64(), 2.5);
        assert_relative_eq!(Fixed::from_int(-7).to_f32(), -7.0);
        assert_relative_eq!(Fixed::from_f64(0.1).to_f64(), 0.1, epsilon = 1e-4);
    }

    #[test]
    fn multiply_and_divide() {
        let a = Fixed::from_int(6);
        let b = Fixed::from_f64(0.5);
        assert_eq!(a * b, Fixed::from_int(3));
        assert_eq!(a / b, Fixed::from_int(12));
        assert_eq!(Fixed::from_int(-6) * b, Fixed::from_int(-3));
    }

    #[test]
    fn divide_by_zero_saturates() {
        assert_eq!(Fixed::ONE / Fixed::ZERO, Fixed::MAX);
        assert_eq!(-Fixed::ONE / Fixed::ZERO, Fixed::MIN);
    }

    #[test]
    fn ordering_matches_value() {
        assert!(Fixed::from_int(-1) < Fixed::ZERO);
        assert_eq!(Fixed::from_int(4).max(Fixed::from_int(9)), Fixed::from_int(9));
    }
}
