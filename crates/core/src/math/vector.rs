//! Three-component fixed-point vectors
//!
//! [`Vector3`] carries one sensor sample (accelerometer, gyroscope, or
//! magnetometer) or one body-frame direction. Norms are computed on the
//! doubled-width raw representation so that even large magnetometer counts
//! do not overflow the intermediate sum of squares.

use super::trig::isqrt64;
use super::Fx;

/// A three-component fixed-point vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3 {
    pub x: Fx,
    pub y: Fx,
    pub z: Fx,
}

impl Vector3 {
    pub const ZERO: Self = Self::new(Fx::ZERO, Fx::ZERO, Fx::ZERO);

    #[inline]
    pub const fn new(x: Fx, y: Fx, z: Fx) -> Self {
        Self { x, y, z }
    }

    /// Cross product `self x rhs`.
    #[inline]
    pub fn cross(self, rhs: Self) -> Self {
        Self::new(
            self.y.saturating_mul(rhs.z).saturating_sub(self.z.saturating_mul(rhs.y)),
            self.z.saturating_mul(rhs.x).saturating_sub(self.x.saturating_mul(rhs.z)),
            self.x.saturating_mul(rhs.y).saturating_sub(self.y.saturating_mul(rhs.x)),
        )
    }

    /// Euclidean norm.
    ///
    /// The sum of squares is accumulated in 128-bit integer space on the
    /// raw representation, so the only loss is the final rounding to
    /// Q16.16 (saturating if the true norm exceeds the scalar range).
    pub fn norm(self) -> Fx {
        let xr = self.x.to_bits() as i128;
        let yr = self.y.to_bits() as i128;
        let zr = self.z.to_bits() as i128;
        // Q32.32 sum of squares
        let sum = xr * xr + yr * yr + zr * zr;
        let root = if sum > u64::MAX as i128 {
            u32::MAX as u64
        } else {
            isqrt64(sum as u64)
        };
        if root > i32::MAX as u64 {
            Fx::MAX
        } else {
            Fx::from_bits(root as i32)
        }
    }

    /// Unit vector in the direction of `self`, or `None` for the zero
    /// vector (and for saturated norms that cannot be divided through).
    pub fn normalized(self) -> Option<Self> {
        let norm = self.norm();
        if norm == Fx::ZERO {
            return None;
        }
        Some(Self::new(
            self.x.checked_div(norm)?,
            self.y.checked_div(norm)?,
            self.z.checked_div(norm)?,
        ))
    }
}
