//! Fixed-point quaternions
//!
//! Scalar-first (w, x, y, z) representation of the fused orientation.
//! Only the handful of operations the extraction path needs are provided.

use super::trig::isqrt64;
use super::Fx;

/// An orientation quaternion, scalar-first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    pub w: Fx,
    pub x: Fx,
    pub y: Fx,
    pub z: Fx,
}

impl Quaternion {
    pub const IDENTITY: Self = Self {
        w: Fx::ONE,
        x: Fx::ZERO,
        y: Fx::ZERO,
        z: Fx::ZERO,
    };

    pub const fn new(w: Fx, x: Fx, y: Fx, z: Fx) -> Self {
        Self { w, x, y, z }
    }

    /// Euclidean norm over all four components.
    pub fn norm(self) -> Fx {
        let wr = self.w.to_bits() as i128;
        let xr = self.x.to_bits() as i128;
        let yr = self.y.to_bits() as i128;
        let zr = self.z.to_bits() as i128;
        let sum = wr * wr + xr * xr + yr * yr + zr * zr;
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

    /// Unit quaternion in the same orientation, or the identity when the
    /// norm has collapsed to zero.
    pub fn normalized(self) -> Self {
        let norm = self.norm();
        if norm == Fx::ZERO {
            return Self::IDENTITY;
        }
        Self::new(
            self.w.saturating_div(norm),
            self.x.saturating_div(norm),
            self.y.saturating_div(norm),
            self.z.saturating_div(norm),
        )
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_unit() {
        assert_eq!(Quaternion::IDENTITY.norm(), Fx::ONE);
    }

    #[test]
    fn test_normalized_scales_to_unit() {
        let q = Quaternion::new(
            Fx::from_num(2),
            Fx::ZERO,
            Fx::from_num(2),
            Fx::ZERO,
        );
        let unit = q.normalized();
        let norm = unit.norm().to_num::<f64>();
        assert!((norm - 1.0).abs() < 1e-3, "norm was {}", norm);
        // direction preserved
        assert!(unit.w > Fx::ZERO && unit.y > Fx::ZERO);
        assert_eq!(unit.x, Fx::ZERO);
    }

    #[test]
    fn test_zero_quaternion_normalizes_to_identity() {
        let q = Quaternion::new(Fx::ZERO, Fx::ZERO, Fx::ZERO, Fx::ZERO);
        assert_eq!(q.normalized(), Quaternion::IDENTITY);
    }
}
