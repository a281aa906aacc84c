//! Fixed-point square root and inverse trigonometry
//!
//! Q16.16 kernels for the handful of transcendental operations the fusion
//! core needs: `sqrt` for norms and Cholesky factors, `atan2` for roll and
//! yaw, and `asin` for pitch. `atan2` runs sixteen CORDIC vectoring
//! iterations on the raw representation (worst-case error is a few raw
//! units, about 5e-5 rad); `asin` reduces to `atan2(x, sqrt(1 - x^2))`,
//! the same decomposition the classic fix16 libraries use. All kernels are
//! total: out-of-domain inputs clamp instead of panicking.

use super::Fx;

/// pi in Q16.16.
pub const PI: Fx = Fx::lit("3.1415926535");

/// pi/2 in Q16.16.
pub const FRAC_PI_2: Fx = Fx::lit("1.5707963267");

/// atan(2^-i) in raw Q16.16, for the CORDIC vectoring loop.
const ATAN_TABLE: [i64; 16] = [
    51472, 30386, 16055, 8150, 4091, 2047, 1024, 512, 256, 128, 64, 32, 16, 8, 4, 2,
];

/// Integer square root, floor(sqrt(n)).
#[inline]
pub(crate) fn isqrt64(n: u64) -> u64 {
    let mut x = n;
    let mut result: u64 = 0;
    let mut bit: u64 = 1 << 62;
    while bit > x {
        bit >>= 2;
    }
    while bit != 0 {
        if x >= result + bit {
            x -= result + bit;
            result = (result >> 1) + bit;
        } else {
            result >>= 1;
        }
        bit >>= 2;
    }
    result
}

/// Square root of a non-negative Q16.16 value.
///
/// Negative inputs (which can only arise from saturated upstream math)
/// clamp to zero.
pub fn sqrt(v: Fx) -> Fx {
    if v <= Fx::ZERO {
        return Fx::ZERO;
    }
    // sqrt(raw * 2^16) in integer space is the Q16.16 root of v.
    let wide = (v.to_bits() as u64) << 16;
    Fx::from_bits(isqrt64(wide) as i32)
}

/// Four-quadrant arctangent, result in (-pi, pi].
pub fn atan2(y: Fx, x: Fx) -> Fx {
    if y == Fx::ZERO {
        return if x >= Fx::ZERO { Fx::ZERO } else { PI };
    }
    if x == Fx::ZERO {
        return if y > Fx::ZERO { FRAC_PI_2 } else { -FRAC_PI_2 };
    }

    let mut xr = x.to_bits() as i64;
    let mut yr = y.to_bits() as i64;

    // Rotate left-half-plane inputs by pi so the vectoring loop only has
    // to converge on x > 0.
    let offset: i64 = if xr < 0 {
        xr = -xr;
        yr = -yr;
        if y > Fx::ZERO {
            PI.to_bits() as i64
        } else {
            -(PI.to_bits() as i64)
        }
    } else {
        0
    };

    let mut angle: i64 = 0;
    for (i, step) in ATAN_TABLE.iter().enumerate() {
        if yr == 0 {
            break;
        }
        let (xs, ys) = (xr >> i, yr >> i);
        if yr > 0 {
            xr += ys;
            yr -= xs;
            angle += step;
        } else {
            xr -= ys;
            yr += xs;
            angle -= step;
        }
    }

    Fx::from_bits((offset + angle) as i32)
}

/// Arcsine, result in [-pi/2, pi/2]. Inputs outside [-1, 1] clamp.
pub fn asin(v: Fx) -> Fx {
    let clamped = v.clamp(-Fx::ONE, Fx::ONE);
    let complement = Fx::ONE.saturating_sub(clamped.saturating_mul(clamped));
    atan2(clamped, sqrt(complement))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(actual: Fx, expected: f64, tolerance: f64) -> bool {
        (actual.to_num::<f64>() - expected).abs() < tolerance
    }

    #[test]
    fn test_sqrt_exact_squares() {
        assert_eq!(sqrt(Fx::from_num(4)), Fx::from_num(2));
        assert_eq!(sqrt(Fx::from_num(1)), Fx::from_num(1));
        assert_eq!(sqrt(Fx::ZERO), Fx::ZERO);
    }

    #[test]
    fn test_sqrt_irrational() {
        assert!(close(sqrt(Fx::from_num(2)), 1.41421356, 1e-4));
        assert!(close(sqrt(Fx::from_num(0.25)), 0.5, 1e-4));
    }

    #[test]
    fn test_sqrt_negative_clamps_to_zero() {
        assert_eq!(sqrt(Fx::from_num(-1)), Fx::ZERO);
    }

    #[test]
    fn test_atan2_axes() {
        assert_eq!(atan2(Fx::ZERO, Fx::ONE), Fx::ZERO);
        assert_eq!(atan2(Fx::ZERO, -Fx::ONE), PI);
        assert_eq!(atan2(Fx::ONE, Fx::ZERO), FRAC_PI_2);
        assert_eq!(atan2(-Fx::ONE, Fx::ZERO), -FRAC_PI_2);
    }

    #[test]
    fn test_atan2_quadrants() {
        // pi/4 in each quadrant
        assert!(close(atan2(Fx::ONE, Fx::ONE), core::f64::consts::FRAC_PI_4, 1e-3));
        assert!(close(
            atan2(Fx::ONE, -Fx::ONE),
            3.0 * core::f64::consts::FRAC_PI_4,
            1e-3
        ));
        assert!(close(
            atan2(-Fx::ONE, -Fx::ONE),
            -3.0 * core::f64::consts::FRAC_PI_4,
            1e-3
        ));
        assert!(close(
            atan2(-Fx::ONE, Fx::ONE),
            -core::f64::consts::FRAC_PI_4,
            1e-3
        ));
    }

    #[test]
    fn test_asin_known_values() {
        assert!(close(asin(Fx::from_num(0.5)), 0.5235987, 1e-3));
        assert!(close(asin(Fx::from_num(-0.5)), -0.5235987, 1e-3));
        assert!(close(asin(Fx::ONE), core::f64::consts::FRAC_PI_2, 1e-3));
        assert_eq!(asin(Fx::ZERO), Fx::ZERO);
    }

    #[test]
    fn test_asin_clamps_out_of_domain() {
        assert!(close(asin(Fx::from_num(2)), core::f64::consts::FRAC_PI_2, 1e-3));
    }
}
