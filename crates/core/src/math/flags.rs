//! Sticky numeric error flags and flagged scalar arithmetic
//!
//! Fixed-point trouble must not abort a fusion cycle: an attitude estimate
//! that is slightly saturated is still more useful to the vehicle than no
//! estimate at all. Arithmetic helpers in this module therefore saturate on
//! overflow and record what happened in a [`MathFlags`] bit set that the
//! owning matrix carries along through every subsequent operation.

use bitflags::bitflags;

use super::Fx;

bitflags! {
    /// Sticky numeric error conditions.
    ///
    /// Once set on a matrix the flag survives every later operation on it
    /// (results OR the flags of their operands). Clearing is a diagnostic
    /// action, never something the fusion core does on its own.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MathFlags: u8 {
        /// A fixed-point operation exceeded the representable range.
        const OVERFLOW = 1 << 0;
        /// A division had a zero divisor.
        const DIVIDE_BY_ZERO = 1 << 1;
        /// A Cholesky decomposition met a non-positive diagonal term.
        const NOT_POSITIVE_DEFINITE = 1 << 2;
        /// A normalization was asked of a zero-norm vector.
        const DEGENERATE = 1 << 3;
    }
}

/// Saturating add that records overflow.
#[inline]
pub(crate) fn add(a: Fx, b: Fx, flags: &mut MathFlags) -> Fx {
    let (sum, overflow) = a.overflowing_add(b);
    if overflow {
        flags.insert(MathFlags::OVERFLOW);
        return a.saturating_add(b);
    }
    sum
}

/// Saturating subtract that records overflow.
#[inline]
pub(crate) fn sub(a: Fx, b: Fx, flags: &mut MathFlags) -> Fx {
    let (diff, overflow) = a.overflowing_sub(b);
    if overflow {
        flags.insert(MathFlags::OVERFLOW);
        return a.saturating_sub(b);
    }
    diff
}

/// Saturating multiply that records overflow.
#[inline]
pub(crate) fn mul(a: Fx, b: Fx, flags: &mut MathFlags) -> Fx {
    let (product, overflow) = a.overflowing_mul(b);
    if overflow {
        flags.insert(MathFlags::OVERFLOW);
        return a.saturating_mul(b);
    }
    product
}

/// Saturating divide that records overflow and zero divisors.
#[inline]
pub(crate) fn div(a: Fx, b: Fx, flags: &mut MathFlags) -> Fx {
    if b == Fx::ZERO {
        flags.insert(MathFlags::DIVIDE_BY_ZERO);
        return if a >= Fx::ZERO { Fx::MAX } else { Fx::MIN };
    }
    match a.checked_div(b) {
        Some(quotient) => quotient,
        None => {
            flags.insert(MathFlags::OVERFLOW);
            a.saturating_div(b)
        }
    }
}
