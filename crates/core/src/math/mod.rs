//! Fixed-point numeric substrate
//!
//! All fusion math runs on [`Fx`], a signed Q16.16 fixed-point scalar from
//! the `fixed` crate. The substrate never panics on bad numerics: overflow,
//! divide-by-zero, and degenerate decompositions are recorded as sticky
//! [`MathFlags`] on the owning matrix and computation continues with
//! saturated values. Callers (and tests) inspect the flags; the core never
//! clears them itself.

pub mod flags;
pub mod matrix;
pub mod quaternion;
pub mod trig;
pub mod vector;

pub use flags::MathFlags;
pub use matrix::{Matrix, Vector};
pub use quaternion::Quaternion;
pub use vector::Vector3;

/// Q16.16 fixed-point scalar used for all fusion arithmetic.
pub type Fx = fixed::types::I16F16;
