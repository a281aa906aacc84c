//! Generic linear Kalman predict/correct engine
//!
//! A minimal uncontrolled Kalman filter over the fixed-point matrix
//! substrate: state `x`, transition `A`, covariance `P`, and process noise
//! `Q`, with observations described separately as `{H, R, z}` triples so
//! one filter can alternate between measurement models of different sizes
//! (the fusion filters switch between 6- and 3-observation models every
//! cycle).
//!
//! The correct step inverts the innovation covariance through a Cholesky
//! factorization. If the factorization fails the correction is skipped and
//! a sticky [`MathFlags::NOT_POSITIVE_DEFINITE`] flag is recorded on the
//! covariance - per the crate's never-halt policy a degenerate update is
//! dropped rather than allowed to poison the state.

use crate::math::{Matrix, MathFlags, Vector};

/// An uncontrolled linear Kalman filter with `S` states.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kalman<const S: usize> {
    /// State estimate.
    pub x: Vector<S>,
    /// State transition model.
    pub a: Matrix<S, S>,
    /// Estimate covariance.
    pub p: Matrix<S, S>,
    /// Process noise covariance.
    pub q: Matrix<S, S>,
}

/// One measurement model: observation matrix, measurement noise, and the
/// current measurement vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation<const S: usize, const O: usize> {
    /// Maps state space into observation space.
    pub h: Matrix<O, S>,
    /// Measurement noise covariance.
    pub r: Matrix<O, O>,
    /// Measurement vector.
    pub z: Vector<O>,
}

impl<const S: usize, const O: usize> Observation<S, O> {
    pub fn new() -> Self {
        Self {
            h: Matrix::zeros(),
            r: Matrix::zeros(),
            z: Vector::zeros(),
        }
    }
}

impl<const S: usize, const O: usize> Default for Observation<S, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const S: usize> Kalman<S> {
    /// A filter with zeroed state and identity transition.
    pub fn new() -> Self {
        Self {
            x: Vector::zeros(),
            a: Matrix::identity(),
            p: Matrix::zeros(),
            q: Matrix::zeros(),
        }
    }

    /// Time-propagate the covariance: `P <- A P A^T + Q`.
    ///
    /// State propagation is left to the caller; the fusion filters use a
    /// structure-aware fast path instead of the generic `x <- A x`.
    pub fn predict_covariance(&mut self) {
        self.p = self.a * self.p * self.a.transpose() + self.q;
    }

    /// Measurement-correct state and covariance against one observation.
    pub fn correct<const O: usize>(&mut self, observation: &Observation<S, O>) {
        let pht = self.p * observation.h.transpose();
        let innovation_covariance = observation.h * pht + observation.r;

        let Some(lower) = innovation_covariance.cholesky() else {
            self.p.insert_flags(
                innovation_covariance.flags() | MathFlags::NOT_POSITIVE_DEFINITE,
            );
            return;
        };

        // K = P H^T S^-1, via S K^T = (P H^T)^T
        let gain = lower.cholesky_solve(pht.transpose()).transpose();

        let innovation = observation.z - observation.h * self.x;
        self.x = self.x + gain * innovation;
        self.p = self.p - gain * (observation.h * self.p);
    }

    /// Union of the sticky flags across all filter matrices.
    pub fn flags(&self) -> MathFlags {
        self.x.flags() | self.a.flags() | self.p.flags() | self.q.flags()
    }
}

impl<const S: usize> Default for Kalman<S> {
    fn default() -> Self {
        Self::new()
    }
}
