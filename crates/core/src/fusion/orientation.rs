//! Heading estimation from magnetometer and gyroscope
//!
//! Structurally the same 6-state filter as the attitude estimator, but the
//! tracked direction is magnetic north expressed in the body frame. The
//! magnetometer is never fused directly: its reading is first projected
//! through the TRIAD cross product with the current gravity estimate,
//! which strips the tilt component and leaves a pure horizontal heading
//! reference. Absolute magnetometer scale therefore does not matter, only
//! the field direction does.

use crate::kalman::Observation;
use crate::math::{Fx, MathFlags, Vector3};

use super::attitude::{
    fused_observation, rate_observation, FUSED_OBSERVATIONS, RATE_OBSERVATIONS,
};
use super::config::Tuning;
use super::direction::{DirectionFilter, STATES};

/// North-referenced 6-state estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationEstimator {
    filter: DirectionFilter,
    fused: Observation<STATES, FUSED_OBSERVATIONS>,
    rate_only: Observation<STATES, RATE_OBSERVATIONS>,
    tuning: Tuning,
    bootstrapped: bool,
}

/// TRIAD projection: the horizontal heading reference recovered from a raw
/// magnetometer sample and the estimated gravity direction.
///
/// Returns `None` when the cross product degenerates (zero sample, or a
/// field parallel to gravity), in which case no heading information can be
/// extracted this cycle.
pub fn heading_reference(magnetometer: Vector3, gravity: Vector3) -> Option<Vector3> {
    magnetometer.cross(gravity).normalized()
}

impl OrientationEstimator {
    pub fn new(tuning: Tuning) -> Self {
        Self {
            filter: DirectionFilter::new(
                Vector3::new(Fx::ZERO, Fx::ONE, Fx::ZERO),
                tuning.q_axis,
                tuning.q_gyro,
            ),
            fused: fused_observation(tuning.r_projection, tuning.r_gyro),
            rate_only: rate_observation(tuning.r_gyro),
            tuning,
            bootstrapped: false,
        }
    }

    /// Time-propagate the filter by `dt` seconds.
    pub fn predict(&mut self, dt: Fx) {
        self.filter.predict(dt);
    }

    /// Seed the north direction from a TRIAD projection, so the initial
    /// heading is self-consistent with the gravity estimate it was
    /// projected against.
    pub fn bootstrap(&mut self, projection: Vector3) {
        if self.bootstrapped {
            return;
        }
        self.filter.seed_direction(projection);
        self.bootstrapped = true;
    }

    #[inline]
    pub fn is_bootstrapped(&self) -> bool {
        self.bootstrapped
    }

    /// Fuse a TRIAD projection + gyroscope pair.
    pub fn correct_fused(&mut self, projection: Vector3, gyroscope: Vector3) {
        self.tune_fused_noise();
        self.fused.z.set_entry(0, projection.x);
        self.fused.z.set_entry(1, projection.y);
        self.fused.z.set_entry(2, projection.z);
        self.fused.z.set_entry(3, gyroscope.x);
        self.fused.z.set_entry(4, gyroscope.y);
        self.fused.z.set_entry(5, gyroscope.z);

        self.filter.kf.correct(&self.fused);
        self.filter.sanitize();
    }

    /// Correct only against the gyroscope.
    pub fn correct_rate_only(&mut self, gyroscope: Vector3) {
        self.rate_only.z.set_entry(0, gyroscope.x);
        self.rate_only.z.set_entry(1, gyroscope.y);
        self.rate_only.z.set_entry(2, gyroscope.z);
        self.filter.kf.correct(&self.rate_only);
        self.filter.sanitize();
    }

    fn tune_fused_noise(&mut self) {
        let axis = self.tuning.r_projection.saturating_mul(self.tuning.alpha_axis);
        let gyro = self.tuning.r_gyro.saturating_mul(self.tuning.alpha_gyro);
        for index in 0..3 {
            self.fused.r.set(index, index, axis);
            self.fused.r.set(index + 3, index + 3, gyro);
        }
    }

    /// Estimated magnetic north direction in the body frame.
    #[inline]
    pub fn direction(&self) -> Vector3 {
        self.filter.direction()
    }

    /// Estimated angular rate.
    #[inline]
    pub fn rate(&self) -> Vector3 {
        self.filter.rate()
    }

    /// Main diagonal of the estimate covariance.
    pub fn covariance_diagonal(&self) -> [Fx; STATES] {
        self.filter.covariance_diagonal()
    }

    /// Sticky numeric flags across the filter matrices.
    pub fn flags(&self) -> MathFlags {
        self.filter.flags()
    }
}
