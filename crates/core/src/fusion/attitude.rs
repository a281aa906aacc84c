//! Attitude estimation from accelerometer and gyroscope
//!
//! Tracks the body-frame gravity direction (the bottom row of the
//! direction cosine matrix) together with the angular rate. The
//! accelerometer only measures gravity while the vehicle is unaccelerated,
//! so samples whose norm strays from 1 g beyond a tuned threshold are
//! rejected and the cycle falls back to a gyroscope-only correction.

use crate::kalman::Observation;
use crate::math::trig;
use crate::math::{Fx, MathFlags, Vector3};

use super::config::Tuning;
use super::direction::{DirectionFilter, STATES};

/// Observation count of the fused accelerometer + gyroscope model.
pub(crate) const FUSED_OBSERVATIONS: usize = 6;

/// Observation count of the gyroscope-only fallback model.
pub(crate) const RATE_OBSERVATIONS: usize = 3;

/// Gravity-referenced 6-state estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttitudeEstimator {
    filter: DirectionFilter,
    fused: Observation<STATES, FUSED_OBSERVATIONS>,
    rate_only: Observation<STATES, RATE_OBSERVATIONS>,
    tuning: Tuning,
    bootstrapped: bool,
}

/// Build the 6-observation model shared by both estimators: the first
/// three observations map directly onto the direction states, the last
/// three onto the rate states.
pub(crate) fn fused_observation(
    axis_noise: Fx,
    gyro_noise: Fx,
) -> Observation<STATES, FUSED_OBSERVATIONS> {
    let mut observation = Observation::new();
    for index in 0..FUSED_OBSERVATIONS {
        observation.h.set(index, index, Fx::ONE);
    }
    for index in 0..3 {
        observation.r.set(index, index, axis_noise);
        observation.r.set(index + 3, index + 3, gyro_noise);
    }
    observation
}

/// Build the 3-observation gyroscope-only model mapping onto states 3..6.
pub(crate) fn rate_observation(gyro_noise: Fx) -> Observation<STATES, RATE_OBSERVATIONS> {
    let mut observation = Observation::new();
    for index in 0..RATE_OBSERVATIONS {
        observation.h.set(index, index + 3, Fx::ONE);
        observation.r.set(index, index, gyro_noise);
    }
    observation
}

impl AttitudeEstimator {
    pub fn new(tuning: Tuning) -> Self {
        Self {
            filter: DirectionFilter::new(
                Vector3::new(Fx::ZERO, Fx::ZERO, Fx::ONE),
                tuning.q_axis,
                tuning.q_gyro,
            ),
            fused: fused_observation(tuning.r_axis, tuning.r_gyro),
            rate_only: rate_observation(tuning.r_gyro),
            tuning,
            bootstrapped: false,
        }
    }

    /// Time-propagate the filter by `dt` seconds.
    pub fn predict(&mut self, dt: Fx) {
        self.filter.predict(dt);
    }

    /// Seed the gravity direction from the first usable accelerometer
    /// sample. A zero-norm sample cannot seed and leaves the estimator
    /// un-bootstrapped for this cycle.
    pub fn bootstrap(&mut self, accelerometer: Vector3) {
        if self.bootstrapped {
            return;
        }
        if let Some(unit) = accelerometer.normalized() {
            self.filter.seed_direction(unit);
            self.bootstrapped = true;
        }
    }

    #[inline]
    pub fn is_bootstrapped(&self) -> bool {
        self.bootstrapped
    }

    /// True when the accelerometer norm deviates from 1 g by at least the
    /// configured threshold, i.e. the sample is corrupted by external
    /// acceleration.
    pub fn external_acceleration(&self, accelerometer: Vector3) -> bool {
        let deviation = accelerometer.norm().saturating_sub(Fx::ONE).abs();
        deviation >= self.tuning.acceleration_threshold
    }

    /// Fuse an accelerometer + gyroscope pair, falling back to the
    /// gyroscope-only correction under detected motion.
    pub fn correct_fused(&mut self, accelerometer: Vector3, gyroscope: Vector3) {
        if self.external_acceleration(accelerometer) {
            self.correct_rate_only(gyroscope);
            return;
        }
        let Some(unit) = accelerometer.normalized() else {
            self.correct_rate_only(gyroscope);
            return;
        };

        self.tune_fused_noise();
        self.fused.z.set_entry(0, unit.x);
        self.fused.z.set_entry(1, unit.y);
        self.fused.z.set_entry(2, unit.z);
        self.fused.z.set_entry(3, gyroscope.x);
        self.fused.z.set_entry(4, gyroscope.y);
        self.fused.z.set_entry(5, gyroscope.z);

        self.filter.kf.correct(&self.fused);
        self.filter.sanitize();
    }

    /// Correct only against the gyroscope. The direction states are not
    /// observed but still move through the filter cross-covariance.
    pub fn correct_rate_only(&mut self, gyroscope: Vector3) {
        self.rate_only.z.set_entry(0, gyroscope.x);
        self.rate_only.z.set_entry(1, gyroscope.y);
        self.rate_only.z.set_entry(2, gyroscope.z);
        self.filter.kf.correct(&self.rate_only);
        self.filter.sanitize();
    }

    /// Rescale the fused measurement noise by the tuning gains.
    fn tune_fused_noise(&mut self) {
        let axis = self.tuning.r_axis.saturating_mul(self.tuning.alpha_axis);
        let gyro = self.tuning.r_gyro.saturating_mul(self.tuning.alpha_gyro);
        for index in 0..3 {
            self.fused.r.set(index, index, axis);
            self.fused.r.set(index + 3, index + 3, gyro);
        }
    }

    /// Estimated gravity direction in the body frame.
    #[inline]
    pub fn direction(&self) -> Vector3 {
        self.filter.direction()
    }

    /// Estimated angular rate.
    #[inline]
    pub fn rate(&self) -> Vector3 {
        self.filter.rate()
    }

    /// True when the estimated pitch is within the singular cone around
    /// vertical, where the magnetometer projection loses its meaning.
    pub fn near_vertical(&self) -> bool {
        let direction = self.filter.direction();
        // cos(pitch) for a unit direction vector
        let cos_pitch = trig::sqrt(
            direction
                .y
                .saturating_mul(direction.y)
                .saturating_add(direction.z.saturating_mul(direction.z)),
        );
        cos_pitch < self.tuning.singularity_cos_threshold
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
