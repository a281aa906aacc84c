//! Fusion cycle sequencing
//!
//! [`SensorFusion`] owns both estimators and the per-cycle sample buffer
//! and is the only public entry point of the crate. One control cycle is:
//!
//! ```text
//! driver -> set_*()  ->  predict(dt)  ->  update(dt)  ->  angles()/quaternion()
//! ```
//!
//! `predict` and `update` are deliberately independent: the caller invokes
//! `predict` once per elapsed-time interval and `update` once per batch of
//! fresh measurements; they are not paired internally. Accelerometer and
//! magnetometer samples are consumed by exactly one update; the gyroscope
//! buffer holds the latest value until overwritten.
//!
//! All state lives in this struct - there are no globals - so independent
//! instances can run side by side in tests.

use crate::math::{Fx, MathFlags, Quaternion, Vector3};

use super::attitude::AttitudeEstimator;
use super::config::{FusionConfig, SensorMode};
use super::extraction::{self, EulerAngles};
use super::orientation::{heading_reference, OrientationEstimator};

/// The complete sensor fusion core: two estimators, the sample buffer, and
/// the configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorFusion {
    attitude: AttitudeEstimator,
    orientation: OrientationEstimator,
    accelerometer: Option<Vector3>,
    magnetometer: Option<Vector3>,
    gyroscope: Vector3,
    config: FusionConfig,
}

impl SensorFusion {
    /// Initialize both estimators and observation models. Must complete
    /// before any other operation - which the borrow checker enforces, as
    /// this is the only constructor.
    pub fn new(config: FusionConfig) -> Self {
        Self {
            attitude: AttitudeEstimator::new(config.tuning),
            orientation: OrientationEstimator::new(config.tuning),
            accelerometer: None,
            magnetometer: None,
            gyroscope: Vector3::ZERO,
            config,
        }
    }

    /// Record an accelerometer sample (units of 1 g) for the next update.
    pub fn set_accelerometer(&mut self, sample: Vector3) {
        self.accelerometer = Some(sample);
    }

    /// Record a gyroscope sample (rad/s). The value is held until
    /// overwritten by the next sample.
    pub fn set_gyroscope(&mut self, sample: Vector3) {
        self.gyroscope = sample;
    }

    /// Record a magnetometer sample (any self-consistent unit; only the
    /// field direction matters) for the next update.
    pub fn set_magnetometer(&mut self, sample: Vector3) {
        self.magnetometer = Some(sample);
    }

    /// Time-propagate both filters by `dt` seconds.
    ///
    /// `dt` is the caller-measured delta since the previous predict and
    /// must be strictly positive.
    pub fn predict(&mut self, dt: Fx) {
        debug_assert!(dt > Fx::ZERO, "predict requires a positive time delta");
        self.attitude.predict(dt);
        self.orientation.predict(dt);
    }

    /// Run exactly one measurement correction per estimator.
    ///
    /// Bootstrap flags advance before the corresponding correction. The
    /// heading correction requires an already-bootstrapped attitude filter
    /// (the projection needs a gravity estimate); otherwise, and whenever a
    /// vector sensor is missing or degenerate, the affected estimator
    /// falls back to its gyro-only correction. Both vector samples are
    /// consumed by this call no matter which paths were taken.
    pub fn update(&mut self, dt: Fx) {
        debug_assert!(dt > Fx::ZERO, "update requires a positive time delta");

        match self.config.mode {
            SensorMode::Fused => {}
            SensorMode::GyroOnly => {
                // isolate the rate path once seeding is done
                if self.attitude.is_bootstrapped() && self.orientation.is_bootstrapped() {
                    self.accelerometer = None;
                    self.magnetometer = None;
                }
            }
            SensorMode::VectorOnly => self.gyroscope = Vector3::ZERO,
        }

        let gyroscope = self.gyroscope;

        // roll/pitch half-cycle
        match self.accelerometer.take() {
            Some(accelerometer) => {
                self.attitude.bootstrap(accelerometer);
                self.attitude.correct_fused(accelerometer, gyroscope);
            }
            None => self.attitude.correct_rate_only(gyroscope),
        }

        // heading half-cycle
        match self.magnetometer.take() {
            Some(magnetometer) if self.attitude.is_bootstrapped() => {
                match heading_reference(magnetometer, self.attitude.direction()) {
                    Some(projection) => {
                        self.orientation.bootstrap(projection);
                        if self.config.reject_near_vertical && self.attitude.near_vertical() {
                            self.orientation.correct_rate_only(gyroscope);
                        } else {
                            self.orientation.correct_fused(projection, gyroscope);
                        }
                    }
                    None => self.orientation.correct_rate_only(gyroscope),
                }
            }
            _ => self.orientation.correct_rate_only(gyroscope),
        }
    }

    /// Euler angles of the most recent estimate, in radians.
    pub fn angles(&self) -> EulerAngles {
        extraction::euler_angles(self.attitude.direction(), self.orientation.direction())
    }

    /// Quaternion of the most recent estimate, unit norm.
    pub fn quaternion(&self) -> Quaternion {
        extraction::quaternion(
            self.attitude.direction(),
            self.orientation.direction(),
            self.config.quaternion_method,
        )
    }

    /// The gravity-referenced estimator.
    pub fn attitude(&self) -> &AttitudeEstimator {
        &self.attitude
    }

    /// The north-referenced estimator.
    pub fn orientation(&self) -> &OrientationEstimator {
        &self.orientation
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Union of the sticky numeric flags of both filters.
    pub fn flags(&self) -> MathFlags {
        self.attitude.flags() | self.orientation.flags()
    }
}

impl Default for SensorFusion {
    fn default() -> Self {
        Self::new(FusionConfig::default())
    }
}
