//! Attitude and heading sensor fusion
//!
//! Two cooperating 6-state Kalman filters estimate the body-frame gravity
//! direction (roll/pitch) and magnetic north direction (yaw); the
//! extraction routines combine them into Euler angles and a quaternion.
//! [`SensorFusion`] sequences the whole cycle and is the only type a
//! driver or consumer needs to touch.

pub mod attitude;
pub mod config;
pub mod direction;
pub mod extraction;
pub mod orientation;
pub mod scheduler;

pub use attitude::AttitudeEstimator;
pub use config::{FusionConfig, QuaternionMethod, SensorMode, Tuning};
pub use extraction::EulerAngles;
pub use orientation::{heading_reference, OrientationEstimator};
pub use scheduler::SensorFusion;
