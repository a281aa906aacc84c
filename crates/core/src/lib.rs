//! tiltfuse_core - Pure no_std fixed-point attitude estimation
//!
//! This crate contains the platform-agnostic sensor fusion core of the
//! tiltfuse attitude-and-heading reference system. It fuses accelerometer,
//! gyroscope, and magnetometer samples into roll/pitch/yaw angles and an
//! equivalent quaternion using two cooperating Kalman filters, entirely in
//! Q16.16 fixed-point arithmetic so the results are bit-reproducible on
//! targets without an FPU.
//!
//! # Design Principles
//!
//! - **Pure no_std**: no std library dependencies, no allocation
//! - **No clock access**: time deltas are supplied by the caller
//! - **Never halt**: numeric trouble is recorded in sticky flags and the
//!   filters keep producing an answer (see [`math::MathFlags`])
//! - **Host testable**: all algorithms run unmodified in host unit tests
//!
//! # Modules
//!
//! - [`math`]: fixed-point scalar/vector/matrix/quaternion substrate
//! - [`kalman`]: generic linear Kalman predict/correct engine
//! - [`fusion`]: the attitude and orientation estimators, the fusion
//!   scheduler, and angle/quaternion extraction
//!
//! Sensor drivers and telemetry transports live outside this crate; they
//! interact with the core only through [`fusion::SensorFusion`].

#![no_std]

pub mod fusion;
pub mod kalman;
pub mod math;
