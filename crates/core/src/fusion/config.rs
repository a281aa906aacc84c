//! Fusion configuration and noise tuning constants
//!
//! All tuning values are Q16.16 compile-time literals so two builds of the
//! same configuration produce bit-identical estimates.

use crate::math::Fx;

/// Noise model and heuristic thresholds for both estimators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    /// Accelerometer axis observation uncertainty.
    pub r_axis: Fx,
    /// Magnetometer projection observation uncertainty.
    pub r_projection: Fx,
    /// Gyroscope observation uncertainty.
    pub r_gyro: Fx,
    /// Direction-state process noise. Raw axis readings are never used as
    /// a process driver, so this stays zero outside of isolated testing.
    pub q_axis: Fx,
    /// Rate-state process noise.
    pub q_gyro: Fx,
    /// Per-update scale applied to the axis block of R.
    pub alpha_axis: Fx,
    /// Per-update scale applied to the rate block of R.
    pub alpha_gyro: Fx,
    /// Deviation of the accelerometer norm from 1 g beyond which the
    /// sample is treated as motion-corrupted and not fused.
    pub acceleration_threshold: Fx,
    /// cos(pitch) below which the magnetometer projection is considered
    /// singular. Only consulted when
    /// [`FusionConfig::reject_near_vertical`] is enabled.
    pub singularity_cos_threshold: Fx,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            r_axis: Fx::lit("0.05"),
            r_projection: Fx::lit("0.02"),
            r_gyro: Fx::lit("0.02"),
            q_axis: Fx::ZERO,
            q_gyro: Fx::lit("1"),
            alpha_axis: Fx::lit("5"),
            alpha_gyro: Fx::lit("0.8"),
            acceleration_threshold: Fx::lit("0.14"),
            // cos(80 deg)
            singularity_cos_threshold: Fx::lit("0.17365"),
        }
    }
}

/// Which sensors the update step is allowed to consume.
///
/// The non-default modes isolate one half of the fusion for testing
/// without rebuilding: `GyroOnly` drops vector-sensor samples once both
/// filters have bootstrapped, `VectorOnly` zeroes the gyroscope buffer
/// every update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorMode {
    #[default]
    Fused,
    GyroOnly,
    VectorOnly,
}

impl SensorMode {
    /// Return variant name as a static string (usable with defmt on embedded)
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorMode::Fused => "Fused",
            SensorMode::GyroOnly => "GyroOnly",
            SensorMode::VectorOnly => "VectorOnly",
        }
    }
}

/// Strategy for turning the two direction estimates into a quaternion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuaternionMethod {
    /// Largest-diagonal branch selection. Stable over the full rotation
    /// range; the default.
    #[default]
    BranchSelecting,
    /// Single-formula component extraction with sign patching. Cheaper,
    /// but flips rotation-axis signs near pitch +/-90 deg and yaw 180 deg;
    /// kept for comparison only.
    DirectForm,
}

impl QuaternionMethod {
    /// Return variant name as a static string (usable with defmt on embedded)
    pub fn as_str(&self) -> &'static str {
        match self {
            QuaternionMethod::BranchSelecting => "BranchSelecting",
            QuaternionMethod::DirectForm => "DirectForm",
        }
    }
}

/// Complete fusion configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FusionConfig {
    pub tuning: Tuning,
    pub mode: SensorMode,
    pub quaternion_method: QuaternionMethod,
    /// Fall back to gyro-only heading corrections when pitch approaches
    /// vertical. Off by default, pending tuning of the threshold.
    pub reject_near_vertical: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tuning_values() {
        let tuning = Tuning::default();
        assert_eq!(tuning.r_axis, Fx::from_num(0.05));
        assert_eq!(tuning.q_axis, Fx::ZERO);
        assert_eq!(tuning.q_gyro, Fx::ONE);
        assert_eq!(tuning.alpha_axis, Fx::from_num(5));
    }

    #[test]
    fn test_default_config_is_fully_fused() {
        let config = FusionConfig::default();
        assert_eq!(config.mode, SensorMode::Fused);
        assert_eq!(config.quaternion_method, QuaternionMethod::BranchSelecting);
        assert!(!config.reject_near_vertical);
    }
}
