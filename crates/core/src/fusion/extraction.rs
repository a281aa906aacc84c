//! Angle and quaternion extraction
//!
//! Turns the two direction estimates (gravity and magnetic north in the
//! body frame) into Euler angles and into a quaternion. The two vectors
//! are two rows of the body direction cosine matrix; their cross product
//! recovers the missing third row, after which the rotation is fully
//! determined.

use crate::math::{trig, Fx, Quaternion, Vector3};

use super::config::QuaternionMethod;

/// Fused Euler angles in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerAngles {
    pub roll: Fx,
    pub pitch: Fx,
    pub yaw: Fx,
}

/// Extract roll, pitch, and yaw from the gravity and north directions.
///
/// Roll and pitch come from the gravity row alone; yaw needs the north row
/// plus the reconstructed east row.
pub fn euler_angles(gravity: Vector3, north: Vector3) -> EulerAngles {
    let pitch = -trig::asin(gravity.x);
    let roll = -trig::atan2(gravity.y, -gravity.z);

    // east = north x gravity recovers the first matrix row; only its x
    // component enters the heading
    let east = north.cross(gravity);
    let yaw = trig::atan2(north.x, -east.x);

    EulerAngles { roll, pitch, yaw }
}

/// Extract the orientation quaternion using the configured strategy.
pub fn quaternion(gravity: Vector3, north: Vector3, method: QuaternionMethod) -> Quaternion {
    match method {
        QuaternionMethod::BranchSelecting => branch_selecting(gravity, north),
        QuaternionMethod::DirectForm => direct_form(gravity, north),
    }
}

#[inline]
fn div_or_zero(numerator: Fx, denominator: Fx) -> Fx {
    numerator.checked_div(denominator).unwrap_or(Fx::ZERO)
}

#[inline]
fn half_sqrt_or_zero(value: Fx) -> Fx {
    let clamped = if value > Fx::ZERO { value } else { Fx::ZERO };
    Fx::lit("0.5").saturating_mul(trig::sqrt(clamped))
}

/// Largest-diagonal branch selection over the reconstructed rotation
/// matrix. Selecting the numerically dominant diagonal term keeps every
/// division well away from zero, which is what makes this form stable at
/// the poses where the single-formula variant glitches.
fn branch_selecting(gravity: Vector3, north: Vector3) -> Quaternion {
    let row1 = north;
    let row2 = Vector3::new(-gravity.x, -gravity.y, -gravity.z);
    let Some(row0) = row1.cross(row2).normalized() else {
        return Quaternion::IDENTITY;
    };

    let (m00, m01, m02) = (row0.x, row0.y, row0.z);
    let (m10, m11, m12) = (row1.x, row1.y, row1.z);
    let (m20, m21, m22) = (row2.x, row2.y, row2.z);

    let trace = m00.saturating_add(m11).saturating_add(m22);

    let raw = if trace > Fx::ZERO {
        let s = div_or_zero(Fx::lit("0.5"), trig::sqrt(Fx::ONE.saturating_add(trace)));
        Quaternion::new(
            div_or_zero(Fx::lit("0.25"), s),
            (m21 - m12).saturating_mul(s),
            (m02 - m20).saturating_mul(s),
            (m10 - m01).saturating_mul(s),
        )
    } else if m00 > m11 && m00 > m22 {
        let s = Fx::from_num(2).saturating_mul(trig::sqrt(
            Fx::ONE.saturating_add(m00).saturating_sub(m11).saturating_sub(m22),
        ));
        Quaternion::new(
            div_or_zero(m21 - m12, s),
            Fx::lit("0.25").saturating_mul(s),
            div_or_zero(m01 + m10, s),
            div_or_zero(m02 + m20, s),
        )
    } else if m11 > m22 {
        let s = Fx::from_num(2).saturating_mul(trig::sqrt(
            Fx::ONE.saturating_add(m11).saturating_sub(m00).saturating_sub(m22),
        ));
        Quaternion::new(
            div_or_zero(m02 - m20, s),
            div_or_zero(m01 + m10, s),
            Fx::lit("0.25").saturating_mul(s),
            div_or_zero(m12 + m21, s),
        )
    } else {
        let s = Fx::from_num(2).saturating_mul(trig::sqrt(
            Fx::ONE.saturating_add(m22).saturating_sub(m00).saturating_sub(m11),
        ));
        Quaternion::new(
            div_or_zero(m10 - m01, s),
            div_or_zero(m02 + m20, s),
            div_or_zero(m12 + m21, s),
            Fx::lit("0.25").saturating_mul(s),
        )
    };

    raw.normalized()
}

/// Single-formula component extraction with sign patching.
///
/// Cheaper than the branch-selecting form but the sign patch collapses to
/// zero when an off-diagonal difference vanishes, which flips rotation
/// axis signs around pitch +/-90 deg and yaw 180 deg. Not the primary
/// path; kept selectable for comparison.
fn direct_form(gravity: Vector3, north: Vector3) -> Quaternion {
    let row1 = north;
    let row2 = gravity;
    let Some(row0) = row1.cross(row2).normalized() else {
        return Quaternion::IDENTITY;
    };

    let (m00, m01, m02) = (row0.x, row0.y, row0.z);
    let (m10, m11, m12) = (row1.x, row1.y, row1.z);
    let (m20, m21, m22) = (row2.x, row2.y, row2.z);

    let w = half_sqrt_or_zero(Fx::ONE.saturating_add(m00).saturating_add(m11).saturating_add(m22));
    let x = half_sqrt_or_zero(Fx::ONE.saturating_add(m00).saturating_sub(m11).saturating_sub(m22));
    let y = half_sqrt_or_zero(Fx::ONE.saturating_sub(m00).saturating_add(m11).saturating_sub(m22));
    let z = half_sqrt_or_zero(Fx::ONE.saturating_sub(m00).saturating_sub(m11).saturating_add(m22));

    Quaternion::new(
        w,
        copysign(x, m21 - m12),
        copysign(y, m02 - m20),
        copysign(z, m10 - m01),
    )
    .normalized()
}

/// `magnitude` carrying the sign of `sign`, collapsing to zero when the
/// sign source is exactly zero.
#[inline]
fn copysign(magnitude: Fx, sign: Fx) -> Fx {
    if sign > Fx::ZERO {
        magnitude
    } else if sign < Fx::ZERO {
        -magnitude
    } else {
        Fx::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fx(value: f64) -> Fx {
        Fx::from_num(value)
    }

    fn assert_unit_norm(q: Quaternion) {
        let norm = q.norm().to_num::<f64>();
        assert!((norm - 1.0).abs() < 1e-2, "quaternion norm was {}", norm);
    }

    #[test]
    fn test_level_pose_angles() {
        // at rest: gravity straight down the body z axis, north behind -y
        let gravity = Vector3::new(Fx::ZERO, Fx::ZERO, Fx::ONE);
        let north = Vector3::new(Fx::ZERO, -Fx::ONE, Fx::ZERO);
        let angles = euler_angles(gravity, north);

        assert_eq!(angles.pitch, Fx::ZERO);
        assert_eq!(angles.roll, -trig::atan2(Fx::ZERO, -Fx::ONE));
        assert_eq!(angles.yaw, Fx::ZERO);
    }

    #[test]
    fn test_pitch_from_tilted_gravity() {
        let gravity = Vector3::new(fx(-0.5), Fx::ZERO, fx(0.8660));
        let north = Vector3::new(Fx::ZERO, -Fx::ONE, Fx::ZERO);
        let angles = euler_angles(gravity, north);
        let pitch = angles.pitch.to_num::<f64>();
        assert!((pitch - 0.5236).abs() < 5e-3, "pitch was {}", pitch);
    }

    #[test]
    fn test_branch_selecting_positive_trace() {
        // identity rotation: north along +y, gravity along -z
        let q = quaternion(
            Vector3::new(Fx::ZERO, Fx::ZERO, -Fx::ONE),
            Vector3::new(Fx::ZERO, Fx::ONE, Fx::ZERO),
            QuaternionMethod::BranchSelecting,
        );
        assert_unit_norm(q);
        assert!(q.w > fx(0.99), "w was {}", q.w);
    }

    #[test]
    fn test_branch_selecting_m00_dominant() {
        // rotation by pi about x: diag(1, -1, -1)
        let q = quaternion(
            Vector3::new(Fx::ZERO, Fx::ZERO, Fx::ONE),
            Vector3::new(Fx::ZERO, -Fx::ONE, Fx::ZERO),
            QuaternionMethod::BranchSelecting,
        );
        assert_unit_norm(q);
        assert!(q.x.abs() > fx(0.99), "x was {}", q.x);
    }

    #[test]
    fn test_branch_selecting_m11_dominant() {
        // rotation by pi about y: diag(-1, 1, -1)
        let q = quaternion(
            Vector3::new(Fx::ZERO, Fx::ZERO, Fx::ONE),
            Vector3::new(Fx::ZERO, Fx::ONE, Fx::ZERO),
            QuaternionMethod::BranchSelecting,
        );
        assert_unit_norm(q);
        assert!(q.y.abs() > fx(0.99), "y was {}", q.y);
    }

    #[test]
    fn test_branch_selecting_m22_dominant() {
        // rotation by pi about z: diag(-1, -1, 1)
        let q = quaternion(
            Vector3::new(Fx::ZERO, Fx::ZERO, -Fx::ONE),
            Vector3::new(Fx::ZERO, -Fx::ONE, Fx::ZERO),
            QuaternionMethod::BranchSelecting,
        );
        assert_unit_norm(q);
        assert!(q.z.abs() > fx(0.99), "z was {}", q.z);
    }

    #[test]
    fn test_degenerate_rows_give_identity() {
        // north parallel to gravity: no third row can be recovered
        let q = quaternion(
            Vector3::new(Fx::ZERO, Fx::ZERO, Fx::ONE),
            Vector3::new(Fx::ZERO, Fx::ZERO, Fx::ONE),
            QuaternionMethod::BranchSelecting,
        );
        assert_eq!(q, Quaternion::IDENTITY);
    }

    #[test]
    fn test_direct_form_small_yaw() {
        // small rotation about z; both formulas are healthy here
        let q = quaternion(
            Vector3::new(Fx::ZERO, Fx::ZERO, Fx::ONE),
            Vector3::new(fx(0.1987), fx(0.9801), Fx::ZERO),
            QuaternionMethod::DirectForm,
        );
        assert_unit_norm(q);
        assert!(q.w > fx(0.99), "w was {}", q.w);
        let z = q.z.to_num::<f64>();
        assert!((z.abs() - 0.0997).abs() < 5e-3, "z was {}", z);
    }
}
