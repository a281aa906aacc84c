//! Shared direction-plus-rate filter core
//!
//! Both estimators track the same 6-state layout: states 0..3 hold one
//! body-frame reference direction (a row of the direction cosine matrix),
//! states 3..6 hold angular rate. The continuous model is the rigid-body
//! relation `d/dt D = D x omega`; the transition matrix encodes it through
//! a cross-product coupling block that must be rebuilt from the current
//! direction estimate before every covariance propagation.

use crate::kalman::Kalman;
use crate::math::flags::{self, MathFlags};
use crate::math::{Fx, Vector3};

/// Number of filter states.
pub const STATES: usize = 6;

/// Initial variance of the direction states.
const INITIAL_AXIS_VARIANCE: Fx = Fx::lit("5");

/// Initial variance of the rate states.
const INITIAL_RATE_VARIANCE: Fx = Fx::lit("1");

/// A 6-state Kalman filter over one reference direction and the body
/// angular rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionFilter {
    pub(crate) kf: Kalman<STATES>,
}

impl DirectionFilter {
    /// Build a filter at rest pointing along `initial`, with the standard
    /// initial covariance and the given process noise diagonal.
    pub fn new(initial: Vector3, q_axis: Fx, q_gyro: Fx) -> Self {
        let mut kf = Kalman::<STATES>::new();

        for index in 0..3 {
            kf.p.set(index, index, INITIAL_AXIS_VARIANCE);
            kf.p.set(index + 3, index + 3, INITIAL_RATE_VARIANCE);
            kf.q.set(index, index, q_axis);
            kf.q.set(index + 3, index + 3, q_gyro);
        }

        kf.x.set_entry(0, initial.x);
        kf.x.set_entry(1, initial.y);
        kf.x.set_entry(2, initial.z);

        let mut filter = Self { kf };
        // transition seeded at dt = 1 until the first real predict
        filter.refresh_transition(Fx::ONE);
        filter
    }

    /// Current direction estimate (states 0..3).
    #[inline]
    pub fn direction(&self) -> Vector3 {
        Vector3::new(self.kf.x.entry(0), self.kf.x.entry(1), self.kf.x.entry(2))
    }

    /// Current angular rate estimate (states 3..6).
    #[inline]
    pub fn rate(&self) -> Vector3 {
        Vector3::new(self.kf.x.entry(3), self.kf.x.entry(4), self.kf.x.entry(5))
    }

    /// Overwrite the direction states, e.g. when bootstrapping from the
    /// first usable sample.
    pub fn seed_direction(&mut self, direction: Vector3) {
        self.kf.x.set_entry(0, direction.x);
        self.kf.x.set_entry(1, direction.y);
        self.kf.x.set_entry(2, direction.z);
    }

    /// Rebuild the cross-product coupling block of the transition matrix
    /// from the current direction estimate:
    ///
    /// ```text
    ///                 |    0     c3*dt  -c2*dt |
    /// A[0..3][3..6] = | -c3*dt     0     c1*dt |
    ///                 |  c2*dt  -c1*dt     0   |
    /// ```
    pub fn refresh_transition(&mut self, dt: Fx) {
        let mut scratch = MathFlags::empty();
        let c1 = self.kf.x.entry(0);
        let c2 = self.kf.x.entry(1);
        let c3 = self.kf.x.entry(2);

        let c1_dt = flags::mul(c1, dt, &mut scratch);
        let c2_dt = flags::mul(c2, dt, &mut scratch);
        let c3_dt = flags::mul(c3, dt, &mut scratch);

        self.kf.a.set(0, 4, c3_dt);
        self.kf.a.set(0, 5, -c2_dt);
        self.kf.a.set(1, 3, -c3_dt);
        self.kf.a.set(1, 5, c1_dt);
        self.kf.a.set(2, 3, c2_dt);
        self.kf.a.set(2, 4, -c1_dt);
        self.kf.a.insert_flags(scratch);
    }

    /// One explicit Euler step of `d/dt D = D x omega` on the direction
    /// states. The rate states are modeled constant across the step.
    fn integrate_direction(&mut self, dt: Fx) {
        let mut scratch = MathFlags::empty();
        let direction = self.direction();
        let rate = self.rate();

        let d1 = flags::sub(
            flags::mul(direction.z, rate.y, &mut scratch),
            flags::mul(direction.y, rate.z, &mut scratch),
            &mut scratch,
        );
        let d2 = flags::sub(
            flags::mul(direction.x, rate.z, &mut scratch),
            flags::mul(direction.z, rate.x, &mut scratch),
            &mut scratch,
        );
        let d3 = flags::sub(
            flags::mul(direction.y, rate.x, &mut scratch),
            flags::mul(direction.x, rate.y, &mut scratch),
            &mut scratch,
        );

        self.kf.x.set_entry(
            0,
            flags::add(direction.x, flags::mul(d1, dt, &mut scratch), &mut scratch),
        );
        self.kf.x.set_entry(
            1,
            flags::add(direction.y, flags::mul(d2, dt, &mut scratch), &mut scratch),
        );
        self.kf.x.set_entry(
            2,
            flags::add(direction.z, flags::mul(d3, dt, &mut scratch), &mut scratch),
        );
        self.kf.x.insert_flags(scratch);
    }

    /// Time-propagate state and covariance, then restore the unit-norm
    /// direction invariant.
    pub fn predict(&mut self, dt: Fx) {
        self.refresh_transition(dt);
        self.integrate_direction(dt);
        self.kf.predict_covariance();
        self.sanitize();
    }

    /// Force the direction subvector back to unit norm.
    ///
    /// Numeric integration lets the norm creep away from 1; every predict
    /// and correct ends with this step so downstream trigonometry can
    /// assume unit inputs. A direction that has collapsed to zero norm
    /// cannot be repaired and is left in place with a sticky flag.
    pub fn sanitize(&mut self) {
        let direction = self.direction();
        let norm = direction.norm();
        if norm == Fx::ONE {
            return;
        }
        match direction.normalized() {
            Some(unit) => self.seed_direction(unit),
            None => self.kf.x.insert_flags(MathFlags::DEGENERATE),
        }
    }

    /// Main diagonal of the covariance matrix.
    pub fn covariance_diagonal(&self) -> [Fx; STATES] {
        self.kf.p.diagonal()
    }

    /// Sticky numeric flags across all filter matrices.
    pub fn flags(&self) -> MathFlags {
        self.kf.flags()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level_filter() -> DirectionFilter {
        DirectionFilter::new(
            Vector3::new(Fx::ZERO, Fx::ZERO, Fx::ONE),
            Fx::ZERO,
            Fx::ONE,
        )
    }

    #[test]
    fn test_initial_covariance_diagonal() {
        let filter = level_filter();
        let diagonal = filter.covariance_diagonal();
        for index in 0..3 {
            assert_eq!(diagonal[index], Fx::from_num(5));
            assert_eq!(diagonal[index + 3], Fx::from_num(1));
        }
    }

    #[test]
    fn test_transition_coupling_block_from_direction() {
        let mut filter = level_filter();
        let dt = Fx::from_num(0.5);
        filter.refresh_transition(dt);
        // direction (0, 0, 1): only the c3 entries are non-zero
        assert_eq!(filter.kf.a.get(0, 4), dt);
        assert_eq!(filter.kf.a.get(1, 3), -dt);
        assert_eq!(filter.kf.a.get(2, 3), Fx::ZERO);
        assert_eq!(filter.kf.a.get(2, 4), Fx::ZERO);
    }

    #[test]
    fn test_predict_at_rest_keeps_direction() {
        let mut filter = level_filter();
        filter.predict(Fx::from_num(0.01));
        assert_eq!(
            filter.direction(),
            Vector3::new(Fx::ZERO, Fx::ZERO, Fx::ONE)
        );
    }

    #[test]
    fn test_predict_integrates_rotation() {
        let mut filter = level_filter();
        // constant roll rate of 1 rad/s
        filter.kf.x.set_entry(3, Fx::ONE);
        for _ in 0..10 {
            filter.predict(Fx::from_num(0.01));
        }
        // direction tips away from +z toward -y (0.1 rad of rotation)
        let direction = filter.direction();
        assert!(direction.y < Fx::from_num(-0.05), "y was {}", direction.y);
        assert!(direction.z > Fx::from_num(0.9));
        let norm = direction.norm().to_num::<f64>();
        assert!((norm - 1.0).abs() < 1e-3, "norm was {}", norm);
    }

    #[test]
    fn test_sanitize_restores_unit_norm() {
        let mut filter = level_filter();
        filter.seed_direction(Vector3::new(Fx::from_num(3), Fx::ZERO, Fx::from_num(4)));
        filter.sanitize();
        let direction = filter.direction();
        assert!((direction.x.to_num::<f64>() - 0.6).abs() < 1e-3);
        assert!((direction.z.to_num::<f64>() - 0.8).abs() < 1e-3);
        let norm = direction.norm().to_num::<f64>();
        assert!((norm - 1.0).abs() < 1e-3, "norm was {}", norm);
    }
}
