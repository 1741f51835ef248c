//! Transition (motion) models for target dynamics
//!
//! Describes how a track's kinematic state evolves between frames.

use nalgebra::RealField;

use crate::types::spaces::StateCovariance;
use crate::types::transforms::TransitionMatrix;

/// Trait for linear transition models.
///
/// Describes target dynamics in the form:
/// x_{k+1} = F * x_k + w
///
/// where:
/// - F is the state transition matrix
/// - w is zero-mean Gaussian process noise with covariance Q
pub trait TransitionModel<T: RealField, const N: usize> {
    /// Returns the state transition matrix for time step dt.
    fn transition_matrix(&self, dt: T) -> TransitionMatrix<T, N>;

    /// Returns the process noise covariance for time step dt.
    fn process_noise(&self, dt: T) -> StateCovariance<T, N>;
}

// ============================================================================
// Constant Velocity
// ============================================================================

/// Constant velocity model in 2D, each axis independent.
///
/// State: [x, dx, y, dy]
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantVelocity2D<T: RealField> {
    /// Variance of the continuous white-noise acceleration
    pub process_variance: T,
}

impl<T: RealField + Copy> ConstantVelocity2D<T> {
    /// Creates a new constant velocity model.
    ///
    /// # Panics
    /// Panics if `process_variance < 0`.
    pub fn new(process_variance: T) -> Self {
        assert!(
            process_variance >= T::zero(),
            "Process variance must be non-negative"
        );
        Self { process_variance }
    }
}

impl<T: RealField + Copy> TransitionModel<T, 4> for ConstantVelocity2D<T> {
    fn transition_matrix(&self, dt: T) -> TransitionMatrix<T, 4> {
        assert!(dt >= T::zero(), "Time step dt must be non-negative");
        let one = T::one();
        let zero = T::zero();

        TransitionMatrix::from_matrix(nalgebra::matrix![
            one, dt, zero, zero;
            zero, one, zero, zero;
            zero, zero, one, dt;
            zero, zero, zero, one
        ])
    }

    fn process_noise(&self, dt: T) -> StateCovariance<T, 4> {
        assert!(dt >= T::zero(), "Time step dt must be non-negative");
        let dt2 = dt * dt;
        let dt3 = dt2 * dt;

        let two = T::one() + T::one();
        let three = two + T::one();
        let q = self.process_variance;

        // Continuous white noise acceleration, integrated over dt
        let pp = dt3 / three * q;
        let pv = dt2 / two * q;
        let vv = dt * q;

        let zero = T::zero();

        StateCovariance::from_matrix(nalgebra::matrix![
            pp, pv, zero, zero;
            pv, vv, zero, zero;
            zero, zero, pp, pv;
            zero, zero, pv, vv
        ])
    }
}
