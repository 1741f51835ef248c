//! Kalman prediction for one track state
//!
//! [`KalmanState`] is the raw estimate (mean and covariance). Everything the
//! filter can compute about the next frame without looking at a report is
//! gathered once into a [`Prediction`]: predicted mean, innovation
//! covariance and its inverse, gain, post-update covariance and the constant
//! term of the measurement log-likelihood.
//!
//! # Example
//!
//! ```
//! use mht_motion::filters::kalman::KalmanState;
//! use mht_motion::models::{ConstantVelocity2D, PositionSensor2D};
//! use mht_motion::types::spaces::{StateCovariance, StateVector};
//!
//! let transition = ConstantVelocity2D::new(1.0);
//! let sensor = PositionSensor2D::new(1.0, 1.0, 0.9);
//!
//! let state = KalmanState::new(
//!     StateVector::from_kinematics(0.0, 1.0, 0.0, 0.0),
//!     StateCovariance::identity(),
//! );
//! let prediction = state.setup(&transition, &sensor).unwrap();
//! assert_eq!(prediction.predicted_mean.position(), [1.0, 0.0]);
//! ```

use nalgebra::RealField;

use crate::models::{ObservationModel, TransitionModel};
use crate::types::spaces::{
    ComputeInnovation, Innovation, Measurement, MeasurementCovariance, StateCovariance,
    StateVector,
};
use crate::types::transforms::{
    compute_innovation_covariance, compute_kalman_gain, gain_reduced_covariance, KalmanGain,
    ObservationMatrix,
};
use crate::{MhtError, Result};

/// `ln(2π)`, the constant part of a bivariate Gaussian log-density.
pub const LOG_NORM_FACTOR: f64 = 1.5963597;

// ============================================================================
// Kalman State
// ============================================================================

/// Mean and covariance of a constant-velocity estimate `[x, dx, y, dy]`.
#[derive(Debug, Clone, PartialEq)]
pub struct KalmanState<T: RealField> {
    pub mean: StateVector<T, 4>,
    pub covariance: StateCovariance<T, 4>,
}

impl<T: RealField + Copy> KalmanState<T> {
    #[inline]
    pub fn new(mean: StateVector<T, 4>, covariance: StateCovariance<T, 4>) -> Self {
        Self { mean, covariance }
    }

    /// Computes the report-independent quantities for a unit time step.
    ///
    /// - x1 = F * x
    /// - P1 = F * P * F^T + Q
    /// - S = H * P1 * H^T + R
    /// - coef = -(ln(2π) + ln(det S) / 2)
    /// - W = P1 * H^T * S^{-1}
    /// - nextP = P1 - W * S * W^T
    ///
    /// # Errors
    /// [`MhtError::SingularMatrix`] when `S` is not positive definite.
    pub fn setup<Trans, Obs>(&self, transition: &Trans, observation: &Obs) -> Result<Prediction<T>>
    where
        Trans: TransitionModel<T, 4>,
        Obs: ObservationModel<T, 4, 2>,
    {
        let ds = T::one();
        let f = transition.transition_matrix(ds);
        let q = transition.process_noise(ds);
        let h = observation.observation_matrix();
        let r = observation.measurement_noise();

        let predicted_cov = f.propagate_covariance(&self.covariance) + q;
        let innovation_cov = compute_innovation_covariance(&predicted_cov, &h, &r);
        let innovation_cov_inv = innovation_cov
            .try_inverse()
            .ok_or(MhtError::SingularMatrix)?;

        let two = T::one() + T::one();
        let log_norm: T = nalgebra::convert(LOG_NORM_FACTOR);
        let det = innovation_cov
            .determinant()
            .ok_or(MhtError::SingularMatrix)?;
        let log_likelihood_coef = -(log_norm + det.ln() / two);

        let gain = compute_kalman_gain(&predicted_cov, &h, &innovation_cov_inv);
        let next_covariance = gain_reduced_covariance(&predicted_cov, &gain, &innovation_cov);

        Ok(Prediction {
            predicted_mean: f.apply_state(&self.mean),
            next_covariance,
            observation: h,
            innovation_covariance: innovation_cov,
            innovation_covariance_inv: innovation_cov_inv,
            gain,
            log_likelihood_coef,
        })
    }
}

// ============================================================================
// Prediction
// ============================================================================

/// Report-independent Kalman quantities derived from one [`KalmanState`].
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction<T: RealField> {
    /// x1 = F * x
    pub predicted_mean: StateVector<T, 4>,
    /// Covariance after any accepted measurement update
    pub next_covariance: StateCovariance<T, 4>,
    /// H
    pub observation: ObservationMatrix<T, 2, 4>,
    /// S
    pub innovation_covariance: MeasurementCovariance<T, 2>,
    /// S^{-1}
    pub innovation_covariance_inv: MeasurementCovariance<T, 2>,
    /// W
    pub gain: KalmanGain<T, 4, 2>,
    /// Constant part of the Gaussian measurement log-likelihood
    pub log_likelihood_coef: T,
}

impl<T: RealField + Copy> Prediction<T> {
    /// Residual between a reported position and the predicted one.
    #[inline]
    pub fn innovation(&self, z: &Measurement<T, 2>) -> Innovation<T, 2> {
        (*z).innovation(self.observation.observe(&self.predicted_mean))
    }

    /// Squared Mahalanobis distance `vᵗ·S⁻¹·v`.
    #[inline]
    pub fn mahalanobis_distance_squared(&self, innovation: &Innovation<T, 2>) -> T {
        self.innovation_covariance_inv.quadratic_form(innovation)
    }

    /// Updated mean `x1 + W·v`.
    #[inline]
    pub fn corrected_mean(&self, innovation: &Innovation<T, 2>) -> StateVector<T, 4> {
        self.predicted_mean + self.gain.correct(innovation)
    }

    /// Gaussian log-likelihood of an innovation with squared distance `d`.
    #[inline]
    pub fn measurement_log_likelihood(&self, distance: T) -> T {
        self.log_likelihood_coef - distance / (T::one() + T::one())
    }
}
