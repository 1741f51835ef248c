//! Typed transformation matrices
//!
//! Matrices that map vectors between spaces, plus the report-independent
//! pieces of the Kalman recursion built from them.

use ::core::marker::PhantomData;
use nalgebra::{RealField, SMatrix, Scalar};

use super::spaces::{
    Innovation, InnovationSpace, Measurement, MeasurementCovariance, MeasurementSpace,
    StateCovariance, StateSpace, StateVector,
};

// ============================================================================
// Transform Matrix
// ============================================================================

/// A matrix mapping vectors from the `From` space into the `To` space.
#[repr(transparent)]
#[derive(Debug, Clone, PartialEq)]
pub struct Transform<T: Scalar, const ROWS: usize, const COLS: usize, To, From> {
    inner: SMatrix<T, ROWS, COLS>,
    _marker: PhantomData<(To, From)>,
}

impl<T: Scalar, const ROWS: usize, const COLS: usize, To, From> Transform<T, ROWS, COLS, To, From> {
    #[inline]
    pub fn from_matrix(inner: SMatrix<T, ROWS, COLS>) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn as_matrix(&self) -> &SMatrix<T, ROWS, COLS> {
        &self.inner
    }
}

impl<T: Scalar + Copy, const ROWS: usize, const COLS: usize, To: Clone, From: Clone> Copy
    for Transform<T, ROWS, COLS, To, From>
where
    SMatrix<T, ROWS, COLS>: Copy,
{
}

/// State transition matrix: StateSpace -> StateSpace
pub type TransitionMatrix<T, const N: usize> = Transform<T, N, N, StateSpace, StateSpace>;

/// Observation matrix: StateSpace -> MeasurementSpace
pub type ObservationMatrix<T, const M: usize, const N: usize> =
    Transform<T, M, N, MeasurementSpace, StateSpace>;

/// Kalman gain: InnovationSpace -> StateSpace
pub type KalmanGain<T, const N: usize, const M: usize> =
    Transform<T, N, M, StateSpace, InnovationSpace>;

impl<T: RealField + Copy, const N: usize> TransitionMatrix<T, N> {
    #[inline]
    pub fn apply_state(&self, state: &StateVector<T, N>) -> StateVector<T, N> {
        StateVector::from_svector(self.inner * state.as_svector())
    }

    /// `F·P·Fᵗ`
    #[inline]
    pub fn propagate_covariance(&self, cov: &StateCovariance<T, N>) -> StateCovariance<T, N> {
        StateCovariance::from_matrix(self.inner * cov.as_matrix() * self.inner.transpose())
    }
}

impl<T: RealField + Copy, const M: usize, const N: usize> ObservationMatrix<T, M, N> {
    #[inline]
    pub fn observe(&self, state: &StateVector<T, N>) -> Measurement<T, M> {
        Measurement::from_svector(self.inner * state.as_svector())
    }

    /// `H·P·Hᵗ`
    #[inline]
    pub fn project_covariance(&self, cov: &StateCovariance<T, N>) -> MeasurementCovariance<T, M> {
        MeasurementCovariance::from_matrix(self.inner * cov.as_matrix() * self.inner.transpose())
    }
}

impl<T: RealField + Copy, const N: usize, const M: usize> KalmanGain<T, N, M> {
    /// Maps an innovation to a state correction.
    #[inline]
    pub fn correct(&self, innovation: &Innovation<T, M>) -> StateVector<T, N> {
        StateVector::from_svector(self.inner * innovation.as_svector())
    }
}

// ============================================================================
// Kalman building blocks
// ============================================================================

/// Innovation covariance.
///
/// S = H * P * H^T + R
pub fn compute_innovation_covariance<T: RealField + Copy, const N: usize, const M: usize>(
    state_cov: &StateCovariance<T, N>,
    obs_matrix: &ObservationMatrix<T, M, N>,
    meas_noise: &MeasurementCovariance<T, M>,
) -> MeasurementCovariance<T, M> {
    let h_p_ht = obs_matrix.project_covariance(state_cov);
    MeasurementCovariance::from_matrix(h_p_ht.as_matrix() + meas_noise.as_matrix())
}

/// Kalman gain from an already inverted innovation covariance.
///
/// W = P * H^T * S^{-1}
pub fn compute_kalman_gain<T: RealField + Copy, const N: usize, const M: usize>(
    state_cov: &StateCovariance<T, N>,
    obs_matrix: &ObservationMatrix<T, M, N>,
    innovation_cov_inv: &MeasurementCovariance<T, M>,
) -> KalmanGain<T, N, M> {
    KalmanGain::from_matrix(
        state_cov.as_matrix() * obs_matrix.as_matrix().transpose() * innovation_cov_inv.as_matrix(),
    )
}

/// Covariance after a measurement update.
///
/// P_updated = P - W * S * W^T
pub fn gain_reduced_covariance<T: RealField + Copy, const N: usize, const M: usize>(
    state_cov: &StateCovariance<T, N>,
    kalman_gain: &KalmanGain<T, N, M>,
    innovation_cov: &MeasurementCovariance<T, M>,
) -> StateCovariance<T, N> {
    let w = kalman_gain.as_matrix();
    StateCovariance::from_matrix(state_cov.as_matrix() - w * innovation_cov.as_matrix() * w.transpose())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cv_transition() -> TransitionMatrix<f64, 4> {
        TransitionMatrix::from_matrix(nalgebra::matrix![
            1.0, 1.0, 0.0, 0.0;
            0.0, 1.0, 0.0, 0.0;
            0.0, 0.0, 1.0, 1.0;
            0.0, 0.0, 0.0, 1.0
        ])
    }

    fn position_observation() -> ObservationMatrix<f64, 2, 4> {
        ObservationMatrix::from_matrix(nalgebra::matrix![
            1.0, 0.0, 0.0, 0.0;
            0.0, 0.0, 1.0, 0.0
        ])
    }

    #[test]
    fn test_transition_matrix() {
        let state = StateVector::from_kinematics(0.0, 1.0, 0.0, 2.0);
        let predicted = cv_transition().apply_state(&state);

        assert!((predicted.x() - 1.0).abs() < 1e-10);
        assert!((predicted.y() - 2.0).abs() < 1e-10);
        assert!((predicted.dx() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_observation_matrix() {
        let state = StateVector::from_kinematics(10.0, 1.0, 20.0, 2.0);
        let measurement = position_observation().observe(&state);

        assert!((measurement.index(0) - 10.0).abs() < 1e-10);
        assert!((measurement.index(1) - 20.0).abs() < 1e-10);
    }

    #[test]
    fn test_gain_reduces_position_uncertainty() {
        let h = position_observation();
        let p = StateCovariance::<f64, 4>::identity();
        let r = MeasurementCovariance::<f64, 2>::identity();

        let s = compute_innovation_covariance(&p, &h, &r);
        assert!((s.as_matrix()[(0, 0)] - 2.0).abs() < 1e-12);
        assert!((s.as_matrix()[(1, 1)] - 2.0).abs() < 1e-12);

        let s_inv = s.try_inverse().unwrap();
        let w = compute_kalman_gain(&p, &h, &s_inv);
        assert!((w.as_matrix()[(0, 0)] - 0.5).abs() < 1e-12);
        assert!((w.as_matrix()[(2, 1)] - 0.5).abs() < 1e-12);

        let updated = gain_reduced_covariance(&p, &w, &s);
        assert!((updated.as_matrix()[(0, 0)] - 0.5).abs() < 1e-12);
        // velocity is not observed and uncorrelated with position here
        assert!((updated.as_matrix()[(1, 1)] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_kalman_gain_application() {
        let k = KalmanGain::<f64, 4, 2>::from_matrix(nalgebra::matrix![
            0.5, 0.0;
            0.1, 0.0;
            0.0, 0.5;
            0.0, 0.1
        ]);

        let innovation = Innovation::from_array([2.0, 4.0]);
        let correction = k.correct(&innovation);

        assert!((correction.x() - 1.0).abs() < 1e-10);
        assert!((correction.y() - 2.0).abs() < 1e-10);
    }
}
