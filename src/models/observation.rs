//! Observation (sensor) models
//!
//! Describes how reported corner positions relate to track states.

use nalgebra::RealField;

use crate::types::spaces::MeasurementCovariance;
use crate::types::transforms::ObservationMatrix;

/// Trait for linear observation models.
///
/// Describes the measurement process:
/// z = H * x + v
///
/// where:
/// - H is the observation matrix
/// - v is zero-mean Gaussian measurement noise with covariance R
pub trait ObservationModel<T: RealField, const N: usize, const M: usize> {
    /// Returns the observation matrix.
    fn observation_matrix(&self) -> ObservationMatrix<T, M, N>;

    /// Returns the measurement noise covariance.
    fn measurement_noise(&self) -> MeasurementCovariance<T, M>;

    /// Returns the probability that a live target produces a report.
    fn detection_probability(&self) -> T;
}

// ============================================================================
// Position Sensor
// ============================================================================

/// Position-only sensor in 2D.
///
/// Observes [x, y] from state [x, dx, y, dy], with independent noise per axis.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionSensor2D<T: RealField> {
    /// Variance of the reported x position
    pub variance_x: T,
    /// Variance of the reported y position
    pub variance_y: T,
    /// Detection probability
    pub p_detection: T,
}

impl<T: RealField + Copy> PositionSensor2D<T> {
    /// Creates a new position sensor.
    ///
    /// # Panics
    /// Panics if a variance is not positive or `p_detection` is not in [0, 1].
    pub fn new(variance_x: T, variance_y: T, p_detection: T) -> Self {
        assert!(
            variance_x > T::zero() && variance_y > T::zero(),
            "Measurement variances must be positive"
        );
        assert!(
            p_detection >= T::zero() && p_detection <= T::one(),
            "Detection probability must be in [0, 1]"
        );
        Self {
            variance_x,
            variance_y,
            p_detection,
        }
    }
}

impl<T: RealField + Copy> ObservationModel<T, 4, 2> for PositionSensor2D<T> {
    fn observation_matrix(&self) -> ObservationMatrix<T, 2, 4> {
        let one = T::one();
        let zero = T::zero();

        ObservationMatrix::from_matrix(nalgebra::matrix![
            one, zero, zero, zero;
            zero, zero, one, zero
        ])
    }

    fn measurement_noise(&self) -> MeasurementCovariance<T, 2> {
        let zero = T::zero();

        MeasurementCovariance::from_matrix(nalgebra::matrix![
            self.variance_x, zero;
            zero, self.variance_y
        ])
    }

    fn detection_probability(&self) -> T {
        self.p_detection
    }
}
