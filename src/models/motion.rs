//! Motion models scored by the hypothesis tree
//!
//! A [`MotionModel`] turns a track state and a report into a successor state
//! plus the log-likelihoods the hypothesis engine compares when it branches:
//! start a new track, continue with a report, skip a frame, or end.
//!
//! [`ConstantVelocityModel`] is the constant-velocity Kalman implementation.
//! Its states ([`MotionState`]) are immutable: every transition creates a new
//! state and the predecessor is never touched, so one model and any number of
//! published states can be shared across scoring threads.

use nalgebra::RealField;

use crate::filters::kalman::{KalmanState, Prediction};
use crate::models::{ConstantVelocity2D, ObservationModel, PositionSensor2D};
use crate::types::report::Report;
use crate::types::spaces::{StateCovariance, StateVector};
use crate::{MhtError, Result};

/// Added to an end probability of exactly zero before taking its logarithm.
pub const END_PROBABILITY_EPSILON: f64 = 1e-14;

// ============================================================================
// Model Kind
// ============================================================================

/// The model family a state was produced by.
///
/// Recorded on every committed track element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    ConstantVelocity,
}

impl ModelKind {
    /// Numeric code used in exported track records.
    #[inline]
    pub const fn code(self) -> u8 {
        match self {
            ModelKind::ConstantVelocity => 2,
        }
    }
}

// ============================================================================
// Motion Model Trait
// ============================================================================

/// Capability set the hypothesis engine needs from a motion model.
///
/// Implementations must be read-only: scoring never mutates the model or a
/// state, so independent (state, report) pairs may be scored concurrently.
pub trait MotionModel<T: RealField> {
    type State;
    type Report;

    /// Which family this model belongs to.
    fn kind(&self) -> ModelKind;

    /// How many successor branches to open for `(state, report)`.
    ///
    /// `state == None` asks how many new tracks a lone report may start.
    fn begin_new_states(&self, state: Option<&Self::State>, report: Option<&Self::Report>) -> usize;

    /// Builds successor number `branch` for `(state, report)`.
    ///
    /// `Ok(None)` means the pair failed validation (e.g. gating) and must not
    /// be branched on.
    ///
    /// # Panics
    /// Panics if `branch >= begin_new_states(state, report)`.
    fn new_state(
        &self,
        branch: usize,
        state: Option<&Self::State>,
        report: Option<&Self::Report>,
    ) -> Result<Option<Self::State>>;

    /// Log-probability that the track ends after `state`.
    fn end_log_likelihood(&self, state: &Self::State) -> T;

    /// Log-probability that the track carries on after `state`.
    fn continue_log_likelihood(&self, state: &Self::State) -> T;

    /// Log-probability of the track producing no report this frame.
    fn skip_log_likelihood(&self, state: &Self::State) -> T;

    /// Log-probability of the track producing a report this frame.
    fn detect_log_likelihood(&self, state: &Self::State) -> T;

    /// Log-likelihood contributed by the transition that created `state`.
    fn state_log_likelihood(&self, state: &Self::State) -> T;

    /// Estimated `(x, y)` of `state`.
    fn state_position(&self, state: &Self::State) -> [T; 2];
}

// ============================================================================
// Configuration
// ============================================================================

/// Parameters of a [`ConstantVelocityModel`], fixed for its lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantVelocityConfig<T: RealField> {
    /// Variance of reported x positions
    pub position_variance_x: T,
    /// Variance of reported y positions
    pub position_variance_y: T,
    /// Reserved for reports carrying image gradients
    pub gradient_variance: T,
    /// Reserved for reports carrying intensities
    pub intensity_variance: T,
    /// Acceleration noise of the constant-velocity dynamics
    pub process_variance: T,
    /// Prior probability that a lone report starts a track
    pub start_probability: T,
    /// Mean number of consecutive misses before a track ends
    pub lambda_x: T,
    /// Probability that a live track is detected in a frame
    pub detect_probability: T,
    /// Initial velocity variance of a new track
    pub state_variance: T,
    /// Largest accepted squared Mahalanobis distance
    pub max_distance: T,
}

impl<T: RealField + Copy> Default for ConstantVelocityConfig<T> {
    fn default() -> Self {
        let c = |v: f64| -> T { nalgebra::convert(v) };
        Self {
            position_variance_x: c(1.0),
            position_variance_y: c(1.0),
            gradient_variance: c(0.0),
            intensity_variance: c(0.0),
            process_variance: c(1.0),
            start_probability: c(0.5),
            lambda_x: c(5.0),
            detect_probability: c(0.9),
            state_variance: c(10.0),
            max_distance: c(9.0),
        }
    }
}

impl<T: RealField + Copy> ConstantVelocityConfig<T> {
    /// Rejects parameters that would make scoring non-physical.
    pub fn validate(&self) -> Result<()> {
        let zero = T::zero();
        let one = T::one();

        let all = [
            self.position_variance_x,
            self.position_variance_y,
            self.gradient_variance,
            self.intensity_variance,
            self.process_variance,
            self.start_probability,
            self.lambda_x,
            self.detect_probability,
            self.state_variance,
            self.max_distance,
        ];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(invalid("all parameters must be finite"));
        }

        if self.position_variance_x <= zero || self.position_variance_y <= zero {
            return Err(invalid("position variances must be positive"));
        }
        if self.process_variance < zero {
            return Err(invalid("process variance must be non-negative"));
        }
        if self.gradient_variance < zero || self.intensity_variance < zero {
            return Err(invalid("gradient and intensity variances must be non-negative"));
        }
        if self.state_variance <= zero {
            return Err(invalid("state variance must be positive"));
        }
        if self.start_probability <= zero || self.start_probability > one {
            return Err(invalid("start probability must be in (0, 1]"));
        }
        if self.detect_probability <= zero || self.detect_probability >= one {
            return Err(invalid("detection probability must be in (0, 1)"));
        }
        if self.lambda_x <= zero {
            return Err(invalid("lambda_x must be positive"));
        }
        if self.max_distance <= zero {
            return Err(invalid("max distance must be positive"));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> MhtError {
    MhtError::InvalidConfig(reason.to_string())
}

// ============================================================================
// Motion State
// ============================================================================

/// One track's kinematic estimate at one frame.
///
/// The Kalman prediction for the following frame is computed when the state
/// is built, so a published state always carries it and nothing can compute
/// it twice.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionState<T: RealField> {
    kalman: KalmanState<T>,
    num_skipped: u32,
    log_likelihood: T,
    prediction: Prediction<T>,
}

impl<T: RealField + Copy> MotionState<T> {
    #[inline]
    pub fn mean(&self) -> &StateVector<T, 4> {
        &self.kalman.mean
    }

    #[inline]
    pub fn covariance(&self) -> &StateCovariance<T, 4> {
        &self.kalman.covariance
    }

    #[inline]
    pub fn kalman(&self) -> &KalmanState<T> {
        &self.kalman
    }

    #[inline]
    pub fn position(&self) -> [T; 2] {
        self.kalman.mean.position()
    }

    #[inline]
    pub fn velocity(&self) -> [T; 2] {
        self.kalman.mean.velocity()
    }

    /// Consecutive frames this track has gone without a report.
    #[inline]
    pub fn num_skipped(&self) -> u32 {
        self.num_skipped
    }

    /// Log-likelihood contributed by the transition that created this state.
    ///
    /// Zero for skip successors; the skip cost is scored separately.
    #[inline]
    pub fn log_likelihood(&self) -> T {
        self.log_likelihood
    }

    /// Derived quantities for the next frame (x1, nextP, S⁻¹, W, coef).
    ///
    /// Computed exactly once, when the state was built.
    #[inline]
    pub fn setup(&self) -> &Prediction<T> {
        &self.prediction
    }

    /// True while the velocity has never been estimated.
    #[inline]
    fn has_zero_velocity(&self) -> bool {
        self.kalman.mean.dx() == T::zero() && self.kalman.mean.dy() == T::zero()
    }
}

// ============================================================================
// Constant Velocity Model
// ============================================================================

/// Constant-velocity Kalman model over `[x, dx, y, dy]` with position reports.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantVelocityModel<T: RealField> {
    config: ConstantVelocityConfig<T>,
    transition: ConstantVelocity2D<T>,
    sensor: PositionSensor2D<T>,
    start_covariance: StateCovariance<T, 4>,
    start_log_likelihood: T,
    skip_log_likelihood: T,
    detect_log_likelihood: T,
}

impl<T: RealField + Copy> ConstantVelocityModel<T> {
    /// Builds a model after validating `config`.
    ///
    /// # Errors
    /// [`MhtError::InvalidConfig`] for non-physical parameters.
    pub fn new(config: ConstantVelocityConfig<T>) -> Result<Self> {
        config.validate()?;

        let transition = ConstantVelocity2D::new(config.process_variance);
        let sensor = PositionSensor2D::new(
            config.position_variance_x,
            config.position_variance_y,
            config.detect_probability,
        );
        let start_covariance = StateCovariance::from_diagonal(&nalgebra::vector![
            config.position_variance_x,
            config.state_variance,
            config.position_variance_y,
            config.state_variance
        ]);

        let pd = sensor.detection_probability();
        let model = Self {
            start_log_likelihood: config.start_probability.ln(),
            skip_log_likelihood: (T::one() - pd).ln(),
            detect_log_likelihood: pd.ln(),
            transition,
            sensor,
            start_covariance,
            config,
        };

        log::debug!(
            "constant-velocity model ready: process variance {}, max distance {}, lambda_x {}",
            model.config.process_variance,
            model.config.max_distance,
            model.config.lambda_x
        );
        Ok(model)
    }

    #[inline]
    pub fn config(&self) -> &ConstantVelocityConfig<T> {
        &self.config
    }

    /// Covariance every new track starts with.
    #[inline]
    pub fn start_covariance(&self) -> &StateCovariance<T, 4> {
        &self.start_covariance
    }

    #[inline]
    pub fn start_log_likelihood(&self) -> T {
        self.start_log_likelihood
    }

    /// Builds a prepared state from an explicit estimate.
    ///
    /// # Errors
    /// [`MhtError::SingularMatrix`] if the innovation covariance is singular.
    pub fn make_state(
        &self,
        kalman: KalmanState<T>,
        log_likelihood: T,
        num_skipped: u32,
    ) -> Result<MotionState<T>> {
        let prediction = kalman.setup(&self.transition, &self.sensor)?;
        Ok(MotionState {
            kalman,
            num_skipped,
            log_likelihood,
            prediction,
        })
    }

    /// Successor of `state` given `report`.
    ///
    /// - `(None, Some(report))` starts a track at the report with zero
    ///   velocity, the start covariance and the start log-likelihood.
    /// - `(Some(state), None)` skips a frame: the prediction becomes the new
    ///   estimate and the miss counter increments.
    /// - `(Some(state), Some(report))` continues with the report. Reports
    ///   farther than the maximum squared Mahalanobis distance are gated out
    ///   and yield `Ok(None)`. A state whose velocity is still exactly zero
    ///   first takes `report - position` as its velocity.
    ///
    /// # Panics
    /// Panics if both `state` and `report` are `None`.
    pub fn next_state(
        &self,
        state: Option<&MotionState<T>>,
        report: Option<&Report<T>>,
    ) -> Result<Option<MotionState<T>>> {
        match (state, report) {
            (None, Some(report)) => self.start(report).map(Some),
            (Some(state), None) => self.skip(state).map(Some),
            (Some(state), Some(report)) => self.continue_with(state, report),
            (None, None) => panic!("next_state needs a prior state or a report"),
        }
    }

    /// First state of a track, placed at `report` with zero velocity.
    pub fn start(&self, report: &Report<T>) -> Result<MotionState<T>> {
        let zero = T::zero();
        let kalman = KalmanState::new(
            StateVector::from_kinematics(report.x(), zero, report.y(), zero),
            self.start_covariance,
        );
        self.make_state(kalman, self.start_log_likelihood, 0)
    }

    /// Successor of `state` when the track produced no report.
    pub fn skip(&self, state: &MotionState<T>) -> Result<MotionState<T>> {
        let prediction = state.setup();
        let kalman = KalmanState::new(prediction.predicted_mean, prediction.next_covariance);
        self.make_state(kalman, T::zero(), state.num_skipped + 1)
    }

    fn continue_with(
        &self,
        state: &MotionState<T>,
        report: &Report<T>,
    ) -> Result<Option<MotionState<T>>> {
        let bootstrapped;
        let state = if state.has_zero_velocity() {
            let [x, y] = state.position();
            let (dx, dy) = (report.x() - x, report.y() - y);
            log::trace!("bootstrapping velocity ({}, {}) from report {:?}", dx, dy, report.id());

            let kalman = KalmanState::new(state.mean().with_velocity(dx, dy), *state.covariance());
            bootstrapped = self.make_state(kalman, state.log_likelihood, state.num_skipped)?;
            &bootstrapped
        } else {
            state
        };

        let prediction = state.setup();
        let innovation = prediction.innovation(&report.z());
        let distance = prediction.mahalanobis_distance_squared(&innovation);

        if distance > self.config.max_distance {
            log::trace!(
                "report {:?} gated out: distance {} > {}",
                report.id(),
                distance,
                self.config.max_distance
            );
            return Ok(None);
        }

        let kalman = KalmanState::new(
            prediction.corrected_mean(&innovation),
            prediction.next_covariance,
        );
        self.make_state(kalman, prediction.measurement_log_likelihood(distance), 0)
            .map(Some)
    }

    /// Probability that a track with `num_skipped` misses has ended.
    ///
    /// p = 1 - exp(-m / lambda_x), nudged off zero.
    fn end_probability(&self, num_skipped: u32) -> T {
        let m: T = nalgebra::convert(f64::from(num_skipped));
        let p = T::one() - (-m / self.config.lambda_x).exp();
        if p == T::zero() {
            p + nalgebra::convert(END_PROBABILITY_EPSILON)
        } else {
            p
        }
    }
}

impl<T: RealField + Copy> MotionModel<T> for ConstantVelocityModel<T> {
    type State = MotionState<T>;
    type Report = Report<T>;

    fn kind(&self) -> ModelKind {
        ModelKind::ConstantVelocity
    }

    /// Always one: new tracks start only from single, unattached reports.
    fn begin_new_states(&self, _state: Option<&MotionState<T>>, _report: Option<&Report<T>>) -> usize {
        1
    }

    fn new_state(
        &self,
        branch: usize,
        state: Option<&MotionState<T>>,
        report: Option<&Report<T>>,
    ) -> Result<Option<MotionState<T>>> {
        assert!(
            branch < self.begin_new_states(state, report),
            "constant-velocity model has no branch {}",
            branch
        );
        self.next_state(state, report)
    }

    fn end_log_likelihood(&self, state: &MotionState<T>) -> T {
        self.end_probability(state.num_skipped).ln()
    }

    fn continue_log_likelihood(&self, state: &MotionState<T>) -> T {
        (T::one() - self.end_probability(state.num_skipped)).ln()
    }

    /// Flat per-frame miss cost `ln(1 - p_detect)`, independent of how many
    /// frames were already skipped.
    fn skip_log_likelihood(&self, _state: &MotionState<T>) -> T {
        self.skip_log_likelihood
    }

    fn detect_log_likelihood(&self, _state: &MotionState<T>) -> T {
        self.detect_log_likelihood
    }

    fn state_log_likelihood(&self, state: &MotionState<T>) -> T {
        state.log_likelihood
    }

    fn state_position(&self, state: &MotionState<T>) -> [T; 2] {
        state.position()
    }
}
