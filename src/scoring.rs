//! Branch scoring helpers for a hypothesis engine
//!
//! At every live track node the engine opens up to three kinds of children:
//! END (the track stops), SKIP (the track lives on but produced no report)
//! and CONTINUE (the track lives on and explains one report). This module
//! turns a [`MotionModel`]'s per-state likelihoods into those branch scores,
//! and gates every state against every report of a frame.
//!
//! # Example
//!
//! ```
//! use mht_motion::models::{ConstantVelocityConfig, ConstantVelocityModel};
//! use mht_motion::scoring::{score_continuations, BranchScores};
//! use mht_motion::types::report::{Report, ReportId};
//!
//! let model = ConstantVelocityModel::new(ConstantVelocityConfig::<f64>::default()).unwrap();
//! let first = Report::new(0.0, 0.0, 0, ReportId(0));
//! let second = Report::new(1.0, 0.0, 1, ReportId(0));
//! let start = model.next_state(None, Some(&first)).unwrap().unwrap();
//! let state = model.next_state(Some(&start), Some(&second)).unwrap().unwrap();
//!
//! let scores = BranchScores::for_state(&model, &state);
//! assert!(scores.skip.is_some());
//!
//! // The track now moves right, so the far report falls outside the gate
//! let reports = [Report::new(2.0, 0.0, 2, ReportId(0)), Report::new(50.0, 50.0, 2, ReportId(1))];
//! let continuations = score_continuations(&model, &[state], &reports).unwrap();
//! assert_eq!(continuations.len(), 1);
//! assert_eq!(continuations[0].report_index, 0);
//! ```

use nalgebra::RealField;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::models::MotionModel;
use crate::Result;

// ============================================================================
// Branch Scores
// ============================================================================

/// Report-independent scores of the children of one track node.
///
/// A branch is `None` when the model gives it zero probability, in which
/// case the engine must not open it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchScores<T> {
    /// `end + skip`: the track ends and produced no report
    pub end: Option<T>,
    /// `continue + skip`: the track lives on without a report
    pub skip: Option<T>,
    /// `continue + detect`: the track lives on and was detected.
    /// Add the successor's state log-likelihood to score a continuation.
    pub detect: Option<T>,
}

impl<T: RealField + Copy> BranchScores<T> {
    pub fn for_state<M>(model: &M, state: &M::State) -> Self
    where
        M: MotionModel<T>,
    {
        let end = model.end_log_likelihood(state);
        let cont = model.continue_log_likelihood(state);
        let skip = model.skip_log_likelihood(state);
        let detect = model.detect_log_likelihood(state);

        let live = cont.is_finite();
        Self {
            end: end.is_finite().then(|| end + skip),
            skip: live.then(|| cont + skip),
            detect: live.then(|| cont + detect),
        }
    }

    /// Score of continuing with a successor whose own log-likelihood is
    /// `state_log_likelihood`.
    #[inline]
    pub fn continuation(&self, state_log_likelihood: T) -> Option<T> {
        self.detect.map(|d| d + state_log_likelihood)
    }
}

// ============================================================================
// Continuations
// ============================================================================

/// A gated (state, report) pair and its successor.
#[derive(Debug, Clone, PartialEq)]
pub struct Continuation<T, S> {
    /// Index into the scored states
    pub state_index: usize,
    /// Index into the scored reports
    pub report_index: usize,
    /// Successor state produced by the model
    pub state: S,
    /// `continue + detect + successor log-likelihood`
    pub log_likelihood: T,
}

/// Every successor of `state` that survives gating against `reports`.
fn continuations_of<T, M>(
    model: &M,
    state_index: usize,
    state: &M::State,
    reports: &[M::Report],
) -> Result<Vec<Continuation<T, M::State>>>
where
    T: RealField + Copy,
    M: MotionModel<T>,
{
    let scores = BranchScores::for_state(model, state);
    if scores.detect.is_none() {
        return Ok(Vec::new());
    }

    let mut out = Vec::new();
    for (report_index, report) in reports.iter().enumerate() {
        for branch in 0..model.begin_new_states(Some(state), Some(report)) {
            let Some(next) = model.new_state(branch, Some(state), Some(report))? else {
                continue;
            };
            if let Some(log_likelihood) = scores.continuation(model.state_log_likelihood(&next)) {
                out.push(Continuation {
                    state_index,
                    report_index,
                    state: next,
                    log_likelihood,
                });
            }
        }
    }
    Ok(out)
}

/// Gates every state against every report of a frame.
///
/// Results are ordered by state index, then report index. Pairs rejected by
/// the gate are left out.
///
/// # Errors
/// Propagates [`MhtError::SingularMatrix`](crate::MhtError::SingularMatrix)
/// from preparing a successor.
#[cfg(not(feature = "rayon"))]
pub fn score_continuations<T, M>(
    model: &M,
    states: &[M::State],
    reports: &[M::Report],
) -> Result<Vec<Continuation<T, M::State>>>
where
    T: RealField + Copy,
    M: MotionModel<T>,
{
    let mut out = Vec::new();
    for (state_index, state) in states.iter().enumerate() {
        out.extend(continuations_of(model, state_index, state, reports)?);
    }
    log::trace!(
        "{} continuations from {} states x {} reports",
        out.len(),
        states.len(),
        reports.len()
    );
    Ok(out)
}

/// Gates every state against every report of a frame, one rayon task per
/// state.
///
/// Results are ordered by state index, then report index. Pairs rejected by
/// the gate are left out.
///
/// # Errors
/// Propagates [`MhtError::SingularMatrix`](crate::MhtError::SingularMatrix)
/// from preparing a successor.
#[cfg(feature = "rayon")]
pub fn score_continuations<T, M>(
    model: &M,
    states: &[M::State],
    reports: &[M::Report],
) -> Result<Vec<Continuation<T, M::State>>>
where
    T: RealField + Copy,
    M: MotionModel<T> + Sync,
    M::State: Send + Sync,
    M::Report: Sync,
{
    let per_state: Vec<Vec<_>> = states
        .par_iter()
        .enumerate()
        .map(|(state_index, state)| continuations_of(model, state_index, state, reports))
        .collect::<Result<_>>()?;

    let out: Vec<_> = per_state.into_iter().flatten().collect();
    log::trace!(
        "{} continuations from {} states x {} reports",
        out.len(),
        states.len(),
        reports.len()
    );
    Ok(out)
}
