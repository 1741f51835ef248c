//! Properties of the constant-velocity motion model

mod common;

use approx::assert_relative_eq;
use common::{default_model, report};
use mht_motion::prelude::*;

#[test]
fn test_start_branch_never_gates() {
    let model = default_model();

    for (i, &(x, y)) in [(0.0, 0.0), (-500.0, 3.5), (1e6, -1e6)].iter().enumerate() {
        let state = model
            .next_state(None, Some(&report(x, y, 0, i)))
            .unwrap()
            .expect("start is never gated");

        assert_eq!(state.mean(), &StateVector::from_kinematics(x, 0.0, y, 0.0));
        assert_relative_eq!(state.log_likelihood(), 0.5_f64.ln(), epsilon = 1e-12);
        assert_eq!(state.num_skipped(), 0);
    }
}

#[test]
fn test_scoring_is_bit_identical() {
    let model = default_model();
    let copy = model.clone();
    let start = model.start(&report(0.0, 0.0, 0, 0)).unwrap();
    let state = model
        .next_state(Some(&start), Some(&report(1.0, 0.5, 1, 0)))
        .unwrap()
        .unwrap();

    let r = report(2.2, 0.9, 2, 0);
    let a = model.next_state(Some(&state), Some(&r)).unwrap().unwrap();
    let b = copy
        .next_state(Some(&state.clone()), Some(&r))
        .unwrap()
        .unwrap();

    assert_eq!(a.mean(), b.mean());
    assert_eq!(a.covariance(), b.covariance());
    assert_eq!(a.log_likelihood().to_bits(), b.log_likelihood().to_bits());
}

#[test]
fn test_gate_accepts_boundary() {
    let model = ConstantVelocityModel::new(ConstantVelocityConfig {
        position_variance_x: 2.0,
        position_variance_y: 2.0,
        process_variance: 0.0,
        max_distance: 9.0,
        ..ConstantVelocityConfig::default()
    })
    .unwrap();
    let state = model
        .make_state(
            KalmanState::new(
                StateVector::from_kinematics(0.0, 0.0, 10.0, 1.0),
                StateCovariance::identity(),
            ),
            0.0,
            0,
        )
        .unwrap();

    let s = state.setup().innovation_covariance;
    assert_relative_eq!(s.as_matrix()[(0, 0)], 4.0);
    assert_relative_eq!(s.as_matrix()[(1, 1)], 4.0);

    // predicted (0, 11); a y-innovation of 6 gives d = 9
    assert!(model
        .next_state(Some(&state), Some(&report(0.0, 17.0, 1, 0)))
        .unwrap()
        .is_some());
    assert!(model
        .next_state(Some(&state), Some(&report(0.0, 17.00001, 1, 0)))
        .unwrap()
        .is_none());
    assert!(model
        .next_state(Some(&state), Some(&report(0.0, 4.99999, 1, 0)))
        .unwrap()
        .is_none());
}

#[test]
fn test_end_and_continue_are_complementary() {
    for lambda_x in [0.5, 1.0, 5.0, 40.0] {
        let model = ConstantVelocityModel::new(ConstantVelocityConfig {
            lambda_x,
            ..ConstantVelocityConfig::default()
        })
        .unwrap();

        let mut state = model.start(&report(0.0, 0.0, 0, 0)).unwrap();
        let mut last_end = f64::NEG_INFINITY;
        for _ in 0..10 {
            let end = model.end_log_likelihood(&state);
            let cont = model.continue_log_likelihood(&state);

            assert!(end >= last_end);
            assert_relative_eq!(end.exp() + cont.exp(), 1.0, epsilon = 1e-12);
            last_end = end;
            state = model.skip(&state).unwrap();
        }
    }
}

#[test]
fn test_setup_is_fixed_at_construction() {
    let model = default_model();
    let state = model.start(&report(4.0, 4.0, 0, 0)).unwrap();

    let first = state.setup().clone();
    let _ = model.next_state(Some(&state), None).unwrap();
    let _ = model.next_state(Some(&state), Some(&report(4.5, 4.0, 1, 0))).unwrap();

    assert_eq!(state.setup(), &first);
    // bootstrapping worked on a copy
    assert_eq!(state.velocity(), [0.0, 0.0]);
}

#[test]
fn test_single_precision_model() {
    let model = ConstantVelocityModel::new(ConstantVelocityConfig::<f32>::default()).unwrap();
    let start = model
        .start(&Report::new(0.0_f32, 0.0, 0, ReportId(0)))
        .unwrap();
    let next = model
        .next_state(Some(&start), Some(&Report::new(1.0_f32, 1.0, 1, ReportId(0))))
        .unwrap()
        .unwrap();

    assert_eq!(next.velocity(), [1.0, 1.0]);
    assert!(next.log_likelihood().is_finite());
}

#[test]
fn test_invalid_configuration_is_refused() {
    let err = ConstantVelocityModel::new(ConstantVelocityConfig {
        lambda_x: -1.0,
        ..ConstantVelocityConfig::<f64>::default()
    })
    .unwrap_err();

    assert_eq!(
        err.to_string(),
        "invalid model configuration: lambda_x must be positive"
    );
}
