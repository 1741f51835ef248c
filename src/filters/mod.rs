//! Per-track filtering
//!
//! - [`kalman::KalmanState`]: constant-velocity estimate of one track
//! - [`kalman::Prediction`]: report-independent quantities for the next frame

pub mod kalman;
