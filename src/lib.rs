//! MHT-Motion: motion model and track bookkeeping for multiple hypothesis tracking
//!
//! Scores how well image-feature reports continue existing tracks, and
//! stores the tracks a hypothesis engine commits.
//!
//! # Features
//!
//! - **Type Safety**: state, measurement and innovation spaces are distinct types
//! - **Immutable States**: each motion state carries its Kalman prediction from construction
//! - **Parallel Scoring**: optional `rayon` feature scores continuations concurrently

pub mod types;
pub mod models;
pub mod filters;
pub mod scoring;
pub mod tracks;

pub mod prelude {
    pub use crate::types::ids::*;
    pub use crate::types::report::*;
    pub use crate::types::spaces::*;
    pub use crate::types::transforms::*;
    pub use crate::models::*;
    pub use crate::filters::kalman::*;
    pub use crate::scoring::*;
    pub use crate::tracks::*;
    pub use crate::{MhtError, Result};
}

/// Error types for the library
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MhtError {
    /// Matrix is singular and cannot be inverted
    #[error("innovation covariance is singular")]
    SingularMatrix,
    /// Model parameters are out of range
    #[error("invalid model configuration: {0}")]
    InvalidConfig(String),
    /// A track element was committed for a frame not after the track's last one
    #[error("track {track} already has frame {last}, cannot append frame {frame}")]
    FrameOutOfOrder {
        track: types::ids::TrackId,
        last: u32,
        frame: u32,
    },
    /// Every track id has been handed out or reserved
    #[error("no unused track ids left")]
    TrackIdsExhausted,
}

pub type Result<T> = core::result::Result<T, MhtError>;
