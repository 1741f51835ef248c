//! Model traits for corner tracking
//!
//! Linear dynamics and sensor models, and the motion model that combines
//! them into the branch likelihoods the hypothesis tree compares.

mod transition;
mod observation;
mod motion;

pub use transition::*;
pub use observation::*;
pub use motion::*;
