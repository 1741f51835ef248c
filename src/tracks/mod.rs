//! Committed tracks and false alarms
//!
//! - [`Track`] / [`TrackElement`]: append-only history of one target
//! - [`FalseAlarm`]: a report explained as noise
//! - [`TrackStore`]: the session registry written in each frame's commit phase

mod record;
mod store;

pub use record::*;
pub use store::*;
