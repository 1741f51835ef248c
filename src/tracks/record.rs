//! Committed track history
//!
//! Once a hypothesis engine resolves a frame, every accepted (state, report)
//! pair becomes one [`TrackElement`] appended to its [`Track`]. Reports the
//! winning hypothesis explained as noise are kept as [`FalseAlarm`]s.

use nalgebra::Scalar;

use crate::models::ModelKind;
use crate::types::ids::TrackId;
use crate::types::report::{Report, ReportId};
use crate::{MhtError, Result};

/// Display colors cycled through by track id.
pub const TRACK_PALETTE: [u8; 25] = [
    1, 2, 3, 4, 5, 6, 8, 9, 10, 11, 12, 13, 14, 15, 67, 72, 75, 81, 85, 90, 97, 101, 153, 156, 164,
];

/// Palette entry for `id`.
#[inline]
pub fn track_color(id: TrackId) -> u8 {
    TRACK_PALETTE[id.get() as usize % TRACK_PALETTE.len()]
}

// ============================================================================
// Track Element
// ============================================================================

/// One accepted (state, report) pair of a track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackElement<T: Scalar> {
    /// Estimated `(x, y)` after the update
    pub state_position: [T; 2],
    /// Reported `(x, y)`
    pub report_position: [T; 2],
    pub log_likelihood: T,
    pub model: ModelKind,
    /// Session time at commit
    pub time: u32,
    pub frame: u32,
    pub report_id: ReportId,
}

// ============================================================================
// Track
// ============================================================================

/// History of one target identity, ordered by strictly increasing frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Track<T: Scalar> {
    id: TrackId,
    color: u8,
    elements: Vec<TrackElement<T>>,
}

impl<T: Scalar + Copy> Track<T> {
    /// An empty track colored from its id.
    pub fn new(id: TrackId) -> Self {
        Self {
            id,
            color: track_color(id),
            elements: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> TrackId {
        self.id
    }

    #[inline]
    pub fn color(&self) -> u8 {
        self.color
    }

    #[inline]
    pub fn elements(&self) -> &[TrackElement<T>] {
        &self.elements
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Frame of the most recent element.
    #[inline]
    pub fn last_frame(&self) -> Option<u32> {
        self.elements.last().map(|e| e.frame)
    }

    /// Appends `element`, refusing frames that do not move forward.
    pub(crate) fn push(&mut self, element: TrackElement<T>) -> Result<()> {
        if let Some(last) = self.last_frame() {
            if element.frame <= last {
                return Err(MhtError::FrameOutOfOrder {
                    track: self.id,
                    last,
                    frame: element.frame,
                });
            }
        }
        self.elements.push(element);
        Ok(())
    }
}

// ============================================================================
// False Alarm
// ============================================================================

/// Snapshot of a report explained as a spurious detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FalseAlarm<T: Scalar> {
    pub report: Report<T>,
    /// Session time at which the report's frame was installed
    pub time: u32,
}
