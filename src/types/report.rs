//! Observations fed into the motion model
//!
//! A [`Corner`] is a raw detected image feature. The ingestion adapter turns
//! every corner of a frame into a [`Report`], the structured 2-D position
//! measurement the motion model scores against track states.

use nalgebra::{RealField, Scalar};

use super::spaces::Measurement;

/// Identifier of the corner a report was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReportId(pub usize);

// ============================================================================
// Raw frame data
// ============================================================================

/// A detected corner in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corner<T: Scalar> {
    pub x: T,
    pub y: T,
    /// Frame the corner was detected in
    pub frame: u32,
    /// Detector-assigned corner id
    pub id: usize,
}

impl<T: Scalar> Corner<T> {
    #[inline]
    pub fn new(x: T, y: T, frame: u32, id: usize) -> Self {
        Self { x, y, frame, id }
    }
}

/// All corners detected in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct CornerFrame<T: Scalar> {
    pub frame: u32,
    pub corners: Vec<Corner<T>>,
}

impl<T: RealField + Copy> CornerFrame<T> {
    /// An empty frame.
    pub fn new(frame: u32) -> Self {
        Self {
            frame,
            corners: Vec::new(),
        }
    }

    /// Adds a corner, numbering it after the corners already present.
    pub fn push(&mut self, x: T, y: T) -> &mut Self {
        let id = self.corners.len();
        self.corners.push(Corner::new(x, y, self.frame, id));
        self
    }

    /// Converts the frame into reports ready for [`TrackStore::measure`](crate::tracks::TrackStore::measure).
    pub fn into_reports(self) -> Vec<Report<T>> {
        self.corners.into_iter().map(Report::from).collect()
    }
}

// ============================================================================
// Report
// ============================================================================

/// A 2-D position measurement derived from a corner.
///
/// Immutable. States created against a report only copy what they need
/// from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Report<T: Scalar> {
    x: T,
    y: T,
    frame: u32,
    id: ReportId,
}

impl<T: RealField + Copy> Report<T> {
    #[inline]
    pub fn new(x: T, y: T, frame: u32, id: ReportId) -> Self {
        Self { x, y, frame, id }
    }

    #[inline]
    pub fn x(&self) -> T {
        self.x
    }

    #[inline]
    pub fn y(&self) -> T {
        self.y
    }

    #[inline]
    pub fn position(&self) -> [T; 2] {
        [self.x, self.y]
    }

    #[inline]
    pub fn frame(&self) -> u32 {
        self.frame
    }

    #[inline]
    pub fn id(&self) -> ReportId {
        self.id
    }

    /// The measurement vector `Z = [x, y]`.
    #[inline]
    pub fn z(&self) -> Measurement<T, 2> {
        Measurement::from_array([self.x, self.y])
    }
}

impl<T: RealField + Copy> From<Corner<T>> for Report<T> {
    fn from(corner: Corner<T>) -> Self {
        Report::new(corner.x, corner.y, corner.frame, ReportId(corner.id))
    }
}
