//! Track identities and session time
//!
//! Track ids are handed out by a monotonic counter owned by the tracking
//! session. Session time is an explicit value threaded into every call that
//! stamps records with it.

use crate::{MhtError, Result};

// ============================================================================
// Track Id
// ============================================================================

/// Identity of one confirmed target across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub u32);

impl TrackId {
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for TrackId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// Track Id Generator
// ============================================================================

/// Generates unique, increasing track ids.
#[derive(Debug, Clone)]
pub struct TrackIdGenerator {
    /// `None` once `u32::MAX` has been issued or reserved
    next: Option<u32>,
}

impl Default for TrackIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackIdGenerator {
    #[inline]
    pub const fn new() -> Self {
        Self { next: Some(0) }
    }

    /// Hands out the next unused id.
    ///
    /// # Errors
    /// [`MhtError::TrackIdsExhausted`] once `u32::MAX` is taken.
    #[inline]
    pub fn next_id(&mut self) -> Result<TrackId> {
        let id = self.next.ok_or(MhtError::TrackIdsExhausted)?;
        self.next = id.checked_add(1);
        Ok(TrackId(id))
    }

    /// Makes sure ids handed out later never collide with `id`.
    ///
    /// Used when a track is created for an id chosen outside the generator.
    #[inline]
    pub fn reserve(&mut self, id: TrackId) {
        if let Some(next) = self.next {
            if id.0 >= next {
                self.next = id.0.checked_add(1);
            }
        }
    }
}

// ============================================================================
// Frame Clock
// ============================================================================

/// Session time, advanced once per processed frame.
///
/// Passed by reference into `verify` so every track element carries the
/// time at which it was committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameClock {
    time: u32,
}

impl FrameClock {
    #[inline]
    pub const fn new() -> Self {
        Self { time: 0 }
    }

    #[inline]
    pub const fn at_time(time: u32) -> Self {
        Self { time }
    }

    #[inline]
    pub fn advance(&mut self) {
        self.time += 1;
    }

    #[inline]
    pub fn time(&self) -> u32 {
        self.time
    }
}
