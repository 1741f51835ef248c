//! Session-wide registry of committed tracks
//!
//! The [`TrackStore`] is written only in the commit phase of a frame, after
//! the hypothesis engine has picked its winning global hypothesis. Scoring
//! never touches it, so it needs no internal locking: callers serialize
//! commits by holding `&mut TrackStore`.

use nalgebra::{RealField, Scalar};

use super::record::{FalseAlarm, Track, TrackElement};
use crate::models::{ModelKind, MotionModel};
use crate::types::ids::{FrameClock, TrackId, TrackIdGenerator};
use crate::types::report::{Report, ReportId};
use crate::Result;

/// Tracks, false alarms and report pools of one tracking session.
#[derive(Debug, Clone)]
pub struct TrackStore<T: Scalar> {
    tracks: Vec<Track<T>>,
    false_alarms: Vec<FalseAlarm<T>>,
    ids: TrackIdGenerator,
    new_reports: Vec<Report<T>>,
    old_reports: Vec<Report<T>>,
    /// Session time at which `new_reports` was installed
    pool_time: u32,
}

impl<T: Scalar> Default for TrackStore<T> {
    fn default() -> Self {
        Self {
            tracks: Vec::new(),
            false_alarms: Vec::new(),
            ids: TrackIdGenerator::new(),
            new_reports: Vec::new(),
            old_reports: Vec::new(),
            pool_time: 0,
        }
    }
}

impl<T: RealField + Copy> TrackStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out an id no track of this session uses yet.
    ///
    /// # Errors
    /// [`MhtError::TrackIdsExhausted`](crate::MhtError::TrackIdsExhausted)
    /// once the id space is used up.
    #[inline]
    pub fn next_track_id(&mut self) -> Result<TrackId> {
        self.ids.next_id()
    }

    /// The track with `id`, created empty if this is the first time it is
    /// asked for.
    pub fn find_track(&mut self, id: TrackId) -> &mut Track<T> {
        if let Some(index) = self.tracks.iter().position(|t| t.id() == id) {
            return &mut self.tracks[index];
        }

        self.ids.reserve(id);
        let track = Track::new(id);
        log::debug!("new track {} (color {})", id, track.color());
        self.tracks.push(track);

        let index = self.tracks.len() - 1;
        &mut self.tracks[index]
    }

    /// Appends one accepted (state, report) pair to track `track_id`.
    ///
    /// # Errors
    /// [`MhtError::FrameOutOfOrder`](crate::MhtError::FrameOutOfOrder) if
    /// `frame` is not after the track's last frame. The track is unchanged.
    #[allow(clippy::too_many_arguments)]
    pub fn verify(
        &mut self,
        clock: &FrameClock,
        track_id: TrackId,
        report_position: [T; 2],
        state_position: [T; 2],
        log_likelihood: T,
        model: ModelKind,
        frame: u32,
        report_id: ReportId,
    ) -> Result<()> {
        let element = TrackElement {
            state_position,
            report_position,
            log_likelihood,
            model,
            time: clock.time(),
            frame,
            report_id,
        };
        self.find_track(track_id).push(element)
    }

    /// [`verify`](Self::verify) with positions and scores taken from a
    /// committed state and the report it was built from.
    pub fn verify_state<M>(
        &mut self,
        clock: &FrameClock,
        track_id: TrackId,
        model: &M,
        state: &M::State,
        report: &Report<T>,
    ) -> Result<()>
    where
        M: MotionModel<T>,
    {
        self.verify(
            clock,
            track_id,
            report.position(),
            model.state_position(state),
            model.state_log_likelihood(state),
            model.kind(),
            report.frame(),
            report.id(),
        )
    }

    /// Records `report` as a false alarm, stamped with the time its
    /// candidate pool was installed.
    pub fn save_false_alarm(&mut self, report: &Report<T>) {
        log::trace!(
            "false alarm {:?} in frame {} at time {}",
            report.id(),
            report.frame(),
            self.pool_time
        );
        self.false_alarms.push(FalseAlarm {
            report: *report,
            time: self.pool_time,
        });
    }

    /// Installs a frame's reports as the candidate pool at `clock`'s time.
    ///
    /// The previous pool becomes the old reports. Returns how many reports
    /// were installed.
    pub fn measure<I>(&mut self, clock: &FrameClock, reports: I) -> usize
    where
        I: IntoIterator<Item = Report<T>>,
    {
        self.old_reports = std::mem::take(&mut self.new_reports);
        self.new_reports.extend(reports);
        self.pool_time = clock.time();

        log::debug!(
            "time {}: installed {} reports ({} carried over)",
            self.pool_time,
            self.new_reports.len(),
            self.old_reports.len()
        );
        self.new_reports.len()
    }

    /// Reports of the current frame.
    #[inline]
    pub fn candidate_reports(&self) -> &[Report<T>] {
        &self.new_reports
    }

    /// Session time of the last [`measure`](Self::measure).
    #[inline]
    pub fn pool_time(&self) -> u32 {
        self.pool_time
    }

    /// Reports of the previous frame.
    #[inline]
    pub fn old_reports(&self) -> &[Report<T>] {
        &self.old_reports
    }

    #[inline]
    pub fn tracks(&self) -> &[Track<T>] {
        &self.tracks
    }

    pub fn track(&self, id: TrackId) -> Option<&Track<T>> {
        self.tracks.iter().find(|t| t.id() == id)
    }

    #[inline]
    pub fn false_alarms(&self) -> &[FalseAlarm<T>] {
        &self.false_alarms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConstantVelocityConfig, ConstantVelocityModel};
    use crate::MhtError;

    fn report(x: f64, y: f64, frame: u32, id: usize) -> Report<f64> {
        Report::new(x, y, frame, ReportId(id))
    }

    #[test]
    fn test_find_track_is_idempotent() {
        let mut store = TrackStore::<f64>::new();

        for _ in 0..5 {
            let track = store.find_track(TrackId(4));
            assert_eq!(track.id(), TrackId(4));
        }
        store.find_track(TrackId(1));

        assert_eq!(store.tracks().len(), 2);
        assert_eq!(store.track(TrackId(4)).unwrap().color(), 5);
        assert!(store.track(TrackId(2)).is_none());
    }

    #[test]
    fn test_found_ids_are_never_reissued() {
        let mut store = TrackStore::<f64>::new();
        assert_eq!(store.next_track_id().unwrap(), TrackId(0));

        store.find_track(TrackId(10));
        assert_eq!(store.next_track_id().unwrap(), TrackId(11));
    }

    #[test]
    fn test_find_track_at_top_of_id_range() {
        let mut store = TrackStore::<f64>::new();

        store.find_track(TrackId(u32::MAX - 1));
        assert_eq!(store.next_track_id().unwrap(), TrackId(u32::MAX));
        assert_eq!(store.next_track_id().unwrap_err(), MhtError::TrackIdsExhausted);

        let track = store.find_track(TrackId(u32::MAX));
        assert_eq!(track.id(), TrackId(u32::MAX));
        assert!(track.is_empty());
        assert_eq!(store.tracks().len(), 2);
    }

    #[test]
    fn test_verify_appends() {
        let mut store = TrackStore::<f64>::new();
        let mut clock = FrameClock::new();
        let id = store.next_track_id().unwrap();

        for frame in [0u32, 1, 3] {
            store
                .verify(
                    &clock,
                    id,
                    [frame as f64, 0.0],
                    [frame as f64, 0.1],
                    -2.0,
                    ModelKind::ConstantVelocity,
                    frame,
                    ReportId(0),
                )
                .unwrap();
            clock.advance();
        }

        let track = store.track(id).unwrap();
        assert_eq!(track.len(), 3);
        assert_eq!(track.elements()[2].frame, 3);
        assert_eq!(track.elements()[2].time, 2);
        assert_eq!(track.elements()[2].report_position, [3.0, 0.0]);
        assert_eq!(track.elements()[2].state_position, [3.0, 0.1]);
    }

    #[test]
    fn test_verify_rejects_stale_frame() {
        let mut store = TrackStore::<f64>::new();
        let clock = FrameClock::new();
        let id = TrackId(0);

        store
            .verify(&clock, id, [0.0, 0.0], [0.0, 0.0], 0.0, ModelKind::ConstantVelocity, 5, ReportId(0))
            .unwrap();
        let err = store
            .verify(&clock, id, [0.0, 0.0], [0.0, 0.0], 0.0, ModelKind::ConstantVelocity, 4, ReportId(1))
            .unwrap_err();

        assert!(matches!(err, MhtError::FrameOutOfOrder { last: 5, frame: 4, .. }));
        assert_eq!(store.track(id).unwrap().len(), 1);
    }

    #[test]
    fn test_verify_state_uses_model_accessors() {
        let model = ConstantVelocityModel::new(ConstantVelocityConfig::<f64>::default()).unwrap();
        let mut store = TrackStore::new();
        let clock = FrameClock::at_time(7);

        let r = report(2.0, 3.0, 4, 9);
        let state = model.next_state(None, Some(&r)).unwrap().unwrap();
        store
            .verify_state(&clock, TrackId(1), &model, &state, &r)
            .unwrap();

        let e = store.track(TrackId(1)).unwrap().elements()[0];
        assert_eq!(e.state_position, [2.0, 3.0]);
        assert_eq!(e.report_position, [2.0, 3.0]);
        assert_eq!(e.model.code(), 2);
        assert_eq!(e.time, 7);
        assert_eq!(e.frame, 4);
        assert_eq!(e.report_id, ReportId(9));
        assert!((e.log_likelihood - 0.5_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_false_alarms_leave_tracks_alone() {
        let mut store = TrackStore::<f64>::new();
        store.find_track(TrackId(0));

        store.save_false_alarm(&report(1.0, 1.0, 0, 0));
        store.save_false_alarm(&report(2.0, 2.0, 0, 1));

        assert_eq!(store.false_alarms().len(), 2);
        assert_eq!(store.false_alarms()[1].report.position(), [2.0, 2.0]);
        assert!(store.track(TrackId(0)).unwrap().is_empty());
    }

    #[test]
    fn test_measure_rotates_pools() {
        let mut store = TrackStore::<f64>::new();
        let mut clock = FrameClock::new();

        let n = store.measure(&clock, vec![report(0.0, 0.0, 0, 0), report(1.0, 1.0, 0, 1)]);
        assert_eq!(n, 2);
        assert!(store.old_reports().is_empty());

        clock.advance();
        let n = store.measure(&clock, vec![report(5.0, 5.0, 1, 0)]);
        assert_eq!(n, 1);
        assert_eq!(store.old_reports().len(), 2);
        assert_eq!(store.candidate_reports()[0].position(), [5.0, 5.0]);
        assert_eq!(store.pool_time(), 1);
    }

    #[test]
    fn test_false_alarms_carry_pool_time() {
        let mut store = TrackStore::<f64>::new();

        store.measure(&FrameClock::at_time(3), vec![report(1.0, 1.0, 8, 0)]);
        let clutter = store.candidate_reports()[0];
        store.save_false_alarm(&clutter);

        store.measure(&FrameClock::at_time(4), vec![report(2.0, 2.0, 9, 0)]);
        let clutter = store.candidate_reports()[0];
        store.save_false_alarm(&clutter);

        let times: Vec<_> = store.false_alarms().iter().map(|f| f.time).collect();
        assert_eq!(times, vec![3, 4]);
        assert_eq!(store.false_alarms()[0].report.frame(), 8);
    }
}
