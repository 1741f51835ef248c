//! Common helpers for tracking integration tests

#![allow(dead_code)]

use mht_motion::prelude::*;

/// Model with the reference parameters
/// (q = 1, R = I, startP = diag(1, 10, 1, 10), lambda_x = 5, pd = 0.9, gate 9).
pub fn default_model() -> ConstantVelocityModel<f64> {
    ConstantVelocityModel::new(ConstantVelocityConfig::default()).unwrap()
}

pub fn report(x: f64, y: f64, frame: u32, id: usize) -> Report<f64> {
    Report::new(x, y, frame, ReportId(id))
}

/// A frame holding the given corners, numbered in order.
pub fn corner_frame(frame: u32, corners: &[(f64, f64)]) -> CornerFrame<f64> {
    let mut f = CornerFrame::new(frame);
    for &(x, y) in corners {
        f.push(x, y);
    }
    f
}

/// Minimal single-hypothesis driver.
///
/// Each frame it commits the highest scoring gated continuations greedily
/// (every track and report used at most once), skips unmatched tracks,
/// drops tracks whose end score beats their skip score, and either starts
/// tracks from or discards as false alarms the remaining reports.
pub struct GreedyDriver {
    pub model: ConstantVelocityModel<f64>,
    pub store: TrackStore<f64>,
    pub clock: FrameClock,
    pub live: Vec<(TrackId, MotionState<f64>)>,
    pub start_new_tracks: bool,
}

impl GreedyDriver {
    pub fn new(model: ConstantVelocityModel<f64>) -> Self {
        Self {
            model,
            store: TrackStore::new(),
            clock: FrameClock::new(),
            live: Vec::new(),
            start_new_tracks: true,
        }
    }

    pub fn step(&mut self, frame: CornerFrame<f64>) {
        self.store.measure(&self.clock, frame.into_reports());
        let reports = self.store.candidate_reports().to_vec();

        let states: Vec<_> = self.live.iter().map(|(_, s)| s.clone()).collect();
        let mut candidates = score_continuations(&self.model, &states, &reports).unwrap();
        candidates.sort_by(|a, b| b.log_likelihood.total_cmp(&a.log_likelihood));

        let mut next: Vec<Option<MotionState<f64>>> = vec![None; states.len()];
        let mut used = vec![false; reports.len()];
        for c in candidates {
            if next[c.state_index].is_some() || used[c.report_index] {
                continue;
            }
            let id = self.live[c.state_index].0;
            self.store
                .verify_state(&self.clock, id, &self.model, &c.state, &reports[c.report_index])
                .unwrap();
            used[c.report_index] = true;
            next[c.state_index] = Some(c.state);
        }

        let mut survivors = Vec::new();
        for ((id, state), successor) in self.live.drain(..).zip(next) {
            match successor {
                Some(s) => survivors.push((id, s)),
                None => {
                    let scores = BranchScores::for_state(&self.model, &state);
                    let ends = match (scores.end, scores.skip) {
                        (Some(end), Some(skip)) => end > skip,
                        (Some(_), None) => true,
                        _ => false,
                    };
                    if !ends {
                        survivors.push((id, self.model.skip(&state).unwrap()));
                    }
                }
            }
        }
        self.live = survivors;

        for (report, _) in reports.iter().zip(&used).filter(|(_, u)| !**u) {
            if self.start_new_tracks {
                let id = self.store.next_track_id().unwrap();
                let state = self.model.start(report).unwrap();
                self.store
                    .verify_state(&self.clock, id, &self.model, &state, report)
                    .unwrap();
                self.live.push((id, state));
            } else {
                self.store.save_false_alarm(report);
            }
        }

        self.clock.advance();
    }

    pub fn live_state(&self, id: TrackId) -> Option<&MotionState<f64>> {
        self.live.iter().find(|(i, _)| *i == id).map(|(_, s)| s)
    }
}
