//! Example usage of the MHT-Motion library
//!
//! Follows one corner for four frames with a trivial single-hypothesis
//! driver: continue with the best gated report, otherwise skip, and commit
//! every accepted update to the track store.

use mht_motion::prelude::*;

fn main() -> Result<()> {
    println!("MHT-Motion: constant-velocity corner tracking");
    println!("=============================================\n");

    let model = ConstantVelocityModel::new(ConstantVelocityConfig::<f64>::default())?;
    let mut store = TrackStore::new();
    let mut clock = FrameClock::new();

    // Frame 2 has no detection of the corner, only a far-away false alarm
    let frames: Vec<CornerFrame<f64>> = {
        let mut f0 = CornerFrame::new(0);
        f0.push(0.0, 0.0);
        let mut f1 = CornerFrame::new(1);
        f1.push(1.0, 0.0);
        let mut f2 = CornerFrame::new(2);
        f2.push(40.0, -25.0);
        let mut f3 = CornerFrame::new(3);
        f3.push(3.0, 0.0);
        vec![f0, f1, f2, f3]
    };

    let mut track: Option<(TrackId, MotionState<f64>)> = None;

    for frame in frames {
        let frame_no = frame.frame;
        store.measure(&clock, frame.into_reports());
        let reports = store.candidate_reports().to_vec();

        match track.take() {
            None => {
                let Some(report) = reports.first() else {
                    clock.advance();
                    continue;
                };
                let id = store.next_track_id()?;
                let Some(state) = model.new_state(0, None, Some(report))? else {
                    clock.advance();
                    continue;
                };
                store.verify_state(&clock, id, &model, &state, report)?;
                println!("Frame {}: started track {} at {:?}", frame_no, id, state.position());
                track = Some((id, state));
            }
            Some((id, state)) => {
                let best = score_continuations(&model, std::slice::from_ref(&state), &reports)?
                    .into_iter()
                    .max_by(|a, b| a.log_likelihood.total_cmp(&b.log_likelihood));

                let mut explained = None;
                let next = match best {
                    Some(c) => {
                        let report = &reports[c.report_index];
                        store.verify_state(&clock, id, &model, &c.state, report)?;
                        explained = Some(report.id());
                        println!(
                            "Frame {}: track {} continued to {:?} (log-likelihood {:.3})",
                            frame_no,
                            id,
                            c.state.position(),
                            c.log_likelihood
                        );
                        c.state
                    }
                    None => {
                        let skipped = model.skip(&state)?;
                        let scores = BranchScores::for_state(&model, &skipped);
                        println!(
                            "Frame {}: track {} skipped ({} missed), predicted {:?}, end score {:?}",
                            frame_no,
                            id,
                            skipped.num_skipped(),
                            skipped.position(),
                            scores.end
                        );
                        skipped
                    }
                };

                for report in reports.iter().filter(|r| Some(r.id()) != explained) {
                    store.save_false_alarm(report);
                }

                track = Some((id, next));
            }
        }

        clock.advance();
    }

    println!();
    for t in store.tracks() {
        println!("Track {} (color {}): {} elements", t.id(), t.color(), t.len());
        for e in t.elements() {
            println!(
                "  frame {} time {}: report {:?} state [{:.3}, {:.3}] ll {:.3}",
                e.frame, e.time, e.report_position, e.state_position[0], e.state_position[1], e.log_likelihood
            );
        }
    }
    println!("False alarms: {}", store.false_alarms().len());

    Ok(())
}
