//! Tracking metrics: RMSE position/velocity, ID-switch count, precision/recall.
//!
//! Each frame, confirmed tracks are matched one-to-one to ground-truth
//! objects by greedy nearest neighbour on Euclidean position distance
//! (the same solver the tracker uses, with squared distance as cost).

use crate::association::{associate_greedy, CostMatrix};
use crate::track::TrackSnapshot;
use crate::types::TrackId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ground-truth state of one object at a given time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroundTruth {
    /// True object ID (from simulator)
    pub target_id: u64,
    pub time: f64,
    /// [x, y, vx, vy]
    pub state: [f64; 4],
}

/// Accumulated metric statistics.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TrackingMetrics {
    /// Number of frames evaluated
    pub n_frames: u64,
    /// Total number of matched (track, target) pairs evaluated
    pub n_matched: u64,
    /// Sum of squared position errors (for RMSE)
    pub sum_sq_pos_err: f64,
    /// Sum of squared velocity errors (for RMSE)
    pub sum_sq_vel_err: f64,
    /// Confirmed tracks matched to a target
    pub true_positives: u64,
    /// Confirmed tracks with no target nearby
    pub false_positives: u64,
    /// Targets with no confirmed track nearby
    pub false_negatives: u64,
    /// Times a target's matched track id changed
    pub id_switches: u64,
    /// Last track matched to each target
    #[serde(skip)]
    last_match: HashMap<u64, TrackId>,
}

impl TrackingMetrics {
    /// Root-mean-square position error (meters, 2D).
    pub fn rmse_position(&self) -> f64 {
        if self.n_matched == 0 {
            return 0.0;
        }
        (self.sum_sq_pos_err / self.n_matched as f64).sqrt()
    }

    /// Root-mean-square velocity error (m/s, 2D).
    pub fn rmse_velocity(&self) -> f64 {
        if self.n_matched == 0 {
            return 0.0;
        }
        (self.sum_sq_vel_err / self.n_matched as f64).sqrt()
    }

    /// Precision = TP / (TP + FP)
    pub fn precision(&self) -> f64 {
        let denom = (self.true_positives + self.false_positives) as f64;
        if denom == 0.0 { 1.0 } else { self.true_positives as f64 / denom }
    }

    /// Recall = TP / (TP + FN)
    pub fn recall(&self) -> f64 {
        let denom = (self.true_positives + self.false_negatives) as f64;
        if denom == 0.0 { 1.0 } else { self.true_positives as f64 / denom }
    }

    /// Accumulate one frame. Only confirmed tracks count; a track and a
    /// target further apart than `max_distance` are never matched.
    pub fn evaluate_frame(
        &mut self,
        tracks: &[TrackSnapshot],
        ground_truths: &[GroundTruth],
        max_distance: f64,
    ) {
        self.n_frames += 1;

        let confirmed: Vec<&TrackSnapshot> = tracks.iter().filter(|t| t.confirmed).collect();
        let cost = CostMatrix::from_fn(confirmed.len(), ground_truths.len(), |i, j| {
            let dx = confirmed[i].state[0] - ground_truths[j].state[0];
            let dy = confirmed[i].state[1] - ground_truths[j].state[1];
            dx * dx + dy * dy
        });
        let assoc = associate_greedy(&cost, max_distance * max_distance);

        for (ti, gi) in assoc.pairs() {
            let track = confirmed[ti];
            let gt = &ground_truths[gi];
            let dvx = track.state[2] - gt.state[2];
            let dvy = track.state[3] - gt.state[3];
            self.sum_sq_pos_err += cost[(ti, gi)];
            self.sum_sq_vel_err += dvx * dvx + dvy * dvy;
            self.n_matched += 1;
            self.true_positives += 1;

            if let Some(prev) = self.last_match.insert(gt.target_id, track.id) {
                if prev != track.id {
                    self.id_switches += 1;
                }
            }
        }

        self.false_positives += assoc.unassigned_tracks.len() as u64;
        self.false_negatives += assoc.unassigned_detections.len() as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{StateCov, StateVec};
    use approx::assert_abs_diff_eq;

    fn snap(id: u64, x: f64, y: f64, confirmed: bool) -> TrackSnapshot {
        TrackSnapshot {
            id: TrackId(id),
            state: StateVec::new(x, y, 1.0, 0.0),
            covariance: StateCov::identity(),
            confirmed,
            age: 3,
            missed: 0,
            last_timestamp: 0.0,
        }
    }

    fn gt(id: u64, x: f64, y: f64) -> GroundTruth {
        GroundTruth {
            target_id: id,
            time: 0.0,
            state: [x, y, 1.0, 0.0],
        }
    }

    #[test]
    fn perfect_tracking_has_zero_error() {
        let mut m = TrackingMetrics::default();
        m.evaluate_frame(&[snap(0, 1.0, 1.0, true)], &[gt(7, 1.0, 1.0)], 5.0);
        assert_eq!(m.true_positives, 1);
        assert_eq!(m.rmse_position(), 0.0);
        assert_eq!(m.precision(), 1.0);
        assert_eq!(m.recall(), 1.0);
    }

    #[test]
    fn counts_false_positives_and_negatives() {
        let mut m = TrackingMetrics::default();
        let tracks = [snap(0, 0.0, 0.0, true), snap(1, 100.0, 0.0, true), snap(2, 50.0, 0.0, false)];
        let truths = [gt(0, 3.0, 4.0), gt(1, -100.0, 0.0)];
        m.evaluate_frame(&tracks, &truths, 10.0);
        assert_eq!(m.true_positives, 1);
        assert_eq!(m.false_positives, 1);
        assert_eq!(m.false_negatives, 1);
        assert_abs_diff_eq!(m.rmse_position(), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn detects_id_switch() {
        let mut m = TrackingMetrics::default();
        m.evaluate_frame(&[snap(0, 0.0, 0.0, true)], &[gt(0, 0.0, 0.0)], 5.0);
        m.evaluate_frame(&[snap(0, 0.0, 0.0, true)], &[gt(0, 0.0, 0.0)], 5.0);
        assert_eq!(m.id_switches, 0);
        m.evaluate_frame(&[snap(3, 0.0, 0.0, true)], &[gt(0, 0.0, 0.0)], 5.0);
        assert_eq!(m.id_switches, 1);
        assert_eq!(m.n_frames, 3);
    }
}
