//! Ground-truth object state and propagation.
//!
//! Objects move with constant velocity in the 2-D road plane.

use serde::{Deserialize, Serialize};
use tracker_core::metrics::GroundTruth;

/// A simulated object with ground-truth kinematics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectState {
    /// Unique object ID (used for metrics)
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
}

impl ObjectState {
    /// Propagate the true state by `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        self.x += self.vx * dt;
        self.y += self.vy * dt;
    }

    pub fn range(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Snapshot for metric evaluation at `time`.
    pub fn ground_truth(&self, time: f64) -> GroundTruth {
        GroundTruth {
            target_id: self.id,
            time,
            state: [self.x, self.y, self.vx, self.vy],
        }
    }
}
