//! Scenario definitions.
//!
//! The highway scenario places objects ahead of the ego sensor in a few
//! lanes, all driving straight at constant speed. Deterministic given the
//! same seed.

use crate::target::ObjectState;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracker_core::metrics::GroundTruth;

/// Lateral offset range (m).
const LANE_Y: (f64, f64) = (-3.0, 3.0);
/// Longitudinal start range (m), before the per-object spacing.
const START_X: (f64, f64) = (20.0, 80.0);
/// Longitudinal spacing added per object index (m).
const SPACING_X: f64 = 10.0;
/// Speed range (m/s).
const SPEED: (f64, f64) = (10.0, 30.0);

/// Straight-driving highway traffic.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HighwayScenario {
    pub seed: u64,
    /// Simulation step (s)
    pub dt: f64,
    time: f64,
    objects: Vec<ObjectState>,
}

impl HighwayScenario {
    pub fn new(num_objects: usize, dt: f64, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let objects = (0..num_objects)
            .map(|i| {
                let y = rng.gen_range(LANE_Y.0..LANE_Y.1);
                let x = rng.gen_range(START_X.0..START_X.1) + i as f64 * SPACING_X;
                let vx = rng.gen_range(SPEED.0..SPEED.1);
                ObjectState { id: i as u64, x, y, vx, vy: 0.0 }
            })
            .collect();
        Self { seed, dt, time: 0.0, objects }
    }

    /// Advance time by `dt` and move every object.
    pub fn step(&mut self) {
        self.time += self.dt;
        for obj in &mut self.objects {
            obj.step(self.dt);
        }
    }

    pub fn objects(&self) -> &[ObjectState] {
        &self.objects
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Ground truth of every object at the current time.
    pub fn ground_truth(&self) -> Vec<GroundTruth> {
        self.objects.iter().map(|o| o.ground_truth(self.time)).collect()
    }
}
