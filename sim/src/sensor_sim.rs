//! Sensor measurement simulator.
//!
//! Generates one detection batch per call with:
//! - a camera (position) and a radar (range, bearing, range rate), both at the origin
//! - Gaussian measurement noise
//! - Miss probability (1 - P_D), drawn independently per sensor
//! - Uniform clutter reported as low-confidence camera detections

use crate::target::ObjectState;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use tracker_core::types::Detection;

/// Clutter area (m).
const CLUTTER_X: (f64, f64) = (0.0, 120.0);
const CLUTTER_Y: (f64, f64) = (-10.0, 10.0);
const CLUTTER_CONFIDENCE: f64 = 0.2;
/// Guards the range-rate division near the origin.
const RANGE_EPS: f64 = 1e-6;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorSimConfig {
    pub cam_std: f64,
    pub radar_r_std: f64,
    pub radar_angle_std: f64,
    pub radar_vr_std: f64,
    /// Per-sensor, per-object detection probability
    pub detection_prob: f64,
    /// Clutter detections per object per batch
    pub clutter_rate: f64,
}

impl Default for SensorSimConfig {
    fn default() -> Self {
        Self {
            cam_std: 1.0,
            radar_r_std: 1.0,
            radar_angle_std: 0.02,
            radar_vr_std: 0.5,
            detection_prob: 0.9,
            clutter_rate: 0.1,
        }
    }
}

pub struct SensorSimulator {
    pub config: SensorSimConfig,
    rng: ChaCha8Rng,
}

impl SensorSimulator {
    pub fn new(config: SensorSimConfig, seed: u64) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn noise(&mut self, std: f64) -> f64 {
        let n: f64 = self.rng.sample(StandardNormal);
        n * std
    }

    fn detected(&mut self) -> bool {
        self.rng.gen::<f64>() < self.config.detection_prob
    }

    /// All detections for `objects` observed at `timestamp`.
    pub fn generate(&mut self, objects: &[ObjectState], timestamp: f64) -> Vec<Detection> {
        let mut detections = Vec::new();
        let cfg = self.config.clone();

        for obj in objects {
            if self.detected() {
                let x = obj.x + self.noise(cfg.cam_std);
                let y = obj.y + self.noise(cfg.cam_std);
                detections.push(Detection::position(x, y, timestamp));
            }

            if self.detected() {
                let r = obj.range();
                let phi = obj.y.atan2(obj.x);
                let vr = (obj.x * obj.vx + obj.y * obj.vy) / (r + RANGE_EPS);
                detections.push(Detection::range_bearing_rate(
                    r + self.noise(cfg.radar_r_std),
                    phi + self.noise(cfg.radar_angle_std),
                    vr + self.noise(cfg.radar_vr_std),
                    timestamp,
                ));
            }
        }

        let n_clutter = (objects.len() as f64 * cfg.clutter_rate).floor() as usize;
        for _ in 0..n_clutter {
            let x = self.rng.gen_range(CLUTTER_X.0..CLUTTER_X.1);
            let y = self.rng.gen_range(CLUTTER_Y.0..CLUTTER_Y.1);
            detections
                .push(Detection::position(x, y, timestamp).with_confidence(CLUTTER_CONFIDENCE));
        }

        detections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use sensor_models::{Measurement, SensorKind};

    fn objects() -> Vec<ObjectState> {
        vec![
            ObjectState { id: 0, x: 30.0, y: 0.0, vx: 20.0, vy: 0.0 },
            ObjectState { id: 1, x: 40.0, y: 3.0, vx: 15.0, vy: 0.0 },
        ]
    }

    fn noiseless(detection_prob: f64, clutter_rate: f64) -> SensorSimConfig {
        SensorSimConfig {
            cam_std: 0.0,
            radar_r_std: 0.0,
            radar_angle_std: 0.0,
            radar_vr_std: 0.0,
            detection_prob,
            clutter_rate,
        }
    }

    #[test]
    fn noiseless_sensors_report_truth() {
        let mut sim = SensorSimulator::new(noiseless(1.0, 0.0), 0);
        let dets = sim.generate(&objects(), 1.5);
        assert_eq!(dets.len(), 4);
        assert!(dets.iter().all(|d| d.timestamp == 1.5 && d.confidence == 1.0));

        assert_eq!(dets[0].measurement(), Some(Measurement::Position([30.0, 0.0].into())));
        match dets[3].measurement() {
            Some(Measurement::RangeBearingRate(z)) => {
                let r = 40.0_f64.hypot(3.0);
                assert_abs_diff_eq!(z[0], r, epsilon = 1e-12);
                assert_abs_diff_eq!(z[1], 3.0_f64.atan2(40.0), epsilon = 1e-12);
                assert_abs_diff_eq!(z[2], 40.0 * 15.0 / r, epsilon = 1e-6);
            }
            other => panic!("expected radar detection, got {other:?}"),
        }
    }

    #[test]
    fn clutter_only_when_nothing_detected() {
        let mut sim = SensorSimulator::new(noiseless(0.0, 1.5), 3);
        let dets = sim.generate(&objects(), 0.0);
        assert_eq!(dets.len(), 3);
        for d in &dets {
            assert_eq!(d.sensor, SensorKind::Position);
            assert_eq!(d.confidence, CLUTTER_CONFIDENCE);
            assert!(d.z[0] >= 0.0 && d.z[0] < 120.0);
            assert!(d.z[1] >= -10.0 && d.z[1] < 10.0);
        }
    }

    #[test]
    fn deterministic_given_seed() {
        let mut a = SensorSimulator::new(SensorSimConfig::default(), 11);
        let mut b = SensorSimulator::new(SensorSimConfig::default(), 11);
        for step in 0..5 {
            let t = step as f64 * 0.1;
            assert_eq!(a.generate(&objects(), t), b.generate(&objects(), t));
        }
    }
}
