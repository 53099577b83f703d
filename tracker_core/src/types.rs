//! Fundamental types used across the workspace.

use nalgebra::{DMatrix, DVector, Matrix4};
use sensor_models::{Measurement, SensorKind};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use sensor_models::{StateVec, STATE_DIM};

/// 4×4 state covariance matrix
pub type StateCov = Matrix4<f64>;

/// Generic dynamic-size vector (raw detection values)
pub type DVec = DVector<f64>;

/// Generic dynamic-size matrix (cost matrix)
pub type DMat = DMatrix<f64>;

// ---------------------------------------------------------------------------
// Identifier types
// ---------------------------------------------------------------------------

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TrackId(pub u64);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

fn default_confidence() -> f64 {
    1.0
}

/// One sensor observation for one step. Never mutated by the tracker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Which sensor produced this detection
    pub sensor: SensorKind,
    /// Raw measurement vector; its length should equal `sensor.dim()`
    pub z: DVec,
    /// Measurement timestamp (seconds)
    pub timestamp: f64,
    /// Detector confidence in [0, 1]. Carried through, not used for association.
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

impl Detection {
    pub fn new(sensor: SensorKind, z: &[f64], timestamp: f64) -> Self {
        Self {
            sensor,
            z: DVec::from_column_slice(z),
            timestamp,
            confidence: default_confidence(),
        }
    }

    /// Cartesian [x, y] detection.
    pub fn position(x: f64, y: f64, timestamp: f64) -> Self {
        Self::new(SensorKind::Position, &[x, y], timestamp)
    }

    /// Polar [range, bearing, range-rate] detection.
    pub fn range_bearing_rate(range: f64, bearing: f64, rate: f64, timestamp: f64) -> Self {
        Self::new(SensorKind::RangeBearingRate, &[range, bearing, rate], timestamp)
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// The measurement in its fixed-size form, or `None` if `z` has the
    /// wrong length for `sensor`.
    pub fn measurement(&self) -> Option<Measurement> {
        Measurement::from_slice(self.sensor, self.z.as_slice())
    }
}
