//! Track: Gaussian state estimate plus lifecycle counters.

use crate::{
    kf::KalmanFilter,
    types::{StateCov, StateVec, TrackId, STATE_DIM},
};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a live track. Dead tracks are removed outright.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackStatus {
    /// Not yet confirmed — may be clutter
    Tentative,
    /// Matched while old enough; never reverts
    Confirmed,
}

/// A single tracked object.
#[derive(Clone, Debug)]
pub struct Track {
    /// Unique identifier, never reused
    pub id: TrackId,
    /// State [px, py, vx, vy] and its covariance
    pub kf: KalmanFilter<STATE_DIM>,
    /// Set once and kept for the rest of the track's life
    pub confirmed: bool,
    /// Predict cycles since birth (1 at birth)
    pub age: u32,
    /// Consecutive updates without a matched detection
    pub missed: u32,
    /// Time the estimate refers to; Δt for the next predict is measured from here
    pub last_timestamp: f64,
}

impl Track {
    /// Create a new tentative track.
    pub fn new(id: TrackId, state: StateVec, cov: StateCov, timestamp: f64) -> Self {
        Self {
            id,
            kf: KalmanFilter::new(state, cov),
            confirmed: false,
            age: 1,
            missed: 0,
            last_timestamp: timestamp,
        }
    }

    pub fn state(&self) -> &StateVec {
        &self.kf.state
    }

    pub fn cov(&self) -> &StateCov {
        &self.kf.cov
    }

    pub fn status(&self) -> TrackStatus {
        if self.confirmed {
            TrackStatus::Confirmed
        } else {
            TrackStatus::Tentative
        }
    }

    /// Returns 2D [x, y] position
    pub fn position_2d(&self) -> (f64, f64) {
        (self.kf.state[0], self.kf.state[1])
    }

    /// Returns 2D velocity [vx, vy]
    pub fn velocity_2d(&self) -> (f64, f64) {
        (self.kf.state[2], self.kf.state[3])
    }

    pub fn snapshot(&self) -> TrackSnapshot {
        TrackSnapshot {
            id: self.id,
            state: self.kf.state,
            covariance: self.kf.cov,
            confirmed: self.confirmed,
            age: self.age,
            missed: self.missed,
            last_timestamp: self.last_timestamp,
        }
    }
}

/// Read-only copy of a track handed to consumers after each update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackSnapshot {
    pub id: TrackId,
    pub state: StateVec,
    pub covariance: StateCov,
    pub confirmed: bool,
    pub age: u32,
    pub missed: u32,
    pub last_timestamp: f64,
}
