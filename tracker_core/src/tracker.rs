//! Tracker orchestrator: the full predict / associate / update cycle.
//!
//! # Processing steps per timestamp
//! 1. `predict(t)`: propagate every track with the CV model over its own Δt
//! 2. `update(dets)`:
//!    a. Build the track × detection cost matrix (squared Mahalanobis
//!       distance, +∞ for malformed detections), rows in parallel
//!    b. Greedy nearest-neighbour association under the gate
//!    c. Compute the posterior of every matched track
//!    d. Register misses on all tracks, then hits on matched ones
//!    e. Birth tentative tracks for unmatched detections
//!    f. Prune tracks whose miss counter exceeded the limit
//!
//! Steps c–f only run once every posterior has been computed, so a
//! numerical failure leaves the track set exactly as `predict` left it.

use crate::{
    association::{associate_greedy, AssociationResult, CostMatrix},
    error::{FilterError, TrackerError},
    gating::{MeasurementModels, SensorNoiseConfig, CHI2_99},
    kf::{CvConfig, CvModel, KalmanFilter},
    track::{Track, TrackSnapshot},
    track_manager::{TrackManager, TrackManagerConfig},
    types::{Detection, TrackId, STATE_DIM},
};
use rayon::prelude::*;
use sensor_models::Measurement;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Δt used when the elapsed time is zero or negative.
pub const MIN_DT: f64 = 1e-3;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Configuration for the tracker. Every field has a default, so partial
/// JSON documents deserialize.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Association gate on the squared Mahalanobis distance.
    /// Default: CHI2_99[2] for 2D.
    pub max_association_maha_dist: f64,
    /// Motion model (process noise)
    pub motion: CvConfig,
    /// Measurement noise per sensor
    pub sensors: SensorNoiseConfig,
    /// Track management config
    pub track_manager: TrackManagerConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_association_maha_dist: CHI2_99[2],
            motion: CvConfig::default(),
            sensors: SensorNoiseConfig::default(),
            track_manager: TrackManagerConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// What happened in one `update` call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepReport {
    /// Matched (track, detection index) pairs
    pub matches: Vec<(TrackId, usize)>,
    /// Detection indices that were not matched (births and rejects)
    pub unmatched_detections: Vec<usize>,
    /// Number of tracks born this step
    pub births: usize,
    /// Number of tracks confirmed this step
    pub confirmations: usize,
    /// Number of tracks deleted this step
    pub deletions: usize,
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

/// Multi-object tracker. Exclusively owns its tracks.
pub struct Tracker {
    config: TrackerConfig,
    tracks: Vec<Track>,
    track_manager: TrackManager,
    motion: CvModel,
    models: MeasurementModels,
}

impl Tracker {
    pub fn new(config: TrackerConfig) -> Self {
        let track_manager = TrackManager::new(config.track_manager.clone());
        let motion = CvModel::new(config.motion.clone());
        let models = MeasurementModels::new(&config.sensors);
        Self {
            config,
            tracks: Vec::new(),
            track_manager,
            motion,
            models,
        }
    }

    /// Configuration the tracker was built with. Fixed for its lifetime.
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Live tracks after the last call.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Owned copies of the live tracks.
    pub fn snapshot(&self) -> Vec<TrackSnapshot> {
        self.tracks.iter().map(Track::snapshot).collect()
    }

    /// Id the next born track will receive.
    pub fn next_id(&self) -> TrackId {
        self.track_manager.peek_next_id()
    }

    /// Propagate every track to `timestamp`.
    pub fn predict(&mut self, timestamp: f64) {
        let motion = &self.motion;
        self.tracks.par_iter_mut().for_each(|track| {
            let mut dt = timestamp - track.last_timestamp;
            if dt.is_nan() || dt <= 0.0 {
                dt = MIN_DT;
            }
            motion.predict(&mut track.kf, dt);
            track.age += 1;
            track.last_timestamp = timestamp;
        });
        trace!(t = timestamp, tracks = self.tracks.len(), "predicted");
    }

    /// Absorb one batch of detections (all sharing the last predicted time).
    pub fn update(&mut self, detections: &[Detection]) -> Result<StepReport, TrackerError> {
        let measurements: Vec<Option<Measurement>> =
            detections.iter().map(Detection::measurement).collect();

        let assoc = if self.tracks.is_empty() || detections.is_empty() {
            AssociationResult::unmatched(self.tracks.len(), detections.len())
        } else {
            let cost = self.cost_matrix(&measurements)?;
            associate_greedy(&cost, self.config.max_association_maha_dist)
        };

        // Posteriors for every matched pair, before touching any track
        let mut posteriors: Vec<(usize, usize, KalmanFilter<STATE_DIM>)> = Vec::new();
        for (ti, mi) in assoc.pairs() {
            let track = &self.tracks[ti];
            // A finite cost implies a well-formed measurement
            let Some(meas) = measurements[mi].as_ref() else {
                continue;
            };
            let post = self
                .models
                .corrected(&track.kf, meas)
                .map_err(|source| TrackerError::Filter {
                    track: track.id,
                    source,
                })?;
            posteriors.push((ti, mi, post));
        }

        let mut report = StepReport::default();

        for track in &mut self.tracks {
            self.track_manager.register_miss(track);
        }
        for (ti, mi, post) in posteriors {
            let track = &mut self.tracks[ti];
            track.kf = post;
            if self.track_manager.register_hit(track) {
                report.confirmations += 1;
            }
            report.matches.push((track.id, mi));
        }

        for &mi in &assoc.unassigned_detections {
            report.unmatched_detections.push(mi);
            match &measurements[mi] {
                Some(meas) => {
                    let state = self.models.initial_state(meas);
                    let track = self
                        .track_manager
                        .birth_track(state, detections[mi].timestamp);
                    self.tracks.push(track);
                    report.births += 1;
                }
                None => {
                    debug!(
                        detection = mi,
                        sensor = %detections[mi].sensor,
                        len = detections[mi].z.len(),
                        "malformed detection ignored"
                    );
                }
            }
        }

        report.deletions = self.track_manager.prune_dead(&mut self.tracks);

        trace!(
            matched = report.matches.len(),
            births = report.births,
            deletions = report.deletions,
            live = self.tracks.len(),
            "updated"
        );
        Ok(report)
    }

    /// `predict(timestamp)` followed by `update(detections)`.
    pub fn step(
        &mut self,
        timestamp: f64,
        detections: &[Detection],
    ) -> Result<StepReport, TrackerError> {
        self.predict(timestamp);
        self.update(detections)
    }

    /// Remove one track, e.g. the one named by a [`TrackerError`].
    pub fn remove_track(&mut self, id: TrackId) -> Option<Track> {
        let idx = self.tracks.iter().position(|t| t.id == id)?;
        debug!(track = %id, "track removed by caller");
        Some(self.tracks.remove(idx))
    }

    /// Drop every track. Ids keep counting up.
    pub fn reset(&mut self) {
        self.tracks.clear();
    }

    /// Squared Mahalanobis distance of every (track, detection) pair.
    /// Rows only read their own track and the shared detection batch.
    fn cost_matrix(&self, measurements: &[Option<Measurement>]) -> Result<CostMatrix, TrackerError> {
        let models = &self.models;
        let rows: Vec<Vec<f64>> = self
            .tracks
            .par_iter()
            .map(|track| {
                measurements
                    .iter()
                    .map(|m| match m {
                        Some(meas) => models.distance(&track.kf, meas),
                        None => Ok(f64::INFINITY),
                    })
                    .collect::<Result<Vec<f64>, FilterError>>()
                    .map_err(|source| TrackerError::Filter {
                        track: track.id,
                        source,
                    })
            })
            .collect::<Result<_, _>>()?;

        Ok(CostMatrix::from_fn(rows.len(), measurements.len(), |i, j| {
            rows[i][j]
        }))
    }
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
