//! `tracker_core` — Multi-object, multi-sensor tracking core.
//!
//! # Module layout
//! - [`types`]        — Fundamental types (IDs, state aliases, detections)
//! - [`error`]        — Filter / tracker error types
//! - [`kf`]           — Kalman filter (predict / update) and CV motion model
//! - [`gating`]       — Innovations, Mahalanobis distance, measurement-model table
//! - [`association`]  — Greedy nearest-neighbour assignment under a gate
//! - [`track`]        — Track struct and status
//! - [`track_manager`]— Birth / confirmation / deletion logic
//! - [`tracker`]      — Full predict / associate / update orchestrator
//! - [`metrics`]      — RMSE, ID-switch, precision/recall

pub mod association;
pub mod error;
pub mod gating;
pub mod kf;
pub mod metrics;
pub mod track;
pub mod track_manager;
pub mod tracker;
pub mod types;

pub use error::{FilterError, TrackerError};
pub use track::{Track, TrackSnapshot, TrackStatus};
pub use tracker::{StepReport, Tracker, TrackerConfig};
pub use types::{Detection, StateCov, StateVec, TrackId};
