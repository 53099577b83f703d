//! Error types for the estimation core.
//!
//! Missed detections, births and deaths are ordinary state transitions and
//! never surface here. Only numerical degeneracy does.

use crate::types::TrackId;
use thiserror::Error;

/// Failure of a single filter operation.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum FilterError {
    /// S = H·P·Hᵀ + R could not be factorised (not positive definite).
    #[error("innovation covariance ({dim}x{dim}) is singular or not positive definite")]
    SingularInnovation { dim: usize },
}

/// Failure of a tracker step. The track set is left as it was before the
/// failing `update` call.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum TrackerError {
    #[error("track {track}: {source}")]
    Filter {
        track: TrackId,
        #[source]
        source: FilterError,
    },
}

impl TrackerError {
    /// The track whose filter failed.
    pub fn track(&self) -> TrackId {
        match self {
            TrackerError::Filter { track, .. } => *track,
        }
    }
}
