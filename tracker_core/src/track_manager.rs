//! Track lifecycle management: birth, confirmation, deletion.
//!
//! # Track Management Policy
//! - **Birth**: each unmatched, well-formed detection spawns a tentative
//!   track with `age = 1`, `missed = 0` and a `init_cov_scale · I` covariance.
//! - **Confirmation**: a tentative track is confirmed on the first match
//!   where `age ≥ min_hits_to_confirm`. `age` counts every predict cycle,
//!   matched or not.
//! - **Deletion**: a track is removed in the update where `missed` first
//!   exceeds `max_missed`.

use crate::{
    gating::inflated_cov,
    track::Track,
    types::{StateVec, TrackId},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for track management policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackManagerConfig {
    /// Consecutive misses tolerated; one more deletes the track
    pub max_missed: u32,
    /// Minimum age at which a matched track is confirmed
    pub min_hits_to_confirm: u32,
    /// Diagonal of the initial covariance of a newborn track
    pub init_cov_scale: f64,
}

impl Default for TrackManagerConfig {
    fn default() -> Self {
        Self {
            max_missed: 5,
            min_hits_to_confirm: 3,
            init_cov_scale: 10.0,
        }
    }
}

/// Owns the id counter and applies lifecycle rules to tracks.
#[derive(Clone, Debug)]
pub struct TrackManager {
    pub config: TrackManagerConfig,
    next_id: u64,
}

impl TrackManager {
    pub fn new(config: TrackManagerConfig) -> Self {
        Self { config, next_id: 0 }
    }

    /// Id the next born track will receive.
    pub fn peek_next_id(&self) -> TrackId {
        TrackId(self.next_id)
    }

    fn next_track_id(&mut self) -> TrackId {
        let id = TrackId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Create a new tentative track at `state`.
    pub fn birth_track(&mut self, state: StateVec, timestamp: f64) -> Track {
        let id = self.next_track_id();
        debug!(track = %id, x = state[0], y = state[1], t = timestamp, "track born");
        Track::new(id, state, inflated_cov(self.config.init_cov_scale), timestamp)
    }

    /// Call after a track was matched. Returns true if it was confirmed now.
    pub fn register_hit(&self, track: &mut Track) -> bool {
        track.missed = 0;
        if !track.confirmed && track.age >= self.config.min_hits_to_confirm {
            track.confirmed = true;
            debug!(track = %track.id, age = track.age, "track confirmed");
            return true;
        }
        false
    }

    /// Call for every track at the start of an update (miss by default).
    pub fn register_miss(&self, track: &mut Track) {
        track.missed = track.missed.saturating_add(1);
    }

    pub fn is_dead(&self, track: &Track) -> bool {
        track.missed > self.config.max_missed
    }

    /// Remove all dead tracks. Returns count of removed tracks.
    pub fn prune_dead(&self, tracks: &mut Vec<Track>) -> usize {
        let before = tracks.len();
        tracks.retain(|t| {
            let dead = self.is_dead(t);
            if dead {
                debug!(track = %t.id, missed = t.missed, "track deleted");
            }
            !dead
        });
        before - tracks.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackStatus;

    fn track(mgr: &mut TrackManager) -> Track {
        mgr.birth_track(StateVec::zeros(), 0.0)
    }

    #[test]
    fn ids_are_monotonic_per_manager() {
        let mut a = TrackManager::new(TrackManagerConfig::default());
        let mut b = TrackManager::new(TrackManagerConfig::default());
        assert_eq!(track(&mut a).id, TrackId(0));
        assert_eq!(track(&mut a).id, TrackId(1));
        // Independent counter per instance
        assert_eq!(track(&mut b).id, TrackId(0));
        assert_eq!(a.peek_next_id(), TrackId(2));
    }

    #[test]
    fn birth_is_tentative_with_inflated_cov() {
        let mut mgr = TrackManager::new(TrackManagerConfig::default());
        let t = mgr.birth_track(StateVec::new(1.0, 2.0, 0.0, 0.0), 0.5);
        assert_eq!(t.status(), TrackStatus::Tentative);
        assert_eq!((t.age, t.missed), (1, 0));
        assert_eq!(t.last_timestamp, 0.5);
        assert_eq!(t.cov()[(3, 3)], 10.0);
        assert_eq!(t.cov()[(0, 1)], 0.0);
    }

    #[test]
    fn confirms_only_when_old_enough() {
        let mut mgr = TrackManager::new(TrackManagerConfig::default());
        let mut t = track(&mut mgr);
        t.age = 2;
        assert!(!mgr.register_hit(&mut t));
        assert_eq!(t.status(), TrackStatus::Tentative);
        t.age = 3;
        assert!(mgr.register_hit(&mut t));
        assert_eq!(t.status(), TrackStatus::Confirmed);
        // Confirmation is reported once
        t.age = 4;
        assert!(!mgr.register_hit(&mut t));
        assert!(t.confirmed);
    }

    #[test]
    fn misses_never_unconfirm() {
        let mut mgr = TrackManager::new(TrackManagerConfig::default());
        let mut t = track(&mut mgr);
        t.confirmed = true;
        for _ in 0..3 {
            mgr.register_miss(&mut t);
        }
        assert_eq!(t.missed, 3);
        assert!(t.confirmed);
    }

    #[test]
    fn hit_resets_missed() {
        let mut mgr = TrackManager::new(TrackManagerConfig::default());
        let mut t = track(&mut mgr);
        mgr.register_miss(&mut t);
        mgr.register_miss(&mut t);
        mgr.register_hit(&mut t);
        assert_eq!(t.missed, 0);
    }

    #[test]
    fn deleted_when_missed_exceeds_limit() {
        let cfg = TrackManagerConfig {
            max_missed: 3,
            ..Default::default()
        };
        let mut mgr = TrackManager::new(cfg);
        let mut tracks = vec![track(&mut mgr)];
        for _ in 0..3 {
            mgr.register_miss(&mut tracks[0]);
            assert_eq!(mgr.prune_dead(&mut tracks), 0, "alive while missed <= limit");
        }
        mgr.register_miss(&mut tracks[0]);
        assert_eq!(mgr.prune_dead(&mut tracks), 1);
        assert!(tracks.is_empty());
    }
}
