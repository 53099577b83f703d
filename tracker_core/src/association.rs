//! Data association: greedy nearest-neighbour assignment under a hard gate.
//!
//! # Algorithm
//! 1. Enumerate every (track, detection) pair whose cost is finite and
//!    ≤ `max_cost`, in row-major order.
//! 2. Stable-sort the candidates by ascending cost. Equal costs keep their
//!    enumeration order, so the earlier row (then earlier column) wins a tie.
//! 3. Accept candidates in order, skipping any pair where the track or the
//!    detection has already been claimed.
//!
//! This is not globally optimal, but it is deterministic for a given cost
//! matrix and costs O(k log k) for `k` admissible pairs.

use crate::types::DMat;

/// Track × detection cost matrix; +∞ marks an impossible pairing.
pub type CostMatrix = DMat;

/// An admissible entry of the cost matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct AssignEdge {
    pub track_idx: usize,
    pub meas_idx: usize,
    /// Mahalanobis distance squared (used as cost)
    pub cost: f64,
}

/// Outcome of one association round.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssociationResult {
    /// `track_assignment[i] = Some(j)` ⇔ track `i` was given detection `j`
    pub track_assignment: Vec<Option<usize>>,
    /// Tracks with no detection, ascending
    pub unassigned_tracks: Vec<usize>,
    /// Detections with no track, ascending
    pub unassigned_detections: Vec<usize>,
}

impl AssociationResult {
    /// Everything unmatched.
    pub fn unmatched(n_tracks: usize, n_dets: usize) -> Self {
        Self {
            track_assignment: vec![None; n_tracks],
            unassigned_tracks: (0..n_tracks).collect(),
            unassigned_detections: (0..n_dets).collect(),
        }
    }

    /// Matched `(track_idx, meas_idx)` pairs in track order.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.track_assignment
            .iter()
            .enumerate()
            .filter_map(|(ti, mi)| mi.map(|mi| (ti, mi)))
    }
}

/// Candidate edges passing the gate, in row-major order.
fn admissible_edges(cost: &CostMatrix, max_cost: f64) -> Vec<AssignEdge> {
    let mut edges = Vec::new();
    for ti in 0..cost.nrows() {
        for mi in 0..cost.ncols() {
            let c = cost[(ti, mi)];
            if c.is_finite() && c <= max_cost {
                edges.push(AssignEdge {
                    track_idx: ti,
                    meas_idx: mi,
                    cost: c,
                });
            }
        }
    }
    edges
}

/// Greedy one-to-one assignment of tracks (rows) to detections (columns).
pub fn associate_greedy(cost: &CostMatrix, max_cost: f64) -> AssociationResult {
    let n_tracks = cost.nrows();
    let n_dets = cost.ncols();

    if n_tracks == 0 || n_dets == 0 {
        return AssociationResult::unmatched(n_tracks, n_dets);
    }

    let mut edges = admissible_edges(cost, max_cost);
    // `sort_by` is stable: ties keep row-major order
    edges.sort_by(|a, b| a.cost.total_cmp(&b.cost));

    let mut track_assignment = vec![None; n_tracks];
    let mut det_used = vec![false; n_dets];

    for e in &edges {
        if track_assignment[e.track_idx].is_none() && !det_used[e.meas_idx] {
            track_assignment[e.track_idx] = Some(e.meas_idx);
            det_used[e.meas_idx] = true;
        }
    }

    let unassigned_tracks = (0..n_tracks)
        .filter(|&ti| track_assignment[ti].is_none())
        .collect();
    let unassigned_detections = (0..n_dets).filter(|&mi| !det_used[mi]).collect();

    AssociationResult {
        track_assignment,
        unassigned_tracks,
        unassigned_detections,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
