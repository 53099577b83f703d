//! Mahalanobis gating: the statistical distance between a track's predicted
//! measurement and a detection, used as the association cost.
//!
//! # Gating criterion
//! d²(z, track) = yᵀ S⁻¹ y  where y = z ⊖ h(x̂_pred),  S = H·P_pred·Hᵀ + R
//!
//! `⊖` is the sensor's residual (plain subtraction, or with the bearing
//! wrapped into (−π, π] for the range/bearing/rate sensor).
//!
//! # Gate threshold table (99%)
//! dof=2: χ²(0.99, 2) ≈ 9.21
//! dof=3: χ²(0.99, 3) ≈ 11.34

use crate::error::FilterError;
use crate::kf::{factor_innovation_cov, KalmanFilter};
use crate::types::{StateCov, StateVec, STATE_DIM};
use nalgebra::{SMatrix, SVector};
use sensor_models::{Measurement, ObservationModel, PositionSensor, RangeBearingRateSensor};
use serde::{Deserialize, Serialize};

/// Pre-computed χ² gate thresholds indexed by dimension [1..=6].
/// Value at index `d` is χ²(0.99, d).
pub const CHI2_99: [f64; 7] = [0.0, 6.63, 9.21, 11.34, 13.28, 15.09, 16.81];

/// Innovation terms for one (track, detection) pair, linearised at the
/// track's current estimate.
#[derive(Clone, Debug)]
pub struct Innovation<const M: usize> {
    /// y = z ⊖ h(x)
    pub residual: SVector<f64, M>,
    /// H (Jacobian for nonlinear sensors)
    pub h: SMatrix<f64, M, STATE_DIM>,
    /// R
    pub r: SMatrix<f64, M, M>,
    /// S = H·P·Hᵀ + R
    pub s: SMatrix<f64, M, M>,
}

/// Compute the innovation of measurement `z` against filter `kf`.
pub fn innovation<const M: usize, O: ObservationModel<M>>(
    model: &O,
    kf: &KalmanFilter<STATE_DIM>,
    z: &SVector<f64, M>,
) -> Innovation<M> {
    let z_pred = model.predict(&kf.state);
    let residual = model.residual(z, &z_pred);
    let h = model.jacobian(&kf.state);
    let r = model.noise_cov();
    let s = h * kf.cov * h.transpose() + r;
    Innovation { residual, h, r, s }
}

/// Squared Mahalanobis distance yᵀ S⁻¹ y.
pub fn mahalanobis_sq<const M: usize>(
    y: &SVector<f64, M>,
    s: &SMatrix<f64, M, M>,
) -> Result<f64, FilterError> {
    let chol = factor_innovation_cov(s)?;
    Ok(y.dot(&chol.solve(y)))
}

// ---------------------------------------------------------------------------
// Measurement-model table
// ---------------------------------------------------------------------------

/// Measurement noise std devs for every supported sensor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorNoiseConfig {
    /// Position sensor x/y noise (m)
    pub cam_pos_noise_std: f64,
    /// Range noise (m)
    pub radar_r_noise_std: f64,
    /// Bearing noise (rad)
    pub radar_angle_noise_std: f64,
    /// Range-rate noise (m/s)
    pub radar_vr_noise_std: f64,
}

impl Default for SensorNoiseConfig {
    fn default() -> Self {
        Self {
            cam_pos_noise_std: 1.0,
            radar_r_noise_std: 1.0,
            radar_angle_noise_std: 0.05,
            radar_vr_noise_std: 0.5,
        }
    }
}

/// One observation model per sensor kind, selected by the measurement's
/// variant.
#[derive(Clone, Debug)]
pub struct MeasurementModels {
    pub position: PositionSensor,
    pub range_bearing_rate: RangeBearingRateSensor,
}

impl MeasurementModels {
    pub fn new(config: &SensorNoiseConfig) -> Self {
        Self {
            position: PositionSensor::new(config.cam_pos_noise_std),
            range_bearing_rate: RangeBearingRateSensor::new(
                config.radar_r_noise_std,
                config.radar_angle_noise_std,
                config.radar_vr_noise_std,
            ),
        }
    }

    /// Association cost of `meas` against `kf`: the squared Mahalanobis
    /// distance of the innovation.
    pub fn distance(
        &self,
        kf: &KalmanFilter<STATE_DIM>,
        meas: &Measurement,
    ) -> Result<f64, FilterError> {
        match meas {
            Measurement::Position(z) => {
                let inn = innovation(&self.position, kf, z);
                mahalanobis_sq(&inn.residual, &inn.s)
            }
            Measurement::RangeBearingRate(z) => {
                let inn = innovation(&self.range_bearing_rate, kf, z);
                mahalanobis_sq(&inn.residual, &inn.s)
            }
        }
    }

    /// Posterior of `kf` after absorbing `meas`. The innovation and the
    /// linearisation are recomputed from `kf`, which is left untouched.
    pub fn corrected(
        &self,
        kf: &KalmanFilter<STATE_DIM>,
        meas: &Measurement,
    ) -> Result<KalmanFilter<STATE_DIM>, FilterError> {
        let (state, cov) = match meas {
            Measurement::Position(z) => {
                let inn = innovation(&self.position, kf, z);
                let res = kf.correction(&inn.residual, &inn.h, &inn.r)?;
                (res.state, res.cov)
            }
            Measurement::RangeBearingRate(z) => {
                let inn = innovation(&self.range_bearing_rate, kf, z);
                let res = kf.correction(&inn.residual, &inn.h, &inn.r)?;
                (res.state, res.cov)
            }
        };
        Ok(KalmanFilter::new(state, cov))
    }

    /// State implied by a single measurement, used for track birth.
    pub fn initial_state(&self, meas: &Measurement) -> StateVec {
        match meas {
            Measurement::Position(z) => self.position.initial_state(z),
            Measurement::RangeBearingRate(z) => self.range_bearing_rate.initial_state(z),
        }
    }
}

impl Default for MeasurementModels {
    fn default() -> Self {
        Self::new(&SensorNoiseConfig::default())
    }
}

/// Diagonal initial covariance `scale · I` for newborn tracks.
pub fn inflated_cov(scale: f64) -> StateCov {
    StateCov::identity() * scale
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::{Vector2, Vector3};
    use std::f64::consts::PI;

    fn filter_at(state: StateVec, var: f64) -> KalmanFilter<STATE_DIM> {
        KalmanFilter::new(state, StateCov::identity() * var)
    }

    #[test]
    fn point_inside_gate() {
        let models = MeasurementModels::default();
        let kf = filter_at(StateVec::new(10.0, 10.0, 0.0, 0.0), 100.0);
        // Measurement right at prediction → d² ≈ 0
        let d2 = models
            .distance(&kf, &Measurement::Position(Vector2::new(10.0, 10.0)))
            .unwrap();
        assert!(d2 < 1e-12);
    }

    #[test]
    fn point_outside_gate() {
        let models = MeasurementModels::new(&SensorNoiseConfig {
            cam_pos_noise_std: 0.1,
            ..Default::default()
        });
        // Small covariance → tight gate
        let kf = filter_at(StateVec::zeros(), 0.01);
        let d2 = models
            .distance(&kf, &Measurement::Position(Vector2::new(1000.0, 1000.0)))
            .unwrap();
        assert!(d2 > CHI2_99[2], "Distant point must fail gate");
    }

    #[test]
    fn position_distance_closed_form() {
        // S = (P + R) I = 2 I  →  d² = (3² + 4²) / 2
        let models = MeasurementModels::default();
        let kf = filter_at(StateVec::zeros(), 1.0);
        let d2 = models
            .distance(&kf, &Measurement::Position(Vector2::new(3.0, 4.0)))
            .unwrap();
        assert_abs_diff_eq!(d2, 12.5, epsilon = 1e-12);
    }

    #[test]
    fn bearing_wrap_keeps_distance_small() {
        let models = MeasurementModels::default();
        // Track just above the −x axis, bearing ≈ +π
        let kf = filter_at(StateVec::new(-50.0, 0.5, 0.0, 0.0), 1.0);
        let z_pred = sensor_models::range_bearing_rate_measurement(&kf.state);
        // Observation just below the −x axis, bearing ≈ −π
        let z = Vector3::new(z_pred[0], -PI + (PI - z_pred[1]), 0.0);
        let d2 = models
            .distance(&kf, &Measurement::RangeBearingRate(z))
            .unwrap();
        assert!(d2 < 1.0, "wrapped bearing innovation should be small, got {d2}");
    }

    #[test]
    fn correction_pulls_state_toward_measurement() {
        let models = MeasurementModels::default();
        let kf = filter_at(StateVec::new(30.0, 0.0, 0.0, 0.0), 10.0);
        let post = models
            .corrected(&kf, &Measurement::RangeBearingRate(Vector3::new(32.0, 0.0, 1.0)))
            .unwrap();
        assert!(post.state[0] > 30.0 && post.state[0] < 32.0);
        assert!(post.state[2] > 0.0, "range-rate should feed radial velocity");
        assert!(post.cov.trace() < kf.cov.trace());
        assert_eq!(kf.state[0], 30.0);
    }

    #[test]
    fn degenerate_linearisation_falls_back_to_noise_only() {
        let models = MeasurementModels::default();
        // At the sensor origin the Jacobian is zero, so S = R
        let kf = filter_at(StateVec::zeros(), 1e6);
        let z = Vector3::new(1.0, 0.0, 0.0);
        let d2 = models
            .distance(&kf, &Measurement::RangeBearingRate(z))
            .unwrap();
        // y = [1, 0, 0], R_rr = 1
        assert_abs_diff_eq!(d2, 1.0, epsilon = 1e-9);
        let post = models.corrected(&kf, &Measurement::RangeBearingRate(z)).unwrap();
        assert_eq!(post.state, kf.state);
    }

    #[test]
    fn singular_innovation_covariance_is_an_error() {
        let models = MeasurementModels::new(&SensorNoiseConfig {
            cam_pos_noise_std: 0.0,
            ..Default::default()
        });
        let kf = KalmanFilter::new(StateVec::zeros(), StateCov::zeros());
        let err = models
            .distance(&kf, &Measurement::Position(Vector2::new(1.0, 1.0)))
            .unwrap_err();
        assert_eq!(err, FilterError::SingularInnovation { dim: 2 });
    }
}
