//! Observation models: h(x), H, R and the measurement variants.
//!
//! # Measurement types supported
//! - **Position**: z = [x, y], H is the constant 2×4 selector matrix
//! - **Range/bearing/rate**: z = [range, bearing, range-rate], H is the
//!   Jacobian of h(x) evaluated at x̂ (see [`crate::radar`])
//!
//! ## State vector
//! x = [px, py, vx, vy]ᵀ

use nalgebra::{Matrix2x4, SMatrix, SVector, Vector2, Vector3, Vector4};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};
use std::fmt;

/// Dimension of the constant-velocity state [px, py, vx, vy].
pub const STATE_DIM: usize = 4;

/// 4-DOF state vector: [px, py, vx, vy]
pub type StateVec = Vector4<f64>;

// ---------------------------------------------------------------------------
// Sensor kinds and measurement variants
// ---------------------------------------------------------------------------

/// The closed set of sensors the tracker understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Camera-like sensor reporting Cartesian position [x, y]
    Position,
    /// Radar-like sensor reporting [range, bearing, range-rate]
    RangeBearingRate,
}

impl SensorKind {
    /// Length of the measurement vector this sensor produces.
    pub fn dim(self) -> usize {
        match self {
            SensorKind::Position => 2,
            SensorKind::RangeBearingRate => 3,
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorKind::Position => write!(f, "camera"),
            SensorKind::RangeBearingRate => write!(f, "radar"),
        }
    }
}

/// A measurement whose length has been checked against its sensor kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Measurement {
    Position(Vector2<f64>),
    RangeBearingRate(Vector3<f64>),
}

impl Measurement {
    /// Interpret `values` as a measurement of `kind`.
    /// Returns `None` when the length does not match the sensor or any
    /// component is NaN or infinite.
    pub fn from_slice(kind: SensorKind, values: &[f64]) -> Option<Self> {
        if values.iter().any(|v| !v.is_finite()) {
            return None;
        }
        match (kind, values) {
            (SensorKind::Position, &[x, y]) => Some(Measurement::Position(Vector2::new(x, y))),
            (SensorKind::RangeBearingRate, &[r, phi, rate]) => {
                Some(Measurement::RangeBearingRate(Vector3::new(r, phi, rate)))
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// One entry of the measurement-model table: everything the tracker needs to
/// gate, update and initialise tracks from a sensor producing `M`-vectors.
pub trait ObservationModel<const M: usize> {
    /// Expected measurement h(x)
    fn predict(&self, state: &StateVec) -> SVector<f64, M>;

    /// Observation matrix H (linearised at `state` for nonlinear sensors)
    fn jacobian(&self, state: &StateVec) -> SMatrix<f64, M, STATE_DIM>;

    /// Measurement noise covariance R
    fn noise_cov(&self) -> SMatrix<f64, M, M>;

    /// Innovation z − h(x). Sensors with angular components override this
    /// to wrap them.
    fn residual(&self, z: &SVector<f64, M>, z_pred: &SVector<f64, M>) -> SVector<f64, M> {
        z - z_pred
    }

    /// Best state guess from a single measurement (used for track birth).
    fn initial_state(&self, z: &SVector<f64, M>) -> StateVec;
}

// ---------------------------------------------------------------------------
// Position sensor
// ---------------------------------------------------------------------------

/// Expected position measurement: the [x, y] part of the state.
pub fn position_measurement(state: &StateVec) -> Vector2<f64> {
    Vector2::new(state[0], state[1])
}

/// Constant 2×4 selector matrix for the position sensor.
pub fn position_h() -> Matrix2x4<f64> {
    Matrix2x4::new(
        1., 0., 0., 0., //
        0., 1., 0., 0.,
    )
}

/// Cartesian position sensor with isotropic noise.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PositionSensor {
    /// Std deviation in x and y (meters)
    pub sigma: f64,
}

impl PositionSensor {
    pub fn new(sigma: f64) -> Self {
        Self { sigma }
    }
}

impl ObservationModel<2> for PositionSensor {
    fn predict(&self, state: &StateVec) -> Vector2<f64> {
        position_measurement(state)
    }

    fn jacobian(&self, _state: &StateVec) -> Matrix2x4<f64> {
        position_h()
    }

    fn noise_cov(&self) -> SMatrix<f64, 2, 2> {
        let var = self.sigma * self.sigma;
        SMatrix::<f64, 2, 2>::from_diagonal(&Vector2::new(var, var))
    }

    fn initial_state(&self, z: &Vector2<f64>) -> StateVec {
        StateVec::new(z[0], z[1], 0.0, 0.0)
    }
}

// ---------------------------------------------------------------------------
// Angle wrapping
// ---------------------------------------------------------------------------

/// Wrap an angle into (−π, π].
pub fn normalize_angle(mut angle: f64) -> f64 {
    if !angle.is_finite() {
        return angle;
    }
    while angle > PI {
        angle -= TAU;
    }
    while angle <= -PI {
        angle += TAU;
    }
    angle
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn position_h_selects_xy() {
        let state = StateVec::new(100.0, 200.0, 10.0, -3.0);
        let z = position_h() * state;
        assert_eq!(z, position_measurement(&state));
        assert_eq!(z, Vector2::new(100.0, 200.0));
    }

    #[test]
    fn position_noise_is_diagonal_variance() {
        let r = PositionSensor::new(2.0).noise_cov();
        assert_abs_diff_eq!(r[(0, 0)], 4.0);
        assert_abs_diff_eq!(r[(1, 1)], 4.0);
        assert_abs_diff_eq!(r[(0, 1)], 0.0);
    }

    #[test]
    fn position_birth_has_zero_velocity() {
        let s = PositionSensor::new(1.0).initial_state(&Vector2::new(3.0, -4.0));
        assert_eq!(s, StateVec::new(3.0, -4.0, 0.0, 0.0));
    }

    #[test]
    fn measurement_length_must_match_kind() {
        assert!(Measurement::from_slice(SensorKind::Position, &[1.0, 2.0]).is_some());
        assert!(Measurement::from_slice(SensorKind::Position, &[1.0, 2.0, 3.0]).is_none());
        assert!(Measurement::from_slice(SensorKind::RangeBearingRate, &[1.0, 0.1, 2.0]).is_some());
        assert!(Measurement::from_slice(SensorKind::RangeBearingRate, &[1.0, 0.1]).is_none());
        assert!(Measurement::from_slice(SensorKind::Position, &[]).is_none());
    }

    #[test]
    fn non_finite_measurement_is_rejected() {
        let inf = f64::INFINITY;
        assert!(Measurement::from_slice(SensorKind::RangeBearingRate, &[inf, 0.3, 1.0]).is_none());
        assert!(Measurement::from_slice(SensorKind::RangeBearingRate, &[10.0, f64::NAN, 1.0]).is_none());
        assert!(Measurement::from_slice(SensorKind::Position, &[1.0, -inf]).is_none());
    }

    #[test]
    fn normalize_angle_wraps_into_half_open_interval() {
        assert_abs_diff_eq!(normalize_angle(0.5), 0.5);
        assert_abs_diff_eq!(normalize_angle(PI), PI);
        assert_abs_diff_eq!(normalize_angle(-PI), PI);
        assert_abs_diff_eq!(normalize_angle(3.0 * PI), PI, epsilon = 1e-12);
        assert_abs_diff_eq!(normalize_angle(TAU + 0.25), 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(normalize_angle(-TAU - 0.25), -0.25, epsilon = 1e-12);
    }

    #[test]
    fn innovation_across_pi_boundary_is_small() {
        // Prediction just below +π, observation just above −π
        let d = normalize_angle((-PI + 0.01) - (PI - 0.01));
        assert_abs_diff_eq!(d, 0.02, epsilon = 1e-12);
    }
}
