//! Range / bearing / range-rate sensor (radar-like, nonlinear).
//!
//! h(x) = [ √(px²+py²),  atan2(py, px),  (px·vx + py·vy) / √(px²+py²) ]
//!
//! The sensor sits at the world origin and bearing is measured from +x.

use crate::observation::{normalize_angle, ObservationModel, StateVec, STATE_DIM};
use nalgebra::{Matrix3, Matrix3x4, SMatrix, Vector3};
use serde::{Deserialize, Serialize};

/// Below this range the range-rate is reported as zero.
const MIN_RANGE: f64 = 1e-6;

/// Below this squared range the Jacobian is not trusted and returned as zero.
const MIN_RANGE_SQ: f64 = 1e-6;

/// Compute [range, bearing, range-rate] from a state vector.
pub fn range_bearing_rate_measurement(state: &StateVec) -> Vector3<f64> {
    let (px, py, vx, vy) = (state[0], state[1], state[2], state[3]);
    let range = (px * px + py * py).sqrt();
    let bearing = py.atan2(px);
    let rate = if range > MIN_RANGE {
        (px * vx + py * vy) / range
    } else {
        0.0
    };
    Vector3::new(range, bearing, rate)
}

/// Jacobian of [`range_bearing_rate_measurement`] w.r.t. [px, py, vx, vy].
///
/// Returns the zero matrix when the target is (numerically) at the sensor,
/// which makes the pair's innovation covariance collapse to R.
pub fn range_bearing_rate_jacobian(state: &StateVec) -> Matrix3x4<f64> {
    let (px, py, vx, vy) = (state[0], state[1], state[2], state[3]);
    let r2 = px * px + py * py;
    if r2 < MIN_RANGE_SQ {
        return Matrix3x4::zeros();
    }
    let r = r2.sqrt();
    let r3 = r2 * r;

    // ∂ṙ/∂px = py·(vx·py − vy·px)/r³,  ∂ṙ/∂py = px·(vy·px − vx·py)/r³
    let cross = vx * py - vy * px;
    Matrix3x4::new(
        px / r, py / r, 0., 0., //
        -py / r2, px / r2, 0., 0., //
        py * cross / r3, -px * cross / r3, px / r, py / r,
    )
}

/// Radar-like sensor with independent range, bearing and range-rate noise.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RangeBearingRateSensor {
    /// Range noise std dev (meters)
    pub sigma_range: f64,
    /// Bearing noise std dev (radians)
    pub sigma_bearing: f64,
    /// Range-rate noise std dev (m/s)
    pub sigma_rate: f64,
}

impl RangeBearingRateSensor {
    pub fn new(sigma_range: f64, sigma_bearing: f64, sigma_rate: f64) -> Self {
        Self {
            sigma_range,
            sigma_bearing,
            sigma_rate,
        }
    }

    /// Convert polar [range, bearing] to cartesian [x, y].
    pub fn polar_to_cartesian(range: f64, bearing: f64) -> (f64, f64) {
        (range * bearing.cos(), range * bearing.sin())
    }
}

impl ObservationModel<3> for RangeBearingRateSensor {
    fn predict(&self, state: &StateVec) -> Vector3<f64> {
        range_bearing_rate_measurement(state)
    }

    fn jacobian(&self, state: &StateVec) -> SMatrix<f64, 3, STATE_DIM> {
        range_bearing_rate_jacobian(state)
    }

    fn noise_cov(&self) -> Matrix3<f64> {
        Matrix3::from_diagonal(&Vector3::new(
            self.sigma_range * self.sigma_range,
            self.sigma_bearing * self.sigma_bearing,
            self.sigma_rate * self.sigma_rate,
        ))
    }

    fn residual(&self, z: &Vector3<f64>, z_pred: &Vector3<f64>) -> Vector3<f64> {
        let mut y = z - z_pred;
        y[1] = normalize_angle(y[1]);
        y
    }

    /// Velocity is assumed purely radial: the tangential part is unobserved.
    fn initial_state(&self, z: &Vector3<f64>) -> StateVec {
        let (range, bearing, rate) = (z[0], z[1], z[2]);
        let (x, y) = Self::polar_to_cartesian(range, bearing);
        let (vx, vy) = Self::polar_to_cartesian(rate, bearing);
        StateVec::new(x, y, vx, vy)
    }
}
