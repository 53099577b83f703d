//! Kalman filter: predict and update steps.
//!
//! # Design choices
//! - The filter is generic over the state dimension `N` and the measurement
//!   dimension `M`, using nalgebra's stack-allocated `SMatrix`/`SVector`.
//! - It knows nothing about sensors or tracks: the caller supplies F, Q per
//!   predict and H, R (and optionally the innovation) per update.
//! - Nonlinear sensors are handled by the caller computing `y = z − h(x)`
//!   and passing the Jacobian as H to [`KalmanFilter::update_innovation`].
//!
//! ## CV transition model (4-state, [px, py, vx, vy])
//! F = I₄ + dt · [[0₂ I₂]; [0₂ 0₂]]
//!
//! ## Process noise Q (discretised white-noise acceleration)
//! Per axis: σ²·[[dt⁴/4, dt³/2]; [dt³/2, dt²]]

use crate::error::FilterError;
use crate::types::{StateCov, STATE_DIM};
use nalgebra::{Cholesky, Matrix4, SMatrix, SVector};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Gaussian belief (x, P) over an `N`-dimensional state.
#[derive(Clone, Debug, PartialEq)]
pub struct KalmanFilter<const N: usize> {
    pub state: SVector<f64, N>,
    pub cov: SMatrix<f64, N, N>,
}

/// Result of a KF update step. Holds the posterior without having applied it.
#[derive(Clone, Debug)]
pub struct KfUpdateResult<const M: usize, const N: usize> {
    pub state: SVector<f64, N>,
    pub cov: SMatrix<f64, N, N>,
    /// Innovation y = z − h(x)
    pub innovation: SVector<f64, M>,
    /// Innovation covariance S = H·P·Hᵀ + R
    pub innovation_cov: SMatrix<f64, M, M>,
    /// Kalman gain K
    pub kalman_gain: SMatrix<f64, N, M>,
}

impl<const N: usize> KalmanFilter<N> {
    pub fn new(state: SVector<f64, N>, cov: SMatrix<f64, N, N>) -> Self {
        Self { state, cov }
    }

    /// x ← F·x,  P ← F·P·Fᵀ + Q
    pub fn predict(&mut self, f: &SMatrix<f64, N, N>, q: &SMatrix<f64, N, N>) {
        self.state = f * self.state;
        self.cov = f * self.cov * f.transpose() + q;
    }

    /// Linear measurement update with y = z − H·x.
    pub fn update<const M: usize>(
        &mut self,
        z: &SVector<f64, M>,
        h: &SMatrix<f64, M, N>,
        r: &SMatrix<f64, M, M>,
    ) -> Result<KfUpdateResult<M, N>, FilterError> {
        let innovation = z - h * self.state;
        self.update_innovation(&innovation, h, r)
    }

    /// Measurement update with a caller-supplied innovation (EKF form).
    pub fn update_innovation<const M: usize>(
        &mut self,
        innovation: &SVector<f64, M>,
        h: &SMatrix<f64, M, N>,
        r: &SMatrix<f64, M, M>,
    ) -> Result<KfUpdateResult<M, N>, FilterError> {
        let res = self.correction(innovation, h, r)?;
        self.state = res.state;
        self.cov = res.cov;
        Ok(res)
    }

    /// Compute the posterior for innovation `y` without mutating the filter.
    pub fn correction<const M: usize>(
        &self,
        innovation: &SVector<f64, M>,
        h: &SMatrix<f64, M, N>,
        r: &SMatrix<f64, M, M>,
    ) -> Result<KfUpdateResult<M, N>, FilterError> {
        // S = H·P·Hᵀ + R
        let s = h * self.cov * h.transpose() + r;
        let s_inv = factor_innovation_cov(&s)?.inverse();

        // K = P·Hᵀ·S⁻¹
        let k = self.cov * h.transpose() * s_inv;

        let state = self.state + k * innovation;
        // P' = (I − K·H)·P, re-symmetrised against rounding drift
        let cov = (SMatrix::<f64, N, N>::identity() - k * h) * self.cov;
        let cov = (cov + cov.transpose()) * 0.5;

        Ok(KfUpdateResult {
            state,
            cov,
            innovation: *innovation,
            innovation_cov: s,
            kalman_gain: k,
        })
    }
}

/// Cholesky factor of an innovation covariance, or an error when it is not
/// numerically positive definite.
pub(crate) fn factor_innovation_cov<const M: usize>(
    s: &SMatrix<f64, M, M>,
) -> Result<Cholesky<f64, nalgebra::Const<M>>, FilterError> {
    if s.iter().any(|v| !v.is_finite()) {
        return Err(FilterError::SingularInnovation { dim: M });
    }
    Cholesky::new(*s).ok_or(FilterError::SingularInnovation { dim: M })
}

// ---------------------------------------------------------------------------
// Constant Velocity model
// ---------------------------------------------------------------------------

/// Configuration for the CV motion model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CvConfig {
    /// White-noise acceleration std dev (m/s²). Higher = more manoeuvring allowed.
    pub process_noise_std: f64,
}

impl Default for CvConfig {
    fn default() -> Self {
        Self {
            process_noise_std: 1.0,
        }
    }
}

/// Constant-velocity motion model for the 4-state [px, py, vx, vy].
#[derive(Clone, Debug)]
pub struct CvModel {
    pub config: CvConfig,
}

impl CvModel {
    pub fn new(config: CvConfig) -> Self {
        Self { config }
    }

    /// Build state transition matrix F for timestep dt.
    pub fn transition_matrix(dt: f64) -> Matrix4<f64> {
        let mut f = Matrix4::<f64>::identity();
        // position += velocity * dt
        f[(0, 2)] = dt;
        f[(1, 3)] = dt;
        f
    }

    /// Build process noise matrix Q for timestep dt, block-diagonal over
    /// the x and y axes.
    pub fn process_noise(&self, dt: f64) -> StateCov {
        let q = self.config.process_noise_std * self.config.process_noise_std;
        let dt2 = dt * dt;
        let dt3 = dt2 * dt;
        let dt4 = dt3 * dt;

        let mut qm = StateCov::zeros();
        for i in 0..2usize {
            qm[(i, i)] = q * dt4 / 4.0;
            qm[(i + 2, i + 2)] = q * dt2;
            qm[(i, i + 2)] = q * dt3 / 2.0;
            qm[(i + 2, i)] = q * dt3 / 2.0;
        }
        qm
    }

    /// Propagate `kf` forward by `dt` seconds.
    pub fn predict(&self, kf: &mut KalmanFilter<STATE_DIM>, dt: f64) {
        let f = Self::transition_matrix(dt);
        let q = self.process_noise(dt);
        kf.predict(&f, &q);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
