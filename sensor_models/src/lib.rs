//! `sensor_models` — Observation models for the tracker's sensors: expected
//! measurements, Jacobians, measurement noise, angle wrapping and
//! measurement-to-state inversion for track birth.

pub mod observation;
pub mod radar;

pub use observation::{
    normalize_angle, position_h, position_measurement, Measurement, ObservationModel,
    PositionSensor, SensorKind, StateVec, STATE_DIM,
};
pub use radar::{
    range_bearing_rate_jacobian, range_bearing_rate_measurement, RangeBearingRateSensor,
};
