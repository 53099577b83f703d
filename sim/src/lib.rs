//! `sim` — Scenario simulator: highway ground truth and synthetic sensor detections.

pub mod scenarios;
pub mod sensor_sim;
pub mod target;

pub use scenarios::HighwayScenario;
pub use sensor_sim::{SensorSimConfig, SensorSimulator};
pub use target::ObjectState;
