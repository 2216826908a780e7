//! GCodeLevel Settings Crate
//!
//! Handles the leveler's configuration: calibration points, machine limits,
//! subdivision distances and optimizer tuning.

pub mod config;

pub use config::{CalibrationSettings, Config, MachineSettings, SubdivisionSettings};
