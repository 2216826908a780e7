//! # GCodeLevel Core
//!
//! Core types and error handling for GCodeLevel.
//! Provides the planar geometry primitive shared by the optimizer and the
//! stream transformer, the calibration sample model, and the error taxonomy
//! used by every layer.

pub mod data;
pub mod error;

pub use data::{CalibrationSample, CalibrationSet, Point2};

pub use error::{BoundsError, ConfigError, Error, GeometryError, Result};
