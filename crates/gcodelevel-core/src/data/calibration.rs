//! Calibration samples
//!
//! Probed surface heights arrive as an ordered list of `(x, y, z)` triples in
//! scan order. A set whose every coordinate is zero is the "not calibrated"
//! sentinel: leveling is disabled and files pass through untouched.

use serde::{Deserialize, Serialize};

/// One measured surface height
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct CalibrationSample {
    /// Machine X of the probe point
    pub x: f64,
    /// Machine Y of the probe point
    pub y: f64,
    /// Measured height
    pub z: f64,
}

impl CalibrationSample {
    /// Create a new sample
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// True when every coordinate is exactly zero
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }
}

impl From<[f64; 3]> for CalibrationSample {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<CalibrationSample> for [f64; 3] {
    fn from(s: CalibrationSample) -> Self {
        [s.x, s.y, s.z]
    }
}

/// Ordered collection of calibration samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalibrationSet {
    samples: Vec<CalibrationSample>,
}

impl CalibrationSet {
    /// Create a set from samples, preserving their order
    pub fn new(samples: Vec<CalibrationSample>) -> Self {
        Self { samples }
    }

    /// Build a set from raw `[x, y, z]` triples
    pub fn from_triples(triples: &[[f64; 3]]) -> Self {
        Self::new(triples.iter().copied().map(CalibrationSample::from).collect())
    }

    /// The samples in scan order
    pub fn samples(&self) -> &[CalibrationSample] {
        &self.samples
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if there are no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// True when leveling is disabled: no samples, or every sample is all-zero
    pub fn is_disabled(&self) -> bool {
        self.samples.iter().all(CalibrationSample::is_zero)
    }
}

impl Default for CalibrationSet {
    /// A single all-zero sample, i.e. disabled
    fn default() -> Self {
        Self::new(vec![CalibrationSample::default()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_set_is_disabled() {
        assert!(CalibrationSet::default().is_disabled());
    }

    #[test]
    fn test_any_nonzero_coordinate_enables() {
        let set = CalibrationSet::from_triples(&[[0.0, 0.0, 0.0], [0.0, 0.0, 0.1]]);
        assert!(!set.is_disabled());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_triples_round_trip_through_json() {
        let set = CalibrationSet::from_triples(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, "[[1.0,2.0,3.0],[4.0,5.0,6.0]]");
        let back: CalibrationSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}
