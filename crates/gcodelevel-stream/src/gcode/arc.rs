//! Arc reconstruction for G2/G3
//!
//! Resolves the centre and signed sweep of an arc from either centre offsets
//! (`I`/`J`) or a radius (`R`). Sweeps are negative for clockwise (G2) and
//! positive for counter-clockwise (G3) motion.

use std::f64::consts::TAU;

use gcodelevel_core::{GeometryError, Point2};
use gcodelevel_surface::PathSegment;

use super::command::MoveWords;

/// Endpoints closer than this are treated as the same point
const COINCIDENT_EPSILON: f64 = 1e-9;

/// A resolved circular arc
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcGeometry {
    pub center: Point2,
    /// Vector from the centre to the start point
    pub arm: Point2,
    /// Signed swept angle in radians
    pub sweep: f64,
}

impl ArcGeometry {
    /// Resolve an arc from its move words
    ///
    /// Zero-valued `I`/`J`/`R` words count as absent.
    pub fn resolve(
        start: Point2,
        end: Point2,
        words: &MoveWords,
        clockwise: bool,
        line_number: u64,
    ) -> Result<Self, GeometryError> {
        let i = words.i.unwrap_or(0.0);
        let j = words.j.unwrap_or(0.0);
        let r = words.r.unwrap_or(0.0);
        let has_offsets = i != 0.0 || j != 0.0;
        let has_radius = r != 0.0;

        match (has_offsets, has_radius) {
            (true, true) => Err(GeometryError::MixedArcFormat { line_number }),
            (true, false) => Ok(Self::from_offsets(start, end, i, j, clockwise)),
            (false, true) => Self::from_radius(start, end, r, clockwise, line_number),
            (false, false) => Err(GeometryError::MissingArcParameters { line_number }),
        }
    }

    /// Arc whose centre is `start + (i, j)`
    ///
    /// Coincident endpoints describe a full circle.
    pub fn from_offsets(start: Point2, end: Point2, i: f64, j: f64, clockwise: bool) -> Self {
        let center = start + Point2::new(i, j);
        let arm = start - center;
        let angle = if start.distance_to(&end) <= COINCIDENT_EPSILON {
            TAU
        } else {
            directed_angle(arm, end - center, clockwise)
        };
        Self {
            center,
            arm,
            sweep: if clockwise { -angle } else { angle },
        }
    }

    /// Arc of radius `|radius|` between two distinct points
    ///
    /// The centre sits on the side of the chord that gives the short arc for a
    /// positive radius and the long arc for a negative one.
    pub fn from_radius(
        start: Point2,
        end: Point2,
        radius: f64,
        clockwise: bool,
        line_number: u64,
    ) -> Result<Self, GeometryError> {
        let chord = end - start;
        let distance = chord.length();
        if distance == 0.0 {
            return Err(GeometryError::CoincidentEndpoints { line_number });
        }
        if distance > 2.0 * radius.abs() {
            return Err(GeometryError::RadiusTooSmall {
                line_number,
                radius,
                chord: distance,
            });
        }

        let rotation = if clockwise { -1.0 } else { 1.0 };
        let Some(normal) = Point2::new(-chord.y * rotation, chord.x * rotation).normalized() else {
            return Err(GeometryError::CoincidentEndpoints { line_number });
        };
        let rise = (radius * radius - (distance / 2.0).powi(2)).max(0.0).sqrt();
        let side = if radius < 0.0 { -1.0 } else { 1.0 };
        let center = start + chord * 0.5 + normal * (rise * side);

        let arm = start - center;
        let angle = directed_angle(arm, end - center, clockwise);
        Ok(Self {
            center,
            arm,
            sweep: if clockwise { -angle } else { angle },
        })
    }

    pub fn radius(&self) -> f64 {
        self.arm.length()
    }

    /// Arc length in the XY plane
    pub fn length(&self) -> f64 {
        self.radius() * self.sweep.abs()
    }

    /// Point at fraction `t` of the sweep
    pub fn position(&self, t: f64) -> Point2 {
        self.center + self.arm.rotate(self.sweep * t)
    }

    /// `I`/`J` offset from the point at fraction `t` to the centre
    pub fn offset_at(&self, t: f64) -> Point2 {
        -self.arm.rotate(self.sweep * t)
    }

    pub fn segment(&self) -> PathSegment {
        PathSegment::Arc {
            center: self.center,
            arm: self.arm,
            sweep: self.sweep,
        }
    }
}

/// Unsigned angle swept from `from` to `to` travelling in the given direction,
/// in `(0, 2π]`
fn directed_angle(from: Point2, to: Point2, clockwise: bool) -> f64 {
    let mut ccw = from.cross(&to).atan2(from.dot(&to));
    if ccw < 0.0 {
        ccw += TAU;
    }
    let angle = if clockwise { TAU - ccw } else { ccw };
    if angle <= 0.0 {
        TAU
    } else {
        angle
    }
}
