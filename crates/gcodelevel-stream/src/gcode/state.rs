//! Modal machine state for a single leveling pass

use gcodelevel_core::Point2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Distance mode (G90 / G91)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MoveMode {
    /// G90
    #[default]
    Absolute,
    /// G91
    Relative,
}

/// Extruder distance mode (M82 / M83)
///
/// `None` until the stream either selects a mode or issues its first `E`
/// word, which implies absolute extrusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtrusionMode {
    #[default]
    None,
    /// M82
    Absolute,
    /// M83
    Relative,
}

/// Active workspace plane (G17 / G18 / G19)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Plane {
    /// G17
    #[default]
    XY,
    /// G18
    ZX,
    /// G19
    YZ,
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Plane::XY => write!(f, "XY"),
            Plane::ZX => write!(f, "ZX"),
            Plane::YZ => write!(f, "YZ"),
        }
    }
}

/// Everything the transformer remembers between lines
///
/// Positions are logical (as written in the program). The height field is
/// sampled at `logical + work_offset`, which tracks `G92` resets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MachineState {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub prev_x: f64,
    pub prev_y: f64,
    pub prev_z: f64,

    /// Last E word (absolute position, or the delta in relative mode)
    pub e: f64,
    /// E before the current move (0 in relative mode)
    pub prev_e: f64,

    pub move_mode: MoveMode,
    pub extrusion_mode: ExtrusionMode,
    pub plane: Plane,

    pub feed_rate: Option<f64>,
    pub feed_changed: bool,

    /// Set once the first move has been processed; the very first move is
    /// never subdivided because its start point is unknown.
    pub started: bool,

    /// Trailing `;` comment waiting to be reattached
    pub pending_comment: Option<String>,

    /// Logical-to-machine XY offset accumulated from `G92`
    pub work_offset: Point2,

    /// 1-based number of the line being processed
    pub line_number: u64,
}

impl MachineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }

    pub fn previous_position(&self) -> Point2 {
        Point2::new(self.prev_x, self.prev_y)
    }

    /// Machine coordinates of a logical XY point
    pub fn to_machine(&self, p: Point2) -> Point2 {
        p + self.work_offset
    }

    /// Record the current position as the start of the next move
    pub fn begin_move(&mut self) {
        self.prev_x = self.x;
        self.prev_y = self.y;
        self.prev_z = self.z;
    }

    /// Apply an E word according to the extrusion mode
    pub fn apply_extrusion(&mut self, value: f64) {
        match self.extrusion_mode {
            ExtrusionMode::None => {
                self.extrusion_mode = ExtrusionMode::Absolute;
                self.prev_e = self.e;
            }
            ExtrusionMode::Absolute => self.prev_e = self.e,
            ExtrusionMode::Relative => self.prev_e = 0.0,
        }
        self.e = value;
    }

    /// E to emit at the end of the sub-move covering `[start, end]` of the
    /// current move
    pub fn extrusion_at(&self, start: f64, end: f64) -> f64 {
        let delta = self.e - self.prev_e;
        match self.extrusion_mode {
            ExtrusionMode::Relative => delta * (end - start),
            _ if end >= 1.0 => self.e,
            _ => self.prev_e + delta * end,
        }
    }

    /// Apply an F word, flagging whether it differs from the active feed
    pub fn apply_feed(&mut self, value: f64) {
        self.feed_changed = self.feed_rate != Some(value);
        self.feed_rate = Some(value);
    }

    /// `G92`: redefine the logical position of the given axes
    pub fn set_position(
        &mut self,
        x: Option<f64>,
        y: Option<f64>,
        z: Option<f64>,
        e: Option<f64>,
    ) {
        if let Some(x) = x {
            self.work_offset.x += self.x - x;
            self.x = x;
            self.prev_x = x;
        }
        if let Some(y) = y {
            self.work_offset.y += self.y - y;
            self.y = y;
            self.prev_y = y;
        }
        if let Some(z) = z {
            self.z = z;
            self.prev_z = z;
        }
        if let Some(e) = e {
            self.e = e;
            self.prev_e = e;
        }
    }
}
