//! # GCodeLevel Stream
//!
//! G-code rewriting for GCodeLevel.
//! Classifies and parses G-code lines, tracks modal machine state, and
//! rebuilds every absolute move with a surface-compensated Z, splitting long
//! lines and arcs where the bed curvature demands it.

pub mod gcode;
pub mod utils;

pub use gcode::{
    classify, ArcGeometry, ExtrusionMode, LevelingStream, LineKind, MachineState, MoveMode,
    MoveWords, Plane, StreamTransformer, TransformConfig,
};

pub use utils::{
    header_line, is_gcode, is_processed, level_file, level_file_to, level_reader, output_path,
    LevelOutcome, LevelStats, LineEnding, OUTPUT_SUFFIX,
};
