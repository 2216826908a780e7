//! G-code leveling state machine
//!
//! This module provides:
//! - Line classification and move-word parsing
//! - Modal machine state (distance, extrusion and plane modes, G92 offsets)
//! - Arc reconstruction from I/J offsets or R radius
//! - The line-by-line transformer that rewrites moves against a height field

pub mod arc;
pub mod command;
pub mod state;
pub mod transformer;

pub use arc::ArcGeometry;
pub use command::{classify, LineKind, MoveWords};
pub use state::{ExtrusionMode, MachineState, MoveMode, Plane};
pub use transformer::{LevelingStream, StreamTransformer, TransformConfig};
