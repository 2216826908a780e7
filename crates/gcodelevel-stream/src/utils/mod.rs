//! File-level helpers

pub mod file_io;

pub use file_io::{
    header_line, is_gcode, is_processed, level_file, level_file_to, level_reader, output_path,
    LevelOutcome, LevelStats, LineEnding, GCODE_EXTENSIONS, OUTPUT_SUFFIX,
};
