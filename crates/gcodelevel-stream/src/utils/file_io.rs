//! File leveling
//!
//! Runs a [`StreamTransformer`] over a G-code file:
//! - Line endings (LF or CRLF) are detected from the first line and reproduced
//! - A `; Processed by gcodelevel <version>` header is written first
//! - Output goes to a temporary file beside the destination and is only
//!   persisted once the whole input has been transformed
//! - Inputs that are already leveled (`*-GCL.gcode`) are skipped

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use gcodelevel_core::Error;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::gcode::StreamTransformer;

/// Suffix that marks a leveled file
pub const OUTPUT_SUFFIX: &str = "-GCL.gcode";

/// Extensions recognised as G-code
pub const GCODE_EXTENSIONS: &[&str] = &["g", "gco", "gcode"];

/// Buffer size for reading and writing (256 KB)
const IO_BUFFER_SIZE: usize = 256 * 1024;

/// Line terminator style of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    /// Detect from a raw line as returned by `read_line`
    pub fn detect(raw_line: &str) -> Self {
        if raw_line.ends_with("\r\n") {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// Statistics for one leveled file
#[derive(Debug, Clone, Default)]
pub struct LevelStats {
    /// Input lines consumed
    pub lines_read: u64,
    /// Output lines written, including the header
    pub lines_written: u64,
    /// Line ending used for the output
    pub line_ending: LineEnding,
    /// Wall time in milliseconds
    pub elapsed_ms: u64,
}

impl LevelStats {
    /// Lines added by subdivision
    pub fn lines_added(&self) -> u64 {
        self.lines_written.saturating_sub(self.lines_read + 1)
    }
}

/// Result of leveling a file on disk
#[derive(Debug, Clone)]
pub struct LevelOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    pub stats: LevelStats,
}

/// The header line written at the top of every output
pub fn header_line() -> String {
    format!("; Processed by gcodelevel {}", env!("CARGO_PKG_VERSION"))
}

/// True if the file name marks an already leveled file
pub fn is_processed(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(OUTPUT_SUFFIX))
}

/// True if the file has a G-code extension
pub fn is_gcode(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| GCODE_EXTENSIONS.iter().any(|g| e.eq_ignore_ascii_case(g)))
}

/// Output path for `input`: its G-code extension replaced by `-GCL.gcode`
///
/// Returns `None` if `input` does not have a G-code extension.
pub fn output_path(input: &Path) -> Option<PathBuf> {
    if !is_gcode(input) {
        return None;
    }
    let stem = input.file_stem()?.to_str()?;
    Some(input.with_file_name(format!("{stem}{OUTPUT_SUFFIX}")))
}

/// Level everything from `reader` into `writer`
///
/// # Errors
/// Propagates I/O failures and the transformer's bounds and geometry errors.
pub fn level_reader<R: BufRead, W: Write>(
    transformer: &StreamTransformer,
    mut reader: R,
    mut writer: W,
) -> std::result::Result<LevelStats, Error> {
    let start = Instant::now();
    let mut stats = LevelStats::default();
    let mut stream = transformer.stream();
    let mut raw = String::new();

    loop {
        raw.clear();
        if reader.read_line(&mut raw)? == 0 {
            break;
        }
        if stats.lines_read == 0 {
            stats.line_ending = LineEnding::detect(&raw);
            writer.write_all(header_line().as_bytes())?;
            writer.write_all(stats.line_ending.as_str().as_bytes())?;
            stats.lines_written += 1;
        }
        stats.lines_read += 1;

        let line = raw
            .strip_suffix('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .unwrap_or(raw.as_str());
        for out in stream.push(line)? {
            writer.write_all(out.as_bytes())?;
            writer.write_all(stats.line_ending.as_str().as_bytes())?;
            stats.lines_written += 1;
        }
    }

    if stats.lines_read == 0 {
        writer.write_all(header_line().as_bytes())?;
        writer.write_all(stats.line_ending.as_str().as_bytes())?;
        stats.lines_written += 1;
    }

    writer.flush()?;
    stats.elapsed_ms = start.elapsed().as_millis() as u64;
    Ok(stats)
}

/// Level `input` into `output`, replacing `output` only on success
///
/// # Errors
/// Returns an error if the input cannot be read, the temporary file cannot be
/// created or persisted, or the transformer rejects a line. In every error
/// case `output` is left untouched.
pub fn level_file_to(
    transformer: &StreamTransformer,
    input: &Path,
    output: &Path,
) -> Result<LevelStats> {
    let file = File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
    let reader = BufReader::with_capacity(IO_BUFFER_SIZE, file);

    let dir = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;

    let stats = {
        let writer = BufWriter::with_capacity(IO_BUFFER_SIZE, temp.as_file_mut());
        level_reader(transformer, reader, writer)
            .with_context(|| format!("Failed to level {}", input.display()))?
    };

    // Temporary files are created owner-only; keep the input's mode instead.
    if let Ok(meta) = fs::metadata(input) {
        fs::set_permissions(temp.path(), meta.permissions()).ok();
    }

    temp.persist(output)
        .map_err(|e| anyhow!("Failed to write {}: {}", output.display(), e.error))?;
    debug!(
        "Persisted {} ({} lines, {} added)",
        output.display(),
        stats.lines_written,
        stats.lines_added()
    );
    Ok(stats)
}

/// Level `input` next to itself under its `-GCL.gcode` name
///
/// Returns `Ok(None)` for files that are already leveled.
///
/// # Errors
/// Returns an error for non G-code inputs and for any failure of
/// [`level_file_to`].
pub fn level_file(transformer: &StreamTransformer, input: &Path) -> Result<Option<LevelOutcome>> {
    if is_processed(input) {
        info!("Skipping already leveled file {}", input.display());
        return Ok(None);
    }
    let output = output_path(input)
        .ok_or_else(|| anyhow!("Not a G-code file (.g, .gco, .gcode): {}", input.display()))?;

    let stats = level_file_to(transformer, input, &output)?;
    info!(
        "Leveled {} -> {} in {}ms",
        input.display(),
        output.display(),
        stats.elapsed_ms
    );
    Ok(Some(LevelOutcome {
        input: input.to_path_buf(),
        output,
        stats,
    }))
}
