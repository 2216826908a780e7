//! # GCodeLevel
//!
//! Surface-compensating G-code leveler. A polynomial height model is fitted to
//! probed calibration points and every move in a G-code program has its Z
//! rewritten to follow that surface. Long lines and arcs are split where a
//! straight Z interpolation would stray too far from the fitted surface.
//!
//! ## Architecture
//!
//! GCodeLevel is organized as a workspace with multiple crates:
//!
//! 1. **gcodelevel-core** - Geometry primitive, calibration samples, errors
//! 2. **gcodelevel-surface** - Least-squares fit, height field, path optimizer
//! 3. **gcodelevel-stream** - G-code line transformer and file leveling
//! 4. **gcodelevel-settings** - Configuration files and validation
//! 5. **gcodelevel** - Library facade and command-line binary

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

pub use gcodelevel_core::{
    BoundsError, CalibrationSample, CalibrationSet, ConfigError, Error, GeometryError, Point2,
    Result,
};
pub use gcodelevel_settings::{CalibrationSettings, Config, MachineSettings, SubdivisionSettings};
pub use gcodelevel_stream::{
    is_gcode, level_file, level_file_to, level_reader, output_path, LevelOutcome, LevelStats,
    MachineState, StreamTransformer, TransformConfig, OUTPUT_SUFFIX,
};
pub use gcodelevel_surface::{
    fit, CoefficientGrid, HeightField, MaximizerStrategy, OptimizerConfig, PathOptimizer,
    SurfaceFitter,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output on stderr, so stdout stays free for output paths
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Fits the calibration once and levels any number of files with it
#[derive(Debug, Clone)]
pub struct Leveler {
    transformer: Arc<StreamTransformer>,
}

impl Leveler {
    /// Build a leveler from a validated config
    ///
    /// Returns `None` when the calibration is the all-zero sentinel, i.e.
    /// leveling is disabled.
    pub fn from_config(config: &Config) -> Option<Self> {
        if !config.is_calibrated() {
            return None;
        }
        let calibration = &config.calibration;
        let grid = fit(
            calibration.points.samples(),
            calibration.x_degree,
            calibration.y_degree,
        );
        info!(
            "Fitted {}x{} surface to {} calibration points",
            calibration.x_degree,
            calibration.y_degree,
            calibration.points.len()
        );
        debug!("Surface coefficients (rows: x exponent):\n{}", grid);
        Some(Self::new(Arc::new(grid), config.to_transform_config()))
    }

    /// Build a leveler around an already fitted grid
    pub fn new(grid: Arc<CoefficientGrid>, config: TransformConfig) -> Self {
        Self {
            transformer: Arc::new(StreamTransformer::new(grid, config)),
        }
    }

    pub fn transformer(&self) -> &StreamTransformer {
        &self.transformer
    }

    /// Level one file next to itself
    pub fn level_file(&self, input: &Path) -> anyhow::Result<Option<LevelOutcome>> {
        level_file(&self.transformer, input)
    }

    /// Level several files concurrently, one blocking task per file
    ///
    /// Results come back in input order. Inputs without a G-code extension
    /// are skipped (`Ok(None)`) like already leveled ones. A failing file does
    /// not stop the others.
    pub async fn level_files(
        &self,
        inputs: Vec<PathBuf>,
    ) -> Vec<(PathBuf, anyhow::Result<Option<LevelOutcome>>)> {
        let handles: Vec<_> = inputs
            .into_iter()
            .map(|input| {
                if !is_gcode(&input) {
                    info!("Skipping non G-code file {}", input.display());
                    return (input, None);
                }
                let transformer = Arc::clone(&self.transformer);
                let path = input.clone();
                let handle = tokio::task::spawn_blocking(move || level_file(&transformer, &path));
                (input, Some(handle))
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (input, handle) in handles {
            let Some(handle) = handle else {
                results.push((input, Ok(None)));
                continue;
            };
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    warn!("Leveling task for {} failed: {}", input.display(), e);
                    Err(anyhow::anyhow!("Leveling task panicked or was cancelled: {}", e))
                }
            };
            results.push((input, result));
        }
        results
    }
}
