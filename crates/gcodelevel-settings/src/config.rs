//! Configuration for GCodeLevel
//!
//! Provides configuration file handling and validation.
//! Supports JSON and TOML file formats; the default file lives in the
//! platform-specific configuration directory.
//!
//! Configuration is organized into logical sections:
//! - Calibration (probed points, polynomial degrees)
//! - Machine limits (Z window, inverted axis, Z offset)
//! - Subdivision (line and arc split distances)
//! - Optimizer (split threshold, search strategy, recursion limits)

use gcodelevel_core::{CalibrationSet, ConfigError, Result};
use gcodelevel_stream::TransformConfig;
use gcodelevel_surface::{MaximizerStrategy, OptimizerConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory name under the platform config directory
const CONFIG_DIR_NAME: &str = "gcodelevel";

/// Default config file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Probed surface and fit degrees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationSettings {
    /// Probed `[x, y, z]` points in scan order; all zero disables leveling
    pub points: CalibrationSet,
    /// Highest power of X in the fitted polynomial
    pub x_degree: usize,
    /// Highest power of Y in the fitted polynomial
    pub y_degree: usize,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            points: CalibrationSet::default(),
            x_degree: 2,
            y_degree: 2,
        }
    }
}

/// Machine Z limits and axis handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineSettings {
    /// Lowest acceptable compensated Z
    pub z_min: f64,
    /// Highest acceptable compensated Z
    pub z_max: f64,
    /// Z axis points down (bed moves up as Z grows)
    pub invert_position: bool,
    /// Constant added to every commanded Z
    pub z_offset: f64,
}

impl Default for MachineSettings {
    fn default() -> Self {
        Self {
            z_min: 0.0,
            z_max: 100.0,
            invert_position: false,
            z_offset: 0.0,
        }
    }
}

/// Minimum path lengths considered for splitting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubdivisionSettings {
    /// Lines at least this long may be split; 0 disables
    pub line_break_distance: f64,
    /// Arcs at least this long may be split; 0 disables
    pub arc_segment_distance: f64,
}

impl Default for SubdivisionSettings {
    fn default() -> Self {
        Self {
            line_break_distance: 10.0,
            arc_segment_distance: 15.0,
        }
    }
}

/// Complete leveler configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Calibration settings
    pub calibration: CalibrationSettings,
    /// Machine limits
    pub machine: MachineSettings,
    /// Subdivision distances
    pub subdivision: SubdivisionSettings,
    /// Optimizer tuning
    pub optimizer: OptimizerConfig,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file location (`<config dir>/gcodelevel/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        let config: Self = match Format::of(path)? {
            Format::Json => serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                reason: format!("Invalid JSON config: {}", e),
            })?,
            Format::Toml => toml::from_str(&content).map_err(|e| ConfigError::Parse {
                reason: format!("Invalid TOML config: {}", e),
            })?,
        };

        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `path` if given, otherwise the default file if it exists,
    /// otherwise the built-in defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let content = match Format::of(path)? {
            Format::Json => serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse {
                reason: format!("Failed to serialize config: {}", e),
            })?,
            Format::Toml => toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
                reason: format!("Failed to serialize config: {}", e),
            })?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        // Calibration
        if self
            .calibration
            .points
            .samples()
            .iter()
            .any(|s| !(s.x.is_finite() && s.y.is_finite() && s.z.is_finite()))
        {
            return Err(
                ConfigError::invalid("calibration.points", "coordinates must be finite").into(),
            );
        }

        // Machine limits
        if !self.machine.z_min.is_finite() || !self.machine.z_max.is_finite() {
            return Err(ConfigError::invalid("machine", "Z limits must be finite").into());
        }
        if self.machine.z_min > self.machine.z_max {
            return Err(ConfigError::invalid("machine.z_min", "must not exceed z_max").into());
        }
        if !self.machine.z_offset.is_finite() {
            return Err(ConfigError::invalid("machine.z_offset", "must be finite").into());
        }

        // Subdivision
        non_negative("subdivision.line_break_distance", self.subdivision.line_break_distance)?;
        non_negative("subdivision.arc_segment_distance", self.subdivision.arc_segment_distance)?;

        // Optimizer
        let optimizer = &self.optimizer;
        if optimizer.threshold.is_nan() || optimizer.threshold <= 0.0 {
            return Err(ConfigError::invalid("optimizer.threshold", "must be > 0").into());
        }
        if optimizer.telos.is_nan() || optimizer.telos <= 0.0 || optimizer.telos >= 0.5 {
            return Err(ConfigError::invalid("optimizer.telos", "must be in (0, 0.5)").into());
        }
        non_negative("optimizer.min_span", optimizer.min_span)?;

        match &optimizer.strategy {
            MaximizerStrategy::GradientAscent { start, step, .. }
            | MaximizerStrategy::DecayingGradientAscent { start, step, .. } => {
                unit_interval("optimizer.strategy.start", *start)?;
                if step.is_nan() || *step <= 0.0 {
                    return Err(
                        ConfigError::invalid("optimizer.strategy.step", "must be > 0").into()
                    );
                }
            }
            MaximizerStrategy::UniformSampling { samples }
            | MaximizerStrategy::RandomSampling { samples, .. } => {
                if *samples == 0 {
                    return Err(
                        ConfigError::invalid("optimizer.strategy.samples", "must be > 0").into()
                    );
                }
            }
            MaximizerStrategy::Newton { start, .. } => {
                unit_interval("optimizer.strategy.start", *start)?;
            }
        }

        Ok(())
    }

    /// True unless the calibration points are the all-zero sentinel
    pub fn is_calibrated(&self) -> bool {
        !self.calibration.points.is_disabled()
    }

    /// Settings for a [`gcodelevel_stream::StreamTransformer`]
    pub fn to_transform_config(&self) -> TransformConfig {
        TransformConfig {
            z_min: self.machine.z_min,
            z_max: self.machine.z_max,
            invert_position: self.machine.invert_position,
            z_offset: self.machine.z_offset,
            line_break_distance: self.subdivision.line_break_distance,
            arc_segment_distance: self.subdivision.arc_segment_distance,
            optimizer: self.optimizer.clone(),
        }
    }
}

/// On-disk config format, chosen by extension
enum Format {
    Json,
    Toml,
}

impl Format {
    fn of(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Format::Json),
            Some("toml") => Ok(Format::Toml),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.display().to_string(),
            }
            .into()),
        }
    }
}

fn non_negative(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must be a finite value >= 0").into())
    }
}

fn unit_interval(field: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must be in [0, 1]").into())
    }
}
