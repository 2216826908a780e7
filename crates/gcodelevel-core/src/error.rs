//! Error handling for GCodeLevel
//!
//! Provides the error types raised while leveling a G-code stream:
//! - Bounds errors (compensated Z outside the machine's limits)
//! - Geometry errors (arc commands that cannot be resolved)
//! - Configuration errors (invalid or unreadable settings)
//!
//! Bounds and geometry errors are fatal to the file being transformed; nothing
//! is retried and no partial output is produced. Every variant carries a short
//! machine-readable code alongside its human-readable message.

use thiserror::Error;

/// Compensated Z fell outside the configured `[z_min, z_max]` window.
///
/// The limits are inclusive: a value exactly equal to either bound is accepted.
#[derive(Error, Debug, Clone, PartialEq)]
#[error(
    "Computed Z {z:.4} at X{x:.3} Y{y:.3} is outside of bounds [{z_min}, {z_max}] (line {line_number})"
)]
pub struct BoundsError {
    /// The 1-based input line that produced the value.
    pub line_number: u64,
    /// Machine X where the height field was sampled.
    pub x: f64,
    /// Machine Y where the height field was sampled.
    pub y: f64,
    /// The rejected compensated Z.
    pub z: f64,
    /// Lower limit.
    pub z_min: f64,
    /// Upper limit.
    pub z_max: f64,
}

impl BoundsError {
    /// Short error code
    pub fn code(&self) -> &'static str {
        "Z_OUT_OF_BOUNDS"
    }
}

/// Arc parameters that do not describe a constructible arc
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// I/J offsets and an R radius on the same command
    #[error("Arc format mixing error at line {line_number}: G2/G3 commands cannot use R with I or J")]
    MixedArcFormat {
        /// The offending input line.
        line_number: u64,
    },

    /// Neither I/J nor R supplied
    #[error("Arc values missing at line {line_number}: G2/G3 commands need either R or I/J")]
    MissingArcParameters {
        /// The offending input line.
        line_number: u64,
    },

    /// The endpoints are farther apart than the requested diameter
    #[error(
        "Invalid arc radius at line {line_number}: radius {radius:.3} cannot span a chord of {chord:.3}"
    )]
    RadiusTooSmall {
        /// The offending input line.
        line_number: u64,
        /// Requested radius.
        radius: f64,
        /// Distance between the arc endpoints.
        chord: f64,
    },

    /// Radius-defined arc whose endpoints coincide
    #[error("Invalid arc endpoints at line {line_number}: a radius defined arc cannot have identical endpoints")]
    CoincidentEndpoints {
        /// The offending input line.
        line_number: u64,
    },

    /// Arc commanded while a plane other than XY is selected
    #[error("Arc in the {plane} plane at line {line_number} cannot be leveled")]
    UnsupportedPlane {
        /// The offending input line.
        line_number: u64,
        /// Name of the active plane.
        plane: String,
    },
}

impl GeometryError {
    /// Short error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::MixedArcFormat { .. } => "ARC_MIXED_FORMAT",
            Self::MissingArcParameters { .. } => "ARC_MISSING_PARAMETERS",
            Self::RadiusTooSmall { .. } => "ARC_RADIUS_TOO_SMALL",
            Self::CoincidentEndpoints { .. } => "ARC_COINCIDENT_ENDPOINTS",
            Self::UnsupportedPlane { .. } => "ARC_UNSUPPORTED_PLANE",
        }
    }

    /// Input line the error was raised on
    pub fn line_number(&self) -> u64 {
        match self {
            Self::MixedArcFormat { line_number }
            | Self::MissingArcParameters { line_number }
            | Self::RadiusTooSmall { line_number, .. }
            | Self::CoincidentEndpoints { line_number }
            | Self::UnsupportedPlane { line_number, .. } => *line_number,
        }
    }
}

/// Configuration error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A setting holds a value outside its allowed range
    #[error("Invalid setting '{field}': {reason}")]
    InvalidValue {
        /// The setting name.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Configuration file has an unsupported extension
    #[error("Config file must be .json or .toml: {path}")]
    UnsupportedFormat {
        /// The rejected path.
        path: String,
    },

    /// Configuration file could not be parsed or serialized
    #[error("Invalid config: {reason}")]
    Parse {
        /// The parser's message.
        reason: String,
    },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidValue`]
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Short error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidValue { .. } => "CONFIG_INVALID_VALUE",
            Self::UnsupportedFormat { .. } => "CONFIG_UNSUPPORTED_FORMAT",
            Self::Parse { .. } => "CONFIG_PARSE",
        }
    }
}

/// Main error type for GCodeLevel
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Compensated Z outside machine limits
    #[error(transparent)]
    Bounds(#[from] BoundsError),

    /// Unresolvable arc geometry
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Short error code
    pub fn code(&self) -> &'static str {
        match self {
            Error::Bounds(e) => e.code(),
            Error::Geometry(e) => e.code(),
            Error::Config(e) => e.code(),
            Error::Io(_) => "IO",
            Error::Other(_) => "OTHER",
        }
    }

    /// Check if this is a bounds error
    pub fn is_bounds_error(&self) -> bool {
        matches!(self, Error::Bounds(_))
    }

    /// Check if this is a geometry error
    pub fn is_geometry_error(&self) -> bool {
        matches!(self, Error::Geometry(_))
    }

    /// Check if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
