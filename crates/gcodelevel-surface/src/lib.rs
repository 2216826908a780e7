//! # GCodeLevel Surface
//!
//! Bed surface modelling for GCodeLevel.
//! Fits probed calibration heights to a 2D polynomial, evaluates the
//! resulting height field with its analytic derivatives, and decides where a
//! move must be split so that its linear height interpolation stays close to
//! the surface.

pub mod fit;
pub mod grid;
pub mod height_field;
pub mod maxima;
pub mod optimizer;

pub use fit::{fit, SurfaceFitter};
pub use grid::CoefficientGrid;
pub use height_field::{derivative, evaluate, Axis, HeightField, Hessian};
pub use maxima::{Acceptance, Maximizer, MaximizerStrategy, PathMaximizer, Peak};
pub use optimizer::{OptimizerConfig, PathOptimizer, PathSegment, Residual, Span};
