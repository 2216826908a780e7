//! Adaptive path subdivision
//!
//! A straight or circular move that is emitted as a single command follows a
//! linear height profile between its endpoints, while the bed follows the
//! fitted polynomial. The [`PathOptimizer`] measures the squared gap between
//! the two along the path, and wherever it peaks above the threshold it splits
//! the path and recurses on both halves.
//!
//! The result is a list of [`Span`]s, contiguous fractions of the original
//! path in `[0, 1]`.

use crate::grid::CoefficientGrid;
use crate::height_field::{evaluate, HeightField};
use crate::maxima::{Acceptance, Maximizer, MaximizerStrategy, PathMaximizer, Peak};
use gcodelevel_core::Point2;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// A planar path the optimizer can reason about
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    /// Straight chord from `start` to `end`
    Line { start: Point2, end: Point2 },
    /// Circular arc around `center`, starting at `center + arm`, sweeping
    /// `sweep` radians (positive is counter-clockwise)
    Arc {
        center: Point2,
        arm: Point2,
        sweep: f64,
    },
}

impl PathSegment {
    pub fn line(start: Point2, end: Point2) -> Self {
        Self::Line { start, end }
    }

    /// Arc starting at `start` around `center`
    pub fn arc(center: Point2, start: Point2, sweep: f64) -> Self {
        Self::Arc {
            center,
            arm: start - center,
            sweep,
        }
    }

    pub fn start(&self) -> Point2 {
        self.position(0.0)
    }

    pub fn end(&self) -> Point2 {
        self.position(1.0)
    }

    /// Point at parameter `q`
    pub fn position(&self, q: f64) -> Point2 {
        match *self {
            Self::Line { start, end } => start.lerp(&end, q),
            Self::Arc { center, arm, sweep } => center + arm.rotate(q * sweep),
        }
    }

    /// `dp/dq`
    pub fn velocity(&self, q: f64) -> Point2 {
        match *self {
            Self::Line { start, end } => end - start,
            Self::Arc { arm, sweep, .. } => arm.rotate(q * sweep).perp() * sweep,
        }
    }

    /// `d²p/dq²`
    pub fn acceleration(&self, q: f64) -> Point2 {
        match *self {
            Self::Line { .. } => Point2::zero(),
            Self::Arc { arm, sweep, .. } => arm.rotate(q * sweep) * -(sweep * sweep),
        }
    }

    /// Travel length in the XY plane
    pub fn length(&self) -> f64 {
        match *self {
            Self::Line { start, end } => start.distance_to(&end),
            Self::Arc { arm, sweep, .. } => arm.length() * sweep.abs(),
        }
    }

    /// Split at `q` into `[0, q]` and `[q, 1]`
    pub fn split(&self, q: f64) -> (Self, Self) {
        match *self {
            Self::Line { start, end } => {
                let mid = start.lerp(&end, q);
                (Self::line(start, mid), Self::line(mid, end))
            }
            Self::Arc { center, arm, sweep } => (
                Self::Arc {
                    center,
                    arm,
                    sweep: q * sweep,
                },
                Self::Arc {
                    center,
                    arm: arm.rotate(q * sweep),
                    sweep: (1.0 - q) * sweep,
                },
            ),
        }
    }

    /// Same path traversed backwards
    pub fn reversed(&self) -> Self {
        match *self {
            Self::Line { start, end } => Self::line(end, start),
            Self::Arc { center, arm, sweep } => Self::Arc {
                center,
                arm: arm.rotate(sweep),
                sweep: -sweep,
            },
        }
    }
}

/// Fraction `[start, end]` of the original path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub start: f64,
    pub end: f64,
}

impl Span {
    pub const FULL: Span = Span {
        start: 0.0,
        end: 1.0,
    };

    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Global parameter for local `q ∈ [0, 1]`
    pub fn at(&self, q: f64) -> f64 {
        self.start + (self.end - self.start) * q
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

/// Height error of a single-command move along `segment`
///
/// `r(q) = h(p(q)) - h(p(0)) - trend · q`, where the trend is the linear height
/// change the controller interpolates. For lines the trend is folded into the
/// linear coefficients; for arcs it stays explicit because the profile is
/// linear in angle rather than in XY.
#[derive(Debug, Clone)]
pub struct Residual {
    field: HeightField,
    segment: PathSegment,
    trend: f64,
}

impl Residual {
    pub fn new(grid: &CoefficientGrid, segment: PathSegment) -> Self {
        let start = segment.start();
        let end = segment.end();
        let rise = evaluate(grid, end.x, end.y) - evaluate(grid, start.x, start.y);

        match segment {
            PathSegment::Line { .. } => {
                let mut adjusted = grid.padded(2, 2);
                let chord = end - start;
                let magnitude = chord.length();
                if let Some(n) = chord.normalized() {
                    adjusted.add(1, 0, -n.x * rise / magnitude);
                    adjusted.add(0, 1, -n.y * rise / magnitude);
                }
                let offset = evaluate(&adjusted, start.x, start.y);
                adjusted.add(0, 0, -offset);
                Self {
                    field: HeightField::new(adjusted),
                    segment,
                    trend: 0.0,
                }
            }
            PathSegment::Arc { .. } => {
                let mut adjusted = grid.padded(1, 1);
                adjusted.add(0, 0, -evaluate(grid, start.x, start.y));
                Self {
                    field: HeightField::new(adjusted),
                    segment,
                    trend: rise,
                }
            }
        }
    }

    pub fn segment(&self) -> &PathSegment {
        &self.segment
    }

    /// `r(q)`
    pub fn value(&self, q: f64) -> f64 {
        self.field.height(self.segment.position(q)) - self.trend * q
    }

    /// `r'(q) = ∇h · p' - trend`
    pub fn slope(&self, q: f64) -> f64 {
        let p = self.segment.position(q);
        self.field.gradient(p).dot(&self.segment.velocity(q)) - self.trend
    }

    /// `r''(q) = p'ᵀ H p' + ∇h · p''`
    pub fn curvature(&self, q: f64) -> f64 {
        let p = self.segment.position(q);
        let v = self.segment.velocity(q);
        self.field.hessian(p).quadratic_form(v)
            + self.field.gradient(p).dot(&self.segment.acceleration(q))
    }

    /// Squared deviation `r²`
    pub fn deviation(&self, q: f64) -> f64 {
        let r = self.value(q);
        r * r
    }

    /// `2 r r'`
    pub fn deviation_slope(&self, q: f64) -> f64 {
        2.0 * self.value(q) * self.slope(q)
    }

    /// `2 r'² + 2 r r''`
    pub fn deviation_curvature(&self, q: f64) -> f64 {
        let r1 = self.slope(q);
        2.0 * r1 * r1 + 2.0 * self.value(q) * self.curvature(q)
    }
}

/// Optimizer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Squared height error that triggers a split
    pub threshold: f64,
    /// Minimum distance of a split from either end, as a path fraction
    pub telos: f64,
    /// Maximum search strategy
    pub strategy: MaximizerStrategy,
    /// Recursion limit
    pub max_depth: usize,
    /// Paths shorter than this are never split further
    pub min_span: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            threshold: 0.005,
            telos: 0.01,
            strategy: MaximizerStrategy::default(),
            max_depth: 16,
            min_span: 0.01,
        }
    }
}

/// Recursive subdivider driven by a [`PathMaximizer`]
#[derive(Debug, Clone)]
pub struct PathOptimizer<M = Maximizer> {
    maximizer: M,
    max_depth: usize,
    min_span: f64,
}

impl PathOptimizer<Maximizer> {
    pub fn new(config: &OptimizerConfig) -> Self {
        Self::with_maximizer(
            Maximizer::new(
                config.strategy.clone(),
                Acceptance::new(config.threshold, config.telos),
            ),
            config.max_depth,
            config.min_span,
        )
    }
}

impl Default for PathOptimizer<Maximizer> {
    fn default() -> Self {
        Self::new(&OptimizerConfig::default())
    }
}

impl<M: PathMaximizer> PathOptimizer<M> {
    pub fn with_maximizer(maximizer: M, max_depth: usize, min_span: f64) -> Self {
        Self {
            maximizer,
            max_depth,
            min_span,
        }
    }

    /// Largest acceptable deviation peak on `segment`, if any
    pub fn find_breakpoint(&self, grid: &CoefficientGrid, segment: &PathSegment) -> Option<Peak> {
        let residual = Residual::new(grid, *segment);
        self.maximizer.maximize(
            &|q| residual.deviation(q),
            &|q| residual.deviation_slope(q),
            &|q| residual.deviation_curvature(q),
        )
    }

    /// Split `segment` until no accepted deviation peak remains
    ///
    /// Always returns at least one span; the spans are ordered and cover
    /// `[0, 1]` without gaps.
    pub fn subdivide(&self, grid: &CoefficientGrid, segment: &PathSegment) -> Vec<Span> {
        let mut spans = Vec::new();
        self.subdivide_into(grid, segment, Span::FULL, 0, &mut spans);
        if spans.len() > 1 {
            debug!(
                "Split {:.3}mm path into {} pieces",
                segment.length(),
                spans.len()
            );
        }
        spans
    }

    fn subdivide_into(
        &self,
        grid: &CoefficientGrid,
        segment: &PathSegment,
        span: Span,
        depth: usize,
        out: &mut Vec<Span>,
    ) {
        if depth < self.max_depth && segment.length() >= self.min_span {
            if let Some(peak) = self.find_breakpoint(grid, segment) {
                trace!(
                    "Deviation {:.5} at q={:.4} (depth {})",
                    peak.value,
                    peak.q,
                    depth
                );
                let (head, tail) = segment.split(peak.q);
                let mid = span.at(peak.q);
                self.subdivide_into(grid, &head, Span::new(span.start, mid), depth + 1, out);
                self.subdivide_into(grid, &tail, Span::new(mid, span.end), depth + 1, out);
                return;
            }
        }
        out.push(span);
    }
}
