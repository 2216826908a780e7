//! One-dimensional maximum search over a path parameter `q ∈ [0, 1]`
//!
//! Every strategy sees the same three callbacks (value, first and second
//! derivative) and either reports a peak inside the open interval
//! `(telos, 1 - telos)` whose value reaches the acceptance threshold, or
//! reports nothing. Gradient ascent is the default.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// An accepted maximum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    /// Path parameter of the maximum
    pub q: f64,
    /// Function value at `q`
    pub value: f64,
}

/// Contract shared by all maximizers
pub trait PathMaximizer {
    /// Look for an acceptable maximum of `value` on `(0, 1)`
    fn maximize(
        &self,
        value: &dyn Fn(f64) -> f64,
        first: &dyn Fn(f64) -> f64,
        second: &dyn Fn(f64) -> f64,
    ) -> Option<Peak>;
}

/// Acceptance window for a peak
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Acceptance {
    /// Minimum value a peak must reach
    pub threshold: f64,
    /// Peaks closer than this to either end are rejected
    pub telos: f64,
}

impl Acceptance {
    pub fn new(threshold: f64, telos: f64) -> Self {
        Self { threshold, telos }
    }

    /// Strictly inside `(telos, 1 - telos)`
    pub fn contains(&self, q: f64) -> bool {
        q > self.telos && q < 1.0 - self.telos
    }

    /// Accept `q` if it is inside the window and its value reaches the threshold
    pub fn accept(&self, q: f64, value: &dyn Fn(f64) -> f64) -> Option<Peak> {
        if !q.is_finite() || !self.contains(q) {
            return None;
        }
        let v = value(q);
        (v >= self.threshold).then_some(Peak { q, value: v })
    }
}

impl Default for Acceptance {
    fn default() -> Self {
        Self::new(0.005, 0.01)
    }
}

/// Search strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaximizerStrategy {
    /// Fixed-step gradient ascent from `start`
    GradientAscent {
        start: f64,
        step: f64,
        slope_epsilon: f64,
        max_iterations: usize,
    },
    /// Gradient ascent whose step shrinks by `e^-iteration`
    DecayingGradientAscent {
        start: f64,
        step: f64,
        slope_epsilon: f64,
        max_iterations: usize,
    },
    /// Best of `samples` evenly spaced evaluations
    UniformSampling { samples: usize },
    /// Best of `samples` seeded random evaluations
    RandomSampling { samples: usize, seed: u64 },
    /// Newton iteration on the first derivative
    Newton {
        start: f64,
        slope_epsilon: f64,
        max_iterations: usize,
    },
}

impl Default for MaximizerStrategy {
    fn default() -> Self {
        Self::GradientAscent {
            start: 0.5,
            step: 10.0,
            slope_epsilon: 1e-5,
            max_iterations: 200,
        }
    }
}

impl MaximizerStrategy {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::GradientAscent { .. } => "gradient_ascent",
            Self::DecayingGradientAscent { .. } => "decaying_gradient_ascent",
            Self::UniformSampling { .. } => "uniform_sampling",
            Self::RandomSampling { .. } => "random_sampling",
            Self::Newton { .. } => "newton",
        }
    }
}

/// A strategy bound to an acceptance window
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Maximizer {
    pub strategy: MaximizerStrategy,
    pub acceptance: Acceptance,
}

impl Maximizer {
    pub fn new(strategy: MaximizerStrategy, acceptance: Acceptance) -> Self {
        Self {
            strategy,
            acceptance,
        }
    }

    fn ascend(
        &self,
        first: &dyn Fn(f64) -> f64,
        start: f64,
        step: f64,
        slope_epsilon: f64,
        max_iterations: usize,
        decay: bool,
    ) -> f64 {
        let mut q = start;
        let mut slope = f64::INFINITY;
        let mut iteration = 0;
        while slope.abs() > slope_epsilon
            && self.acceptance.contains(q)
            && iteration < max_iterations
        {
            slope = first(q);
            let rate = if decay {
                step * (-(iteration as f64)).exp()
            } else {
                step
            };
            q += slope * rate;
            iteration += 1;
        }
        q
    }

    fn best_of(
        &self,
        value: &dyn Fn(f64) -> f64,
        candidates: impl Iterator<Item = f64>,
    ) -> Option<Peak> {
        candidates
            .filter_map(|q| self.acceptance.accept(q, value))
            .fold(None, |best: Option<Peak>, peak| match best {
                Some(b) if b.value >= peak.value => Some(b),
                _ => Some(peak),
            })
    }
}

impl PathMaximizer for Maximizer {
    fn maximize(
        &self,
        value: &dyn Fn(f64) -> f64,
        first: &dyn Fn(f64) -> f64,
        second: &dyn Fn(f64) -> f64,
    ) -> Option<Peak> {
        match self.strategy {
            MaximizerStrategy::GradientAscent {
                start,
                step,
                slope_epsilon,
                max_iterations,
            } => {
                let q = self.ascend(first, start, step, slope_epsilon, max_iterations, false);
                self.acceptance.accept(q, value)
            }
            MaximizerStrategy::DecayingGradientAscent {
                start,
                step,
                slope_epsilon,
                max_iterations,
            } => {
                let q = self.ascend(first, start, step, slope_epsilon, max_iterations, true);
                self.acceptance.accept(q, value)
            }
            MaximizerStrategy::UniformSampling { samples } => {
                let n = samples.max(1);
                self.best_of(value, (0..n).map(|i| i as f64 / n as f64))
            }
            MaximizerStrategy::RandomSampling { samples, seed } => {
                let mut rng = StdRng::seed_from_u64(seed);
                let candidates: Vec<f64> =
                    (0..samples).map(|_| rng.random_range(0.0..1.0)).collect();
                self.best_of(value, candidates.into_iter())
            }
            MaximizerStrategy::Newton {
                start,
                slope_epsilon,
                max_iterations,
            } => {
                let mut q = start;
                for _ in 0..max_iterations {
                    let slope = first(q);
                    if slope.abs() <= slope_epsilon {
                        break;
                    }
                    let curvature = second(q);
                    if curvature == 0.0 {
                        break;
                    }
                    q -= slope / curvature;
                    if !q.is_finite() {
                        return None;
                    }
                }
                // Newton converges to any critical point; only maxima count.
                if second(q) > 0.0 {
                    return None;
                }
                self.acceptance.accept(q, value)
            }
        }
    }
}
