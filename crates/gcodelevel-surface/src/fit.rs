//! Least-squares polynomial surface fitting
//!
//! Builds the normal equations `A·c = Z` for a degree `(Dx, Dy)` polynomial and
//! solves them by Gauss-Jordan reduction with pivot tracking. Coefficient index
//! `k` maps to exponents `(k / (Dy + 1), k % (Dy + 1))`, x-degree major.
//!
//! Columns that never receive a pivot (rank-deficient sample sets, e.g. too
//! few or collinear probe points) get a zero coefficient instead of an error.

use crate::grid::CoefficientGrid;
use gcodelevel_core::CalibrationSample;
use tracing::{debug, warn};

/// Entries no larger than this fraction of the original diagonal count as zero
/// during pivot selection.
pub const PIVOT_TOLERANCE: f64 = 1e-10;

/// Fits calibration samples to a polynomial height field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceFitter {
    x_degree: usize,
    y_degree: usize,
}

impl SurfaceFitter {
    pub fn new(x_degree: usize, y_degree: usize) -> Self {
        Self { x_degree, y_degree }
    }

    pub fn x_degree(&self) -> usize {
        self.x_degree
    }

    pub fn y_degree(&self) -> usize {
        self.y_degree
    }

    /// Number of unknowns `(Dx + 1)(Dy + 1)`
    pub fn term_count(&self) -> usize {
        (self.x_degree + 1) * (self.y_degree + 1)
    }

    /// Exponents `(x, y)` of unknown `k`
    pub fn exponents(&self, k: usize) -> (usize, usize) {
        (k / (self.y_degree + 1), k % (self.y_degree + 1))
    }

    /// Least-squares fit of `samples`
    ///
    /// Non-finite samples are skipped. With no usable samples the result is an
    /// all-zero grid.
    pub fn fit(&self, samples: &[CalibrationSample]) -> CoefficientGrid {
        let usable: Vec<CalibrationSample> = samples
            .iter()
            .filter(|s| s.x.is_finite() && s.y.is_finite() && s.z.is_finite())
            .copied()
            .collect();
        if usable.len() != samples.len() {
            warn!(
                "Ignoring {} non-finite calibration sample(s)",
                samples.len() - usable.len()
            );
        }

        let mut grid = CoefficientGrid::for_degrees(self.x_degree, self.y_degree);
        if usable.is_empty() {
            warn!("No calibration samples; height field is zero");
            return grid;
        }

        let (a, z) = self.normal_equations(&usable);
        let (solution, rank) = solve(a, z);
        if rank < self.term_count() {
            debug!(
                "Normal equations have rank {} of {}; free coefficients set to zero",
                rank,
                self.term_count()
            );
        }

        for (k, value) in solution.into_iter().enumerate() {
            let (r, c) = self.exponents(k);
            grid.set(r, c, value);
        }
        debug!(
            "Fitted {}x{} surface to {} samples",
            self.x_degree,
            self.y_degree,
            usable.len()
        );
        grid
    }

    /// `A[r][c] = Σ x^(xr+xc)·y^(yr+yc)`, `Z[r] = Σ x^xr·y^yr·z`
    fn normal_equations(&self, samples: &[CalibrationSample]) -> (Vec<Vec<f64>>, Vec<f64>) {
        let n = self.term_count();
        let mut a = vec![vec![0.0; n]; n];
        let mut z = vec![0.0; n];
        for (row, z_row) in z.iter_mut().enumerate() {
            let (xr, yr) = self.exponents(row);
            for (col, cell) in a[row].iter_mut().enumerate() {
                let (xc, yc) = self.exponents(col);
                *cell = power_sum(samples, xr + xc, yr + yc, false);
            }
            *z_row = power_sum(samples, xr, yr, true);
        }
        (a, z)
    }
}

/// One-shot fit with the given degrees
pub fn fit(samples: &[CalibrationSample], x_degree: usize, y_degree: usize) -> CoefficientGrid {
    SurfaceFitter::new(x_degree, y_degree).fit(samples)
}

fn power_sum(samples: &[CalibrationSample], x_power: usize, y_power: usize, times_z: bool) -> f64 {
    samples
        .iter()
        .map(|s| {
            let term = s.x.powi(x_power as i32) * s.y.powi(y_power as i32);
            if times_z {
                term * s.z
            } else {
                term
            }
        })
        .sum()
}

/// Solve `A·c = Z` by reduced row echelon form on `[A | Z]`.
///
/// Column `k` pivots on the first row at or below row `k` whose entry exceeds
/// `PIVOT_TOLERANCE · |A[k][k]|`. Unknowns without a pivot are zero. Returns
/// the solution and the number of pivots found.
pub(crate) fn solve(a: Vec<Vec<f64>>, z: Vec<f64>) -> (Vec<f64>, usize) {
    let n = z.len();
    let tolerance: Vec<f64> = (0..n).map(|k| PIVOT_TOLERANCE * a[k][k].abs()).collect();

    let mut aug: Vec<Vec<f64>> = a
        .into_iter()
        .zip(z)
        .map(|(mut row, zv)| {
            row.push(zv);
            row
        })
        .collect();

    let mut pivots = vec![false; n];
    for col in 0..n {
        let Some(found) = (col..n).find(|&row| aug[row][col].abs() > tolerance[col]) else {
            continue;
        };
        aug.swap(col, found);

        let lead = aug[col][col];
        for v in aug[col].iter_mut() {
            *v /= lead;
        }
        let pivot_row = aug[col].clone();
        for (row, values) in aug.iter_mut().enumerate() {
            if row == col {
                continue;
            }
            let factor = values[col];
            if factor != 0.0 {
                for (v, p) in values.iter_mut().zip(&pivot_row) {
                    *v -= factor * p;
                }
            }
        }
        pivots[col] = true;
    }

    let rank = pivots.iter().filter(|p| **p).count();
    let solution = (0..n)
        .map(|k| if pivots[k] { aug[k][n] } else { 0.0 })
        .collect();
    (solution, rank)
}
