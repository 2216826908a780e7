//! Polynomial coefficient grid
//!
//! A `CoefficientGrid` with `rows × cols` entries represents
//! `height(x, y) = Σ c[r][c] · x^r · y^c`: the row index is the x exponent and
//! the column index the y exponent. Derivative grids shrink by one row or
//! column and may end up empty, in which case they evaluate to zero.

use gcodelevel_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rectangular table of polynomial coefficients indexed by `(x exponent, y exponent)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientGrid {
    rows: usize,
    cols: usize,
    coeffs: Vec<f64>,
}

impl CoefficientGrid {
    /// All-zero grid of the given shape
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            coeffs: vec![0.0; rows * cols],
        }
    }

    /// All-zero grid for a polynomial of degree `(x_degree, y_degree)`
    pub fn for_degrees(x_degree: usize, y_degree: usize) -> Self {
        Self::zeros(x_degree + 1, y_degree + 1)
    }

    /// Build a grid from row vectors (row = x exponent)
    ///
    /// # Errors
    /// Returns an error if the rows have differing lengths.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != cols) {
            return Err(Error::other("Coefficient rows must all have the same length"));
        }
        let n_rows = rows.len();
        Ok(Self {
            rows: n_rows,
            cols,
            coeffs: rows.into_iter().flatten().collect(),
        })
    }

    /// Number of rows (x exponents 0..rows)
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (y exponents 0..cols)
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// True if the grid holds no coefficients
    pub fn is_empty(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Coefficient of `x^row · y^col`, zero outside the grid
    pub fn get(&self, row: usize, col: usize) -> f64 {
        if row < self.rows && col < self.cols {
            self.coeffs[row * self.cols + col]
        } else {
            0.0
        }
    }

    /// Overwrite a coefficient
    ///
    /// # Panics
    /// Panics if `(row, col)` lies outside the grid.
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        assert!(
            row < self.rows && col < self.cols,
            "coefficient ({row}, {col}) outside {}x{} grid",
            self.rows,
            self.cols
        );
        self.coeffs[row * self.cols + col] = value;
    }

    /// Add `delta` to a coefficient
    ///
    /// # Panics
    /// Panics if `(row, col)` lies outside the grid.
    pub fn add(&mut self, row: usize, col: usize, delta: f64) {
        let current = self.get(row, col);
        self.set(row, col, current + delta);
    }

    /// Copy of this grid grown with zeros to at least `min_rows × min_cols`
    pub fn padded(&self, min_rows: usize, min_cols: usize) -> Self {
        let rows = self.rows.max(min_rows);
        let cols = self.cols.max(min_cols);
        if rows == self.rows && cols == self.cols {
            return self.clone();
        }
        let mut out = Self::zeros(rows, cols);
        for (r, c, v) in self.iter() {
            out.set(r, c, v);
        }
        out
    }

    /// Iterate `(row, col, coefficient)` in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        let cols = self.cols;
        self.coeffs
            .iter()
            .enumerate()
            .map(move |(i, &v)| (i / cols, i % cols, v))
    }
}

/// One bracketed line per x exponent
impl fmt::Display for CoefficientGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.rows {
            let cells: Vec<String> = (0..self.cols)
                .map(|c| format!("{:.6e}", self.get(r, c)))
                .collect();
            writeln!(f, "[{}]", cells.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_degrees_shape() {
        let grid = CoefficientGrid::for_degrees(3, 2);
        assert_eq!(grid.shape(), (4, 3));
        assert!(grid.iter().all(|(_, _, v)| v == 0.0));
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        assert!(CoefficientGrid::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).is_err());
        let grid = CoefficientGrid::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(grid.get(1, 0), 3.0);
        assert_eq!(grid.get(5, 5), 0.0);
    }

    #[test]
    fn test_padded_keeps_coefficients() {
        let grid = CoefficientGrid::from_rows(vec![vec![7.0]]).unwrap();
        let padded = grid.padded(2, 2);
        assert_eq!(padded.shape(), (2, 2));
        assert_eq!(padded.get(0, 0), 7.0);
        assert_eq!(padded.get(1, 1), 0.0);
    }

    #[test]
    fn test_display_one_line_per_x_exponent() {
        let grid = CoefficientGrid::from_rows(vec![vec![1.0, 0.5], vec![-2.0, 0.0]]).unwrap();
        assert_eq!(
            grid.to_string(),
            "[1.000000e0, 5.000000e-1]\n[-2.000000e0, 0.000000e0]\n"
        );
    }

    #[test]
    fn test_json_keeps_shape_and_row_major_order() {
        let grid =
            CoefficientGrid::from_rows(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        let json = serde_json::to_string(&grid).unwrap();
        assert_eq!(json, r#"{"rows":2,"cols":3,"coeffs":[1.0,2.0,3.0,4.0,5.0,6.0]}"#);
        let back: CoefficientGrid = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(1, 0), 4.0);
        assert_eq!(back, grid);
    }
}
