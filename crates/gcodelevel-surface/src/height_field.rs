//! Height field evaluation
//!
//! Evaluates a coefficient grid and its analytic partial derivatives. The
//! optimizer needs the value, gradient and Hessian of the residual height
//! along a path, so [`HeightField`] precomputes the five derivative grids once.

use crate::grid::CoefficientGrid;
use gcodelevel_core::Point2;

/// Differentiation axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// ∂/∂x, shrinks the grid by one row
    X,
    /// ∂/∂y, shrinks the grid by one column
    Y,
}

/// Evaluate `Σ c[r][c] · x^r · y^c`, zero for an empty grid
pub fn evaluate(grid: &CoefficientGrid, x: f64, y: f64) -> f64 {
    let mut acc = 0.0;
    for r in (0..grid.rows()).rev() {
        let mut row = 0.0;
        for c in (0..grid.cols()).rev() {
            row = row * y + grid.get(r, c);
        }
        acc = acc * x + row;
    }
    acc
}

/// Analytic partial derivative of the polynomial
///
/// Each coefficient is multiplied by its exponent along `axis` and the lowest
/// row (or column) is dropped, so a grid of one row differentiates along X to
/// an empty grid.
pub fn derivative(grid: &CoefficientGrid, axis: Axis) -> CoefficientGrid {
    let (rows, cols) = grid.shape();
    match axis {
        Axis::X => {
            let mut out = CoefficientGrid::zeros(rows.saturating_sub(1), cols);
            for (r, c, v) in grid.iter().filter(|(r, _, _)| *r > 0) {
                out.set(r - 1, c, v * r as f64);
            }
            out
        }
        Axis::Y => {
            let mut out = CoefficientGrid::zeros(rows, cols.saturating_sub(1));
            for (r, c, v) in grid.iter().filter(|(_, c, _)| *c > 0) {
                out.set(r, c - 1, v * c as f64);
            }
            out
        }
    }
}

/// Second partial derivatives at a point
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Hessian {
    /// ∂²h/∂x²
    pub xx: f64,
    /// ∂²h/∂y²
    pub yy: f64,
    /// ∂²h/∂x∂y
    pub xy: f64,
}

impl Hessian {
    /// Quadratic form `vᵀ H v`
    pub fn quadratic_form(&self, v: Point2) -> f64 {
        self.xx * v.x * v.x + 2.0 * self.xy * v.x * v.y + self.yy * v.y * v.y
    }
}

/// A coefficient grid together with its first and second partial derivatives
#[derive(Debug, Clone)]
pub struct HeightField {
    grid: CoefficientGrid,
    dx: CoefficientGrid,
    dy: CoefficientGrid,
    dxx: CoefficientGrid,
    dyy: CoefficientGrid,
    dxy: CoefficientGrid,
}

impl HeightField {
    pub fn new(grid: CoefficientGrid) -> Self {
        let dx = derivative(&grid, Axis::X);
        let dy = derivative(&grid, Axis::Y);
        let dxx = derivative(&dx, Axis::X);
        let dyy = derivative(&dy, Axis::Y);
        let dxy = derivative(&dx, Axis::Y);
        Self {
            grid,
            dx,
            dy,
            dxx,
            dyy,
            dxy,
        }
    }

    pub fn grid(&self) -> &CoefficientGrid {
        &self.grid
    }

    pub fn height(&self, p: Point2) -> f64 {
        evaluate(&self.grid, p.x, p.y)
    }

    pub fn gradient(&self, p: Point2) -> Point2 {
        Point2::new(evaluate(&self.dx, p.x, p.y), evaluate(&self.dy, p.x, p.y))
    }

    pub fn hessian(&self, p: Point2) -> Hessian {
        Hessian {
            xx: evaluate(&self.dxx, p.x, p.y),
            yy: evaluate(&self.dyy, p.x, p.y),
            xy: evaluate(&self.dxy, p.x, p.y),
        }
    }
}

impl From<CoefficientGrid> for HeightField {
    fn from(grid: CoefficientGrid) -> Self {
        Self::new(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: Vec<Vec<f64>>) -> CoefficientGrid {
        CoefficientGrid::from_rows(rows).unwrap()
    }

    #[test]
    fn test_evaluate_empty_grid_is_zero() {
        assert_eq!(evaluate(&CoefficientGrid::zeros(0, 3), 4.0, 5.0), 0.0);
    }

    #[test]
    fn test_evaluate_mixed_terms() {
        // 1 + 2y + 3x + 4xy
        let g = grid(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(evaluate(&g, 2.0, 5.0), 1.0 + 10.0 + 6.0 + 40.0);
    }

    #[test]
    fn test_derivative_drops_constant_row() {
        // 1 + 3x + 5x²
        let g = grid(vec![vec![1.0], vec![3.0], vec![5.0]]);
        let d = derivative(&g, Axis::X);
        assert_eq!(d.shape(), (2, 1));
        assert_eq!(d.get(0, 0), 3.0);
        assert_eq!(d.get(1, 0), 10.0);

        let dy = derivative(&g, Axis::Y);
        assert!(dy.is_empty());
        assert_eq!(evaluate(&dy, 1.0, 1.0), 0.0);
    }

    #[test]
    fn test_hessian_of_saddle() {
        // h = x·y
        let field = HeightField::new(grid(vec![vec![0.0, 0.0], vec![0.0, 1.0]]));
        let p = Point2::new(3.0, -2.0);
        assert_eq!(field.height(p), -6.0);
        assert_eq!(field.gradient(p), Point2::new(-2.0, 3.0));
        let h = field.hessian(p);
        assert_eq!((h.xx, h.yy, h.xy), (0.0, 0.0, 1.0));
        assert_eq!(h.quadratic_form(Point2::new(1.0, 1.0)), 2.0);
    }
}
