use gcodelevel_core::CalibrationSample;
use gcodelevel_surface::{evaluate, fit, SurfaceFitter};

fn grid_samples(f: impl Fn(f64, f64) -> f64, coords: &[f64]) -> Vec<CalibrationSample> {
    let mut samples = Vec::new();
    for &x in coords {
        for &y in coords {
            samples.push(CalibrationSample::new(x, y, f(x, y)));
        }
    }
    samples
}

#[test]
fn test_constant_fit_from_single_sample() {
    let grid = fit(&[CalibrationSample::new(12.0, 34.0, 0.42)], 0, 0);
    assert_eq!(grid.shape(), (1, 1));
    assert!((grid.get(0, 0) - 0.42).abs() < 1e-12);
    assert!((evaluate(&grid, -100.0, 250.0) - 0.42).abs() < 1e-12);
}

#[test]
fn test_plane_is_recovered_exactly() {
    let plane = |x: f64, y: f64| 0.5 + 0.01 * x - 0.02 * y;
    let samples = grid_samples(plane, &[0.0, 10.0, 20.0, 30.0]);
    let grid = SurfaceFitter::new(1, 1).fit(&samples);

    assert!((grid.get(0, 0) - 0.5).abs() < 1e-9);
    assert!((grid.get(1, 0) - 0.01).abs() < 1e-9);
    assert!((grid.get(0, 1) + 0.02).abs() < 1e-9);
    assert!(grid.get(1, 1).abs() < 1e-9);
}

#[test]
fn test_quadratic_surface_is_interpolated() {
    let surface = |x: f64, y: f64| 1.0 + 0.1 * x - 0.05 * y + 0.01 * x * y + 0.002 * x * x;
    let samples = grid_samples(surface, &[-2.0, -1.0, 0.0, 1.0, 2.0]);
    let grid = fit(&samples, 2, 2);

    for (x, y) in [(0.5, 0.5), (-1.5, 1.2), (1.9, -1.9)] {
        assert!((evaluate(&grid, x, y) - surface(x, y)).abs() < 1e-6);
    }
}

#[test]
fn test_rank_deficient_fit_zero_fills() {
    // All samples share x = 5: the x coefficient is unobservable.
    let samples = vec![
        CalibrationSample::new(5.0, 0.0, 1.0),
        CalibrationSample::new(5.0, 10.0, 2.0),
        CalibrationSample::new(5.0, 20.0, 3.0),
    ];
    let grid = fit(&samples, 1, 0);
    assert_eq!(grid.shape(), (2, 1));
    assert!((grid.get(0, 0) - 2.0).abs() < 1e-9);
    assert_eq!(grid.get(1, 0), 0.0);
}

#[test]
fn test_more_terms_than_samples_still_fits_samples() {
    let samples = vec![CalibrationSample::new(0.0, 0.0, 0.3)];
    let grid = fit(&samples, 2, 2);
    assert!((evaluate(&grid, 0.0, 0.0) - 0.3).abs() < 1e-12);
    assert!(grid.iter().all(|(r, c, v)| (r, c) == (0, 0) || v == 0.0));
}

#[test]
fn test_non_finite_samples_are_ignored() {
    let samples = vec![
        CalibrationSample::new(0.0, 0.0, 1.0),
        CalibrationSample::new(f64::NAN, 0.0, 9.0),
    ];
    let grid = fit(&samples, 0, 0);
    assert!((grid.get(0, 0) - 1.0).abs() < 1e-12);
}
