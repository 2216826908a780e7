use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gcodelevel_core::{CalibrationSample, Point2};
use gcodelevel_surface::{fit, OptimizerConfig, PathOptimizer, PathSegment};
use std::f64::consts::PI;

fn probe_grid() -> Vec<CalibrationSample> {
    let mut samples = Vec::new();
    for i in 0..7 {
        for j in 0..7 {
            let (x, y) = (i as f64 * 40.0, j as f64 * 40.0);
            let z = 0.05 + 0.0004 * x - 0.0003 * y + 2e-6 * x * y - 1e-6 * x * x;
            samples.push(CalibrationSample::new(x, y, z));
        }
    }
    samples
}

fn bench_fit(c: &mut Criterion) {
    let samples = probe_grid();
    c.bench_function("fit_2x2_49_samples", |b| {
        b.iter(|| fit(black_box(&samples), 2, 2))
    });
}

fn bench_subdivide(c: &mut Criterion) {
    let grid = fit(&probe_grid(), 2, 2);
    let optimizer = PathOptimizer::new(&OptimizerConfig::default());
    let line = PathSegment::line(Point2::new(5.0, 5.0), Point2::new(235.0, 190.0));
    let arc = PathSegment::arc(Point2::new(120.0, 120.0), Point2::new(220.0, 120.0), 1.5 * PI);

    c.bench_function("subdivide_line", |b| {
        b.iter(|| optimizer.subdivide(black_box(&grid), black_box(&line)))
    });
    c.bench_function("subdivide_arc", |b| {
        b.iter(|| optimizer.subdivide(black_box(&grid), black_box(&arc)))
    });
}

criterion_group!(benches, bench_fit, bench_subdivide);
criterion_main!(benches);
