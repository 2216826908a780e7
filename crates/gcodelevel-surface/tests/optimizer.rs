use gcodelevel_core::Point2;
use gcodelevel_surface::{
    CoefficientGrid, MaximizerStrategy, OptimizerConfig, PathOptimizer, PathSegment, Residual,
    Span,
};
use proptest::prelude::*;
use std::f64::consts::PI;

fn saddle(k: f64) -> CoefficientGrid {
    CoefficientGrid::from_rows(vec![vec![0.0, 0.0], vec![0.0, k]]).unwrap()
}

fn assert_contiguous(spans: &[Span]) {
    assert!(!spans.is_empty());
    assert_eq!(spans[0].start, 0.0);
    assert_eq!(spans[spans.len() - 1].end, 1.0);
    for pair in spans.windows(2) {
        assert_eq!(pair[0].end, pair[1].start);
    }
    assert!(spans.iter().all(|s| s.width() > 0.0));
}

#[test]
fn test_saddle_diagonal_splits_once_at_midpoint() {
    // h = 0.01xy along (0,0)->(10,10) is q², so the deviation peaks at q = 0.5
    // with 0.0625 and each half peaks below the threshold.
    let optimizer = PathOptimizer::new(&OptimizerConfig::default());
    let line = PathSegment::line(Point2::zero(), Point2::new(10.0, 10.0));
    let spans = optimizer.subdivide(&saddle(0.01), &line);

    assert_eq!(spans.len(), 2);
    assert!((spans[0].end - 0.5).abs() < 1e-9);
    assert_contiguous(&spans);
}

/// The part of `segment` covered by `span`, as a path of its own
fn sub_segment(segment: &PathSegment, span: Span) -> PathSegment {
    let (_, tail) = segment.split(span.start);
    let (piece, _) = tail.split(span.width() / (1.0 - span.start));
    piece
}

#[test]
fn test_every_sub_chord_stays_below_threshold() {
    let config = OptimizerConfig::default();
    let optimizer = PathOptimizer::new(&config);
    let cases = [
        (Point2::new(0.0, 0.0), Point2::new(10.0, 10.0), 0.01),
        (Point2::new(2.0, 3.0), Point2::new(14.0, 11.0), 0.02),
        (Point2::new(-20.0, 5.0), Point2::new(30.0, -10.0), 0.01),
        (Point2::new(0.0, -25.0), Point2::new(25.0, 25.0), -0.015),
        (Point2::new(-40.0, -40.0), Point2::new(40.0, 40.0), 0.005),
    ];

    for (start, end, k) in cases {
        let grid = saddle(k);
        let line = PathSegment::line(start, end);
        let spans = optimizer.subdivide(&grid, &line);
        assert!(spans.len() > 1, "saddle {k} from {start:?} should split");
        assert_contiguous(&spans);

        for span in spans {
            let residual = Residual::new(&grid, sub_segment(&line, span));
            let worst = (0..=200)
                .map(|i| residual.deviation(i as f64 / 200.0))
                .fold(0.0, f64::max);
            assert!(
                worst < config.threshold,
                "span {span:?} of saddle {k} deviates by {worst}"
            );
        }
    }
}

#[test]
fn test_reversed_line_splits_symmetrically() {
    let optimizer = PathOptimizer::new(&OptimizerConfig::default());
    let line = PathSegment::line(Point2::new(2.0, 3.0), Point2::new(14.0, 11.0));
    let grid = saddle(0.02);

    let forward = optimizer.subdivide(&grid, &line);
    let backward = optimizer.subdivide(&grid, &line.reversed());
    assert_eq!(forward.len(), backward.len());
    for (f, b) in forward.iter().zip(backward.iter().rev()) {
        assert!((f.start - (1.0 - b.end)).abs() < 1e-6);
        assert!((f.end - (1.0 - b.start)).abs() < 1e-6);
    }
}

#[test]
fn test_gradient_ascent_stalls_on_stationary_midpoint() {
    // 0.5·sin(2πq) deviation vanishes at q = 0.5, where the ascent starts.
    let optimizer = PathOptimizer::new(&OptimizerConfig::default());
    let arc = PathSegment::arc(Point2::zero(), Point2::new(10.0, 0.0), PI);
    assert_eq!(optimizer.subdivide(&saddle(0.01), &arc), vec![Span::FULL]);
}

#[test]
fn test_sampling_strategy_splits_arc() {
    let config = OptimizerConfig {
        strategy: MaximizerStrategy::UniformSampling { samples: 64 },
        ..OptimizerConfig::default()
    };
    let optimizer = PathOptimizer::new(&config);
    let arc = PathSegment::arc(Point2::zero(), Point2::new(10.0, 0.0), PI);
    let spans = optimizer.subdivide(&saddle(0.01), &arc);

    assert!(spans.len() > 1);
    assert_contiguous(&spans);
}

#[test]
fn test_depth_limit_bounds_span_count() {
    let config = OptimizerConfig {
        threshold: 1e-12,
        max_depth: 3,
        ..OptimizerConfig::default()
    };
    let optimizer = PathOptimizer::new(&config);
    let line = PathSegment::line(Point2::zero(), Point2::new(100.0, 100.0));
    let spans = optimizer.subdivide(&saddle(1.0), &line);

    assert!(spans.len() <= 8);
    assert_contiguous(&spans);
}

proptest! {
    #[test]
    fn prop_spans_cover_unit_interval(
        x0 in -50.0f64..50.0, y0 in -50.0f64..50.0,
        x1 in -50.0f64..50.0, y1 in -50.0f64..50.0,
        k in -0.05f64..0.05,
    ) {
        let optimizer = PathOptimizer::new(&OptimizerConfig::default());
        let line = PathSegment::line(Point2::new(x0, y0), Point2::new(x1, y1));
        let spans = optimizer.subdivide(&saddle(k), &line);
        assert_contiguous(&spans);
    }

    #[test]
    fn prop_gentle_surface_is_never_split(
        x0 in -50.0f64..50.0, y0 in -50.0f64..50.0,
        x1 in -50.0f64..50.0, y1 in -50.0f64..50.0,
        a in -1e-6f64..1e-6, b in -1e-6f64..1e-6, c in -1e-6f64..1e-6,
        slope_x in -0.1f64..0.1, slope_y in -0.1f64..0.1,
    ) {
        let grid = CoefficientGrid::from_rows(vec![
            vec![0.2, slope_y, c],
            vec![slope_x, b, 0.0],
            vec![a, 0.0, 0.0],
        ]).unwrap();
        let optimizer = PathOptimizer::new(&OptimizerConfig::default());
        let line = PathSegment::line(Point2::new(x0, y0), Point2::new(x1, y1));
        prop_assert_eq!(optimizer.subdivide(&grid, &line), vec![Span::FULL]);
    }
}
