//! Property tests for the planar geometry primitive

use gcodelevel_core::Point2;
use proptest::prelude::*;

proptest! {
    #[test]
    fn rotation_preserves_length(
        x in -500.0f64..500.0,
        y in -500.0f64..500.0,
        theta in -10.0f64..10.0,
    ) {
        let p = Point2::new(x, y);
        let r = p.rotate(theta);
        prop_assert!((p.length() - r.length()).abs() < 1e-9);
    }

    #[test]
    fn rotation_inverts(x in -500.0f64..500.0, y in -500.0f64..500.0, theta in -10.0f64..10.0) {
        let p = Point2::new(x, y);
        let back = p.rotate(theta).rotate(-theta);
        prop_assert!(p.distance_to(&back) < 1e-9);
    }

    #[test]
    fn perp_is_orthogonal(x in -500.0f64..500.0, y in -500.0f64..500.0) {
        let p = Point2::new(x, y);
        prop_assert!(p.dot(&p.perp()).abs() < 1e-9);
        prop_assert!(p.cross(&p.perp()) >= 0.0);
    }
}
