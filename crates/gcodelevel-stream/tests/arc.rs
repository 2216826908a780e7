use std::f64::consts::TAU;

use gcodelevel_core::Point2;
use gcodelevel_stream::ArcGeometry;
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_offset_arc_ends_at_commanded_point(
        sx in -100.0f64..100.0, sy in -100.0f64..100.0,
        radius in 1.0f64..100.0, heading in 0.0f64..TAU,
        sweep in 0.01f64..(TAU - 0.01),
        clockwise in any::<bool>(),
    ) {
        let start = Point2::new(sx, sy);
        let offset = Point2::new(radius, 0.0).rotate(heading);
        let center = start + offset;
        let signed = if clockwise { -sweep } else { sweep };
        let end = center + (start - center).rotate(signed);

        let arc = ArcGeometry::from_offsets(start, end, offset.x, offset.y, clockwise);
        prop_assert!(arc.position(1.0).distance_to(&end) < 1e-6);
        prop_assert!((arc.sweep - signed).abs() < 1e-6);
        prop_assert!((arc.radius() - radius).abs() < 1e-9);
    }

    #[test]
    fn prop_radius_arc_ends_at_commanded_point(
        sx in -100.0f64..100.0, sy in -100.0f64..100.0,
        chord in 0.1f64..50.0, heading in 0.0f64..TAU,
        stretch in 1.01f64..10.0,
        long_arc in any::<bool>(),
        clockwise in any::<bool>(),
    ) {
        let start = Point2::new(sx, sy);
        let end = start + Point2::new(chord, 0.0).rotate(heading);
        let magnitude = chord / 2.0 * stretch;
        let radius = if long_arc { -magnitude } else { magnitude };

        let arc = ArcGeometry::from_radius(start, end, radius, clockwise, 1).unwrap();
        prop_assert!(arc.position(1.0).distance_to(&end) < 1e-6);
        prop_assert!((arc.radius() - magnitude).abs() < 1e-6);
        prop_assert_eq!(arc.sweep < 0.0, clockwise);
        prop_assert_eq!(arc.sweep.abs() > std::f64::consts::PI, long_arc);
    }
}
