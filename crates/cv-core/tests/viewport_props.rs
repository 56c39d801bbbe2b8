use cv_core::compute_range;
use proptest::prelude::*;

proptest! {
    #[test]
    fn computed_range_contains_input_box(
        xmin in -1.0e4_f64..1.0e4,
        dx in 1.0e-3_f64..1.0e4,
        ymin in -1.0e4_f64..1.0e4,
        dy in 1.0e-3_f64..1.0e4,
        aspect in 0.05_f64..20.0,
    ) {
        let (xmax, ymax) = (xmin + dx, ymin + dy);
        let r = compute_range(xmin, xmax, ymin, ymax, aspect);
        prop_assert!(r.contains_box(xmin, xmax, ymin, ymax));
    }

    #[test]
    fn collapsed_box_keeps_positive_area_at_any_offset(
        x in -1.0e12_f64..1.0e12,
        y in -1.0e12_f64..1.0e12,
        aspect in 0.05_f64..20.0,
    ) {
        let r = compute_range(x, x, y, y, aspect);
        prop_assert!(r.width() > 0.0, "width {} at x={}", r.width(), x);
        prop_assert!(r.height() > 0.0, "height {} at y={}", r.height(), y);
        prop_assert!(r.contains_box(x, x, y, y));
    }

    #[test]
    fn only_one_axis_is_padded(
        xmin in -100.0_f64..100.0,
        dx in 0.1_f64..100.0,
        ymin in -100.0_f64..100.0,
        dy in 0.1_f64..100.0,
        aspect in 0.1_f64..10.0,
    ) {
        let r = compute_range(xmin, xmin + dx, ymin, ymin + dy, aspect);
        let x_untouched = r.x == [xmin, xmin + dx];
        let y_untouched = r.y == [ymin, ymin + dy];
        prop_assert!(x_untouched || y_untouched);
    }
}
