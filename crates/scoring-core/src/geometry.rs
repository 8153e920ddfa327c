//! Planar geometry on normalized keypoint coordinates.

/// A 2D point in normalized frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Point halfway between two points.
    pub fn midpoint(a: &Point2D, b: &Point2D) -> Point2D {
        Point2D {
            x: (a.x + b.x) / 2.0,
            y: (a.y + b.y) / 2.0,
        }
    }
}

/// Angle in degrees at vertex `b` between rays `b -> a` and `b -> c`.
///
/// Always in `[0, 180]`. A zero-length ray yields exactly `180.0`, never NaN.
pub fn angle_at(a: &Point2D, b: &Point2D, c: &Point2D) -> f64 {
    let (abx, aby) = (a.x - b.x, a.y - b.y);
    let (cbx, cby) = (c.x - b.x, c.y - b.y);

    let mag_ab = (abx * abx + aby * aby).sqrt();
    let mag_cb = (cbx * cbx + cby * cby).sqrt();
    if mag_ab == 0.0 || mag_cb == 0.0 {
        return 180.0;
    }

    let cos_theta = ((abx * cbx + aby * cby) / (mag_ab * mag_cb)).clamp(-1.0, 1.0);
    cos_theta.acos().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_distance_and_midpoint() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(0.3, 0.4);
        assert!((a.distance_to(&b) - 0.5).abs() < 1e-12);
        assert_eq!(Point2D::midpoint(&a, &b), Point2D::new(0.15, 0.2));
    }

    #[test]
    fn test_right_angle() {
        let angle = angle_at(
            &Point2D::new(1.0, 0.0),
            &Point2D::new(0.0, 0.0),
            &Point2D::new(0.0, 1.0),
        );
        assert!((angle - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_straight_line_is_180() {
        let angle = angle_at(
            &Point2D::new(0.4, 0.4),
            &Point2D::new(0.5, 0.4),
            &Point2D::new(0.6, 0.4),
        );
        assert!((angle - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_rays_are_exactly_180() {
        let b = Point2D::new(0.5, 0.5);
        let other = Point2D::new(0.1, 0.9);
        assert_eq!(angle_at(&b, &b, &other), 180.0);
        assert_eq!(angle_at(&other, &b, &b), 180.0);
        assert_eq!(angle_at(&b, &b, &b), 180.0);
    }

    fn coord() -> impl Strategy<Value = f64> {
        -2.0f64..2.0
    }

    proptest! {
        #[test]
        fn prop_angle_in_range_and_symmetric(
            ax in coord(), ay in coord(),
            bx in coord(), by in coord(),
            cx in coord(), cy in coord(),
        ) {
            let a = Point2D::new(ax, ay);
            let b = Point2D::new(bx, by);
            let c = Point2D::new(cx, cy);

            let abc = angle_at(&a, &b, &c);
            let cba = angle_at(&c, &b, &a);

            prop_assert!(abc.is_finite());
            prop_assert!((0.0..=180.0).contains(&abc));
            prop_assert!((abc - cba).abs() < 1e-9);
        }

        #[test]
        fn prop_coincident_vertex_is_180(ax in coord(), ay in coord(), cx in coord(), cy in coord()) {
            let a = Point2D::new(ax, ay);
            let c = Point2D::new(cx, cy);
            prop_assert_eq!(angle_at(&a, &a, &c), 180.0);
            prop_assert_eq!(angle_at(&a, &c, &c), 180.0);
        }
    }
}
