//! Orientation and angle-class predicates over point triples.
//!
//! All predicates are strict: degenerate triples (coincident or collinear
//! points, right angles) are neither clockwise nor counter-clockwise,
//! neither obtuse nor acute.

use super::{
    Vec2,
    tolerance::{tol_gt, tol_lt},
};

fn winding(a: &Vec2, b: &Vec2, c: &Vec2) -> f64 {
    (b - a).perp(&(c - b))
}

fn apex_dot(a: &Vec2, b: &Vec2, c: &Vec2) -> f64 {
    (a - b).dot(&(c - b))
}

/// `a`, `b`, `c` wind clockwise.
pub fn is_clockwise(a: &Vec2, b: &Vec2, c: &Vec2) -> bool {
    tol_lt(winding(a, b, c), 0.0)
}

/// `a`, `b`, `c` wind counter-clockwise.
pub fn is_counterclockwise(a: &Vec2, b: &Vec2, c: &Vec2) -> bool {
    tol_gt(winding(a, b, c), 0.0)
}

/// The angle at apex `b` between the rays toward `a` and `c` is obtuse.
pub fn is_obtuse(a: &Vec2, b: &Vec2, c: &Vec2) -> bool {
    tol_lt(apex_dot(a, b, c), 0.0)
}

/// The angle at apex `b` between the rays toward `a` and `c` is acute.
pub fn is_acute(a: &Vec2, b: &Vec2, c: &Vec2) -> bool {
    tol_gt(apex_dot(a, b, c), 0.0)
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn v(x: f64, y: f64) -> Vec2 {
        Vec2::new(x, y)
    }

    #[test_case(v(0.0, 1.0), v(1.0, 0.0), v(0.0, -1.0) => true; "right arc is clockwise")]
    #[test_case(v(0.0, -1.0), v(1.0, 0.0), v(0.0, 1.0) => false; "left arc is not")]
    #[test_case(v(0.0, 0.0), v(1.0, 1.0), v(2.0, 2.0) => false; "collinear is not")]
    #[test_case(v(0.0, 0.0), v(0.0, 0.0), v(0.0, 0.0) => false; "coincident is not")]
    fn clockwise(a: Vec2, b: Vec2, c: Vec2) -> bool {
        is_clockwise(&a, &b, &c)
    }

    #[test_case(v(0.0, -1.0), v(1.0, 0.0), v(0.0, 1.0) => true; "left arc is counter-clockwise")]
    #[test_case(v(0.0, 1.0), v(1.0, 0.0), v(0.0, -1.0) => false; "right arc is not")]
    #[test_case(v(0.0, 0.0), v(0.0, 0.0), v(0.0, 0.0) => false; "coincident is not")]
    fn counterclockwise(a: Vec2, b: Vec2, c: Vec2) -> bool {
        is_counterclockwise(&a, &b, &c)
    }

    #[test_case(v(0.0, 0.0), v(1.0, 0.0), v(2.0, 1.0) => true; "wide angle at apex")]
    #[test_case(v(0.0, 0.0), v(1.0, 0.0), v(0.0, 1.0) => false; "narrow angle at apex")]
    #[test_case(v(0.0, 0.0), v(1.0, 0.0), v(1.0, 1.0) => false; "right angle")]
    fn obtuse(a: Vec2, b: Vec2, c: Vec2) -> bool {
        is_obtuse(&a, &b, &c)
    }

    #[test_case(v(0.0, 0.0), v(1.0, 0.0), v(0.0, 1.0) => true; "narrow angle at apex")]
    #[test_case(v(0.0, 0.0), v(1.0, 0.0), v(2.0, 1.0) => false; "wide angle at apex")]
    #[test_case(v(0.0, 0.0), v(1.0, 0.0), v(1.0, 1.0) => false; "right angle")]
    fn acute(a: Vec2, b: Vec2, c: Vec2) -> bool {
        is_acute(&a, &b, &c)
    }
}
