//! 2-D geometry support: points, homogeneous coordinate systems and the
//! tolerance-guarded predicates the solver core consumes.

pub mod hcs;
pub mod predicates;
pub mod tolerance;

pub use hcs::{cs_transform_matrix, make_hcs, transform_point};
pub use predicates::{is_acute, is_clockwise, is_counterclockwise, is_obtuse};

use nalgebra::{Matrix3, Vector2};

pub type Vec2 = Vector2<f64>;
pub type Mat3 = Matrix3<f64>;

/// Euclidean distance between two points.
pub fn distance_2p(a: &Vec2, b: &Vec2) -> f64 {
    (b - a).norm()
}
