//! Homogeneous coordinate systems: rigid 2-D frames as 3×3 matrices, and
//! the transforms between them.

use nalgebra::Vector3;

use super::{
    Mat3, Vec2,
    tolerance::tol_zero,
};

/// Frame with origin `origin` and x-axis pointing from `origin` toward
/// `toward`. Falls back to the unit x-axis when the two points coincide.
pub fn make_hcs(origin: Vec2, toward: Vec2) -> Mat3 {
    let d = toward - origin;
    let u = if tol_zero(d.norm()) { Vec2::new(1.0, 0.0) } else { d.normalize() };
    Mat3::new(
        u.x, -u.y, origin.x, //
        u.y, u.x, origin.y, //
        0.0, 0.0, 1.0,
    )
}

/// Transform mapping coordinates expressed in the `from` frame onto the
/// `to` frame.
pub fn cs_transform_matrix(from: &Mat3, to: &Mat3) -> Mat3 {
    to * rigid_inverse(from)
}

/// Inverse of a rigid frame: the basis is orthonormal, so the inverse is
/// the transposed rotation with a back-rotated translation.
fn rigid_inverse(m: &Mat3) -> Mat3 {
    let (r00, r01, tx) = (m[(0, 0)], m[(0, 1)], m[(0, 2)]);
    let (r10, r11, ty) = (m[(1, 0)], m[(1, 1)], m[(1, 2)]);
    Mat3::new(
        r00, r10, -(r00 * tx + r10 * ty), //
        r01, r11, -(r01 * tx + r11 * ty), //
        0.0, 0.0, 1.0,
    )
}

/// Apply a homogeneous transform to a point.
pub fn transform_point(t: &Mat3, p: &Vec2) -> Vec2 {
    let h = t * Vector3::new(p.x, p.y, 1.0);
    Vec2::new(h.x / h.z, h.y / h.z)
}

#[cfg(test)]
mod tests {
    use super::super::{distance_2p, tolerance::tol_zero};
    use super::*;

    #[test]
    fn identity_frame() {
        let cs = make_hcs(Vec2::zeros(), Vec2::new(1.0, 0.0));
        assert_eq!(cs, Mat3::identity());
    }

    #[test]
    fn frame_carries_origin_and_axis() {
        let cs = make_hcs(Vec2::new(2.0, 1.0), Vec2::new(2.0, 3.0));
        // origin maps to (2, 1), unit x to the frame's y-direction axis
        let o = transform_point(&cs, &Vec2::zeros());
        let x = transform_point(&cs, &Vec2::new(1.0, 0.0));
        assert!(tol_zero(distance_2p(&o, &Vec2::new(2.0, 1.0))));
        assert!(tol_zero(distance_2p(&x, &Vec2::new(2.0, 2.0))));
    }

    #[test]
    fn transform_between_frames_aligns_points() {
        let from = make_hcs(Vec2::new(1.0, 1.0), Vec2::new(2.0, 2.0));
        let to = make_hcs(Vec2::new(-3.0, 0.5), Vec2::new(-4.0, 0.5));
        let t = cs_transform_matrix(&from, &to);

        // the from-frame origin lands on the to-frame origin
        let p = transform_point(&t, &Vec2::new(1.0, 1.0));
        assert!(tol_zero(distance_2p(&p, &Vec2::new(-3.0, 0.5))));
    }

    #[test]
    fn rigid_inverse_round_trips() {
        let cs = make_hcs(Vec2::new(4.0, -2.0), Vec2::new(5.0, 7.0));
        let t = cs_transform_matrix(&cs, &Mat3::identity());
        let p = Vec2::new(0.25, -1.5);
        let back = transform_point(&cs, &transform_point(&t, &p));
        assert!(tol_zero(distance_2p(&back, &p)));
    }

    #[test]
    fn degenerate_frame_uses_unit_axis() {
        let o = Vec2::new(3.0, 3.0);
        let cs = make_hcs(o, o);
        let x = transform_point(&cs, &Vec2::new(1.0, 0.0));
        assert!(tol_zero(distance_2p(&x, &Vec2::new(4.0, 3.0))));
    }
}
