//! Point configurations: immutable assignments of coordinates to named
//! points.
//!
//! Configurations are merged by computing the rigid transform that aligns
//! their shared points, and compare equal when one can be rotated and
//! translated onto the other — coordinate identity is deliberately not the
//! equality. The hash covers only the variable-name set, which is exactly
//! what that equality preserves.

use std::{
    collections::BTreeMap,
    hash::{Hash, Hasher},
};

use log::debug;

use crate::{
    Variable, hash_one,
    math::{
        Mat3, Vec2, cs_transform_matrix, distance_2p, make_hcs, transform_point,
        tolerance::{tol_gt, tol_zero},
    },
};

/// An immutable mapping from point variables to plane coordinates.
///
/// Every operation returns a fresh configuration. The `underconstrained`
/// flag marks a configuration that is only one of several possible merge
/// results; it is set by the planner via
/// [`with_underconstrained`](Self::with_underconstrained).
#[derive(Clone, Debug)]
pub struct Configuration<V: Variable> {
    mapping: BTreeMap<V, Vec2>,
    underconstrained: bool,
}

impl<V: Variable> Configuration<V> {
    pub fn new(mapping: impl IntoIterator<Item = (V, Vec2)>) -> Self {
        Configuration { mapping: mapping.into_iter().collect(), underconstrained: false }
    }

    /// Same coordinates with the underconstrained flag replaced.
    pub fn with_underconstrained(mut self, underconstrained: bool) -> Self {
        self.underconstrained = underconstrained;
        self
    }

    pub fn is_underconstrained(&self) -> bool {
        self.underconstrained
    }

    /// Variables, in their `Ord` order.
    pub fn vars(&self) -> impl Iterator<Item = &V> {
        self.mapping.keys()
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    pub fn contains(&self, var: &V) -> bool {
        self.mapping.contains_key(var)
    }

    /// Coordinates of `var`. Panics when the variable is not part of this
    /// configuration; looking up a foreign variable is a bug in the caller.
    pub fn get(&self, var: &V) -> Vec2 {
        match self.mapping.get(var) {
            Some(point) => *point,
            None => panic!("variable {var:?} is not part of this configuration"),
        }
    }

    /// Apply a homogeneous transform to every coordinate.
    pub fn transform(&self, t: &Mat3) -> Self {
        Configuration::new(
            self.mapping.iter().map(|(var, point)| (var.clone(), transform_point(t, point))),
        )
    }

    /// Union of the two configurations. Coordinates already present in
    /// `self` win over `other`'s.
    pub fn add(&self, other: &Configuration<V>) -> Self {
        let mut mapping = self.mapping.clone();
        for (var, point) in &other.mapping {
            mapping.entry(var.clone()).or_insert(*point);
        }
        Configuration { mapping, underconstrained: false }
    }

    /// Restriction to `vars`, which must all be present.
    pub fn select(&self, vars: impl IntoIterator<Item = V>) -> Self {
        Configuration::new(vars.into_iter().map(|var| {
            let point = self.get(&var);
            (var, point)
        }))
    }

    /// This configuration extended with `other`, transformed so that shared
    /// points overlap where possible. The returned flag reports whether the
    /// merge was underconstrained, i.e. more than one rigid placement of
    /// `other` exists.
    pub fn merge(&self, other: &Configuration<V>) -> (Self, bool) {
        debug!(target: "configuration", "merging {:?} with {:?}", self, other);

        let (t, underconstrained) = self.transformation_matrix(other);
        (self.add(&other.transform(&t)), underconstrained)
    }

    /// Transform that aligns `other` onto `self` via their shared
    /// variables, together with the underconstrained flag of the alignment.
    ///
    /// The frame-defining pair is the first two shared variables in their
    /// `Ord` order, so the result is reproducible across runs.
    pub fn transformation_matrix(&self, other: &Configuration<V>) -> (Mat3, bool) {
        let shared: Vec<&V> =
            self.mapping.keys().filter(|var| other.mapping.contains_key(*var)).collect();

        let mut underconstrained = self.underconstrained || other.underconstrained;
        let x_axis = Vec2::new(1.0, 0.0);

        let (cs_self, cs_other) = match shared.as_slice() {
            [] => {
                // nothing to align on
                underconstrained = true;
                (make_hcs(Vec2::zeros(), x_axis), make_hcs(Vec2::zeros(), x_axis))
            }
            [v] => {
                if self.mapping.len() > 1 && other.mapping.len() > 1 {
                    underconstrained = true;
                }
                let p_self = self.mapping[*v];
                let p_other = other.mapping[*v];
                (make_hcs(p_self, p_self + x_axis), make_hcs(p_other, p_other + x_axis))
            }
            [v1, v2, ..] => {
                let mut frame = |mapping: &BTreeMap<V, Vec2>| {
                    let p1 = mapping[*v1];
                    let p2 = mapping[*v2];
                    if tol_zero((p2 - p1).norm()) {
                        // coincident frame points pin position but not
                        // orientation
                        underconstrained = true;
                        make_hcs(p1, p1 + x_axis)
                    } else {
                        make_hcs(p1, p2)
                    }
                };
                let cs_self = frame(&self.mapping);
                let cs_other = frame(&other.mapping);
                (cs_self, cs_other)
            }
        };

        (cs_transform_matrix(&cs_other, &cs_self), underconstrained)
    }
}

impl<V: Variable> PartialEq for Configuration<V> {
    /// Equality up to rigid motion: the variable-name sets must match and
    /// the pointwise distances after aligning `other` onto `self` must all
    /// vanish within tolerance.
    fn eq(&self, other: &Self) -> bool {
        // cheap rejection: the hash covers the variable-name set
        if name_set_hash(self) != name_set_hash(other) {
            return false;
        }
        if self.mapping.len() != other.mapping.len() {
            return false;
        }
        if !self.mapping.keys().all(|var| other.mapping.contains_key(var)) {
            return false;
        }

        let (t, _) = self.transformation_matrix(other);
        let aligned = other.transform(&t);

        self.mapping.iter().all(|(var, point)| {
            let d = distance_2p(&aligned.get(var), point);
            tol_zero(d) || !tol_gt(d, 0.0)
        })
    }
}

impl<V: Variable> Eq for Configuration<V> {}

impl<V: Variable> Hash for Configuration<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(name_set_hash(self));
    }
}

/// Commutative combination of the variable-name hashes; coordinates do not
/// participate, matching the rigid-motion equality.
fn name_set_hash<V: Variable>(config: &Configuration<V>) -> u64 {
    config.mapping.keys().map(hash_one).fold(0, u64::wrapping_add)
}
