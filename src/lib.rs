//! Combinatorial core of a 2-D geometric constraint solver.
//!
//! The crate keeps two interlocking structures for a set of named points in
//! the plane: a [constraint graph](constraint::ConstraintGraph) recording
//! which relations the user declared between which points, and a
//! [method graph](method::MethodGraph) recording a dataflow plan that
//! computes point configurations from smaller ones. On top of those sit the
//! [cluster algebra](cluster) — descriptors for rigid, angle-fixed and
//! scale-invariant point sets, with an intersection operation and
//! over-constraint accounting — and immutable
//! [configurations](configuration::Configuration) that merge along shared
//! points and compare up to rigid motion.
//!
//! The crate prepares and propagates the symbolic structure of a problem; it
//! does not solve the geometric equations themselves.

use std::{
    fmt::Debug,
    hash::{DefaultHasher, Hash, Hasher},
};

pub mod cluster;
pub mod configuration;
pub mod constraint;
pub mod math;
pub mod method;
pub mod relation;

pub use cluster::{Cluster, ClusterError, ClusterKind};
pub use configuration::Configuration;
pub use constraint::{
    Constraint, ConstraintGraph, ConstraintRef, PlusConstraint, SelectionConstraint, SelectionRule,
};
pub use method::{
    AddMethod, AssignMethod, Method, MethodGraph, MethodGraphError, MethodRef, MultiMethod,
    MultiVariable, SetMethod, SubMethod, SumProdMethod, Value, ValueMap,
};
pub use relation::{Angle, Distance, Relation};

/// Identity of a point variable.
///
/// The solver never inspects a variable beyond comparing, ordering and
/// hashing it. `Ord` is part of the contract so that every place where
/// iteration order is observable (shared-point frame choice, propagation
/// picking) behaves reproducibly.
pub trait Variable: Clone + Ord + Eq + Hash + Debug {
    /// Whether the variable holds a set of alternative values rather than a
    /// single one. See [`method::MultiVariable`].
    fn is_multi(&self) -> bool {
        false
    }
}

impl Variable for &'static str {}
impl Variable for String {}
impl Variable for char {}
impl Variable for i32 {}
impl Variable for i64 {}
impl Variable for u32 {}
impl Variable for u64 {}
impl Variable for usize {}

/// Standalone hash of a single value, for commutative combining.
pub(crate) fn hash_one<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}
