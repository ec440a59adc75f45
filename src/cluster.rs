//! Clusters: generalised constraints over sets of points in the plane.
//!
//! A cluster describes a partial solution. A [`ClusterKind::Rigid`] set has
//! every mutual distance fixed, a [`ClusterKind::Hedgehog`] fixes the angles
//! between its spokes at a shared center, and a [`ClusterKind::Balloon`] is
//! fixed up to rotation, translation and uniform scaling. The planner grows
//! solutions by intersecting clusters and uses [`Cluster::over_constraints`]
//! to account for the relations two overlapping clusters both imply.

use std::{
    collections::{BTreeSet, HashSet},
    fmt::{self, Display, Formatter},
};

use derive_more::IsVariant;
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    Variable,
    relation::{Angle, Distance, Relation},
};

/// Size requirements of the cluster variants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClusterError {
    #[error("hedgehog needs a center and at least two spoke variables")]
    HedgehogTooSmall,
    #[error("balloon needs at least three variables")]
    BalloonTooSmall,
}

/// The three shapes a partial solution can take.
#[derive(Clone, Debug, PartialEq, Eq)]
#[derive(IsVariant)]
#[derive(Serialize, Deserialize)]
pub enum ClusterKind<V: Variable> {
    /// Every pairwise distance (and with them every angle) between the
    /// variables is fixed.
    Rigid { vars: BTreeSet<V> },
    /// Every angle at `center` between two of the `spokes` is fixed;
    /// no distances are. `center` is never part of `spokes`.
    Hedgehog { center: V, spokes: BTreeSet<V> },
    /// Fixed up to rotation, translation and uniform scaling: every angle
    /// on a triple is implied, no distances are.
    Balloon { vars: BTreeSet<V> },
}

/// A partial-solution descriptor over a set of point variables.
///
/// The `overconstrained` flag is planner bookkeeping: it records that a
/// merge revealed redundant constraints. It is write-once and not part of
/// cluster equality.
#[derive(Clone, Debug)]
#[derive(Serialize, Deserialize)]
pub struct Cluster<V: Variable> {
    kind: ClusterKind<V>,
    overconstrained: bool,
}

impl<V: Variable> PartialEq for Cluster<V> {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl<V: Variable> Eq for Cluster<V> {}

impl<V: Variable> From<ClusterKind<V>> for Cluster<V> {
    fn from(kind: ClusterKind<V>) -> Self {
        Cluster { kind, overconstrained: false }
    }
}

impl<V: Variable> Cluster<V> {
    /// A rigid body over `vars`. Degenerate sizes are allowed; callers deal
    /// with point and segment shapes themselves.
    pub fn rigid(vars: impl IntoIterator<Item = V>) -> Self {
        ClusterKind::Rigid { vars: vars.into_iter().collect() }.into()
    }

    /// A hedgehog with the given center. The center is stripped from the
    /// spoke set; at least two distinct spokes must remain.
    pub fn hedgehog(center: V, spokes: impl IntoIterator<Item = V>) -> Result<Self, ClusterError> {
        let mut spokes: BTreeSet<V> = spokes.into_iter().collect();
        spokes.remove(&center);
        if spokes.len() < 2 {
            return Err(ClusterError::HedgehogTooSmall);
        }
        Ok(ClusterKind::Hedgehog { center, spokes }.into())
    }

    /// A balloon over `vars`, which must contain at least three variables.
    pub fn balloon(vars: impl IntoIterator<Item = V>) -> Result<Self, ClusterError> {
        let vars: BTreeSet<V> = vars.into_iter().collect();
        if vars.len() < 3 {
            return Err(ClusterError::BalloonTooSmall);
        }
        Ok(ClusterKind::Balloon { vars }.into())
    }

    pub fn kind(&self) -> &ClusterKind<V> {
        &self.kind
    }

    pub fn is_overconstrained(&self) -> bool {
        self.overconstrained
    }

    /// Record that merges revealed redundant constraints on this cluster.
    pub fn mark_overconstrained(&mut self) {
        self.overconstrained = true;
    }

    /// Every variable the cluster constrains. For a hedgehog this is the
    /// spoke set plus the center.
    pub fn vars(&self) -> BTreeSet<V> {
        match &self.kind {
            ClusterKind::Rigid { vars } | ClusterKind::Balloon { vars } => vars.clone(),
            ClusterKind::Hedgehog { center, spokes } => {
                let mut vars = spokes.clone();
                vars.insert(center.clone());
                vars
            }
        }
    }

    fn shared_with(&self, other: &Cluster<V>) -> BTreeSet<V> {
        let (vars, other_vars) = (self.vars(), other.vars());
        vars.intersection(&other_vars).cloned().collect()
    }

    /// The strongest cluster implied by both inputs over their shared
    /// variables, or `None` when the overlap is too small to carry a
    /// constraint. Symmetric in its arguments.
    pub fn intersection(&self, other: &Cluster<V>) -> Option<Cluster<V>> {
        let shared = self.shared_with(other);

        if shared.len() < 2 {
            debug!(
                target: "cluster",
                "no intersection between {:?} and {:?}: fewer than 2 shared variables",
                self, other
            );
            return None;
        }

        use ClusterKind::*;
        match (&self.kind, &other.kind) {
            (Rigid { .. }, Rigid { .. }) => Some(Cluster::rigid(shared)),

            // a rigid or balloon overlapping a hedgehog restricts the
            // hedgehog to the shared spokes, provided it covers the center
            (Rigid { .. }, Hedgehog { center, .. })
            | (Hedgehog { center, .. }, Rigid { .. })
            | (Hedgehog { center, .. }, Balloon { .. })
            | (Balloon { .. }, Hedgehog { center, .. }) => restrict_to_center(center, &shared),

            // balloons behave like rigids here, except that the result
            // stays scale-free and needs a full triple
            (Rigid { .. }, Balloon { .. })
            | (Balloon { .. }, Rigid { .. })
            | (Balloon { .. }, Balloon { .. }) => {
                (shared.len() >= 3).then(|| ClusterKind::Balloon { vars: shared }.into())
            }

            (Hedgehog { center: c1, spokes: s1 }, Hedgehog { center: c2, spokes: s2 }) => {
                if c1 != c2 {
                    return None;
                }
                let spokes: BTreeSet<V> = s1.intersection(s2).cloned().collect();
                (spokes.len() >= 2)
                    .then(|| ClusterKind::Hedgehog { center: c1.clone(), spokes }.into())
            }
        }
    }

    /// Relations implied by both clusters over their shared variables: the
    /// redundancies a merge of the two would introduce.
    pub fn over_constraints(&self, other: &Cluster<V>) -> HashSet<Relation<V>> {
        let mut relations: HashSet<Relation<V>> = self
            .common_distances(other)
            .into_iter()
            .map(Relation::from)
            .collect();
        relations.extend(self.common_angles(other).into_iter().map(Relation::from));
        relations
    }

    /// Distances implied by both clusters; non-empty only for two rigids.
    pub fn common_distances(&self, other: &Cluster<V>) -> HashSet<Distance<V>> {
        if !(self.kind.is_rigid() && other.kind.is_rigid()) {
            return HashSet::new();
        }
        self.shared_with(other)
            .iter()
            .tuple_combinations::<(_, _)>()
            .map(|(u, v)| Distance::new(u.clone(), v.clone()))
            .collect()
    }

    /// Angles implied by both clusters over their shared variables.
    pub fn common_angles(&self, other: &Cluster<V>) -> HashSet<Angle<V>> {
        use ClusterKind::*;
        match (&self.kind, &other.kind) {
            // both imply every angle on shared triples
            (Rigid { .. } | Balloon { .. }, Rigid { .. } | Balloon { .. }) => {
                all_triple_angles(&self.shared_with(other))
            }

            (Rigid { vars }, Hedgehog { center, spokes })
            | (Hedgehog { center, spokes }, Rigid { vars })
            | (Hedgehog { center, spokes }, Balloon { vars })
            | (Balloon { vars }, Hedgehog { center, spokes }) => {
                if vars.contains(center) {
                    angles_at_center(center, vars, spokes)
                } else {
                    HashSet::new()
                }
            }

            (Hedgehog { center: c1, spokes: s1 }, Hedgehog { center: c2, spokes: s2 }) => {
                if c1 == c2 {
                    angles_at_center(c1, s1, s2)
                } else {
                    HashSet::new()
                }
            }
        }
    }

    /// Number of distances the cluster implies.
    pub fn n_distances(&self) -> usize {
        match &self.kind {
            ClusterKind::Rigid { vars } => binom(vars.len(), 2),
            ClusterKind::Hedgehog { .. } | ClusterKind::Balloon { .. } => 0,
        }
    }

    /// Number of oriented angles the cluster implies.
    pub fn n_angles(&self) -> usize {
        match &self.kind {
            ClusterKind::Rigid { vars } | ClusterKind::Balloon { vars } => {
                3 * binom(vars.len(), 3)
            }
            ClusterKind::Hedgehog { spokes, .. } => binom(spokes.len(), 2),
        }
    }

    pub fn n_constraints(&self) -> usize {
        self.n_distances() + self.n_angles()
    }
}

/// Hedgehog over the shared variable set, centered on `center`, or `None`
/// when the center is outside the overlap or too few spokes remain.
fn restrict_to_center<V: Variable>(center: &V, shared: &BTreeSet<V>) -> Option<Cluster<V>> {
    let mut spokes = shared.clone();
    if !spokes.remove(center) || spokes.len() < 2 {
        return None;
    }
    Some(ClusterKind::Hedgehog { center: center.clone(), spokes }.into())
}

/// All three angle rotations for every unordered triple in `vars`.
fn all_triple_angles<V: Variable>(vars: &BTreeSet<V>) -> HashSet<Angle<V>> {
    vars.iter()
        .tuple_combinations::<(_, _, _)>()
        .flat_map(|(u, v, w)| {
            [
                Angle::new(u.clone(), v.clone(), w.clone()),
                Angle::new(v.clone(), w.clone(), u.clone()),
                Angle::new(w.clone(), u.clone(), v.clone()),
            ]
        })
        .collect()
}

/// Angles at `center` over every unordered pair drawn from `a ∩ b`.
fn angles_at_center<V: Variable>(center: &V, a: &BTreeSet<V>, b: &BTreeSet<V>) -> HashSet<Angle<V>> {
    a.intersection(b)
        .tuple_combinations::<(_, _)>()
        .map(|(u, w)| Angle::new(u.clone(), center.clone(), w.clone()))
        .collect()
}

/// Binomial coefficient, for the small `k` the counting rules use.
fn binom(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result = 1;
    for i in 0..k {
        result = result * (n - i) / (i + 1);
    }
    result
}

impl<V: Variable + Display> Display for Cluster<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.overconstrained {
            write!(f, "!")?;
        }
        match &self.kind {
            ClusterKind::Rigid { vars } => write!(f, "Rigid({})", vars.iter().join(", ")),
            ClusterKind::Hedgehog { center, spokes } => {
                write!(f, "Hedgehog({}; {})", center, spokes.iter().join(", "))
            }
            ClusterKind::Balloon { vars } => write!(f, "Balloon({})", vars.iter().join(", ")),
        }
    }
}
