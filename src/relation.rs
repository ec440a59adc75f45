//! Relations between named points: a known distance between two points or a
//! known angle at a vertex between two rays.
//!
//! Relations exist to be collected into sets during over-constraint
//! accounting, so their equality and hashing are what matter: a distance is
//! an unordered pair, an angle pins its apex but not the order of its legs.

use std::{
    fmt::{self, Display, Formatter},
    hash::{Hash, Hasher},
};

use derive_more::From;
use serde::{Deserialize, Serialize};

use crate::{Variable, hash_one};

/// A known distance between two points. The pair is unordered.
#[derive(Clone, Debug)]
#[derive(Serialize, Deserialize)]
pub struct Distance<V> {
    pub a: V,
    pub b: V,
}

impl<V> Distance<V> {
    pub fn new(a: V, b: V) -> Self {
        Distance { a, b }
    }
}

impl<V: Variable> PartialEq for Distance<V> {
    fn eq(&self, other: &Self) -> bool {
        (self.a == other.a && self.b == other.b) || (self.a == other.b && self.b == other.a)
    }
}

impl<V: Variable> Eq for Distance<V> {}

impl<V: Variable> Hash for Distance<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // order-independent: combine the two endpoint hashes commutatively
        state.write_u64(hash_one(&self.a).wrapping_add(hash_one(&self.b)));
    }
}

impl<V: Display> Display for Distance<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Distance({}, {})", self.a, self.b)
    }
}

/// A known angle at apex `b` between the rays toward `a` and `c`.
///
/// The legs are unordered; the apex is part of the identity, so
/// `Angle(a, b, c) == Angle(c, b, a)` but `!= Angle(b, a, c)`.
#[derive(Clone, Debug)]
#[derive(Serialize, Deserialize)]
pub struct Angle<V> {
    pub a: V,
    pub b: V,
    pub c: V,
}

impl<V> Angle<V> {
    pub fn new(a: V, b: V, c: V) -> Self {
        Angle { a, b, c }
    }
}

impl<V: Variable> PartialEq for Angle<V> {
    fn eq(&self, other: &Self) -> bool {
        self.b == other.b
            && ((self.a == other.a && self.c == other.c)
                || (self.a == other.c && self.c == other.a))
    }
}

impl<V: Variable> Eq for Angle<V> {}

impl<V: Variable> Hash for Angle<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // the apex hashes in order, the legs commutatively
        state.write_u64(hash_one(&self.b));
        state.write_u64(hash_one(&self.a).wrapping_add(hash_one(&self.c)));
    }
}

impl<V: Display> Display for Angle<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Angle({}, {}, {})", self.a, self.b, self.c)
    }
}

/// Either kind of relation, as collected by over-constraint accounting.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[derive(From)]
#[derive(Serialize, Deserialize)]
pub enum Relation<V: Variable> {
    Distance(Distance<V>),
    Angle(Angle<V>),
}

impl<V: Variable + Display> Display for Relation<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Relation::Distance(d) => d.fmt(f),
            Relation::Angle(a) => a.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn distance_is_unordered() {
        assert_eq!(Distance::new("a", "b"), Distance::new("b", "a"));
        assert_eq!(
            hash_one(&Distance::new("a", "b")),
            hash_one(&Distance::new("b", "a"))
        );
        assert_ne!(Distance::new("a", "b"), Distance::new("a", "c"));
    }

    #[test]
    fn angle_pins_the_apex() {
        assert_eq!(Angle::new("a", "b", "c"), Angle::new("c", "b", "a"));
        assert_eq!(
            hash_one(&Angle::new("a", "b", "c")),
            hash_one(&Angle::new("c", "b", "a"))
        );
        assert_ne!(Angle::new("a", "b", "c"), Angle::new("b", "a", "c"));
        assert_ne!(Angle::new("a", "b", "c"), Angle::new("a", "c", "b"));
    }

    #[test]
    fn sets_deduplicate_by_relation_identity() {
        let mut set: HashSet<Relation<&str>> = HashSet::new();
        set.insert(Distance::new("a", "b").into());
        set.insert(Distance::new("b", "a").into());
        set.insert(Angle::new("a", "b", "c").into());
        set.insert(Angle::new("c", "b", "a").into());
        set.insert(Angle::new("b", "a", "c").into());
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn distance_and_angle_never_collide() {
        let d: Relation<&str> = Distance::new("a", "b").into();
        let a: Relation<&str> = Angle::new("a", "b", "b").into();
        assert_ne!(d, a);
    }

    #[test]
    fn rendering() {
        assert_eq!(Distance::new("a", "b").to_string(), "Distance(a, b)");
        assert_eq!(Angle::new("a", "b", "c").to_string(), "Angle(a, b, c)");
    }
}
