//! Constraints over named variables and the constraint graph.
//!
//! A constraint declares a relation between variables that a solution must
//! satisfy; no values live here. The graph is bipartite: variables and
//! constraints are nodes, and an edge runs from a variable to every
//! constraint that mentions it.

use std::{
    collections::{HashMap, HashSet},
    fmt::{self, Debug, Formatter},
    hash::{Hash, Hasher},
    ops::{Add, Deref},
    rc::Rc,
};

use log::warn;
use petgraph::{
    Direction,
    stable_graph::{NodeIndex, StableDiGraph},
};
use serde::{Deserialize, Serialize};

use crate::{
    Variable,
    math::{Vec2, is_acute, is_clockwise, is_counterclockwise, is_obtuse},
};

/// A relation between variables that a solution must satisfy.
///
/// Implementations are immutable; the graph tracks them by identity, so the
/// same constraint object added twice is still one constraint.
pub trait Constraint<V: Variable, T>: Debug {
    /// The variables the relation is imposed on.
    fn variables(&self) -> &[V];

    /// Whether the assignment satisfies the relation. Assignments missing a
    /// variable do not satisfy it.
    fn satisfied(&self, assignment: &HashMap<V, T>) -> bool;
}

/// `a + b == c`, for exercising the graph machinery in tests.
#[derive(Clone, Debug)]
pub struct PlusConstraint<V> {
    variables: [V; 3],
}

impl<V> PlusConstraint<V> {
    pub fn new(a: V, b: V, c: V) -> Self {
        PlusConstraint { variables: [a, b, c] }
    }
}

impl<V, T> Constraint<V, T> for PlusConstraint<V>
where
    V: Variable,
    T: Add<Output = T> + PartialEq + Clone,
{
    fn variables(&self) -> &[V] {
        &self.variables
    }

    fn satisfied(&self, assignment: &HashMap<V, T>) -> bool {
        let [a, b, c] = &self.variables;
        match (assignment.get(a), assignment.get(b), assignment.get(c)) {
            (Some(a), Some(b), Some(c)) => a.clone() + b.clone() == *c,
            _ => false,
        }
    }
}

/// Predicates for selecting among alternative solutions.
///
/// All four are strict rejections: degenerate triples (coincident or
/// collinear points, right angles) satisfy every rule.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize)]
pub enum SelectionRule {
    NotClockwise,
    NotCounterClockwise,
    NotObtuse,
    NotAcute,
}

/// A [`SelectionRule`] applied to an ordered point triple. For the angle
/// rules the second variable is the apex.
#[derive(Clone, Debug)]
pub struct SelectionConstraint<V> {
    rule: SelectionRule,
    variables: [V; 3],
}

impl<V> SelectionConstraint<V> {
    pub fn new(rule: SelectionRule, a: V, b: V, c: V) -> Self {
        SelectionConstraint { rule, variables: [a, b, c] }
    }

    pub fn rule(&self) -> SelectionRule {
        self.rule
    }
}

impl<V: Variable> Constraint<V, Vec2> for SelectionConstraint<V> {
    fn variables(&self) -> &[V] {
        &self.variables
    }

    fn satisfied(&self, assignment: &HashMap<V, Vec2>) -> bool {
        let [a, b, c] = &self.variables;
        let (Some(a), Some(b), Some(c)) =
            (assignment.get(a), assignment.get(b), assignment.get(c))
        else {
            return false;
        };
        match self.rule {
            SelectionRule::NotClockwise => !is_clockwise(a, b, c),
            SelectionRule::NotCounterClockwise => !is_counterclockwise(a, b, c),
            SelectionRule::NotObtuse => !is_obtuse(a, b, c),
            SelectionRule::NotAcute => !is_acute(a, b, c),
        }
    }
}

/// Shared handle to a constraint, comparing and hashing by identity.
pub struct ConstraintRef<V: Variable, T>(Rc<dyn Constraint<V, T>>);

impl<V: Variable, T> ConstraintRef<V, T> {
    pub fn new(constraint: impl Constraint<V, T> + 'static) -> Self {
        ConstraintRef(Rc::new(constraint))
    }
}

impl<V: Variable, T, C: Constraint<V, T> + 'static> From<C> for ConstraintRef<V, T> {
    fn from(constraint: C) -> Self {
        ConstraintRef::new(constraint)
    }
}

impl<V: Variable, T> Clone for ConstraintRef<V, T> {
    fn clone(&self) -> Self {
        ConstraintRef(Rc::clone(&self.0))
    }
}

impl<V: Variable, T> Deref for ConstraintRef<V, T> {
    type Target = dyn Constraint<V, T>;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl<V: Variable, T> PartialEq for ConstraintRef<V, T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<V: Variable, T> Eq for ConstraintRef<V, T> {}

impl<V: Variable, T> Hash for ConstraintRef<V, T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(Rc::as_ptr(&self.0) as *const () as usize);
    }
}

impl<V: Variable, T> Debug for ConstraintRef<V, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug)]
enum Node<V: Variable, T> {
    Variable(V),
    Constraint(ConstraintRef<V, T>),
}

/// Bipartite graph of variables and the constraints imposed on them.
#[derive(Debug)]
pub struct ConstraintGraph<V: Variable, T> {
    graph: StableDiGraph<Node<V, T>, ()>,
    variables: HashMap<V, NodeIndex>,
    constraints: HashMap<ConstraintRef<V, T>, NodeIndex>,
}

impl<V: Variable, T> Default for ConstraintGraph<V, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Variable, T> ConstraintGraph<V, T> {
    pub fn new() -> Self {
        ConstraintGraph {
            graph: StableDiGraph::new(),
            variables: HashMap::new(),
            constraints: HashMap::new(),
        }
    }

    pub fn variables(&self) -> impl Iterator<Item = &V> {
        self.graph.node_weights().filter_map(|node| match node {
            Node::Variable(var) => Some(var),
            _ => None,
        })
    }

    pub fn constraints(&self) -> impl Iterator<Item = &ConstraintRef<V, T>> {
        self.constraints.keys()
    }

    pub fn has_variable(&self, var: &V) -> bool {
        self.variables.contains_key(var)
    }

    pub fn has_constraint(&self, constraint: &ConstraintRef<V, T>) -> bool {
        self.constraints.contains_key(constraint)
    }

    /// Add a variable. Adding a variable twice is a no-op.
    pub fn add_variable(&mut self, var: V) {
        if !self.variables.contains_key(&var) {
            let ix = self.graph.add_node(Node::Variable(var.clone()));
            self.variables.insert(var, ix);
        }
    }

    /// Remove a variable, and with it every constraint touching it.
    /// Removing an absent variable is logged and ignored.
    pub fn rem_variable(&mut self, var: &V) {
        let Some(&ix) = self.variables.get(var) else {
            warn!(target: "constraint", "cannot remove variable {var:?}: not in graph");
            return;
        };
        for constraint in self.constraints_on(var) {
            self.rem_constraint(&constraint);
        }
        self.graph.remove_node(ix);
        self.variables.remove(var);
    }

    /// Add a constraint, implicitly adding any of its variables not yet
    /// present. Adding a held constraint again is a no-op. Returns the
    /// handle the graph tracks the constraint by.
    pub fn add_constraint(&mut self, constraint: impl Into<ConstraintRef<V, T>>) -> ConstraintRef<V, T> {
        let constraint = constraint.into();
        if self.constraints.contains_key(&constraint) {
            return constraint;
        }

        let cix = self.graph.add_node(Node::Constraint(constraint.clone()));
        self.constraints.insert(constraint.clone(), cix);

        for var in constraint.variables() {
            self.add_variable(var.clone());
            let vix = self.variables[var];
            self.graph.update_edge(vix, cix, ());
        }

        constraint
    }

    /// Remove a constraint. Removing an absent constraint is logged and
    /// ignored.
    pub fn rem_constraint(&mut self, constraint: &ConstraintRef<V, T>) {
        let Some(ix) = self.constraints.remove(constraint) else {
            warn!(target: "constraint", "cannot remove constraint {constraint:?}: not in graph");
            return;
        };
        self.graph.remove_node(ix);
    }

    /// Constraints imposed on `var`; empty when the variable is unknown.
    pub fn constraints_on(&self, var: &V) -> Vec<ConstraintRef<V, T>> {
        let Some(&ix) = self.variables.get(var) else {
            return Vec::new();
        };
        self.graph
            .neighbors_directed(ix, Direction::Outgoing)
            .filter_map(|n| match self.graph.node_weight(n) {
                Some(Node::Constraint(constraint)) => Some(constraint.clone()),
                _ => None,
            })
            .collect()
    }

    /// Constraints imposed on every variable in `vars`, in the order they
    /// appear on the first one.
    pub fn constraints_on_all(&self, vars: &[V]) -> Vec<ConstraintRef<V, T>> {
        let Some((first, rest)) = vars.split_first() else {
            return Vec::new();
        };
        self.constraints_on(first)
            .into_iter()
            .filter(|constraint| rest.iter().all(|var| constraint.variables().contains(var)))
            .collect()
    }

    /// Constraints imposed on at least one variable in `vars`.
    pub fn constraints_on_any(&self, vars: &[V]) -> Vec<ConstraintRef<V, T>> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for var in vars {
            for constraint in self.constraints_on(var) {
                if seen.insert(constraint.clone()) {
                    result.push(constraint);
                }
            }
        }
        result
    }
}
