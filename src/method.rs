//! Method graphs: dataflow over named variables.
//!
//! A method graph is a bipartite directed graph of variables and methods.
//! Edges run from input variables into methods and from methods out to
//! their output variables. The graph enforces that no variable is written
//! by more than one method and that no directed cycle exists, and it
//! re-executes methods whenever one of their inputs changes, until a
//! fixpoint is reached.
//!
//! Multi-valued variables ([`MultiVariable`]) carry sets of alternative
//! values; a [`MultiMethod`] fans out over every combination of
//! alternatives and collects the results into its single multi-valued
//! output.

use std::{
    collections::{BTreeSet, HashMap, HashSet},
    fmt::{self, Debug, Formatter},
    hash::{Hash, Hasher},
    ops::{Add, Deref, Mul, Sub},
    rc::Rc,
};

use itertools::Itertools;
use log::debug;
use petgraph::{
    Direction,
    algo::has_path_connecting,
    stable_graph::{NodeIndex, StableDiGraph},
};
use thiserror::Error;

use crate::Variable;

/// Value slot of a method-graph variable.
///
/// `Unknown` is the distinguished "no value" marker, distinct from any
/// legitimate value; outputs become `Unknown` when their method cannot
/// produce them. `Multiple` holds the alternatives of a multi-valued
/// variable.
#[derive(Clone, Debug)]
pub enum Value<T> {
    Unknown,
    Single(T),
    Multiple(HashSet<T>),
}

impl<T> Value<T> {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown)
    }

    /// The value when it is a plain single one.
    pub fn single(&self) -> Option<&T> {
        match self {
            Value::Single(value) => Some(value),
            _ => None,
        }
    }
}

impl<T: Eq + Hash> PartialEq for Value<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unknown, Value::Unknown) => true,
            (Value::Single(a), Value::Single(b)) => a == b,
            (Value::Multiple(a), Value::Multiple(b)) => a == b,
            _ => false,
        }
    }
}

impl<T: Eq + Hash> Eq for Value<T> {}

impl<T> From<T> for Value<T> {
    fn from(value: T) -> Self {
        Value::Single(value)
    }
}

/// Variable-to-value mapping, as passed to and returned by
/// [`Method::execute`].
pub type ValueMap<V, T> = HashMap<V, Value<T>>;

/// A computation from input variables to output variables.
///
/// Implementations are immutable; the graph tracks them by identity. An
/// execution that cannot produce outputs returns an empty map, which the
/// graph turns into `Unknown` outputs.
pub trait Method<V: Variable, T>: Debug {
    fn name(&self) -> &str;

    fn inputs(&self) -> &[V];

    fn outputs(&self) -> &[V];

    /// Compute output values. `in_map` holds the current values of every
    /// input and output variable.
    fn execute(&self, in_map: &ValueMap<V, T>) -> ValueMap<V, T>;
}

/// Shared handle to a method, comparing and hashing by identity.
pub struct MethodRef<V: Variable, T>(Rc<dyn Method<V, T>>);

impl<V: Variable, T> MethodRef<V, T> {
    pub fn new(method: impl Method<V, T> + 'static) -> Self {
        MethodRef(Rc::new(method))
    }
}

impl<V: Variable, T, M: Method<V, T> + 'static> From<M> for MethodRef<V, T> {
    fn from(method: M) -> Self {
        MethodRef::new(method)
    }
}

impl<V: Variable, T> Clone for MethodRef<V, T> {
    fn clone(&self) -> Self {
        MethodRef(Rc::clone(&self.0))
    }
}

impl<V: Variable, T> Deref for MethodRef<V, T> {
    type Target = dyn Method<V, T>;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl<V: Variable, T> PartialEq for MethodRef<V, T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<V: Variable, T> Eq for MethodRef<V, T> {}

impl<V: Variable, T> Hash for MethodRef<V, T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(Rc::as_ptr(&self.0) as *const () as usize);
    }
}

impl<V: Variable, T> Debug for MethodRef<V, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Variable wrapper distinguishing multi-valued variables from plain ones.
///
/// A multi-valued variable holds a set of alternative values (for example
/// the two mirror placements of a point) instead of a single one.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MultiVariable<V> {
    Single(V),
    Multi(V),
}

impl<V: Variable> Variable for MultiVariable<V> {
    fn is_multi(&self) -> bool {
        matches!(self, MultiVariable::Multi(_))
    }
}

/// A method executed once per combination of alternatives of its
/// multi-valued inputs.
///
/// The single output must be a multi-valued variable; it receives the union
/// of the values produced across all combinations. Plain inputs keep their
/// value in every combination.
pub trait MultiMethod<V: Variable, T: Clone + Eq + Hash>: Debug {
    fn name(&self) -> &str;

    fn inputs(&self) -> &[V];

    /// The single, multi-valued output variable.
    fn output(&self) -> &V;

    /// Possible output values for one combination of plain input values.
    fn multi_execute(&self, in_map: &HashMap<V, T>) -> Vec<T>;
}

impl<V, T, M> Method<V, T> for M
where
    V: Variable,
    T: Clone + Eq + Hash,
    M: MultiMethod<V, T>,
{
    fn name(&self) -> &str {
        MultiMethod::name(self)
    }

    fn inputs(&self) -> &[V] {
        MultiMethod::inputs(self)
    }

    fn outputs(&self) -> &[V] {
        std::slice::from_ref(self.output())
    }

    fn execute(&self, in_map: &ValueMap<V, T>) -> ValueMap<V, T> {
        debug_assert!(
            self.output().is_multi(),
            "multi-method output {:?} must be a multi-valued variable",
            self.output()
        );

        let mut base: HashMap<V, T> = HashMap::new();
        let mut alternatives: Vec<(&V, Vec<T>)> = Vec::new();

        for var in MultiMethod::inputs(self) {
            match (var.is_multi(), in_map.get(var)) {
                (false, Some(Value::Single(value))) => {
                    base.insert(var.clone(), value.clone());
                }
                (true, Some(Value::Multiple(values))) => {
                    alternatives.push((var, values.iter().cloned().collect()));
                }
                (true, Some(Value::Single(value))) => {
                    alternatives.push((var, vec![value.clone()]));
                }
                _ => return ValueMap::new(),
            }
        }

        let mut collected: HashSet<T> = HashSet::new();
        if alternatives.is_empty() {
            collected.extend(self.multi_execute(&base));
        } else {
            for combination in
                alternatives.iter().map(|(_, values)| values.iter()).multi_cartesian_product()
            {
                let mut in_single = base.clone();
                for ((var, _), value) in alternatives.iter().zip(combination) {
                    in_single.insert((*var).clone(), value.clone());
                }
                collected.extend(self.multi_execute(&in_single));
            }
        }

        ValueMap::from([(self.output().clone(), Value::Multiple(collected))])
    }
}

/// Rejected [`MethodGraph::add_method`] calls. The attempted method is
/// rolled back before the error is returned, leaving the graph as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MethodGraphError {
    /// The method would give one of its outputs a second writer.
    #[error("variable {0} would be determined by more than one method")]
    Determined(String),
    /// The method would close a directed cycle through one of its outputs.
    #[error("cycle through variable {0} not allowed")]
    Cycle(String),
}

#[derive(Debug)]
enum Node<V: Variable, T> {
    Variable(V),
    Method(MethodRef<V, T>),
}

/// Bipartite dataflow graph of variables and methods.
///
/// Variables default to [`Value::Unknown`]. Setting a value or adding a
/// method marks the affected variables changed and propagates: every method
/// reading a changed variable is re-executed until no changes remain.
pub struct MethodGraph<V: Variable, T> {
    graph: StableDiGraph<Node<V, T>, ()>,
    variables: HashMap<V, NodeIndex>,
    methods: HashMap<MethodRef<V, T>, NodeIndex>,
    values: HashMap<V, Value<T>>,
    changed: BTreeSet<V>,
}

impl<V: Variable, T: Clone + Eq + Hash> Default for MethodGraph<V, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Variable, T: Clone + Eq + Hash> MethodGraph<V, T> {
    pub fn new() -> Self {
        MethodGraph {
            graph: StableDiGraph::new(),
            variables: HashMap::new(),
            methods: HashMap::new(),
            values: HashMap::new(),
            changed: BTreeSet::new(),
        }
    }

    pub fn variables(&self) -> impl Iterator<Item = &V> {
        self.graph.node_weights().filter_map(|node| match node {
            Node::Variable(var) => Some(var),
            _ => None,
        })
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodRef<V, T>> {
        self.methods.keys()
    }

    pub fn has_variable(&self, var: &V) -> bool {
        self.values.contains_key(var)
    }

    pub fn has_method(&self, method: &MethodRef<V, T>) -> bool {
        self.methods.contains_key(method)
    }

    /// Whether changes are still waiting to be propagated. Only
    /// [`set_deferred`](Self::set_deferred) and
    /// [`add_method_deferred`](Self::add_method_deferred) can leave any
    /// behind.
    pub fn has_pending_changes(&self) -> bool {
        !self.changed.is_empty()
    }

    /// Add a variable with no value. Adding a held variable is a no-op.
    pub fn add_variable(&mut self, var: V) {
        self.add_variable_with(var, Value::Unknown);
    }

    /// Add a variable with an initial value. Adding a held variable is a
    /// no-op (the value is not overwritten; use [`set`](Self::set)).
    pub fn add_variable_with(&mut self, var: V, value: impl Into<Value<T>>) {
        if self.values.contains_key(&var) {
            return;
        }
        let ix = self.graph.add_node(Node::Variable(var.clone()));
        self.variables.insert(var.clone(), ix);
        self.values.insert(var, value.into());
    }

    /// Remove a variable and every method that reads or writes it.
    ///
    /// Panics when the variable is not in the graph; removing a foreign
    /// variable is a bug in the caller.
    pub fn rem_variable(&mut self, var: &V) {
        let Some(&ix) = self.variables.get(var) else {
            panic!("variable {var:?} is not in the method graph");
        };

        let touching: Vec<MethodRef<V, T>> = self
            .graph
            .neighbors_directed(ix, Direction::Incoming)
            .chain(self.graph.neighbors_directed(ix, Direction::Outgoing))
            .filter_map(|n| match self.graph.node_weight(n) {
                Some(Node::Method(method)) => Some(method.clone()),
                _ => None,
            })
            .collect();
        for method in touching {
            if self.methods.contains_key(&method) {
                self.rem_method(&method);
            }
        }

        self.values.remove(var);
        self.changed.remove(var);
        self.graph.remove_node(ix);
        self.variables.remove(var);
    }

    /// Current value of `var`. Panics when the variable is not in the
    /// graph.
    pub fn get(&self, var: &V) -> &Value<T> {
        match self.values.get(var) {
            Some(value) => value,
            None => panic!("variable {var:?} is not in the method graph"),
        }
    }

    /// Set a variable's value and propagate the change. The variable is
    /// added first if needed.
    pub fn set(&mut self, var: V, value: impl Into<Value<T>>) {
        self.set_deferred(var, value);
        self.propagate();
    }

    /// Set a variable's value without propagating. The change is picked up
    /// by the next [`propagate`](Self::propagate).
    pub fn set_deferred(&mut self, var: V, value: impl Into<Value<T>>) {
        if !self.values.contains_key(&var) {
            let ix = self.graph.add_node(Node::Variable(var.clone()));
            self.variables.insert(var.clone(), ix);
        }
        self.values.insert(var.clone(), value.into());
        self.changed.insert(var);
    }

    /// Add a method, implicitly adding its variables, then execute it and
    /// propagate. Adding a held method again is a no-op.
    ///
    /// When the method would give one of its outputs a second writer or
    /// close a directed cycle, it is rolled back and the error returned;
    /// the graph is left as it was.
    pub fn add_method(
        &mut self,
        method: impl Into<MethodRef<V, T>>,
    ) -> Result<MethodRef<V, T>, MethodGraphError> {
        let method = method.into();
        if self.methods.contains_key(&method) {
            return Ok(method);
        }
        let method = self.add_method_deferred(method)?;
        self.do_execute(&method);
        self.propagate();
        Ok(method)
    }

    /// Add and validate a method without executing it.
    pub fn add_method_deferred(
        &mut self,
        method: impl Into<MethodRef<V, T>>,
    ) -> Result<MethodRef<V, T>, MethodGraphError> {
        let method = method.into();
        if self.methods.contains_key(&method) {
            return Ok(method);
        }

        let mix = self.graph.add_node(Node::Method(method.clone()));
        self.methods.insert(method.clone(), mix);

        for var in method.inputs() {
            self.add_variable(var.clone());
            let vix = self.variables[var];
            self.graph.update_edge(vix, mix, ());
        }
        for var in method.outputs() {
            self.add_variable(var.clone());
            let vix = self.variables[var];
            self.graph.update_edge(mix, vix, ());
        }

        for var in method.outputs() {
            let vix = self.variables[var];
            if self.graph.neighbors_directed(vix, Direction::Incoming).count() > 1 {
                self.rem_method(&method);
                return Err(MethodGraphError::Determined(format!("{var:?}")));
            }
            let closes_cycle = self
                .graph
                .neighbors_directed(vix, Direction::Outgoing)
                .any(|next| has_path_connecting(&self.graph, next, vix, None));
            if closes_cycle {
                self.rem_method(&method);
                return Err(MethodGraphError::Cycle(format!("{var:?}")));
            }
        }

        Ok(method)
    }

    /// Remove a method. Panics when the method is not in the graph.
    pub fn rem_method(&mut self, method: &MethodRef<V, T>) {
        let Some(ix) = self.methods.remove(method) else {
            panic!("method {} is not in the method graph", method.name());
        };
        self.graph.remove_node(ix);
    }

    /// Re-execute a held method and propagate. Panics when the method is
    /// not in the graph.
    pub fn execute(&mut self, method: &MethodRef<V, T>) {
        if !self.methods.contains_key(method) {
            panic!("method {} is not in the method graph", method.name());
        }
        self.do_execute(method);
        self.propagate();
    }

    /// Propagate pending changes until none remain: every method reading a
    /// changed variable is re-executed, which may mark further variables.
    ///
    /// Changed variables are picked in their `Ord` order; acyclicity
    /// guarantees a fixpoint.
    pub fn propagate(&mut self) {
        debug!(target: "method", "propagating changes");

        while let Some(var) = self.changed.first().cloned() {
            let vix = self.variables[&var];
            let readers: Vec<MethodRef<V, T>> = self
                .graph
                .neighbors_directed(vix, Direction::Outgoing)
                .filter_map(|n| match self.graph.node_weight(n) {
                    Some(Node::Method(method)) => Some(method.clone()),
                    _ => None,
                })
                .collect();

            for method in readers {
                self.do_execute(&method);
            }

            self.changed.remove(&var);
        }
    }

    /// Remove every variable, and with them every method and value.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.variables.clear();
        self.methods.clear();
        self.values.clear();
        self.changed.clear();
    }

    /// Execute one method: build its input map, run it unless an input is
    /// unknown, store the outputs (missing outputs become `Unknown`), and
    /// consume the change marks of its inputs.
    fn do_execute(&mut self, method: &MethodRef<V, T>) {
        debug!(target: "method", "executing method {}", method.name());

        let mut in_map = ValueMap::new();
        let mut has_unknowns = false;

        for var in method.inputs() {
            let value = self.values.get(var).expect("method input missing from value store");
            has_unknowns |= value.is_unknown();
            in_map.insert(var.clone(), value.clone());
        }
        for var in method.outputs() {
            let value = self.values.get(var).expect("method output missing from value store");
            in_map.insert(var.clone(), value.clone());
        }

        let out_map = if has_unknowns {
            debug!(
                target: "method",
                "unknown inputs; outputs of {} become unknown", method.name()
            );
            ValueMap::new()
        } else {
            method.execute(&in_map)
        };

        for var in method.outputs() {
            match out_map.get(var) {
                Some(value) => {
                    self.values.insert(var.clone(), value.clone());
                    self.changed.insert(var.clone());
                }
                None => {
                    let slot =
                        self.values.get_mut(var).expect("method output missing from value store");
                    if !slot.is_unknown() {
                        *slot = Value::Unknown;
                        self.changed.insert(var.clone());
                    }
                }
            }
        }

        for var in method.inputs() {
            self.changed.remove(var);
        }
    }
}

/// `c = a + b`.
#[derive(Clone, Debug)]
pub struct AddMethod<V> {
    inputs: [V; 2],
    outputs: [V; 1],
}

impl<V> AddMethod<V> {
    pub fn new(a: V, b: V, c: V) -> Self {
        AddMethod { inputs: [a, b], outputs: [c] }
    }
}

impl<V, T> Method<V, T> for AddMethod<V>
where
    V: Variable,
    T: Add<Output = T> + Clone,
{
    fn name(&self) -> &str {
        "AddMethod"
    }

    fn inputs(&self) -> &[V] {
        &self.inputs
    }

    fn outputs(&self) -> &[V] {
        &self.outputs
    }

    fn execute(&self, in_map: &ValueMap<V, T>) -> ValueMap<V, T> {
        let [a, b] = &self.inputs;
        let [c] = &self.outputs;
        match (in_map.get(a).and_then(Value::single), in_map.get(b).and_then(Value::single)) {
            (Some(a), Some(b)) => {
                ValueMap::from([(c.clone(), Value::Single(a.clone() + b.clone()))])
            }
            _ => ValueMap::new(),
        }
    }
}

/// `c = a - b`.
#[derive(Clone, Debug)]
pub struct SubMethod<V> {
    inputs: [V; 2],
    outputs: [V; 1],
}

impl<V> SubMethod<V> {
    pub fn new(a: V, b: V, c: V) -> Self {
        SubMethod { inputs: [a, b], outputs: [c] }
    }
}

impl<V, T> Method<V, T> for SubMethod<V>
where
    V: Variable,
    T: Sub<Output = T> + Clone,
{
    fn name(&self) -> &str {
        "SubMethod"
    }

    fn inputs(&self) -> &[V] {
        &self.inputs
    }

    fn outputs(&self) -> &[V] {
        &self.outputs
    }

    fn execute(&self, in_map: &ValueMap<V, T>) -> ValueMap<V, T> {
        let [a, b] = &self.inputs;
        let [c] = &self.outputs;
        match (in_map.get(a).and_then(Value::single), in_map.get(b).and_then(Value::single)) {
            (Some(a), Some(b)) => {
                ValueMap::from([(c.clone(), Value::Single(a.clone() - b.clone()))])
            }
            _ => ValueMap::new(),
        }
    }
}

/// Pins its output to a fixed value; has no inputs.
#[derive(Clone, Debug)]
pub struct SetMethod<V, T> {
    outputs: [V; 1],
    value: T,
}

impl<V, T> SetMethod<V, T> {
    pub fn new(variable: V, value: T) -> Self {
        SetMethod { outputs: [variable], value }
    }
}

impl<V, T> Method<V, T> for SetMethod<V, T>
where
    V: Variable,
    T: Clone + Debug,
{
    fn name(&self) -> &str {
        "SetMethod"
    }

    fn inputs(&self) -> &[V] {
        &[]
    }

    fn outputs(&self) -> &[V] {
        &self.outputs
    }

    fn execute(&self, _in_map: &ValueMap<V, T>) -> ValueMap<V, T> {
        ValueMap::from([(self.outputs[0].clone(), Value::Single(self.value.clone()))])
    }
}

/// Copies its input's value to its output; unknown input, empty output.
#[derive(Clone, Debug)]
pub struct AssignMethod<V> {
    inputs: [V; 1],
    outputs: [V; 1],
}

impl<V> AssignMethod<V> {
    /// `to ← from`.
    pub fn new(to: V, from: V) -> Self {
        AssignMethod { inputs: [from], outputs: [to] }
    }
}

impl<V: Variable, T: Clone> Method<V, T> for AssignMethod<V> {
    fn name(&self) -> &str {
        "AssignMethod"
    }

    fn inputs(&self) -> &[V] {
        &self.inputs
    }

    fn outputs(&self) -> &[V] {
        &self.outputs
    }

    fn execute(&self, in_map: &ValueMap<V, T>) -> ValueMap<V, T> {
        match in_map.get(&self.inputs[0]) {
            Some(Value::Unknown) | None => ValueMap::new(),
            Some(value) => ValueMap::from([(self.outputs[0].clone(), value.clone())]),
        }
    }
}

/// Yields both the sum and the product of its two inputs as alternatives.
#[derive(Clone, Debug)]
pub struct SumProdMethod<V> {
    inputs: [V; 2],
    output: V,
}

impl<V> SumProdMethod<V> {
    pub fn new(a: V, b: V, c: V) -> Self {
        SumProdMethod { inputs: [a, b], output: c }
    }
}

impl<V, T> MultiMethod<V, T> for SumProdMethod<V>
where
    V: Variable,
    T: Add<Output = T> + Mul<Output = T> + Clone + Eq + Hash,
{
    fn name(&self) -> &str {
        "SumProdMethod"
    }

    fn inputs(&self) -> &[V] {
        &self.inputs
    }

    fn output(&self) -> &V {
        &self.output
    }

    fn multi_execute(&self, in_map: &HashMap<V, T>) -> Vec<T> {
        let [a, b] = &self.inputs;
        match (in_map.get(a), in_map.get(b)) {
            (Some(a), Some(b)) => vec![a.clone() + b.clone(), a.clone() * b.clone()],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use assertables::*;

    use super::*;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// `a = 3`, `b = 4`, `c = a + b`.
    fn add_graph() -> MethodGraph<&'static str, i64> {
        init_logging();
        let mut graph = MethodGraph::new();
        graph.add_variable_with("a", 3);
        graph.add_variable_with("b", 4);
        graph.add_method(AddMethod::new("a", "b", "c")).unwrap();
        graph
    }

    #[test]
    fn add_method_computes_and_recomputes() {
        let mut graph = add_graph();
        assert_eq!(*graph.get(&"c"), Value::Single(7));

        graph.set("a", 10);
        assert_eq!(*graph.get(&"c"), Value::Single(14));
    }

    #[test]
    fn chained_methods_propagate_through() {
        let mut graph = add_graph();

        // d = a + c = a + (a + b)
        graph.add_method(AddMethod::new("a", "c", "d")).unwrap();
        assert_eq!(*graph.get(&"d"), Value::Single(10));

        // e = b + d = b + (a + (a + b))
        graph.add_method(AddMethod::new("b", "d", "e")).unwrap();
        assert_eq!(*graph.get(&"e"), Value::Single(14));

        graph.set("a", 4);
        assert_eq!(*graph.get(&"c"), Value::Single(8));
        assert_eq!(*graph.get(&"d"), Value::Single(12));
        assert_eq!(*graph.get(&"e"), Value::Single(16));
        assert!(!graph.has_pending_changes());
    }

    #[test]
    fn cycles_are_rejected_and_rolled_back() {
        let mut graph = add_graph();
        graph.add_method(AddMethod::new("a", "c", "d")).unwrap();
        graph.add_method(AddMethod::new("b", "d", "e")).unwrap();

        // a depends on d and e, both of which depend on a
        let err = graph.add_method(AddMethod::new("d", "e", "a")).unwrap_err();
        assert!(matches!(err, MethodGraphError::Cycle(_)));

        // the graph is untouched
        assert_eq!(graph.methods().count(), 3);
        assert_eq!(*graph.get(&"a"), Value::Single(3));
        assert_eq!(*graph.get(&"e"), Value::Single(14));
    }

    #[test]
    fn second_writers_are_rejected_and_rolled_back() {
        let mut graph = add_graph();
        graph.add_method(AddMethod::new("a", "c", "d")).unwrap();
        graph.add_method(AddMethod::new("b", "d", "e")).unwrap();

        let err = graph.add_method(AddMethod::new("a", "b", "e")).unwrap_err();
        assert!(matches!(err, MethodGraphError::Determined(_)));
        assert_eq!(graph.methods().count(), 3);
        assert_eq!(*graph.get(&"e"), Value::Single(14));
    }

    #[test]
    fn single_writer_holds_after_any_add_sequence() {
        let graph = {
            let mut graph = add_graph();
            graph.add_method(AddMethod::new("a", "c", "d")).unwrap();
            graph.add_method(AddMethod::new("b", "d", "e")).unwrap();
            let _ = graph.add_method(AddMethod::new("a", "b", "e"));
            let _ = graph.add_method(AddMethod::new("d", "e", "a"));
            graph
        };

        for var in graph.variables() {
            let writers = graph
                .methods()
                .filter(|method| method.outputs().contains(var))
                .count();
            assert_le!(writers, 1, "variable {var:?} has {writers} writers");
        }
    }

    #[test]
    fn unknown_inputs_leave_outputs_unknown() {
        init_logging();
        let mut graph: MethodGraph<&'static str, i64> = MethodGraph::new();
        graph.add_variable("x");
        graph.add_variable_with("b", 4);
        graph.add_method(AddMethod::new("x", "b", "y")).unwrap();
        assert!(graph.get(&"y").is_unknown());

        // the value arriving later flows through
        graph.set("x", 1);
        assert_eq!(*graph.get(&"y"), Value::Single(5));

        // and unsetting it flips the output back to unknown
        graph.set("x", Value::Unknown);
        assert!(graph.get(&"y").is_unknown());
    }

    #[test]
    fn rem_variable_cascades_to_methods() {
        let mut graph = add_graph();
        graph.rem_variable(&"a");

        assert!(!graph.has_variable(&"a"));
        assert_eq!(graph.methods().count(), 0);
        // b and c survive with their last values
        assert_eq!(*graph.get(&"b"), Value::Single(4));
        assert_eq!(*graph.get(&"c"), Value::Single(7));
    }

    #[test]
    #[should_panic(expected = "not in the method graph")]
    fn rem_variable_of_foreign_variable_panics() {
        let mut graph: MethodGraph<&'static str, i64> = MethodGraph::new();
        graph.rem_variable(&"a");
    }

    #[test]
    #[should_panic(expected = "not in the method graph")]
    fn execute_of_foreign_method_panics() {
        let mut graph: MethodGraph<&'static str, i64> = MethodGraph::new();
        let foreign = MethodRef::new(AddMethod::new("a", "b", "c"));
        graph.execute(&foreign);
    }

    #[test]
    fn re_adding_a_held_method_is_a_no_op() {
        let mut graph = add_graph();
        let held = graph.methods().next().unwrap().clone();
        let again = graph.add_method(held.clone()).unwrap();
        assert_eq!(again, held);
        assert_eq!(graph.methods().count(), 1);
    }

    #[test]
    fn deferred_changes_wait_for_propagate() {
        let mut graph = add_graph();
        graph.set_deferred("a", 10);
        assert!(graph.has_pending_changes());
        assert_eq!(*graph.get(&"c"), Value::Single(7));

        graph.propagate();
        assert!(!graph.has_pending_changes());
        assert_eq!(*graph.get(&"c"), Value::Single(14));
    }

    #[test]
    fn clear_removes_everything() {
        let mut graph = add_graph();
        graph.clear();
        assert_eq!(graph.variables().count(), 0);
        assert_eq!(graph.methods().count(), 0);
        assert!(!graph.has_pending_changes());
    }

    #[test]
    fn set_method_pins_its_output() {
        init_logging();
        let mut graph: MethodGraph<&'static str, i64> = MethodGraph::new();
        graph.add_method(SetMethod::new("a", 42)).unwrap();
        assert_eq!(*graph.get(&"a"), Value::Single(42));
    }

    #[test]
    fn assign_method_copies_its_input() {
        init_logging();
        let mut graph: MethodGraph<&'static str, i64> = MethodGraph::new();
        graph.add_variable("src");
        graph.add_method(AssignMethod::new("dst", "src")).unwrap();
        assert!(graph.get(&"dst").is_unknown());

        graph.set("src", 5);
        assert_eq!(*graph.get(&"dst"), Value::Single(5));
    }

    #[test]
    fn sub_method_subtracts() {
        init_logging();
        let mut graph: MethodGraph<&'static str, i64> = MethodGraph::new();
        graph.add_variable_with("a", 10);
        graph.add_variable_with("b", 4);
        graph.add_method(SubMethod::new("a", "b", "c")).unwrap();
        assert_eq!(*graph.get(&"c"), Value::Single(6));
    }

    #[test]
    fn sum_prod_methods_fan_out_over_alternatives() {
        init_logging();
        use MultiVariable::{Multi, Single};

        let mut graph: MethodGraph<MultiVariable<&'static str>, i64> = MethodGraph::new();
        graph.add_variable_with(Single("a"), 1);
        graph.add_variable_with(Single("b"), 2);
        graph.add_variable(Multi("x"));
        graph.add_method(SumProdMethod::new(Single("a"), Single("b"), Multi("x"))).unwrap();

        graph.add_variable_with(Single("p"), 3);
        graph.add_variable_with(Single("q"), 4);
        graph.add_variable(Multi("y"));
        graph.add_method(SumProdMethod::new(Single("p"), Single("q"), Multi("y"))).unwrap();

        assert_eq!(*graph.get(&Multi("x")), Value::Multiple([3, 2].into_iter().collect()));
        assert_eq!(*graph.get(&Multi("y")), Value::Multiple([7, 12].into_iter().collect()));

        graph.add_variable(Multi("z"));
        graph.add_method(SumProdMethod::new(Multi("x"), Multi("y"), Multi("z"))).unwrap();

        let expected: HashSet<i64> = [36, 21, 24, 9, 10, 14, 15].into_iter().collect();
        assert_eq!(*graph.get(&Multi("z")), Value::Multiple(expected));
    }

    #[test]
    fn multi_method_updates_when_an_input_changes() {
        init_logging();
        use MultiVariable::{Multi, Single};

        let mut graph: MethodGraph<MultiVariable<&'static str>, i64> = MethodGraph::new();
        graph.add_variable_with(Single("a"), 1);
        graph.add_variable_with(Single("b"), 2);
        graph.add_method(SumProdMethod::new(Single("a"), Single("b"), Multi("x"))).unwrap();

        graph.set(Single("a"), 5);
        assert_eq!(*graph.get(&Multi("x")), Value::Multiple([7, 10].into_iter().collect()));
    }
}
