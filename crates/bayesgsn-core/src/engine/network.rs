//! # Discrete Bayesian Network
//!
//! Structure and parameters of a compiled network: named variables with
//! named states, directed parent → child edges, and one [`TabularCpd`] per
//! variable.
//!
//! ## Table layout
//!
//! A CPD over a variable with `k` states and parents `p0 .. pn-1` is a
//! `k × Π card(pi)` table. Row `r` is the variable's `r`-th state. Columns
//! enumerate parent states with `p0` most significant and each parent's
//! states in declaration order, matching [`gate::assignment`](crate::engine::gate::assignment)
//! for binary parents.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::engine::errors::GsnError;
use crate::engine::gate::GateTable;
use crate::engine::probability::ensure_probability;

/// Tolerance for CPD columns summing to one.
const COLUMN_SUM_TOLERANCE: f64 = 1e-8;

/// Conditional probability table of one variable.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TabularCpd {
    variable: String,
    states: Vec<String>,
    parents: Vec<String>,
    parent_states: Vec<Vec<String>>,
    values: Vec<Vec<f64>>,
}

impl TabularCpd {
    /// Builds a CPD, checking the table shape and that every entry is a probability.
    pub fn new(
        variable: impl Into<String>,
        states: Vec<String>,
        parents: Vec<(String, Vec<String>)>,
        values: Vec<Vec<f64>>,
    ) -> Result<Self, GsnError> {
        let variable = variable.into();
        let (parents, parent_states): (Vec<String>, Vec<Vec<String>>) =
            parents.into_iter().unzip();

        if states.len() < 2 {
            return Err(GsnError::Assembly(format!(
                "variable '{}' needs at least two states",
                variable
            )));
        }
        if let Some(p) = parent_states.iter().position(|s| s.is_empty()) {
            return Err(GsnError::Assembly(format!(
                "parent '{}' of '{}' declares no states",
                parents[p], variable
            )));
        }
        let columns: usize = parent_states.iter().map(Vec::len).product();
        if values.len() != states.len() || values.iter().any(|row| row.len() != columns) {
            return Err(GsnError::Assembly(format!(
                "CPD of '{}' must have shape {}x{}",
                variable,
                states.len(),
                columns
            )));
        }
        ensure_probability(&values, &format!("CPD values of '{}'", variable))?;

        Ok(Self {
            variable,
            states,
            parents,
            parent_states,
            values,
        })
    }

    /// Parentless binary CPD with `P(states[0]) = positive`.
    pub fn prior(
        variable: impl Into<String>,
        states: [&str; 2],
        positive: f64,
    ) -> Result<Self, GsnError> {
        let variable = variable.into();
        ensure_probability(&positive, &format!("belief for element {}", variable))?;
        Self::new(
            variable,
            states.iter().map(|s| s.to_string()).collect(),
            Vec::new(),
            vec![vec![positive], vec![1.0 - positive]],
        )
    }

    /// Binary CPD whose rows come from a canonical gate table.
    pub fn from_gate(
        variable: impl Into<String>,
        states: [&str; 2],
        parents: Vec<(String, Vec<String>)>,
        table: GateTable,
    ) -> Result<Self, GsnError> {
        let variable = variable.into();
        if table.parent_count() != parents.len() {
            return Err(GsnError::Assembly(format!(
                "gate table of '{}' covers {} parents but {} are declared",
                variable,
                table.parent_count(),
                parents.len()
            )));
        }
        Self::new(
            variable,
            states.iter().map(|s| s.to_string()).collect(),
            parents,
            table.into_rows(),
        )
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn states(&self) -> &[String] {
        &self.states
    }

    pub fn cardinality(&self) -> usize {
        self.states.len()
    }

    pub fn parents(&self) -> &[String] {
        &self.parents
    }

    pub fn parent_states(&self) -> &[Vec<String>] {
        &self.parent_states
    }

    pub fn parent_cardinalities(&self) -> Vec<usize> {
        self.parent_states.iter().map(Vec::len).collect()
    }

    /// Rows of the table, one per state.
    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    pub fn columns(&self) -> usize {
        self.values.first().map_or(1, Vec::len)
    }

    pub fn state_index(&self, state: &str) -> Option<usize> {
        self.states.iter().position(|s| s == state)
    }

    /// Entry for `state` given parent states by index, `p0` first.
    pub fn value(&self, state: usize, parent_assignment: &[usize]) -> Option<f64> {
        if parent_assignment.len() != self.parents.len() {
            return None;
        }
        let mut col = 0usize;
        for (&s, states) in parent_assignment.iter().zip(&self.parent_states) {
            if s >= states.len() {
                return None;
            }
            col = col * states.len() + s;
        }
        self.values.get(state)?.get(col).copied()
    }
}

/// A discrete Bayesian network: variables, edges, and CPDs.
#[derive(Debug, Clone, Default)]
pub struct BayesianNetwork {
    variables: Vec<String>,
    index: FxHashMap<String, usize>,
    edges: Vec<(String, String)>,
    edge_set: FxHashSet<(usize, usize)>,
    parents: Vec<SmallVec<[usize; 4]>>,
    cpds: Vec<Option<TabularCpd>>,
}

impl BayesianNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembles a network from edges and CPDs.
    ///
    /// Unlike [`add_cpd`](Self::add_cpd), a second CPD for the same variable is
    /// an error. The result is not checked; run [`check_model`](Self::check_model)
    /// or an [`InferenceEngine`](crate::engine::inference::InferenceEngine) on it.
    pub fn from_parts<E, C>(edges: E, cpds: C) -> Result<Self, GsnError>
    where
        E: IntoIterator<Item = (String, String)>,
        C: IntoIterator<Item = TabularCpd>,
    {
        let mut network = Self::new();
        network.add_edges(edges)?;
        for cpd in cpds {
            if network.cpd(cpd.variable()).is_some() {
                return Err(GsnError::Assembly(format!(
                    "multiple CPDs for variable '{}'",
                    cpd.variable()
                )));
            }
            network.add_cpd(cpd);
        }
        Ok(network)
    }

    /// Adds a variable if missing and returns its index.
    pub fn add_variable(&mut self, name: &str) -> usize {
        if let Some(&i) = self.index.get(name) {
            return i;
        }
        let i = self.variables.len();
        self.variables.push(name.to_string());
        self.index.insert(name.to_string(), i);
        self.parents.push(SmallVec::new());
        self.cpds.push(None);
        i
    }

    /// Adds `parent -> child`. Duplicate edges are ignored, self-loops rejected.
    pub fn add_edge(&mut self, parent: &str, child: &str) -> Result<(), GsnError> {
        if parent == child {
            return Err(GsnError::Assembly(format!(
                "self-loop on variable '{}'",
                parent
            )));
        }
        let p = self.add_variable(parent);
        let c = self.add_variable(child);
        if self.edge_set.insert((p, c)) {
            self.edges.push((parent.to_string(), child.to_string()));
            self.parents[c].push(p);
        }
        Ok(())
    }

    pub fn add_edges<I>(&mut self, edges: I) -> Result<(), GsnError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (parent, child) in edges {
            self.add_edge(&parent, &child)?;
        }
        Ok(())
    }

    /// Sets the CPD of its variable, replacing any previous one.
    pub fn add_cpd(&mut self, cpd: TabularCpd) {
        let i = self.add_variable(cpd.variable());
        self.cpds[i] = Some(cpd);
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn edges(&self) -> &[(String, String)] {
        &self.edges
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn cpd(&self, name: &str) -> Option<&TabularCpd> {
        self.index_of(name).and_then(|i| self.cpds[i].as_ref())
    }

    pub fn cpds(&self) -> impl Iterator<Item = &TabularCpd> {
        self.cpds.iter().flatten()
    }

    /// Parents declared through edges, in insertion order.
    pub fn parents(&self, name: &str) -> Option<Vec<&str>> {
        let i = self.index_of(name)?;
        Some(
            self.parents[i]
                .iter()
                .map(|&p| self.variables[p].as_str())
                .collect(),
        )
    }

    pub(crate) fn parent_indices(&self, var: usize) -> &[usize] {
        &self.parents[var]
    }

    pub(crate) fn cpd_at(&self, var: usize) -> Option<&TabularCpd> {
        self.cpds[var].as_ref()
    }

    /// Structural and parameter consistency check.
    ///
    /// Fails with [`GsnError::Assembly`] when a variable has no CPD, a CPD's
    /// parents differ from the declared edges, a parent's states disagree
    /// with that parent's own CPD, a column does not sum to one, or the
    /// edges form a cycle.
    pub fn check_model(&self) -> Result<(), GsnError> {
        for (i, name) in self.variables.iter().enumerate() {
            let cpd = self.cpds[i].as_ref().ok_or_else(|| {
                GsnError::Assembly(format!("no CPD associated with variable '{}'", name))
            })?;

            let declared: FxHashSet<&str> = self.parents[i]
                .iter()
                .map(|&p| self.variables[p].as_str())
                .collect();
            let in_cpd: FxHashSet<&str> = cpd.parents().iter().map(String::as_str).collect();
            if declared != in_cpd || in_cpd.len() != cpd.parents().len() {
                return Err(GsnError::Assembly(format!(
                    "CPD of '{}' lists parents {:?} but the network declares {:?}",
                    name,
                    cpd.parents(),
                    self.parents(name).unwrap_or_default()
                )));
            }

            for (parent, states) in cpd.parents().iter().zip(cpd.parent_states()) {
                let parent_cpd = self.cpd(parent).ok_or_else(|| {
                    GsnError::Assembly(format!(
                        "parent '{}' of '{}' has no CPD",
                        parent, name
                    ))
                })?;
                if parent_cpd.states() != states.as_slice() {
                    return Err(GsnError::Assembly(format!(
                        "CPD of '{}' expects states {:?} for parent '{}' which declares {:?}",
                        name,
                        states,
                        parent,
                        parent_cpd.states()
                    )));
                }
            }

            for col in 0..cpd.columns() {
                let sum: f64 = cpd.values().iter().map(|row| row[col]).sum();
                if (sum - 1.0).abs() > COLUMN_SUM_TOLERANCE {
                    return Err(GsnError::Assembly(format!(
                        "column {} of the CPD of '{}' sums to {} instead of 1",
                        col, name, sum
                    )));
                }
            }
        }

        if self.topological_order().is_none() {
            return Err(GsnError::Assembly("network contains a cycle".into()));
        }
        Ok(())
    }

    /// Variable indices with parents first, or `None` if cyclic.
    pub(crate) fn topological_order(&self) -> Option<Vec<usize>> {
        let n = self.variables.len();
        let mut children: Vec<SmallVec<[usize; 4]>> = vec![SmallVec::new(); n];
        let mut remaining: Vec<usize> = vec![0; n];
        for (c, parents) in self.parents.iter().enumerate() {
            remaining[c] = parents.len();
            for &p in parents {
                children[p].push(c);
            }
        }
        let mut ready: Vec<usize> = (0..n).rev().filter(|&v| remaining[v] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(v) = ready.pop() {
            order.push(v);
            for &c in &children[v] {
                remaining[c] -= 1;
                if remaining[c] == 0 {
                    ready.push(c);
                }
            }
        }
        (order.len() == n).then_some(order)
    }
}
