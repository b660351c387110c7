//! # Inference
//!
//! [`InferenceEngine`] is the capability the compiler delegates to: a model
//! consistency check and an exact single-variable marginal query.
//! [`VariableElimination`] is the bundled implementation.
//!
//! ## Variable elimination
//!
//! 1. Keep only the target, the evidence variables, and their ancestors
//!    (other variables are barren and sum out to one).
//! 2. Turn each kept CPD into a factor and reduce it by the evidence.
//! 3. Repeatedly eliminate the variable whose combined factor is smallest.
//! 4. Multiply what is left and normalize over the target's states.

use std::collections::BTreeMap;
use std::fmt;

use smallvec::SmallVec;

use crate::engine::errors::GsnError;
use crate::engine::network::BayesianNetwork;

/// Observed states, keyed by variable name.
pub type Evidence = BTreeMap<String, String>;

/// Posterior distribution of one variable.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Marginal {
    pub variable: String,
    pub states: Vec<String>,
    pub values: Vec<f64>,
}

impl Marginal {
    pub fn probability(&self, state: &str) -> Option<f64> {
        self.states
            .iter()
            .position(|s| s == state)
            .map(|i| self.values[i])
    }

    /// State with the highest probability (first one on ties).
    pub fn most_likely(&self) -> Option<&str> {
        let mut best: Option<usize> = None;
        for (i, v) in self.values.iter().enumerate() {
            if best.map_or(true, |b| *v > self.values[b]) {
                best = Some(i);
            }
        }
        best.map(|i| self.states[i].as_str())
    }
}

impl fmt::Display for Marginal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P({})", self.variable)?;
        for (state, value) in self.states.iter().zip(&self.values) {
            write!(f, " {}={:.4}", state, value)?;
        }
        Ok(())
    }
}

/// Consistency check and exact marginal queries over a [`BayesianNetwork`].
pub trait InferenceEngine {
    /// Fails with [`GsnError::Assembly`] on structural or parameter defects.
    fn validate(&self, network: &BayesianNetwork) -> Result<(), GsnError>;

    /// Exact posterior of `target` given `evidence`.
    fn marginal(
        &self,
        network: &BayesianNetwork,
        target: &str,
        evidence: &Evidence,
    ) -> Result<Marginal, GsnError>;
}

/// Exact inference by variable elimination with a greedy min-size order.
#[derive(Debug, Clone, Copy, Default)]
pub struct VariableElimination;

impl InferenceEngine for VariableElimination {
    fn validate(&self, network: &BayesianNetwork) -> Result<(), GsnError> {
        network.check_model()
    }

    fn marginal(
        &self,
        network: &BayesianNetwork,
        target: &str,
        evidence: &Evidence,
    ) -> Result<Marginal, GsnError> {
        let target_idx = network
            .index_of(target)
            .ok_or_else(|| GsnError::UnknownNode(target.to_string()))?;
        let target_cpd = network
            .cpd_at(target_idx)
            .ok_or_else(|| GsnError::Inference(format!("no CPD for '{}'", target)))?;

        let observed = resolve_evidence(network, evidence)?;

        let relevant = ancestral_set(network, target_idx, observed.keys().copied());
        let mut factors = Vec::with_capacity(relevant.len());
        for &var in &relevant {
            let mut factor = Factor::from_cpd(network, var)?;
            for (&e, &state) in &observed {
                if factor.vars.contains(&e) {
                    factor = factor.reduce(e, state);
                }
            }
            factors.push(factor);
        }

        let mut hidden: Vec<usize> = relevant
            .iter()
            .copied()
            .filter(|v| *v != target_idx && !observed.contains_key(v))
            .collect();

        while !hidden.is_empty() {
            let (pos, _) = hidden
                .iter()
                .enumerate()
                .map(|(pos, &v)| (pos, elimination_cost(&factors, v)))
                .min_by_key(|&(_, cost)| cost)
                .ok_or_else(|| GsnError::Inference("empty elimination frontier".into()))?;
            let var = hidden.swap_remove(pos);

            let (touching, rest): (Vec<Factor>, Vec<Factor>) =
                factors.into_iter().partition(|f| f.vars.contains(&var));
            factors = rest;
            if let Some(product) = touching.into_iter().reduce(|a, b| a.product(&b)) {
                factors.push(product.sum_out(var));
            }
        }

        let joint = factors
            .into_iter()
            .reduce(|a, b| a.product(&b))
            .ok_or_else(|| GsnError::Inference(format!("no factors left for '{}'", target)))?;
        // an observed target is reduced away like any other evidence variable
        let observed_target = observed.get(&target_idx).copied();
        let expected_scope: &[usize] = match observed_target {
            Some(_) => &[],
            None => &[target_idx],
        };
        if joint.vars.as_slice() != expected_scope {
            return Err(GsnError::Inference(format!(
                "elimination for '{}' left unexpected scope",
                target
            )));
        }

        let total: f64 = joint.values.iter().sum();
        if total <= 0.0 || !total.is_finite() {
            return Err(GsnError::Inference(
                "evidence has zero probability under the model".into(),
            ));
        }

        let values = match observed_target {
            Some(state) => {
                let mut values = vec![0.0; target_cpd.cardinality()];
                values[state] = 1.0;
                values
            }
            None => joint.values.iter().map(|v| v / total).collect(),
        };
        Ok(Marginal {
            variable: target.to_string(),
            states: target_cpd.states().to_vec(),
            values,
        })
    }
}

fn resolve_evidence(
    network: &BayesianNetwork,
    evidence: &Evidence,
) -> Result<BTreeMap<usize, usize>, GsnError> {
    let mut observed = BTreeMap::new();
    for (name, state) in evidence {
        let var = network
            .index_of(name)
            .ok_or_else(|| GsnError::UnknownNode(name.clone()))?;
        let cpd = network
            .cpd_at(var)
            .ok_or_else(|| GsnError::Inference(format!("no CPD for '{}'", name)))?;
        let s = cpd.state_index(state).ok_or_else(|| {
            GsnError::UnknownNode(format!("state '{}' of variable '{}'", state, name))
        })?;
        observed.insert(var, s);
    }
    Ok(observed)
}

/// Target, evidence variables and all their ancestors, ascending.
fn ancestral_set(
    network: &BayesianNetwork,
    target: usize,
    evidence: impl Iterator<Item = usize>,
) -> Vec<usize> {
    let mut keep = vec![false; network.variables().len()];
    let mut stack: Vec<usize> = std::iter::once(target).chain(evidence).collect();
    while let Some(v) = stack.pop() {
        if std::mem::replace(&mut keep[v], true) {
            continue;
        }
        stack.extend(network.parent_indices(v).iter().copied());
    }
    keep.iter()
        .enumerate()
        .filter_map(|(v, &k)| k.then_some(v))
        .collect()
}

/// Size of the product of all factors mentioning `var`.
fn elimination_cost(factors: &[Factor], var: usize) -> usize {
    let mut scope: SmallVec<[(usize, usize); 8]> = SmallVec::new();
    for factor in factors.iter().filter(|f| f.vars.contains(&var)) {
        for (&v, &c) in factor.vars.iter().zip(&factor.cards) {
            if !scope.iter().any(|&(s, _)| s == v) {
                scope.push((v, c));
            }
        }
    }
    scope
        .iter()
        .fold(1usize, |acc, &(_, c)| acc.saturating_mul(c))
}

/// Dense table over `vars`, row-major with the last variable fastest.
#[derive(Debug, Clone)]
struct Factor {
    vars: Vec<usize>,
    cards: Vec<usize>,
    values: Vec<f64>,
}

impl Factor {
    fn from_cpd(network: &BayesianNetwork, var: usize) -> Result<Self, GsnError> {
        let cpd = network.cpd_at(var).ok_or_else(|| {
            GsnError::Inference(format!("no CPD for '{}'", network.variables()[var]))
        })?;
        let mut vars = Vec::with_capacity(cpd.parents().len() + 1);
        vars.push(var);
        for parent in cpd.parents() {
            let p = network.index_of(parent).ok_or_else(|| {
                GsnError::Inference(format!(
                    "dangling parent '{}' in CPD of '{}'",
                    parent,
                    cpd.variable()
                ))
            })?;
            vars.push(p);
        }
        let mut cards = vec![cpd.cardinality()];
        cards.extend(cpd.parent_cardinalities());
        let values = cpd.values().iter().flatten().copied().collect();
        Ok(Self { vars, cards, values })
    }

    fn strides(&self) -> Vec<usize> {
        let mut strides = vec![1usize; self.vars.len()];
        for i in (0..self.vars.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * self.cards[i + 1];
        }
        strides
    }

    /// Fixes `var` to `state` and drops it from the scope.
    fn reduce(&self, var: usize, state: usize) -> Factor {
        let Some(axis) = self.vars.iter().position(|&v| v == var) else {
            return self.clone();
        };
        let strides = self.strides();
        let mut vars = self.vars.clone();
        let mut cards = self.cards.clone();
        vars.remove(axis);
        cards.remove(axis);

        let outer = self.values.len() / (self.cards[axis] * strides[axis]);
        let inner = strides[axis];
        let mut values = Vec::with_capacity(outer * inner);
        for o in 0..outer {
            let base = o * self.cards[axis] * inner + state * inner;
            values.extend_from_slice(&self.values[base..base + inner]);
        }
        Factor { vars, cards, values }
    }

    /// Sums `var` out of the scope.
    fn sum_out(&self, var: usize) -> Factor {
        let Some(axis) = self.vars.iter().position(|&v| v == var) else {
            return self.clone();
        };
        let strides = self.strides();
        let mut vars = self.vars.clone();
        let mut cards = self.cards.clone();
        vars.remove(axis);
        cards.remove(axis);

        let card = self.cards[axis];
        let inner = strides[axis];
        let outer = self.values.len() / (card * inner);
        let mut values = vec![0.0; outer * inner];
        for o in 0..outer {
            for s in 0..card {
                let base = (o * card + s) * inner;
                for i in 0..inner {
                    values[o * inner + i] += self.values[base + i];
                }
            }
        }
        Factor { vars, cards, values }
    }

    fn product(&self, other: &Factor) -> Factor {
        let mut vars = self.vars.clone();
        let mut cards = self.cards.clone();
        for (&v, &c) in other.vars.iter().zip(&other.cards) {
            if !vars.contains(&v) {
                vars.push(v);
                cards.push(c);
            }
        }

        let self_strides = self.strides();
        let other_strides = other.strides();
        // stride of each result axis inside each operand, 0 when absent
        let map_strides = |f: &Factor, s: &[usize]| -> Vec<usize> {
            vars.iter()
                .map(|v| f.vars.iter().position(|x| x == v).map_or(0, |i| s[i]))
                .collect()
        };
        let a_map = map_strides(self, &self_strides);
        let b_map = map_strides(other, &other_strides);

        let size: usize = cards.iter().product();
        let mut values = Vec::with_capacity(size);
        let mut counter = vec![0usize; vars.len()];
        let (mut ia, mut ib) = (0usize, 0usize);
        for _ in 0..size {
            values.push(self.values[ia] * other.values[ib]);
            // odometer increment, last axis fastest
            for axis in (0..vars.len()).rev() {
                counter[axis] += 1;
                ia += a_map[axis];
                ib += b_map[axis];
                if counter[axis] < cards[axis] {
                    break;
                }
                ia -= a_map[axis] * cards[axis];
                ib -= b_map[axis] * cards[axis];
                counter[axis] = 0;
            }
        }
        Factor { vars, cards, values }
    }
}
