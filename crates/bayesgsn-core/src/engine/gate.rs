//! # Canonical Gates
//!
//! Builds conditional probability tables for a binary child with `n` binary
//! parents from boolean-gate semantics (Díez & Druzdzel, 2007, "Canonical
//! probabilistic models for knowledge engineering").
//!
//! ## Column order
//!
//! Columns enumerate parent assignments with parent 0 as the most significant
//! position and every parent ordered `(true, false)`:
//!
//! ```text
//! n = 2:   col 0   col 1   col 2   col 3
//!   p0     true    true    false   false
//!   p1     true    false   true    false
//! ```
//!
//! This is the same layout [`TabularCpd`](crate::engine::network::TabularCpd)
//! uses for declared parent states, so rows line up positionally.
//!
//! ## Formulas
//!
//! For an assignment `s`, `P(child = positive | s)` is:
//!
//! | gate        | value                                                      |
//! |-------------|------------------------------------------------------------|
//! | `And`       | 1 if all true, else 0                                      |
//! | `Or`        | 1 if any true, else 0                                      |
//! | `NoisyAnd`  | Π_{true i} (1 − trigger_i) × Π_{false j} substitute_j      |
//! | `LeakyAnd`  | (1 − leak) × NoisyAnd                                      |
//! | `NoisyOr`   | 1 − Π_{true i} trigger_i                                   |
//! | `LeakyOr`   | 1 − (1 − leak) × Π_{true i} trigger_i                      |
//!
//! For the OR family a trigger is the probability that a present cause fails
//! to produce the effect.

use std::fmt;
use std::str::FromStr;

use crate::engine::errors::GsnError;
use crate::engine::probability::ensure_probability;

/// Largest supported parent set. Tables above this size are refused.
pub const MAX_PARENTS: usize = 31;

/// Canonical gate kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum GateModel {
    #[default]
    And,
    Or,
    NoisyAnd,
    LeakyAnd,
    NoisyOr,
    LeakyOr,
}

impl GateModel {
    pub const ALL: [GateModel; 6] = [
        GateModel::And,
        GateModel::Or,
        GateModel::NoisyAnd,
        GateModel::LeakyAnd,
        GateModel::NoisyOr,
        GateModel::LeakyOr,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GateModel::And => "and",
            GateModel::Or => "or",
            GateModel::NoisyAnd => "noisy_and",
            GateModel::LeakyAnd => "leaky_and",
            GateModel::NoisyOr => "noisy_or",
            GateModel::LeakyOr => "leaky_or",
        }
    }

    fn needs_triggers(self) -> bool {
        !matches!(self, GateModel::And | GateModel::Or)
    }

    fn needs_substitutes(self) -> bool {
        matches!(self, GateModel::NoisyAnd | GateModel::LeakyAnd)
    }

    fn needs_leak(self) -> bool {
        matches!(self, GateModel::LeakyAnd | GateModel::LeakyOr)
    }
}

impl fmt::Display for GateModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GateModel {
    type Err = GsnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase();
        GateModel::ALL
            .into_iter()
            .find(|g| g.as_str() == tag)
            .ok_or_else(|| GsnError::UnsupportedGate(s.to_string()))
    }
}

/// Optional noise parameters of a gate. `And`/`Or` ignore all of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GateParams {
    /// Per-parent trigger probabilities (one per parent).
    pub trigger_probs: Option<Vec<f64>>,
    /// Per-parent substitute probabilities for the AND family (one per parent).
    pub substitute_probs: Option<Vec<f64>>,
    /// Probability of the independent inhibitor of leaky gates.
    pub leak: Option<f64>,
}

impl GateParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn triggers(mut self, probs: impl Into<Vec<f64>>) -> Self {
        self.trigger_probs = Some(probs.into());
        self
    }

    pub fn substitutes(mut self, probs: impl Into<Vec<f64>>) -> Self {
        self.substitute_probs = Some(probs.into());
        self
    }

    pub fn leak(mut self, leak: f64) -> Self {
        self.leak = Some(leak);
        self
    }
}

/// A 2 × 2ⁿ gate table. Row 0 holds `P(positive | s)`, row 1 its complement.
#[derive(Debug, Clone, PartialEq)]
pub struct GateTable {
    positive: Vec<f64>,
    negative: Vec<f64>,
    parent_count: usize,
}

impl GateTable {
    pub fn positive(&self) -> &[f64] {
        &self.positive
    }

    pub fn negative(&self) -> &[f64] {
        &self.negative
    }

    pub fn parent_count(&self) -> usize {
        self.parent_count
    }

    /// Number of parent assignments (2ⁿ).
    pub fn columns(&self) -> usize {
        self.positive.len()
    }

    pub fn into_rows(self) -> Vec<Vec<f64>> {
        vec![self.positive, self.negative]
    }
}

/// Parent assignment of column `col` for `n` parents; `true` is the positive state.
pub fn assignment(col: usize, n: usize) -> impl Iterator<Item = bool> {
    (0..n).map(move |i| (col >> (n - 1 - i)) & 1 == 0)
}

/// Builds the canonical table of `gate` over `parents`.
///
/// Parameters are validated before anything is computed:
/// trigger and substitute lists must be probabilities with one entry per
/// parent, the leak must be a probability, and at most [`MAX_PARENTS`]
/// parents are accepted.
pub fn build_gate_cpt<S: AsRef<str>>(
    parents: &[S],
    gate: GateModel,
    params: &GateParams,
) -> Result<GateTable, GsnError> {
    let n = parents.len();
    validate_params(n, gate, params)?;

    let columns = 1usize << n;
    let formula = GateFormula::new(gate, params);
    let mut positive = Vec::with_capacity(columns);
    let mut negative = Vec::with_capacity(columns);
    for col in 0..columns {
        let p = formula.eval(assignment(col, n));
        positive.push(p);
        negative.push(1.0 - p);
    }

    Ok(GateTable {
        positive,
        negative,
        parent_count: n,
    })
}

/// Parses `tag` (e.g. `"noisy_or"`) and builds the table.
pub fn build_gate_cpt_from_tag<S: AsRef<str>>(
    parents: &[S],
    tag: &str,
    params: &GateParams,
) -> Result<GateTable, GsnError> {
    build_gate_cpt(parents, tag.parse()?, params)
}

fn validate_params(n: usize, gate: GateModel, params: &GateParams) -> Result<(), GsnError> {
    if let Some(triggers) = &params.trigger_probs {
        ensure_probability(triggers.as_slice(), "trigger probabilities")?;
    }
    if let Some(subs) = &params.substitute_probs {
        if subs.len() != n {
            return Err(GsnError::Range(format!(
                "substitute probabilities need to be provided for all {} parents, got {}",
                n,
                subs.len()
            )));
        }
        ensure_probability(subs.as_slice(), "substitute probabilities")?;
    }
    if let Some(leak) = params.leak {
        ensure_probability(&leak, "leak probability")?;
    }
    if n > MAX_PARENTS {
        return Err(GsnError::Range(format!(
            "number of binary parents is out of bounds (0...{}): {}",
            MAX_PARENTS, n
        )));
    }

    if gate.needs_triggers() {
        let triggers = params
            .trigger_probs
            .as_ref()
            .ok_or(GsnError::MissingGateParameter {
                gate: gate.to_string(),
                parameter: "trigger_probs",
            })?;
        if triggers.len() != n {
            return Err(GsnError::Range(format!(
                "{} needs one trigger probability per parent ({}), got {}",
                gate,
                n,
                triggers.len()
            )));
        }
    }
    if gate.needs_substitutes() && params.substitute_probs.is_none() {
        return Err(GsnError::MissingGateParameter {
            gate: gate.to_string(),
            parameter: "substitute_probs",
        });
    }
    if gate.needs_leak() && params.leak.is_none() {
        return Err(GsnError::MissingGateParameter {
            gate: gate.to_string(),
            parameter: "leak",
        });
    }
    Ok(())
}

/// Per-assignment formula with parameters resolved. Only built after validation.
enum GateFormula<'a> {
    And,
    Or,
    NoisyAnd {
        triggers: &'a [f64],
        substitutes: &'a [f64],
        scale: f64,
    },
    NoisyOr {
        triggers: &'a [f64],
        scale: f64,
    },
}

impl<'a> GateFormula<'a> {
    fn new(gate: GateModel, params: &'a GateParams) -> Self {
        let triggers = params.trigger_probs.as_deref().unwrap_or(&[]);
        let substitutes = params.substitute_probs.as_deref().unwrap_or(&[]);
        let keep = 1.0 - params.leak.unwrap_or(0.0);
        match gate {
            GateModel::And => GateFormula::And,
            GateModel::Or => GateFormula::Or,
            GateModel::NoisyAnd => GateFormula::NoisyAnd {
                triggers,
                substitutes,
                scale: 1.0,
            },
            GateModel::LeakyAnd => GateFormula::NoisyAnd {
                triggers,
                substitutes,
                scale: keep,
            },
            GateModel::NoisyOr => GateFormula::NoisyOr { triggers, scale: 1.0 },
            GateModel::LeakyOr => GateFormula::NoisyOr {
                triggers,
                scale: keep,
            },
        }
    }

    fn eval(&self, mut states: impl Iterator<Item = bool>) -> f64 {
        match self {
            GateFormula::And => {
                if states.all(|s| s) {
                    1.0
                } else {
                    0.0
                }
            }
            GateFormula::Or => {
                if states.any(|s| s) {
                    1.0
                } else {
                    0.0
                }
            }
            GateFormula::NoisyAnd {
                triggers,
                substitutes,
                scale,
            } => {
                let product: f64 = states
                    .enumerate()
                    .map(|(i, s)| if s { 1.0 - triggers[i] } else { substitutes[i] })
                    .product();
                scale * product
            }
            GateFormula::NoisyOr { triggers, scale } => {
                let product: f64 = states
                    .enumerate()
                    .filter(|&(_, s)| s)
                    .map(|(i, _)| triggers[i])
                    .product();
                1.0 - scale * product
            }
        }
    }
}
