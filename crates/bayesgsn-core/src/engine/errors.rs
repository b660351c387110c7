//! Error types for GSN tree construction, compilation, and querying.

use std::fmt;

use thiserror::Error;

/// Well-formedness clause of a GSN argument (Nesic et al. 2021, Definition 11).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellFormednessClause {
    /// i) Goals do not support other goals directly.
    NoGoalToGoal,
    /// ii) A goal is supported by exactly one strategy, or by at least one solution.
    GoalSupport,
    /// iii) Every strategy is in context of a justification.
    StrategyJustified,
}

impl fmt::Display for WellFormednessClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoGoalToGoal => write!(f, "i) goals cannot be supported by other goals"),
            Self::GoalSupport => write!(
                f,
                "ii) each goal is supported by exactly one strategy or at least one solution"
            ),
            Self::StrategyJustified => {
                write!(f, "iii) each strategy is in context of a justification")
            }
        }
    }
}

/// Errors raised while building, compiling, editing, or querying a Bayesian GSN.
///
/// Every operation validates before it mutates, so an `Err` never leaves a
/// half-updated tree or network behind.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GsnError {
    /// A `supportedBy` / `inContextOf` reference uses an illegal type pair or an unknown label.
    #[error("relation error at node '{node}': {message}")]
    Relation { node: String, message: String },

    /// Zero or multiple roots, cycles, duplicate or empty labels.
    #[error("structure error: {0}")]
    Structure(String),

    /// A goal lacks a justification, directly or via its strategy.
    #[error("completeness constraint violated by node '{0}': each goal needs a justification, directly or via its strategy")]
    Completeness(String),

    /// One of the well-formedness clauses is violated.
    #[error("well-formedness constraint {clause} violated by node '{node}'")]
    WellFormedness {
        clause: WellFormednessClause,
        node: String,
    },

    /// Unknown gate tag.
    #[error("unsupported gate type: {0}")]
    UnsupportedGate(String),

    /// A probability parameter lies outside [0, 1].
    #[error("invalid probability: {0}")]
    InvalidProbability(String),

    /// Parent count above the cap or a parameter list with the wrong length.
    #[error("range error: {0}")]
    Range(String),

    /// A gate needs a parameter that was not supplied.
    #[error("gate {gate} requires parameter '{parameter}'")]
    MissingGateParameter {
        gate: String,
        parameter: &'static str,
    },

    /// Label not found in the tree, network, or implicit-rule registry.
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// An operation requiring a goal was given another element type.
    #[error("node '{node}' is of type {actual} but must be a {expected}")]
    WrongElementType {
        node: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// The assembled network failed the consistency check.
    #[error("assembly error: {0}")]
    Assembly(String),

    /// The inference engine could not answer a query.
    #[error("inference error: {0}")]
    Inference(String),

    /// Invalid compiler configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl GsnError {
    pub(crate) fn relation(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Relation {
            node: node.into(),
            message: message.into(),
        }
    }

    pub(crate) fn well_formedness(clause: WellFormednessClause, node: impl Into<String>) -> Self {
        Self::WellFormedness {
            clause,
            node: node.into(),
        }
    }

    /// Returns the violated clause for well-formedness errors.
    pub fn clause(&self) -> Option<WellFormednessClause> {
        match self {
            Self::WellFormedness { clause, .. } => Some(*clause),
            _ => None,
        }
    }
}
