//! # Bayesian GSN Core
//!
//! Compiles assurance arguments written in Goal Structuring Notation into
//! discrete Bayesian networks that quantify confidence in the top-level claim.
//!
//! ```rust,ignore
//! use bayesgsn_core::{BayesianGsn, Evidence, GsnElement, GsnTree, GsnType};
//!
//! let tree = GsnTree::build("demo", vec![
//!     GsnElement::new("G1", "System is safe", GsnType::Goal).with_supporters(["Sn1"]),
//!     GsnElement::new("Sn1", "Test report", GsnType::Solution).with_belief(0.95),
//! ])?;
//! let bgsn = BayesianGsn::new("demo", tree)?;
//! println!("{}", bgsn.query_belief(None, &Evidence::new())?);
//! ```

#![forbid(unsafe_code)]

pub mod engine;

// Re-export commonly used types
pub use engine::augment::{AugmentedTree, ImplicitRules};
pub use engine::compiler::BayesianGsn;
pub use engine::config::CompilerConfig;
pub use engine::element::{ElementData, GsnElement, GsnType};
pub use engine::errors::{GsnError, WellFormednessClause};
pub use engine::gate::{build_gate_cpt, GateModel, GateParams, GateTable, MAX_PARENTS};
pub use engine::inference::{Evidence, InferenceEngine, Marginal, VariableElimination};
pub use engine::network::{BayesianNetwork, TabularCpd};
pub use engine::probability::is_valid_probability;
pub use engine::tree::GsnTree;
