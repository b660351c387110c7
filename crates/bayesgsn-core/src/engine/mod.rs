//! The GSN → Bayesian network engine.
//!
//! This module provides:
//! - **errors**: Error taxonomy for construction, compilation and queries
//! - **probability**: Probability validation helpers
//! - **element** / **tree**: The GSN argument model and its validated graph
//! - **constraints**: Completeness and well-formedness checks
//! - **augment**: Implicit inference rules overlaid on a tree
//! - **gate**: Canonical gate CPT synthesis
//! - **network**: Discrete Bayesian network structure and parameters
//! - **inference**: Inference engine capability and variable elimination
//! - **config**: Compiler configuration
//! - **compiler**: The GSN → BN compiler

pub mod augment;
pub mod compiler;
pub mod config;
pub mod constraints;
pub mod element;
pub mod errors;
pub mod gate;
pub mod inference;
pub mod network;
pub mod probability;
pub mod tree;
