//! # Bayesian GSN Frontend
//!
//! Loader for gsn2x-style YAML argument files.

pub mod errors;
pub mod yaml;

// Re-export commonly used types
pub use errors::FrontendError;
pub use yaml::{load_tree, load_tree_file, parse_gsn_yaml};
