//! Error types for loading argument files.

use bayesgsn_core::GsnError;
use thiserror::Error;

/// Errors that can occur while reading, parsing, or building a tree.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum FrontendError {
    /// Malformed YAML.
    #[error("parse error: {0}")]
    ParseError(String),

    /// Well-formed YAML that does not describe a GSN argument.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// The input file could not be read.
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The elements parsed but do not form a valid tree.
    #[error(transparent)]
    Tree(#[from] GsnError),
}

impl FrontendError {
    /// Returns the underlying tree error, if any.
    pub fn tree_error(&self) -> Option<&GsnError> {
        match self {
            Self::Tree(err) => Some(err),
            _ => None,
        }
    }
}
