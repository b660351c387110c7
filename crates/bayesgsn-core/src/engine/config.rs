//! Compiler configuration.

use crate::engine::errors::GsnError;
use crate::engine::probability::is_valid_probability;

/// Settings that shape the compiled network.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CompilerConfig {
    /// Prior `P(sat)` / `P(sound)` for solutions, axioms, and implicit
    /// strategies that do not declare a belief.
    ///
    /// The default of 1.0 treats unmodeled axioms and evidence as certain,
    /// which directly raises every downstream goal belief. Lower it to make
    /// missing beliefs count against the argument.
    pub default_belief: f64,
    /// Label prefix of synthesized strategies; the goal label is appended.
    pub implicit_rule_prefix: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            default_belief: 1.0,
            implicit_rule_prefix: "implicit_S_".to_string(),
        }
    }
}

impl CompilerConfig {
    pub fn with_default_belief(mut self, belief: f64) -> Self {
        self.default_belief = belief;
        self
    }

    pub fn with_implicit_rule_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.implicit_rule_prefix = prefix.into();
        self
    }

    pub fn validate(&self) -> Result<(), GsnError> {
        if !is_valid_probability(&self.default_belief) {
            return Err(GsnError::Config(format!(
                "default_belief must be in [0, 1], got {}",
                self.default_belief
            )));
        }
        if self.implicit_rule_prefix.is_empty() {
            return Err(GsnError::Config(
                "implicit_rule_prefix must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Label of the implicit strategy inserted for `goal`.
    pub fn implicit_label(&self, goal: &str) -> String {
        format!("{}{}", self.implicit_rule_prefix, goal)
    }
}
