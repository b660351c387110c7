//! # GSN → Bayesian Network Compiler
//!
//! Maps a GSN argument to a discrete Bayesian network following Table 3 of
//! Nesic et al. 2021, "Building assurance cases with Bayesian networks"
//! (<https://doi.org/10.1016/j.ssci.2021.105187>).
//!
//! ## Pipeline
//!
//! 1. completeness and well-formedness checks ([`constraints`](crate::engine::constraints))
//! 2. implicit strategies for goals without one ([`ImplicitRules`])
//! 3. variables, in this order:
//!    - solutions, contexts, justifications, assumptions: root priors
//!      (`sat`/`notSat`), `P(sat)` = declared belief or the configured default
//!    - explicit strategies (`sound`/`notSound`): AND over their contexts
//!    - implicit strategies: root priors, `P(sound)` = default belief
//!    - goals (`sat`/`notSat`): AND over everything they reference, their
//!      strategy included, plus the goals supporting that strategy
//! 4. assembly, checked by the [`InferenceEngine`]
//!
//! A failed step leaves nothing behind: [`BayesianGsn`] only exists once the
//! network has been assembled and validated.
//!
//! ## Example
//!
//! ```rust,ignore
//! use bayesgsn_core::{BayesianGsn, GsnElement, GsnTree, GsnType};
//!
//! let tree = GsnTree::build("demo", vec![
//!     GsnElement::new("G1", "System is safe", GsnType::Goal).with_supporters(["Sn1"]),
//!     GsnElement::new("Sn1", "Test report", GsnType::Solution).with_belief(0.9),
//! ])?;
//! let bgsn = BayesianGsn::new("demo", tree)?;
//! let belief = bgsn.query_belief_value(None, &Default::default())?;
//! ```

use crate::engine::augment::{AugmentedTree, ImplicitRules};
use crate::engine::config::CompilerConfig;
use crate::engine::constraints::{check_completeness, check_well_formedness};
use crate::engine::element::{GsnElement, GsnType};
use crate::engine::errors::GsnError;
use crate::engine::gate::{build_gate_cpt, GateModel, GateParams};
use crate::engine::inference::{Evidence, InferenceEngine, Marginal, VariableElimination};
use crate::engine::network::{BayesianNetwork, TabularCpd};
use crate::engine::probability::ensure_probability;
use crate::engine::tree::GsnTree;

/// A GSN argument compiled into a Bayesian network.
#[derive(Debug, Clone)]
pub struct BayesianGsn<E: InferenceEngine = VariableElimination> {
    name: String,
    tree: GsnTree,
    implicit_rules: ImplicitRules,
    network: BayesianNetwork,
    config: CompilerConfig,
    engine: E,
}

impl BayesianGsn<VariableElimination> {
    /// Compiles `tree` with the default configuration.
    pub fn new(name: impl Into<String>, tree: GsnTree) -> Result<Self, GsnError> {
        Self::with_config(name, tree, CompilerConfig::default())
    }

    pub fn with_config(
        name: impl Into<String>,
        tree: GsnTree,
        config: CompilerConfig,
    ) -> Result<Self, GsnError> {
        Self::with_engine(name, tree, config, VariableElimination)
    }
}

impl<E: InferenceEngine> BayesianGsn<E> {
    /// Compiles `tree`, delegating model checks and queries to `engine`.
    pub fn with_engine(
        name: impl Into<String>,
        tree: GsnTree,
        config: CompilerConfig,
        engine: E,
    ) -> Result<Self, GsnError> {
        let name = name.into();
        config.validate()?;
        check_completeness(&tree)?;
        check_well_formedness(&tree)?;

        let implicit_rules = ImplicitRules::derive(&tree, &config)?;
        #[cfg(feature = "tracing")]
        if !implicit_rules.is_empty() {
            tracing::info!(
                tree = %name,
                rules = ?implicit_rules.labels().collect::<Vec<_>>(),
                "added implicit inference rules"
            );
        }

        let network = assemble(&tree, &implicit_rules, &config)?;
        engine.validate(&network)?;

        #[cfg(feature = "tracing")]
        tracing::info!(
            tree = %name,
            variables = network.variables().len(),
            edges = network.edges().len(),
            "compiled GSN tree into Bayesian network"
        );

        Ok(Self {
            name,
            tree,
            implicit_rules,
            network,
            config,
            engine,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The tree as given, without implicit strategies.
    pub fn tree(&self) -> &GsnTree {
        &self.tree
    }

    pub fn network(&self) -> &BayesianNetwork {
        &self.network
    }

    pub fn implicit_rules(&self) -> &ImplicitRules {
        &self.implicit_rules
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The tree with implicit strategies overlaid.
    pub fn augmented_tree(&self) -> AugmentedTree<'_> {
        AugmentedTree::new(&self.tree, &self.implicit_rules)
    }

    /// Current network parents of `goal`, in CPD column order.
    pub fn goal_parents(&self, goal: &str) -> Result<&[String], GsnError> {
        self.require_goal(goal)?;
        self.network
            .cpd(goal)
            .map(TabularCpd::parents)
            .ok_or_else(|| GsnError::UnknownNode(goal.to_string()))
    }

    /// Replaces the prior `P(sound)` of an implicit strategy.
    pub fn set_implicit_belief(&mut self, label: &str, value: f64) -> Result<(), GsnError> {
        self.set_implicit_beliefs([(label, value)])
    }

    /// Replaces several implicit-strategy priors. Every entry is validated
    /// before any table changes.
    pub fn set_implicit_beliefs<'a, I>(&mut self, beliefs: I) -> Result<(), GsnError>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut updated = Vec::new();
        for (label, value) in beliefs {
            if !self.implicit_rules.contains(label) {
                return Err(GsnError::UnknownNode(format!(
                    "'{}' is not an implicit inference rule of this tree",
                    label
                )));
            }
            ensure_probability(&value, &format!("belief for element {}", label))?;
            updated.push(TabularCpd::prior(
                label,
                GsnType::Strategy.state_names(),
                value,
            )?);
        }

        for cpd in updated {
            #[cfg(feature = "tracing")]
            tracing::info!(
                rule = cpd.variable(),
                belief = cpd.values()[0][0],
                "set implicit rule belief"
            );
            self.network.add_cpd(cpd);
        }
        Ok(())
    }

    /// Rebuilds the CPD of `goal` with another gate over its current parents.
    ///
    /// Parents and their states are read off the existing table, not recomputed
    /// from the tree.
    pub fn change_goal_aggregation(
        &mut self,
        goal: &str,
        gate: GateModel,
        params: &GateParams,
    ) -> Result<(), GsnError> {
        self.require_goal(goal)?;
        let old = self
            .network
            .cpd(goal)
            .ok_or_else(|| GsnError::UnknownNode(goal.to_string()))?;

        if let Some((parent, states)) = old
            .parents()
            .iter()
            .zip(old.parent_states())
            .find(|(_, states)| states.len() != 2)
        {
            return Err(GsnError::Range(format!(
                "gate aggregation needs binary parents, '{}' has {} states",
                parent,
                states.len()
            )));
        }

        let table = build_gate_cpt(old.parents(), gate, params)?;
        let cpd = TabularCpd::new(
            goal,
            old.states().to_vec(),
            old.parents()
                .iter()
                .cloned()
                .zip(old.parent_states().iter().cloned())
                .collect(),
            table.into_rows(),
        )?;

        #[cfg(feature = "tracing")]
        tracing::info!(goal, %gate, parents = cpd.parents().len(), "changed goal aggregation");

        self.network.add_cpd(cpd);
        Ok(())
    }

    /// [`change_goal_aggregation`](Self::change_goal_aggregation) with a gate tag such as `"leaky_or"`.
    pub fn change_goal_aggregation_tag(
        &mut self,
        goal: &str,
        gate: &str,
        params: &GateParams,
    ) -> Result<(), GsnError> {
        self.change_goal_aggregation(goal, gate.parse()?, params)
    }

    /// Posterior over the states of `goal` (the root claim when `None`) given `evidence`.
    pub fn query_belief(
        &self,
        goal: Option<&str>,
        evidence: &Evidence,
    ) -> Result<Marginal, GsnError> {
        let target = match goal {
            Some(goal) => {
                self.require_goal(goal)?;
                goal
            }
            None => {
                let root = self.tree.root().label();
                #[cfg(feature = "tracing")]
                tracing::debug!(goal = root, "querying primary goal");
                root
            }
        };
        self.engine.marginal(&self.network, target, evidence)
    }

    /// `P(goal = sat | evidence)`.
    pub fn query_belief_value(
        &self,
        goal: Option<&str>,
        evidence: &Evidence,
    ) -> Result<f64, GsnError> {
        let marginal = self.query_belief(goal, evidence)?;
        marginal
            .probability(GsnType::Goal.positive_state())
            .ok_or_else(|| {
                GsnError::Inference(format!(
                    "'{}' has no state '{}'",
                    marginal.variable,
                    GsnType::Goal.positive_state()
                ))
            })
    }

    fn require_goal(&self, goal: &str) -> Result<&GsnElement, GsnError> {
        let element = self.tree.element(goal).ok_or_else(|| {
            GsnError::UnknownNode(format!(
                "'{}' is not part of the GSN tree '{}'",
                goal, self.name
            ))
        })?;
        if element.element_type() != GsnType::Goal {
            return Err(GsnError::WrongElementType {
                node: goal.to_string(),
                expected: GsnType::Goal.name(),
                actual: element.element_type().name(),
            });
        }
        Ok(element)
    }
}

fn prior_cpd(element: &GsnElement, default_belief: f64) -> Result<TabularCpd, GsnError> {
    TabularCpd::prior(
        element.label(),
        element.element_type().state_names(),
        element.belief().unwrap_or(default_belief),
    )
}

fn and_cpd(child: &GsnElement, parents: &[&GsnElement]) -> Result<TabularCpd, GsnError> {
    let labels: Vec<&str> = parents.iter().map(|p| p.label()).collect();
    let table = build_gate_cpt(&labels, GateModel::And, &GateParams::new())?;
    let declared = parents
        .iter()
        .map(|p| {
            let states = p.element_type().state_names();
            (
                p.label().to_string(),
                states.iter().map(|s| s.to_string()).collect(),
            )
        })
        .collect();
    TabularCpd::from_gate(
        child.label(),
        child.element_type().state_names(),
        declared,
        table,
    )
}

fn assemble(
    tree: &GsnTree,
    rules: &ImplicitRules,
    config: &CompilerConfig,
) -> Result<BayesianNetwork, GsnError> {
    let view = AugmentedTree::new(tree, rules);
    let mut edges: Vec<(String, String)> = rules
        .edges()
        .map(|(rule, goal)| (rule.to_string(), goal.to_string()))
        .collect();
    let mut cpds = Vec::with_capacity(tree.len() + rules.len());

    for element in tree.elements() {
        if element.element_type().is_root_variable() {
            cpds.push(prior_cpd(element, config.default_belief)?);
        }
    }

    for strategy in tree.elements_of_type(GsnType::Strategy) {
        let mut contexts: Vec<&GsnElement> = Vec::with_capacity(strategy.contexts.len());
        for label in &strategy.contexts {
            if let Some(e) = tree.element(label) {
                if !contexts.iter().any(|c| c.label() == e.label()) {
                    contexts.push(e);
                }
            }
        }
        cpds.push(and_cpd(strategy, &contexts)?);
        edges.extend(
            contexts
                .iter()
                .map(|c| (c.label().to_string(), strategy.label().to_string())),
        );
    }

    for rule in rules.iter() {
        cpds.push(prior_cpd(rule, config.default_belief)?);
    }

    for goal in tree.elements_of_type(GsnType::Goal) {
        let parents = view.goal_parents(goal.label());
        #[cfg(feature = "tracing")]
        tracing::debug!(
            goal = goal.label(),
            parents = ?parents.iter().map(|p| p.label()).collect::<Vec<_>>(),
            "goal parent set"
        );
        cpds.push(and_cpd(goal, &parents)?);
        edges.extend(
            parents
                .iter()
                .map(|p| (p.label().to_string(), goal.label().to_string())),
        );
    }

    BayesianNetwork::from_parts(edges, cpds)
}
