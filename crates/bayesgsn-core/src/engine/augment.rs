//! Implicit inference rules and the augmented view of a tree.
//!
//! The network mapping needs every goal to be supported by a strategy. Goals
//! without one get an implicit strategy `implicit_S_<goal>` that has no
//! supporters and no contexts. The original [`GsnTree`] is never modified:
//! synthesized strategies live in [`ImplicitRules`], and [`AugmentedTree`]
//! overlays them on the tree when the compiler walks it.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::engine::config::CompilerConfig;
use crate::engine::element::{GsnElement, GsnType};
use crate::engine::errors::GsnError;
use crate::engine::tree::GsnTree;

/// Registry of synthesized strategies, in goal declaration order.
#[derive(Debug, Clone, Default)]
pub struct ImplicitRules {
    rules: Vec<GsnElement>,
    by_label: FxHashMap<String, usize>,
    /// goal index in the tree -> rule index
    by_goal: FxHashMap<usize, usize>,
    goals: Vec<String>,
}

impl ImplicitRules {
    /// Creates one implicit strategy per goal that has no strategy supporter.
    pub fn derive(tree: &GsnTree, config: &CompilerConfig) -> Result<Self, GsnError> {
        let mut registry = Self::default();
        for (goal_idx, goal) in tree.elements().iter().enumerate() {
            if goal.element_type() != GsnType::Goal {
                continue;
            }
            let has_strategy = goal
                .supporters
                .iter()
                .any(|s| tree.type_of(s) == GsnType::Strategy);
            if has_strategy {
                continue;
            }

            let label = config.implicit_label(goal.label());
            if tree.contains(&label) || registry.by_label.contains_key(&label) {
                return Err(GsnError::Structure(format!(
                    "implicit rule label '{}' collides with an existing element",
                    label
                )));
            }
            let rule = GsnElement::new(
                label.clone(),
                format!(
                    "Represents an added implicit inference rule for the goal: {}",
                    goal.label()
                ),
                GsnType::Strategy,
            )
            .with_motivation("Added due to BN construction rules");

            let idx = registry.rules.len();
            registry.rules.push(rule);
            registry.by_label.insert(label, idx);
            registry.by_goal.insert(goal_idx, idx);
            registry.goals.push(goal.label().to_string());
        }
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.by_label.contains_key(label)
    }

    pub fn get(&self, label: &str) -> Option<&GsnElement> {
        self.by_label.get(label).map(|&i| &self.rules[i])
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(GsnElement::label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GsnElement> {
        self.rules.iter()
    }

    /// `(implicit strategy, goal it supports)` pairs.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rules
            .iter()
            .zip(&self.goals)
            .map(|(rule, goal)| (rule.label(), goal.as_str()))
    }

    /// Goal supported by the implicit strategy `label`.
    pub fn goal_of(&self, label: &str) -> Option<&str> {
        self.by_label.get(label).map(|&i| self.goals[i].as_str())
    }

    fn for_goal(&self, goal_idx: usize) -> Option<&GsnElement> {
        self.by_goal.get(&goal_idx).map(|&i| &self.rules[i])
    }
}

/// A tree with its implicit strategies overlaid.
#[derive(Debug, Clone, Copy)]
pub struct AugmentedTree<'a> {
    tree: &'a GsnTree,
    rules: &'a ImplicitRules,
}

impl<'a> AugmentedTree<'a> {
    pub fn new(tree: &'a GsnTree, rules: &'a ImplicitRules) -> Self {
        Self { tree, rules }
    }

    pub fn element(&self, label: &str) -> Option<&'a GsnElement> {
        self.tree.element(label).or_else(|| self.rules.get(label))
    }

    /// Elements referenced by `label`: its supporters and contexts, followed
    /// by its implicit strategy if one was inserted.
    pub fn references(&self, label: &str) -> SmallVec<[&'a GsnElement; 8]> {
        let mut out = SmallVec::new();
        let Some(idx) = self.tree.index_of(label) else {
            return out;
        };
        let elements = self.tree.elements();
        out.extend(
            self.tree
                .graph()
                .successors(idx)
                .iter()
                .map(|&i| &elements[i]),
        );
        if let Some(rule) = self.rules.for_goal(idx) {
            out.push(rule);
        }
        out
    }

    /// Network parents of a goal: everything it references plus the goals
    /// supporting each referenced strategy.
    ///
    /// Well-formedness guarantees preceding goals sit exactly one strategy
    /// below, so this is a two-step lookup rather than a traversal.
    pub fn goal_parents(&self, goal: &str) -> Vec<&'a GsnElement> {
        fn push_unique<'e>(parents: &mut Vec<&'e GsnElement>, e: &'e GsnElement) {
            if !parents.iter().any(|p| p.label() == e.label()) {
                parents.push(e);
            }
        }

        let direct = self.references(goal);
        let mut parents: Vec<&'a GsnElement> = Vec::with_capacity(direct.len() + 2);
        for &e in &direct {
            push_unique(&mut parents, e);
        }
        for &strategy in direct
            .iter()
            .filter(|e| e.element_type() == GsnType::Strategy)
        {
            for preceding in self.references(strategy.label()) {
                if preceding.element_type() == GsnType::Goal {
                    push_unique(&mut parents, preceding);
                }
            }
        }
        parents
    }
}
