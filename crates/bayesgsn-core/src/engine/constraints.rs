//! Structural constraints on GSN arguments (Nesic et al. 2021).
//!
//! - **Completeness** (Definition 12): every goal is justified, either by a
//!   justification in its own context or through the strategy that supports it.
//! - **Well-formedness** (Definition 11):
//!   i) no `supportedBy` edge joins two goals,
//!   ii) a goal is supported by exactly one strategy, or by no strategy and at
//!   least one solution,
//!   iii) every strategy has a justification in its context.
//!
//! Both checks stop at the first violation, walking elements in declaration order.

use crate::engine::element::{GsnElement, GsnType};
use crate::engine::errors::{GsnError, WellFormednessClause};
use crate::engine::tree::GsnTree;

fn count_of(tree: &GsnTree, labels: &[String], ty: GsnType) -> usize {
    labels.iter().filter(|l| tree.type_of(l) == ty).count()
}

fn is_justified(tree: &GsnTree, element: &GsnElement) -> bool {
    count_of(tree, &element.contexts, GsnType::Justification) > 0
}

/// Fails with [`GsnError::Completeness`] naming the first unjustified goal.
///
/// A goal without its own justification is accepted when every strategy it
/// refers to is justified. A goal with neither is accepted too: it receives
/// an implicit strategy later.
pub fn check_completeness(tree: &GsnTree) -> Result<(), GsnError> {
    for goal in tree.elements_of_type(GsnType::Goal) {
        if is_justified(tree, goal) {
            continue;
        }
        let unjustified_strategy = goal
            .references()
            .filter_map(|label| tree.element(label))
            .filter(|e| e.element_type() == GsnType::Strategy)
            .any(|strategy| !is_justified(tree, strategy));
        if unjustified_strategy {
            return Err(GsnError::Completeness(goal.label().to_string()));
        }
    }
    Ok(())
}

/// Fails with [`GsnError::WellFormedness`] on the first violated clause.
pub fn check_well_formedness(tree: &GsnTree) -> Result<(), GsnError> {
    for (src, dst) in tree.edges() {
        if tree.type_of(src) == GsnType::Goal && tree.type_of(dst) == GsnType::Goal {
            return Err(GsnError::well_formedness(
                WellFormednessClause::NoGoalToGoal,
                src.as_str(),
            ));
        }
    }

    for goal in tree.elements_of_type(GsnType::Goal) {
        match count_of(tree, &goal.supporters, GsnType::Strategy) {
            1 => {}
            0 if count_of(tree, &goal.supporters, GsnType::Solution) >= 1 => {}
            _ => {
                return Err(GsnError::well_formedness(
                    WellFormednessClause::GoalSupport,
                    goal.label(),
                ))
            }
        }
    }

    for strategy in tree.elements_of_type(GsnType::Strategy) {
        if !is_justified(tree, strategy) {
            return Err(GsnError::well_formedness(
                WellFormednessClause::StrategyJustified,
                strategy.label(),
            ));
        }
    }
    Ok(())
}
