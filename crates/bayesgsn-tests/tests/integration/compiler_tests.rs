//! Compiler behavior on hand-built trees.

use bayesgsn_core::{
    BayesianGsn, CompilerConfig, Evidence, GateModel, GateParams, GsnElement, GsnError, GsnTree,
    GsnType, WellFormednessClause,
};

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-12,
        "expected {expected}, got {actual}"
    );
}

fn evidence(pairs: &[(&str, &str)]) -> Evidence {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// G1 <- S1 (J1) <- G0 <- Sn1
fn chained_tree() -> GsnTree {
    GsnTree::build(
        "chained",
        vec![
            GsnElement::new("G1", "Top claim", GsnType::Goal).with_supporters(["S1"]),
            GsnElement::new("S1", "Decomposition", GsnType::Strategy)
                .with_supporters(["G0"])
                .with_contexts(["J1"]),
            GsnElement::new("G0", "Subclaim", GsnType::Goal).with_supporters(["Sn1"]),
            GsnElement::new("Sn1", "Evidence", GsnType::Solution).with_belief(0.7),
            GsnElement::new("J1", "Rationale", GsnType::Justification),
        ],
    )
    .unwrap()
}

fn single_solution_tree(belief: f64) -> GsnTree {
    GsnTree::build(
        "single",
        vec![
            GsnElement::new("G1", "Claim", GsnType::Goal).with_supporters(["Sn1"]),
            GsnElement::new("Sn1", "Evidence", GsnType::Solution).with_belief(belief),
        ],
    )
    .unwrap()
}

#[test]
fn built_tree_has_single_root() {
    let tree = chained_tree();
    let roots: Vec<&str> = tree
        .elements()
        .iter()
        .filter(|e| tree.in_degree(e.label()) == Some(0))
        .map(|e| e.label())
        .collect();
    assert_eq!(roots, vec![tree.root().label()]);
    assert_eq!(tree.root().label(), "G1");
}

#[test]
fn goal_without_strategy_gets_one_implicit_rule() {
    let bgsn = BayesianGsn::new("single", single_solution_tree(1.0)).unwrap();

    let labels: Vec<&str> = bgsn.implicit_rules().labels().collect();
    assert_eq!(labels, vec!["implicit_S_G1"]);

    let prior = bgsn.network().cpd("implicit_S_G1").unwrap();
    assert!(prior.parents().is_empty());
    assert_eq!(prior.states(), &["sound".to_string(), "notSound".to_string()]);
    assert_close(prior.values()[0][0], 1.0);

    assert!(bgsn
        .goal_parents("G1")
        .unwrap()
        .iter()
        .any(|p| p == "implicit_S_G1"));
    // the original tree is left alone
    assert!(!bgsn.tree().contains("implicit_S_G1"));
}

#[test]
fn preceding_goal_becomes_parent() {
    let bgsn = BayesianGsn::new("chained", chained_tree()).unwrap();
    let parents = bgsn.goal_parents("G1").unwrap();
    assert_eq!(parents, &["S1", "G0"]);

    let g1 = bgsn.network().cpd("G1").unwrap();
    assert_eq!(g1.parent_states()[0], vec!["sound", "notSound"]);
    assert_eq!(g1.parent_states()[1], vec!["sat", "notSat"]);
    assert_close(bgsn.query_belief_value(None, &Evidence::new()).unwrap(), 0.7);
}

#[test]
fn end_to_end_single_solution() {
    let bgsn = BayesianGsn::new("single", single_solution_tree(1.0)).unwrap();
    let belief = bgsn
        .query_belief_value(Some("G1"), &evidence(&[("Sn1", "sat")]))
        .unwrap();
    assert_close(belief, 1.0);

    // a certain solution cannot be observed failing
    assert!(matches!(
        bgsn.query_belief(None, &evidence(&[("Sn1", "notSat")])),
        Err(GsnError::Inference(_))
    ));

    let bgsn = BayesianGsn::new("single", single_solution_tree(0.9)).unwrap();
    let marginal = bgsn
        .query_belief(None, &evidence(&[("Sn1", "notSat")]))
        .unwrap();
    assert_eq!(marginal.variable, "G1");
    assert_close(marginal.probability("sat").unwrap(), 0.0);
    assert_close(marginal.probability("notSat").unwrap(), 1.0);
}

#[test]
fn observed_goal_with_impossible_evidence_is_rejected() {
    let bgsn = BayesianGsn::new("single", single_solution_tree(1.0)).unwrap();
    let result = bgsn.query_belief(Some("G1"), &evidence(&[("Sn1", "notSat"), ("G1", "sat")]));
    assert!(matches!(result, Err(GsnError::Inference(_))));

    let marginal = bgsn
        .query_belief(Some("G1"), &evidence(&[("Sn1", "sat"), ("G1", "sat")]))
        .unwrap();
    assert_close(marginal.probability("sat").unwrap(), 1.0);
}

#[test]
fn incomplete_argument_is_rejected() {
    let tree = GsnTree::build(
        "incomplete",
        vec![
            GsnElement::new("G1", "Top claim", GsnType::Goal).with_supporters(["S1"]),
            GsnElement::new("S1", "Decomposition", GsnType::Strategy)
                .with_supporters(["G2"])
                .with_contexts(["C1"]),
            GsnElement::new("G2", "Subclaim", GsnType::Goal).with_supporters(["Sn1"]),
            GsnElement::new("Sn1", "Evidence", GsnType::Solution),
            GsnElement::new("C1", "Scope", GsnType::Context),
        ],
    )
    .unwrap();
    let err = BayesianGsn::new("incomplete", tree).unwrap_err();
    assert_eq!(err, GsnError::Completeness("G1".into()));
}

#[test]
fn unjustified_strategy_violates_clause_iii() {
    let tree = GsnTree::build(
        "unjustified",
        vec![
            GsnElement::new("G1", "Top claim", GsnType::Goal)
                .with_supporters(["S1"])
                .with_contexts(["J1"]),
            GsnElement::new("S1", "Decomposition", GsnType::Strategy).with_supporters(["G2"]),
            GsnElement::new("G2", "Subclaim", GsnType::Goal).with_supporters(["Sn1"]),
            GsnElement::new("Sn1", "Evidence", GsnType::Solution),
            GsnElement::new("J1", "Rationale", GsnType::Justification),
        ],
    )
    .unwrap();
    let err = BayesianGsn::new("unjustified", tree).unwrap_err();
    assert_eq!(err.clause(), Some(WellFormednessClause::StrategyJustified));
    match err {
        GsnError::WellFormedness { node, .. } => assert_eq!(node, "S1"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn noisy_or_aggregation_on_two_parents() {
    let mut bgsn = BayesianGsn::new("single", single_solution_tree(1.0)).unwrap();
    // G1 parents: Sn1, implicit_S_G1
    assert_eq!(bgsn.goal_parents("G1").unwrap().len(), 2);

    bgsn.change_goal_aggregation(
        "G1",
        GateModel::NoisyOr,
        &GateParams::new().triggers(vec![0.9, 0.95]),
    )
    .unwrap();

    let cpd = bgsn.network().cpd("G1").unwrap();
    let (p1, p2) = (0.9, 0.95);
    let expected = [
        ([0usize, 0], 1.0 - p1 * p2),
        ([0, 1], 1.0 - p1),
        ([1, 0], 1.0 - p2),
        ([1, 1], 0.0),
    ];
    for (assignment, positive) in expected {
        assert_close(cpd.value(0, &assignment).unwrap(), positive);
        assert_close(cpd.value(1, &assignment).unwrap(), 1.0 - positive);
    }
}

#[test]
fn failed_aggregation_change_keeps_network() {
    let mut bgsn = BayesianGsn::new("chained", chained_tree()).unwrap();
    let before = bgsn.network().cpd("G1").unwrap().clone();

    let err = bgsn
        .change_goal_aggregation("G1", GateModel::NoisyAnd, &GateParams::new())
        .unwrap_err();
    assert!(matches!(err, GsnError::MissingGateParameter { .. }));
    let err = bgsn
        .change_goal_aggregation_tag("G1", "majority", &GateParams::new())
        .unwrap_err();
    assert!(matches!(err, GsnError::UnsupportedGate(_)));
    let err = bgsn
        .change_goal_aggregation("S1", GateModel::Or, &GateParams::new())
        .unwrap_err();
    assert!(matches!(err, GsnError::WrongElementType { .. }));

    assert_eq!(bgsn.network().cpd("G1").unwrap(), &before);
}

#[test]
fn or_aggregation_by_tag() {
    let tree = GsnTree::build(
        "redundant",
        vec![
            GsnElement::new("G1", "Claim", GsnType::Goal).with_supporters(["Sn1", "Sn2"]),
            GsnElement::new("Sn1", "Test", GsnType::Solution).with_belief(0.5),
            GsnElement::new("Sn2", "Analysis", GsnType::Solution).with_belief(0.5),
        ],
    )
    .unwrap();
    let mut bgsn = BayesianGsn::new("redundant", tree).unwrap();
    assert_close(bgsn.query_belief_value(None, &Evidence::new()).unwrap(), 0.25);

    bgsn.change_goal_aggregation_tag("G1", "OR", &GateParams::new())
        .unwrap();
    // implicit strategy is certain, so OR is always satisfied
    assert_close(bgsn.query_belief_value(None, &Evidence::new()).unwrap(), 1.0);

    bgsn.set_implicit_belief("implicit_S_G1", 0.0).unwrap();
    assert_close(bgsn.query_belief_value(None, &Evidence::new()).unwrap(), 0.75);
}

#[test]
fn implicit_belief_overrides_are_validated() {
    let mut bgsn = BayesianGsn::new("chained", chained_tree()).unwrap();
    assert!(matches!(
        bgsn.set_implicit_belief("S1", 0.5),
        Err(GsnError::UnknownNode(_))
    ));
    assert!(matches!(
        bgsn.set_implicit_belief("implicit_S_G0", 1.5),
        Err(GsnError::InvalidProbability(_))
    ));

    let before = bgsn.network().cpd("implicit_S_G0").unwrap().clone();
    assert!(bgsn
        .set_implicit_beliefs([("implicit_S_G0", 0.2), ("implicit_S_G9", 0.3)])
        .is_err());
    assert_eq!(bgsn.network().cpd("implicit_S_G0").unwrap(), &before);

    bgsn.set_implicit_belief("implicit_S_G0", 0.5).unwrap();
    assert_close(bgsn.query_belief_value(None, &Evidence::new()).unwrap(), 0.35);
}

#[test]
fn query_errors() {
    let bgsn = BayesianGsn::new("chained", chained_tree()).unwrap();
    assert!(matches!(
        bgsn.query_belief(Some("G42"), &Evidence::new()),
        Err(GsnError::UnknownNode(_))
    ));
    assert!(matches!(
        bgsn.query_belief(Some("Sn1"), &Evidence::new()),
        Err(GsnError::WrongElementType { .. })
    ));
    assert!(matches!(
        bgsn.query_belief(None, &evidence(&[("Sn1", "maybe")])),
        Err(GsnError::UnknownNode(_))
    ));
}

#[test]
fn lower_default_belief_penalizes_unmodeled_evidence() {
    let tree = GsnTree::build(
        "undeclared",
        vec![
            GsnElement::new("G1", "Claim", GsnType::Goal).with_supporters(["Sn1"]),
            GsnElement::new("Sn1", "Evidence", GsnType::Solution),
        ],
    )
    .unwrap();
    let config = CompilerConfig::default().with_default_belief(0.8);
    let bgsn = BayesianGsn::with_config("undeclared", tree, config).unwrap();
    assert_close(
        bgsn.query_belief_value(None, &Evidence::new()).unwrap(),
        0.64,
    );
}

#[test]
fn invalid_config_is_rejected() {
    let config = CompilerConfig::default().with_default_belief(-0.1);
    assert!(matches!(
        BayesianGsn::with_config("bad", single_solution_tree(1.0), config),
        Err(GsnError::Config(_))
    ));
}
