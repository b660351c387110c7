//! Variable elimination checked against full joint enumeration.

use bayesgsn_core::{BayesianGsn, BayesianNetwork, Evidence, GateModel, GateParams, GsnType};
use bayesgsn_frontend::load_tree_file;
use bayesgsn_tests::fixture_path;

/// `P(variable = states[0] | evidence)` for every variable, by summing the joint.
fn enumerate_marginals(network: &BayesianNetwork, evidence: &Evidence) -> Vec<f64> {
    let variables = network.variables();
    let cpds: Vec<_> = variables
        .iter()
        .map(|v| network.cpd(v).expect("every variable has a CPD"))
        .collect();
    let parent_idx: Vec<Vec<usize>> = cpds
        .iter()
        .map(|cpd| {
            cpd.parents()
                .iter()
                .map(|p| network.index_of(p).unwrap())
                .collect()
        })
        .collect();
    let observed: Vec<Option<usize>> = cpds
        .iter()
        .map(|cpd| {
            evidence
                .get(cpd.variable())
                .map(|state| cpd.state_index(state).unwrap())
        })
        .collect();

    let n = variables.len();
    let mut positive = vec![0.0; n];
    let mut total = 0.0;
    let mut states = vec![0usize; n];
    let mut parent_buf = Vec::new();
    for joint in 0..(1usize << n) {
        for (i, s) in states.iter_mut().enumerate() {
            *s = (joint >> i) & 1;
        }
        if observed
            .iter()
            .zip(&states)
            .any(|(o, s)| o.map_or(false, |o| o != *s))
        {
            continue;
        }
        let mut p = 1.0;
        for (i, cpd) in cpds.iter().enumerate() {
            parent_buf.clear();
            parent_buf.extend(parent_idx[i].iter().map(|&j| states[j]));
            p *= cpd.value(states[i], &parent_buf).unwrap();
            if p == 0.0 {
                break;
            }
        }
        total += p;
        for (acc, &s) in positive.iter_mut().zip(&states) {
            if s == 0 {
                *acc += p;
            }
        }
    }
    positive.iter().map(|p| p / total).collect()
}

fn check_goals_against_enumeration(bgsn: &BayesianGsn, evidence: &Evidence) {
    let network = bgsn.network();
    let expected = enumerate_marginals(network, evidence);
    for goal in bgsn.tree().elements_of_type(GsnType::Goal) {
        let idx = network.index_of(goal.label()).unwrap();
        let actual = bgsn.query_belief_value(Some(goal.label()), evidence).unwrap();
        assert!(
            (actual - expected[idx]).abs() < 1e-9,
            "{}: elimination {} vs enumeration {}",
            goal.label(),
            actual,
            expected[idx]
        );
    }
}

fn hazards() -> BayesianGsn {
    let tree = load_tree_file("hazards", fixture_path("hazard_argument.yaml")).unwrap();
    BayesianGsn::new("hazards", tree).unwrap()
}

fn evidence(pairs: &[(&str, &str)]) -> Evidence {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn prior_beliefs_match_enumeration() {
    check_goals_against_enumeration(&hazards(), &Evidence::new());
}

#[test]
fn diagnostic_evidence_matches_enumeration() {
    let bgsn = hazards();
    check_goals_against_enumeration(&bgsn, &evidence(&[("G1", "notSat")]));
    check_goals_against_enumeration(&bgsn, &evidence(&[("G1", "notSat"), ("Sn2", "sat")]));
}

#[test]
fn noisy_aggregation_matches_enumeration() {
    let mut bgsn = hazards();
    bgsn.change_goal_aggregation(
        "G1",
        GateModel::LeakyOr,
        &GateParams::new()
            .triggers(vec![0.2, 0.1, 0.3, 0.4, 0.5])
            .leak(0.02),
    )
    .unwrap();
    bgsn.change_goal_aggregation(
        "G3",
        GateModel::NoisyAnd,
        &GateParams::new()
            .triggers(vec![0.05, 0.1, 0.0])
            .substitutes(vec![0.3, 0.2, 0.1]),
    )
    .unwrap();
    bgsn.set_implicit_belief("implicit_S_G5", 0.6).unwrap();

    check_goals_against_enumeration(&bgsn, &Evidence::new());
    check_goals_against_enumeration(&bgsn, &evidence(&[("G1", "sat"), ("A1", "notSat")]));
}
