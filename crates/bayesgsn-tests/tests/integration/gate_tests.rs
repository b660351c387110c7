//! Canonical gate tables through the public API.

use bayesgsn_core::engine::gate::{build_gate_cpt_from_tag, MAX_PARENTS};
use bayesgsn_core::{build_gate_cpt, GateModel, GateParams, GsnError};

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-12,
        "expected {expected}, got {actual}"
    );
}

const PARENTS: [&str; 3] = ["A", "B", "C"];

#[test]
fn noisy_and_uses_triggers_for_true_and_substitutes_for_false() {
    let params = GateParams::new()
        .triggers(vec![0.1, 0.2, 0.3])
        .substitutes(vec![0.4, 0.5, 0.6]);
    let table = build_gate_cpt(&PARENTS, GateModel::NoisyAnd, &params).unwrap();
    assert_eq!(table.columns(), 8);
    assert_close(table.positive()[0], 0.9 * 0.8 * 0.7);
    // column 5 = (false, true, false)
    assert_close(table.positive()[5], 0.4 * 0.8 * 0.6);
    assert_close(table.positive()[7], 0.4 * 0.5 * 0.6);

    let leaky = build_gate_cpt(&PARENTS, GateModel::LeakyAnd, &params.clone().leak(0.1)).unwrap();
    for (l, p) in leaky.positive().iter().zip(table.positive()) {
        assert_close(*l, 0.9 * p);
    }
}

#[test]
fn leaky_or_keeps_leak_when_all_parents_false() {
    let params = GateParams::new().triggers(vec![0.1, 0.2, 0.3]).leak(0.05);
    let table = build_gate_cpt(&PARENTS, GateModel::LeakyOr, &params).unwrap();
    assert_close(table.positive()[0], 1.0 - 0.95 * 0.1 * 0.2 * 0.3);
    // column 3 = (true, false, false)
    assert_close(table.positive()[3], 1.0 - 0.95 * 0.1);
    assert_close(table.positive()[7], 0.05);

    let noisy = build_gate_cpt(&PARENTS, GateModel::NoisyOr, &params).unwrap();
    assert_close(noisy.positive()[7], 0.0);
}

#[test]
fn rows_are_complements() {
    let params = GateParams::new()
        .triggers(vec![0.3, 0.6, 0.9])
        .substitutes(vec![0.2, 0.1, 0.05])
        .leak(0.01);
    for gate in GateModel::ALL {
        let table = build_gate_cpt(&PARENTS, gate, &params).unwrap();
        for (p, q) in table.positive().iter().zip(table.negative()) {
            assert_close(p + q, 1.0);
        }
    }
}

#[test]
fn parentless_gates() {
    let none: [&str; 0] = [];
    let and = build_gate_cpt(&none, GateModel::And, &GateParams::new()).unwrap();
    assert_eq!(and.positive(), &[1.0]);
    let or = build_gate_cpt(&none, GateModel::Or, &GateParams::new()).unwrap();
    assert_eq!(or.positive(), &[0.0]);
    let leaky = build_gate_cpt(
        &none,
        GateModel::LeakyOr,
        &GateParams::new().triggers(Vec::new()).leak(0.2),
    )
    .unwrap();
    assert_close(leaky.positive()[0], 0.2);
}

#[test]
fn too_many_parents_is_a_range_error() {
    let parents: Vec<String> = (0..=MAX_PARENTS).map(|i| format!("P{i}")).collect();
    assert!(matches!(
        build_gate_cpt(&parents, GateModel::And, &GateParams::new()),
        Err(GsnError::Range(_))
    ));
}

#[test]
fn parameter_validation() {
    let invalid_trigger = GateParams::new().triggers(vec![0.1, 1.2, 0.3]);
    assert!(matches!(
        build_gate_cpt(&PARENTS, GateModel::NoisyOr, &invalid_trigger),
        Err(GsnError::InvalidProbability(_))
    ));

    let short_substitutes = GateParams::new().substitutes(vec![0.5, 0.5]);
    assert!(matches!(
        build_gate_cpt(&PARENTS, GateModel::And, &short_substitutes),
        Err(GsnError::Range(_))
    ));

    let bad_leak = GateParams::new().leak(-0.1);
    assert!(matches!(
        build_gate_cpt(&PARENTS, GateModel::Or, &bad_leak),
        Err(GsnError::InvalidProbability(_))
    ));

    let short_triggers = GateParams::new().triggers(vec![0.5, 0.5]);
    assert!(matches!(
        build_gate_cpt(&PARENTS, GateModel::NoisyOr, &short_triggers),
        Err(GsnError::Range(_))
    ));

    let triggers = GateParams::new().triggers(vec![0.5, 0.5, 0.5]);
    assert_eq!(
        build_gate_cpt(&PARENTS, GateModel::LeakyOr, &triggers).unwrap_err(),
        GsnError::MissingGateParameter {
            gate: "leaky_or".into(),
            parameter: "leak"
        }
    );
    assert!(matches!(
        build_gate_cpt(&PARENTS, GateModel::NoisyAnd, &triggers),
        Err(GsnError::MissingGateParameter {
            parameter: "substitute_probs",
            ..
        })
    ));
}

#[test]
fn and_or_ignore_noise_parameters() {
    let params = GateParams::new().triggers(vec![0.5]).leak(0.5);
    let and = build_gate_cpt(&PARENTS, GateModel::And, &params).unwrap();
    assert_eq!(and.positive(), &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
}

#[test]
fn gate_tags() {
    assert_eq!(" Noisy_OR ".parse::<GateModel>().unwrap(), GateModel::NoisyOr);
    for gate in GateModel::ALL {
        assert_eq!(gate.as_str().parse::<GateModel>().unwrap(), gate);
    }
    assert!(matches!(
        "xor".parse::<GateModel>(),
        Err(GsnError::UnsupportedGate(_))
    ));
    let table = build_gate_cpt_from_tag(&["A", "B"], "or", &GateParams::new()).unwrap();
    assert_eq!(table.positive(), &[1.0, 1.0, 1.0, 0.0]);
}
