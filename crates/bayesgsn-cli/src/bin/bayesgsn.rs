//! bayesgsn CLI - compile a GSN argument into a Bayesian network and query it
//!
//! Usage:
//!   bayesgsn <file>                                # Belief in the top-level goal
//!   bayesgsn <file> --goal G2 --evidence Sn1=sat   # Belief in G2 given evidence
//!   bayesgsn <file> --aggregate G1=noisy_or --trigger 0.9,0.8,0.95 -o json

use std::fmt::Display;
use std::process;

use bayesgsn_core::{BayesianGsn, CompilerConfig, Evidence, GateParams, Marginal};
use bayesgsn_frontend::load_tree_file;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bayesgsn")]
#[command(version)]
#[command(about = "Bayesian GSN - quantify confidence in assurance arguments")]
#[command(
    long_about = "Compile a gsn2x YAML argument into a discrete Bayesian network and query goal beliefs"
)]
struct Cli {
    /// Input gsn2x YAML file
    #[arg(value_name = "FILE")]
    file: String,

    /// Goal to query (defaults to the root goal)
    #[arg(short, long, value_name = "GOAL")]
    goal: Option<String>,

    /// Observed state, e.g. Sn1=notSat (repeatable)
    #[arg(short, long, value_name = "NAME=STATE")]
    evidence: Vec<String>,

    /// Override an implicit strategy prior, e.g. implicit_S_G2=0.7 (repeatable)
    #[arg(long, value_name = "NAME=P")]
    implicit_belief: Vec<String>,

    /// Replace a goal's aggregation gate, e.g. G1=leaky_or
    #[arg(long, value_name = "GOAL=GATE")]
    aggregate: Option<String>,

    /// Trigger probabilities for --aggregate, one per parent
    #[arg(long, value_name = "P,P,..", value_delimiter = ',')]
    trigger: Vec<f64>,

    /// Substitute probabilities for --aggregate, one per parent
    #[arg(long, value_name = "P,P,..", value_delimiter = ',')]
    substitute: Vec<f64>,

    /// Leak probability for --aggregate
    #[arg(long, value_name = "P")]
    leak: Option<f64>,

    /// Prior for solutions, axioms, and implicit strategies without a declared belief
    #[arg(long, value_name = "P")]
    default_belief: Option<f64>,

    /// List the implicit strategies inserted during compilation
    #[arg(short, long)]
    list_implicit: bool,

    /// Output format: summary or json
    #[arg(
        short,
        long,
        default_value = "summary",
        value_name = "FORMAT",
        value_parser = ["summary", "json"]
    )]
    output: String,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let name = std::path::Path::new(&cli.file)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| cli.file.clone());

    let tree = load_tree_file(&name, &cli.file)
        .unwrap_or_else(|e| fail(format!("Error loading '{}'", cli.file), e));
    tracing::debug!(tree = %name, elements = tree.len(), "loaded argument");

    let mut config = CompilerConfig::default();
    if let Some(belief) = cli.default_belief {
        config = config.with_default_belief(belief);
    }
    let mut bgsn = BayesianGsn::with_config(name.clone(), tree, config)
        .unwrap_or_else(|e| fail("Compilation error", e));

    let overrides: Vec<(String, f64)> = cli
        .implicit_belief
        .iter()
        .map(|raw| {
            let (label, value) = split_pair(raw, "--implicit-belief");
            let value = value.parse::<f64>().unwrap_or_else(|e| {
                fail(format!("Invalid probability in --implicit-belief '{}'", raw), e)
            });
            (label.to_string(), value)
        })
        .collect();
    if !overrides.is_empty() {
        bgsn.set_implicit_beliefs(overrides.iter().map(|(l, v)| (l.as_str(), *v)))
            .unwrap_or_else(|e| fail("Error setting implicit beliefs", e));
    }

    if let Some(raw) = &cli.aggregate {
        let (goal, gate) = split_pair(raw, "--aggregate");
        let mut params = GateParams::new();
        if !cli.trigger.is_empty() {
            params = params.triggers(cli.trigger.clone());
        }
        if !cli.substitute.is_empty() {
            params = params.substitutes(cli.substitute.clone());
        }
        if let Some(leak) = cli.leak {
            params = params.leak(leak);
        }
        bgsn.change_goal_aggregation_tag(goal, gate, &params)
            .unwrap_or_else(|e| fail(format!("Error changing aggregation of '{}'", goal), e));
    }

    if cli.list_implicit {
        print_implicit_rules(&bgsn);
        return;
    }

    let mut evidence = Evidence::new();
    for raw in &cli.evidence {
        let (variable, state) = split_pair(raw, "--evidence");
        evidence.insert(variable.to_string(), state.to_string());
    }

    let marginal = bgsn
        .query_belief(cli.goal.as_deref(), &evidence)
        .unwrap_or_else(|e| fail("Query error", e));

    match cli.output.as_str() {
        "json" => {
            let report = serde_json::json!({
                "tree": bgsn.name(),
                "goal": marginal.variable,
                "evidence": evidence,
                "marginal": marginal,
                "implicit_rules": bgsn.implicit_rules().labels().collect::<Vec<_>>(),
            });
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{}", json),
                Err(e) => fail("Error serializing to JSON", e),
            }
        }
        _ => print_summary(&bgsn, &evidence, &marginal),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(context: impl Display, err: impl Display) -> ! {
    eprintln!("{}: {}", context, err);
    process::exit(1);
}

fn split_pair<'a>(raw: &'a str, flag: &str) -> (&'a str, &'a str) {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => (key.trim(), value.trim()),
        _ => fail(
            format!("Invalid {} value '{}'", flag, raw),
            "expected KEY=VALUE",
        ),
    }
}

fn print_implicit_rules(bgsn: &BayesianGsn) {
    let rules = bgsn.implicit_rules();
    if rules.is_empty() {
        println!("No implicit strategies were inserted");
        return;
    }
    println!("Implicit strategies in '{}' ({}):", bgsn.name(), rules.len());
    for (rule, goal) in rules.edges() {
        println!("  - {} -> {}", rule, goal);
    }
}

fn print_summary(bgsn: &BayesianGsn, evidence: &Evidence, marginal: &Marginal) {
    let network = bgsn.network();
    println!(
        "✓ Compiled '{}': {} variables, {} edges, {} implicit strategies\n",
        bgsn.name(),
        network.variables().len(),
        network.edges().len(),
        bgsn.implicit_rules().len()
    );
    if !evidence.is_empty() {
        println!("Evidence ({}):", evidence.len());
        for (variable, state) in evidence {
            println!("  {} = {}", variable, state);
        }
        println!();
    }
    println!("{}", marginal);
}
