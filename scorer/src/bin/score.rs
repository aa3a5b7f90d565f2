use std::path::PathBuf;
use std::time::Instant;

use anyhow::{ensure, Context, Result};
use clap::Parser;

use meaningful_play::config::{NonConvergencePolicy, ScoringConfig};
use meaningful_play::state_space::StateSpace;
use meaningful_play::storage::save_report;
use meaningful_play::topology::{load_topology, reference_reward_matrix};
use meaningful_play::weighting::DepthWeights;
use meaningful_play::{env_config, ScoringOrchestrator};

/// Score a decision topology by the divergence of its learned Q-policies.
#[derive(Parser, Debug)]
#[command(name = "mps-score", version, about)]
struct Args {
    /// Topology file (comma-separated rows). Uses the built-in reference graph when omitted.
    topology: Option<PathBuf>,

    /// Target endings to compare (default: every terminal state)
    #[arg(short, long, value_delimiter = ',')]
    targets: Vec<String>,

    /// JSON config file; flags below override its fields
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Agents per target (K)
    #[arg(long)]
    runs: Option<usize>,

    /// Updates per agent (I)
    #[arg(long)]
    iterations: Option<usize>,

    /// Minkowski order p
    #[arg(long)]
    order: Option<f64>,

    /// Base RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Keep terminal rows at a small weight instead of zeroing them
    #[arg(long)]
    tapered: bool,

    /// Keep tables of agents whose greedy path never reaches the target
    #[arg(long)]
    keep_non_convergent: bool,

    /// Ending labels for the reference state space, e.g. Defensive,Neutral1,Neutral2,Compliant
    #[arg(long, value_delimiter = ',')]
    endings: Option<Vec<String>>,

    /// Directory for ensemble and report files (default: $MEANINGFUL_PLAY_OUTPUT or data/runs)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Do not write any files
    #[arg(long)]
    no_save: bool,
}

fn build_config(args: &Args) -> Result<ScoringConfig> {
    let mut config = match &args.config {
        Some(path) => ScoringConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ScoringConfig::default(),
    };
    if let Some(runs) = args.runs {
        config.runs = runs;
    }
    if let Some(iterations) = args.iterations {
        config.iterations = iterations;
    }
    if let Some(order) = args.order {
        config.minkowski_order = order;
    }
    config.seed = args.seed.or(config.seed);
    if args.tapered {
        config.depth_weights = DepthWeights::tapered_terminals();
    }
    if args.keep_non_convergent {
        config.on_non_convergence = NonConvergencePolicy::Keep;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    env_config::init_tracing();
    let args = Args::parse();
    let config = build_config(&args)?;
    let threads = env_config::init_rayon_threads();

    let space = match &args.endings {
        Some(e) => {
            ensure!(e.len() == 4, "--endings takes exactly four labels, got {}", e.len());
            let endings = [e[0].as_str(), e[1].as_str(), e[2].as_str(), e[3].as_str()];
            StateSpace::reference_with_endings(endings)?
        }
        None => StateSpace::reference(),
    };
    let rewards = match &args.topology {
        Some(path) => load_topology(path, &space)
            .with_context(|| format!("loading topology {}", path.display()))?,
        None => reference_reward_matrix(),
    };
    let stem = args
        .topology
        .as_ref()
        .and_then(|p| p.file_stem())
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "reference".to_string());

    println!("Meaningful Play Score");
    println!("  Topology:   {}", stem);
    println!(
        "  Agents:     {} x {} iterations (alpha={}, gamma={})",
        config.runs, config.iterations, config.alpha, config.gamma
    );
    println!("  Threads:    {}", threads);

    let orchestrator = ScoringOrchestrator::new(space, rewards, config)?;
    let t0 = Instant::now();
    let report = if args.targets.is_empty() {
        orchestrator.score_terminals()?
    } else {
        let targets: Vec<&str> = args.targets.iter().map(String::as_str).collect();
        orchestrator.score(&targets)?
    };
    let elapsed = t0.elapsed().as_secs_f64();

    println!("  Seed:       {}", report.seed);
    println!();
    println!("{:<10} {:>8} {:>8}  Most common path", "Target", "Share", "Stalled");
    for outcome in &report.targets {
        let paths = outcome.ensemble.paths();
        let (path, share) = match paths.most_common() {
            Some((p, c)) => (p.join(" -> "), c as f64 / paths.len() as f64),
            None => (String::new(), 0.0),
        };
        println!(
            "{:<10} {:>7.1}% {:>8}  {}",
            outcome.target(),
            share * 100.0,
            outcome.ensemble.non_converged(),
            path
        );
    }

    println!();
    println!("Pairwise Minkowski distances (p={}):", report.minkowski_order);
    for pair in &report.pairs {
        println!("  {:<10} {:<10} {:>12.3}", pair.a, pair.b, pair.distance);
    }
    println!();
    println!("Meaningfulness score: {:.3}", report.score);
    println!("Scored in {:.2}s", elapsed);

    if !args.no_save {
        let dir = args.output.clone().unwrap_or_else(env_config::output_dir);
        let path = save_report(&dir, &stem, &report)
            .with_context(|| format!("writing results to {}", dir.display()))?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}
