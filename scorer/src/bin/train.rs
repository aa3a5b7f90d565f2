use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use clap::Parser;

use meaningful_play::averaging::average_tables;
use meaningful_play::config::{NonConvergencePolicy, ScoringConfig};
use meaningful_play::ensemble::EnsembleRunner;
use meaningful_play::env_config;
use meaningful_play::state_space::StateSpace;
use meaningful_play::storage::save_ensemble;
use meaningful_play::topology::{load_topology, reference_reward_matrix};

/// Train one ensemble toward a single ending and save its paths and value tables.
#[derive(Parser, Debug)]
#[command(name = "mps-train", version, about)]
struct Args {
    /// Ending to train toward
    target: String,

    /// Topology file (comma-separated rows). Uses the built-in reference graph when omitted.
    #[arg(long)]
    topology: Option<PathBuf>,

    /// Name prefix for the output files
    #[arg(long, default_value = "ensemble")]
    name: String,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    runs: Option<usize>,

    #[arg(long)]
    iterations: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    /// Ending labels for the reference state space
    #[arg(long, value_delimiter = ',')]
    endings: Option<Vec<String>>,

    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_config::init_tracing();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ScoringConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ScoringConfig {
            on_non_convergence: NonConvergencePolicy::Keep,
            ..ScoringConfig::default()
        },
    };
    config.runs = args.runs.unwrap_or(config.runs);
    config.iterations = args.iterations.unwrap_or(config.iterations);
    config.seed = args.seed.or(config.seed);
    config.validate()?;
    env_config::init_rayon_threads();

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

    let runner = EnsembleRunner::new(
        &space,
        &rewards,
        config.agent_params(space.len()),
        config.runs,
        config.iterations,
        config.on_non_convergence,
    )?;
    let seed = config.resolve_seed();
    let ensemble = runner.run(&args.target, seed)?;
    let averaged = average_tables(&ensemble.tables())?;

    let paths = ensemble.paths();
    println!(
        "Trained {} agents toward {} (seed {})",
        paths.len(),
        args.target,
        seed
    );
    if let Some((path, count)) = paths.most_common() {
        println!("  Most common path ({}/{}): {}", count, paths.len(), path.join(" -> "));
    }
    println!("  Non-convergent runs: {}", ensemble.non_converged());

    let dir = args.output.unwrap_or_else(env_config::output_dir);
    let file = save_ensemble(&dir, &args.name, &ensemble, Some(&averaged))?;
    println!("  Saved to {}", file.display());
    Ok(())
}
