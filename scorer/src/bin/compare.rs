use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use clap::{Parser, ValueEnum};

use meaningful_play::distance::minkowski_distance;
use meaningful_play::env_config;
use meaningful_play::state_space::StateSpace;
use meaningful_play::storage::load_table;
use meaningful_play::weighting::{DepthWeighter, DepthWeights};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Weighting {
    /// Compare raw averaged tables
    None,
    /// Depth weights, terminal rows zeroed
    Zeroed,
    /// Depth weights, terminal rows at a small weight
    Tapered,
}

/// Minkowski distance between two saved averaged value tables.
#[derive(Parser, Debug)]
#[command(name = "mps-compare", version, about)]
struct Args {
    first: PathBuf,
    second: PathBuf,

    /// Minkowski orders to report
    #[arg(short = 'p', long = "order", value_delimiter = ',', default_values_t = vec![1.0, 2.0])]
    orders: Vec<f64>,

    #[arg(short, long, value_enum, default_value_t = Weighting::Tapered)]
    weighting: Weighting,
}

fn order_name(p: f64) -> &'static str {
    if p == 1.0 {
        " (Manhattan Distance)"
    } else if p == 2.0 {
        " (Euclidean Distance)"
    } else {
        ""
    }
}

fn main() -> Result<()> {
    env_config::init_tracing();
    let args = Args::parse();

    let a = load_table(&args.first).with_context(|| format!("loading {}", args.first.display()))?;
    let b =
        load_table(&args.second).with_context(|| format!("loading {}", args.second.display()))?;
    ensure!(
        a.dim() == b.dim(),
        "tables differ in size: {}x{} vs {}x{}",
        a.dim(),
        a.dim(),
        b.dim(),
        b.dim()
    );

    let weights = match args.weighting {
        Weighting::None => None,
        Weighting::Zeroed => Some(DepthWeights::zeroed_terminals()),
        Weighting::Tapered => Some(DepthWeights::tapered_terminals()),
    };
    let (x, y) = match weights {
        Some(w) => {
            let weighter = DepthWeighter::new(&w, &StateSpace::reference())?;
            (weighter.weight(&a)?, weighter.weight(&b)?)
        }
        None => (a.as_slice().to_vec(), b.as_slice().to_vec()),
    };

    for p in args.orders {
        let d = minkowski_distance(&x, &y, p)?;
        println!("Minkowski distance with p-value {}{}: {:.3}", p, order_name(p), d);
    }
    Ok(())
}
