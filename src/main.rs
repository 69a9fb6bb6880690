use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use transship_dp::io::reporting;
use transship_dp::model::state::State;
use transship_dp::{BellmanSolver, SolverConfig};

/// Solve the two-retailer transshipment problem and export the policy.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// TOML configuration file; defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the number of periods.
    #[arg(short, long)]
    periods: Option<usize>,

    /// Override the worker thread count.
    #[arg(short, long)]
    workers: Option<usize>,

    /// Directory for policy.csv and values.csv.
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run(Args::parse()) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> transship_dp::Result<()> {
    // 1. CONFIGURATION
    let mut config = match &args.config {
        Some(path) => SolverConfig::load(path)?,
        None => SolverConfig::default(),
    };
    if let Some(periods) = args.periods {
        config = config.with_periods(periods);
    }
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }

    // 2. PRECOMPUTE AND SOLVE
    let solver = BellmanSolver::new(config)?;
    let solution = solver.solve()?;

    // 3. EXPORT
    std::fs::create_dir_all(&args.output_dir)?;
    reporting::write_policy_table(args.output_dir.join("policy.csv"), &solution.policy)?;
    reporting::write_value_table(args.output_dir.join("values.csv"), &solution.values)?;

    // 4. SUMMARY
    let values = solution.values.as_slice();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let empty = solution.values.get(&State::new(0, 0, 0)).unwrap_or(f64::NAN);
    info!(min, max, empty_system = empty, "V[1] summary");

    Ok(())
}
