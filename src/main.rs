// Entry point: parse arguments, set up logging, run the pipeline once.
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use tracing::info;

use groupbalance::app::{self, RunOptions};
use groupbalance::cli::Args;

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(args.log_level())
        .with_writer(io::stderr)
        .init();

    let seed = args.seed.unwrap_or_else(clock_seed);
    info!(seed, "using seed");

    let opts = RunOptions {
        workbook: PathBuf::from(&args.workbook),
        output_stem: args.output.as_ref().map(PathBuf::from),
        seed,
        config: args.resolve_config(),
    };

    match app::run(&opts) {
        Ok(summary) => {
            println!(
                "chose iteration {} (p_min {:.4}, sd_max {:.4}, score {}) from {} of {} passing candidates; seed {}",
                summary.chosen.iteration,
                summary.chosen.score.p_min,
                summary.chosen.score.sd_max,
                summary.rank.score,
                summary.passing,
                summary.iterations,
                summary.seed,
            );
            for (name, ids) in &summary.groups {
                println!("  {name}: {}", ids.join(", "));
            }
            if let Some(path) = &summary.plot_path {
                println!("plots: {}", path.display());
            }
            println!("grouping: {}", summary.grouping_path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
