use clap::Parser;

use crate::config::{AppConfig, PlotFormat};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Workbook with `Group` and `Size` sheets
    #[arg(value_name = "WORKBOOK")]
    pub workbook: String,

    /// Path to config TOML (written with commented defaults if missing)
    #[arg(long)]
    pub config: Option<String>,

    /// Random seed; derived from the clock when omitted
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of random partitions to score (overrides config)
    #[arg(long)]
    pub iterations: Option<usize>,

    /// Minimum pairwise p-value a grouping must exceed (overrides config)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Score partitions on all cores (overrides config)
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub parallel: Option<bool>,

    /// Plot document format (overrides config)
    #[arg(long, value_enum)]
    pub format: Option<PlotFormat>,

    /// Skip the diagnostic plots
    #[arg(long, default_value_t = false)]
    pub no_plot: bool,

    /// Output path prefix (default: workbook path without extension)
    #[arg(long, short)]
    pub output: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Config file (or defaults) with command-line overrides applied.
    pub fn resolve_config(&self) -> AppConfig {
        let mut cfg = match &self.config {
            Some(path) => AppConfig::load_or_default(path),
            None => AppConfig::default(),
        };
        if let Some(n) = self.iterations {
            cfg.search.iterations = n;
        }
        if let Some(t) = self.threshold {
            cfg.search.p_threshold = t;
        }
        if let Some(p) = self.parallel {
            cfg.search.parallel = p;
        }
        if let Some(f) = self.format {
            cfg.plot.format = f;
        }
        if self.no_plot {
            cfg.plot.enabled = false;
        }
        cfg
    }

    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
