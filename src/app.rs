//! The end-to-end run: load, search, select, report, export.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::core::search::{Candidate, Partition, SearchParams, search};
use crate::core::select::{RankedCandidate, select};
use crate::error::Result;
use crate::report::{self, Report};
use crate::workbook;

/// Below this share of passing candidates the run still succeeds, but warns
/// that the choice came from a thin pool.
pub const LOW_PASS_RATE: f64 = 0.05;

/// Everything a single invocation needs.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub workbook: PathBuf,
    /// Output path prefix; defaults to the workbook path minus its extension.
    pub output_stem: Option<PathBuf>,
    pub seed: u64,
    pub config: AppConfig,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub seed: u64,
    pub chosen: Candidate,
    pub rank: RankedCandidate,
    pub passing: usize,
    pub iterations: usize,
    /// Group name and member subject ids, in schema order.
    pub groups: Vec<(String, Vec<String>)>,
    pub plot_path: Option<PathBuf>,
    pub grouping_path: PathBuf,
}

/// `data/mice.xlsx` -> `data/mice`.
pub fn output_stem(input: &Path) -> PathBuf {
    input.with_extension("")
}

pub fn with_suffix(stem: &Path, suffix: &str) -> PathBuf {
    let mut s: OsString = stem.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}

fn few_pass(passing: usize, iterations: usize) -> bool {
    (passing as f64) < LOW_PASS_RATE * iterations as f64
}

pub fn run(opts: &RunOptions) -> Result<RunSummary> {
    let cfg = &opts.config;
    cfg.validate()?;

    let (schema, roster) = workbook::load(&opts.workbook)?;
    if roster.len() > schema.total() {
        info!(
            unused = roster.len() - schema.total(),
            "some subjects are left out of every partition"
        );
    }

    let params = SearchParams::new(cfg.search.iterations, opts.seed).parallel(cfg.search.parallel);
    let candidates = search(&roster, &schema, &params);
    let selection = select(&candidates, cfg.search.p_threshold)?;
    let chosen = selection.chosen;
    let rank = *selection.best();
    info!(
        iteration = chosen.iteration,
        seed = chosen.seed,
        p_min = chosen.score.p_min,
        sd_max = chosen.score.sd_max,
        score = rank.score,
        passing = selection.passing(),
        iterations = candidates.len(),
        "chose candidate"
    );
    if few_pass(selection.passing(), candidates.len()) {
        warn!(
            passing = selection.passing(),
            iterations = candidates.len(),
            cutoff = LOW_PASS_RATE,
            "few candidates pass the significance filter"
        );
    }

    // Only scores were kept during the search; draw the winner again.
    let partition = Partition::draw(&roster, &schema, chosen.seed);
    let sizes = roster.sizes();

    let stem = opts
        .output_stem
        .clone()
        .unwrap_or_else(|| output_stem(&opts.workbook));

    let plot_path = if cfg.plot.enabled {
        let path = with_suffix(&stem, &format!(".{}", cfg.plot.format.extension()));
        let groups = schema
            .groups()
            .iter()
            .zip(partition.values(&sizes))
            .map(|(spec, values)| (spec.name.clone(), values))
            .collect();
        let diagnostics = Report {
            candidates: &candidates,
            threshold: cfg.search.p_threshold,
            chosen: &chosen,
            groups,
        };
        report::render(&path, &cfg.plot, &diagnostics, chosen.seed)?;
        Some(path)
    } else {
        None
    };

    let grouping_path = with_suffix(&stem, ".group.xlsx");
    workbook::write_grouping(&grouping_path, &schema, &roster, &partition)?;

    let groups = schema
        .groups()
        .iter()
        .zip(partition.groups())
        .map(|(spec, members)| {
            let ids = members
                .iter()
                .map(|&i| roster.subjects()[i].id.clone())
                .collect();
            (spec.name.clone(), ids)
        })
        .collect();

    Ok(RunSummary {
        seed: opts.seed,
        chosen,
        rank,
        passing: selection.passing(),
        iterations: candidates.len(),
        groups,
        plot_path,
        grouping_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_strips_last_extension_only() {
        assert_eq!(output_stem(Path::new("data/mice.xlsx")), PathBuf::from("data/mice"));
        assert_eq!(output_stem(Path::new("run.v2.xlsx")), PathBuf::from("run.v2"));
        assert_eq!(output_stem(Path::new("plain")), PathBuf::from("plain"));
    }

    #[test]
    fn thin_pool_cutoff() {
        assert!(few_pass(4, 100));
        assert!(!few_pass(5, 100));
        assert!(!few_pass(1, 1));
        assert!(!few_pass(0, 0));
    }

    #[test]
    fn suffix_appends_verbatim() {
        assert_eq!(
            with_suffix(Path::new("data/mice"), ".group.xlsx"),
            PathBuf::from("data/mice.group.xlsx")
        );
    }
}
