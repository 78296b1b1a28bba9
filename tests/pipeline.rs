mod common;

use calamine::{Reader, open_workbook_auto};
use common::{Fixture, as_rows, mice, unique_path};
use groupbalance::Error;
use groupbalance::app::{RunOptions, run};
use groupbalance::config::AppConfig;

fn options(workbook: std::path::PathBuf, seed: u64) -> RunOptions {
    let mut config = AppConfig::default();
    config.search.iterations = 200;
    config.plot.enabled = false;
    RunOptions {
        workbook,
        output_stem: Some(unique_path("run")),
        seed,
        config,
    }
}

#[test]
fn run_writes_grouping_and_is_reproducible() {
    let mice = mice(14);
    let rows = as_rows(&mice);
    let input = Fixture::new(&[("Vehicle", 4.0), ("Low", 4.0), ("High", 4.0)], &rows).write("pipeline.xlsx");

    let opts = options(input.clone(), 77);
    let first = run(&opts).unwrap();
    assert!(first.chosen.score.p_min > 0.1);
    assert!(first.plot_path.is_none());
    assert!(first.grouping_path.exists());
    assert!(first.grouping_path.to_string_lossy().ends_with(".group.xlsx"));
    assert_eq!(first.iterations, 200);
    assert_eq!(first.groups.len(), 3);
    assert!(first.groups.iter().all(|(_, ids)| ids.len() == 4));

    let mut wb = open_workbook_auto(&first.grouping_path).unwrap();
    assert_eq!(wb.sheet_names(), vec!["Vehicle", "Low", "High"]);
    assert_eq!(wb.worksheet_range("Low").unwrap().rows().count(), 5);

    let mut again = options(input.clone(), 77);
    again.config.search.parallel = true;
    let second = run(&again).unwrap();
    assert_eq!(second.chosen, first.chosen);
    assert_eq!(second.groups, first.groups);

    let _ = std::fs::remove_file(&input);
    let _ = std::fs::remove_file(&first.grouping_path);
    let _ = std::fs::remove_file(&second.grouping_path);
}

#[test]
fn default_run_writes_pdf_plots() {
    let mice = mice(12);
    let rows = as_rows(&mice);
    let input = Fixture::new(&[("A", 4.0), ("B", 4.0), ("C", 4.0)], &rows).write("plotted.xlsx");

    let mut opts = options(input.clone(), 5);
    opts.config.plot.enabled = true;
    let summary = run(&opts).unwrap();
    let plot = summary.plot_path.clone().unwrap();
    assert_eq!(plot.extension().and_then(|e| e.to_str()), Some("pdf"));
    let bytes = std::fs::read(&plot).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));

    let _ = std::fs::remove_file(&input);
    let _ = std::fs::remove_file(&plot);
    let _ = std::fs::remove_file(&summary.grouping_path);
}

#[test]
fn impossible_threshold_fails_loudly() {
    let mice = mice(6);
    let rows = as_rows(&mice);
    let input = Fixture::new(&[("A", 3.0), ("B", 3.0)], &rows).write("strict.xlsx");

    let mut opts = options(input.clone(), 1);
    opts.config.search.iterations = 10;
    opts.config.search.p_threshold = 0.999_999;
    let err = run(&opts).unwrap_err();
    assert!(matches!(err, Error::NoBalancedCandidate { iterations: 10, .. }));
    assert!(err.to_string().contains("10"));

    let _ = std::fs::remove_file(&input);
}

#[test]
fn invalid_config_is_rejected_before_loading() {
    let mut opts = options(unique_path("never_read.xlsx"), 1);
    opts.config.search.iterations = 0;
    assert!(matches!(run(&opts).unwrap_err(), Error::Config(_)));
}
