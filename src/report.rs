//! Diagnostic plots for a finished search.
//!
//! Two plots: the score scatter of every candidate with the chosen one marked,
//! and box plots of the chosen grouping with each subject drawn as a jittered
//! point. A PDF gets one page per plot; svg and png stack them as panels.

use std::error::Error as StdError;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;
use printpdf::{Mm, PdfDocument, Svg, SvgTransform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::config::{PlotConfig, PlotFormat};
use crate::core::search::Candidate;
use crate::core::stats::BoxSummary;
use crate::error::{Error, Result};

type PlotResult = std::result::Result<(), Box<dyn StdError>>;

const DODGER_BLUE: RGBColor = RGBColor(30, 144, 255);
const BOX_HALF_WIDTH: f64 = 0.3;
const CAP_HALF_WIDTH: f64 = 0.15;
/// Pixel density used to size PDF pages from the panel dimensions.
const PDF_DPI: f32 = 150.0;

/// What the plots need from a finished run.
pub struct Report<'a> {
    pub candidates: &'a [Candidate],
    pub threshold: f64,
    pub chosen: &'a Candidate,
    /// Chosen grouping: group name and member sizes, in schema order.
    pub groups: Vec<(String, Vec<f64>)>,
}

/// Padded axis range over the finite values; falls back to `0..1`.
pub fn axis_range(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    if hi - lo <= f64::EPSILON * hi.abs().max(1.0) {
        return (lo - 1.0, hi + 1.0);
    }
    let pad = 0.05 * (hi - lo);
    (lo - pad, hi + pad)
}

/// Horizontal positions for a group's points: `center + N(0, sd)`.
pub fn jitter<R: Rng>(rng: &mut R, center: f64, sd: f64, n: usize) -> Vec<f64> {
    (0..n)
        .map(|_| {
            // Box-Muller; 1 - u keeps the log argument in (0, 1].
            let u1: f64 = 1.0 - rng.random::<f64>();
            let u2: f64 = rng.random::<f64>();
            let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
            center + sd * z
        })
        .collect()
}

/// Render the plot document in the configured format. `seed` drives the
/// point jitter.
pub fn render(path: &Path, cfg: &PlotConfig, report: &Report<'_>, seed: u64) -> Result<()> {
    let size = (cfg.width, cfg.height.saturating_mul(2));
    let rendered = match cfg.format {
        PlotFormat::Pdf => write_pdf(path, cfg, report, seed),
        PlotFormat::Svg => {
            let root = SVGBackend::new(path, size).into_drawing_area();
            draw_document(&root, cfg, report, seed)
        }
        PlotFormat::Png => {
            let root = BitMapBackend::new(path, size).into_drawing_area();
            draw_document(&root, cfg, report, seed)
        }
    };
    rendered.map_err(|e| Error::Plot(e.to_string()))?;
    info!(path = %path.display(), "wrote diagnostic plots");
    Ok(())
}

fn px_to_mm(px: u32) -> Mm {
    Mm(px as f32 * 25.4 / PDF_DPI)
}

/// One panel drawn into an in-memory SVG document.
fn panel_svg<F>(cfg: &PlotConfig, draw: F) -> std::result::Result<String, Box<dyn StdError>>
where
    F: FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> PlotResult,
{
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (cfg.width, cfg.height)).into_drawing_area();
        root.fill(&WHITE)?;
        draw(&root)?;
        root.present()?;
    }
    Ok(svg)
}

fn write_pdf(path: &Path, cfg: &PlotConfig, report: &Report<'_>, seed: u64) -> PlotResult {
    let pages = [
        panel_svg(cfg, |area| draw_scores(area, cfg, report))?,
        panel_svg(cfg, |area| draw_groups(area, cfg, report, seed))?,
    ];

    let (width, height) = (px_to_mm(cfg.width), px_to_mm(cfg.height));
    let (doc, first_page, first_layer) = PdfDocument::new("Group balance", width, height, "plot");
    let mut layer = doc.get_page(first_page).get_layer(first_layer);
    for (i, svg) in pages.iter().enumerate() {
        if i > 0 {
            let (page, page_layer) = doc.add_page(width, height, "plot");
            layer = doc.get_page(page).get_layer(page_layer);
        }
        let svg = Svg::parse(svg).map_err(|e| format!("svg to pdf: {e:?}"))?;
        svg.add_to_layer(
            &layer,
            SvgTransform {
                dpi: Some(PDF_DPI),
                ..SvgTransform::default()
            },
        );
    }

    let mut out = BufWriter::new(File::create(path)?);
    doc.save(&mut out).map_err(|e| format!("write pdf: {e:?}"))?;
    Ok(())
}

fn draw_document<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    cfg: &PlotConfig,
    report: &Report<'_>,
    seed: u64,
) -> PlotResult
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let panels = root.split_evenly((2, 1));
    draw_scores(&panels[0], cfg, report)?;
    draw_groups(&panels[1], cfg, report, seed)?;
    root.present()?;
    Ok(())
}

fn draw_scores<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    cfg: &PlotConfig,
    report: &Report<'_>,
) -> PlotResult
where
    DB::ErrorType: 'static,
{
    let font = cfg.font_size;
    let (sd_lo, sd_hi) = axis_range(report.candidates.iter().map(|c| c.score.sd_max));

    let mut chart = ChartBuilder::on(area)
        .caption("Candidate scores", ("sans-serif", font))
        .margin(20)
        .x_label_area_size(font * 2)
        .y_label_area_size(font * 3)
        .build_cartesian_2d(0.0f64..1.0f64, sd_lo..sd_hi)?;

    chart
        .configure_mesh()
        .x_desc("pvalue min")
        .y_desc("std max")
        .label_style(("sans-serif", font * 2 / 3))
        .draw()?;

    let finite = report
        .candidates
        .iter()
        .filter(|c| c.score.p_min.is_finite() && c.score.sd_max.is_finite());
    chart.draw_series(
        finite
            .clone()
            .filter(|c| !c.score.passes(report.threshold))
            .map(|c| Circle::new((c.score.p_min, c.score.sd_max), 4, BLACK.mix(0.25).filled())),
    )?;
    chart.draw_series(
        finite
            .filter(|c| c.score.passes(report.threshold))
            .map(|c| Circle::new((c.score.p_min, c.score.sd_max), 4, BLUE.mix(0.6).filled())),
    )?;

    chart.draw_series(std::iter::once(PathElement::new(
        vec![(report.threshold, sd_lo), (report.threshold, sd_hi)],
        RED.mix(0.4),
    )))?;

    let chosen = report.chosen.score;
    if chosen.sd_max.is_finite() {
        chart.draw_series(std::iter::once(Cross::new(
            (chosen.p_min, chosen.sd_max),
            12,
            RED.stroke_width(3),
        )))?;
    }
    Ok(())
}

fn draw_groups<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    cfg: &PlotConfig,
    report: &Report<'_>,
    seed: u64,
) -> PlotResult
where
    DB::ErrorType: 'static,
{
    let font = cfg.font_size;
    let n = report.groups.len();
    let (y_lo, y_hi) = axis_range(report.groups.iter().flat_map(|(_, v)| v.iter().copied()));
    let names: Vec<&str> = report.groups.iter().map(|(name, _)| name.as_str()).collect();
    let label = |x: &f64| {
        let i = x.round();
        if (x - i).abs() < 1e-6 && i >= 0.0 && (i as usize) < names.len() {
            names[i as usize].to_string()
        } else {
            String::new()
        }
    };

    let mut chart = ChartBuilder::on(area)
        .caption("Chosen grouping", ("sans-serif", font))
        .margin(20)
        .x_label_area_size(font * 2)
        .y_label_area_size(font * 3)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), y_lo..y_hi)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n.max(1))
        .x_label_formatter(&label)
        .y_desc("tumor size")
        .label_style(("sans-serif", font * 2 / 3))
        .draw()?;

    let mut rng = StdRng::seed_from_u64(seed);
    for (i, (_, values)) in report.groups.iter().enumerate() {
        let x = i as f64;
        if let Some(b) = BoxSummary::from_values(values) {
            chart.draw_series(std::iter::once(Rectangle::new(
                [(x - BOX_HALF_WIDTH, b.q1), (x + BOX_HALF_WIDTH, b.q3)],
                BLACK.stroke_width(2),
            )))?;
            let whiskers = [
                vec![(x, b.q3), (x, b.whisker_hi)],
                vec![(x, b.q1), (x, b.whisker_lo)],
                vec![(x - CAP_HALF_WIDTH, b.whisker_hi), (x + CAP_HALF_WIDTH, b.whisker_hi)],
                vec![(x - CAP_HALF_WIDTH, b.whisker_lo), (x + CAP_HALF_WIDTH, b.whisker_lo)],
            ];
            chart.draw_series(
                whiskers
                    .into_iter()
                    .map(|pts| PathElement::new(pts, BLACK.stroke_width(2))),
            )?;
            chart.draw_series(std::iter::once(PathElement::new(
                vec![(x - BOX_HALF_WIDTH, b.median), (x + BOX_HALF_WIDTH, b.median)],
                DODGER_BLUE.stroke_width(5),
            )))?;
        }

        let xs = jitter(&mut rng, x, cfg.jitter_sd, values.len());
        chart.draw_series(
            xs.into_iter()
                .zip(values.iter().copied())
                .filter(|(_, v)| v.is_finite())
                .map(|(px, v)| Circle::new((px, v), 5, DODGER_BLUE.filled())),
        )?;
    }
    Ok(())
}
