use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use knotfit::{
    dataset::Dataset,
    plotting::{DiagnosticRenderer, NoRenderer},
    sink::CsvSink,
    sweep::{BatchSummary, KnotRange, SweepConfig, SweepRunner},
};

const USAGE: &str = "Usage: knot_sweep <export.csv>... [out=<dir>] [knots=<start>..<end>] [config=<file.json>] [plots=true|false]";

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut inputs = Vec::new();
    let mut config_path = None;
    let mut output_dir = None;
    let mut knots = None;
    let mut plots = None;
    for arg in std::env::args().skip(1) {
        if arg == "help" || arg == "--help" || arg == "-h" {
            eprintln!("{USAGE}");
            return Ok(());
        }

        if let Some(option) = arg.strip_prefix("config=") {
            config_path = Some(PathBuf::from(option));
        } else if let Some(option) = arg.strip_prefix("out=") {
            output_dir = Some(PathBuf::from(option));
        } else if let Some(option) = arg.strip_prefix("knots=") {
            knots = Some(parse_knot_range(option)?);
        } else if let Some(option) = arg.strip_prefix("plots=") {
            plots = Some(
                option
                    .parse::<bool>()
                    .with_context(|| format!("Invalid plots value: {option}"))?,
            );
        } else {
            inputs.push(PathBuf::from(arg));
        }
    }

    if inputs.is_empty() {
        bail!("No input files given\n{USAGE}");
    }

    //
    // Command line options override the configuration file
    let mut config = match &config_path {
        Some(path) => SweepConfig::from_json_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => SweepConfig::default(),
    };
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }
    if let Some(range) = knots {
        config.knots = range;
    }
    if let Some(plots) = plots {
        config.plots = plots;
    }

    let summary = if config.plots {
        run(&inputs, &config, renderer(&config))?
    } else {
        run(&inputs, &config, NoRenderer)?
    };

    println!("{summary}");
    println!("Results written to {}", config.output_dir.display());
    Ok(())
}

#[cfg(feature = "plotting")]
fn renderer(config: &SweepConfig) -> knotfit::plotting::PlottersRenderer {
    knotfit::plotting::PlottersRenderer::new(&config.output_dir)
}

#[cfg(not(feature = "plotting"))]
fn renderer(_: &SweepConfig) -> NoRenderer {
    log::warn!("Built without the `plotting` feature; no plots will be drawn");
    NoRenderer
}

fn run<R: DiagnosticRenderer>(
    inputs: &[PathBuf],
    config: &SweepConfig,
    renderer: R,
) -> anyhow::Result<BatchSummary> {
    let sink = CsvSink::new(&config.output_dir);
    let mut runner = SweepRunner::new(config.clone(), sink, renderer);

    let mut summary = BatchSummary::default();
    for path in inputs {
        let dataset = load(path)?;
        summary.merge(&runner.run_dataset(&dataset));
    }
    Ok(summary)
}

fn load(path: &Path) -> anyhow::Result<Dataset> {
    let dataset = Dataset::from_csv_path(path)
        .with_context(|| format!("Failed to read dataset {}", path.display()))?;
    log::info!(
        "Loaded `{}`: {} spectra over {} wavelengths",
        dataset.name(),
        dataset.len(),
        dataset.axis().len()
    );
    Ok(dataset)
}

/// `4..24` and `4..=24` are both inclusive of the end.
fn parse_knot_range(text: &str) -> anyhow::Result<KnotRange> {
    let Some((start, end)) = text.split_once("..") else {
        bail!("Invalid knots value: {text}, expected <start>..<end>");
    };
    let end = end.strip_prefix('=').unwrap_or(end);

    let start: usize = start
        .trim()
        .parse()
        .with_context(|| format!("Invalid knot range start: {start}"))?;
    let end: usize = end
        .trim()
        .parse()
        .with_context(|| format!("Invalid knot range end: {end}"))?;
    if start > end {
        bail!("Empty knot range: {text}");
    }

    Ok(KnotRange::new(start, end))
}
