use clap::Parser;
use log::{info, warn};
use std::error::Error;
use std::path::PathBuf;

use raster_histogram::config::{HistConfig, Overrides, load_config};
use raster_histogram::histogram::{BinRange, Histogram};
use raster_histogram::loader::load_raster;
use raster_histogram::plot::save_histogram_png;
use raster_histogram::report::{HistogramReport, HistogramSummary, write_json_file};

#[derive(Parser, Debug)]
#[command(
    name = "raster_hist",
    about = "Histogram the integer sample values of a raster image and plot them",
    version
)]
struct Cli {
    /// Input raster (PGM/PPM natively, other formats through `image`)
    input: PathBuf,

    /// JSON configuration file; flags below override it
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Inclusive lower bound of the bucket domain
    #[arg(long = "lower", allow_negative_numbers = true)]
    lower: Option<i32>,

    /// Exclusive upper bound of the bucket domain
    #[arg(long = "upper", allow_negative_numbers = true, conflicts_with = "auto_range")]
    upper: Option<i32>,

    /// Derive the upper bound from the source bit depth
    #[arg(long = "auto-range")]
    auto_range: bool,

    /// Also histogram each channel separately
    #[arg(long = "per-channel", short = 'C')]
    per_channel: bool,

    /// Plot log10(1 + count) instead of raw counts
    #[arg(long = "log")]
    log_scale: bool,

    /// Output path of the plot image
    #[arg(long = "plot", short = 'p')]
    plot: Option<PathBuf>,

    /// Skip rendering the plot
    #[arg(long = "no-plot", conflicts_with = "plot")]
    no_plot: bool,

    /// Write a JSON report to this path
    #[arg(long = "json", short = 'j')]
    json: Option<PathBuf>,

    /// Include raw bucket counts in the JSON report
    #[arg(long = "counts")]
    counts: bool,

    /// Plot width in pixels
    #[arg(long = "width")]
    width: Option<u32>,

    /// Plot height in pixels
    #[arg(long = "height")]
    height: Option<u32>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            lower: self.lower,
            upper: self.upper,
            auto_range: self.auto_range,
            per_channel: self.per_channel,
            log_scale: self.log_scale,
            plot: self.plot.clone(),
            no_plot: self.no_plot,
            json: self.json.clone(),
            counts: self.counts,
            width: self.width,
            height: self.height,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => load_config(path)?,
        None => HistConfig::default(),
    };
    cfg.apply_overrides(&cli.overrides());

    let raster = load_raster(&cli.input)?;
    let range: BinRange = cfg.range.resolve(raster.bit_depth())?;

    let pooled = Histogram::of_raster(&raster, range);
    if !pooled.is_complete() {
        warn!(
            "{} samples below {} and {} at or above {} were not bucketed",
            pooled.underflow(),
            range.lower(),
            pooled.overflow(),
            range.upper()
        );
    }
    let per_channel = if cfg.per_channel {
        Histogram::per_channel(&raster, range)
    } else {
        Vec::new()
    };

    println!("{}", HistogramSummary::from_histogram(&pooled, false).one_line());
    for (c, h) in per_channel.iter().enumerate() {
        println!(
            "channel {c}: {}",
            HistogramSummary::from_histogram(h, false).one_line()
        );
    }

    if cfg.plot.enabled {
        let series: Vec<&Histogram> = if per_channel.is_empty() {
            vec![&pooled]
        } else {
            per_channel.iter().collect()
        };
        save_histogram_png(&series, &cfg.plot.options, &cfg.plot.output)?;
        info!("wrote {}", cfg.plot.output.display());
    }

    if let Some(out) = &cfg.report.output {
        let report = HistogramReport::new(
            &cli.input,
            &raster,
            &pooled,
            &per_channel,
            cfg.report.include_counts,
        );
        write_json_file(&report, out)?;
        info!("wrote {}", out.display());
    }

    Ok(())
}
