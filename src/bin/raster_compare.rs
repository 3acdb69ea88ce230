use clap::Parser;
use std::error::Error;
use std::path::PathBuf;

use raster_histogram::compare::compare;
use raster_histogram::loader::load_raster;

#[derive(Parser, Debug)]
#[command(
    name = "raster_compare",
    about = "Report MSE/PAE per channel and overall PSNR between two rasters",
    version
)]
struct Cli {
    /// Reference raster
    reference: PathBuf,

    /// Raster to compare against the reference
    candidate: PathBuf,

    /// Print the comparison as JSON instead of plain lines
    #[arg(long = "json")]
    json: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let a = load_raster(&cli.reference)?;
    let b = load_raster(&cli.candidate)?;
    let cmp = compare(&a, &b)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&cmp)?);
        return Ok(());
    }

    // One "mse pae" line per channel, then "psnr pae" over all channels.
    for c in &cmp.channels {
        println!("{:.6} {}", c.mse, c.pae);
    }
    println!("{:.6} {}", cmp.psnr, cmp.pae);
    Ok(())
}
