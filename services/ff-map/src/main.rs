//! Map of point and gridded flash flood reports for one 24-hour period.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use ff_reports::{run_map, Config, Grib2GridReader, MapOutput, DEFAULT_CONFIG_PATH};
use renderer::RasterRenderer;

#[derive(Parser, Debug)]
#[command(name = "ff-map")]
#[command(about = "Plot point and gridded flash flood reports on a map")]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, env = "FF_CONFIG")]
    config: String,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize tracing
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt().with_env_filter(filter).with_target(true).init();

    info!("Starting flash flood map plot");

    let config = Config::load_or_default(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config))?;

    let font_path = config.rendering.font_path.as_ref().map(|p| config.resolve(p));
    let renderer = RasterRenderer::new(font_path.as_deref());

    match run_map(&config, &Grib2GridReader, &renderer).context("Map plotting failed")? {
        MapOutput::File(path) => info!(path = %path.display(), "Map plot complete"),
        MapOutput::Viewed => info!("Map viewer closed"),
    }
    Ok(())
}
