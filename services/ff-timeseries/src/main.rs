//! Yearly timeseries of point and gridded flash flood report counts.
//!
//! Writes one bar chart per configured year.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use ff_reports::{run_timeseries, Config, Grib2GridReader, DEFAULT_CONFIG_PATH};
use renderer::RasterRenderer;

#[derive(Parser, Debug)]
#[command(name = "ff-timeseries")]
#[command(about = "Plot daily counts of flash flood reports over whole years")]
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

    info!("Starting flash flood timeseries plots");

    let config = Config::load_or_default(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config))?;

    let font_path = config.rendering.font_path.as_ref().map(|p| config.resolve(p));
    let renderer = RasterRenderer::new(font_path.as_deref());

    let written = run_timeseries(&config, &Grib2GridReader, &renderer)
        .context("Timeseries plotting failed")?;

    info!(plots = written.len(), "Timeseries plots complete");
    Ok(())
}
