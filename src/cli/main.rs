use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use exif_date_fix::config::Config;
use exif_date_fix::pipeline::{self, Bucket};

#[derive(Parser, Debug)]
#[command(
    name = "exif-date-fix",
    version,
    about = "Restore missing EXIF capture dates on JPEG files from their filenames"
)]
struct Cli {
    /// Directory of images to triage
    #[arg(short, long, value_name = "DIR", env = "DATEFIX_FOLDER")]
    folder: Option<PathBuf>,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let config = Config::resolve(cli.folder).context("Cannot start")?;

    let report = pipeline::run(&config)
        .with_context(|| format!("Failed to read {}", config.input_dir().display()))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    // Summary
    for bucket in Bucket::ALL {
        let count = report.count(bucket);
        if count > 0 {
            log::info!("{:>12}: {count}", bucket.dir_name());
        }
    }
    let failed = report.failed();
    if failed > 0 {
        log::warn!("{failed} file(s) could not be placed");
    }
    log::info!("Done: {} file(s) processed", report.results.len());

    Ok(())
}
