//! Discovery entry point: awardee roster to `raw_publications.csv`.

use clap::Parser;
use dric_tracker::browser::webdriver::WebDriverBrowser;
use dric_tracker::cli::DiscoverCli;
use dric_tracker::collector::Discovery;
use dric_tracker::config::PipelineConfig;
use std::error::Error;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = DiscoverCli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = PipelineConfig::load(args.common.config.as_deref())?;
    let job = match Discovery::prepare(&args.common.period, args.limit, &config).await {
        Ok(job) => job,
        Err(e) => {
            error!(error = %e, "Cannot start discovery");
            return Err(e.into());
        }
    };
    info!(period = %job.period, awardees = job.awardees.len(), cap = ?job.cap, "Starting fetch");

    let webdriver_url = args.common.webdriver_url.as_deref().unwrap_or(&config.webdriver_url);
    let browser = WebDriverBrowser::launch(webdriver_url).await?;
    let publications = job.run(&browser).await?;

    info!(
        records = publications.len(),
        elapsed_secs = start_time.elapsed().as_secs_f64(),
        "fetch_publications finished"
    );
    Ok(())
}
