//! Classification entry point: `raw_publications.csv` to per-row DRIC verdicts.

use clap::Parser;
use dric_tracker::browser::webdriver::WebDriverBrowser;
use dric_tracker::classify::ClassifySession;
use dric_tracker::cli::ClassifyCli;
use dric_tracker::config::{PipelineConfig, Secrets};
use dric_tracker::fetch::FetchSession;
use dric_tracker::pipeline::{Classification, RowPipeline};
use dric_tracker::providers::firecrawl::FirecrawlClient;
use dric_tracker::providers::groq::GroqClient;
use dric_tracker::scrapers::citation::LinkResolver;
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
    let args = ClassifyCli::parse();
    debug!(?args, "Parsed CLI arguments");

    // Secrets first: a missing key must fail before any browser work.
    let secrets = match Secrets::from_env() {
        Ok(secrets) => secrets,
        Err(e) => {
            error!(error = %e, "Missing credentials");
            return Err(e.into());
        }
    };
    let config = PipelineConfig::load(args.common.config.as_deref())?;

    let job = match Classification::prepare(&args.common.period, &config).await {
        Ok(job) => job,
        Err(e) => {
            error!(error = %e, "Cannot start classification");
            return Err(e.into());
        }
    };
    info!(period = %job.period, rows = job.publications.len(), model = %config.model, "Processing period");

    let extractor = FirecrawlClient::new(&config.firecrawl_endpoint, &secrets.firecrawl_api_key)?;
    let model = GroqClient::new(&config.groq_endpoint, &secrets.groq_api_key, &config.model)?;
    let mut pipeline = RowPipeline::new(
        LinkResolver::new(&config.portal_host_marker, &config.repository_handle_marker),
        FetchSession::new(Box::new(extractor), config.fetch),
        ClassifySession::new(Box::new(model), config.classify),
    );

    let webdriver_url = args.common.webdriver_url.as_deref().unwrap_or(&config.webdriver_url);
    let browser = WebDriverBrowser::launch(webdriver_url).await?;
    let records = job.run(&mut pipeline, &browser).await?;

    info!(
        records = records.len(),
        elapsed_secs = start_time.elapsed().as_secs_f64(),
        "check_dric finished"
    );
    Ok(())
}
