//! Command-line interfaces for the two stages.
//!
//! Both binaries take the period as `YYYY` or `YYYY-YYYY` and share the
//! optional config file and WebDriver endpoint flags.

use clap::{Args, Parser};
use std::path::PathBuf;

/// Flags common to both stages.
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Academic period, e.g. 2020 or 2016-2017
    #[arg(short, long)]
    pub period: String,

    /// Optional path to a YAML tuning file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// WebDriver endpoint (overrides the config file)
    #[arg(long, env = "WEBDRIVER_URL")]
    pub webdriver_url: Option<String>,
}

/// Search the research portal for each awardee's publications in a period.
///
/// # Examples
///
/// ```sh
/// fetch_publications --period 2016-2017
///
/// # No per-query cap
/// fetch_publications --period 2020 --limit 0
/// ```
#[derive(Parser, Debug)]
#[command(name = "fetch_publications", author, version, about)]
pub struct DiscoverCli {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Max rows captured per name variant; 0 = unlimited
    #[arg(short, long, default_value_t = 1000)]
    pub limit: usize,
}

/// Check each discovered publication for a DRIC funding acknowledgment.
///
/// # Examples
///
/// ```sh
/// check_dric --period 2016-2017 --config dric.yaml
/// ```
#[derive(Parser, Debug)]
#[command(name = "check_dric", author, version, about)]
pub struct ClassifyCli {
    #[command(flatten)]
    pub common: CommonArgs,
}
