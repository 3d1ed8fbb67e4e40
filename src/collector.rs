//! Discovery stage: awardee roster in, `raw_publications.csv` out.
//!
//! # Flow
//!
//! 1. [`Discovery::prepare`] parses the period, loads the roster and checks the
//!    output directory. Nothing here touches the browser.
//! 2. [`Discovery::run`] opens the portal once and searches every name variant
//!    of every awardee on that single tab, in roster order.
//! 3. Rows are kept only when their year parses and falls inside the period.
//!    Exact duplicates (same authors, title, year and link) are dropped,
//!    keeping the first occurrence.

use crate::browser::{Browser, Page};
use crate::config::PipelineConfig;
use crate::error::Error;
use crate::inputs::read_awardees;
use crate::models::{Period, Publication, ScrapedRow};
use crate::names::query_variants;
use crate::outputs::write_publications;
use crate::scrapers::portal::{SEARCH_INPUT, scrape_query};
use crate::utils::ensure_writable_dir;
use itertools::Itertools;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const PORTAL_TIMEOUT: Duration = Duration::from_secs(60);

/// Keep `row` if its year is inside `period`; the year is stored normalized.
fn retain(row: ScrapedRow, period: Period) -> Option<Publication> {
    let year = row.year().filter(|y| period.contains(*y))?;
    Some(Publication {
        authors: row.authors,
        title: row.title,
        year: year.to_string(),
        scholar_link: row.link,
    })
}

/// Search every variant of every awardee and return the deduplicated hits.
///
/// A failed search is logged and skipped; the remaining queries still run.
pub async fn collect(
    page: &mut dyn Page,
    awardees: &[String],
    period: Period,
    cap: Option<usize>,
) -> Vec<Publication> {
    let mut found = Vec::new();
    for awardee in awardees {
        for query in query_variants(awardee) {
            info!(%query, %awardee, %period, "Searching portal");
            let rows = match scrape_query(page, &query, period.year_min, cap).await {
                Ok(rows) => rows,
                Err(e) => {
                    warn!(%query, error = %e, "Search failed; skipping query");
                    continue;
                }
            };
            let scraped = rows.len();
            let before = found.len();
            found.extend(rows.into_iter().filter_map(|row| retain(row, period)));
            info!(%query, scraped, kept = found.len() - before, "Query finished");
        }
    }

    let total = found.len();
    let unique: Vec<Publication> = found.into_iter().unique().collect();
    if unique.len() < total {
        info!(dropped = total - unique.len(), "Dropped exact duplicate rows");
    }
    unique
}

/// One discovery run for one period.
#[derive(Debug)]
pub struct Discovery {
    pub period: Period,
    pub awardees: Vec<String>,
    /// Rows taken per query; `None` is unlimited.
    pub cap: Option<usize>,
    pub portal_url: String,
    pub output: PathBuf,
}

impl Discovery {
    /// Validate inputs before a browser is started.
    ///
    /// `limit == 0` means no per-query cap.
    #[instrument(level = "info", skip_all, fields(%period_label, limit = limit))]
    pub async fn prepare(period_label: &str, limit: usize, config: &PipelineConfig) -> Result<Self, Error> {
        let period = Period::parse(period_label)?;
        let awardees = read_awardees(&config.awardees_file(period_label))?;
        let out_dir = config.period_dir(period_label);
        ensure_writable_dir(&out_dir).await?;
        Ok(Self {
            period,
            awardees,
            cap: (limit > 0).then_some(limit),
            portal_url: config.portal_url.clone(),
            output: config.raw_publications_file(period_label),
        })
    }

    /// Search, write the output file, and close `browser` whatever happens.
    #[instrument(level = "info", skip_all, fields(period = %self.period, awardees = self.awardees.len()))]
    pub async fn run(&self, browser: &dyn Browser) -> Result<Vec<Publication>, Error> {
        let outcome = self.search(browser).await;
        if let Err(e) = browser.close().await {
            warn!(error = %e, "Closing browser failed");
        }
        let publications = outcome?;
        write_publications(&self.output, &publications).await?;
        info!(records = publications.len(), path = %self.output.display(), "Discovery finished");
        Ok(publications)
    }

    async fn search(&self, browser: &dyn Browser) -> Result<Vec<Publication>, Error> {
        let mut page = browser.new_page().await?;
        let outcome = self.search_on(page.as_mut()).await;
        if let Err(e) = page.close().await {
            debug!(error = %e, "Closing portal tab failed");
        }
        outcome
    }

    async fn search_on(&self, page: &mut dyn Page) -> Result<Vec<Publication>, Error> {
        page.goto(&self.portal_url, PORTAL_TIMEOUT).await?;
        page.wait_for(SEARCH_INPUT, PORTAL_TIMEOUT).await?;
        Ok(collect(page, &self.awardees, self.period, self.cap).await)
    }
}
