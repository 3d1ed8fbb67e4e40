//! Research-portal publication table.
//!
//! The portal lists publications in an ngx-datatable that only renders the
//! rows near the viewport and lazily adds more as its inner scroller moves.
//! A search therefore proceeds in rounds: read the rendered rows, take the
//! ones not seen yet, scroll the scroller to its end, settle, repeat.
//!
//! Column layout: 1) #, 2) title (linked), 3) authors, 4) cited by, 5) year.
//!
//! With the year column sorted descending, the first row older than the
//! period floor means everything after it is older too, so the scan stops
//! there. If the sort toggle fails the scan continues unsorted and that early
//! stop may cut results short; this is logged but not otherwise signalled.

use crate::browser::Page;
use crate::error::BrowserError;
use crate::models::ScrapedRow;
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

pub const SEARCH_INPUT: &str = "#searchInput";
pub const TABLE_ROW: &str = "datatable-row-wrapper";
pub const YEAR_HEADER: &str = "datatable-header-cell:nth-child(5)";
pub const SCROLLER: &str = "datatable-scroller";

static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse(TABLE_ROW).unwrap());
static TITLE_ANCHOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("datatable-body-cell:nth-child(2) a").unwrap());
static AUTHORS_CELL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("datatable-body-cell:nth-child(3)").unwrap());
static YEAR_CELL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("datatable-body-cell:nth-child(5)").unwrap());

/// How long to wait for the first row after submitting a search.
const ROW_WAIT: Duration = Duration::from_millis(1500);
/// Pause after sorting or scrolling so the table can re-render.
const SETTLE: Duration = Duration::from_millis(250);

fn cell_text(row: &ElementRef<'_>, selector: &Selector) -> String {
    row.select(selector)
        .next()
        .map(|cell| cell.text().flat_map(str::split_whitespace).join(" "))
        .unwrap_or_default()
}

/// Parse every rendered row out of a DOM snapshot, in display order.
pub fn parse_rendered_rows(html: &str) -> Vec<ScrapedRow> {
    let document = Html::parse_document(html);
    document
        .select(&ROW)
        .map(|row| {
            let anchor = row.select(&TITLE_ANCHOR).next();
            ScrapedRow {
                authors: cell_text(&row, &AUTHORS_CELL),
                title: anchor
                    .map(|a| a.text().flat_map(str::split_whitespace).join(" "))
                    .unwrap_or_default(),
                year_text: cell_text(&row, &YEAR_CELL),
                link: anchor
                    .and_then(|a| a.value().attr("href"))
                    .unwrap_or_default()
                    .to_string(),
            }
        })
        .collect()
}

async fn rendered_rows(page: &mut dyn Page) -> Result<Vec<ScrapedRow>, BrowserError> {
    let html = page.html().await?;
    Ok(parse_rendered_rows(&html))
}

/// Click the year header twice (ascending, then descending).
async fn sort_year_descending(page: &mut dyn Page) -> Result<(), BrowserError> {
    page.click(YEAR_HEADER).await?;
    page.click(YEAR_HEADER).await?;
    sleep(SETTLE).await;
    Ok(())
}

/// Search the table for `query` and collect rows down to `year_min`.
///
/// Stops when the table stops growing, when `cap` rows have been taken, or at
/// the first row with a parseable year below `year_min` (that row is not
/// included). Rows whose year cannot be parsed are kept and do not trigger the
/// early stop. An empty result means the search matched nothing.
///
/// # Arguments
///
/// * `page` - A tab already showing the portal's search page
/// * `query` - Text typed into the search box
/// * `year_min` - Period floor; the scan stops at the first older row
/// * `cap` - Maximum rows to take, or `None` for no limit
///
/// # Returns
///
/// Rows in display order, at most `cap` of them.
///
/// # Errors
///
/// Returns a [`BrowserError`] if the search box cannot be used or the first
/// table snapshot fails. A snapshot failure in a later round ends the scan
/// with the rows taken so far.
#[instrument(level = "info", skip_all, fields(%query, year_min = year_min))]
pub async fn scrape_query(
    page: &mut dyn Page,
    query: &str,
    year_min: i32,
    cap: Option<usize>,
) -> Result<Vec<ScrapedRow>, BrowserError> {
    page.fill(SEARCH_INPUT, "").await?;
    page.fill(SEARCH_INPUT, query).await?;
    page.press_enter(SEARCH_INPUT).await?;

    if let Err(e) = page.wait_for(TABLE_ROW, ROW_WAIT).await {
        debug!(error = %e, "No rows rendered");
        return Ok(Vec::new());
    }

    if let Err(e) = sort_year_descending(page).await {
        warn!(error = %e, "Could not sort by year; early stop may be unreliable");
    }

    let mut results = Vec::new();
    let mut next_index = 0usize;
    let mut last_count: Option<usize> = None;

    loop {
        let rows = match rendered_rows(page).await {
            Ok(rows) => rows,
            Err(e) if last_count.is_some() => {
                warn!(error = %e, kept = results.len(), "Table snapshot failed; keeping rows so far");
                break;
            }
            Err(e) => return Err(e),
        };
        let count = rows.len();
        let upper = cap.map_or(count, |c| count.min(c));

        for row in rows.into_iter().take(upper).skip(next_index) {
            if let Some(year) = row.year() {
                if year < year_min {
                    debug!(year, year_min, kept = results.len(), "Passed the period floor");
                    return Ok(results);
                }
            }
            results.push(row);
        }
        next_index = next_index.max(upper);

        let stalled = last_count == Some(count);
        let capped = cap.is_some_and(|c| results.len() >= c);
        if stalled || capped {
            debug!(count, stalled, capped, "Stopping scan");
            break;
        }
        last_count = Some(count);

        if let Err(e) = page.scroll_to_end(SCROLLER).await {
            debug!(error = %e, "Cannot scroll further");
            break;
        }
        sleep(SETTLE).await;
    }

    if let Some(c) = cap {
        results.truncate(c);
    }
    Ok(results)
}
