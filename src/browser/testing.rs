//! In-memory [`Browser`] for tests.
//!
//! [`FakeSite`] describes what the pages show: per-URL element attributes for
//! citation pages, and a publication table that renders `batch` more rows on
//! every scroll, like the portal's virtual scroller.

use super::{Browser, Page};
use crate::error::BrowserError;
use crate::models::ScrapedRow;
use crate::scrapers::portal::TABLE_ROW;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Default, Clone)]
pub(crate) struct FakeSite {
    /// url -> selector -> href
    pub links: HashMap<String, HashMap<String, String>>,
    pub unreachable: HashSet<String>,
    /// Rows returned for any non-empty search, already in display order.
    pub table: Vec<ScrapedRow>,
    /// Rows rendered initially and added per scroll.
    pub batch: usize,
    pub sort_broken: bool,
    /// DOM snapshots that succeed before every later one fails.
    pub snapshot_limit: Option<usize>,
}

impl FakeSite {
    pub fn with_link(mut self, url: &str, selector: &str, href: &str) -> Self {
        self.links
            .entry(url.to_string())
            .or_default()
            .insert(selector.to_string(), href.to_string());
        self
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeCounters {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub scrolls: AtomicUsize,
    pub clicks: AtomicUsize,
    pub snapshots: AtomicUsize,
    /// `Browser::close` calls.
    pub shutdowns: AtomicUsize,
}

impl FakeCounters {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

pub(crate) struct FakePage {
    site: Arc<FakeSite>,
    counters: Arc<FakeCounters>,
    url: Option<String>,
    query: String,
    rendered: usize,
}

impl FakePage {
    pub fn new(site: FakeSite) -> (Self, Arc<FakeCounters>) {
        let counters = Arc::new(FakeCounters::default());
        let page = Self::shared(Arc::new(site), counters.clone());
        (page, counters)
    }

    fn shared(site: Arc<FakeSite>, counters: Arc<FakeCounters>) -> Self {
        Self {
            site,
            counters,
            url: None,
            query: String::new(),
            rendered: 0,
        }
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Markup shaped like the portal's ngx-datatable.
pub(crate) fn render_table(rows: &[ScrapedRow]) -> String {
    let mut html = String::from("<html><body><datatable-body><datatable-scroller>");
    for (i, row) in rows.iter().enumerate() {
        html.push_str(&format!(
            concat!(
                "<datatable-row-wrapper><datatable-body-row><div class=\"datatable-row-center\">",
                "<datatable-body-cell>{}</datatable-body-cell>",
                "<datatable-body-cell><a href=\"{}\">{}</a></datatable-body-cell>",
                "<datatable-body-cell> {} </datatable-body-cell>",
                "<datatable-body-cell>0</datatable-body-cell>",
                "<datatable-body-cell>{}</datatable-body-cell>",
                "</div></datatable-body-row></datatable-row-wrapper>"
            ),
            i + 1,
            escape(&row.link),
            escape(&row.title),
            escape(&row.authors),
            escape(&row.year_text),
        ));
    }
    html.push_str("</datatable-scroller></datatable-body></body></html>");
    html
}

#[async_trait]
impl Page for FakePage {
    async fn goto(&mut self, url: &str, _timeout: Duration) -> Result<(), BrowserError> {
        if self.site.unreachable.contains(url) {
            return Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
        }
        self.url = Some(url.to_string());
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
        if selector == TABLE_ROW && self.rendered == 0 {
            return Err(BrowserError::Timeout {
                selector: selector.to_string(),
                timeout,
            });
        }
        Ok(())
    }

    async fn fill(&mut self, _selector: &str, text: &str) -> Result<(), BrowserError> {
        self.query = text.to_string();
        Ok(())
    }

    async fn press_enter(&mut self, _selector: &str) -> Result<(), BrowserError> {
        self.rendered = if self.query.is_empty() {
            0
        } else {
            self.site.batch.min(self.site.table.len())
        };
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> Result<(), BrowserError> {
        self.counters.clicks.fetch_add(1, Ordering::SeqCst);
        if self.site.sort_broken {
            return Err(BrowserError::NoElement(selector.to_string()));
        }
        Ok(())
    }

    async fn html(&mut self) -> Result<String, BrowserError> {
        let taken = self.counters.snapshots.fetch_add(1, Ordering::SeqCst);
        if self.site.snapshot_limit.is_some_and(|limit| taken >= limit) {
            return Err(BrowserError::Command("page source unavailable".to_string()));
        }
        Ok(render_table(&self.site.table[..self.rendered]))
    }

    async fn attribute(
        &mut self,
        selector: &str,
        _name: &str,
        timeout: Duration,
    ) -> Result<Option<String>, BrowserError> {
        self.url
            .as_ref()
            .and_then(|url| self.site.links.get(url))
            .and_then(|by_selector| by_selector.get(selector))
            .map(|href| Some(href.clone()))
            .ok_or_else(|| BrowserError::Timeout {
                selector: selector.to_string(),
                timeout,
            })
    }

    async fn scroll_to_end(&mut self, _selector: &str) -> Result<(), BrowserError> {
        self.counters.scrolls.fetch_add(1, Ordering::SeqCst);
        self.rendered = (self.rendered + self.site.batch).min(self.site.table.len());
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub(crate) struct FakeBrowser {
    site: Arc<FakeSite>,
    pub counters: Arc<FakeCounters>,
}

impl FakeBrowser {
    pub fn new(site: FakeSite) -> Self {
        Self {
            site: Arc::new(site),
            counters: Arc::new(FakeCounters::default()),
        }
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn new_page(&self) -> Result<Box<dyn Page>, BrowserError> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakePage::shared(self.site.clone(), self.counters.clone())))
    }

    async fn close(&self) -> Result<(), BrowserError> {
        self.counters.shutdowns.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
