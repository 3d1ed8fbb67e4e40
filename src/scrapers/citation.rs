//! Citation page → fetchable article URL.
//!
//! A citation page links to the article in one of two places, tried in order:
//!
//! 1. the title hyperlink, when it points off the portal;
//! 2. the ninth row of the citation table. That link is either used as is, or,
//!    when it is an institutional-repository handle page, followed to the
//!    item viewer's file link.
//!
//! Every lookup is bounded and fault tolerant; a failure falls through to the
//! next strategy, and when none succeeds the outcome is [`Resolution::NotFound`].
//! The tab is closed on every path.

use crate::browser::{Browser, Page};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

pub const TITLE_LINK: &str = "#gsc_oci_title a";
const TABLE_LINK: &str = "#gsc_oci_table > div:nth-child(9) .gsc_oci_value a";
const REPOSITORY_FILE_LINK: &str =
    "#aspect_artifactbrowser_ItemViewer_div_item-view .file-list .file-link a";

const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);
const TITLE_LINK_TIMEOUT: Duration = Duration::from_secs(5);
const TABLE_LINK_TIMEOUT: Duration = Duration::from_secs(3);
const FILE_LINK_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of resolving one citation page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(String),
    NotFound,
}

/// Where on the citation page to look for the article link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    TitleLink,
    CitationTable,
}

const STRATEGIES: [Strategy; 2] = [Strategy::TitleLink, Strategy::CitationTable];

/// Resolves citation pages using the host rules of one portal.
#[derive(Debug, Clone)]
pub struct LinkResolver {
    /// Hosts containing this are the portal itself, so not an article.
    portal_host_marker: String,
    /// URLs containing this are repository handle pages to dive into.
    repository_handle_marker: String,
}

impl LinkResolver {
    /// Create a resolver.
    ///
    /// # Arguments
    ///
    /// * `portal_host_marker` - Substring identifying the portal's own hosts
    ///   (`scholar.google`); links there are never articles
    /// * `repository_handle_marker` - Substring identifying repository handle
    ///   pages whose file link should be followed
    pub fn new(portal_host_marker: impl Into<String>, repository_handle_marker: impl Into<String>) -> Self {
        Self {
            portal_host_marker: portal_host_marker.into(),
            repository_handle_marker: repository_handle_marker.into(),
        }
    }

    /// True for absolute http(s) URLs whose host is not the portal.
    fn is_off_portal(&self, link: &str) -> bool {
        match Url::parse(link) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url
                .host_str()
                .is_some_and(|host| !host.contains(&self.portal_host_marker)),
            _ => false,
        }
    }

    /// Open a tab, resolve `citation_url`, close the tab.
    ///
    /// # Arguments
    ///
    /// * `browser` - Session to open the tab in
    /// * `citation_url` - The portal's citation page for one publication
    ///
    /// # Returns
    ///
    /// [`Resolution::Resolved`] with an absolute article URL, or
    /// [`Resolution::NotFound`] when no strategy yields one. Navigation and lookup
    /// failures are logged and count as not found.
    #[instrument(level = "info", skip_all, fields(url = %citation_url))]
    pub async fn resolve(&self, browser: &dyn Browser, citation_url: &str) -> Resolution {
        let mut page = match browser.new_page().await {
            Ok(page) => page,
            Err(e) => {
                error!(error = %e, "Could not open a tab");
                return Resolution::NotFound;
            }
        };
        let outcome = self.resolve_on(page.as_mut(), citation_url).await;
        if let Err(e) = page.close().await {
            debug!(error = %e, "Closing tab failed");
        }
        outcome
    }

    /// Resolve on an already open tab.
    pub async fn resolve_on(&self, page: &mut dyn Page, citation_url: &str) -> Resolution {
        if let Err(e) = page.goto(citation_url, NAVIGATION_TIMEOUT).await {
            error!(error = %e, "Citation page navigation failed");
            return Resolution::NotFound;
        }
        for strategy in STRATEGIES {
            if let Some(url) = self.try_strategy(strategy, page, citation_url).await {
                info!(?strategy, article = %url, "Resolved article link");
                return Resolution::Resolved(url);
            }
        }
        Resolution::NotFound
    }

    async fn try_strategy(&self, strategy: Strategy, page: &mut dyn Page, citation_url: &str) -> Option<String> {
        match strategy {
            Strategy::TitleLink => self.title_link(page).await,
            Strategy::CitationTable => self.table_link(page, citation_url).await,
        }
    }

    async fn title_link(&self, page: &mut dyn Page) -> Option<String> {
        let link = match page.attribute(TITLE_LINK, "href", TITLE_LINK_TIMEOUT).await {
            Ok(Some(link)) => link,
            Ok(None) | Err(_) => {
                info!("No hyperlink in citation title");
                return None;
            }
        };
        if self.is_off_portal(&link) {
            return Some(link);
        }
        info!(href = %link, "Title hyperlink loops back to the portal");
        None
    }

    async fn table_link(&self, page: &mut dyn Page, citation_url: &str) -> Option<String> {
        let link = match page.attribute(TABLE_LINK, "href", TABLE_LINK_TIMEOUT).await {
            Ok(Some(link)) if !link.is_empty() => link,
            _ => {
                info!(url = %citation_url, "Citation-table link not found");
                return None;
            }
        };
        info!(href = %link, "Citation-table link found");

        if link.contains(&self.repository_handle_marker) {
            return self.repository_file(page, &link).await;
        }
        if self.is_off_portal(&link) {
            return Some(link);
        }
        info!(href = %link, "Citation-table link loops back to the portal");
        None
    }

    /// Follow a repository handle page to its first file link.
    async fn repository_file(&self, page: &mut dyn Page, handle_url: &str) -> Option<String> {
        info!(handle = %handle_url, "Repository handle detected, navigating");
        if let Err(e) = page.goto(handle_url, NAVIGATION_TIMEOUT).await {
            warn!(error = %e, "Repository navigation failed");
            return None;
        }
        let href = match page.attribute(REPOSITORY_FILE_LINK, "href", FILE_LINK_TIMEOUT).await {
            Ok(Some(href)) if !href.is_empty() => href,
            Ok(_) | Err(_) => {
                warn!(handle = %handle_url, "No file link on repository page");
                return None;
            }
        };
        match Url::parse(handle_url).and_then(|base| base.join(&href)) {
            Ok(file) => Some(file.to_string()),
            Err(e) => {
                warn!(error = %e, %href, "Could not resolve repository file link");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::testing::{FakeBrowser, FakeCounters, FakeSite};

    const CITATION: &str = "https://scholar.google.com/citations?view_op=view_citation&citation_for_view=abc";
    const HANDLE: &str = "https://ir.ucc.edu.gh/xmlui/handle/123456789/4821";

    fn resolver() -> LinkResolver {
        LinkResolver::new("scholar.google", "ir.ucc.edu.gh/xmlui/handle")
    }

    async fn resolve(site: FakeSite) -> (Resolution, std::sync::Arc<FakeCounters>) {
        let browser = FakeBrowser::new(site);
        let outcome = resolver().resolve(&browser, CITATION).await;
        (outcome, browser.counters.clone())
    }

    #[tokio::test]
    async fn test_title_link_wins() {
        let site = FakeSite::default()
            .with_link(CITATION, TITLE_LINK, "https://journals.example.org/article/77")
            .with_link(CITATION, TABLE_LINK, "https://other.example.org/x");
        let (outcome, counters) = resolve(site).await;
        assert_eq!(outcome, Resolution::Resolved("https://journals.example.org/article/77".into()));
        assert_eq!(FakeCounters::get(&counters.opened), 1);
        assert_eq!(FakeCounters::get(&counters.closed), 1);
    }

    #[tokio::test]
    async fn test_title_link_on_portal_falls_back_to_table() {
        let site = FakeSite::default()
            .with_link(CITATION, TITLE_LINK, "https://scholar.google.com/scholar?cluster=1")
            .with_link(CITATION, TABLE_LINK, "https://doi.org/10.1000/xyz");
        let (outcome, _) = resolve(site).await;
        assert_eq!(outcome, Resolution::Resolved("https://doi.org/10.1000/xyz".into()));
    }

    #[tokio::test]
    async fn test_relative_title_link_is_not_accepted() {
        let site = FakeSite::default().with_link(CITATION, TITLE_LINK, "/scholar?oi=bibs");
        let (outcome, _) = resolve(site).await;
        assert_eq!(outcome, Resolution::NotFound);
    }

    #[tokio::test]
    async fn test_table_link_back_to_portal_is_not_found() {
        let site = FakeSite::default()
            .with_link(CITATION, TABLE_LINK, "https://scholar.google.com/scholar?q=related");
        let (outcome, counters) = resolve(site).await;
        assert_eq!(outcome, Resolution::NotFound);
        assert_eq!(FakeCounters::get(&counters.closed), 1);
    }

    #[tokio::test]
    async fn test_repository_relative_file_link_is_joined() {
        let site = FakeSite::default()
            .with_link(CITATION, TABLE_LINK, HANDLE)
            .with_link(HANDLE, REPOSITORY_FILE_LINK, "/xmlui/bitstream/handle/123456789/4821/paper.pdf");
        let (outcome, _) = resolve(site).await;
        assert_eq!(
            outcome,
            Resolution::Resolved("https://ir.ucc.edu.gh/xmlui/bitstream/handle/123456789/4821/paper.pdf".into())
        );
    }

    #[tokio::test]
    async fn test_repository_without_file_is_not_found() {
        let site = FakeSite::default().with_link(CITATION, TABLE_LINK, HANDLE);
        let (outcome, _) = resolve(site).await;
        assert_eq!(outcome, Resolution::NotFound);
    }

    #[tokio::test]
    async fn test_repository_navigation_failure_is_not_found() {
        let mut site = FakeSite::default()
            .with_link(CITATION, TABLE_LINK, HANDLE)
            .with_link(HANDLE, REPOSITORY_FILE_LINK, "/file.pdf");
        site.unreachable.insert(HANDLE.to_string());
        let (outcome, _) = resolve(site).await;
        assert_eq!(outcome, Resolution::NotFound);
    }

    #[tokio::test]
    async fn test_citation_navigation_failure_still_closes_tab() {
        let mut site = FakeSite::default();
        site.unreachable.insert(CITATION.to_string());
        let (outcome, counters) = resolve(site).await;
        assert_eq!(outcome, Resolution::NotFound);
        assert_eq!(FakeCounters::get(&counters.closed), 1);
    }
}
